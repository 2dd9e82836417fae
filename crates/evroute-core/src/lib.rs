//! evroute Core - asynchronous resource resolution
//!
//! Long-running computations (routes, isolines) are started with a
//! creation call and observed through a status stream. This crate turns
//! that pair into one awaitable operation that:
//! - Completes exactly once
//! - Cancels the subscription no later than completion
//! - Distinguishes "not available" (`Resolution::Absent`) from failures
//! - Optionally races a direct status query against the stream
//!
//! # Example
//!
//! ```rust,ignore
//! use evroute_core::{Resolver, ResolveOptions};
//!
//! # async fn example(backend: std::sync::Arc<MyBackend>) -> Result<(), Box<dyn std::error::Error>> {
//! let resolver = Resolver::new(backend)
//!     .with_options(ResolveOptions::new().with_verify_query(true));
//!
//! match resolver.resolve(&request).await?.into_option() {
//!     Some(route) => println!("route ready: {route:?}"),
//!     None => println!("no route could be computed"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod completion;
pub mod error;
pub mod resolver;
pub mod state;
pub mod types;

pub use backend::{CancelHandle, ResourceBackend, Subscription, Unsubscribe, UpdateStream};
pub use completion::{CompletionSlot, CompletionSource};
pub use error::{BackendError, ResolveError};
pub use resolver::{Resolver, ResolverStats};
pub use state::{validate_transition, IllegalTransition, ResolvePhase};
pub use types::{
    Resolution, ResolveOptions, ResourceHandle, ResourceStatus, StatusPhase, StatusUpdate,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for implementing or driving a backend
    pub use crate::{
        BackendError, CancelHandle, ResolveError, ResolveOptions, Resolution, Resolver,
        ResourceBackend, ResourceHandle, ResourceStatus, StatusUpdate, Subscription,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
