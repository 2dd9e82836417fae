//! GraphQL transport for evroute resources
//!
//! - [`GraphqlClient`]: HTTP for queries and mutations, one shared
//!   `graphql-ws` socket for subscriptions
//! - [`ResourceKind`]: operations and response shapes per resource
//! - [`GraphqlBackend`]: plugs a kind into the resolver
//! - [`Catalogue`]: paged vehicle and station lookups
//!
//! ```rust,ignore
//! use evroute_core::Resolver;
//! use evroute_graphql::{GraphqlBackend, GraphqlClient, GraphqlConfig, RouteKind};
//! use std::sync::Arc;
//!
//! let client = Arc::new(GraphqlClient::new(GraphqlConfig::new().with_client_id("..."))?);
//! let routes = Resolver::new(Arc::new(GraphqlBackend::<RouteKind>::new(client)));
//! let resolution = routes.resolve(&request).await?;
//! ```

pub mod backend;
pub mod catalogue;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod kind;
pub mod protocol;
pub mod ws;

pub use backend::GraphqlBackend;
pub use catalogue::Catalogue;
pub use client::{GraphqlClient, WsOperation};
pub use config::{GraphqlConfig, DEFAULT_HTTP_URL, DEFAULT_WS_URL};
pub use error::GraphqlError;
pub use kind::{extract_handle, parse_update, IsolineKind, ResourceKind, RouteKind};
pub use protocol::{ClientMessage, GraphqlRequest, GraphqlResponse, ServerMessage, SUBPROTOCOL};
pub use ws::{ConnectionStats, SubscriptionEvent, WsConnection};

/// Route backend
pub type RouteBackend = GraphqlBackend<RouteKind>;
/// Isoline backend
pub type IsolineBackend = GraphqlBackend<IsolineKind>;
