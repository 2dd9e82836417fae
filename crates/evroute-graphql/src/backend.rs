//! [`ResourceBackend`] over the GraphQL client

use crate::client::{GraphqlClient, WsOperation};
use crate::http::into_data;
use crate::kind::{extract_handle, parse_update, ResourceKind};
use crate::ws::SubscriptionEvent;
use async_trait::async_trait;
use evroute_core::{
    BackendError, CancelHandle, ResourceBackend, ResourceHandle, StatusUpdate, Subscription,
};
use futures::StreamExt;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info};

/// Backend for resource kind `K`
pub struct GraphqlBackend<K> {
    client: Arc<GraphqlClient>,
    kind: PhantomData<fn() -> K>,
}

impl<K: ResourceKind> GraphqlBackend<K> {
    /// Backend sharing `client` with other kinds
    #[inline]
    #[must_use]
    pub fn new(client: Arc<GraphqlClient>) -> Self {
        Self {
            client,
            kind: PhantomData,
        }
    }

    /// Underlying client
    #[inline]
    #[must_use]
    pub fn client(&self) -> &Arc<GraphqlClient> {
        &self.client
    }
}

impl<K> Clone for GraphqlBackend<K> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            kind: PhantomData,
        }
    }
}

impl<K: ResourceKind> fmt::Debug for GraphqlBackend<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphqlBackend")
            .field("kind", &K::NAME)
            .finish_non_exhaustive()
    }
}

fn event_to_update<K: ResourceKind>(
    event: SubscriptionEvent,
) -> Option<Result<StatusUpdate<K::Resource>, BackendError>> {
    match event {
        SubscriptionEvent::Data(response) => Some(
            into_data(response)
                .and_then(|data| parse_update::<K>(&data, K::SUBSCRIPTION_FIELD))
                .map_err(BackendError::from),
        ),
        SubscriptionEvent::Error(message) => Some(Err(BackendError::Rejected(message))),
        SubscriptionEvent::Closed(reason) => {
            debug!(kind = K::NAME, %reason, "subscription connection closed");
            Some(Err(BackendError::Closed))
        }
        SubscriptionEvent::Complete => None,
    }
}

#[async_trait]
impl<K: ResourceKind> ResourceBackend for GraphqlBackend<K> {
    type Request = K::Request;
    type Resource = K::Resource;

    async fn create(&self, request: &K::Request) -> Result<ResourceHandle, BackendError> {
        let operation = K::create_operation(request)?;
        let data = self.client.execute(&operation).await?;
        let handle = extract_handle(&data, K::CREATE_FIELD)?;
        info!(kind = K::NAME, %handle, "resource created");
        Ok(handle)
    }

    async fn subscribe(
        &self,
        handle: &ResourceHandle,
    ) -> Result<Subscription<K::Resource>, BackendError> {
        let WsOperation {
            id,
            connection,
            events,
        } = self.client.subscribe(K::subscription_operation(handle)).await?;

        let updates = futures::stream::unfold(events, |mut events| async move {
            let event = events.recv().await?;
            event_to_update::<K>(event).map(|update| (update, events))
        })
        .boxed();
        let cancel = CancelHandle::new(move || {
            connection.stop(id);
        });
        debug!(kind = K::NAME, %handle, id, "subscribed");
        Ok(Subscription::new(updates, cancel))
    }

    async fn query_status(
        &self,
        handle: &ResourceHandle,
    ) -> Result<StatusUpdate<K::Resource>, BackendError> {
        let data = self.client.execute(&K::query_operation(handle)).await?;
        Ok(parse_update::<K>(&data, K::QUERY_FIELD)?)
    }
}
