//! One-shot lookups: vehicle catalogue and stations around a point
//!
//! Unlike routes and isolines these answer in the query response itself,
//! so they bypass the resolver. Paging state stays with the caller.

use crate::client::GraphqlClient;
use crate::error::GraphqlError;
use crate::protocol::GraphqlRequest;
use evroute_model::{Pager, Station, StationQuery, Vehicle};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

const VEHICLE_LIST: &str = r"
query vehicleList($page: Int, $size: Int, $search: String) {
  vehicleList(page: $page, size: $size, search: $search) {
    id
    naming { make model chargetrip_version }
    connectors { standard }
  }
}";

const STATION_AROUND: &str = r"
query stationAround($query: StationAroundQuery!, $page: Int, $size: Int) {
  stationAround(query: $query, page: $page, size: $size) {
    id
    external_id
    address
    location { type coordinates }
    elevation
    amenities
    power
    speed
    status
  }
}";

/// Paged catalogue queries over a shared client
#[derive(Debug, Clone)]
pub struct Catalogue {
    client: Arc<GraphqlClient>,
}

impl Catalogue {
    /// Catalogue over `client`
    #[must_use]
    pub fn new(client: Arc<GraphqlClient>) -> Self {
        Self { client }
    }

    /// Next page of vehicles matching `search`
    ///
    /// Returns an empty page without a request once `pager` is exhausted.
    /// Reset the pager when `search` changes.
    ///
    /// # Errors
    /// Transport errors, or `GraphqlError::MalformedResponse` if an entry
    /// does not parse
    pub async fn vehicles(
        &self,
        search: Option<&str>,
        pager: &mut Pager,
    ) -> Result<Vec<Vehicle>, GraphqlError> {
        let variables = json!({
            "page": pager.page(),
            "size": pager.size(),
            "search": search,
        });
        self.page(VEHICLE_LIST, "vehicleList", variables, pager).await
    }

    /// Next page of stations matching `query`
    ///
    /// # Errors
    /// As [`Catalogue::vehicles`]
    pub async fn stations_around(
        &self,
        query: &StationQuery,
        pager: &mut Pager,
    ) -> Result<Vec<Station>, GraphqlError> {
        let variables = json!({
            "query": query,
            "page": pager.page(),
            "size": pager.size(),
        });
        self.page(STATION_AROUND, "stationAround", variables, pager).await
    }

    async fn page<T: DeserializeOwned>(
        &self,
        document: &str,
        field: &str,
        variables: Value,
        pager: &mut Pager,
    ) -> Result<Vec<T>, GraphqlError> {
        if pager.is_exhausted() {
            return Ok(Vec::new());
        }
        let data = self
            .client
            .execute(&GraphqlRequest::new(document, variables))
            .await?;
        let items: Vec<T> = match data.get(field) {
            None | Some(Value::Null) => Vec::new(),
            Some(list) => serde_json::from_value(list.clone()).map_err(|e| {
                GraphqlError::MalformedResponse(format!("invalid {field} entry: {e}"))
            })?,
        };
        debug!(field, page = pager.page(), received = items.len(), "catalogue page");
        pager.advance(items.len());
        Ok(items)
    }
}
