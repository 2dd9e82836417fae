//! Resource kinds
//!
//! A kind binds a resource type to its three operations (create,
//! subscribe, query) and to the shape of their responses.

use crate::error::GraphqlError;
use crate::protocol::GraphqlRequest;
use evroute_core::{ResourceHandle, ResourceStatus, StatusUpdate};
use evroute_model::{Isoline, IsolineRequest, Route, RouteRequest, RouteUpdate};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

/// Operations and response shapes of one resource type
pub trait ResourceKind: Send + Sync + 'static {
    /// Creation input, sent as the `input` variable
    type Request: Serialize + Send + Sync;
    /// Terminal payload
    type Resource: Send + 'static;

    /// Name used in logs
    const NAME: &'static str;
    /// Field holding the new id in the creation response
    const CREATE_FIELD: &'static str;
    /// Field holding the node in subscription responses
    const SUBSCRIPTION_FIELD: &'static str;
    /// Field holding the node in query responses
    const QUERY_FIELD: &'static str;

    /// Creation mutation document
    fn create_document() -> &'static str;
    /// Subscription document taking `$id`
    fn subscription_document() -> &'static str;
    /// Query document taking `$id`
    fn query_document() -> &'static str;

    /// Status update from the node under the subscription or query field
    ///
    /// # Errors
    /// `GraphqlError::MalformedResponse` if the node has no status or an
    /// unreadable payload
    fn parse_node(node: &Value) -> Result<StatusUpdate<Self::Resource>, GraphqlError>;

    /// Creation operation for `request`
    ///
    /// # Errors
    /// `GraphqlError::Json` if the request does not serialize
    fn create_operation(request: &Self::Request) -> Result<GraphqlRequest, GraphqlError> {
        Ok(GraphqlRequest::new(
            Self::create_document(),
            json!({ "input": serde_json::to_value(request)? }),
        ))
    }

    /// Subscription operation for `handle`
    fn subscription_operation(handle: &ResourceHandle) -> GraphqlRequest {
        GraphqlRequest::new(Self::subscription_document(), json!({ "id": handle.as_str() }))
    }

    /// Query operation for `handle`
    fn query_operation(handle: &ResourceHandle) -> GraphqlRequest {
        GraphqlRequest::new(Self::query_document(), json!({ "id": handle.as_str() }))
    }
}

/// Identifier from a creation response's `data`
///
/// # Errors
/// `GraphqlError::MissingIdentifier` if the field is absent, null, empty or
/// not a string
pub fn extract_handle(data: &Value, field: &str) -> Result<ResourceHandle, GraphqlError> {
    data.get(field)
        .and_then(Value::as_str)
        .and_then(ResourceHandle::new)
        .ok_or(GraphqlError::MissingIdentifier)
}

/// Status update from a subscription or query response's `data`
///
/// # Errors
/// `GraphqlError::MalformedResponse` if `field` is missing or null
pub fn parse_update<K: ResourceKind>(
    data: &Value,
    field: &str,
) -> Result<StatusUpdate<K::Resource>, GraphqlError> {
    match data.get(field) {
        Some(node) if !node.is_null() => K::parse_node(node),
        _ => Err(GraphqlError::MalformedResponse(format!(
            "response has no '{field}'"
        ))),
    }
}

fn node_status(node: &Value) -> Result<ResourceStatus, GraphqlError> {
    node.get("status")
        .and_then(Value::as_str)
        .map(ResourceStatus::from)
        .ok_or_else(|| GraphqlError::MalformedResponse("node has no status".into()))
}

fn decode<T: DeserializeOwned>(value: &Value, what: &str) -> Result<T, GraphqlError> {
    serde_json::from_value(value.clone())
        .map_err(|e| GraphqlError::MalformedResponse(format!("invalid {what}: {e}")))
}

const ROUTE_SELECTION: &str = r"
      id
      charges
      chargeTime
      distance
      duration
      consumption
      saving { money co2 }
      polyline
      elevationPlot
      elevationUp
      elevationDown
      tags
      legs {
        type
        name
        distance
        duration
        chargeTime
        stationId
        operatorName
        plugsAvailable
        rangeStart
        rangeEnd
        rangeStartPercentage
        rangeEndPercentage
        origin { geometry { type coordinates } properties }
        destination { geometry { type coordinates } properties }
        steps { type distance duration polyline }
      }";

/// Routes: `newRoute` / `routeUpdatedById` / `route`
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteKind;

impl ResourceKind for RouteKind {
    type Request = RouteRequest;
    type Resource = RouteUpdate;

    const NAME: &'static str = "route";
    const CREATE_FIELD: &'static str = "newRoute";
    const SUBSCRIPTION_FIELD: &'static str = "routeUpdatedById";
    const QUERY_FIELD: &'static str = "route";

    fn create_document() -> &'static str {
        "mutation newRoute($input: RequestInput!) { newRoute(input: $input) }"
    }

    fn subscription_document() -> &'static str {
        static DOC: std::sync::OnceLock<String> = std::sync::OnceLock::new();
        DOC.get_or_init(|| {
            format!(
                "subscription routeUpdatedById($id: ID!) {{ routeUpdatedById(id: $id) {{ status route {{{ROUTE_SELECTION} }} alternatives {{{ROUTE_SELECTION} }} }} }}"
            )
        })
    }

    fn query_document() -> &'static str {
        static DOC: std::sync::OnceLock<String> = std::sync::OnceLock::new();
        DOC.get_or_init(|| {
            format!(
                "query getRoute($id: ID!) {{ route(id: $id) {{ status route {{{ROUTE_SELECTION} }} alternatives {{{ROUTE_SELECTION} }} }} }}"
            )
        })
    }

    fn parse_node(node: &Value) -> Result<StatusUpdate<RouteUpdate>, GraphqlError> {
        let status = node_status(node)?;
        let route = match node.get("route") {
            Some(route) if !route.is_null() => Some(decode::<Route>(route, "route")?),
            _ => None,
        };
        let alternatives = match node.get("alternatives") {
            Some(alts) if !alts.is_null() => decode::<Vec<Route>>(alts, "alternatives")?,
            _ => Vec::new(),
        };
        Ok(StatusUpdate {
            status,
            resource: route.map(|route| RouteUpdate {
                route,
                alternatives,
            }),
        })
    }
}

/// Isolines: `createIsoline` / `isoline` / `isoline`
#[derive(Debug, Clone, Copy, Default)]
pub struct IsolineKind;

impl ResourceKind for IsolineKind {
    type Request = IsolineRequest;
    type Resource = Isoline;

    const NAME: &'static str = "isoline";
    const CREATE_FIELD: &'static str = "createIsoline";
    const SUBSCRIPTION_FIELD: &'static str = "isoline";
    const QUERY_FIELD: &'static str = "isoline";

    fn create_document() -> &'static str {
        "mutation createIsoline($input: IsolineInput!) { createIsoline(input: $input) }"
    }

    fn subscription_document() -> &'static str {
        "subscription isoline($id: ID!) { isoline(id: $id) { id status polygons { type geometry { coordinates } properties { index } } polygon_count season origin { geometry { coordinates } } } }"
    }

    fn query_document() -> &'static str {
        "query isoline($id: ID!) { isoline(id: $id) { id status polygons { type geometry { coordinates } properties { index } } polygon_count season origin { geometry { coordinates } } } }"
    }

    fn parse_node(node: &Value) -> Result<StatusUpdate<Isoline>, GraphqlError> {
        let status = node_status(node)?;
        let resource = if status == ResourceStatus::Done {
            Some(decode::<Isoline>(node, "isoline")?)
        } else {
            None
        };
        Ok(StatusUpdate { status, resource })
    }
}
