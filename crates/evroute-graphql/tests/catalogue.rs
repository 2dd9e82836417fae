//! Paged catalogue lookups against a local HTTP server

use evroute_graphql::{Catalogue, GraphqlClient, GraphqlConfig, GraphqlError};
use evroute_model::{Location, Pager, StationQuery};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use warp::Filter;

type Seen = Arc<Mutex<Vec<Value>>>;

/// Answers every query with `pages[page]` under `field`, recording variables
async fn catalogue_server(field: &'static str, pages: Vec<Value>) -> (SocketAddr, Seen) {
    let seen: Seen = Arc::default();
    let log = Arc::clone(&seen);
    let route = warp::post()
        .and(warp::path("graphql"))
        .and(warp::body::json())
        .map(move |body: Value| {
            let variables = body["variables"].clone();
            let page = variables["page"].as_u64().unwrap_or(0) as usize;
            log.lock().push(variables);
            let mut data = serde_json::Map::new();
            data.insert(field.to_string(), pages.get(page).cloned().unwrap_or(Value::Null));
            warp::reply::json(&json!({ "data": data }))
        });
    let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    (addr, seen)
}

fn catalogue(http: SocketAddr) -> Catalogue {
    let config = GraphqlConfig::new()
        .with_client_id("test-client")
        .with_http_url(format!("http://{http}/graphql"))
        .with_ws_url("ws://127.0.0.1:9/graphql");
    Catalogue::new(Arc::new(GraphqlClient::new(config).unwrap()))
}

fn vehicle(id: &str, make: &str) -> Value {
    json!({ "id": id, "naming": { "make": make, "model": "M", "chargetrip_version": null } })
}

#[tokio::test]
async fn vehicle_pages_stop_after_short_page() {
    let (http, seen) = catalogue_server(
        "vehicleList",
        vec![
            json!([vehicle("v1", "Tesla"), vehicle("v2", "Tesla")]),
            json!([vehicle("v3", "Tesla")]),
        ],
    )
    .await;
    let catalogue = catalogue(http);
    let mut pager = Pager::new(2);

    let first = catalogue.vehicles(Some("tes"), &mut pager).await.unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].display_name(), "Tesla M");
    let second = catalogue.vehicles(Some("tes"), &mut pager).await.unwrap();
    assert_eq!(second.len(), 1);
    assert!(pager.is_exhausted());

    let third = catalogue.vehicles(Some("tes"), &mut pager).await.unwrap();
    assert!(third.is_empty());

    let seen = seen.lock().clone();
    assert_eq!(
        seen,
        vec![
            json!({ "page": 0, "size": 2, "search": "tes" }),
            json!({ "page": 1, "size": 2, "search": "tes" }),
        ]
    );
}

#[tokio::test]
async fn reset_pager_starts_a_new_search() {
    let (http, seen) = catalogue_server("vehicleList", vec![json!([vehicle("v1", "Kia")])]).await;
    let catalogue = catalogue(http);
    let mut pager = Pager::new(5);

    catalogue.vehicles(Some("ki"), &mut pager).await.unwrap();
    assert!(pager.is_exhausted());
    pager.reset();
    catalogue.vehicles(None, &mut pager).await.unwrap();

    let seen = seen.lock().clone();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[1], json!({ "page": 0, "size": 5, "search": null }));
}

#[tokio::test]
async fn stations_around_sends_point_query() {
    let (http, seen) = catalogue_server(
        "stationAround",
        vec![json!([{
            "id": "s1",
            "address": "Havnegade 1",
            "location": { "type": "Point", "coordinates": [10.21, 56.15] },
            "power": 150.0,
            "speed": "turbo",
            "status": "free",
            "amenities": { "restaurant": 2 }
        }])],
    )
    .await;
    let catalogue = catalogue(http);
    let mut pager = Pager::new(20);
    let query = StationQuery::around(&Location::new(10.2, 56.1).unwrap()).with_distance(5_000);

    let stations = catalogue.stations_around(&query, &mut pager).await.unwrap();
    assert_eq!(stations.len(), 1);
    assert_eq!(stations[0].lon_lat(), Some((10.21, 56.15)));
    assert_eq!(stations[0].speed.as_deref(), Some("turbo"));
    assert!(pager.is_exhausted());

    let seen = seen.lock().clone();
    assert_eq!(
        seen[0],
        json!({
            "query": {
                "location": { "type": "Point", "coordinates": [10.2, 56.1] },
                "distance": 5000
            },
            "page": 0,
            "size": 20
        })
    );
}

#[tokio::test]
async fn null_listing_is_empty_and_bad_entry_is_malformed() {
    let (http, _) = catalogue_server("stationAround", vec![Value::Null]).await;
    let query = StationQuery::around(&Location::new(0.0, 0.0).unwrap());
    let mut pager = Pager::default();
    let stations = catalogue(http)
        .stations_around(&query, &mut pager)
        .await
        .unwrap();
    assert!(stations.is_empty());
    assert!(pager.is_exhausted());

    let (http, _) = catalogue_server("vehicleList", vec![json!([{ "naming": {} }])]).await;
    let err = catalogue(http)
        .vehicles(None, &mut Pager::default())
        .await
        .unwrap_err();
    assert!(matches!(err, GraphqlError::MalformedResponse(_)), "{err}");
}
