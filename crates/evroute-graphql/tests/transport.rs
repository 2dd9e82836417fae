//! Transport tests against local HTTP and `graphql-ws` servers

use evroute_core::{
    BackendError, ResolveError, ResolveOptions, Resolution, Resolver, ResourceBackend,
    ResourceHandle, ResourceStatus,
};
use evroute_graphql::{
    GraphqlClient, GraphqlConfig, GraphqlError, GraphqlRequest, IsolineBackend, RouteBackend,
};
use evroute_test_utils::{isoline_request, route_request};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{accept_hdr_async, WebSocketStream};
use warp::Filter;

type ServerSocket = WebSocketStream<TcpStream>;

/// Accept WebSocket connections, echoing the requested subprotocol, and
/// hand each one to `handler`
async fn ws_server<F, Fut>(handler: F) -> SocketAddr
where
    F: Fn(ServerSocket) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let echo = |req: &Request, mut resp: Response| -> Result<Response, ErrorResponse> {
                if let Some(proto) = req.headers().get("sec-websocket-protocol") {
                    resp.headers_mut()
                        .insert("sec-websocket-protocol", proto.clone());
                }
                Ok(resp)
            };
            let socket = accept_hdr_async(stream, echo).await.unwrap();
            tokio::spawn(handler(socket));
        }
    });
    addr
}

async fn recv_json(socket: &mut ServerSocket) -> Option<Value> {
    loop {
        match socket.next().await? {
            Ok(Message::Text(text)) => return Some(serde_json::from_str(&text).unwrap()),
            Ok(Message::Close(_)) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

async fn send_json(socket: &mut ServerSocket, value: Value) {
    socket.send(Message::Text(value.to_string())).await.unwrap();
}

/// Expect `connection_init` with the client id, then acknowledge
async fn accept_session(socket: &mut ServerSocket) {
    let init = recv_json(socket).await.unwrap();
    assert_eq!(init["type"], "connection_init");
    assert_eq!(init["payload"]["x-client-id"], "test-client");
    send_json(socket, json!({ "type": "connection_ack" })).await;
}

/// HTTP endpoint answering creation and status queries
async fn http_server(create_field: &'static str, id: Value, query_node: Value) -> SocketAddr {
    let route = warp::post()
        .and(warp::path("graphql"))
        .and(warp::header::<String>("x-client-id"))
        .and(warp::body::json())
        .map(move |client_id: String, body: Value| {
            assert_eq!(client_id, "test-client");
            let query = body["query"].as_str().unwrap_or_default();
            let reply = if query.starts_with("mutation") {
                let mut data = serde_json::Map::new();
                data.insert(create_field.to_string(), id.clone());
                json!({ "data": data })
            } else {
                json!({ "data": query_node.clone() })
            };
            warp::reply::json(&reply)
        });
    let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    addr
}

fn config(http: SocketAddr, ws: SocketAddr) -> GraphqlConfig {
    GraphqlConfig::new()
        .with_client_id("test-client")
        .with_http_url(format!("http://{http}/graphql"))
        .with_ws_url(format!("ws://{ws}/graphql"))
        .with_ack_timeout(Duration::from_millis(500))
}

fn route_node(status: &str, with_route: bool) -> Value {
    json!({
        "status": status,
        "route": if with_route {
            json!({ "distance": 652_000.0, "duration": 27_000.0, "charges": 2, "legs": [] })
        } else {
            Value::Null
        },
        "alternatives": []
    })
}

#[tokio::test]
async fn route_resolves_over_websocket_and_stops() {
    let (stops_tx, mut stops) = mpsc::unbounded_channel();
    let ws = ws_server(move |mut socket| {
        let stops_tx = stops_tx.clone();
        async move {
            accept_session(&mut socket).await;
            let start = recv_json(&mut socket).await.unwrap();
            assert_eq!(start["type"], "start");
            assert_eq!(start["payload"]["variables"]["id"], "route-1");
            let id = start["id"].clone();

            for node in [route_node("pending", false), route_node("processing", false)] {
                send_json(
                    &mut socket,
                    json!({ "type": "data", "id": id, "payload": { "data": { "routeUpdatedById": node } } }),
                )
                .await;
            }
            send_json(&mut socket, json!({ "type": "ka" })).await;
            send_json(
                &mut socket,
                json!({ "type": "data", "id": id, "payload": { "data": { "routeUpdatedById": route_node("done", true) } } }),
            )
            .await;

            while let Some(msg) = recv_json(&mut socket).await {
                if msg["type"] == "stop" {
                    assert_eq!(msg["id"], id);
                    let _ = stops_tx.send(());
                }
            }
        }
    })
    .await;
    let http = http_server("newRoute", json!("route-1"), json!({})).await;

    let client = Arc::new(GraphqlClient::new(config(http, ws)).unwrap());
    let resolver = Resolver::new(Arc::new(RouteBackend::new(Arc::clone(&client))));

    let resolution = resolver.resolve(&route_request()).await.unwrap();
    let update = resolution.into_option().unwrap();
    assert_eq!(update.route.distance, Some(652_000.0));
    assert_eq!(update.route.charges, Some(2));

    tokio::time::timeout(Duration::from_secs(2), stops.recv())
        .await
        .expect("stop was not sent")
        .unwrap();
    let stats = client.connection_stats().await.unwrap();
    assert_eq!(stats.opened, 1);
    assert_eq!(stats.active, 0);
    assert_eq!(stats.stopped, 1);
}

#[tokio::test]
async fn isoline_not_found_is_absent() {
    let ws = ws_server(|mut socket| async move {
        accept_session(&mut socket).await;
        let start = recv_json(&mut socket).await.unwrap();
        let id = start["id"].clone();
        send_json(
            &mut socket,
            json!({ "type": "data", "id": id, "payload": { "data": { "isoline": { "status": "not_found" } } } }),
        )
        .await;
        while recv_json(&mut socket).await.is_some() {}
    })
    .await;
    let http = http_server("createIsoline", json!("iso-9"), json!({})).await;

    let client = Arc::new(GraphqlClient::new(config(http, ws)).unwrap());
    let resolver = Resolver::new(Arc::new(IsolineBackend::new(client)));
    match resolver.resolve(&isoline_request()).await.unwrap() {
        Resolution::Absent { handle, status } => {
            assert_eq!(handle.as_str(), "iso-9");
            assert_eq!(status, ResourceStatus::NotFound);
        }
        Resolution::Resolved(_) => panic!("expected absent"),
    }
}

#[tokio::test]
async fn direct_query_wins_when_stream_is_silent() {
    let ws = ws_server(|mut socket| async move {
        accept_session(&mut socket).await;
        // Accept the start but never publish anything
        while recv_json(&mut socket).await.is_some() {}
    })
    .await;
    let http = http_server("newRoute", json!("route-2"), json!({ "route": route_node("done", true) })).await;

    let client = Arc::new(GraphqlClient::new(config(http, ws)).unwrap());
    let resolver = Resolver::new(Arc::new(RouteBackend::new(client)))
        .with_options(ResolveOptions::new().with_verify_query(true).with_timeout(Duration::from_secs(5)));

    let resolution = resolver.resolve(&route_request()).await.unwrap();
    assert!(resolution.is_resolved());
    assert_eq!(resolver.stats().won_by_query, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn direct_query_win_stops_the_socket_operation_without_closing_the_resolution() {
    let (stops_tx, mut stops) = mpsc::unbounded_channel();
    let ws = ws_server(move |mut socket| {
        let stops_tx = stops_tx.clone();
        async move {
            accept_session(&mut socket).await;
            let start = recv_json(&mut socket).await.unwrap();
            assert_eq!(start["type"], "start");
            let id = start["id"].clone();
            while let Some(msg) = recv_json(&mut socket).await {
                if msg["type"] == "stop" {
                    assert_eq!(msg["id"], id);
                    let _ = stops_tx.send(());
                }
            }
        }
    })
    .await;
    let http = http_server(
        "newRoute",
        json!("route-7"),
        json!({ "route": route_node("done", true) }),
    )
    .await;

    let client = Arc::new(GraphqlClient::new(config(http, ws)).unwrap());
    let resolver = Resolver::new(Arc::new(RouteBackend::new(Arc::clone(&client))))
        .with_options(ResolveOptions::new().with_verify_query(true));

    let resolution = resolver.resolve(&route_request()).await.unwrap();
    let update = resolution.into_option().unwrap();
    assert_eq!(update.route.charges, Some(2));
    assert_eq!(resolver.stats().won_by_query, 1);
    assert_eq!(resolver.stats().failed, 0);

    tokio::time::timeout(Duration::from_secs(2), stops.recv())
        .await
        .expect("stop was not sent")
        .unwrap();
    let stats = client.connection_stats().await.unwrap();
    assert_eq!(stats.opened, 1);
    assert_eq!(stats.active, 0);
    assert_eq!(stats.stopped, 1);
}

#[tokio::test]
async fn missing_identifier_fails_creation() {
    let ws = ws_server(|_socket| async move {
        panic!("no subscription expected");
    })
    .await;
    let http = http_server("newRoute", Value::Null, json!({})).await;

    let client = Arc::new(GraphqlClient::new(config(http, ws)).unwrap());
    let resolver = Resolver::new(Arc::new(RouteBackend::new(Arc::clone(&client))));

    let err = resolver.resolve(&route_request()).await.unwrap_err();
    assert!(matches!(
        err,
        ResolveError::CreationFailed(BackendError::MissingIdentifier)
    ));
    assert!(client.connection_stats().await.is_none());
}

#[tokio::test]
async fn connection_error_rejects_handshake() {
    let ws = ws_server(|mut socket| async move {
        let _init = recv_json(&mut socket).await;
        send_json(
            &mut socket,
            json!({ "type": "connection_error", "payload": { "message": "invalid client id" } }),
        )
        .await;
    })
    .await;
    let http = http_server("newRoute", json!("route-3"), json!({})).await;

    let client = GraphqlClient::new(config(http, ws)).unwrap();
    let err = client
        .subscribe(GraphqlRequest::new("subscription { x }", json!({})))
        .await
        .unwrap_err();
    assert!(matches!(err, GraphqlError::ConnectionRejected(msg) if msg == "invalid client id"));
}

#[tokio::test]
async fn missing_ack_times_out() {
    let ws = ws_server(|mut socket| async move {
        while recv_json(&mut socket).await.is_some() {}
    })
    .await;
    let http = http_server("newRoute", json!("route-4"), json!({})).await;

    let client = GraphqlClient::new(
        config(http, ws).with_ack_timeout(Duration::from_millis(100)),
    )
    .unwrap();
    let err = client
        .subscribe(GraphqlRequest::new("subscription { x }", json!({})))
        .await
        .unwrap_err();
    assert!(matches!(err, GraphqlError::AckTimeout(_)));
}

#[tokio::test]
async fn dropped_socket_closes_stream_and_next_subscribe_reconnects() {
    let (conn_tx, mut connections) = mpsc::unbounded_channel();
    let ws = ws_server(move |mut socket| {
        let conn_tx = conn_tx.clone();
        async move {
            accept_session(&mut socket).await;
            let _ = conn_tx.send(());
            let _start = recv_json(&mut socket).await;
            // Hang up with the operation still open
            let _ = socket.close(None).await;
        }
    })
    .await;
    let http = http_server("newRoute", json!("route-5"), json!({})).await;

    let client = Arc::new(GraphqlClient::new(config(http, ws)).unwrap());
    let backend = RouteBackend::new(Arc::clone(&client));
    let handle = ResourceHandle::new("route-5").unwrap();

    let mut first = backend.subscribe(&handle).await.unwrap();
    let item = tokio::time::timeout(Duration::from_secs(2), first.next())
        .await
        .unwrap();
    assert!(matches!(item, Some(Err(BackendError::Closed)) | None));

    let _second = backend.subscribe(&handle).await.unwrap();
    connections.recv().await.unwrap();
    connections.recv().await.unwrap();
}

#[tokio::test]
async fn query_status_over_http() {
    let ws = ws_server(|_socket| async move {}).await;
    let http = http_server("newRoute", json!("route-6"), json!({ "route": route_node("processing", false) })).await;

    let client = Arc::new(GraphqlClient::new(config(http, ws)).unwrap());
    let backend = RouteBackend::new(client);
    let update = backend
        .query_status(&ResourceHandle::new("route-6").unwrap())
        .await
        .unwrap();
    assert_eq!(update.status, ResourceStatus::Processing);
    assert!(update.resource.is_none());
}
