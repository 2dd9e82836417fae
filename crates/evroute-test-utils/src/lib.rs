//! Testing utilities for the evroute workspace
//!
//! Shared scripted backend and payload fixtures.

#![allow(missing_docs)]

use async_trait::async_trait;
use evroute_core::{
    BackendError, CancelHandle, ResourceBackend, ResourceHandle, StatusUpdate, Subscription,
};
use evroute_model::{
    EvSpec, Isoline, IsolinePolygon, IsolineRequest, Leg, Location, PointFeature, PointGeometry,
    PolygonGeometry, PolygonProperties, Route, RouteRequest, RouteUpdate, Step,
};
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

/// What `create` returns
#[derive(Debug, Clone)]
pub enum CreateScript {
    Handle(String),
    Reject(String),
    MissingIdentifier,
    Transport(String),
}

/// One element of the scripted status stream
#[derive(Debug, Clone)]
pub enum StreamStep<R> {
    Update(StatusUpdate<R>),
    Fail(String),
    Delay(Duration),
}

/// What happens once the scripted steps are exhausted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// Stay open without emitting anything
    Hang,
    /// End the stream
    Close,
}

/// What `query_status` returns
#[derive(Debug, Clone)]
pub enum QueryScript<R> {
    /// Never answer
    Hang,
    Answer {
        delay: Duration,
        update: StatusUpdate<R>,
    },
    Fail {
        delay: Duration,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub creates: usize,
    pub subscribes: usize,
    pub queries: usize,
    pub unsubscribes: usize,
}

#[derive(Debug, Default)]
struct Counters {
    creates: AtomicUsize,
    subscribes: AtomicUsize,
    queries: AtomicUsize,
    unsubscribes: Arc<AtomicUsize>,
}

/// Backend that replays a fixed script and counts calls
#[derive(Debug)]
pub struct ScriptedBackend<R> {
    create: CreateScript,
    subscribe_error: Option<String>,
    steps: Vec<StreamStep<R>>,
    end: StreamEnd,
    end_on_cancel: Option<Duration>,
    query: QueryScript<R>,
    counters: Counters,
    requests: Mutex<Vec<String>>,
}

impl<R: Clone + Send + Sync + 'static> ScriptedBackend<R> {
    /// Handle `"res-1"`, empty stream that hangs, query that never answers
    pub fn new() -> Self {
        Self {
            create: CreateScript::Handle("res-1".to_string()),
            subscribe_error: None,
            steps: Vec::new(),
            end: StreamEnd::Hang,
            end_on_cancel: None,
            query: QueryScript::Hang,
            counters: Counters::default(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_create(mut self, create: CreateScript) -> Self {
        self.create = create;
        self
    }

    pub fn with_subscribe_error(mut self, message: impl Into<String>) -> Self {
        self.subscribe_error = Some(message.into());
        self
    }

    pub fn with_update(mut self, update: StatusUpdate<R>) -> Self {
        self.steps.push(StreamStep::Update(update));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.steps.push(StreamStep::Delay(delay));
        self
    }

    pub fn with_stream_failure(mut self, message: impl Into<String>) -> Self {
        self.steps.push(StreamStep::Fail(message.into()));
        self
    }

    pub fn closing(mut self) -> Self {
        self.end = StreamEnd::Close;
        self
    }

    /// Unsubscribing ends the stream, then blocks for `work` before
    /// returning, as a transport that tears down its channel would
    pub fn ending_on_cancel(mut self, work: Duration) -> Self {
        self.end_on_cancel = Some(work);
        self
    }

    pub fn with_query(mut self, delay: Duration, update: StatusUpdate<R>) -> Self {
        self.query = QueryScript::Answer { delay, update };
        self
    }

    pub fn with_query_failure(mut self, delay: Duration, message: impl Into<String>) -> Self {
        self.query = QueryScript::Fail {
            delay,
            message: message.into(),
        };
        self
    }

    pub fn counts(&self) -> CallCounts {
        CallCounts {
            creates: self.counters.creates.load(Ordering::SeqCst),
            subscribes: self.counters.subscribes.load(Ordering::SeqCst),
            queries: self.counters.queries.load(Ordering::SeqCst),
            unsubscribes: self.counters.unsubscribes.load(Ordering::SeqCst),
        }
    }

    /// Requests passed to `create`, in call order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

impl<R: Clone + Send + Sync + 'static> Default for ScriptedBackend<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: Clone + Send + Sync + 'static> ResourceBackend for ScriptedBackend<R> {
    type Request = String;
    type Resource = R;

    async fn create(&self, request: &String) -> Result<ResourceHandle, BackendError> {
        self.counters.creates.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());
        match &self.create {
            CreateScript::Handle(id) => {
                ResourceHandle::new(id.as_str()).ok_or(BackendError::MissingIdentifier)
            }
            CreateScript::Reject(message) => Err(BackendError::Rejected(message.clone())),
            CreateScript::MissingIdentifier => Err(BackendError::MissingIdentifier),
            CreateScript::Transport(message) => Err(BackendError::transport(
                std::io::Error::new(std::io::ErrorKind::ConnectionRefused, message.clone()),
            )),
        }
    }

    async fn subscribe(&self, _handle: &ResourceHandle) -> Result<Subscription<R>, BackendError> {
        self.counters.subscribes.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.subscribe_error {
            return Err(BackendError::Rejected(message.clone()));
        }

        let scripted = stream::iter(self.steps.clone())
            .then(|step| async move {
                match step {
                    StreamStep::Update(update) => Some(Ok(update)),
                    StreamStep::Fail(message) => Some(Err(BackendError::Rejected(message))),
                    StreamStep::Delay(delay) => {
                        tokio::time::sleep(delay).await;
                        None
                    }
                }
            })
            .filter_map(|item| async move { item });
        let updates = match self.end {
            StreamEnd::Hang => scripted.chain(stream::pending()).boxed(),
            StreamEnd::Close => scripted.boxed(),
        };

        let unsubscribes = Arc::clone(&self.counters.unsubscribes);
        let cancel = match self.end_on_cancel {
            None => CancelHandle::new(move || {
                unsubscribes.fetch_add(1, Ordering::SeqCst);
            }),
            Some(work) => {
                let (stop_tx, stop_rx) = oneshot::channel::<()>();
                let stop_tx = Mutex::new(Some(stop_tx));
                let updates = updates.take_until(stop_rx).boxed();
                let cancel = CancelHandle::new(move || {
                    drop(stop_tx.lock().take());
                    std::thread::sleep(work);
                    unsubscribes.fetch_add(1, Ordering::SeqCst);
                });
                return Ok(Subscription::new(updates, cancel));
            }
        };
        Ok(Subscription::new(updates, cancel))
    }

    async fn query_status(&self, _handle: &ResourceHandle) -> Result<StatusUpdate<R>, BackendError> {
        self.counters.queries.fetch_add(1, Ordering::SeqCst);
        match self.query.clone() {
            QueryScript::Hang => futures::future::pending().await,
            QueryScript::Answer { delay, update } => {
                tokio::time::sleep(delay).await;
                Ok(update)
            }
            QueryScript::Fail { delay, message } => {
                tokio::time::sleep(delay).await;
                Err(BackendError::Rejected(message))
            }
        }
    }
}

// Fixtures

pub fn point(lon: f64, lat: f64, name: Option<&str>) -> PointFeature {
    PointFeature {
        geometry: Some(PointGeometry {
            kind: Some("Point".to_string()),
            coordinates: vec![lon, lat],
        }),
        properties: name.map(|n| {
            let mut props = evroute_model::JsonMap::new();
            props.insert("name".to_string(), n.into());
            props
        }),
    }
}

fn step(kind: &str, distance: f64, duration: f64) -> Step {
    Step {
        kind: Some(kind.to_string()),
        distance,
        duration,
        polyline: None,
    }
}

/// Hanover to Aalborg with one charging stop and a ferry on the final leg
pub fn sample_route() -> Route {
    Route {
        id: Some("route-1".to_string()),
        charges: Some(1),
        charge_time: Some(1_800.0),
        distance: Some(512_000.0),
        duration: Some(21_600.0),
        consumption: Some(86.4),
        polyline: Some("_p~iF~ps|U_ulLnnqC_mqNvxq`@".to_string()),
        tags: vec!["toll".to_string(), "ferry".to_string()],
        legs: vec![
            Leg {
                kind: Some("station".to_string()),
                name: Some("Ionity Hamburg".to_string()),
                distance: Some(160_000.0),
                duration: Some(5_400.0),
                charge_time: Some(1_800.0),
                plugs_available: Some(4),
                range_start_percentage: Some(100.0),
                range_end_percentage: Some(22.0),
                origin: Some(point(9.7326, 52.3806, Some("Hanover, Germany"))),
                destination: Some(point(10.0, 53.55, Some("Ionity Hamburg"))),
                steps: vec![step("road", 100_000.0, 3_300.0), step("toll", 60_000.0, 2_100.0)],
                ..Leg::default()
            },
            Leg {
                kind: Some("final".to_string()),
                distance: Some(352_000.0),
                duration: Some(14_400.0),
                range_start_percentage: Some(90.0),
                range_end_percentage: Some(15.0),
                origin: Some(point(10.0, 53.55, None)),
                destination: Some(point(9.9222, 57.0461, Some("Aalborg, Denmark"))),
                steps: vec![
                    step("road", 200_000.0, 7_200.0),
                    step("ferry", 20_000.0, 3_600.0),
                    step("road", 132_000.0, 3_600.0),
                ],
                ..Leg::default()
            },
        ],
        ..Route::default()
    }
}

pub fn sample_route_update() -> RouteUpdate {
    let fastest = sample_route();
    let mut slower = fastest.clone();
    slower.id = Some("route-1-alt".to_string());
    slower.duration = fastest.duration.map(|d| d + 1_200.0);
    RouteUpdate {
        route: fastest,
        alternatives: vec![slower],
    }
}

pub fn sample_isoline() -> Isoline {
    let band = |index: u32, size: f64| IsolinePolygon {
        kind: Some("Feature".to_string()),
        geometry: PolygonGeometry {
            coordinates: vec![vec![
                vec![8.68 - size, 50.11 - size],
                vec![8.68 + size, 50.11 - size],
                vec![8.68 + size, 50.11 + size],
                vec![8.68 - size, 50.11 + size],
                vec![8.68 - size, 50.11 - size],
            ]],
        },
        properties: PolygonProperties { index: Some(index) },
    };
    Isoline {
        id: Some("iso-1".to_string()),
        polygons: vec![band(1, 0.5), band(0, 0.25)],
        polygon_count: Some(2),
        season: Some("summer".to_string()),
        origin: Some(point(8.6821, 50.1109, Some("Frankfurt, Germany"))),
    }
}

pub fn route_request() -> RouteRequest {
    RouteRequest::new(
        EvSpec::new("5d161be5c9eef46132d9d20a"),
        &Location::new(9.7326, 52.3806).unwrap().with_name("Hanover, Germany"),
        &Location::new(9.9222, 57.0461).unwrap().with_name("Aalborg, Denmark"),
    )
}

pub fn isoline_request() -> IsolineRequest {
    IsolineRequest::new(
        "5d161beec9eef4c250d9d225",
        &Location::new(8.6821, 50.1109).unwrap().with_name("Frankfurt, Germany"),
    )
}
