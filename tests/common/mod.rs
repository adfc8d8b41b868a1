//! Shared helpers for integration tests.
//!
//! - Accra coordinates used throughout the scenarios
//! - A call-counting mock provider
//! - A canned-response axum server for the real providers

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use axum::Router;
use axum::body::to_bytes;
use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use tokio::net::TcpListener;

use route_cluster::polyline::Polyline;
use route_cluster::{Coordinate, ProviderError, ProviderTier, Route, RouteProvider, RouteRequest};

pub fn coord(lat: f64, lng: f64) -> Coordinate {
    Coordinate::new(lat, lng).unwrap()
}

/// Accra origin/destination pair.
pub fn accra_request() -> RouteRequest {
    RouteRequest::new(coord(5.6037, -0.1870), coord(5.6145, -0.2060))
}

pub fn road_route(
    tier: ProviderTier,
    request: &RouteRequest,
    distance_km: f64,
    duration_minutes: f64,
) -> Route {
    Route {
        distance_km,
        duration_minutes,
        geometry: Polyline::new(vec![request.origin, request.destination]),
        source: tier,
        is_estimate: false,
    }
}

type Behavior = dyn Fn(&RouteRequest) -> Result<Route, ProviderError> + Send + Sync;

/// Provider whose answers come from a closure; counts every call.
pub struct MockProvider {
    tier: ProviderTier,
    calls: Arc<AtomicUsize>,
    behavior: Box<Behavior>,
}

impl MockProvider {
    pub fn new(
        tier: ProviderTier,
        behavior: impl Fn(&RouteRequest) -> Result<Route, ProviderError> + Send + Sync + 'static,
    ) -> (Box<dyn RouteProvider>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = MockProvider {
            tier,
            calls: Arc::clone(&calls),
            behavior: Box::new(behavior),
        };
        (Box::new(provider), calls)
    }

    pub fn succeeding(
        tier: ProviderTier,
        distance_km: f64,
        duration_minutes: f64,
    ) -> (Box<dyn RouteProvider>, Arc<AtomicUsize>) {
        Self::new(tier, move |request| Ok(road_route(tier, request, distance_km, duration_minutes)))
    }

    pub fn failing(tier: ProviderTier) -> (Box<dyn RouteProvider>, Arc<AtomicUsize>) {
        Self::new(tier, move |_| Err(ProviderError::unavailable(tier, "connection refused")))
    }
}

impl RouteProvider for MockProvider {
    fn tier(&self) -> ProviderTier {
        self.tier
    }

    fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        _timeout: Duration,
    ) -> Result<Route, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.behavior)(&RouteRequest::new(origin, destination))
    }
}

pub fn calls(counter: &Arc<AtomicUsize>) -> usize {
    counter.load(Ordering::SeqCst)
}

/// What the stub server saw of the last request.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path and query string.
    pub uri: String,
    pub authorization: Option<String>,
    pub body: String,
}

struct Canned {
    status: StatusCode,
    body: String,
    delay: Duration,
    hits: AtomicUsize,
    last_request: Mutex<Option<RecordedRequest>>,
}

/// Local axum server answering every request with the same response.
pub struct StubServer {
    pub base_url: String,
    canned: Arc<Canned>,
}

impl StubServer {
    pub fn start(status: u16, body: &str) -> Self {
        Self::start_delayed(status, body, Duration::ZERO)
    }

    pub fn start_delayed(status: u16, body: &str, delay: Duration) -> Self {
        let canned = Arc::new(Canned {
            status: StatusCode::from_u16(status).expect("valid status"),
            body: body.to_string(),
            delay,
            hits: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        });

        // Bound up front so the address is known before the runtime starts.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind stub server");
        listener.set_nonblocking(true).expect("non-blocking listener");
        let base_url = format!("http://{}", listener.local_addr().expect("stub address"));

        let app = Router::new().fallback(answer).with_state(Arc::clone(&canned));
        thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("stub runtime");
            runtime.block_on(async move {
                let listener = TcpListener::from_std(listener).expect("stub listener");
                let _ = axum::serve(listener, app).await;
            });
        });

        Self { base_url, canned }
    }

    pub fn hits(&self) -> usize {
        self.canned.hits.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.canned.last_request.lock().unwrap().clone()
    }
}

async fn answer(State(canned): State<Arc<Canned>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let body = to_bytes(body, usize::MAX).await.unwrap_or_default();
    canned.hits.fetch_add(1, Ordering::SeqCst);
    *canned.last_request.lock().unwrap() = Some(RecordedRequest {
        method: parts.method.to_string(),
        uri: parts.uri.to_string(),
        authorization: parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned),
        body: String::from_utf8_lossy(&body).into_owned(),
    });

    tokio::time::sleep(canned.delay).await;
    (
        canned.status,
        [(header::CONTENT_TYPE, "application/json")],
        canned.body.clone(),
    )
        .into_response()
}
