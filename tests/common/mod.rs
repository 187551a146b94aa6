// tests/common/mod.rs
//! Shared test doubles: an in-memory transport and a local mock collector

#![allow(dead_code)]

use bytes::Bytes;
use futures::future::BoxFuture;
use futures::FutureExt;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use parking_lot::Mutex;
use serde_json::Value;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokebi::{Result, SdkConfig, TokebiError, Transport};
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// Config pointing the player id file into `dir`
pub fn test_config(dir: &Path) -> SdkConfig {
    SdkConfig {
        api_key: "test_key".to_string(),
        game_name: "Test Game".to_string(),
        data_dir: Some(dir.to_path_buf()),
        ..Default::default()
    }
}

/// In-memory transport
///
/// Registration and batch sends each wait on their own gate, so tests can
/// hold a request in flight.
pub struct MemoryTransport {
    game_id: Option<String>,
    register_gate: Semaphore,
    send_gate: Semaphore,
    pub registrations: Mutex<Vec<String>>,
    pub batches: Mutex<Vec<Value>>,
}

impl MemoryTransport {
    /// Registration answers with `game_id`, or fails when `None`
    pub fn new(game_id: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            game_id: game_id.map(str::to_string),
            register_gate: Semaphore::new(Semaphore::MAX_PERMITS),
            send_gate: Semaphore::new(Semaphore::MAX_PERMITS),
            registrations: Mutex::new(Vec::new()),
            batches: Mutex::new(Vec::new()),
        })
    }

    /// Registration and sends block until released
    pub fn gated(game_id: Option<&str>, hold_register: bool, hold_send: bool) -> Arc<Self> {
        Arc::new(Self {
            game_id: game_id.map(str::to_string),
            register_gate: Semaphore::new(if hold_register { 0 } else { Semaphore::MAX_PERMITS }),
            send_gate: Semaphore::new(if hold_send { 0 } else { Semaphore::MAX_PERMITS }),
            registrations: Mutex::new(Vec::new()),
            batches: Mutex::new(Vec::new()),
        })
    }

    pub fn release_registration(&self) {
        self.register_gate.add_permits(1);
    }

    pub fn release_sends(&self) {
        self.send_gate.add_permits(Semaphore::MAX_PERMITS / 2);
    }

    /// `eventType` of every delivered event, in delivery order
    pub fn delivered_types(&self) -> Vec<String> {
        self.batches
            .lock()
            .iter()
            .flat_map(|batch| batch["events"].as_array().cloned().unwrap_or_default())
            .map(|event| event["eventType"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches
            .lock()
            .iter()
            .map(|batch| batch["events"].as_array().map(Vec::len).unwrap_or(0))
            .collect()
    }

    /// Poll until at least `count` batches arrived
    pub async fn wait_for_batches(&self, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if self.batches.lock().len() >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        self.batches.lock().len() >= count
    }
}

impl Transport for MemoryTransport {
    fn register_game(&self, body: String) -> BoxFuture<'_, Result<String>> {
        async move {
            self.register_gate
                .acquire()
                .await
                .map_err(|e| TokebiError::RegistrationFailed(e.to_string()))?
                .forget();
            self.registrations.lock().push(body);
            match &self.game_id {
                Some(id) => Ok(format!(r#"{{"success":true,"game_id":"{}"}}"#, id)),
                None => Err(TokebiError::RegistrationFailed("HTTP 401".to_string())),
            }
        }
        .boxed()
    }

    fn send_batch(&self, body: String) -> BoxFuture<'_, Result<()>> {
        async move {
            self.send_gate
                .acquire()
                .await
                .map_err(|e| TokebiError::DeliveryFailed(e.to_string()))?
                .forget();
            let batch: Value = serde_json::from_str(&body)?;
            self.batches.lock().push(batch);
            Ok(())
        }
        .boxed()
    }
}

/// A request seen by the mock collector
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

/// Local HTTP collector answering `/api/games` and `/api/track`
pub struct MockCollector {
    pub addr: SocketAddr,
    pub requests: Arc<Mutex<Vec<RecordedRequest>>>,
    handle: JoinHandle<()>,
}

impl MockCollector {
    pub async fn start(register_body: &'static str, track_status: StatusCode) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));

        let recorded = Arc::clone(&requests);
        let handle = tokio::spawn(async move {
            loop {
                let (stream, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(_) => continue,
                };
                let recorded = Arc::clone(&recorded);

                tokio::spawn(async move {
                    let io = TokioIo::new(stream);
                    let service = service_fn(move |req| {
                        let recorded = Arc::clone(&recorded);
                        async move { handle(req, recorded, register_body, track_status).await }
                    });
                    let _ = http1::Builder::new().serve_connection(io, service).await;
                });
            }
        });

        Self {
            addr,
            requests,
            handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }
}

impl Drop for MockCollector {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn handle(
    req: Request<Incoming>,
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
    register_body: &'static str,
    track_status: StatusCode,
) -> std::result::Result<Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    let header = |name: &str| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    let body = body
        .collect()
        .await
        .map(|collected| collected.to_bytes())
        .unwrap_or_default();

    let request = RecordedRequest {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        authorization: header("authorization"),
        content_type: header("content-type"),
        body: String::from_utf8_lossy(&body).into_owned(),
    };
    let path = request.path.clone();
    recorded.lock().push(request);

    let (status, body) = match path.as_str() {
        "/api/games" => (StatusCode::OK, register_body),
        "/api/track" => (track_status, "{}"),
        _ => (StatusCode::NOT_FOUND, "not found"),
    };

    Ok(Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Full::new(Bytes::from(body)))
        .unwrap())
}
