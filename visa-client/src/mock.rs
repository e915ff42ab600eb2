//! Scripted in-memory transport for unit tests

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tokio::time::Instant;

use crate::error::{ClientError, ClientResult};
use crate::transport::{ApiRequest, HttpMethod, HttpTransport, RawResponse, RequestBody};

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: HttpMethod,
    pub path: String,
    pub bearer: Option<String>,
    pub body: RequestBody,
    pub at: Instant,
}

/// Responses are queued per (method, path); the last one repeats.
/// Unscripted routes answer 404.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<(HttpMethod, String), VecDeque<ClientResult<RawResponse>>>>,
    log: Mutex<Vec<Recorded>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, method: HttpMethod, path: &str, status: u16, body: Value) {
        let body = if body.is_null() { Vec::new() } else { body.to_string().into_bytes() };
        self.push(
            method,
            path,
            Ok(RawResponse {
                status,
                retry_after: None,
                body,
            }),
        );
    }

    pub fn fail(&self, method: HttpMethod, path: &str, message: &str) {
        self.push(method, path, Err(ClientError::network(message)));
    }

    fn push(&self, method: HttpMethod, path: &str, response: ClientResult<RawResponse>) {
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(response);
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.log.lock().unwrap().clone()
    }

    pub fn count(&self, method: HttpMethod, path: &str) -> usize {
        self.times(method, path).len()
    }

    pub fn times(&self, method: HttpMethod, path: &str) -> Vec<Instant> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .map(|r| r.at)
            .collect()
    }

    /// Requests other than GET
    pub fn mutations(&self) -> Vec<Recorded> {
        self.requests().into_iter().filter(|r| r.method != HttpMethod::Get).collect()
    }
}

fn replay(response: &ClientResult<RawResponse>) -> ClientResult<RawResponse> {
    match response {
        Ok(raw) => Ok(raw.clone()),
        Err(e) => Err(ClientError::network(e.to_string())),
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: &ApiRequest) -> ClientResult<RawResponse> {
        self.log.lock().unwrap().push(Recorded {
            method: request.method,
            path: request.path.clone(),
            bearer: request.bearer.clone(),
            body: request.body.clone(),
            at: Instant::now(),
        });

        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(&(request.method, request.path.clone())) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_else(|| Err(ClientError::Cancelled)),
            Some(queue) => queue.front().map(replay).unwrap_or_else(|| Err(ClientError::Cancelled)),
            None => Ok(RawResponse {
                status: 404,
                retry_after: None,
                body: br#"{"detail":"not scripted"}"#.to_vec(),
            }),
        }
    }
}
