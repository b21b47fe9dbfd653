//! Mock implementations of platform traits for testing

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use crate::config::{Config, EndpointMode, IdentityRequest, RunnerPaths};
use crate::error::{ActionError, Result};
use crate::platform::{Environment, HttpClient, HttpResponse, Sleeper};

/// Scripted reply for a mocked request
pub enum MockReply {
    Response(HttpResponse),
    TransportError(String),
}

impl MockReply {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self::Response(HttpResponse::new(status, body.to_string()))
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self::Response(HttpResponse::new(status, body))
    }
}

/// Request observed by the mock HTTP client
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Mock HTTP client with replies scripted per URL pattern.
///
/// Replies for a pattern are consumed in order; the last one repeats once the queue is
/// down to a single entry.
pub struct MockHttp {
    routes: Mutex<Vec<(String, VecDeque<MockReply>)>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockHttp {
    pub fn new() -> Self {
        Self {
            routes: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn route(self, pattern: &str, replies: Vec<MockReply>) -> Self {
        self.routes
            .lock()
            .unwrap()
            .push((pattern.to_string(), replies.into_iter().collect()));
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_matching(&self, pattern: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.url.contains(pattern))
            .collect()
    }
}

#[async_trait(?Send)]
impl HttpClient for MockHttp {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(RecordedRequest {
            url: url.to_string(),
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });

        let mut routes = self.routes.lock().unwrap();
        for (pattern, replies) in routes.iter_mut() {
            if !url.contains(pattern.as_str()) {
                continue;
            }
            let reply = if replies.len() > 1 {
                replies.pop_front()
            } else {
                None
            };
            let reply = match reply.as_ref().or(replies.front()) {
                Some(MockReply::Response(response)) => Ok(response.clone()),
                Some(MockReply::TransportError(message)) => {
                    Err(ActionError::upstream(message.clone()))
                }
                None => break,
            };
            return reply;
        }
        Err(ActionError::upstream(format!("no mock response for GET {}", url)))
    }
}

/// Sleeper that records requested delays and returns immediately
pub struct MockSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl MockSleeper {
    pub fn new() -> Self {
        Self {
            delays: Mutex::new(Vec::new()),
        }
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait(?Send)]
impl Sleeper for MockSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

/// Mock environment backed by an in-memory HashMap
pub struct MockEnv {
    vars: HashMap<String, String>,
}

impl MockEnv {
    pub fn new(vars: HashMap<String, String>) -> Self {
        Self { vars }
    }

    /// Later pairs override earlier ones with the same name
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

impl Environment for MockEnv {
    fn get_var(&self, name: &str) -> Result<String> {
        self.vars
            .get(name)
            .cloned()
            .ok_or_else(|| ActionError::invalid_config(format!("variable '{}' not found", name)))
    }
}

/// Build an unsigned JWT-shaped token carrying the given claims
pub fn fake_jwt(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.signature", header, payload)
}

/// Valid configuration for the given mode, with no runner files
pub fn test_config(mode: EndpointMode) -> Config {
    Config {
        identity_request: IdentityRequest {
            url: "https://token.actions.example/id?api-version=2.0".to_string(),
            token: "request-token".to_string(),
        },
        domain: "sts.example.com".to_string(),
        audience: "sts.example.com".to_string(),
        policy: "deploy".to_string(),
        mode,
        paths: RunnerPaths::default(),
    }
}
