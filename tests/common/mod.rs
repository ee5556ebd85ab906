//! Scripted upstream server shared by the integration tests

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use parking_lot::Mutex;
use serde_json::Value;

use profile_insight::config::{LanguageConfig, SocialConfig};
use profile_insight::resilience::{
    CircuitBreaker, CircuitBreakerConfig, RecordingSleeper, ResilientCaller, RetryPolicy,
};

/// One request seen by the mock
#[derive(Debug, Clone)]
pub struct Seen {
    pub method: String,
    pub query: HashMap<String, String>,
    pub body: Option<Value>,
    pub authorization: Option<String>,
}

/// Answers each method from a reply queue; the last reply repeats forever
#[derive(Default)]
pub struct MockUpstream {
    hits: AtomicUsize,
    seen: Mutex<Vec<Seen>>,
    replies: Mutex<HashMap<String, VecDeque<(u16, String)>>>,
}

impl MockUpstream {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, method: &str, status: u16, body: impl Into<String>) -> &Self {
        self.replies
            .lock()
            .entry(method.to_string())
            .or_default()
            .push_back((status, body.into()));
        self
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn hits_for(&self, method: &str) -> usize {
        self.seen.lock().iter().filter(|s| s.method == method).count()
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().clone()
    }

    fn answer(&self, seen: Seen) -> (StatusCode, String) {
        self.hits.fetch_add(1, Ordering::SeqCst);
        let method = seen.method.clone();
        self.seen.lock().push(seen);

        let mut replies = self.replies.lock();
        let queue = match replies.get_mut(&method) {
            Some(q) if !q.is_empty() => q,
            _ => return (StatusCode::NOT_FOUND, format!("no reply for {}", method)),
        };
        let (status, body) = if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue.front().cloned().unwrap()
        };
        (StatusCode::from_u16(status).unwrap(), body)
    }
}

async fn social_method(
    State(mock): State<Arc<MockUpstream>>,
    Path(method): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> (StatusCode, String) {
    mock.answer(Seen {
        method,
        query,
        body: None,
        authorization: None,
    })
}

async fn generate(
    State(mock): State<Arc<MockUpstream>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, String) {
    let authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    mock.answer(Seen {
        method: "generate".to_string(),
        query: HashMap::new(),
        body: Some(body),
        authorization,
    })
}

/// Serve `mock` on an ephemeral port and return its base URL
pub async fn spawn(mock: Arc<MockUpstream>) -> String {
    let app = Router::new()
        .route("/method/:name", get(social_method))
        .route("/generate", post(generate))
        .with_state(mock);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

pub fn social_config(base: &str) -> SocialConfig {
    SocialConfig {
        base_url: format!("{}/method", base),
        access_token: "tok".to_string(),
        api_version: "5.199".to_string(),
        timeout_secs: 5,
    }
}

pub fn language_config(base: &str) -> LanguageConfig {
    LanguageConfig {
        url: format!("{}/generate", base),
        token: "secret".to_string(),
        timeout_secs: 5,
    }
}

/// Caller with default breaker/retry settings and recorded, instant backoff
pub fn caller(name: &str) -> (ResilientCaller, Arc<RecordingSleeper>) {
    let sleeper = RecordingSleeper::new();
    let caller = ResilientCaller::from_parts(
        CircuitBreaker::new(name, CircuitBreakerConfig::default()),
        RetryPolicy::default(),
        sleeper.clone(),
        Duration::from_secs(5),
    );
    (caller, sleeper)
}

pub const USER_1: &str = r#"{"response":[{"id":1,"first_name":"Ann","last_name":"Lee","screen_name":"annlee","sex":1,"bdate":"1.2.1990","city":{"id":2,"title":"Paris"},"about":"Painter"}]}"#;

pub const WALL_1: &str = r#"{"response":{"count":2,"items":[
    {"id":10,"date":0,"text":"hello","likes":{"count":3},"reposts":{"count":1},"comments":{"count":2},"views":{"count":50},"post_type":"post","is_pinned":1},
    {"id":11,"date":86400,"text":"world","likes":{"count":0},"post_type":"post"}
]}}"#;

pub const GIFTS_1: &str = r#"{"response":{"count":1,"items":[{"id":5,"message":""}]}}"#;

pub const FRIENDS_1: &str = r#"{"response":{"count":1,"items":[{"id":2,"first_name":"Bo","last_name":"Kim","sex":2}]}}"#;
