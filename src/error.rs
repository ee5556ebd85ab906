//! Error taxonomy shared by every stage of the pipeline

use std::fmt;

/// Result type for pipeline operations
pub type InsightResult<T> = Result<T, InsightError>;

/// Coarse error classification used by the retry classifier and the HTTP layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transient,
    Permanent,
    Unavailable,
    Decode,
    NotFound,
    Internal,
    Cancelled,
}

/// Errors that can occur while fetching, aggregating or persisting a profile
#[derive(Debug)]
pub enum InsightError {
    /// Network failure, HTTP 5xx or 429. Only seen inside the retry driver.
    Transient(String),
    /// Upstream rejected the request (4xx or an application error object)
    Permanent { code: i64, message: String },
    /// Breaker open or retries exhausted
    Unavailable(String),
    /// Response body did not parse as expected
    Decode(String),
    /// Upstream returned an empty result set
    NotFound(String),
    /// Marshal or persistence failure
    Internal(String),
    /// Caller cancelled the request or its deadline passed
    Cancelled,
}

impl InsightError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            InsightError::Transient(_) => ErrorKind::Transient,
            InsightError::Permanent { .. } => ErrorKind::Permanent,
            InsightError::Unavailable(_) => ErrorKind::Unavailable,
            InsightError::Decode(_) => ErrorKind::Decode,
            InsightError::NotFound(_) => ErrorKind::NotFound,
            InsightError::Internal(_) => ErrorKind::Internal,
            InsightError::Cancelled => ErrorKind::Cancelled,
        }
    }

    pub fn permanent(code: i64, message: impl Into<String>) -> Self {
        InsightError::Permanent {
            code,
            message: message.into(),
        }
    }

    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            429 => InsightError::Transient(format!("rate limited: status=429 {}", truncate_body(body))),
            500..=599 => InsightError::Transient(format!("server error: status={} {}", status, truncate_body(body))),
            _ => InsightError::permanent(status as i64, truncate_body(body)),
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }
}

impl fmt::Display for InsightError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsightError::Transient(msg) => write!(f, "Transient error: {}", msg),
            InsightError::Permanent { code, message } => {
                write!(f, "Permanent error: code={} msg={}", code, message)
            }
            InsightError::Unavailable(msg) => write!(f, "Service unavailable: {}", msg),
            InsightError::Decode(msg) => write!(f, "Decode error: {}", msg),
            InsightError::NotFound(msg) => write!(f, "Not found: {}", msg),
            InsightError::Internal(msg) => write!(f, "Internal error: {}", msg),
            InsightError::Cancelled => write!(f, "Request cancelled"),
        }
    }
}

impl std::error::Error for InsightError {}

impl From<serde_json::Error> for InsightError {
    fn from(e: serde_json::Error) -> Self {
        InsightError::Internal(format!("JSON error: {}", e))
    }
}

impl From<std::io::Error> for InsightError {
    fn from(e: std::io::Error) -> Self {
        InsightError::Internal(format!("IO error: {}", e))
    }
}

impl From<reqwest::Error> for InsightError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_builder() {
            // Malformed URL or request: a configuration fault, never retried
            InsightError::Internal(format!("invalid request: {}", e))
        } else if e.is_redirect() {
            let code = e.status().map_or(0, |s| s.as_u16() as i64);
            InsightError::permanent(code, e.to_string())
        } else if e.is_decode() {
            InsightError::Decode(e.to_string())
        } else {
            InsightError::Transient(e.to_string())
        }
    }
}

impl From<redis::RedisError> for InsightError {
    fn from(e: redis::RedisError) -> Self {
        InsightError::Unavailable(format!("cache error: {}", e))
    }
}

fn truncate_body(body: &str) -> String {
    if body.chars().count() > 300 {
        let head: String = body.chars().take(300).collect();
        format!("{}...", head)
    } else {
        body.to_string()
    }
}
