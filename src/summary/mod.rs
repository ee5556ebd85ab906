//! Natural-language profile summaries
//!
//! Builds a prompt from the aggregated profile, sends it to the language
//! service through a [`ResilientCaller`] and caps the reply length.

mod prompt;

use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::LanguageConfig;
use crate::error::{InsightError, InsightResult};
use crate::resilience::{RequestContext, ResilientCaller};
use crate::types::ProfileData;

pub use prompt::{build_prompt, truncate_chars};

/// Hard cap on summary length, in characters
pub const MAX_SUMMARY_CHARS: usize = 2000;

/// Produces a summary text for aggregated profile data
#[async_trait]
pub trait SummaryGenerator: Send + Sync {
    async fn generate(&self, ctx: &RequestContext, data: &ProfileData) -> InsightResult<String>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    text: String,
}

/// HTTP client for the generative-language service
pub struct LanguageServiceClient {
    http: reqwest::Client,
    url: String,
    token: String,
    caller: ResilientCaller,
}

impl LanguageServiceClient {
    pub fn new(http: reqwest::Client, config: &LanguageConfig, caller: ResilientCaller) -> Self {
        Self {
            http,
            url: config.url.clone(),
            token: config.token.clone(),
            caller,
        }
    }

    pub fn caller(&self) -> &ResilientCaller {
        &self.caller
    }
}

#[async_trait]
impl SummaryGenerator for LanguageServiceClient {
    async fn generate(&self, ctx: &RequestContext, data: &ProfileData) -> InsightResult<String> {
        let prompt = build_prompt(data);
        let start = Instant::now();

        let text = self
            .caller
            .call(ctx, || {
                let mut request = self
                    .http
                    .post(&self.url)
                    .json(&GenerateRequest { prompt: &prompt });
                if !self.token.is_empty() {
                    request = request.bearer_auth(&self.token);
                }
                async move {
                    let response = request.send().await?;
                    let status = response.status();
                    let body = response.text().await?;
                    if !status.is_success() {
                        return Err(InsightError::from_status(status.as_u16(), &body));
                    }
                    let parsed: GenerateResponse = serde_json::from_str(&body)
                        .map_err(|e| InsightError::Decode(format!("invalid summary response: {}", e)))?;
                    Ok(parsed.text)
                }
            })
            .await?;

        let summary = truncate_chars(&text, MAX_SUMMARY_CHARS);
        info!(
            latency_ms = start.elapsed().as_millis() as u64,
            summary_len = summary.chars().count(),
            wall_posts = data.wall.len(),
            friends = data.friends.len(),
            gifts = data.gifts.len(),
            "summary generated"
        );

        Ok(summary)
    }
}
