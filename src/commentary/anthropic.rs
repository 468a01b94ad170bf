//! Anthropic Claude commentary provider.
//!
//! Implements `CommentaryGenerator` over the Anthropic Messages API.
//! Rate limits, overload and server errors are retried with exponential
//! backoff; any other HTTP error fails the call at once.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::prompts::{build_comparison_prompt, build_summary_prompt, system_prompt};
use super::{parse_reply, CommentaryGenerator, ComparisonReply, ModeSummary, SeasonSummary, StrategyComparison};
use crate::types::{season_key, SimulationResult};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_MAX_TOKENS: u32 = 2048;

const TEMPERATURE: f32 = 0.3;

/// Retries after the first attempt.
const MAX_RETRIES: u32 = 3;

/// First backoff delay (ms); doubles on each retry.
const BASE_BACKOFF_MS: u64 = 1000;

// ---------------------------------------------------------------------------
// API types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: [UserMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Usage,
}

impl MessagesResponse {
    /// Concatenated text blocks of the reply.
    fn text(&self) -> String {
        self.content.iter().filter_map(|b| b.text.as_deref()).collect()
    }
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct Usage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

/// Outcome of one HTTP attempt that did not fail outright.
enum Attempt {
    Reply(MessagesResponse),
    Retryable(String),
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Delay before retry number `retry` (1-based).
fn backoff(retry: u32) -> Duration {
    Duration::from_millis(BASE_BACKOFF_MS << (retry.saturating_sub(1)))
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct AnthropicAnalyst {
    http: Client,
    api_key: SecretString,
    model: String,
    max_tokens: u32,
}

impl AnthropicAnalyst {
    pub fn new(api_key: SecretString, model: Option<String>, max_tokens: Option<u32>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .context("Failed to build Anthropic HTTP client")?;

        Ok(Self {
            http,
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens: max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        })
    }

    fn request<'a>(&'a self, system: &'a str, prompt: &'a str) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: TEMPERATURE,
            system,
            messages: [UserMessage {
                role: "user",
                content: prompt,
            }],
        }
    }

    async fn send(&self, request: &MessagesRequest<'_>) -> Result<Attempt> {
        let response = match self
            .http
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return Ok(Attempt::Retryable(format!("request error: {e}"))),
        };

        let status = response.status();
        if status.is_success() {
            let body: MessagesResponse = response
                .json()
                .await
                .context("Failed to parse Anthropic response")?;
            return Ok(Attempt::Reply(body));
        }

        let detail = response.text().await.unwrap_or_default();
        if is_retryable(status) {
            Ok(Attempt::Retryable(format!("HTTP {status}: {detail}")))
        } else {
            anyhow::bail!("Anthropic API error {status}: {detail}")
        }
    }

    /// Ask the model and return its reply text.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        let request = self.request(system, prompt);
        let mut last_error = String::new();

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let delay = backoff(attempt);
                debug!(attempt, delay_ms = delay.as_millis() as u64, "Retrying commentary request");
                tokio::time::sleep(delay).await;
            }

            match self.send(&request).await? {
                Attempt::Reply(body) => {
                    debug!(
                        model = %self.model,
                        input_tokens = body.usage.input_tokens,
                        output_tokens = body.usage.output_tokens,
                        "Commentary reply received"
                    );
                    return Ok(body.text());
                }
                Attempt::Retryable(reason) => {
                    warn!(attempt, error = %reason, "Commentary request failed, will retry");
                    last_error = reason;
                }
            }
        }

        anyhow::bail!("Anthropic API failed after {MAX_RETRIES} retries: {last_error}")
    }
}

// ---------------------------------------------------------------------------
// CommentaryGenerator implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl CommentaryGenerator for AnthropicAnalyst {
    async fn summarise(&self, result: &SimulationResult) -> Result<SeasonSummary> {
        debug!(
            club = %result.request.club,
            mode = %result.request.mode,
            model = %self.model,
            "Requesting season summary"
        );

        let prompt = build_summary_prompt(result);
        let text = self
            .complete(system_prompt(), &prompt)
            .await
            .context("Season summary request failed")?;

        let summary: SeasonSummary = parse_reply(&text)?;
        summary.validate()?;

        info!(
            club = %result.request.club,
            season = %season_key(result.request.season),
            mode = %result.request.mode,
            justifications = summary.transfer_justifications.len(),
            "Season summary complete"
        );
        Ok(summary)
    }

    async fn compare(&self, results: &[SimulationResult]) -> Result<StrategyComparison> {
        if results.is_empty() {
            anyhow::bail!("Nothing to compare");
        }

        let summaries: Vec<ModeSummary> = results.iter().map(ModeSummary::from_result).collect();
        let prompt = build_comparison_prompt(results, &summaries);
        let text = self
            .complete(system_prompt(), &prompt)
            .await
            .context("Strategy comparison request failed")?;

        let reply: ComparisonReply = parse_reply(&text)?;
        let comparison = reply.into_comparison(summaries)?;

        info!(
            club = %results[0].request.club,
            recommended = %comparison.recommended_mode,
            "Strategy comparison complete"
        );
        Ok(comparison)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
