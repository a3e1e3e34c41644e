//! External generative text service boundary.
//!
//! # Responsibility
//! - Define the prompt-in/text-out contract consumed by generation services.
//! - Provide a blocking Gemini implementation configured from the environment.
//!
//! # Invariants
//! - One call per `generate`; no retries, no backoff.
//! - Timeouts apply only when configured by the caller.
//! - Prompts and responses are never logged, only their sizes.

use crate::logging::truncate_chars;
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};

/// Default Gemini REST endpoint root.
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Default output token budget per call.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 6000;

const MAX_PROVIDER_MESSAGE_CHARS: usize = 300;

const ENV_API_KEY: &str = "GEMINI_API_KEY";
const ENV_MODEL: &str = "GEMINI_MODEL";
const ENV_ENDPOINT: &str = "GEMINI_ENDPOINT";
const ENV_MAX_OUTPUT_TOKENS: &str = "GEMINI_MAX_OUTPUT_TOKENS";
const ENV_TIMEOUT_SECS: &str = "GEMINI_TIMEOUT_SECS";

/// Failure talking to the generation service.
#[derive(Debug)]
pub enum ClientError {
    /// Required configuration is missing or malformed.
    Config(String),
    /// Request could not be sent or the response body could not be read.
    Transport(String),
    /// Provider answered with a non-success status.
    Provider { status: u16, message: String },
    /// Provider answered successfully but with no text.
    EmptyResponse,
}

impl ClientError {
    /// Stable machine-readable code for logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "client_config",
            Self::Transport(_) => "client_transport",
            Self::Provider { .. } => "client_provider",
            Self::EmptyResponse => "client_empty_response",
        }
    }
}

impl Display for ClientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(message) => write!(f, "generation client misconfigured: {message}"),
            Self::Transport(message) => write!(f, "generation request failed: {message}"),
            Self::Provider { status, message } => {
                write!(f, "generation provider returned {status}: {message}")
            }
            Self::EmptyResponse => write!(f, "generation provider returned no text"),
        }
    }
}

impl Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value.to_string())
    }
}

/// Blocking prompt-in/text-out generation service.
pub trait GenerationClient {
    fn generate(&self, prompt: &str) -> Result<String, ClientError>;
}

impl<C: GenerationClient + ?Sized> GenerationClient for &C {
    fn generate(&self, prompt: &str) -> Result<String, ClientError> {
        (**self).generate(prompt)
    }
}

impl<C: GenerationClient + ?Sized> GenerationClient for Box<C> {
    fn generate(&self, prompt: &str) -> Result<String, ClientError> {
        (**self).generate(prompt)
    }
}

/// Gemini connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    pub max_output_tokens: u32,
    /// Whole-request deadline; `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            request_timeout: None,
        }
    }

    /// Reads settings from `GEMINI_*` environment variables.
    ///
    /// # Errors
    /// - `GEMINI_API_KEY` or `GEMINI_MODEL` missing or blank.
    /// - Numeric settings that do not parse.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`GeminiConfig::from_env`] but reading through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ClientError> {
        let required = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or_else(|| ClientError::Config(format!("missing {key}")))
        };

        let mut config = Self::new(required(ENV_API_KEY)?, required(ENV_MODEL)?);
        if let Some(endpoint) = lookup(ENV_ENDPOINT).filter(|value| !value.trim().is_empty()) {
            config.endpoint = endpoint.trim().trim_end_matches('/').to_string();
        }
        if let Some(raw) = lookup(ENV_MAX_OUTPUT_TOKENS) {
            config.max_output_tokens = parse_number(ENV_MAX_OUTPUT_TOKENS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = parse_number(ENV_TIMEOUT_SECS, &raw)?;
            config.request_timeout = Some(Duration::from_secs(secs));
        }
        Ok(config)
    }

    fn generate_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ClientError> {
    raw.trim()
        .parse()
        .map_err(|_| ClientError::Config(format!("{key} must be a non-negative integer, got `{raw}`")))
}

/// Blocking Gemini `generateContent` client.
pub struct GeminiClient {
    config: GeminiConfig,
    http: reqwest::blocking::Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, ClientError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("studyset/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { config, http })
    }

    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(GeminiConfig::from_env()?)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [RequestContent<'a>; 1],
    generation_config: GenerationSettings,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationSettings {
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerationClient for GeminiClient {
    fn generate(&self, prompt: &str) -> Result<String, ClientError> {
        let started_at = Instant::now();
        let body = GenerateRequest {
            contents: [RequestContent {
                parts: [RequestPart { text: prompt }],
            }],
            generation_config: GenerationSettings {
                max_output_tokens: self.config.max_output_tokens,
            },
        };

        let result = self.send(&body);
        match &result {
            Ok(text) => info!(
                "event=generation_call module=generation status=ok model={} prompt_chars={} response_chars={} duration_ms={}",
                self.config.model,
                prompt.chars().count(),
                text.chars().count(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=generation_call module=generation status=error model={} duration_ms={} error_code={}",
                self.config.model,
                started_at.elapsed().as_millis(),
                err.code()
            ),
        }
        result
    }
}

impl GeminiClient {
    fn send(&self, body: &GenerateRequest<'_>) -> Result<String, ClientError> {
        let response = self
            .http
            .post(self.config.generate_url())
            .header("x-goog-api-key", self.config.api_key.as_str())
            .json(body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(ClientError::Provider {
                status: status.as_u16(),
                message: truncate_chars(&message, MAX_PROVIDER_MESSAGE_CHARS),
            });
        }

        let parsed: GenerateResponse = response.json()?;
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ClientError::EmptyResponse);
        }
        Ok(text)
    }
}
