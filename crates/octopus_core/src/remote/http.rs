//! PostgREST-style HTTP transport for the remote collection store.
//!
//! # Responsibility
//! - Map collection CRUD onto `{base_url}/rest/v1/{collection}` requests.
//! - Enforce a connect deadline and an overall request deadline, on top of
//!   per-operation read/write limits.
//! - Classify HTTP statuses and PostgREST error codes into `RemoteError`.
//!
//! # Invariants
//! - The API key is never logged.
//! - A deadline expiry is reported as `RemoteError::Timeout`.

use super::{RemoteError, RemoteResult, RemoteStore};
use crate::logging::sanitize_message;
use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;
use std::env;
use std::fmt::{Debug, Formatter};
use std::io::ErrorKind;
use std::time::{Duration, Instant};

const REST_PREFIX: &str = "rest/v1";
const CONNECT_TIMEOUT_MS_DEFAULT: u64 = 3_000;
const REQUEST_TIMEOUT_MS_DEFAULT: u64 = 15_000;
const MAX_ERROR_MESSAGE_CHARS: usize = 200;

/// PostgREST / Postgres error codes meaning "the row shape does not fit".
const SCHEMA_MISMATCH_CODES: &[&str] = &["PGRST204", "PGRST102", "42703", "22P02"];
/// Postgres `insufficient_privilege`, raised by row-level security.
const ACCESS_POLICY_CODE: &str = "42501";

/// Connection settings for [`HttpRemoteStore`].
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
}

impl Debug for RemoteConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}

impl RemoteConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim().trim_end_matches('/').to_string(),
            api_key: None,
            connect_timeout_ms: CONNECT_TIMEOUT_MS_DEFAULT,
            request_timeout_ms: REQUEST_TIMEOUT_MS_DEFAULT,
        }
    }

    /// Reads `OCTOPUS_REMOTE_*` variables.
    ///
    /// Returns `None` when `OCTOPUS_REMOTE_URL` is unset or blank. Timeouts
    /// outside their accepted range fall back to defaults.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`Self::from_env`] with variables resolved through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let base_url = non_blank(lookup("OCTOPUS_REMOTE_URL"))?;
        let mut config = Self::new(base_url);
        config.api_key = non_blank(lookup("OCTOPUS_REMOTE_API_KEY"));
        config.connect_timeout_ms = ranged_ms(
            lookup("OCTOPUS_REMOTE_CONNECT_TIMEOUT_MS"),
            100..=60_000,
            CONNECT_TIMEOUT_MS_DEFAULT,
        );
        config.request_timeout_ms = ranged_ms(
            lookup("OCTOPUS_REMOTE_REQUEST_TIMEOUT_MS"),
            100..=120_000,
            REQUEST_TIMEOUT_MS_DEFAULT,
        );
        Some(config)
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{REST_PREFIX}/{}", self.base_url, collection)
    }
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn ranged_ms(value: Option<String>, range: std::ops::RangeInclusive<u64>, default: u64) -> u64 {
    value
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| range.contains(value))
        .unwrap_or(default)
}

pub struct HttpRemoteStore {
    config: RemoteConfig,
    agent: ureq::Agent,
}

impl Debug for HttpRemoteStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRemoteStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HttpRemoteStore {
    pub fn new(config: RemoteConfig) -> Self {
        let request_timeout = Duration::from_millis(config.request_timeout_ms);
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_millis(config.connect_timeout_ms))
            .timeout_read(request_timeout)
            .timeout_write(request_timeout)
            .timeout(request_timeout)
            .build();
        Self { config, agent }
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    fn request(&self, method: &str, collection: &str) -> ureq::Request {
        let mut request = self
            .agent
            .request(method, &self.config.collection_url(collection))
            .set("accept", "application/json");
        if let Some(key) = self.config.api_key.as_deref() {
            request = request
                .set("apikey", key)
                .set("authorization", &format!("Bearer {key}"));
        }
        request
    }

    fn execute(
        &self,
        method: &'static str,
        collection: &str,
        send: impl FnOnce() -> Result<ureq::Response, ureq::Error>,
    ) -> RemoteResult<String> {
        let started_at = Instant::now();
        let outcome = match send() {
            Ok(response) => response.into_string().map_err(|err| {
                if matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) {
                    RemoteError::Timeout {
                        after_ms: self.config.request_timeout_ms,
                    }
                } else {
                    RemoteError::InvalidResponse(err.to_string())
                }
            }),
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                Err(classify_status(status, &body))
            }
            Err(ureq::Error::Transport(transport)) => Err(classify_transport(
                &transport.to_string(),
                self.config.request_timeout_ms,
            )),
        };

        let duration_ms = started_at.elapsed().as_millis();
        match &outcome {
            Ok(_) => debug!(
                "event=remote_request module=remote status=ok method={method} collection={collection} duration_ms={duration_ms}"
            ),
            Err(err) => warn!(
                "event=remote_request module=remote status=error method={method} collection={collection} duration_ms={duration_ms} error_code={} error={}",
                err.code(),
                sanitize_message(&err.to_string(), MAX_ERROR_MESSAGE_CHARS)
            ),
        }
        outcome
    }
}

impl RemoteStore for HttpRemoteStore {
    fn fetch_all(&self, collection: &str) -> RemoteResult<Vec<Value>> {
        let body = self.execute("GET", collection, || {
            self.request("GET", collection).query("select", "*").call()
        })?;
        serde_json::from_str::<Vec<Value>>(&body)
            .map_err(|err| RemoteError::InvalidResponse(format!("expected a JSON array: {err}")))
    }

    fn insert(&self, collection: &str, row: &Value) -> RemoteResult<()> {
        let body = serde_json::to_string(row).map_err(|err| RemoteError::Encode(err.to_string()))?;
        self.execute("POST", collection, || {
            self.request("POST", collection)
                .set("content-type", "application/json")
                .set("prefer", "return=minimal")
                .send_string(&body)
        })?;
        Ok(())
    }

    fn upsert(&self, collection: &str, rows: &[Value]) -> RemoteResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let body = serde_json::to_string(rows).map_err(|err| RemoteError::Encode(err.to_string()))?;
        self.execute("POST", collection, || {
            self.request("POST", collection)
                .query("on_conflict", "id")
                .set("content-type", "application/json")
                .set("prefer", "resolution=merge-duplicates,return=minimal")
                .send_string(&body)
        })?;
        Ok(())
    }

    fn delete(&self, collection: &str, id: &str) -> RemoteResult<()> {
        self.execute("DELETE", collection, || {
            self.request("DELETE", collection)
                .query("id", &format!("eq.{id}"))
                .call()
        })?;
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct PostgrestErrorBody {
    code: Option<String>,
    message: Option<String>,
}

/// Maps a non-2xx response onto the remote error taxonomy.
fn classify_status(status: u16, body: &str) -> RemoteError {
    let parsed = serde_json::from_str::<PostgrestErrorBody>(body).unwrap_or_default();
    let message = parsed
        .message
        .unwrap_or_else(|| sanitize_message(body.trim(), MAX_ERROR_MESSAGE_CHARS));
    let code = parsed.code;

    if status == 401 || status == 403 || code.as_deref() == Some(ACCESS_POLICY_CODE) {
        return RemoteError::AccessDenied { status, message };
    }
    if let Some(code) = code
        .as_deref()
        .filter(|code| SCHEMA_MISMATCH_CODES.contains(code))
    {
        return RemoteError::SchemaMismatch {
            code: code.to_string(),
            message,
        };
    }
    if status == 408 || status == 504 {
        return RemoteError::Timeout { after_ms: 0 };
    }
    RemoteError::Rejected {
        status,
        code,
        message,
    }
}

fn classify_transport(message: &str, request_timeout_ms: u64) -> RemoteError {
    let lowered = message.to_ascii_lowercase();
    if lowered.contains("timed out") || lowered.contains("timeout") {
        return RemoteError::Timeout {
            after_ms: request_timeout_ms,
        };
    }
    RemoteError::Network(sanitize_message(message, MAX_ERROR_MESSAGE_CHARS))
}
