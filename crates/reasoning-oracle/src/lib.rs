//! Reasoning Oracle (§6): treated throughout the orchestrator as an opaque
//! `complete(prompt, schema) -> object` service. Every caller in this
//! workspace must degrade to a deterministic path on any `OracleError`
//! (see DESIGN.md's note on oracle coupling) — the trait makes that the
//! only way to fail.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum OracleError {
    #[error("no reasoning oracle is configured")]
    Unavailable,
    #[error("oracle request timed out")]
    Timeout,
    #[error("oracle response did not match the requested schema: {0}")]
    InvalidResponse(String),
    #[error("oracle transport error: {0}")]
    Transport(String),
}

/// Two operations: structured completion against a JSON schema, and plain
/// text completion. Both are fallible by design — callers never assume
/// the oracle is present.
#[async_trait]
pub trait ReasoningOracle: Send + Sync {
    async fn generate_structured(
        &self,
        system_instruction: &str,
        query: &str,
        schema: &Value,
    ) -> Result<Value, OracleError>;

    async fn generate_text(&self, prompt: &str) -> Result<String, OracleError>;
}

/// The oracle used whenever no API key is configured. Every call fails
/// with `Unavailable`, which is exactly the signal every planner/chooser
/// needs to fall back to its deterministic path.
#[derive(Debug, Default, Clone)]
pub struct NullOracle;

#[async_trait]
impl ReasoningOracle for NullOracle {
    async fn generate_structured(
        &self,
        _system_instruction: &str,
        _query: &str,
        _schema: &Value,
    ) -> Result<Value, OracleError> {
        Err(OracleError::Unavailable)
    }

    async fn generate_text(&self, _prompt: &str) -> Result<String, OracleError> {
        Err(OracleError::Unavailable)
    }
}

/// Minimal HTTP-backed oracle. Treats the remote service as a black box
/// that accepts `{system_instruction, query, schema}` and returns a JSON
/// instance of `schema`, or `{prompt}` -> `{text}` for free text. Any
/// transport failure, non-2xx response, or malformed body surfaces as an
/// `OracleError`, never a panic.
pub struct HttpOracle {
    endpoint: String,
    api_key: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpOracle {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(20),
        }
    }

    /// Builds an oracle from the environment, returning `None` (rather
    /// than an error) when the mandatory key is absent — the caller wires
    /// that into `NullOracle` instead, per the "oracle may be absent"
    /// contract.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("ORACLE_API_KEY").ok()?;
        let endpoint = std::env::var("ORACLE_ENDPOINT")
            .unwrap_or_else(|_| "https://api.anthropic.com/v1/messages".to_string());
        Some(Self::new(endpoint, api_key))
    }
}

#[async_trait]
impl ReasoningOracle for HttpOracle {
    async fn generate_structured(
        &self,
        system_instruction: &str,
        query: &str,
        schema: &Value,
    ) -> Result<Value, OracleError> {
        let body = serde_json::json!({
            "system_instruction": system_instruction,
            "query": query,
            "schema": schema,
        });
        let response = tokio::time::timeout(
            self.timeout,
            self.client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send(),
        )
        .await
        .map_err(|_| OracleError::Timeout)?
        .map_err(|e| OracleError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(OracleError::Transport(format!(
                "oracle returned status {}",
                response.status()
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| OracleError::InvalidResponse(e.to_string()))
    }

    async fn generate_text(&self, prompt: &str) -> Result<String, OracleError> {
        let body = serde_json::json!({ "prompt": prompt });
        let response = tokio::time::timeout(
            self.timeout,
            self.client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send(),
        )
        .await
        .map_err(|_| OracleError::Timeout)?
        .map_err(|e| OracleError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(OracleError::Transport(format!(
                "oracle returned status {}",
                response.status()
            )));
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| OracleError::InvalidResponse(e.to_string()))?;
        value
            .get("text")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| OracleError::InvalidResponse("missing 'text' field".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_oracle_always_degrades() {
        let oracle = NullOracle;
        assert!(matches!(
            oracle
                .generate_structured("sys", "q", &Value::Null)
                .await
                .unwrap_err(),
            OracleError::Unavailable
        ));
        assert!(matches!(
            oracle.generate_text("hi").await.unwrap_err(),
            OracleError::Unavailable
        ));
    }
}
