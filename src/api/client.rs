/// HTTP client for the evaluation backend.
///
/// Uses the synchronous `ureq` client. One [`HttpBackend`] is built per
/// process from the resolved config and shared (behind an `Arc`) by every
/// request the session issues.
use std::time::Duration;

use super::{
    ApiError, Backend, EVALUATE_PATH, EvaluateRequest, EvaluationResult, HISTORY_PATH,
    HistoryItem, decode_evaluation, decode_history,
};
use crate::config::schema::BackendConfig;

/// Synchronous HTTP implementation of [`Backend`].
#[derive(Debug)]
pub struct HttpBackend {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpBackend {
    /// Build a client for `base_url`.
    ///
    /// Without a timeout, requests wait on the transport's own defaults.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent: builder.build(),
        }
    }

    /// Build a client from the resolved config.
    ///
    /// Fails with [`ApiError::NotConfigured`] when no URL is set and with
    /// [`ApiError::InvalidUrl`] when the URL is not usable.
    pub fn from_config(config: &BackendConfig) -> Result<Self, ApiError> {
        match config.resolved_url() {
            Some(url) => Ok(Self::new(&url, config.timeout())),
            None if config.is_malformed() => {
                Err(ApiError::InvalidUrl(config.url.trim().to_string()))
            }
            None => Err(ApiError::NotConfigured),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        // On Windows, "localhost" may try IPv6 (::1) first and stall when the
        // backend only binds IPv4.
        format!("{}{}", self.base_url, path).replace("://localhost", "://127.0.0.1")
    }
}

impl Backend for HttpBackend {
    fn evaluate(&self, text: &str) -> Result<EvaluationResult, ApiError> {
        let url = self.endpoint(EVALUATE_PATH);
        let response = self
            .agent
            .post(&url)
            .send_json(EvaluateRequest { response: text });

        let body = read_body(response)?;
        decode_evaluation(&body)
    }

    fn fetch_history(&self) -> Result<Vec<HistoryItem>, ApiError> {
        let url = self.endpoint(HISTORY_PATH);
        let response = self.agent.get(&url).call();

        let body = read_body(response)?;
        decode_history(&body)
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Turn a `ureq` outcome into the response body or an [`ApiError`].
fn read_body(response: Result<ureq::Response, ureq::Error>) -> Result<String, ApiError> {
    match response {
        Ok(resp) => {
            // ureq only reports >= 400 as an error; unfollowed redirects and
            // other non-2xx codes arrive here.
            let status = resp.status();
            let body = resp
                .into_string()
                .map_err(|e| ApiError::Transport(format!("failed to read response body: {e}")))?;
            if (200..300).contains(&status) {
                Ok(body)
            } else {
                Err(ApiError::Status { status, body })
            }
        }
        Err(ureq::Error::Status(status, resp)) => {
            let body = resp.into_string().unwrap_or_default();
            Err(ApiError::Status { status, body })
        }
        Err(ureq::Error::Transport(transport)) => Err(ApiError::Transport(transport.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
