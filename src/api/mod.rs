/// Evaluation backend API: wire types, error taxonomy and the `Backend` seam.
///
/// The backend exposes two endpoints:
///
/// - `POST {base}/evaluate_response` with `{ "response": <text> }`, answering
///   `{ "result": { "gibberish": { "class", "score" }, "hallucination" } }`
/// - `GET {base}/get_all_data`, answering a JSON array of history items
///
/// [`HttpBackend`] talks to a real server over `ureq`. Tests substitute their
/// own [`Backend`] implementations.
use serde::{Deserialize, Serialize};

pub mod client;

pub use client::HttpBackend;

/// Path of the scoring endpoint, relative to the backend base URL.
pub const EVALUATE_PATH: &str = "/evaluate_response";

/// Path of the history endpoint, relative to the backend base URL.
pub const HISTORY_PATH: &str = "/get_all_data";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Output of the gibberish classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GibberishScore {
    /// Predicted label, e.g. `"Clean"`, `"Mild gibberish"`, `"Noise"`.
    pub class: String,
    pub score: f64,
}

/// Scores returned for a single submitted text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub gibberish: GibberishScore,
    pub hallucination: f64,
}

/// One row of the backend's evaluation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub sentence: String,
    pub gibberish_model_class: String,
    pub gibberish_model_score: f64,
    pub hallucination_model_score: f64,
}

/// Request body for `POST /evaluate_response`.
#[derive(Debug, Serialize)]
pub(crate) struct EvaluateRequest<'a> {
    pub response: &'a str,
}

/// Response envelope for `POST /evaluate_response`.
#[derive(Debug, Deserialize)]
struct EvaluateResponse {
    result: EvaluationResult,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure of a single backend action.
///
/// The `Display` text is what ends up in the error banner.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    #[error("backend URL is not configured (set EVALBOARD_BACKEND_URL or backend.url)")]
    NotConfigured,

    #[error("backend URL {0:?} is not an http(s):// URL (check EVALBOARD_BACKEND_URL or backend.url)")]
    InvalidUrl(String),

    #[error("request failed with HTTP status {status}")]
    Status { status: u16, body: String },

    #[error("network error: {0}")]
    Transport(String),

    #[error("unexpected response from backend: {0}")]
    Decode(String),
}

impl ApiError {
    /// HTTP status code, when the backend answered with a non-success status.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Backend seam
// ---------------------------------------------------------------------------

/// A source of evaluations and evaluation history.
///
/// Implementations must be shareable across threads: the interactive session
/// runs each request on its own worker thread.
pub trait Backend: Send + Sync {
    /// Score `text` with both models.
    fn evaluate(&self, text: &str) -> Result<EvaluationResult, ApiError>;

    /// Fetch every past evaluation, in backend order.
    fn fetch_history(&self) -> Result<Vec<HistoryItem>, ApiError>;

    /// Base URL used for display purposes.
    fn base_url(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Body decoding
// ---------------------------------------------------------------------------

/// Decode the body of a successful `POST /evaluate_response`.
pub fn decode_evaluation(body: &str) -> Result<EvaluationResult, ApiError> {
    serde_json::from_str::<EvaluateResponse>(body)
        .map(|envelope| envelope.result)
        .map_err(|e| ApiError::Decode(format!("evaluation result: {e}")))
}

/// Decode and validate the body of a successful `GET /get_all_data`.
///
/// The payload must be a JSON array; every element must carry all four
/// history fields with the expected types. Unknown extra fields are ignored.
pub fn decode_history(body: &str) -> Result<Vec<HistoryItem>, ApiError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| ApiError::Decode(format!("history: {e}")))?;

    let serde_json::Value::Array(entries) = value else {
        return Err(ApiError::Decode(format!(
            "history: expected a JSON array, got {}",
            json_kind(&value)
        )));
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            serde_json::from_value::<HistoryItem>(entry)
                .map_err(|e| ApiError::Decode(format!("history item {index}: {e}")))
        })
        .collect()
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
