//! Response bodies of the BeArt face-swap API.

use serde::{Deserialize, de::DeserializeOwned};

/// Top-level `code` for a successful call.
pub const SUCCESS_CODE: i64 = 100_000;

/// Top-level `code` from `get-job` while the job is still running.
pub const PROCESSING_CODE: i64 = 300_001;

/// Envelope shared by every endpoint: `{code, message, result}`.
///
/// `result` stays raw until the caller has checked `code`; its shape is only
/// defined for successful calls.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope {
    #[serde(default)]
    pub code: i64,
    /// Localized message object, e.g. `{"zh": "...", "en": "..."}`.
    pub message: Option<serde_json::Value>,
    pub result: Option<serde_json::Value>,
}

impl ApiEnvelope {
    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }

    pub fn is_processing(&self) -> bool {
        self.code == PROCESSING_CODE
    }

    /// The Chinese server message, or a placeholder when absent.
    pub fn message_zh(&self) -> String {
        self.message
            .as_ref()
            .and_then(|m| m.get("zh"))
            .and_then(|zh| zh.as_str())
            .unwrap_or("未知错误")
            .to_string()
    }

    /// Decode `result` as `T`. A missing or null `result` is `Ok(None)`.
    pub fn parse_result<T: DeserializeOwned>(self) -> serde_json::Result<Option<T>> {
        match self.result {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value).map(Some),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateJobResult {
    pub job_id: String,
}

#[derive(Debug, Deserialize)]
pub struct JobResult {
    #[serde(default)]
    pub output: Vec<String>,
}
