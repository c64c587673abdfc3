//! Validation report payloads returned to the upload and file pages.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;
use uuid::Uuid;

use super::platform::Platform;

/// Severity of a validator message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Error,
    Warning,
    Notice,
}

/// One validator message as produced by the validator, before escaping.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ValidationMessage {
    /// Hierarchical message id, e.g. `["manifest", "missing", "name"]`.
    pub id: Vec<String>,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    /// Tier 0 messages are pre-flight checks; shown as tier 1.
    pub tier: i32,
    pub message: String,
    /// Free-form description lines.
    #[serde(default)]
    pub description: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

/// Validation JSON answered by the upload detail, file validation and
/// stored result endpoints.
///
/// `validation` is the validator payload, or `""` when validation crashed
/// or has not completed.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ValidationResponse {
    #[schema(value_type = Object)]
    pub validation: JsonValue,
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_report_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platforms_to_exclude: Option<Vec<Platform>>,
}

impl ValidationResponse {
    pub fn new(validation: JsonValue, error: Option<String>) -> Self {
        Self {
            validation,
            error,
            upload: None,
            url: None,
            full_report_url: None,
            platforms_to_exclude: None,
        }
    }

    /// Payload used when a result exists but validation has not produced one.
    pub fn empty() -> Self {
        Self::new(JsonValue::String(String::new()), None)
    }

    /// Error count reported by the validator, zero when absent.
    pub fn error_count(&self) -> u64 {
        self.validation
            .get("errors")
            .and_then(JsonValue::as_u64)
            .unwrap_or(0)
    }
}

/// Response of the image upload endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct ImageUploadResponse {
    /// Token to reference the image from the media form
    pub upload_hash: String,
    pub errors: Vec<String>,
}

/// JSON page for an upload or file report.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReportPage {
    pub filename: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Endpoint to fetch the validation JSON from
    pub validate_url: String,
}
