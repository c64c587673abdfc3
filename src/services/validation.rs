//! Validation results as shown to developers, and the per-file cache.

use std::path::Path;

use serde_json::{Value as JsonValue, json};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::ValidationSettings;
use crate::db::DbPool;
use crate::entity::{file, file_upload, validation_result};
use crate::error::{AppError, AppResult};
use crate::models::platform::platforms_to_exclude;
use crate::models::ValidationResponse;

use super::outgoing::OutgoingLinker;
use super::package;
use super::validator::Validator;

/// Payload reported for uploads while validation is switched off.
pub fn stub_validation() -> JsonValue {
    json!({ "errors": 0, "messages": [], "notices": 0, "warnings": 0 })
}

/// Escape and auto-link every string of a message, descending into lists
/// and objects.
fn escape_all(value: JsonValue, linker: &OutgoingLinker) -> JsonValue {
    match value {
        JsonValue::String(s) => JsonValue::String(linker.linkify_escaped(&s)),
        JsonValue::Array(items) => {
            JsonValue::Array(items.into_iter().map(|v| escape_all(v, linker)).collect())
        }
        JsonValue::Object(map) => JsonValue::Object(
            map.into_iter()
                .map(|(k, v)| (k, escape_all(v, linker)))
                .collect(),
        ),
        other => other,
    }
}

/// Prepare validator messages for display. Tier 0 is reported as tier 1.
pub fn prepare_messages(mut validation: JsonValue, linker: &OutgoingLinker) -> JsonValue {
    if let Some(messages) = validation
        .get_mut("messages")
        .and_then(JsonValue::as_array_mut)
    {
        for message in messages.iter_mut() {
            let JsonValue::Object(map) = message else {
                continue;
            };
            if map.get("tier").and_then(JsonValue::as_i64) == Some(0) {
                map.insert("tier".to_string(), json!(1));
            }
            let escaped = std::mem::take(map)
                .into_iter()
                .map(|(k, v)| (k, escape_all(v, linker)))
                .collect();
            *map = escaped;
        }
    }
    validation
}

/// Last non-empty line of a traceback.
fn last_line(traceback: &str) -> String {
    traceback
        .trim()
        .lines()
        .last()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Build the JSON answered for a stored validation payload and error text.
pub fn make_validation_result(
    validation: Option<&str>,
    task_error: Option<&str>,
    settings: &ValidationSettings,
    linker: &OutgoingLinker,
) -> ValidationResponse {
    let payload = match validation.map(serde_json::from_str::<JsonValue>) {
        Some(Ok(value)) if value.is_object() => prepare_messages(value, linker),
        Some(Ok(_)) | None => JsonValue::String(String::new()),
        Some(Err(e)) => {
            warn!("Stored validation payload is not valid JSON: {}", e);
            JsonValue::String(String::new())
        }
    };

    let error = task_error.filter(|e| !e.trim().is_empty()).map(|e| {
        if settings.expose_tracebacks {
            e.to_string()
        } else {
            last_line(e)
        }
    });

    ValidationResponse::new(payload, error)
}

pub fn result_response(
    result: &validation_result::Model,
    settings: &ValidationSettings,
    linker: &OutgoingLinker,
) -> ValidationResponse {
    make_validation_result(
        result.validation.as_deref(),
        result.task_error.as_deref(),
        settings,
        linker,
    )
}

/// Split a validator outcome into the stored payload and error columns.
fn outcome_columns(outcome: Result<JsonValue, String>) -> (Option<String>, Option<String>) {
    match outcome {
        Ok(payload) => (Some(payload.to_string()), None),
        Err(traceback) => (None, Some(traceback)),
    }
}

/// Stored result of a file, validating and storing it on a miss.
pub async fn get_or_validate(
    pool: &DbPool,
    validator: &dyn Validator,
    data_dir: &Path,
    file: &file::Model,
) -> AppResult<validation_result::Model> {
    if let Some(result) = pool.get_validation_result(file.id).await? {
        return Ok(result);
    }

    info!("Validating file {}", file.id);
    let outcome = validator.validate(&data_dir.join(&file.path)).await;
    if let Err(ref traceback) = outcome {
        warn!("Validation of file {} crashed: {}", file.id, last_line(traceback));
    }

    let (payload, task_error) = outcome_columns(outcome);
    pool.save_validation_result(file.id, payload, task_error).await
}

/// Validate an upload and store the outcome on it.
pub async fn validate_upload(
    pool: &DbPool,
    validator: &dyn Validator,
    data_dir: &Path,
    upload_id: Uuid,
) -> AppResult<file_upload::Model> {
    let upload = pool
        .get_upload(upload_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Upload {}", upload_id)))?;

    let outcome = validator.validate(&data_dir.join(&upload.path)).await;
    if let Err(ref traceback) = outcome {
        warn!("Validation of upload {} crashed: {}", upload_id, last_line(traceback));
    }

    let (payload, task_error) = outcome_columns(outcome);
    pool.set_upload_validation(upload.id, payload, task_error)
        .await
}

pub fn upload_json_url(id: Uuid) -> String {
    format!("/api/v1/developers/upload/{}/json", id.simple())
}

pub fn upload_report_url(id: Uuid) -> String {
    format!("/api/v1/developers/upload/{}", id.simple())
}

/// Validation JSON of an upload, with the links and the platform choices the
/// upload form needs.
pub async fn upload_detail(
    upload: &file_upload::Model,
    settings: &ValidationSettings,
    linker: &OutgoingLinker,
    data_dir: &Path,
) -> ValidationResponse {
    let mut response = if settings.validate_addons {
        make_validation_result(
            upload.validation.as_deref(),
            upload.task_error.as_deref(),
            settings,
            linker,
        )
    } else {
        ValidationResponse::new(stub_validation(), None)
    };

    response.upload = Some(upload.id);
    response.url = Some(upload_json_url(upload.id));
    response.full_report_url = Some(upload_report_url(upload.id));

    if response.validation.is_object() && response.error_count() == 0 {
        let excluded = match package::parse_addon_file(&data_dir.join(&upload.path)).await {
            Ok(parsed) => platforms_to_exclude(&parsed.applications()),
            Err(e) => {
                warn!("Could not read upload {} for platforms: {}", upload.id, e);
                Vec::new()
            }
        };
        response.platforms_to_exclude = Some(excluded);
    }

    response
}
