//! Package validator.
//!
//! Produces the tiered report stored with uploads and files. Tier 0 covers
//! the container, tier 1 the manifest and tier 2 the package content.

use std::path::Path;

use async_trait::async_trait;
use serde_json::{Value as JsonValue, json};

use crate::models::{MessageType, ValidationMessage};

use super::package::{self, PackageError};

/// Runs validation for one stored package.
///
/// `Ok` carries the report payload. `Err` carries crash text (a traceback
/// whose last line is the error) and is stored as the task error.
#[async_trait]
pub trait Validator: Send + Sync {
    async fn validate(&self, path: &Path) -> Result<JsonValue, String>;
}

/// File extensions flagged as binary content.
const BINARY_EXTENSIONS: [&str; 5] = [".exe", ".dll", ".so", ".dylib", ".jar"];

const BINARY_HELP: &str =
    "Binary components must be submitted with their source. See https://developer.mozilla.org/Add-ons/Source_Code_Submission";

/// The built-in zip/manifest validator.
#[derive(Debug, Default, Clone)]
pub struct PackageValidator;

#[async_trait]
impl Validator for PackageValidator {
    async fn validate(&self, path: &Path) -> Result<JsonValue, String> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| crash_text(path, &format!("IOError: {}", e)))?;

        let owned = path.to_path_buf();
        tokio::task::spawn_blocking(move || validate_package(&bytes))
            .await
            .map_err(|e| crash_text(&owned, &format!("ValidatorCrash: {}", e)))
    }
}

fn crash_text(path: &Path, error: &str) -> String {
    format!(
        "Traceback (most recent call last):\n  validating {}\n{}",
        path.display(),
        error
    )
}

#[derive(Default)]
struct Report {
    messages: Vec<ValidationMessage>,
    metadata: serde_json::Map<String, JsonValue>,
}

impl Report {
    fn push(
        &mut self,
        id: &[&str],
        message_type: MessageType,
        tier: i32,
        message: impl Into<String>,
        description: Vec<String>,
        file: Option<String>,
    ) {
        self.messages.push(ValidationMessage {
            id: id.iter().map(|s| s.to_string()).collect(),
            message_type,
            tier,
            message: message.into(),
            description,
            file,
            line: None,
        });
    }

    fn count(&self, message_type: MessageType) -> usize {
        self.messages
            .iter()
            .filter(|m| m.message_type == message_type)
            .count()
    }

    fn into_json(self) -> JsonValue {
        let errors = self.count(MessageType::Error);
        let warnings = self.count(MessageType::Warning);
        let notices = self.count(MessageType::Notice);
        json!({
            "success": errors == 0,
            "errors": errors,
            "warnings": warnings,
            "notices": notices,
            "messages": self.messages,
            "metadata": self.metadata,
        })
    }
}

/// Validate an in-memory package.
pub fn validate_package(bytes: &[u8]) -> JsonValue {
    let mut report = Report::default();

    let contents = match package::read_contents(bytes) {
        Ok(contents) => contents,
        Err(e) => {
            report.push(
                &["packagelayout", "archive", "invalid"],
                MessageType::Error,
                0,
                "The package could not be opened.",
                vec![e.to_string()],
                None,
            );
            return report.into_json();
        }
    };

    match contents.manifest.as_deref() {
        None => report.push(
            &["manifest", "missing"],
            MessageType::Error,
            1,
            PackageError::MissingManifest.to_string(),
            Vec::new(),
            None,
        ),
        Some(raw) => check_manifest(&mut report, raw),
    }

    for name in &contents.names {
        check_entry(&mut report, name);
    }

    report.into_json()
}

fn check_manifest(report: &mut Report, raw: &[u8]) {
    let manifest = match package::parse_manifest(raw) {
        Ok(manifest) => manifest,
        Err(e) => {
            report.push(
                &["manifest", "json", "invalid"],
                MessageType::Error,
                1,
                "manifest.json is not valid JSON.",
                vec![e.to_string()],
                Some(package::MANIFEST_NAME.to_string()),
            );
            return;
        }
    };

    if manifest.id.as_deref().is_none_or(|id| id.trim().is_empty()) {
        report.push(
            &["manifest", "id", "missing"],
            MessageType::Warning,
            1,
            "The manifest has no add-on ID; one will be generated.",
            Vec::new(),
            Some(package::MANIFEST_NAME.to_string()),
        );
    }

    match package::addon_from_manifest(manifest) {
        Ok(parsed) => {
            if parsed.apps.is_empty() {
                report.push(
                    &["manifest", "applications", "none"],
                    MessageType::Warning,
                    1,
                    "No supported application is listed in the manifest.",
                    Vec::new(),
                    Some(package::MANIFEST_NAME.to_string()),
                );
            }
            report.metadata.insert("id".into(), json!(parsed.guid));
            report.metadata.insert("name".into(), json!(parsed.name));
            report.metadata.insert("version".into(), json!(parsed.version));
            report
                .metadata
                .insert("type".into(), json!(parsed.addon_type));
            report
                .metadata
                .insert("applications".into(), json!(parsed.applications()));
        }
        Err(e) => {
            let id: &[&str] = match e {
                PackageError::MissingField(_) => &["manifest", "field", "missing"],
                PackageError::UnknownType(_) => &["manifest", "type", "unknown"],
                PackageError::TooLong(..) => &["manifest", "field", "too_long"],
                _ => &["manifest", "invalid"],
            };
            report.push(
                id,
                MessageType::Error,
                1,
                e.to_string(),
                Vec::new(),
                Some(package::MANIFEST_NAME.to_string()),
            );
        }
    }
}

fn check_entry(report: &mut Report, name: &str) {
    let lower = name.to_lowercase();
    let base = lower.rsplit('/').next().unwrap_or(&lower);

    if BINARY_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        report.push(
            &["content", "binary"],
            MessageType::Warning,
            2,
            "Binary component found.",
            vec![BINARY_HELP.to_string()],
            Some(name.to_string()),
        );
        report.metadata.insert("binary".into(), json!(true));
    } else if base.starts_with('.') {
        report.push(
            &["content", "hidden"],
            MessageType::Notice,
            2,
            "Hidden file found.",
            vec!["Hidden files are usually left over from development tools.".to_string()],
            Some(name.to_string()),
        );
    }
}
