//! Reading add-on packages.
//!
//! A package is a zip archive with a `manifest.json` at its root.

use std::io::{Cursor, Read};
use std::path::Path;

use serde::Deserialize;
use zip::ZipArchive;

use crate::db::addons::NewVersionApp;
use crate::error::{AppError, AppResult};
use crate::models::fields::{MAX_NAME_LENGTH, MAX_VALUE_LENGTH};
use crate::models::{AddonType, Application};

pub const MANIFEST_NAME: &str = "manifest.json";

/// Manifests larger than this are rejected before parsing.
const MAX_MANIFEST_SIZE: u64 = 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    #[error("The file is not a valid zip archive: {0}")]
    NotZip(String),

    #[error("The package contains no files.")]
    Empty,

    #[error("No manifest.json was found at the root of the package.")]
    MissingManifest,

    #[error("The manifest could not be parsed: {0}")]
    InvalidManifest(String),

    #[error("The manifest is missing the required \"{0}\" property.")]
    MissingField(&'static str),

    #[error("The add-on type \"{0}\" is not supported.")]
    UnknownType(String),

    #[error("The manifest \"{0}\" property is longer than {1} characters.")]
    TooLong(&'static str, usize),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    pub id: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
    #[serde(rename = "type")]
    pub addon_type: Option<String>,
    #[serde(default)]
    pub applications: Vec<ManifestApp>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestApp {
    pub guid: String,
    pub min_version: Option<String>,
    pub max_version: Option<String>,
}

/// Archive entry names plus the raw manifest, when present.
#[derive(Debug, Clone)]
pub struct PackageContents {
    pub names: Vec<String>,
    pub manifest: Option<Vec<u8>>,
}

/// Metadata needed to create an add-on from a package.
#[derive(Debug, Clone)]
pub struct ParsedAddon {
    pub guid: Option<String>,
    pub name: String,
    pub version: String,
    pub addon_type: AddonType,
    pub apps: Vec<NewVersionApp>,
}

impl ParsedAddon {
    pub fn applications(&self) -> Vec<Application> {
        self.apps.iter().map(|app| app.application).collect()
    }
}

/// List the archive and pull out the manifest bytes.
pub fn read_contents(bytes: &[u8]) -> Result<PackageContents, PackageError> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| PackageError::NotZip(e.to_string()))?;
    if archive.is_empty() {
        return Err(PackageError::Empty);
    }

    let names: Vec<String> = archive.file_names().map(str::to_string).collect();

    let manifest = match archive.by_name(MANIFEST_NAME) {
        Ok(entry) => {
            let mut data = Vec::new();
            entry
                .take(MAX_MANIFEST_SIZE)
                .read_to_end(&mut data)
                .map_err(|e| PackageError::NotZip(e.to_string()))?;
            Some(data)
        }
        Err(zip::result::ZipError::FileNotFound) => None,
        Err(e) => return Err(PackageError::NotZip(e.to_string())),
    };

    Ok(PackageContents { names, manifest })
}

pub fn parse_manifest(raw: &[u8]) -> Result<Manifest, PackageError> {
    serde_json::from_slice(raw).map_err(|e| PackageError::InvalidManifest(e.to_string()))
}

/// Validate the manifest fields the hub relies on.
pub fn addon_from_manifest(manifest: Manifest) -> Result<ParsedAddon, PackageError> {
    let name = limited(required(manifest.name, "name")?, "name", MAX_NAME_LENGTH)?;
    let version = limited(required(manifest.version, "version")?, "version", MAX_VALUE_LENGTH)?;
    let guid = match manifest.id.map(|id| id.trim().to_string()).filter(|id| !id.is_empty()) {
        Some(id) => Some(limited(id, "id", MAX_VALUE_LENGTH)?),
        None => None,
    };

    let addon_type = match manifest.addon_type.as_deref() {
        None => AddonType::Extension,
        Some(raw) => AddonType::parse(raw).ok_or_else(|| PackageError::UnknownType(raw.into()))?,
    };

    let mut apps: Vec<NewVersionApp> = Vec::new();
    for app in manifest.applications {
        let Some(application) = Application::from_guid(&app.guid) else {
            continue;
        };
        if apps.iter().any(|a| a.application == application) {
            continue;
        }
        let min_version = app.min_version.unwrap_or_else(|| "*".to_string());
        let max_version = app.max_version.unwrap_or_else(|| "*".to_string());
        apps.push(NewVersionApp {
            application,
            min_version: limited(min_version, "min_version", MAX_VALUE_LENGTH)?,
            max_version: limited(max_version, "max_version", MAX_VALUE_LENGTH)?,
        });
    }

    Ok(ParsedAddon {
        guid,
        name,
        version,
        addon_type,
        apps,
    })
}

fn required(value: Option<String>, field: &'static str) -> Result<String, PackageError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(PackageError::MissingField(field))
}

fn limited(value: String, field: &'static str, max_len: usize) -> Result<String, PackageError> {
    if value.chars().count() > max_len {
        return Err(PackageError::TooLong(field, max_len));
    }
    Ok(value)
}

pub fn parse_addon(bytes: &[u8]) -> Result<ParsedAddon, PackageError> {
    let contents = read_contents(bytes)?;
    let raw = contents.manifest.ok_or(PackageError::MissingManifest)?;
    addon_from_manifest(parse_manifest(&raw)?)
}

/// Parse a stored package off the async runtime.
pub async fn parse_addon_file(path: &Path) -> AppResult<ParsedAddon> {
    let bytes = tokio::fs::read(path).await?;
    tokio::task::spawn_blocking(move || parse_addon(&bytes))
        .await
        .map_err(|e| AppError::Task(format!("Package parsing panicked: {}", e)))?
        .map_err(|e| AppError::field("upload", e.to_string()))
}
