//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::config::USER_HEADER;
use crate::{api, error, models};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Add-on Developer Hub",
        version = "0.1.0",
        description = "API server for submitting, validating and managing marketplace add-ons"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    ),
    paths(
        // Health endpoints
        api::health::health,
        api::health::ready,
        // Dashboard
        api::dashboard::list_addons,
        // Submission wizard
        api::submit::agreement,
        api::submit::accept_agreement,
        api::submit::upload_page,
        api::submit::create_addon,
        api::submit::describe_page,
        api::submit::save_describe,
        api::submit::media_page,
        api::submit::save_media,
        api::submit::license_page,
        api::submit::save_license,
        api::submit::review_page,
        api::submit::finish_submission,
        api::submit::done_page,
        api::submit::resume,
        api::submit::bump_page,
        api::submit::bump,
        // Section edits
        api::edit::get_section,
        api::edit::save_section,
        // Status actions
        api::status::enable,
        api::status::disable,
        api::status::cancel,
        api::status::delete,
        api::status::request_review,
        // Versions
        api::versions::list_versions,
        api::versions::delete_version,
        // Uploads
        api::uploads::upload,
        api::uploads::upload_image,
        api::uploads::upload_report,
        api::uploads::upload_detail,
        // Validation
        api::validation::file_validation,
        api::validation::json_file_validation,
        api::validation::json_validation_result,
    ),
    components(
        schemas(
            // Common
            error::ErrorResponse,
            // Health
            api::health::HealthResponse,
            api::health::ReadyResponse,
            // Add-ons
            models::AddonStatus,
            models::AddonType,
            models::AuthorRole,
            models::ReviewRequest,
            models::Application,
            models::Platform,
            models::BuiltinLicense,
            models::AddonSummary,
            models::AddonListResponse,
            models::DashboardSort,
            models::DashboardQuery,
            models::CompatibleApp,
            models::FileSummary,
            models::VersionSummary,
            models::VersionListResponse,
            models::DeleteVersionForm,
            models::DeleteAddonForm,
            // Wizard
            models::Step,
            models::StepPage,
            models::NewAddonForm,
            models::DescribeForm,
            models::MediaForm,
            models::PreviewForm,
            models::LicenseForm,
            models::ReviewTypeForm,
            models::BumpForm,
            models::SectionKind,
            // Validation
            models::MessageType,
            models::ValidationMessage,
            models::ValidationResponse,
            models::ImageUploadResponse,
            models::ReportPage,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Dashboard", description = "The developer's add-ons"),
        (name = "Submit", description = "Submission wizard"),
        (name = "Edit", description = "Add-on section edits"),
        (name = "Status", description = "Enable, disable, delete and review requests"),
        (name = "Versions", description = "Versions and their files"),
        (name = "Uploads", description = "Package and image uploads"),
        (name = "Validation", description = "Validation reports")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Add the upstream user header security scheme.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "devhub_user",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Header(
                        utoipa::openapi::security::ApiKeyValue::new(USER_HEADER),
                    ),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_developer_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/developers/addons"));
        assert!(doc.paths.paths.contains_key("/developers/addon/{slug}/submit/3"));
        let schemes = doc.components.unwrap().security_schemes;
        assert!(schemes.contains_key("devhub_user"));
    }
}
