//! Domain models for the developer hub.

pub mod activity;
pub mod addon;
pub mod fields;
pub mod license;
pub mod listing;
pub mod platform;
pub mod section;
pub mod submit;
pub mod user;
pub mod validation;

// Re-export commonly used types
pub use activity::LogAction;
pub use addon::{AddonStatus, AddonType, AuthorRole, ReviewRequest};
pub use license::{BUILTIN_LICENSES, BuiltinLicense};
pub use listing::{
    AddonListResponse, AddonSummary, CompatibleApp, DashboardQuery, DashboardSort,
    DeleteAddonForm, DeleteVersionForm, FileSummary, VersionListResponse, VersionSummary,
};
pub use platform::{Application, Platform};
pub use section::{SectionEdit, SectionKind, SectionSpec};
pub use submit::{
    BumpForm, DescribeForm, LicenseForm, MAX_STEP, MediaForm, NewAddonForm, PreviewForm,
    ReviewTypeForm, Step, StepPage,
};
pub use user::{AuthenticatedUser, UserRole};
pub use validation::{
    ImageUploadResponse, MessageType, ReportPage, ValidationMessage, ValidationResponse,
};
