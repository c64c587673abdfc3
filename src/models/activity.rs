//! Developer activity log actions.

use serde::Serialize;
use utoipa::ToSchema;

/// Action recorded in the activity log. Stored by numeric id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LogAction {
    CreateAddon,
    EditProperties,
    EditDescriptions,
    EditCategories,
    UserDisable,
    UserEnable,
    ChangeStatus,
    AddPreview,
    EditPreview,
    DeletePreview,
    AddVersion,
    DeleteVersion,
    ChangeLicense,
    ChangePolicy,
    ChangeIcon,
    DeleteAddon,
}

impl LogAction {
    pub fn id(self) -> i32 {
        match self {
            Self::CreateAddon => 1,
            Self::EditProperties => 2,
            Self::EditDescriptions => 3,
            Self::EditCategories => 4,
            Self::UserDisable => 8,
            Self::UserEnable => 9,
            Self::ChangeStatus => 12,
            Self::AddPreview => 13,
            Self::EditPreview => 14,
            Self::DeletePreview => 15,
            Self::AddVersion => 16,
            Self::DeleteVersion => 18,
            Self::ChangeLicense => 37,
            Self::ChangePolicy => 38,
            Self::ChangeIcon => 39,
            Self::DeleteAddon => 49,
        }
    }
}
