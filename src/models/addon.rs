//! Add-on status, type and author role enumerations plus review transitions.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Review status of an add-on or of one of its files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AddonStatus {
    Null,
    Unreviewed,
    Pending,
    Nominated,
    Public,
    Disabled,
    Listed,
    Beta,
    Lite,
    LiteAndNominated,
    Purgatory,
    Deleted,
}

impl AddonStatus {
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Null => 0,
            Self::Unreviewed => 1,
            Self::Pending => 2,
            Self::Nominated => 3,
            Self::Public => 4,
            Self::Disabled => 5,
            Self::Listed => 6,
            Self::Beta => 7,
            Self::Lite => 8,
            Self::LiteAndNominated => 9,
            Self::Purgatory => 10,
            Self::Deleted => 11,
        }
    }

    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Null),
            1 => Some(Self::Unreviewed),
            2 => Some(Self::Pending),
            3 => Some(Self::Nominated),
            4 => Some(Self::Public),
            5 => Some(Self::Disabled),
            6 => Some(Self::Listed),
            7 => Some(Self::Beta),
            8 => Some(Self::Lite),
            9 => Some(Self::LiteAndNominated),
            10 => Some(Self::Purgatory),
            11 => Some(Self::Deleted),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Null => "Incomplete",
            Self::Unreviewed => "Awaiting Preliminary Review",
            Self::Pending => "Pending approval",
            Self::Nominated => "Awaiting Full Review",
            Self::Public => "Fully Reviewed",
            Self::Disabled => "Disabled by Mozilla",
            Self::Listed => "Listed",
            Self::Beta => "Beta",
            Self::Lite => "Preliminarily Reviewed",
            Self::LiteAndNominated => "Preliminarily Reviewed and Awaiting Full Review",
            Self::Purgatory => "Pending a review choice",
            Self::Deleted => "Deleted",
        }
    }

    /// Statuses waiting on an editor.
    pub fn is_under_review(self) -> bool {
        matches!(
            self,
            Self::Unreviewed | Self::Nominated | Self::LiteAndNominated
        )
    }

    /// File statuses that count towards "last updated" for experimental add-ons.
    pub fn is_valid(self) -> bool {
        matches!(
            self,
            Self::Unreviewed
                | Self::Pending
                | Self::Nominated
                | Self::Public
                | Self::Listed
                | Self::Beta
                | Self::Lite
                | Self::LiteAndNominated
        )
    }
}

/// Kind of review a developer can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReviewRequest {
    /// Full review, ends in `Public`
    Full,
    /// Preliminary review, ends in `Lite`
    Preliminary,
}

impl ReviewRequest {
    /// Requests are addressed by the status they aim for.
    pub fn from_target_status(status: i32) -> Option<Self> {
        match AddonStatus::from_i32(status)? {
            AddonStatus::Public => Some(Self::Full),
            AddonStatus::Lite => Some(Self::Preliminary),
            _ => None,
        }
    }

    pub fn target_status(self) -> AddonStatus {
        match self {
            Self::Full => AddonStatus::Public,
            Self::Preliminary => AddonStatus::Lite,
        }
    }

    /// Status a freshly submitted add-on enters the queue with.
    pub fn submission_status(self) -> AddonStatus {
        match self {
            Self::Full => AddonStatus::Nominated,
            Self::Preliminary => AddonStatus::Unreviewed,
        }
    }
}

/// Review requests available to an add-on in its current state.
pub fn available_review_requests(
    status: AddonStatus,
    disabled_by_user: bool,
    has_reviewable_files: bool,
) -> Vec<ReviewRequest> {
    if !has_reviewable_files
        || disabled_by_user
        || matches!(
            status,
            AddonStatus::Disabled
                | AddonStatus::Public
                | AddonStatus::LiteAndNominated
                | AddonStatus::Deleted
        )
    {
        return Vec::new();
    }

    match status {
        AddonStatus::Nominated => vec![ReviewRequest::Preliminary],
        AddonStatus::Unreviewed | AddonStatus::Lite => vec![ReviewRequest::Full],
        _ => vec![ReviewRequest::Preliminary, ReviewRequest::Full],
    }
}

/// Status an add-on moves to after asking for a review.
pub fn status_after_review_request(current: AddonStatus, request: ReviewRequest) -> AddonStatus {
    match request {
        ReviewRequest::Full if current == AddonStatus::Lite => AddonStatus::LiteAndNominated,
        ReviewRequest::Full => AddonStatus::Nominated,
        ReviewRequest::Preliminary
            if matches!(current, AddonStatus::Public | AddonStatus::LiteAndNominated) =>
        {
            AddonStatus::Lite
        }
        ReviewRequest::Preliminary => AddonStatus::Unreviewed,
    }
}

/// Status after withdrawing from the review queue, or `None` when not queued.
pub fn status_after_cancel(current: AddonStatus) -> Option<AddonStatus> {
    if !current.is_under_review() {
        return None;
    }
    Some(match current {
        AddonStatus::LiteAndNominated => AddonStatus::Lite,
        _ => AddonStatus::Null,
    })
}

/// Add-on type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AddonType {
    Extension,
    Theme,
    Dictionary,
    Search,
    LanguagePack,
    Persona,
}

impl AddonType {
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Extension => 1,
            Self::Theme => 2,
            Self::Dictionary => 3,
            Self::Search => 4,
            Self::LanguagePack => 5,
            Self::Persona => 9,
        }
    }

    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            1 => Some(Self::Extension),
            2 => Some(Self::Theme),
            3 => Some(Self::Dictionary),
            4 => Some(Self::Search),
            5 => Some(Self::LanguagePack),
            9 => Some(Self::Persona),
            _ => None,
        }
    }

    /// Package manifests name their type with these strings.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "extension" => Some(Self::Extension),
            "theme" => Some(Self::Theme),
            "dictionary" => Some(Self::Dictionary),
            "search" => Some(Self::Search),
            "language_pack" | "langpack" => Some(Self::LanguagePack),
            "persona" => Some(Self::Persona),
            _ => None,
        }
    }
}

/// Author role on an add-on. Ordered by privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuthorRole {
    Viewer,
    Developer,
    Owner,
}

impl AuthorRole {
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Viewer => 1,
            Self::Developer => 4,
            Self::Owner => 5,
        }
    }

    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            1 => Some(Self::Viewer),
            4 => Some(Self::Developer),
            5 => Some(Self::Owner),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_storage_value() {
        for value in 0..=11 {
            let status = AddonStatus::from_i32(value).unwrap();
            assert_eq!(status.as_i32(), value);
        }
        assert_eq!(AddonStatus::from_i32(12), None);
    }

    #[test]
    fn test_full_review_from_lite_keeps_lite() {
        assert_eq!(
            status_after_review_request(AddonStatus::Lite, ReviewRequest::Full),
            AddonStatus::LiteAndNominated
        );
        assert_eq!(
            status_after_review_request(AddonStatus::Null, ReviewRequest::Full),
            AddonStatus::Nominated
        );
    }

    #[test]
    fn test_preliminary_review_transitions() {
        assert_eq!(
            status_after_review_request(AddonStatus::LiteAndNominated, ReviewRequest::Preliminary),
            AddonStatus::Lite
        );
        assert_eq!(
            status_after_review_request(AddonStatus::Nominated, ReviewRequest::Preliminary),
            AddonStatus::Unreviewed
        );
    }

    #[test]
    fn test_cancel_review() {
        assert_eq!(
            status_after_cancel(AddonStatus::LiteAndNominated),
            Some(AddonStatus::Lite)
        );
        assert_eq!(
            status_after_cancel(AddonStatus::Nominated),
            Some(AddonStatus::Null)
        );
        assert_eq!(status_after_cancel(AddonStatus::Public), None);
    }

    #[test]
    fn test_available_review_requests() {
        assert!(available_review_requests(AddonStatus::Null, false, false).is_empty());
        assert!(available_review_requests(AddonStatus::Null, true, true).is_empty());
        assert!(available_review_requests(AddonStatus::Public, false, true).is_empty());
        assert_eq!(
            available_review_requests(AddonStatus::Nominated, false, true),
            vec![ReviewRequest::Preliminary]
        );
        assert_eq!(
            available_review_requests(AddonStatus::Lite, false, true),
            vec![ReviewRequest::Full]
        );
        assert_eq!(
            available_review_requests(AddonStatus::Null, false, true),
            vec![ReviewRequest::Preliminary, ReviewRequest::Full]
        );
    }

    #[test]
    fn test_author_roles_are_ordered() {
        assert!(AuthorRole::Owner > AuthorRole::Developer);
        assert!(AuthorRole::Developer > AuthorRole::Viewer);
        assert_eq!(AuthorRole::from_i32(4), Some(AuthorRole::Developer));
    }
}
