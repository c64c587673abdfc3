//! Target applications and platforms.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Application an add-on can be compatible with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Application {
    Firefox,
    Thunderbird,
    SeaMonkey,
    Mobile,
}

impl Application {
    pub const ALL: [Application; 4] = [
        Self::Firefox,
        Self::Thunderbird,
        Self::SeaMonkey,
        Self::Mobile,
    ];

    pub fn id(self) -> i32 {
        match self {
            Self::Firefox => 1,
            Self::Thunderbird => 18,
            Self::SeaMonkey => 59,
            Self::Mobile => 60,
        }
    }

    pub fn from_id(id: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|app| app.id() == id)
    }

    pub fn guid(self) -> &'static str {
        match self {
            Self::Firefox => "{ec8030f7-c20a-464f-9b0e-13a3a9e97384}",
            Self::Thunderbird => "{3550f703-e582-4d05-9a08-453d09bdfdc6}",
            Self::SeaMonkey => "{92650c4d-4b8e-4d2a-b7eb-24ecf4f6b63a}",
            Self::Mobile => "{a23983c0-fd0e-11dc-95ff-0800200c9a66}",
        }
    }

    pub fn from_guid(guid: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|app| app.guid() == guid)
    }

    pub fn is_mobile(self) -> bool {
        matches!(self, Self::Mobile)
    }
}

/// Platform a file is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    All,
    Linux,
    Mac,
    Bsd,
    Windows,
    Solaris,
    Android,
    Maemo,
    AllMobile,
}

impl Platform {
    pub const DESKTOP: [Platform; 4] = [Self::All, Self::Linux, Self::Mac, Self::Windows];
    pub const MOBILE: [Platform; 3] = [Self::AllMobile, Self::Android, Self::Maemo];

    pub fn id(self) -> i32 {
        match self {
            Self::All => 1,
            Self::Linux => 2,
            Self::Mac => 3,
            Self::Bsd => 4,
            Self::Windows => 5,
            Self::Solaris => 6,
            Self::Android => 7,
            Self::Maemo => 8,
            Self::AllMobile => 9,
        }
    }

    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            1 => Some(Self::All),
            2 => Some(Self::Linux),
            3 => Some(Self::Mac),
            4 => Some(Self::Bsd),
            5 => Some(Self::Windows),
            6 => Some(Self::Solaris),
            7 => Some(Self::Android),
            8 => Some(Self::Maemo),
            9 => Some(Self::AllMobile),
            _ => None,
        }
    }

    /// Platforms offered on the upload form.
    pub fn supported() -> impl Iterator<Item = Platform> {
        Self::DESKTOP.into_iter().chain(Self::MOBILE)
    }

    pub fn is_mobile(self) -> bool {
        Self::MOBILE.contains(&self)
    }
}

/// Platforms the upload form should hide for a package targeting `apps`.
///
/// Mobile support hides mobile-only choices unless the package targets the
/// mobile app, and vice versa for desktop.
pub fn platforms_to_exclude(apps: &[Application]) -> Vec<Platform> {
    let mut keep = BTreeSet::new();
    for app in apps {
        if app.is_mobile() {
            keep.extend(Platform::MOBILE);
        } else {
            keep.extend(Platform::DESKTOP);
        }
    }
    Platform::supported().filter(|p| !keep.contains(p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_application_lookup_by_guid() {
        assert_eq!(
            Application::from_guid("{ec8030f7-c20a-464f-9b0e-13a3a9e97384}"),
            Some(Application::Firefox)
        );
        assert_eq!(Application::from_guid("{unknown}"), None);
        assert_eq!(Application::from_id(60), Some(Application::Mobile));
    }

    #[test]
    fn test_desktop_package_excludes_mobile_platforms() {
        let excluded = platforms_to_exclude(&[Application::Firefox]);
        assert_eq!(
            excluded,
            vec![Platform::AllMobile, Platform::Android, Platform::Maemo]
        );
    }

    #[test]
    fn test_mobile_package_excludes_desktop_platforms() {
        let excluded = platforms_to_exclude(&[Application::Mobile]);
        assert_eq!(
            excluded,
            vec![Platform::All, Platform::Linux, Platform::Mac, Platform::Windows]
        );
    }

    #[test]
    fn test_mixed_package_excludes_nothing() {
        assert!(platforms_to_exclude(&[Application::Mobile, Application::Thunderbird]).is_empty());
    }
}
