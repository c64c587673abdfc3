//! Built-in licenses offered on the license step.

use serde::Serialize;
use utoipa::ToSchema;

/// A license every developer can pick without writing its text.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct BuiltinLicense {
    pub builtin: i32,
    pub name: &'static str,
    pub url: &'static str,
}

pub const BUILTIN_LICENSES: [BuiltinLicense; 7] = [
    BuiltinLicense {
        builtin: 1,
        name: "Mozilla Public License, version 1.1",
        url: "http://www.mozilla.org/MPL/MPL-1.1.html",
    },
    BuiltinLicense {
        builtin: 2,
        name: "GNU General Public License, version 2.0",
        url: "http://www.gnu.org/licenses/gpl-2.0.html",
    },
    BuiltinLicense {
        builtin: 3,
        name: "GNU General Public License, version 3.0",
        url: "http://www.gnu.org/licenses/gpl-3.0.html",
    },
    BuiltinLicense {
        builtin: 4,
        name: "GNU Lesser General Public License, version 2.1",
        url: "http://www.gnu.org/licenses/lgpl-2.1.html",
    },
    BuiltinLicense {
        builtin: 5,
        name: "GNU Lesser General Public License, version 3.0",
        url: "http://www.gnu.org/licenses/lgpl-3.0.html",
    },
    BuiltinLicense {
        builtin: 6,
        name: "MIT/X11 License",
        url: "http://www.opensource.org/licenses/mit-license.php",
    },
    BuiltinLicense {
        builtin: 7,
        name: "BSD License",
        url: "http://www.opensource.org/licenses/bsd-license.php",
    },
];

/// Custom licenses are stored with this builtin number.
pub const CUSTOM_LICENSE: i32 = 0;

pub fn builtin_license(builtin: i32) -> Option<&'static BuiltinLicense> {
    BUILTIN_LICENSES.iter().find(|l| l.builtin == builtin)
}
