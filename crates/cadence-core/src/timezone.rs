//! Supported display timezones.

use serde::{Deserialize, Serialize};

/// A timezone the scheduling widget can display times in.
///
/// Serialized as its abbreviation (`"ET"`, `"CT"`, ...), which is also the
/// canonical value carried by the timezone selector options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timezone {
    /// Eastern Time.
    #[default]
    #[serde(rename = "ET")]
    Eastern,
    /// Central Time.
    #[serde(rename = "CT")]
    Central,
    /// Mountain Time.
    #[serde(rename = "MT")]
    Mountain,
    /// Pacific Time.
    #[serde(rename = "PT")]
    Pacific,
}

impl Timezone {
    /// Every supported timezone, in display order.
    pub const ALL: [Self; 4] = [Self::Eastern, Self::Central, Self::Mountain, Self::Pacific];

    /// Short abbreviation used in time slot labels.
    pub fn abbr(self) -> &'static str {
        match self {
            Self::Eastern => "ET",
            Self::Central => "CT",
            Self::Mountain => "MT",
            Self::Pacific => "PT",
        }
    }

    /// Human-readable label, e.g. `"Pacific Time (PT)"`.
    pub fn label(self) -> &'static str {
        match self {
            Self::Eastern => "Eastern Time (ET)",
            Self::Central => "Central Time (CT)",
            Self::Mountain => "Mountain Time (MT)",
            Self::Pacific => "Pacific Time (PT)",
        }
    }

    /// Standard-time UTC offset.
    pub fn utc_offset(self) -> &'static str {
        match self {
            Self::Eastern => "-05:00",
            Self::Central => "-06:00",
            Self::Mountain => "-07:00",
            Self::Pacific => "-08:00",
        }
    }

    /// Look up a timezone by abbreviation (case-insensitive).
    pub fn from_abbr(abbr: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|tz| tz.abbr().eq_ignore_ascii_case(abbr.trim()))
    }
}
