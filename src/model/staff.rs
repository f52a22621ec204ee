use derive_more::Display;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, EnumString};
use utoipa::ToSchema;

/// Case-insensitive staff identifier, stored trimmed and upper-cased.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display(fmt = "{}", _0)]
pub struct StaffId(String);

impl StaffId {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_uppercase())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for StaffId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// One row of the profile table as written by the directory export.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct StaffProfile {
    #[serde(default, skip_deserializing)]
    #[schema(example = "BBH042")]
    pub id: String,

    #[serde(default)]
    #[schema(example = "A. Kamath")]
    pub name: String,

    /// Raw category text, e.g. "Teaching Faculty" or "Non-Teaching Faculty".
    #[serde(default)]
    #[schema(example = "Teaching Faculty")]
    pub category: String,

    #[serde(default)]
    #[schema(example = "Commerce")]
    pub department: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub designation: Option<String>,
}

/// Policy bucket that decides the required presence window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, EnumString, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PolicyCategory {
    Teaching,
    Administrative,
    Support,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StaffListEntry {
    #[schema(example = "BBH042")]
    pub id: String,
    #[schema(example = "A. Kamath")]
    pub name: String,
}
