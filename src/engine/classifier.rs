use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::model::staff::{PolicyCategory, StaffId, StaffProfile};

/// Staff directory loaded once at startup and read-only afterwards.
#[derive(Debug, Default, Clone)]
pub struct ProfileTable {
    profiles: HashMap<StaffId, StaffProfile>,
}

impl ProfileTable {
    /// Load the table; a missing or malformed file yields an empty table.
    pub fn load(path: &Path) -> Self {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Staff profile table unavailable");
                return Self::default();
            }
        };

        match serde_json::from_str::<HashMap<String, StaffProfile>>(&text) {
            Ok(raw) => {
                let table = Self::from_entries(raw);
                info!(path = %path.display(), count = table.len(), "Staff profile table loaded");
                table
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Staff profile table is not a mapping");
                Self::default()
            }
        }
    }

    pub fn from_entries(raw: HashMap<String, StaffProfile>) -> Self {
        let profiles = raw
            .into_iter()
            .filter_map(|(id, mut profile)| {
                let key = StaffId::new(&id);
                if key.is_empty() {
                    return None;
                }
                profile.id = key.to_string();
                Some((key, profile))
            })
            .collect();
        Self { profiles }
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Unknown ids get an empty profile, never an error.
    pub fn get(&self, staff_id: &StaffId) -> StaffProfile {
        self.profiles.get(staff_id).cloned().unwrap_or_default()
    }

    pub fn name_of(&self, staff_id: &StaffId) -> String {
        self.get(staff_id).name
    }

    /// Ids in ascending order.
    pub fn ids(&self) -> Vec<StaffId> {
        let mut ids: Vec<StaffId> = self.profiles.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn classify(&self, staff_id: &StaffId) -> PolicyCategory {
        classify_profile(self.profiles.get(staff_id))
    }
}

/// Unknown staff and unrecognised category text fall back to Teaching; a
/// non-teaching profile with an unrecognised department falls back to
/// Administrative.
pub fn classify_profile(profile: Option<&StaffProfile>) -> PolicyCategory {
    let Some(profile) = profile else {
        return PolicyCategory::Teaching;
    };

    let category = profile.category.trim().to_lowercase();
    let department = profile.department.trim().to_lowercase();

    if category.contains("non-teaching") {
        if department.contains("computer applications") || department.contains("support") {
            return PolicyCategory::Support;
        }
        if department.contains("administrative") || department.contains("administration") {
            return PolicyCategory::Administrative;
        }
        return PolicyCategory::Administrative;
    }

    PolicyCategory::Teaching
}
