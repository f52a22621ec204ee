use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Change one event's checkin and/or checkout. The `current_*` fields are the
/// values the client last saw and are used to find the event.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateAttendance {
    #[serde(alias = "faculty_id")]
    #[schema(example = "BBH042")]
    pub staff_id: String,

    #[schema(example = "2025-01-07")]
    pub date: String,

    /// New checkin `HH:MM:SS`; empty clears it; absent leaves it alone.
    #[schema(example = "09:20:00")]
    pub checkin: Option<String>,

    #[schema(example = "16:45:00")]
    pub checkout: Option<String>,

    #[schema(example = "09:40:00")]
    pub current_checkin: Option<String>,

    #[schema(example = "")]
    pub current_checkout: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct AddAttendance {
    #[serde(alias = "faculty_id")]
    #[schema(example = "BBH042")]
    pub staff_id: String,

    #[schema(example = "2025-01-07")]
    pub date: String,

    #[schema(example = "09:20:00")]
    pub checkin: Option<String>,

    #[schema(example = "16:45:00")]
    pub checkout: Option<String>,
}

/// Remove every event of a staff member for the day.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct DeleteAttendance {
    #[serde(alias = "faculty_id")]
    #[schema(example = "BBH042")]
    pub staff_id: String,

    #[schema(example = "2025-01-07")]
    pub date: String,
}

/// Remove one event, addressed by its position among the staff member's events.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct DeleteSpecificAttendance {
    #[serde(alias = "faculty_id")]
    #[schema(example = "BBH042")]
    pub staff_id: String,

    #[schema(example = "2025-01-07")]
    pub date: String,

    #[serde(default)]
    #[schema(example = 0)]
    pub record_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchedBy {
    /// Current values matched an event exactly.
    Value,
    /// Nothing matched; the staff member's first event was used.
    FirstForStaff,
    /// The staff member had no events; a new one was created.
    Synthesized,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MutationOutcome {
    pub success: bool,
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_by: Option<MatchedBy>,

    /// How many events matched the client's current values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidates: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_count: Option<usize>,

    pub placeholder_created: bool,

    /// Delay now carried by the staff member's events.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "00:15:00")]
    pub delay: Option<String>,
}

impl MutationOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            matched_by: None,
            candidates: None,
            deleted_count: None,
            placeholder_created: false,
            delay: None,
        }
    }
}
