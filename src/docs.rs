use crate::api::attendance::DateQuery;
use crate::api::reports::{MonthQuery, StaffDetailQuery};
use crate::engine::annotate::{AnnotationReport, FileError};
use crate::engine::report::{DayDetail, ListingRow, MonthlyDelayRow, StaffDetailReport};
use crate::engine::sync::{SyncReport, SyncStatus};
use crate::model::mutation::{
    AddAttendance, DeleteAttendance, DeleteSpecificAttendance, MatchedBy, MutationOutcome,
    UpdateAttendance,
};
use crate::model::staff::{StaffListEntry, StaffProfile};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Delay API",
        version = "1.0.0",
        description = r#"
## Attendance reconciliation and delay computation

Day files of raw swipe events are kept per calendar date. This service
computes one delay per staff member per day and keeps it on every event.

### Features
- **Daily listing** with live delays and a row for every absent staff member
- **Mutations**: update, add and delete events that carry no primary key
- **Reports**: monthly delay totals and a day-by-day staff report
- **Sync**: copy changed source day files into the derived store and annotate them

### Response Format
- JSON bodies
- Failures are `{"success": false, "error": "<reason>"}`
"#,
    ),
    paths(
        crate::api::attendance::daily_attendance,
        crate::api::attendance::update_attendance,
        crate::api::attendance::delete_attendance,
        crate::api::attendance::delete_specific_attendance,
        crate::api::attendance::add_attendance,

        crate::api::staff::list_staff,

        crate::api::reports::monthly_delay_report,
        crate::api::reports::staff_detail_report,

        crate::api::sync::trigger_sync,
        crate::api::sync::sync_status,
        crate::api::sync::annotate_all
    ),
    components(
        schemas(
            DateQuery,
            ListingRow,
            UpdateAttendance,
            AddAttendance,
            DeleteAttendance,
            DeleteSpecificAttendance,
            MatchedBy,
            MutationOutcome,
            StaffListEntry,
            StaffProfile,
            MonthQuery,
            StaffDetailQuery,
            MonthlyDelayRow,
            DayDetail,
            StaffDetailReport,
            SyncReport,
            SyncStatus,
            FileError,
            AnnotationReport
        )
    ),
    tags(
        (name = "Attendance", description = "Daily listing and event mutations"),
        (name = "Staff", description = "Staff directory"),
        (name = "Reports", description = "Monthly delay reports"),
        (name = "Sync", description = "Source sync and annotation"),
    )
)]
pub struct ApiDoc;
