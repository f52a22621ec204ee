use actix_web::{HttpResponse, Responder, web};
use chrono::Local;
use serde::Deserialize;
use tracing::instrument;
use utoipa::{IntoParams, ToSchema};

use crate::api::blocking;
use crate::engine::report::daily_listing;
use crate::error::EngineError;
use crate::model::mutation::{AddAttendance, DeleteAttendance, DeleteSpecificAttendance, UpdateAttendance};
use crate::state::AppState;
use crate::utils::time_utils::parse_date;

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct DateQuery {
    /// Day to list, `YYYY-MM-DD`. Defaults to today.
    #[schema(example = "2025-01-07")]
    pub date: Option<String>,
}

/// Daily attendance listing
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(DateQuery),
    responses(
        (status = 200, description = "Events with delays plus a row for each absent staff member", body = [crate::engine::report::ListingRow]),
        (status = 400, description = "Invalid date", body = Object, example = json!({
            "success": false,
            "error": "Invalid date '2025-13-01'. Use YYYY-MM-DD"
        }))
    ),
    tag = "Attendance"
)]
pub async fn daily_attendance(
    state: web::Data<AppState>,
    query: web::Query<DateQuery>,
) -> actix_web::Result<impl Responder> {
    let date = match query.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        Some(raw) => parse_date(raw).ok_or_else(|| {
            EngineError::Validation(format!("Invalid date '{raw}'. Use YYYY-MM-DD"))
        })?,
        None => Local::now().date_naive(),
    };

    let rows = blocking(move || {
        let day = state.store.read_day(date);
        Ok(daily_listing(&state.engine, &day))
    })
    .await?;

    Ok(HttpResponse::Ok().json(rows))
}

/// Update one event's checkin or checkout
#[utoipa::path(
    post,
    path = "/api/attendance/update",
    request_body = UpdateAttendance,
    responses(
        (status = 200, description = "Attendance updated", body = crate::model::mutation::MutationOutcome),
        (status = 400, description = "Invalid time or missing fields", body = Object, example = json!({
            "success": false,
            "error": "Invalid check-in time format. Use HH:MM:SS"
        })),
        (status = 404, description = "No day file for the date"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
#[instrument(skip(state, payload))]
pub async fn update_attendance(
    state: web::Data<AppState>,
    payload: web::Json<UpdateAttendance>,
) -> actix_web::Result<impl Responder> {
    let outcome = blocking(move || state.resolver.update(&payload)).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// Delete every event of a staff member for a day
#[utoipa::path(
    post,
    path = "/api/attendance/delete",
    request_body = DeleteAttendance,
    responses(
        (status = 200, description = "Events deleted and placeholder created", body = crate::model::mutation::MutationOutcome),
        (status = 404, description = "No day file, or no events for the staff member"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
#[instrument(skip(state, payload))]
pub async fn delete_attendance(
    state: web::Data<AppState>,
    payload: web::Json<DeleteAttendance>,
) -> actix_web::Result<impl Responder> {
    let outcome = blocking(move || state.resolver.delete_all(&payload)).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// Delete one event by its position among the staff member's events
#[utoipa::path(
    post,
    path = "/api/attendance/delete-specific",
    request_body = DeleteSpecificAttendance,
    responses(
        (status = 200, description = "Event deleted", body = crate::model::mutation::MutationOutcome),
        (status = 400, description = "Invalid record index", body = Object, example = json!({
            "success": false,
            "error": "Invalid record index"
        })),
        (status = 404, description = "No day file, or no events for the staff member"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
#[instrument(skip(state, payload))]
pub async fn delete_specific_attendance(
    state: web::Data<AppState>,
    payload: web::Json<DeleteSpecificAttendance>,
) -> actix_web::Result<impl Responder> {
    let outcome = blocking(move || state.resolver.delete_one(&payload)).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// Add an event
#[utoipa::path(
    post,
    path = "/api/attendance/add",
    request_body = AddAttendance,
    responses(
        (status = 200, description = "Event added", body = crate::model::mutation::MutationOutcome),
        (status = 400, description = "Invalid time or missing fields"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
#[instrument(skip(state, payload))]
pub async fn add_attendance(
    state: web::Data<AppState>,
    payload: web::Json<AddAttendance>,
) -> actix_web::Result<impl Responder> {
    let outcome = blocking(move || state.resolver.add(&payload)).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support;
    use crate::routes;
    use actix_web::{App, http::StatusCode, test};
    use serde_json::{Value, json};

    #[actix_web::test]
    async fn add_then_list_then_update() {
        let dir = tempfile::tempdir().unwrap();
        let data = web::Data::new(test_support::state(dir.path()));
        let app = test::init_service(
            App::new()
                .app_data(data.clone())
                .configure(|cfg| routes::configure(cfg, "/api")),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/attendance/add")
            .set_json(json!({
                "faculty_id": "t1",
                "date": "2025-01-07",
                "checkin": "09:40:00",
                "checkout": "16:30:00"
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["delay"], json!("00:15:00"));

        let req = test::TestRequest::get()
            .uri("/api/attendance?date=2025-01-07")
            .to_request();
        let rows: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(rows[0]["staff_id"], json!("T1"));
        assert_eq!(rows[0]["delay"], json!("00:15:00"));
        assert_eq!(rows[1]["staff_id"], json!("T2"));
        assert_eq!(rows[1]["delay"], json!("Absent"));

        let req = test::TestRequest::post()
            .uri("/api/attendance/update")
            .set_json(json!({
                "staff_id": "T1",
                "date": "2025-01-07",
                "checkin": "09:00:00",
                "current_checkin": "09:40:00"
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["matched_by"], json!("value"));
        assert_eq!(body["candidates"], json!(1));
        assert_eq!(body["delay"], json!("00:00:00"));
    }

    #[actix_web::test]
    async fn errors_map_to_status_codes() {
        let dir = tempfile::tempdir().unwrap();
        let data = web::Data::new(test_support::state(dir.path()));
        let app = test::init_service(
            App::new()
                .app_data(data)
                .configure(|cfg| routes::configure(cfg, "/api")),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/attendance/update")
            .set_json(json!({"staff_id": "T1", "date": "2025-01-07", "checkin": "25:99"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/attendance/delete")
            .set_json(json!({"staff_id": "T1", "date": "2025-01-07"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], json!(false));

        let req = test::TestRequest::get()
            .uri("/api/attendance?date=07-01-2025")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
