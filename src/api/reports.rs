use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::api::blocking;
use crate::engine::report::{MonthlyDelayRow, StaffSelector, monthly_delay, staff_detail};
use crate::error::{EngineError, EngineResult};
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct MonthQuery {
    #[schema(example = "1")]
    pub month: Option<String>,
    #[schema(example = "2025")]
    pub year: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct StaffDetailQuery {
    #[schema(example = "1")]
    pub month: Option<String>,
    #[schema(example = "2025")]
    pub year: Option<String>,
    /// A staff id, or `all`.
    #[schema(example = "all")]
    pub staff: Option<String>,
}

fn month_and_year(month: Option<&str>, year: Option<&str>) -> EngineResult<(u32, i32)> {
    let (Some(month), Some(year)) = (
        month.map(str::trim).filter(|m| !m.is_empty()),
        year.map(str::trim).filter(|y| !y.is_empty()),
    ) else {
        return Err(EngineError::Validation("Month and year are required".to_string()));
    };
    let month = month
        .parse::<u32>()
        .map_err(|_| EngineError::Validation(format!("Invalid month '{month}'")))?;
    let year = year
        .parse::<i32>()
        .map_err(|_| EngineError::Validation(format!("Invalid year '{year}'")))?;
    Ok((month, year))
}

/// Total delay per staff member for a month
#[utoipa::path(
    get,
    path = "/api/reports/monthly-delay",
    params(MonthQuery),
    responses(
        (status = 200, description = "Monthly totals", body = Object, example = json!({
            "success": true,
            "data": [{"staff_id": "BBH042", "name": "A. Kamath", "total_delay": "01:25:00"}],
            "month": 1,
            "year": 2025
        })),
        (status = 400, description = "Missing or invalid month/year")
    ),
    tag = "Reports"
)]
pub async fn monthly_delay_report(
    state: web::Data<AppState>,
    query: web::Query<MonthQuery>,
) -> actix_web::Result<impl Responder> {
    let (month, year) = month_and_year(query.month.as_deref(), query.year.as_deref())?;

    let data: Vec<MonthlyDelayRow> =
        blocking(move || monthly_delay(&state.engine, &state.store, year, month)).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": data,
        "month": month,
        "year": year
    })))
}

/// Day-by-day attendance for one staff member or everyone
#[utoipa::path(
    get,
    path = "/api/reports/staff-detail",
    params(StaffDetailQuery),
    responses(
        (status = 200, description = "One row per calendar day and a month total", body = [crate::engine::report::StaffDetailReport]),
        (status = 400, description = "Missing or invalid month/year/staff")
    ),
    tag = "Reports"
)]
pub async fn staff_detail_report(
    state: web::Data<AppState>,
    query: web::Query<StaffDetailQuery>,
) -> actix_web::Result<impl Responder> {
    let (month, year) = month_and_year(query.month.as_deref(), query.year.as_deref())?;
    let selector = StaffSelector::parse(query.staff.as_deref().unwrap_or(""))?;
    let staff = query.staff.clone().unwrap_or_default();

    let data = blocking(move || staff_detail(&state.engine, &state.store, year, month, &selector))
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": data,
        "month": month,
        "year": year,
        "staff": staff
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support;
    use crate::routes;
    use actix_web::{App, http::StatusCode, test as actix_test};
    use serde_json::Value;
    use std::fs;

    #[test]
    fn month_and_year_are_both_required() {
        assert!(matches!(month_and_year(Some("1"), None), Err(EngineError::Validation(_))));
        assert!(matches!(month_and_year(Some("x"), Some("2025")), Err(EngineError::Validation(_))));
        assert_eq!(month_and_year(Some(" 02 "), Some("2025")).unwrap(), (2, 2025));
    }

    #[actix_web::test]
    async fn monthly_report_over_the_working_store() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("derived")).unwrap();
        fs::write(
            dir.path().join("derived/2025-01-07.json"),
            r#"[{"student_id": "t1", "checkin": "2025-01-07T09:40:00", "checkout": "2025-01-07T16:30:00"}]"#,
        )
        .unwrap();
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(test_support::state(dir.path())))
                .configure(|cfg| routes::configure(cfg, "/api")),
        )
        .await;

        let req = actix_test::TestRequest::get()
            .uri("/api/reports/monthly-delay?month=1&year=2025")
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"][0]["total_delay"], "00:15:00");
        assert_eq!(body["data"][1]["total_delay"], "N/A");

        let req = actix_test::TestRequest::get()
            .uri("/api/reports/staff-detail?month=1&year=2025&staff=t1")
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"][0]["days"].as_array().unwrap().len(), 31);
        assert_eq!(body["data"][0]["total_delay"], "00:15:00");

        let req = actix_test::TestRequest::get()
            .uri("/api/reports/staff-detail?month=1&year=2025")
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
