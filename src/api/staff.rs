use actix_web::{HttpResponse, Responder, web};

use crate::model::staff::StaffListEntry;
use crate::state::AppState;

/// Staff directory, sorted by id
#[utoipa::path(
    get,
    path = "/api/staff",
    responses(
        (status = 200, description = "All profiled staff", body = [StaffListEntry])
    ),
    tag = "Staff"
)]
pub async fn list_staff(state: web::Data<AppState>) -> impl Responder {
    let profiles = state.engine.profiles();
    let staff: Vec<StaffListEntry> = profiles
        .ids()
        .into_iter()
        .map(|id| StaffListEntry {
            name: profiles.name_of(&id),
            id: id.to_string(),
        })
        .collect();

    HttpResponse::Ok().json(staff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support;
    use actix_web::{App, test};
    use serde_json::{Value, json};

    #[actix_web::test]
    async fn lists_profiles_in_id_order() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_support::state(dir.path())))
                .route("/staff", web::get().to(list_staff)),
        )
        .await;

        let req = test::TestRequest::get().uri("/staff").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(
            body,
            json!([{"id": "T1", "name": "Asha"}, {"id": "T2", "name": "Ravi"}])
        );
    }
}
