use crate::api::{attendance, reports, staff, sync};
use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig, api_prefix: &str) {
    cfg.service(
        web::scope(api_prefix)
            .service(
                web::scope("/attendance")
                    // /attendance?date=
                    .service(web::resource("").route(web::get().to(attendance::daily_attendance)))
                    .service(
                        web::resource("/update").route(web::post().to(attendance::update_attendance)),
                    )
                    .service(
                        web::resource("/delete").route(web::post().to(attendance::delete_attendance)),
                    )
                    .service(
                        web::resource("/delete-specific")
                            .route(web::post().to(attendance::delete_specific_attendance)),
                    )
                    .service(web::resource("/add").route(web::post().to(attendance::add_attendance))),
            )
            .service(web::resource("/staff").route(web::get().to(staff::list_staff)))
            .service(
                web::scope("/reports")
                    .service(
                        web::resource("/monthly-delay")
                            .route(web::get().to(reports::monthly_delay_report)),
                    )
                    .service(
                        web::resource("/staff-detail")
                            .route(web::get().to(reports::staff_detail_report)),
                    ),
            )
            .service(
                web::scope("/sync")
                    .service(web::resource("").route(web::post().to(sync::trigger_sync)))
                    .service(web::resource("/status").route(web::get().to(sync::sync_status))),
            )
            .service(web::resource("/annotate-all").route(web::post().to(sync::annotate_all))),
    );
}
