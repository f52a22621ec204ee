use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use tracing::instrument;

use crate::api::blocking;
use crate::engine::annotate::annotate_dir;
use crate::state::AppState;

/// Run a sync pass now
#[utoipa::path(
    post,
    path = "/api/sync",
    responses(
        (status = 200, description = "Files copied, updated or failed in this pass", body = crate::engine::sync::SyncReport),
        (status = 500, description = "Source directory unreadable")
    ),
    tag = "Sync"
)]
#[instrument(skip(state))]
pub async fn trigger_sync(state: web::Data<AppState>) -> actix_web::Result<impl Responder> {
    let report = blocking(move || state.sync.sync()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "newly_copied": report.newly_copied,
        "updated": report.updated,
        "errors": report.errors
    })))
}

/// Outcome of the last sync pass
#[utoipa::path(
    get,
    path = "/api/sync/status",
    responses(
        (status = 200, description = "Last run, last report and pass count", body = crate::engine::sync::SyncStatus)
    ),
    tag = "Sync"
)]
pub async fn sync_status(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.sync.status())
}

/// Re-annotate every day file in the derived store
#[utoipa::path(
    post,
    path = "/api/annotate-all",
    responses(
        (status = 200, description = "Annotated files and per-file errors", body = crate::engine::annotate::AnnotationReport)
    ),
    tag = "Sync"
)]
#[instrument(skip(state))]
pub async fn annotate_all(state: web::Data<AppState>) -> actix_web::Result<impl Responder> {
    let report = blocking(move || {
        let derived = state.sync.derived();
        let _guard = derived.lock();
        Ok(annotate_dir(state.sync.engine(), derived.root()))
    })
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "annotated": report.annotated,
        "errors": report.errors
    })))
}
