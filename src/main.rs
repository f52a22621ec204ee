use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;
use dotenvy::dotenv;
use tokio_util::sync::CancellationToken;

mod api;
mod config;
mod docs;
mod engine;
mod error;
mod model;
mod routes;
mod state;
mod store;
mod utils;

use config::Config;
use engine::scheduler::spawn_sync_loop;
use state::AppState;

use crate::docs::ApiDoc;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Attendance delay service"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(
        source = %config.attendance_dir.display(),
        derived = %config.derived_dir.display(),
        working = %config.working_dir().display(),
        "Server starting..."
    );

    let state = Data::new(AppState::from_config(&config));

    let stop = CancellationToken::new();
    let background = if config.sync_enabled {
        Some(spawn_sync_loop(
            state.sync.clone(),
            config.cadence(),
            stop.clone(),
        ))
    } else {
        info!("Background sync disabled");
        None
    };

    let server_addr = config.server_addr.clone();
    let api_prefix = config.api_prefix.clone();

    HttpServer::new(move || {
        let api_prefix = api_prefix.clone();
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(state.clone())
            .service(index)
            .configure(move |cfg| routes::configure(cfg, &api_prefix))
    })
    .bind(&server_addr)
    .with_context(|| format!("cannot bind {server_addr}"))?
    .run()
    .await?;

    stop.cancel();
    if let Some(handle) = background {
        if let Err(e) = handle.await {
            warn!(error = %e, "Background sync ended abnormally");
        }
    }
    info!("Server stopped");
    Ok(())
}
