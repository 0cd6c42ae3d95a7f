//! HTTP API for Galena.
//!
//! An Actix Web application exposing the coordinator under `/api`:
//!
//! | Method | Path | Response |
//! |--------|------|----------|
//! | GET | `/api/health` | `{"healthy": true}` |
//! | GET | `/api/events?limit=N` | `{"events": [...]}` |
//! | GET | `/api/servers` | `{"servers": [...]}` |
//! | POST | `/api/servers` | `{"server": {...}}` |
//! | GET | `/api/servers/{id}` | `{"server": {...}}` |
//! | PUT | `/api/servers/{id}` | `{"server": {...}}` |
//! | DELETE | `/api/servers/{id}` | 204 |
//! | POST | `/api/servers/{id}/start` | `{"server": {...}}` |
//! | POST | `/api/servers/{id}/stop` | `{"server": {...}}` |
//! | GET | `/api/servers/{id}/events?limit=N` | `{"events": [...]}` |
//!
//! Create and update take `{"server": {...}}` bodies. Failures are reported
//! as `{"errorType", "message", "validation"?}`.

pub mod error;
pub mod handlers;

pub use error::{ApiError, ErrorBody};

use crate::Galena;
use crate::config::Config;
use crate::error::{Error, Result};
use actix_cors::Cors;
use actix_web::{App, HttpServer, dev::Server, middleware, web};

/// Register the API routes; the app must provide `Data<Galena>`
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(error::json_error_handler))
        .service(
            web::scope("/api")
                .route("/health", web::get().to(handlers::health))
                .route("/events", web::get().to(handlers::fleet_events))
                .route("/servers", web::get().to(handlers::list_servers))
                .route("/servers", web::post().to(handlers::create_server))
                .route("/servers/{id}", web::get().to(handlers::get_server))
                .route("/servers/{id}", web::put().to(handlers::update_server))
                .route("/servers/{id}", web::delete().to(handlers::remove_server))
                .route("/servers/{id}/start", web::post().to(handlers::start_server))
                .route("/servers/{id}/stop", web::post().to(handlers::stop_server))
                .route("/servers/{id}/events", web::get().to(handlers::server_events)),
        );
}

/// Bind the HTTP server; the returned future must be awaited or spawned to serve
pub fn serve(config: &Config, galena: Galena) -> Result<Server> {
    let galena = web::Data::new(galena);

    let mut server_builder = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(middleware::Logger::default())
            .wrap(cors)
            .app_data(galena.clone())
            .configure(configure)
    });

    let workers = config.workers();
    tracing::info!(workers = workers, "Setting number of Actix Web workers");
    server_builder = server_builder.workers(workers);

    let addr = config.bind_address();
    let server = server_builder
        .bind(&addr)
        .map_err(|e| Error::Other(format!("Failed to bind {}: {}", addr, e)))?
        // Instances are stopped by the caller after the HTTP server is down
        .disable_signals()
        .run();

    tracing::info!(address = %addr, "HTTP API listening");
    Ok(server)
}
