#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the safety map overlay.
//!
//! Serves the report collection, the computed grid and heat overlays, and
//! place search to map frontends. Reports are re-fetched from the store
//! on every overlay request; an unreachable store yields an empty
//! overlay rather than an error.

mod handlers;
pub mod interactive;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use safety_map_store::{MemoryStore, RestStore, SafetyStore, StoreConfig, StoreError};

/// Shared application state.
pub struct AppState {
    /// Report store.
    pub store: Arc<dyn SafetyStore>,
    /// HTTP client for place search.
    pub http: reqwest::Client,
    /// Nominatim search endpoint.
    pub nominatim_url: String,
}

impl AppState {
    /// Creates state around `store`, reading the search endpoint from the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(store: Arc<dyn SafetyStore>) -> Result<Self, safety_map_geocoder::GeocodeError> {
        Ok(Self {
            store,
            http: safety_map_geocoder::client()?,
            nominatim_url: safety_map_geocoder::base_url_from_env(),
        })
    }
}

/// Picks the store backend from `SAFETY_MAP_STORE_BACKEND` (`rest` by
/// default, or `memory`).
///
/// # Errors
///
/// Returns [`StoreError::Config`] if the backend is unknown or the REST
/// store is missing its URL or key.
pub fn store_from_env() -> Result<Arc<dyn SafetyStore>, StoreError> {
    let backend =
        std::env::var("SAFETY_MAP_STORE_BACKEND").unwrap_or_else(|_| "rest".to_string());

    match backend.to_lowercase().as_str() {
        "rest" => {
            let config = StoreConfig::from_env()?;
            log::info!("Using REST store at {}", config.endpoint());
            Ok(Arc::new(RestStore::new(config)))
        }
        "memory" => {
            log::warn!("Using in-memory store; reports are lost on shutdown");
            Ok(Arc::new(MemoryStore::new()))
        }
        other => Err(StoreError::Config {
            message: format!("Unknown store backend: {other}. Use 'rest' or 'memory'."),
        }),
    }
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/reports", web::get().to(handlers::reports))
            .route("/reports", web::post().to(handlers::create_report))
            .route("/reports/{id}", web::delete().to(handlers::delete_report))
            .route("/grid", web::get().to(handlers::grid))
            .route("/clusters", web::get().to(handlers::clusters))
            .route("/heat", web::get().to(handlers::heat))
            .route("/overlays", web::get().to(handlers::overlays))
            .route("/overlays/{id}", web::get().to(handlers::overlay))
            .route("/search", web::get().to(handlers::search)),
    );
}

/// Starts the safety map API server.
///
/// Reads `BIND_ADDR` (default `127.0.0.1`) and `PORT` (default `8080`)
/// from the environment. This is a regular async function; the caller is
/// responsible for providing the async runtime (e.g. via
/// `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP client cannot be built,
/// or the HTTP server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(store: Arc<dyn SafetyStore>) -> std::io::Result<()> {
    let state = web::Data::new(AppState::new(store).map_err(std::io::Error::other)?);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
