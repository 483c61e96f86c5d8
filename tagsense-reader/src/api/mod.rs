//! HTTP API for tagsense-reader
//!
//! Control and query endpoints live under `/api/rfid`; health and build
//! information sit outside the prefix.

pub mod buildinfo;
pub mod error;
pub mod handlers;
pub mod health;
pub mod sse;
pub mod tags;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::session::SessionController;

pub use buildinfo::get_build_info;
pub use error::ApiError;
pub use health::health_routes;
pub use sse::event_stream;
pub use tags::get_recent_tags;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<SessionController>,
}

impl AppState {
    pub fn new(controller: Arc<SessionController>) -> Self {
        Self { controller }
    }
}

/// Response envelope used by every `/api/rfid` endpoint
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub timestamp: DateTime<Utc>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success",
            message: None,
            data: Some(data),
            timestamp: Utc::now(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<()> {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: Some(message.into()),
            data: None,
            timestamp: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let rfid = Router::new()
        .route("/start", post(handlers::start_reading))
        .route("/stop", post(handlers::stop_reading))
        .route("/status", get(handlers::get_status))
        .route("/counter", get(handlers::get_tag_counter))
        .route("/threshold/:value", post(handlers::set_threshold))
        .route("/reset", post(handlers::reset_counter))
        .route("/tags", get(get_recent_tags))
        .route("/events", get(event_stream));

    Router::new()
        .nest("/api/rfid", rfid)
        .route("/api/buildinfo", get(get_build_info))
        .merge(health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
