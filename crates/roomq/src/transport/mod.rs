// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP transport for room and login endpoints.

pub mod http;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the axum `Router` with all roomq routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "hello" }))
        .route("/api/health", get(http::health))
        // Login
        .route("/api/login", post(http::login))
        // Rooms
        .route("/rooms/{id}", post(http::create_room).get(http::get_room).delete(http::delete_room))
        .route("/rooms/{id}/members", post(http::join_room))
        // Delegated provider calls
        .route("/rooms/{id}/queue", post(http::enqueue_track))
        .route("/rooms/{id}/search", get(http::search_tracks))
        .route("/rooms/{id}/top", get(http::top_tracks))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
