// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP handlers for roomq.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::delegate::ProviderResponse;
use crate::error::{DelegateError, ErrorCode};
use crate::provider;
use crate::state::AppState;
use crate::store::{RoomCreate, RoomDirectory};

// -- Request/Response types ---------------------------------------------------

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub principals: usize,
    pub rooms: usize,
}

/// Body of `POST /api/login`. Extra OAuth fields sent by clients are ignored.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub redirect_uri: String,
}

#[derive(Debug, Deserialize)]
pub struct UserRequest {
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct CreateRoomResponse {
    pub id: String,
    pub created: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct RoomInfo {
    pub id: String,
    /// Owner's display name; the owner's id never leaves the server.
    pub owner: String,
    pub member_count: usize,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct EnqueueRequest {
    #[serde(default, alias = "uri")]
    pub spotify_uri: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub track: Option<String>,
}

// -- Handlers -----------------------------------------------------------------

/// `GET /api/health`
pub async fn health(State(s): State<Arc<AppState>>) -> impl IntoResponse {
    let (principals, rooms) = s.records.counts();
    Json(HealthResponse { status: "running".to_owned(), principals, rooms })
}

/// `POST /api/login`: exchange an authorization code and store the principal.
pub async fn login(
    State(s): State<Arc<AppState>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> impl IntoResponse {
    let req = match body {
        Ok(Json(req)) => req,
        Err(e) => return input_error(e),
    };
    match s.delegate.login(&req.code, &req.redirect_uri).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => {
            tracing::warn!(err = %e, "login failed");
            e.into_response()
        }
    }
}

/// `POST /rooms/{id}`: create a room owned by `user_id`; repeat calls are no-ops.
pub async fn create_room(
    State(s): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<UserRequest>, JsonRejection>,
) -> impl IntoResponse {
    let req = match body {
        Ok(Json(req)) => req,
        Err(e) => return input_error(e),
    };
    if req.user_id.is_empty() {
        return DelegateError::Input("missing user_id".into()).into_response();
    }

    match s.records.create_room_if_absent(&id, &req.user_id) {
        Ok(RoomCreate::Created(_)) => {
            tracing::info!(room = %id, principal = %req.user_id, "room created");
            Json(CreateRoomResponse { id, created: true, message: "created room".to_owned() })
                .into_response()
        }
        Ok(RoomCreate::AlreadyExists(_)) => {
            Json(CreateRoomResponse { id, created: false, message: "room already exists".to_owned() })
                .into_response()
        }
        Err(e) => DelegateError::from(e).into_response(),
    }
}

/// `GET /rooms/{id}`: room info with the owner's display name.
pub async fn get_room(State(s): State<Arc<AppState>>, Path(id): Path<String>) -> impl IntoResponse {
    let room = match s.records.find_room(&id) {
        Ok(room) => room,
        Err(e) => return DelegateError::from(e).into_response(),
    };
    match s.records.resolve_owner(&id) {
        Ok(owner) => Json(RoomInfo { id, owner: owner.display_name, member_count: room.members.len() })
            .into_response(),
        Err(e) => DelegateError::from(e).into_response(),
    }
}

/// `DELETE /rooms/{id}`
pub async fn delete_room(
    State(s): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match s.records.delete_room(&id) {
        Ok(_) => {
            tracing::info!(room = %id, "room removed");
            Json(MessageResponse { message: "removed room".to_owned() }).into_response()
        }
        Err(e) => DelegateError::from(e).into_response(),
    }
}

/// `POST /rooms/{id}/members`: join a room as `user_id`.
pub async fn join_room(
    State(s): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<UserRequest>, JsonRejection>,
) -> impl IntoResponse {
    let req = match body {
        Ok(Json(req)) => req,
        Err(e) => return input_error(e),
    };
    if req.user_id.is_empty() {
        return DelegateError::Input("missing user_id".into()).into_response();
    }

    match s.records.add_member(&id, &req.user_id) {
        Ok(room) => {
            tracing::info!(room = %id, principal = %req.user_id, "member joined");
            Json(serde_json::json!({ "id": room.id, "member_count": room.members.len() }))
                .into_response()
        }
        Err(e) => DelegateError::from(e).into_response(),
    }
}

/// `POST /rooms/{id}/queue`: add a track to the owner's playback queue.
pub async fn enqueue_track(
    State(s): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<EnqueueRequest>, JsonRejection>,
) -> impl IntoResponse {
    let req = match body {
        Ok(Json(req)) => req,
        Err(e) => return input_error(e),
    };
    if req.spotify_uri.is_empty() {
        return DelegateError::Input("missing spotify_uri".into()).into_response();
    }

    let url = provider::queue_url(s.delegate.api_base(), &req.spotify_uri);
    match s.delegate.call_as_room(&id, Method::POST, &url, None).await {
        Ok(resp) => provider_reply(resp),
        Err(e) => e.into_response(),
    }
}

/// `GET /rooms/{id}/search?track=`: search tracks as the room owner.
pub async fn search_tracks(
    State(s): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    // Blank queries are rejected; anything else is forwarded as typed.
    let track = match params.track {
        Some(t) if !t.trim().is_empty() => t,
        _ => return DelegateError::Input("missing track query".into()).into_response(),
    };

    let url = provider::search_url(s.delegate.api_base(), &track);
    match s.delegate.call_as_room(&id, Method::GET, &url, None).await {
        Ok(resp) => provider_reply(resp),
        Err(e) => e.into_response(),
    }
}

/// `GET /rooms/{id}/top`: the owner's short-term top tracks.
pub async fn top_tracks(
    State(s): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let url = provider::top_tracks_url(s.delegate.api_base());
    match s.delegate.call_as_room(&id, Method::GET, &url, None).await {
        Ok(resp) => provider_reply(resp),
        Err(e) => e.into_response(),
    }
}

// -- Helpers ------------------------------------------------------------------

/// Pass a provider reply through, collapsing not-found errors into the envelope.
fn provider_reply(resp: ProviderResponse) -> Response {
    match provider::error_status(&resp) {
        None => Json(resp.body).into_response(),
        Some(404) => ErrorCode::NotFound.to_http_response("error occurred").into_response(),
        Some(status) => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            (status, Json(resp.body)).into_response()
        }
    }
}

fn input_error(rejection: JsonRejection) -> Response {
    DelegateError::Input(rejection.body_text()).into_response()
}
