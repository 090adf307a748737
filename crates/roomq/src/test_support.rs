// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: a fake provider and state builders.

use std::collections::{HashMap, HashSet, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use parking_lot::Mutex;
use tokio::net::TcpListener;

use crate::oauth::ProviderConfig;
use crate::state::AppState;
use crate::store::records::RecordStore;
use crate::store::{CredentialStore, Principal};

/// One request observed by [`MockProvider`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: String,
}

#[derive(Default)]
struct MockInner {
    token_responses: Mutex<VecDeque<(u16, String)>>,
    last_token_response: Mutex<Option<(u16, String)>>,
    accepted: Mutex<HashSet<String>>,
    routes: Mutex<HashMap<String, (u16, String)>>,
    token_calls: Mutex<Vec<RecordedRequest>>,
    api_calls: Mutex<Vec<RecordedRequest>>,
    stall: Mutex<Option<Duration>>,
}

/// Fake identity provider + REST API on `127.0.0.1:0`.
///
/// `POST /token` replays queued responses (the last one repeats). Every other
/// path is an API call: bearer tokens not in the accepted set get a 401, the
/// rest get the response registered for the path (default `200 {}`).
#[derive(Clone)]
pub struct MockProvider {
    pub addr: SocketAddr,
    inner: Arc<MockInner>,
}

impl MockProvider {
    pub async fn start() -> anyhow::Result<Self> {
        let inner = Arc::new(MockInner::default());
        let app = Router::new().fallback(mock_handler).with_state(Arc::clone(&inner));
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        Ok(Self { addr, inner })
    }

    pub fn token_url(&self) -> String {
        format!("http://{}/token", self.addr)
    }

    pub fn api_base(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            client_id: "test-client".to_owned(),
            client_secret: "test-secret".to_owned(),
            token_url: self.token_url(),
            api_base: self.api_base(),
            timeout: Duration::from_secs(5),
        }
    }

    /// Queue a token endpoint response.
    pub fn push_token(&self, status: u16, body: serde_json::Value) {
        self.inner.token_responses.lock().push_back((status, body.to_string()));
    }

    /// Queue a raw (possibly non-JSON) token endpoint response.
    pub fn push_token_raw(&self, status: u16, body: &str) {
        self.inner.token_responses.lock().push_back((status, body.to_owned()));
    }

    /// Accept `token` as a valid bearer for API calls.
    pub fn accept(&self, token: &str) {
        self.inner.accepted.lock().insert(token.to_owned());
    }

    /// Register the response for an API path such as `/v1/me`.
    pub fn respond(&self, path: &str, status: u16, body: serde_json::Value) {
        self.inner.routes.lock().insert(path.to_owned(), (status, body.to_string()));
    }

    /// Hold every later response for `delay` after recording the request.
    pub fn stall(&self, delay: Duration) {
        *self.inner.stall.lock() = Some(delay);
    }

    /// Register a raw body for an API path.
    pub fn respond_raw(&self, path: &str, status: u16, body: &str) {
        self.inner.routes.lock().insert(path.to_owned(), (status, body.to_owned()));
    }

    pub fn token_calls(&self) -> Vec<RecordedRequest> {
        self.inner.token_calls.lock().clone()
    }

    pub fn api_calls(&self) -> Vec<RecordedRequest> {
        self.inner.api_calls.lock().clone()
    }
}

async fn mock_handler(
    State(inner): State<Arc<MockInner>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let recorded = RecordedRequest {
        method,
        path: uri.path().to_owned(),
        query: uri.query().map(str::to_owned),
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned),
        body,
    };
    let stall = *inner.stall.lock();

    if recorded.path == "/token" {
        inner.token_calls.lock().push(recorded);
        if let Some(delay) = stall {
            tokio::time::sleep(delay).await;
        }
        let next = inner.token_responses.lock().pop_front();
        let (status, body) = match next {
            Some(resp) => {
                *inner.last_token_response.lock() = Some(resp.clone());
                resp
            }
            None => inner
                .last_token_response
                .lock()
                .clone()
                .unwrap_or((500, r#"{"error":"server_error"}"#.to_owned())),
        };
        return json_response(status, body);
    }

    let bearer = recorded
        .authorization
        .as_deref()
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_owned);
    let path = recorded.path.clone();
    inner.api_calls.lock().push(recorded);
    if let Some(delay) = stall {
        tokio::time::sleep(delay).await;
    }

    let accepted = bearer.is_some_and(|t| inner.accepted.lock().contains(&t));
    if !accepted {
        let body = serde_json::json!({
            "error": { "status": 401, "message": "The access token expired" }
        });
        return json_response(401, body.to_string());
    }

    let (status, body) =
        inner.routes.lock().get(&path).cloned().unwrap_or((200, "{}".to_owned()));
    json_response(status, body)
}

fn json_response(status: u16, body: String) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, [("content-type", "application/json")], body).into_response()
}

/// A principal with predictable profile fields.
pub fn principal(id: &str, access_token: &str, refresh_token: &str) -> Principal {
    Principal {
        id: id.to_owned(),
        display_name: format!("{id} display"),
        email: format!("{id}@example.com"),
        access_token: access_token.to_owned(),
        refresh_token: refresh_token.to_owned(),
        room: None,
    }
}

/// Build app state over an in-memory store pointed at `provider`.
pub fn test_state(provider: &ProviderConfig) -> Arc<AppState> {
    let records = Arc::new(RecordStore::in_memory());
    Arc::new(AppState::new(provider, records))
}

/// Insert `principal` and make them the owner of a fresh room `room_id`.
pub fn seed_room(state: &AppState, room_id: &str, owner: Principal) -> anyhow::Result<()> {
    use crate::store::RoomDirectory;

    let owner_id = owner.id.clone();
    state.records.upsert_principal(owner)?;
    state.records.create_room_if_absent(room_id, &owner_id)?;
    Ok(())
}
