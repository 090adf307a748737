// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Delegated request execution: room members call the provider as the room owner.
//!
//! A call resolves the room's owner, borrows the owner's current token pair, and
//! sends the request with the owner's access token. A 400 or 401 from the
//! provider marks that token stale: the executor refreshes it once, stores the
//! result, and retries once. There is no background refresh and no second cycle.

use std::sync::Arc;

use reqwest::Method;
use serde::Serialize;

use crate::error::DelegateError;
use crate::oauth::{build_http_client, ProviderConfig, TokenClient, TokenPair};
use crate::provider::{self, Profile};
use crate::store::{CredentialStore, Principal, RoomDirectory, StoreError};

/// Decoded provider reply, passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderResponse {
    pub status: u16,
    /// Response JSON; an empty body decodes to `{}`.
    pub body: serde_json::Value,
}

impl ProviderResponse {
    /// 2xx and 3xx count as success.
    pub fn is_success(&self) -> bool {
        (200..400).contains(&self.status)
    }

    /// The statuses that mark an access token as stale.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status, 400 | 401)
    }
}

/// Returned by [`Delegate::login`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginResult {
    pub user_id: String,
    pub email: String,
    pub display_name: String,
    pub access_token: String,
}

/// Executes provider calls with a room owner's credentials.
pub struct Delegate {
    api_base: String,
    http: reqwest::Client,
    tokens: TokenClient,
    credentials: Arc<dyn CredentialStore>,
    rooms: Arc<dyn RoomDirectory>,
}

impl Delegate {
    pub fn new(
        provider: &ProviderConfig,
        credentials: Arc<dyn CredentialStore>,
        rooms: Arc<dyn RoomDirectory>,
    ) -> Self {
        let http = build_http_client(provider.timeout);
        Self {
            api_base: provider.api_base.clone(),
            tokens: TokenClient::new(provider, http.clone()),
            http,
            credentials,
            rooms,
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Issue `method url` against the provider as the owner of `room_id`.
    ///
    /// Fails with `RoomNotFound` before any network traffic when the room is
    /// unknown. Non-auth provider errors come back as `Ok` with their status.
    pub async fn call_as_room(
        &self,
        room_id: &str,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<ProviderResponse, DelegateError> {
        let owner = self.rooms.resolve_owner(room_id)?;
        let snapshot = owner.tokens();

        let first = self.send(&method, url, body, &snapshot.access_token).await?;
        if !first.is_auth_failure() {
            return Ok(first);
        }

        tracing::info!(room = %room_id, status = first.status, "owner token rejected, refreshing");
        let access_token = self.renew(room_id, &snapshot).await?;

        let retried = self.send(&method, url, body, &access_token).await?;
        if retried.is_auth_failure() {
            tracing::warn!(room = %room_id, status = retried.status, "provider rejected refreshed token");
            return Err(DelegateError::UpstreamAuthFailed(format!(
                "provider returned {} after token refresh",
                retried.status
            )));
        }
        Ok(retried)
    }

    /// Exchange an authorization code, look up who it belongs to, and store them.
    ///
    /// Logging in again as the same provider identity overwrites the stored tokens.
    pub async fn login(&self, code: &str, redirect_uri: &str) -> Result<LoginResult, DelegateError> {
        if code.is_empty() {
            return Err(DelegateError::Input("missing authorization code".into()));
        }
        if redirect_uri.is_empty() {
            return Err(DelegateError::Input("missing redirect_uri".into()));
        }

        let pair = self.tokens.exchange_code(code, redirect_uri).await?;
        if pair.access_token.is_empty() {
            return Err(DelegateError::ExchangeFailed("token response has no access_token".into()));
        }

        let resp = self.send(&Method::GET, &provider::me_url(&self.api_base), None, &pair.access_token).await?;
        if resp.is_auth_failure() {
            return Err(DelegateError::UpstreamAuthFailed(format!(
                "profile lookup returned {}",
                resp.status
            )));
        }
        if !resp.is_success() {
            return Err(DelegateError::Upstream(format!("profile lookup returned {}", resp.status)));
        }
        let profile: Profile = serde_json::from_value(resp.body)
            .map_err(|e| DelegateError::Upstream(format!("malformed profile: {e}")))?;
        let user_id = profile
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| DelegateError::Upstream("profile has no id".into()))?;

        // Any lookup failure means "new principal".
        let existing = self.credentials.find_principal(&user_id).ok();
        let created = existing.is_none();
        let principal = Principal {
            id: user_id.clone(),
            display_name: profile.display_name.unwrap_or_default(),
            email: profile.email.unwrap_or_default(),
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            room: existing.and_then(|p| p.room),
        };
        let result = LoginResult {
            user_id: principal.id.clone(),
            email: principal.email.clone(),
            display_name: principal.display_name.clone(),
            access_token: principal.access_token.clone(),
        };
        self.credentials.upsert_principal(principal)?;

        tracing::info!(principal = %user_id, created, "login");
        Ok(result)
    }

    /// One refresh cycle for the principal holding `stale.access_token`.
    ///
    /// Returns the access token to retry with.
    async fn renew(&self, room_id: &str, stale: &TokenPair) -> Result<String, DelegateError> {
        let holder = match self.credentials.find_principal_by_access_token(&stale.access_token) {
            Ok(p) => p,
            Err(StoreError::PrincipalNotFound(_)) => {
                // Another call already replaced the token; retry with whatever it stored.
                let owner = self.rooms.resolve_owner(room_id)?;
                if !owner.access_token.is_empty() && owner.access_token != stale.access_token {
                    tracing::debug!(room = %room_id, "stale token already replaced");
                    return Ok(owner.access_token);
                }
                return Err(DelegateError::UpstreamAuthFailed(
                    "no principal holds the rejected access token".into(),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        if holder.refresh_token.is_empty() {
            tracing::warn!(principal = %holder.id, "no refresh token stored");
            return Err(DelegateError::UpstreamAuthFailed("no refresh token stored".into()));
        }

        let refreshed = match self.tokens.refresh(&holder.refresh_token).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(principal = %holder.id, err = %e, "token refresh failed");
                return Err(DelegateError::UpstreamAuthFailed(e.to_string()));
            }
        };

        // Re-read so fields written since the lookup (e.g. current room) survive.
        let mut current = self.credentials.find_principal(&holder.id).unwrap_or(holder);
        current.access_token = refreshed.access_token.clone();
        if let Some(rotated) = refreshed.refresh_token {
            current.refresh_token = rotated;
        }
        let principal_id = current.id.clone();
        self.credentials.upsert_principal(current)?;

        tracing::info!(principal = %principal_id, "access token refreshed");
        Ok(refreshed.access_token)
    }

    async fn send(
        &self,
        method: &Method,
        url: &str,
        body: Option<&serde_json::Value>,
        access_token: &str,
    ) -> Result<ProviderResponse, DelegateError> {
        let mut req = self.http.request(method.clone(), url).bearer_auth(access_token);
        req = match body {
            Some(json) => req.json(json),
            // The provider wants an explicit zero length on body-less writes.
            None if *method == Method::POST || *method == Method::PUT => {
                req.header(reqwest::header::CONTENT_LENGTH, "0")
            }
            None => req,
        };

        let resp = req.send().await?;
        let status = resp.status().as_u16();
        let bytes = resp.bytes().await?;

        let body = match decode_body(&bytes) {
            Ok(v) => v,
            // Auth failures are retried regardless of what the body says.
            Err(_) if matches!(status, 400 | 401) => serde_json::Value::Null,
            Err(e) => {
                return Err(DelegateError::Upstream(format!(
                    "undecodable response (status {status}): {e}"
                )))
            }
        };
        Ok(ProviderResponse { status, body })
    }
}

fn decode_body(bytes: &[u8]) -> Result<serde_json::Value, serde_json::Error> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::Value::Object(serde_json::Map::new()));
    }
    serde_json::from_slice(bytes)
}

#[cfg(test)]
#[path = "delegate_tests.rs"]
mod tests;
