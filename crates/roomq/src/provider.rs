// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Provider REST endpoints and typed views over their JSON.

use serde::Deserialize;

use crate::delegate::ProviderResponse;
use crate::oauth::form_encode;

/// `GET {api_base}/me`
pub fn me_url(api_base: &str) -> String {
    format!("{api_base}/me")
}

/// `GET {api_base}/search?q=<query>&type=track`; spaces in the query become `+`.
pub fn search_url(api_base: &str, query: &str) -> String {
    format!("{api_base}/search?q={}&type=track", form_encode(query))
}

/// `POST {api_base}/me/player/queue?uri=<track uri>`
pub fn queue_url(api_base: &str, track_uri: &str) -> String {
    format!("{api_base}/me/player/queue?uri={}", form_encode(track_uri))
}

/// `GET {api_base}/me/top/tracks?time_range=short_term`
pub fn top_tracks_url(api_base: &str) -> String {
    format!("{api_base}/me/top/tracks?time_range=short_term")
}

/// The "who am I" response. Every field is optional on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<ErrorDetail>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    status: Option<u16>,
}

/// Status of a provider error, from the HTTP status or the body's `error.status`.
///
/// Returns `None` for successful responses without an error object.
pub fn error_status(resp: &ProviderResponse) -> Option<u16> {
    let embedded = serde_json::from_value::<ErrorEnvelope>(resp.body.clone())
        .ok()
        .and_then(|e| e.error)
        .and_then(|d| d.status);
    match embedded {
        Some(status) => Some(status),
        None if resp.is_success() => None,
        None => Some(resp.status),
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
