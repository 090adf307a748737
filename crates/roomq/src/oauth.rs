// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OAuth token endpoint client: authorization-code exchange and refresh.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::DelegateError;

/// Provider endpoints and client credentials, fixed at construction.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Token endpoint for both grants.
    pub token_url: String,
    /// REST API base, e.g. `https://api.spotify.com/v1`.
    pub api_base: String,
    /// Applied to every outbound call.
    pub timeout: Duration,
}

/// Access + refresh token, always handled together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// The fields of an OAuth2 token response that roomq keeps. Both are optional on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Result of a refresh grant. `refresh_token` is set only when the provider rotated it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshedToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

/// Build the shared HTTP client used for token and API calls.
pub fn build_http_client(timeout: Duration) -> reqwest::Client {
    // reqwest is built without a bundled crypto provider.
    let _ = rustls::crypto::ring::default_provider().install_default();
    reqwest::Client::builder().timeout(timeout).build().unwrap_or_default()
}

/// Talks to the provider's token endpoint with HTTP Basic client authentication.
#[derive(Clone)]
pub struct TokenClient {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl TokenClient {
    pub fn new(provider: &ProviderConfig, http: reqwest::Client) -> Self {
        Self {
            http,
            token_url: provider.token_url.clone(),
            client_id: provider.client_id.clone(),
            client_secret: provider.client_secret.clone(),
        }
    }

    /// Exchange an authorization code for a token pair.
    ///
    /// Missing fields come back as empty strings; callers decide how strict to be.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenPair, DelegateError> {
        let token = self
            .post_grant(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri),
            ])
            .await
            .map_err(DelegateError::ExchangeFailed)?;

        Ok(TokenPair {
            access_token: token.access_token.unwrap_or_default(),
            refresh_token: token.refresh_token.unwrap_or_default(),
        })
    }

    /// Mint a new access token from a refresh token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshedToken, DelegateError> {
        let token = self
            .post_grant(&[("grant_type", "refresh_token"), ("refresh_token", refresh_token)])
            .await
            .map_err(DelegateError::RefreshFailed)?;

        let access_token = token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| DelegateError::RefreshFailed("response has no access_token".into()))?;
        Ok(RefreshedToken {
            access_token,
            refresh_token: token.refresh_token.filter(|t| !t.is_empty()),
        })
    }

    async fn post_grant(&self, form: &[(&str, &str)]) -> Result<TokenResponse, String> {
        let resp = self
            .http
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(form)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), "token endpoint rejected grant");
            return Err(format!("{status}: {text}"));
        }

        let bytes = resp.bytes().await.map_err(|e| e.to_string())?;
        serde_json::from_slice(&bytes).map_err(|e| format!("malformed token response: {e}"))
    }
}

/// Form-style encoding for URL query parameters (spaces as `+`).
pub fn form_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char);
            }
            b' ' => out.push('+'),
            _ => {
                out.push('%');
                out.push(char::from(HEX[(b >> 4) as usize]));
                out.push(char::from(HEX[(b & 0xf) as usize]));
            }
        }
    }
    out
}

const HEX: &[u8; 16] = b"0123456789ABCDEF";

#[cfg(test)]
#[path = "oauth_tests.rs"]
mod tests;
