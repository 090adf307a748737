// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde_json::json;

use super::*;
use crate::test_support::MockProvider;

async fn client() -> anyhow::Result<(MockProvider, TokenClient)> {
    let mock = MockProvider::start().await?;
    let config = mock.provider_config();
    let client = TokenClient::new(&config, build_http_client(config.timeout));
    Ok((mock, client))
}

#[tokio::test]
async fn exchange_code_posts_form_with_basic_auth() -> anyhow::Result<()> {
    let (mock, client) = client().await?;
    mock.push_token(200, json!({ "access_token": "acc-1", "refresh_token": "ref-1", "expires_in": 3600 }));

    let pair = client.exchange_code("the code", "app://callback").await?;
    assert_eq!(pair, TokenPair { access_token: "acc-1".into(), refresh_token: "ref-1".into() });

    let calls = mock.token_calls();
    assert_eq!(calls.len(), 1);
    let call = &calls[0];
    // base64("test-client:test-secret")
    assert_eq!(call.authorization.as_deref(), Some("Basic dGVzdC1jbGllbnQ6dGVzdC1zZWNyZXQ="));
    assert!(call.body.contains("grant_type=authorization_code"));
    assert!(call.body.contains("code=the+code"));
    assert!(call.body.contains("redirect_uri=app%3A%2F%2Fcallback"));
    Ok(())
}

#[tokio::test]
async fn exchange_code_tolerates_missing_fields() -> anyhow::Result<()> {
    let (mock, client) = client().await?;
    mock.push_token(200, json!({ "token_type": "Bearer" }));

    let pair = client.exchange_code("c", "r").await?;
    assert!(pair.access_token.is_empty());
    assert!(pair.refresh_token.is_empty());
    Ok(())
}

#[yare::parameterized(
    rejected_grant = { 400, r#"{"error":"invalid_grant"}"# },
    html_body = { 200, "<html>oops</html>" },
)]
#[test_macro(tokio::test)]
async fn exchange_code_failures(status: u16, body: &str) -> anyhow::Result<()> {
    let (mock, client) = client().await?;
    mock.push_token_raw(status, body);

    let err = client.exchange_code("c", "r").await;
    assert!(matches!(err, Err(DelegateError::ExchangeFailed(_))), "got {err:?}");
    Ok(())
}

#[tokio::test]
async fn exchange_code_transport_failure() -> anyhow::Result<()> {
    let config = ProviderConfig {
        client_id: "c".into(),
        client_secret: "s".into(),
        // Port 9 (discard) is closed on test hosts.
        token_url: "http://127.0.0.1:9/token".into(),
        api_base: "http://127.0.0.1:9/v1".into(),
        timeout: Duration::from_secs(2),
    };
    let client = TokenClient::new(&config, build_http_client(config.timeout));
    assert!(matches!(client.exchange_code("c", "r").await, Err(DelegateError::ExchangeFailed(_))));
    Ok(())
}

#[tokio::test]
async fn refresh_returns_new_access_token() -> anyhow::Result<()> {
    let (mock, client) = client().await?;
    mock.push_token(200, json!({ "access_token": "acc-2", "expires_in": 3600 }));

    let refreshed = client.refresh("ref-1").await?;
    assert_eq!(refreshed, RefreshedToken { access_token: "acc-2".into(), refresh_token: None });

    let calls = mock.token_calls();
    assert!(calls[0].body.contains("grant_type=refresh_token"));
    assert!(calls[0].body.contains("refresh_token=ref-1"));
    Ok(())
}

#[tokio::test]
async fn refresh_reports_rotated_refresh_token() -> anyhow::Result<()> {
    let (mock, client) = client().await?;
    mock.push_token(200, json!({ "access_token": "acc-2", "refresh_token": "ref-2" }));

    let refreshed = client.refresh("ref-1").await?;
    assert_eq!(refreshed.refresh_token.as_deref(), Some("ref-2"));
    Ok(())
}

#[yare::parameterized(
    missing_access_token = { 200, r#"{"token_type":"Bearer"}"# },
    empty_access_token = { 200, r#"{"access_token":""}"# },
    rejected_grant = { 400, r#"{"error":"invalid_grant"}"# },
    not_json = { 200, "not json" },
)]
#[test_macro(tokio::test)]
async fn refresh_failures(status: u16, body: &str) -> anyhow::Result<()> {
    let (mock, client) = client().await?;
    mock.push_token_raw(status, body);

    let err = client.refresh("ref-1").await;
    assert!(matches!(err, Err(DelegateError::RefreshFailed(_))), "got {err:?}");
    Ok(())
}

#[tokio::test]
async fn refresh_timeout_is_refresh_failure() -> anyhow::Result<()> {
    let mock = MockProvider::start().await?;
    let config = ProviderConfig { timeout: Duration::from_millis(200), ..mock.provider_config() };
    let client = TokenClient::new(&config, build_http_client(config.timeout));
    mock.push_token(200, json!({ "access_token": "late" }));
    mock.stall(Duration::from_secs(3));

    let started = std::time::Instant::now();
    let err = client.refresh("ref-1").await;
    assert!(matches!(err, Err(DelegateError::RefreshFailed(_))), "got {err:?}");
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(mock.token_calls().len(), 1);
    Ok(())
}

#[test]
fn form_encode_uses_plus_for_spaces() {
    assert_eq!(form_encode("bohemian rhapsody"), "bohemian+rhapsody");
    assert_eq!(form_encode("spotify:track:4u7"), "spotify%3Atrack%3A4u7");
    assert_eq!(form_encode("rock & roll"), "rock+%26+roll");
    assert_eq!(form_encode("café"), "caf%C3%A9");
}
