// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;

use super::*;

fn parse(args: &[&str]) -> anyhow::Result<RoomqConfig> {
    let mut argv = vec!["roomq", "--client-id", "cid", "--client-secret", "secret"];
    argv.extend_from_slice(args);
    Ok(RoomqConfig::try_parse_from(argv)?)
}

#[test]
fn defaults_validate() -> anyhow::Result<()> {
    let config = parse(&[])?;
    config.validate()?;
    assert_eq!(config.port, 8090);
    assert_eq!(config.request_timeout(), Duration::from_secs(10));
    Ok(())
}

#[test]
fn provider_trims_trailing_slash() -> anyhow::Result<()> {
    let config = parse(&["--api-base", "http://127.0.0.1:9/v1/"])?;
    let provider = config.provider();
    assert_eq!(provider.api_base, "http://127.0.0.1:9/v1");
    assert_eq!(provider.client_id, "cid");
    Ok(())
}

#[test]
fn ephemeral_has_no_records_path() -> anyhow::Result<()> {
    let config = parse(&["--ephemeral"])?;
    assert!(config.records_path().is_none());

    let config = parse(&["--state-dir", "/tmp/roomq-state"])?;
    assert_eq!(config.records_path(), Some(PathBuf::from("/tmp/roomq-state/records.json")));
    Ok(())
}

#[yare::parameterized(
    bad_format = { &["--log-format", "xml"] },
    zero_timeout = { &["--request-timeout-ms", "0"] },
)]
fn validate_rejects(extra: &[&str]) {
    let config = parse(extra);
    assert!(matches!(config, Ok(ref c) if c.validate().is_err()), "{extra:?} should be rejected");
}

#[test]
fn missing_secret_is_rejected() -> anyhow::Result<()> {
    let mut config = parse(&[])?;
    config.client_secret.clear();
    assert!(config.validate().is_err());
    Ok(())
}
