// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! roomq: shared room queues driven by the room owner's provider account.

pub mod config;
pub mod delegate;
pub mod error;
pub mod oauth;
pub mod provider;
pub mod state;
pub mod store;
pub mod test_support;
pub mod transport;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::RoomqConfig;
use crate::state::AppState;
use crate::store::records::RecordStore;
use crate::transport::build_router;

/// Run the roomq server until shutdown.
pub async fn run(config: RoomqConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let shutdown = CancellationToken::new();

    let records = match config.records_path() {
        Some(path) => RecordStore::open(path)?,
        None => {
            tracing::info!("ephemeral mode, records are not persisted");
            RecordStore::in_memory()
        }
    };
    let state = Arc::new(AppState::new(&config.provider(), Arc::new(records)));

    spawn_signal_handler(shutdown.clone());

    let router = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("roomq listening on {addr}");
    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;

    tracing::info!("roomq stopped");
    Ok(())
}

fn spawn_signal_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()).ok();

        tokio::select! {
            _ = async {
                if let Some(ref mut s) = sigterm { s.recv().await } else { std::future::pending().await }
            } => {
                tracing::info!("received SIGTERM");
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("received SIGINT");
            }
        }
        shutdown.cancel();
    });
}
