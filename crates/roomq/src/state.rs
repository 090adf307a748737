// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use crate::delegate::Delegate;
use crate::oauth::ProviderConfig;
use crate::store::records::RecordStore;

/// Shared server state.
pub struct AppState {
    /// Principals and rooms; also the delegate's credential store and room directory.
    pub records: Arc<RecordStore>,
    pub delegate: Delegate,
}

impl AppState {
    pub fn new(provider: &ProviderConfig, records: Arc<RecordStore>) -> Self {
        let delegate = Delegate::new(provider, records.clone(), records.clone());
        Self { records, delegate }
    }
}
