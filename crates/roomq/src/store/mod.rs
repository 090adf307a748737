// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Principal and room records.
//!
//! The delegation layer only sees the two contracts below. [`records::RecordStore`]
//! implements both over one lock so a room's owner reference and the owner's
//! current-room field move together.

pub mod persist;
pub mod records;

use serde::{Deserialize, Serialize};

use crate::oauth::TokenPair;

/// An authenticated user holding the provider-issued token pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Provider-assigned, stable user id.
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
    /// Room this principal most recently created or joined.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
}

impl Principal {
    /// Borrowed snapshot of the current token pair for a single call.
    pub fn tokens(&self) -> TokenPair {
        TokenPair {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
        }
    }
}

/// A named session with one owner and the members acting on its behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub owner: String,
    /// Member principal ids, owner first, no duplicates.
    #[serde(default)]
    pub members: Vec<String>,
}

/// Outcome of [`RoomDirectory::create_room_if_absent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomCreate {
    Created(Room),
    /// The id was taken; carries the existing room untouched.
    AlreadyExists(Room),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("room not found: {0}")]
    RoomNotFound(String),
    #[error("principal not found: {0}")]
    PrincipalNotFound(String),
    #[error("failed to persist records: {0}")]
    Persist(String),
}

/// Durable principal → token pair mapping.
pub trait CredentialStore: Send + Sync {
    fn find_principal(&self, id: &str) -> Result<Principal, StoreError>;

    /// Find the principal whose stored access token is exactly `token`.
    fn find_principal_by_access_token(&self, token: &str) -> Result<Principal, StoreError>;

    /// Create or replace by id. Last write wins.
    fn upsert_principal(&self, principal: Principal) -> Result<(), StoreError>;
}

/// Durable room → owner/members mapping.
pub trait RoomDirectory: Send + Sync {
    fn find_room(&self, id: &str) -> Result<Room, StoreError>;

    /// Create a room owned by `owner_id` unless `id` is already taken.
    ///
    /// The owner must be a known principal. An existing room keeps its owner
    /// even when a different `owner_id` is supplied.
    fn create_room_if_absent(&self, id: &str, owner_id: &str) -> Result<RoomCreate, StoreError>;

    /// Remove a room, returning the removed record.
    fn delete_room(&self, id: &str) -> Result<Room, StoreError>;

    /// Expand a room to its owning principal.
    fn resolve_owner(&self, room_id: &str) -> Result<Principal, StoreError>;

    /// Add a member to a room (idempotent) and record it as their current room.
    fn add_member(&self, room_id: &str, principal_id: &str) -> Result<Room, StoreError>;
}
