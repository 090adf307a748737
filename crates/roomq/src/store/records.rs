// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process record store with optional JSON persistence.

use std::path::PathBuf;

use parking_lot::RwLock;

use crate::store::persist::{self, PersistedRecords};
use crate::store::{
    CredentialStore, Principal, Room, RoomCreate, RoomDirectory, StoreError,
};

/// Principals and rooms behind one lock.
///
/// Every mutation is applied to a copy, written to disk, then swapped in, so
/// a failed save leaves memory and file in agreement.
pub struct RecordStore {
    records: RwLock<PersistedRecords>,
    path: Option<PathBuf>,
}

impl RecordStore {
    /// A store that never touches disk.
    pub fn in_memory() -> Self {
        Self { records: RwLock::new(PersistedRecords::default()), path: None }
    }

    /// Open the store at `path`, loading existing records if the file exists.
    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let records = if path.exists() { persist::load(&path)? } else { PersistedRecords::default() };
        tracing::info!(
            path = %path.display(),
            principals = records.principals.len(),
            rooms = records.rooms.len(),
            "records loaded"
        );
        Ok(Self { records: RwLock::new(records), path: Some(path) })
    }

    /// `(principals, rooms)` currently held.
    pub fn counts(&self) -> (usize, usize) {
        let records = self.records.read();
        (records.principals.len(), records.rooms.len())
    }

    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut PersistedRecords) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self.records.write();
        let mut next = guard.clone();
        let out = f(&mut next)?;
        if let Some(ref path) = self.path {
            if let Err(e) = persist::save(path, &next) {
                tracing::warn!(path = %path.display(), err = %e, "failed to persist records");
                return Err(StoreError::Persist(format!("{e:#}")));
            }
        }
        *guard = next;
        Ok(out)
    }
}

impl CredentialStore for RecordStore {
    fn find_principal(&self, id: &str) -> Result<Principal, StoreError> {
        self.records
            .read()
            .principals
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::PrincipalNotFound(id.to_owned()))
    }

    fn find_principal_by_access_token(&self, token: &str) -> Result<Principal, StoreError> {
        let not_found = || StoreError::PrincipalNotFound("<access token>".to_owned());
        if token.is_empty() {
            return Err(not_found());
        }
        self.records
            .read()
            .principals
            .values()
            .find(|p| p.access_token == token)
            .cloned()
            .ok_or_else(not_found)
    }

    fn upsert_principal(&self, principal: Principal) -> Result<(), StoreError> {
        self.mutate(|records| {
            records.principals.insert(principal.id.clone(), principal);
            Ok(())
        })
    }
}

impl RoomDirectory for RecordStore {
    fn find_room(&self, id: &str) -> Result<Room, StoreError> {
        self.records
            .read()
            .rooms
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::RoomNotFound(id.to_owned()))
    }

    fn create_room_if_absent(&self, id: &str, owner_id: &str) -> Result<RoomCreate, StoreError> {
        if let Some(existing) = self.records.read().rooms.get(id) {
            return Ok(RoomCreate::AlreadyExists(existing.clone()));
        }
        self.mutate(|records| {
            // Re-check under the write lock; another create may have won.
            if let Some(existing) = records.rooms.get(id) {
                return Ok(RoomCreate::AlreadyExists(existing.clone()));
            }
            let owner = records
                .principals
                .get_mut(owner_id)
                .ok_or_else(|| StoreError::PrincipalNotFound(owner_id.to_owned()))?;
            owner.room = Some(id.to_owned());
            let room =
                Room { id: id.to_owned(), owner: owner_id.to_owned(), members: vec![owner_id.to_owned()] };
            records.rooms.insert(id.to_owned(), room.clone());
            Ok(RoomCreate::Created(room))
        })
    }

    fn delete_room(&self, id: &str) -> Result<Room, StoreError> {
        self.mutate(|records| {
            let room = records.rooms.remove(id).ok_or_else(|| StoreError::RoomNotFound(id.to_owned()))?;
            for member in &room.members {
                if let Some(p) = records.principals.get_mut(member) {
                    if p.room.as_deref() == Some(id) {
                        p.room = None;
                    }
                }
            }
            Ok(room)
        })
    }

    fn resolve_owner(&self, room_id: &str) -> Result<Principal, StoreError> {
        let records = self.records.read();
        let room =
            records.rooms.get(room_id).ok_or_else(|| StoreError::RoomNotFound(room_id.to_owned()))?;
        records
            .principals
            .get(&room.owner)
            .cloned()
            .ok_or_else(|| StoreError::PrincipalNotFound(room.owner.clone()))
    }

    fn add_member(&self, room_id: &str, principal_id: &str) -> Result<Room, StoreError> {
        self.mutate(|records| {
            if !records.rooms.contains_key(room_id) {
                return Err(StoreError::RoomNotFound(room_id.to_owned()));
            }
            let principal = records
                .principals
                .get_mut(principal_id)
                .ok_or_else(|| StoreError::PrincipalNotFound(principal_id.to_owned()))?;
            principal.room = Some(room_id.to_owned());

            let room = records
                .rooms
                .get_mut(room_id)
                .ok_or_else(|| StoreError::RoomNotFound(room_id.to_owned()))?;
            if !room.members.iter().any(|m| m == principal_id) {
                room.members.push(principal_id.to_owned());
            }
            Ok(room.clone())
        })
    }
}

#[cfg(test)]
#[path = "records_tests.rs"]
mod tests;
