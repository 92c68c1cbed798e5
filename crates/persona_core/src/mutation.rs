//! Create and update paths. Every index change made after startup goes
//! through here, applied while the caller holds the directory write lock.

use tracing::info;

use crate::error::{DirectoryError, Result};
use crate::index::{DirectoryIndex, Position};
use crate::record::UserRecord;

/// Records plus their indices; always mutated together.
#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct DirectoryState {
    pub(crate) records: Vec<UserRecord>,
    pub(crate) index: DirectoryIndex,
}

impl DirectoryState {
    /// Append a new record and index it.
    ///
    /// All uniqueness checks run before anything is written, so a conflict
    /// leaves the state untouched.
    pub(crate) fn create(&mut self, mut record: UserRecord) -> Result<UserRecord> {
        if self.index.contains_username(&record.username) {
            return Err(DirectoryError::conflict(format!(
                "user with username '{}' already exists",
                record.username
            )));
        }

        let position = self.records.len();
        if record.id.is_empty() {
            record.id = self.next_free_id(position);
        } else if self.index.contains_id(&record.id) {
            return Err(DirectoryError::conflict(format!(
                "user with id '{}' already exists",
                record.id
            )));
        }

        if let Some(identity_id) = &record.identity_id {
            if self.index.position_by_identity(identity_id).is_some() {
                return Err(DirectoryError::conflict(format!(
                    "identity id '{identity_id}' is already bound to another user"
                )));
            }
        }

        self.index.insert(position, &record);
        self.records.push(record.clone());
        info!(id = %record.id, position, "user created");
        Ok(record)
    }

    /// Overwrite the mutable profile of the record with `incoming.id`.
    pub(crate) fn update(&mut self, incoming: &UserRecord) -> Result<UserRecord> {
        let position = self
            .index
            .position_by_id(&incoming.id)
            .ok_or_else(|| DirectoryError::not_found(format!("id {}", incoming.id)))?;

        if let Some(identity_id) = &incoming.identity_id {
            match self.index.position_by_identity(identity_id) {
                Some(bound) if bound != position => {
                    return Err(DirectoryError::conflict(format!(
                        "identity id '{identity_id}' is already bound to another user"
                    )));
                }
                _ => {}
            }
        }

        let record = &mut self.records[position];
        let previous_identity = record.identity_id.take();
        record.overwrite_profile(incoming);
        self.index.rebind_identity(
            position,
            previous_identity.as_deref(),
            record.identity_id.as_deref(),
        );

        Ok(record.clone())
    }

    /// Sequential id for a record appended at `position`, skipping ids the
    /// dataset already uses.
    fn next_free_id(&self, position: Position) -> String {
        let mut candidate = position;
        loop {
            let id = candidate.to_string();
            if !self.index.contains_id(&id) {
                return id;
            }
            candidate += 1;
        }
    }
}
