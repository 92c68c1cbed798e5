//! The shared user directory: records, indices and claims behind one handle.
//!
//! A `Directory` only exists once the dataset has been fully loaded and
//! indexed, so holding one is the startup barrier. Share it with
//! `Arc<Directory>`; every method takes `&self`.
//!
//! Locking:
//!
//! - records and indices sit behind one `RwLock`, so a create or update is
//!   observed all at once or not at all
//! - the claim set has its own lock and is never held while the records lock
//!   is being acquired
//! - allocation scans under the records read lock and checks claims per
//!   position, so a claim landing mid-scan just makes that position ineligible

use std::collections::BTreeMap;

use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::Serialize;
use tracing::info;

use crate::allocation::{self, AllocationView};
use crate::claims::ClaimTracker;
use crate::config::DirectoryConfig;
use crate::error::{DirectoryError, LoadError, Result};
use crate::index::{DirectoryIndex, Position, UniqueKey};
use crate::loader::load_users;
use crate::mutation::DirectoryState;
use crate::record::UserRecord;
use crate::segment::AgeBucket;

/// Point-in-time counts over the directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DirectoryStats {
    pub users: usize,
    pub selectable: usize,
    pub claimed: usize,
    pub identities: usize,
    pub by_primary_persona: BTreeMap<String, usize>,
    pub by_age_bucket: BTreeMap<String, usize>,
}

#[derive(Debug)]
pub struct Directory {
    state: RwLock<DirectoryState>,
    claims: ClaimTracker,
    draw_attempt_factor: usize,
    rng: Option<Mutex<StdRng>>,
}

impl Directory {
    /// Load the dataset named by `config` and index it.
    pub fn load(config: &DirectoryConfig) -> std::result::Result<Self, LoadError> {
        let records = load_users(&config.dataset_path)?;
        Self::from_records(records, config)
    }

    /// Index an already decoded record sequence.
    pub fn from_records(
        records: Vec<UserRecord>,
        config: &DirectoryConfig,
    ) -> std::result::Result<Self, LoadError> {
        let index = DirectoryIndex::build(&records).map_err(|(key, position)| {
            let record = &records[position];
            match key {
                UniqueKey::Id => LoadError::malformed(format!(
                    "duplicate id '{}' at position {position}",
                    record.id
                )),
                UniqueKey::Username => LoadError::malformed(format!(
                    "duplicate username '{}' at position {position}",
                    record.username
                )),
            }
        })?;

        let directory = Self {
            state: RwLock::new(DirectoryState { records, index }),
            claims: ClaimTracker::new(),
            draw_attempt_factor: config.draw_attempt_factor,
            rng: config.seed.map(|seed| Mutex::new(StdRng::seed_from_u64(seed))),
        };

        let stats = directory.stats();
        info!(
            users = stats.users,
            selectable = stats.selectable,
            personas = stats.by_primary_persona.len(),
            identities = stats.identities,
            "users loaded into memory structures"
        );
        Ok(directory)
    }

    pub fn len(&self) -> usize {
        self.state.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn find_by_id(&self, id: &str) -> Result<UserRecord> {
        let state = self.state.read();
        state
            .index
            .position_by_id(id)
            .map(|position| state.records[position].clone())
            .ok_or_else(|| DirectoryError::not_found(format!("id {id}")))
    }

    pub fn find_by_username(&self, username: &str) -> Result<UserRecord> {
        let state = self.state.read();
        state
            .index
            .position_by_username(username)
            .map(|position| state.records[position].clone())
            .ok_or_else(|| DirectoryError::not_found(format!("username {username}")))
    }

    pub fn find_by_identity_id(&self, identity_id: &str) -> Result<UserRecord> {
        let state = self.state.read();
        state
            .index
            .position_by_identity(identity_id)
            .map(|position| state.records[position].clone())
            .ok_or_else(|| DirectoryError::not_found(format!("identity id {identity_id}")))
    }

    /// Ids of every record in `bucket`, in directory order.
    pub fn find_ids_by_age_bucket(&self, bucket: AgeBucket) -> Vec<String> {
        let state = self.state.read();
        Self::ids_at(&state, state.index.positions_by_age_bucket(bucket))
    }

    /// Ids of every record whose primary persona is `primary`, in directory order.
    pub fn find_ids_by_primary_persona(&self, primary: &str) -> Vec<String> {
        let state = self.state.read();
        Self::ids_at(&state, state.index.positions_by_primary_persona(primary))
    }

    /// Sorted primary persona tokens present in the directory.
    pub fn primary_personas(&self) -> Vec<String> {
        let state = self.state.read();
        let mut personas: Vec<String> = state
            .index
            .primary_personas()
            .map(|(primary, _)| primary.to_string())
            .collect();
        personas.sort_unstable();
        personas
    }

    /// Up to `count` random unclaimed, selectable records matching both keys.
    pub fn allocate_by_persona_and_age(
        &self,
        primary: &str,
        bucket: AgeBucket,
        count: usize,
    ) -> Vec<UserRecord> {
        let state = self.state.read();
        let view = AllocationView::new(&state.records, &state.index, &self.claims);
        self.with_rng(|rng| {
            allocation::allocate_by_persona_and_age(&view, primary, bucket, count, rng)
        })
    }

    /// Exactly `count` random unclaimed, selectable records, or `Exhausted`.
    pub fn allocate_any(&self, count: usize) -> Result<Vec<UserRecord>> {
        let state = self.state.read();
        let view = AllocationView::new(&state.records, &state.index, &self.claims);
        self.with_rng(|rng| allocation::allocate_any(&view, count, self.draw_attempt_factor, rng))
    }

    /// Claim the record with `id`. `true` means this call made the claim;
    /// `false` means it was already claimed.
    pub fn claim(&self, id: &str) -> Result<bool> {
        let position = self.position_of(id)?;
        let claimed = self.claims.claim(position);
        if claimed {
            info!(id, position, "an identity has claimed the user");
        }
        Ok(claimed)
    }

    pub fn is_claimed(&self, id: &str) -> Result<bool> {
        let position = self.position_of(id)?;
        Ok(self.claims.is_claimed(position))
    }

    /// Append a new record, assigning a sequential id when `record.id` is
    /// empty. Conflicts on a taken username, id or identity id.
    pub fn create(&self, record: UserRecord) -> Result<UserRecord> {
        self.state.write().create(record)
    }

    /// Overwrite the mutable profile fields of an existing record.
    pub fn update(&self, record: &UserRecord) -> Result<UserRecord> {
        self.state.write().update(record)
    }

    pub fn stats(&self) -> DirectoryStats {
        let state = self.state.read();
        DirectoryStats {
            users: state.records.len(),
            selectable: state.records.iter().filter(|r| r.selectable_user).count(),
            claimed: self.claims.claimed_count(),
            identities: state.index.identity_count(),
            by_primary_persona: state
                .index
                .primary_personas()
                .map(|(primary, count)| (primary.to_string(), count))
                .collect(),
            by_age_bucket: state
                .index
                .age_buckets()
                .map(|(bucket, count)| (bucket.label().to_string(), count))
                .collect(),
        }
    }

    fn position_of(&self, id: &str) -> Result<Position> {
        self.state
            .read()
            .index
            .position_by_id(id)
            .ok_or_else(|| DirectoryError::not_found(format!("id {id}")))
    }

    fn ids_at(state: &DirectoryState, positions: &[Position]) -> Vec<String> {
        positions
            .iter()
            .map(|&position| state.records[position].id.clone())
            .collect()
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut dyn RngCore) -> T) -> T {
        match &self.rng {
            Some(rng) => f(&mut *rng.lock()),
            None => f(&mut rand::thread_rng()),
        }
    }
}
