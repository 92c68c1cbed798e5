//! Lookup indices over the record sequence.
//!
//! All maps store positions into the directory's record vector. Positions are
//! never reused or compacted, so the persona and age-bucket lists stay sorted
//! ascending as records are appended.

use std::collections::HashMap;

use tracing::warn;

use crate::record::UserRecord;
use crate::segment::AgeBucket;

/// Position of a record in the directory's record vector.
pub type Position = usize;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DirectoryIndex {
    by_id: HashMap<String, Position>,
    by_username: HashMap<String, Position>,
    by_identity: HashMap<String, Position>,
    by_primary_persona: HashMap<String, Vec<Position>>,
    by_age_bucket: HashMap<AgeBucket, Vec<Position>>,
}

/// Which unique key a record would collide on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueKey {
    Id,
    Username,
}

impl DirectoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every index in one pass over `records`.
    ///
    /// Returns the first duplicated id or username, since the directory
    /// cannot serve a catalog where those keys are ambiguous.
    pub fn build(records: &[UserRecord]) -> Result<Self, (UniqueKey, Position)> {
        let mut index = Self::new();
        for (position, record) in records.iter().enumerate() {
            if index.by_id.contains_key(&record.id) {
                return Err((UniqueKey::Id, position));
            }
            if index.by_username.contains_key(&record.username) {
                return Err((UniqueKey::Username, position));
            }
            index.insert(position, record);
        }
        Ok(index)
    }

    /// Index a record appended at `position`.
    ///
    /// The caller guarantees `id` and `username` are free. An identity id that
    /// is already bound elsewhere is not rebound.
    pub fn insert(&mut self, position: Position, record: &UserRecord) {
        self.by_id.insert(record.id.clone(), position);
        self.by_username.insert(record.username.clone(), position);

        if let Some(identity_id) = &record.identity_id {
            match self.by_identity.get(identity_id) {
                Some(&bound) if bound != position => {
                    warn!(
                        identity_id = %identity_id,
                        bound_position = bound,
                        skipped_position = position,
                        "identity id already bound, not indexing duplicate"
                    );
                }
                _ => {
                    self.by_identity.insert(identity_id.clone(), position);
                }
            }
        }

        self.by_primary_persona
            .entry(record.primary_persona().to_string())
            .or_default()
            .push(position);

        if let Some(bucket) = record.age_bucket() {
            self.by_age_bucket.entry(bucket).or_default().push(position);
        }
    }

    /// Move the identity binding of `position` from `old` to `new`.
    ///
    /// The stale entry is only removed if it still points at `position`.
    pub fn rebind_identity(&mut self, position: Position, old: Option<&str>, new: Option<&str>) {
        if old == new {
            return;
        }
        if let Some(old) = old {
            if self.by_identity.get(old) == Some(&position) {
                self.by_identity.remove(old);
            }
        }
        if let Some(new) = new {
            self.by_identity.insert(new.to_string(), position);
        }
    }

    pub fn position_by_id(&self, id: &str) -> Option<Position> {
        self.by_id.get(id).copied()
    }

    pub fn position_by_username(&self, username: &str) -> Option<Position> {
        self.by_username.get(username).copied()
    }

    pub fn position_by_identity(&self, identity_id: &str) -> Option<Position> {
        self.by_identity.get(identity_id).copied()
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn contains_username(&self, username: &str) -> bool {
        self.by_username.contains_key(username)
    }

    /// Positions whose primary persona is `primary`, ascending.
    pub fn positions_by_primary_persona(&self, primary: &str) -> &[Position] {
        self.by_primary_persona
            .get(primary)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Positions whose age falls in `bucket`, ascending.
    pub fn positions_by_age_bucket(&self, bucket: AgeBucket) -> &[Position] {
        self.by_age_bucket
            .get(&bucket)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn primary_personas(&self) -> impl Iterator<Item = (&str, usize)> {
        self.by_primary_persona
            .iter()
            .map(|(primary, positions)| (primary.as_str(), positions.len()))
    }

    pub fn age_buckets(&self) -> impl Iterator<Item = (AgeBucket, usize)> + '_ {
        self.by_age_bucket
            .iter()
            .map(|(bucket, positions)| (*bucket, positions.len()))
    }

    pub fn identity_count(&self) -> usize {
        self.by_identity.len()
    }
}

/// Intersect two ascending position lists.
pub fn intersect_sorted(a: &[Position], b: &[Position]) -> Vec<Position> {
    let mut result = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                result.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<UserRecord> {
        vec![
            UserRecord::new("sentinel", "system", 40).with_id("0"),
            UserRecord::new("ana", "apparel_footwear", 23)
                .with_id("1")
                .with_identity_id("idp-1"),
            UserRecord::new("ben", "apparel_housewares", 16).with_id("2"),
            UserRecord::new("cai", "books", 61).with_id("3"),
        ]
    }

    #[test]
    fn build_indexes_every_record_by_id_and_username() {
        let records = records();
        let index = DirectoryIndex::build(&records).expect("index should build");

        for (position, record) in records.iter().enumerate() {
            assert_eq!(index.position_by_id(&record.id), Some(position));
            assert_eq!(index.position_by_username(&record.username), Some(position));
        }
        assert_eq!(index.position_by_identity("idp-1"), Some(1));
        assert_eq!(index.identity_count(), 1);
    }

    #[test]
    fn build_derives_persona_and_age_bucket_lists() {
        let index = DirectoryIndex::build(&records()).expect("index should build");

        assert_eq!(index.positions_by_primary_persona("apparel"), &[1, 2]);
        assert_eq!(index.positions_by_primary_persona("books"), &[3]);
        assert!(index.positions_by_primary_persona("tools").is_empty());
        assert_eq!(index.positions_by_age_bucket(AgeBucket::From18To24), &[1]);
        assert_eq!(index.positions_by_age_bucket(AgeBucket::From55To69), &[3]);
        // Under-18 records are only absent from the age index.
        let bucketed: usize = index.age_buckets().map(|(_, count)| count).sum();
        assert_eq!(bucketed, 3);
        assert_eq!(index.position_by_username("ben"), Some(2));
    }

    #[test]
    fn build_rejects_duplicate_usernames() {
        let mut records = records();
        records.push(UserRecord::new("ana", "books", 30).with_id("4"));

        assert_eq!(
            DirectoryIndex::build(&records),
            Err((UniqueKey::Username, 4))
        );
    }

    #[test]
    fn duplicate_identity_keeps_first_binding() {
        let mut records = records();
        records.push(
            UserRecord::new("dee", "books", 30)
                .with_id("4")
                .with_identity_id("idp-1"),
        );
        let index = DirectoryIndex::build(&records).expect("index should build");
        assert_eq!(index.position_by_identity("idp-1"), Some(1));
    }

    #[test]
    fn rebind_identity_removes_only_own_stale_entry() {
        let mut index = DirectoryIndex::build(&records()).expect("index should build");

        index.rebind_identity(1, Some("idp-1"), Some("idp-2"));
        assert_eq!(index.position_by_identity("idp-1"), None);
        assert_eq!(index.position_by_identity("idp-2"), Some(1));

        // Position 3 never owned idp-2, so its stale value must not unbind it.
        index.rebind_identity(3, Some("idp-2"), None);
        assert_eq!(index.position_by_identity("idp-2"), Some(1));
    }

    #[test]
    fn intersect_sorted_keeps_common_positions() {
        assert_eq!(intersect_sorted(&[1, 3, 5, 7], &[2, 3, 4, 7, 9]), vec![3, 7]);
        assert!(intersect_sorted(&[], &[1, 2]).is_empty());
    }
}
