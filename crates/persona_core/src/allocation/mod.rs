//! Random selection of unclaimed, selectable records.
//!
//! Allocation never claims: callers decide which of the returned records to
//! claim through [`crate::directory::Directory::claim`].

pub mod random;
pub mod targeted;

pub use random::allocate_any;
pub use targeted::allocate_by_persona_and_age;

use crate::claims::ClaimTracker;
use crate::index::{DirectoryIndex, Position};
use crate::record::UserRecord;

/// Read-only view over directory state that allocators scan.
#[derive(Debug, Clone, Copy)]
pub struct AllocationView<'a> {
    pub records: &'a [UserRecord],
    pub index: &'a DirectoryIndex,
    pub claims: &'a ClaimTracker,
}

impl<'a> AllocationView<'a> {
    pub fn new(
        records: &'a [UserRecord],
        index: &'a DirectoryIndex,
        claims: &'a ClaimTracker,
    ) -> Self {
        Self {
            records,
            index,
            claims,
        }
    }

    /// Selectable and not claimed at the moment of the check.
    pub fn is_eligible(&self, position: Position) -> bool {
        self.records
            .get(position)
            .is_some_and(|record| record.selectable_user)
            && !self.claims.is_claimed(position)
    }
}
