use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use super::AllocationView;
use crate::index::intersect_sorted;
use crate::record::UserRecord;
use crate::segment::AgeBucket;

/// Pick up to `count` eligible records with primary persona `primary` and
/// age bucket `bucket`.
///
/// Candidates are the intersection of the two index lists, shuffled afresh on
/// every call and walked in that order. A short result means the matching
/// pool is smaller than `count`; it is not an error.
pub fn allocate_by_persona_and_age<R: Rng + ?Sized>(
    view: &AllocationView<'_>,
    primary: &str,
    bucket: AgeBucket,
    count: usize,
    rng: &mut R,
) -> Vec<UserRecord> {
    if count == 0 {
        return Vec::new();
    }

    let mut candidates = intersect_sorted(
        view.index.positions_by_primary_persona(primary),
        view.index.positions_by_age_bucket(bucket),
    );
    candidates.shuffle(rng);

    let mut selected = Vec::with_capacity(count.min(candidates.len()));
    for position in candidates {
        if selected.len() >= count {
            break;
        }
        if view.is_eligible(position) {
            debug!(position, primary, bucket = %bucket, "user found matching filter criteria");
            selected.push(view.records[position].clone());
        }
    }
    selected
}
