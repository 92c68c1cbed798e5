use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, warn};

use super::AllocationView;
use crate::error::{DirectoryError, Result};
use crate::index::Position;
use crate::record::UserRecord;

/// Position 0 is a sentinel record and is never handed out.
pub const SENTINEL_POSITION: Position = 0;

/// Pick `count` distinct eligible records uniformly from the whole directory.
///
/// Runs at most `directory_len * draw_attempt_factor` random draws, then one
/// sweep over a shuffled permutation of the positions not yet picked. Fails
/// with [`DirectoryError::Exhausted`] only when fewer than `count` eligible
/// records exist, so callers never wait on a pool that cannot satisfy them.
pub fn allocate_any<R: Rng + ?Sized>(
    view: &AllocationView<'_>,
    count: usize,
    draw_attempt_factor: usize,
    rng: &mut R,
) -> Result<Vec<UserRecord>> {
    if count == 0 {
        return Ok(Vec::new());
    }

    let len = view.records.len();
    let candidates = len.saturating_sub(1);
    if count > candidates {
        let available = (1..len).filter(|&p| view.is_eligible(p)).count();
        return Err(exhausted(count, available));
    }

    let mut picked: Vec<Position> = Vec::with_capacity(count);
    let mut seen: HashSet<Position> = HashSet::with_capacity(count);

    if len > 1 {
        let max_draws = len.saturating_mul(draw_attempt_factor);
        let mut draws = 0;
        while picked.len() < count && draws < max_draws {
            draws += 1;
            let position = rng.gen_range(0..len);
            debug!(position, "random number selected");
            if position == SENTINEL_POSITION || seen.contains(&position) {
                continue;
            }
            if view.is_eligible(position) {
                debug!(position, "random user selected");
                seen.insert(position);
                picked.push(position);
            }
        }

        if picked.len() < count {
            debug!(
                draws,
                picked = picked.len(),
                "random draws exhausted, sweeping remaining positions"
            );
            let mut remaining: Vec<Position> = (1..len).filter(|p| !seen.contains(p)).collect();
            remaining.shuffle(rng);
            for position in remaining {
                if picked.len() >= count {
                    break;
                }
                if view.is_eligible(position) {
                    picked.push(position);
                }
            }
        }
    }

    if picked.len() < count {
        return Err(exhausted(count, picked.len()));
    }

    Ok(picked
        .into_iter()
        .map(|position| view.records[position].clone())
        .collect())
}

fn exhausted(requested: usize, available: usize) -> DirectoryError {
    warn!(requested, available, "not enough unclaimed selectable users");
    DirectoryError::Exhausted {
        requested,
        available,
    }
}
