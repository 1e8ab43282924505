//! Has a revision been promoted into a state?
//!
//! Every promotion leaves a merge point on the destination timeline whose
//! last parent is the promoted source tip. Walking the destination's first
//! parents visits every merge point; walking each merge point's last
//! parents visits the chain of promotions that fed it.

use tracing::debug;
use vellum_store::ObjectStore;
use vellum_types::ObjectId;

use crate::codec::read_commit;
use crate::error::HistoryResult;

/// Returns `true` if `revision` was ever promoted into the timeline whose
/// tip is `tip`. A state that was never written (`tip == None`) answers
/// `false`.
pub fn has_been_promoted(
    store: &dyn ObjectStore,
    tip: Option<ObjectId>,
    revision: &ObjectId,
) -> HistoryResult<bool> {
    let mut outer = tip;
    while let Some(current) = outer {
        let commit = read_commit(store, &current)?;
        if promoted_through(store, commit.last_parent(), revision)? {
            debug!(
                revision = %revision.short_hex(),
                merge = %current.short_hex(),
                "found promotion"
            );
            return Ok(true);
        }
        outer = commit.first_parent();
    }
    Ok(false)
}

/// Follow last parents from `start`, stopping at the first linear commit.
fn promoted_through(
    store: &dyn ObjectStore,
    start: Option<ObjectId>,
    revision: &ObjectId,
) -> HistoryResult<bool> {
    let mut inner = start;
    while let Some(current) = inner {
        if current == *revision {
            return Ok(true);
        }
        let commit = read_commit(store, &current)?;
        if commit.parents.len() < 2 {
            break;
        }
        inner = commit.last_parent();
    }
    Ok(false)
}
