//! Badge evaluation, run on the same action events as missions but against
//! all-time history. Badges the user already owns are skipped; awards ride
//! on the (user, badge) uniqueness key, so duplicates are no-ops.

use log::{info, warn};

use crate::progression::errors::ProgressionError;
use crate::progression::storage::ProgressionStore;
use crate::progression::types::{ActionKind, BadgeRequirement};

/// Evaluate every relevant badge the user does not yet own, awarding those
/// whose requirement is met. A failing badge is skipped so the rest can
/// proceed. Returns the ids of newly awarded badges.
pub fn evaluate_badges(
    store: &ProgressionStore,
    user_id: &str,
    kind: ActionKind,
) -> Result<Vec<String>, ProgressionError> {
    let mut awarded = Vec::new();

    for badge in store.list_badges()? {
        if !badge.requirement.reacts_to(kind) {
            continue;
        }
        if store.has_badge(user_id, &badge.id)? {
            continue;
        }

        let current = match current_count(store, user_id, &badge.requirement) {
            Ok(Some(count)) => count,
            // Not derivable from action history: not met, never an error.
            Ok(None) => continue,
            Err(err) => {
                warn!("badge {} evaluation failed for {}: {}", badge.id, user_id, err);
                continue;
            }
        };

        if current >= badge.requirement.required() && store.award_badge(user_id, &badge.id)? {
            info!("user {} earned badge {}", user_id, badge.id);
            awarded.push(badge.id);
        }
    }

    Ok(awarded)
}

/// The user's current all-time count for a badge requirement kind, or
/// `None` when the kind cannot be computed from action history.
fn current_count(
    store: &ProgressionStore,
    user_id: &str,
    requirement: &BadgeRequirement,
) -> Result<Option<u32>, ProgressionError> {
    use BadgeRequirement::*;
    let count = match requirement {
        ReviewCount { .. } => store.count_reviews(user_id, None, false, None)?,
        CheckInCount { .. } => store.count_check_ins(user_id, None)?,
        UniqueEstablishments { .. } => store.distinct_establishments(user_id, None)?,
        UniqueZonesVisited { .. } => store.distinct_zones(user_id, None)?,
        FollowerCount { .. } => store.follower_count(user_id, None)?,
        PhotoCount { .. } => store.count_photos(user_id)?,
        HelpfulVotesReceived { .. } => store.count_votes_received(user_id, None)?,
        QualityReviews { min_length, .. } => {
            store.count_reviews(user_id, Some(*min_length), true, None)?
        }
        AccountAge { .. } => return Ok(None),
    };
    Ok(Some(count))
}
