//! Mission completion handling: audit, reward issuance, and quest-chain
//! unlocking.
//!
//! Invoked only for the single caller that observed `just_completed`, so
//! rewards are granted at most once per (user, mission) crossing. Reward
//! issuance is a subsequent step after the atomic crossing: a crash in
//! between loses the reward rather than ever double-granting it.

use log::{debug, info, warn};

use crate::progression::errors::ProgressionError;
use crate::progression::leveling;
use crate::progression::storage::ProgressionStore;
use crate::progression::types::{CompletionAudit, MissionRecord, XpReason, XpSourceType};

/// Record the completion, grant rewards, and unlock the next quest step.
pub fn handle_completion(
    store: &ProgressionStore,
    user_id: &str,
    mission: &MissionRecord,
) -> Result<(), ProgressionError> {
    store.append_completion(&CompletionAudit::new(user_id, &mission.id))?;
    info!("user {} completed mission {}", user_id, mission.id);

    if mission.xp_reward > 0 {
        leveling::award_xp(
            store,
            user_id,
            i64::from(mission.xp_reward),
            XpReason::MissionReward,
            Some(XpSourceType::Mission),
            Some(mission.id.clone()),
        )?;
    }

    if let Some(badge_id) = &mission.badge_reward {
        award_reward_badge(store, user_id, badge_id);
    }

    if let Some(slot) = &mission.quest {
        unlock_next_step(store, user_id, &slot.quest_id, slot.step)?;
    }

    Ok(())
}

/// Badge rewards are best-effort: a catalog hole is a configuration error
/// that must not fail the completion, and a duplicate award is a no-op.
fn award_reward_badge(store: &ProgressionStore, user_id: &str, badge_id: &str) {
    match store.get_badge(badge_id) {
        Ok(_) => match store.award_badge(user_id, badge_id) {
            Ok(true) => info!("user {} earned badge {}", user_id, badge_id),
            Ok(false) => debug!("user {} already holds badge {}", user_id, badge_id),
            Err(err) => warn!("badge {} award failed for {}: {}", badge_id, user_id, err),
        },
        Err(err) => warn!(
            "mission badge reward {} is not in the catalog, skipping: {}",
            badge_id, err
        ),
    }
}

/// Lazily create the progress row for the chain's next step, if the chain
/// continues. Unlocking never clobbers an existing row, so re-invoking
/// completion handling cannot duplicate an unlock.
fn unlock_next_step(
    store: &ProgressionStore,
    user_id: &str,
    quest_id: &str,
    step: u32,
) -> Result<(), ProgressionError> {
    match store.find_quest_step(quest_id, step + 1)? {
        Some(next) => {
            let created = store.ensure_progress_row(user_id, &next.id)?;
            if created {
                info!(
                    "user {} unlocked quest {} step {} ({})",
                    user_id,
                    quest_id,
                    step + 1,
                    next.id
                );
            }
        }
        None => debug!("quest {} ends at step {}", quest_id, step),
    }
    Ok(())
}
