//! Leveling and XP ledger operations.
//!
//! Level math is pure and deterministic; grants append to the XP ledger and
//! then update the per-user points row, so the ledger sum always reconciles
//! with `UserPoints::total_xp`.

use chrono::NaiveDate;
use log::{debug, info};

use crate::progression::errors::ProgressionError;
use crate::progression::storage::ProgressionStore;
use crate::progression::types::{UserPoints, XpReason, XpSourceType, XpTransaction};

/// Level as a pure function of total XP: 100 XP per level, floor 1.
pub fn calculate_level(xp: i64) -> u32 {
    if xp <= 0 {
        1
    } else {
        (xp / 100) as u32 + 1
    }
}

/// Total XP at which `level + 1` is reached.
pub fn xp_for_next_level(level: u32) -> i64 {
    i64::from(level) * 100
}

/// Grant XP to a user: append a ledger entry, bump both XP totals, and
/// recompute the level. Rejects non-positive amounts synchronously; that
/// is an upstream programming error, not a store failure.
///
/// Returns the updated points row. A level increase is logged here; any
/// user-facing notification is an external collaborator's concern.
pub fn award_xp(
    store: &ProgressionStore,
    user_id: &str,
    amount: i64,
    reason: XpReason,
    source_type: Option<XpSourceType>,
    source_id: Option<String>,
) -> Result<UserPoints, ProgressionError> {
    if amount <= 0 {
        return Err(ProgressionError::InvalidXpAmount(amount));
    }

    let tx = XpTransaction::new(user_id, amount, reason, source_type, source_id);
    store.append_xp_transaction(&tx)?;

    let (before, after) = store.update_points(user_id, |points| {
        points.total_xp += amount;
        points.monthly_xp += amount;
        points.current_level = calculate_level(points.total_xp);
    })?;

    if after.current_level > before.current_level {
        info!(
            "user {} leveled up: {} -> {} ({} xp)",
            user_id, before.current_level, after.current_level, after.total_xp
        );
    }
    debug!("granted {} xp to {} ({})", amount, user_id, tx.id);

    Ok(after)
}

/// Fetch a user's points row, defaulting to a fresh level-1 row for users
/// the engine has not seen yet.
pub fn get_user_points(
    store: &ProgressionStore,
    user_id: &str,
) -> Result<UserPoints, ProgressionError> {
    Ok(store
        .get_points(user_id)?
        .unwrap_or_else(|| UserPoints::new(user_id)))
}

/// Zero monthly XP for every user with a non-zero monthly total. Invoked by
/// an external monthly scheduler; returns the number of affected users.
pub fn reset_monthly_xp(store: &ProgressionStore) -> Result<usize, ProgressionError> {
    let affected = store.reset_monthly_xp()?;
    info!("monthly xp reset for {} users", affected);
    Ok(affected)
}

/// Update the check-in streak for a verified check-in on `today` (the
/// user's local calendar date). Same-day repeats leave the streak alone; a
/// consecutive day extends it; a gap restarts it at 1.
pub fn record_check_in_streak(
    store: &ProgressionStore,
    user_id: &str,
    today: NaiveDate,
) -> Result<UserPoints, ProgressionError> {
    let (_, after) = store.update_points(user_id, |points| {
        match points.last_check_in_date {
            Some(last) if last == today => return,
            Some(last) if last.succ_opt() == Some(today) => {
                points.current_streak_days += 1;
            }
            _ => points.current_streak_days = 1,
        }
        points.longest_streak_days = points.longest_streak_days.max(points.current_streak_days);
        points.last_check_in_date = Some(today);
    })?;
    Ok(after)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::storage::ProgressionStoreBuilder;
    use tempfile::TempDir;

    fn setup_store() -> (TempDir, ProgressionStore) {
        let dir = TempDir::new().expect("tempdir");
        let store = ProgressionStoreBuilder::new(dir.path())
            .without_catalog_seed()
            .open()
            .expect("store");
        (dir, store)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn level_thresholds() {
        assert_eq!(calculate_level(0), 1);
        assert_eq!(calculate_level(-50), 1);
        assert_eq!(calculate_level(99), 1);
        assert_eq!(calculate_level(100), 2);
        assert_eq!(calculate_level(999), 10);
        assert_eq!(calculate_level(100_000), 1001);
    }

    #[test]
    fn next_level_xp() {
        assert_eq!(xp_for_next_level(1), 100);
        assert_eq!(xp_for_next_level(10), 1000);
    }

    #[test]
    fn award_xp_updates_totals_and_level() {
        let (_dir, store) = setup_store();
        let points = award_xp(&store, "alice", 150, XpReason::MissionReward, None, None)
            .expect("award");
        assert_eq!(points.total_xp, 150);
        assert_eq!(points.monthly_xp, 150);
        assert_eq!(points.current_level, 2);
    }

    #[test]
    fn award_xp_rejects_non_positive_amounts() {
        let (_dir, store) = setup_store();
        assert!(matches!(
            award_xp(&store, "alice", 0, XpReason::AdminBonus, None, None),
            Err(ProgressionError::InvalidXpAmount(0))
        ));
        assert!(matches!(
            award_xp(&store, "alice", -5, XpReason::AdminBonus, None, None),
            Err(ProgressionError::InvalidXpAmount(-5))
        ));
        // Nothing was written.
        assert!(store.get_points("alice").expect("get").is_none());
        assert!(store.list_xp_transactions("alice").expect("list").is_empty());
    }

    #[test]
    fn ledger_reconciles_with_total() {
        let (_dir, store) = setup_store();
        for amount in [10, 25, 40] {
            award_xp(&store, "alice", amount, XpReason::MissionReward, None, None)
                .expect("award");
        }
        let points = get_user_points(&store, "alice").expect("points");
        let ledger_sum: i64 = store
            .list_xp_transactions("alice")
            .expect("list")
            .iter()
            .map(|tx| tx.amount)
            .sum();
        assert_eq!(points.total_xp, 75);
        assert_eq!(ledger_sum, points.total_xp);
    }

    #[test]
    fn unknown_user_defaults_to_level_one() {
        let (_dir, store) = setup_store();
        let points = get_user_points(&store, "nobody").expect("points");
        assert_eq!(points.total_xp, 0);
        assert_eq!(points.current_level, 1);
    }

    #[test]
    fn monthly_reset_zeroes_only_monthly() {
        let (_dir, store) = setup_store();
        award_xp(&store, "alice", 120, XpReason::MissionReward, None, None).expect("award");
        award_xp(&store, "bob", 30, XpReason::MissionReward, None, None).expect("award");

        let affected = reset_monthly_xp(&store).expect("reset");
        assert_eq!(affected, 2);

        let alice = get_user_points(&store, "alice").expect("points");
        assert_eq!(alice.monthly_xp, 0);
        assert_eq!(alice.total_xp, 120);
        assert_eq!(alice.current_level, 2);

        // Second run touches nobody.
        assert_eq!(reset_monthly_xp(&store).expect("reset"), 0);
    }

    #[test]
    fn streaks_extend_and_reset() {
        let (_dir, store) = setup_store();

        let points =
            record_check_in_streak(&store, "alice", date(2024, 6, 10)).expect("streak");
        assert_eq!(points.current_streak_days, 1);

        // Same day again: unchanged.
        let points =
            record_check_in_streak(&store, "alice", date(2024, 6, 10)).expect("streak");
        assert_eq!(points.current_streak_days, 1);

        // Next day: extends.
        let points =
            record_check_in_streak(&store, "alice", date(2024, 6, 11)).expect("streak");
        assert_eq!(points.current_streak_days, 2);
        assert_eq!(points.longest_streak_days, 2);

        // Gap: restarts, longest preserved.
        let points =
            record_check_in_streak(&store, "alice", date(2024, 6, 14)).expect("streak");
        assert_eq!(points.current_streak_days, 1);
        assert_eq!(points.longest_streak_days, 2);
    }
}
