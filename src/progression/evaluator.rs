//! Requirement evaluation: resolves a mission's period window and computes
//! the qualifying count for the user's history as of now. The output is
//! never a delta; the progress store decides between an absolute set
//! (recomputed kinds) and a +1 increment (simple per-event kinds).

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveTime, Utc};

use crate::progression::errors::ProgressionError;
use crate::progression::storage::ProgressionStore;
use crate::progression::types::{MissionPeriod, MissionRecord, MissionRequirement};

/// The time range over which a requirement's qualifying count is computed.
/// `since: None` means all-time (narrative missions).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressWindow {
    pub since: Option<DateTime<Utc>>,
}

/// How a qualifying count should be applied to the progress row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressApply {
    /// Simple per-event kinds: add the delta.
    Increment(u32),
    /// Recomputed kinds: overwrite with the absolute count so replayed
    /// events cannot drift progress past the real qualifying total.
    SetAbsolute(u32),
}

/// Resolve the progress window for a mission period in the configured
/// timezone. Daily windows open at local midnight today; weekly windows at
/// local Monday 00:00 of the current week, with Sunday rolling back to the
/// previous Monday.
pub fn window_for(
    period: MissionPeriod,
    timezone: FixedOffset,
    now: DateTime<Utc>,
) -> ProgressWindow {
    let local = now.with_timezone(&timezone);
    let since_midnight = local.time().signed_duration_since(NaiveTime::MIN);
    match period {
        MissionPeriod::Daily => ProgressWindow {
            since: Some(now - since_midnight),
        },
        MissionPeriod::Weekly => {
            let days_back = i64::from(local.weekday().num_days_from_monday());
            ProgressWindow {
                since: Some(now - since_midnight - Duration::days(days_back)),
            }
        }
        MissionPeriod::Narrative => ProgressWindow { since: None },
    }
}

/// Compute the progress update for one mission against the user's current
/// history.
pub fn evaluate(
    store: &ProgressionStore,
    user_id: &str,
    mission: &MissionRecord,
    timezone: FixedOffset,
    now: DateTime<Utc>,
) -> Result<ProgressApply, ProgressionError> {
    use MissionRequirement::*;

    let window = window_for(mission.period, timezone, now);
    let apply = match &mission.requirement {
        CheckInCount { unique: false, .. } => ProgressApply::Increment(1),
        CheckInCount { unique: true, .. } => {
            ProgressApply::SetAbsolute(store.distinct_establishments(user_id, window.since)?)
        }
        CheckInZone { zone, .. } => {
            ProgressApply::SetAbsolute(store.count_check_ins_in_zone(user_id, zone, window.since)?)
        }
        CheckInAllZones { .. } => {
            ProgressApply::SetAbsolute(store.distinct_zones(user_id, window.since)?)
        }
        WriteReviews {
            min_length,
            with_photos,
            ..
        } => {
            if mission.requirement.is_recomputed() {
                ProgressApply::SetAbsolute(store.count_reviews(
                    user_id,
                    *min_length,
                    *with_photos,
                    window.since,
                )?)
            } else {
                ProgressApply::Increment(1)
            }
        }
        WriteQualityReview {
            min_length,
            with_photo,
            ..
        } => ProgressApply::SetAbsolute(store.count_reviews(
            user_id,
            Some(*min_length),
            *with_photo,
            window.since,
        )?),
        FollowUsers { .. } => {
            ProgressApply::SetAbsolute(store.following_count(user_id, window.since)?)
        }
        GainFollowers { .. } => {
            ProgressApply::SetAbsolute(store.follower_count(user_id, window.since)?)
        }
    };
    Ok(apply)
}

/// The user's local calendar date, used for streak bookkeeping.
pub fn local_date(timezone: FixedOffset, now: DateTime<Utc>) -> chrono::NaiveDate {
    now.with_timezone(&timezone).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::storage::ProgressionStoreBuilder;
    use crate::progression::types::CheckInRecord;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn daily_window_opens_at_local_midnight() {
        // UTC-03:00; 2024-06-12 01:30 UTC is still 2024-06-11 locally.
        let tz = FixedOffset::west_opt(3 * 3600).unwrap();
        let now = utc(2024, 6, 12, 1, 30);
        let window = window_for(MissionPeriod::Daily, tz, now);
        assert_eq!(window.since, Some(utc(2024, 6, 11, 3, 0)));
    }

    #[test]
    fn weekly_window_opens_on_monday() {
        let tz = FixedOffset::east_opt(0).unwrap();
        // 2024-06-13 is a Thursday; the week opened Monday 2024-06-10.
        let now = utc(2024, 6, 13, 15, 0);
        let window = window_for(MissionPeriod::Weekly, tz, now);
        assert_eq!(window.since, Some(utc(2024, 6, 10, 0, 0)));
    }

    #[test]
    fn sunday_rolls_back_to_previous_monday() {
        let tz = FixedOffset::east_opt(0).unwrap();
        // 2024-06-16 is a Sunday; the week still belongs to Monday 06-10.
        let now = utc(2024, 6, 16, 12, 0);
        let window = window_for(MissionPeriod::Weekly, tz, now);
        assert_eq!(window.since, Some(utc(2024, 6, 10, 0, 0)));
    }

    #[test]
    fn narrative_window_is_all_time() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let window = window_for(MissionPeriod::Narrative, tz, utc(2024, 6, 13, 9, 0));
        assert_eq!(window.since, None);
    }

    #[test]
    fn unique_check_ins_recompute_absolutely() {
        let dir = TempDir::new().expect("tempdir");
        let store = ProgressionStoreBuilder::new(dir.path())
            .without_catalog_seed()
            .open()
            .expect("store");
        let tz = FixedOffset::east_opt(0).unwrap();

        for establishment in ["e1", "e1", "e2"] {
            store
                .record_check_in(&CheckInRecord {
                    user_id: "alice".to_string(),
                    establishment_id: establishment.to_string(),
                    zone: "downtown".to_string(),
                    at: Utc::now(),
                })
                .expect("record");
        }

        let mission = MissionRecord::new(
            "unique_spots",
            "Explorer",
            "Visit distinct establishments",
            MissionPeriod::Narrative,
            MissionRequirement::CheckInCount {
                count: 5,
                unique: true,
            },
            25,
        );
        let apply = evaluate(&store, "alice", &mission, tz, Utc::now()).expect("evaluate");
        assert_eq!(apply, ProgressApply::SetAbsolute(2));
    }

    #[test]
    fn plain_check_in_count_increments() {
        let dir = TempDir::new().expect("tempdir");
        let store = ProgressionStoreBuilder::new(dir.path())
            .without_catalog_seed()
            .open()
            .expect("store");
        let tz = FixedOffset::east_opt(0).unwrap();
        let mission = MissionRecord::new(
            "daily_check_in",
            "Daily Visit",
            "Check in once today",
            MissionPeriod::Daily,
            MissionRequirement::CheckInCount {
                count: 1,
                unique: false,
            },
            10,
        );
        let apply = evaluate(&store, "alice", &mission, tz, Utc::now()).expect("evaluate");
        assert_eq!(apply, ProgressApply::Increment(1));
    }
}
