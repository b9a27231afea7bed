//! Periodic reset jobs for daily and weekly missions.
//!
//! The scheduler runs off system-clock checks rather than an OS cron: the
//! host calls `check_and_reset` periodically (or lets `run_reset_loop`
//! drive it), and the daily/weekly jobs fire when the local calendar
//! boundary rolls over. Boundaries are computed in an explicitly injected
//! timezone. Both jobs are destructive bulk writes, so overlapping runs of
//! the same job are skipped via an in-flight guard.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};
use log::{info, warn};

use crate::progression::storage::ProgressionStore;
use crate::progression::types::MissionPeriod;

/// What a `check_and_reset` call actually did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResetOutcome {
    /// Rows cleared by the daily job, if it fired.
    pub daily_rows: Option<usize>,
    /// Rows cleared by the weekly job, if it fired.
    pub weekly_rows: Option<usize>,
}

/// Tracks reset boundaries and guards the bulk reset jobs.
pub struct ResetScheduler {
    timezone: FixedOffset,
    daily_in_flight: AtomicBool,
    weekly_in_flight: AtomicBool,
    last_daily_date: Mutex<Option<NaiveDate>>,
    last_week_start: Mutex<Option<NaiveDate>>,
}

impl ResetScheduler {
    pub fn new(timezone: FixedOffset) -> Self {
        Self {
            timezone,
            daily_in_flight: AtomicBool::new(false),
            weekly_in_flight: AtomicBool::new(false),
            last_daily_date: Mutex::new(None),
            last_week_start: Mutex::new(None),
        }
    }

    /// Zero progress and completion on every `daily` mission row. Weekly
    /// and narrative rows are untouched.
    pub fn reset_daily_missions(&self, store: &ProgressionStore) -> Result<usize> {
        self.run_guarded(store, MissionPeriod::Daily, &self.daily_in_flight, "daily")
    }

    /// Same as `reset_daily_missions`, scoped to `weekly` missions only.
    pub fn reset_weekly_missions(&self, store: &ProgressionStore) -> Result<usize> {
        self.run_guarded(store, MissionPeriod::Weekly, &self.weekly_in_flight, "weekly")
    }

    fn run_guarded(
        &self,
        store: &ProgressionStore,
        period: MissionPeriod,
        guard: &AtomicBool,
        label: &str,
    ) -> Result<usize> {
        if guard
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("{} mission reset already in flight, skipping", label);
            return Ok(0);
        }
        let result = Self::reset_period(store, period, label);
        guard.store(false, Ordering::SeqCst);
        result
    }

    fn reset_period(
        store: &ProgressionStore,
        period: MissionPeriod,
        label: &str,
    ) -> Result<usize> {
        let ids: HashSet<String> = store
            .list_missions()?
            .into_iter()
            .filter(|mission| mission.period == period)
            .map(|mission| mission.id)
            .collect();
        let rows = store.reset_progress(&ids)?;
        info!("{} mission reset cleared {} progress rows", label, rows);
        Ok(rows)
    }

    /// Fire whichever jobs have crossed their local boundary since the last
    /// call: the daily job on a new local date, the weekly job on a new
    /// local week (Monday 00:00). The first call only records the current
    /// boundaries, so a mid-day restart does not wipe live progress.
    pub fn check_and_reset(
        &self,
        store: &ProgressionStore,
        now: DateTime<Utc>,
    ) -> Result<ResetOutcome> {
        let local_date = now.with_timezone(&self.timezone).date_naive();
        let week_start = local_date
            - chrono::Duration::days(i64::from(local_date.weekday().num_days_from_monday()));
        let mut outcome = ResetOutcome::default();

        {
            let mut last = self
                .last_daily_date
                .lock()
                .map_err(|_| anyhow!("daily reset state poisoned"))?;
            match *last {
                None => *last = Some(local_date),
                Some(seen) if seen < local_date => {
                    *last = Some(local_date);
                    drop(last);
                    outcome.daily_rows = Some(self.reset_daily_missions(store)?);
                }
                Some(_) => {}
            }
        }

        {
            let mut last = self
                .last_week_start
                .lock()
                .map_err(|_| anyhow!("weekly reset state poisoned"))?;
            match *last {
                None => *last = Some(week_start),
                Some(seen) if seen < week_start => {
                    *last = Some(week_start);
                    drop(last);
                    outcome.weekly_rows = Some(self.reset_weekly_missions(store)?);
                }
                Some(_) => {}
            }
        }

        Ok(outcome)
    }

    /// Drive `check_and_reset` from a tokio interval. Intended to be
    /// spawned by the host; failures are logged and the loop keeps going.
    pub async fn run_reset_loop(&self, store: &ProgressionStore, tick: Duration) {
        let mut interval = tokio::time::interval(tick);
        loop {
            interval.tick().await;
            if let Err(err) = self.check_and_reset(store, Utc::now()) {
                warn!("scheduled mission reset failed: {}", err);
            }
        }
    }
}
