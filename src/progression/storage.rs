use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use sled::IVec;

use crate::progression::errors::ProgressionError;
use crate::progression::seed::{seed_starter_badges, seed_starter_missions};
use crate::progression::types::{
    BadgeRecord, CheckInRecord, CompletionAudit, FollowEdge, MissionProgress, MissionRecord,
    PhotoRecord, ProgressUpdate, ReviewRecord, UserBadge, UserPoints, VoteReceivedRecord,
    XpTransaction, BADGE_SCHEMA_VERSION, MISSION_SCHEMA_VERSION, POINTS_SCHEMA_VERSION,
    PROGRESS_SCHEMA_VERSION,
};

const TREE_CATALOG: &str = "progression_catalog";
const TREE_PROGRESS: &str = "progression_progress";
const TREE_LEDGER: &str = "progression_ledger";
const TREE_AWARDS: &str = "progression_awards";
const TREE_HISTORY: &str = "progression_history";
const TREE_AUDIT: &str = "progression_audit";

fn next_timestamp_nanos() -> i64 {
    let now = Utc::now();
    now.timestamp_nanos_opt()
        .unwrap_or_else(|| now.timestamp_micros() * 1000)
}

/// Helper builder so tests can easily create throwaway stores with custom
/// paths, optionally skipping the starter catalog.
pub struct ProgressionStoreBuilder {
    path: PathBuf,
    ensure_catalog_seed: bool,
}

impl ProgressionStoreBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ensure_catalog_seed: true,
        }
    }

    /// Opt out of seeding the starter mission/badge catalog during
    /// initialization (useful for targeted tests).
    pub fn without_catalog_seed(mut self) -> Self {
        self.ensure_catalog_seed = false;
        self
    }

    pub fn open(self) -> Result<ProgressionStore, ProgressionError> {
        ProgressionStore::open_with_options(self.path, self.ensure_catalog_seed)
    }
}

/// Sled-backed persistence for mission/badge catalogs, per-user progress,
/// the XP ledger, and the action history that backs recompute evaluation.
pub struct ProgressionStore {
    _db: sled::Db,
    catalog: sled::Tree,
    progress: sled::Tree,
    ledger: sled::Tree,
    awards: sled::Tree,
    history: sled::Tree,
    audit: sled::Tree,
}

impl ProgressionStore {
    /// Open (or create) the progression store rooted at `path`. The starter
    /// mission/badge catalog is inserted when no missions exist yet.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ProgressionError> {
        Self::open_with_options(path, true)
    }

    fn open_with_options<P: AsRef<Path>>(
        path: P,
        seed_catalog: bool,
    ) -> Result<Self, ProgressionError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::open(path_ref)?;
        let catalog = db.open_tree(TREE_CATALOG)?;
        let progress = db.open_tree(TREE_PROGRESS)?;
        let ledger = db.open_tree(TREE_LEDGER)?;
        let awards = db.open_tree(TREE_AWARDS)?;
        let history = db.open_tree(TREE_HISTORY)?;
        let audit = db.open_tree(TREE_AUDIT)?;
        let store = Self {
            _db: db,
            catalog,
            progress,
            ledger,
            awards,
            history,
            audit,
        };

        if seed_catalog {
            store.seed_catalog_if_needed()?;
        }

        Ok(store)
    }

    fn mission_key(mission_id: &str) -> Vec<u8> {
        format!("missions:{}", mission_id).into_bytes()
    }

    fn badge_key(badge_id: &str) -> Vec<u8> {
        format!("badges:{}", badge_id).into_bytes()
    }

    fn points_key(user_id: &str) -> Vec<u8> {
        format!("points:{}", user_id).into_bytes()
    }

    fn progress_key(user_id: &str, mission_id: &str) -> Vec<u8> {
        format!("progress:{}:{}", user_id, mission_id).into_bytes()
    }

    fn award_key(user_id: &str, badge_id: &str) -> Vec<u8> {
        format!("earned:{}:{}", user_id, badge_id).into_bytes()
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, ProgressionError> {
        Ok(bincode::serialize(value)?)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(bytes: IVec) -> Result<T, ProgressionError> {
        Ok(bincode::deserialize::<T>(&bytes)?)
    }

    // ========================================================================
    // Mission & Badge Catalog
    // ========================================================================

    /// Insert or update a mission definition.
    pub fn put_mission(&self, mut mission: MissionRecord) -> Result<(), ProgressionError> {
        mission.schema_version = MISSION_SCHEMA_VERSION;
        let key = Self::mission_key(&mission.id);
        let bytes = Self::serialize(&mission)?;
        self.catalog.insert(key, bytes)?;
        self.catalog.flush()?;
        Ok(())
    }

    /// Fetch a mission definition by id.
    pub fn get_mission(&self, mission_id: &str) -> Result<MissionRecord, ProgressionError> {
        let key = Self::mission_key(mission_id);
        let Some(bytes) = self.catalog.get(&key)? else {
            return Err(ProgressionError::NotFound(format!("mission: {}", mission_id)));
        };
        let record: MissionRecord = Self::deserialize(bytes)?;
        if record.schema_version != MISSION_SCHEMA_VERSION {
            return Err(ProgressionError::SchemaMismatch {
                entity: "mission",
                expected: MISSION_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        Ok(record)
    }

    /// All active missions, across every period. Narrative missions are
    /// always current; period windows are the evaluator's concern.
    pub fn list_active_missions(&self) -> Result<Vec<MissionRecord>, ProgressionError> {
        let mut missions = Vec::new();
        for entry in self.catalog.scan_prefix(b"missions:") {
            let (_, value) = entry?;
            let record: MissionRecord = Self::deserialize(value)?;
            if record.is_active {
                missions.push(record);
            }
        }
        Ok(missions)
    }

    /// Every mission definition, active or not. Reset jobs use this so
    /// rows of deactivated periodic missions are still cleared.
    pub fn list_missions(&self) -> Result<Vec<MissionRecord>, ProgressionError> {
        let mut missions = Vec::new();
        for entry in self.catalog.scan_prefix(b"missions:") {
            let (_, value) = entry?;
            missions.push(Self::deserialize(value)?);
        }
        Ok(missions)
    }

    /// Locate the active mission occupying `step` of a quest chain.
    pub fn find_quest_step(
        &self,
        quest_id: &str,
        step: u32,
    ) -> Result<Option<MissionRecord>, ProgressionError> {
        for mission in self.list_active_missions()? {
            if let Some(slot) = &mission.quest {
                if slot.quest_id == quest_id && slot.step == step {
                    return Ok(Some(mission));
                }
            }
        }
        Ok(None)
    }

    pub fn put_badge(&self, mut badge: BadgeRecord) -> Result<(), ProgressionError> {
        badge.schema_version = BADGE_SCHEMA_VERSION;
        let key = Self::badge_key(&badge.id);
        let bytes = Self::serialize(&badge)?;
        self.catalog.insert(key, bytes)?;
        self.catalog.flush()?;
        Ok(())
    }

    pub fn get_badge(&self, badge_id: &str) -> Result<BadgeRecord, ProgressionError> {
        let key = Self::badge_key(badge_id);
        let Some(bytes) = self.catalog.get(&key)? else {
            return Err(ProgressionError::NotFound(format!("badge: {}", badge_id)));
        };
        let record: BadgeRecord = Self::deserialize(bytes)?;
        if record.schema_version != BADGE_SCHEMA_VERSION {
            return Err(ProgressionError::SchemaMismatch {
                entity: "badge",
                expected: BADGE_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        Ok(record)
    }

    pub fn list_badges(&self) -> Result<Vec<BadgeRecord>, ProgressionError> {
        let mut badges = Vec::new();
        for entry in self.catalog.scan_prefix(b"badges:") {
            let (_, value) = entry?;
            badges.push(Self::deserialize(value)?);
        }
        Ok(badges)
    }

    /// Insert the starter catalog when no missions exist yet.
    pub fn seed_catalog_if_needed(&self) -> Result<usize, ProgressionError> {
        if self.catalog.scan_prefix(b"missions:").next().is_some() {
            return Ok(0);
        }
        let mut inserted = 0usize;
        for mission in seed_starter_missions() {
            self.put_mission(mission)?;
            inserted += 1;
        }
        for badge in seed_starter_badges() {
            self.put_badge(badge)?;
            inserted += 1;
        }
        Ok(inserted)
    }

    // ========================================================================
    // Progress Rows / Atomic Counter
    // ========================================================================

    /// Fetch a user's progress row for a mission, if one exists yet.
    pub fn get_progress(
        &self,
        user_id: &str,
        mission_id: &str,
    ) -> Result<Option<MissionProgress>, ProgressionError> {
        let key = Self::progress_key(user_id, mission_id);
        let Some(bytes) = self.progress.get(&key)? else {
            return Ok(None);
        };
        let record: MissionProgress = Self::deserialize(bytes)?;
        if record.schema_version != PROGRESS_SCHEMA_VERSION {
            return Err(ProgressionError::SchemaMismatch {
                entity: "progress",
                expected: PROGRESS_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        Ok(Some(record))
    }

    /// Lazily create a zeroed progress row. Returns true when the row was
    /// created by this call, false when one already existed (quest unlocks
    /// must never clobber progress that is already accumulating).
    pub fn ensure_progress_row(
        &self,
        user_id: &str,
        mission_id: &str,
    ) -> Result<bool, ProgressionError> {
        let key = Self::progress_key(user_id, mission_id);
        let row = MissionProgress::new(user_id, mission_id);
        let bytes = Self::serialize(&row)?;
        let created = self
            .progress
            .compare_and_swap(&key, None as Option<&[u8]>, Some(bytes))?
            .is_ok();
        if created {
            self.progress.flush()?;
        }
        Ok(created)
    }

    /// Atomically add `delta` to a user's progress and report whether this
    /// call crossed the completion threshold. Exactly one caller observes
    /// `just_completed` per crossing, even under concurrent events.
    pub fn increment_and_check(
        &self,
        user_id: &str,
        mission: &MissionRecord,
        delta: u32,
    ) -> Result<ProgressUpdate, ProgressionError> {
        self.apply_progress(user_id, mission, |current| {
            current.saturating_add(delta)
        })
    }

    /// Atomically overwrite a user's progress with a recomputed absolute
    /// count. Same completion semantics as `increment_and_check`.
    pub fn set_absolute(
        &self,
        user_id: &str,
        mission: &MissionRecord,
        value: u32,
    ) -> Result<ProgressUpdate, ProgressionError> {
        self.apply_progress(user_id, mission, |_| value)
    }

    /// Optimistic-concurrency loop over the serialized progress row. The
    /// completed flag flips at most once, and `just_completed` is only
    /// reported for the update that caused the crossing. Progress on a
    /// completed row never decreases and never re-fires rewards, but late
    /// concurrent increments still land.
    fn apply_progress<F>(
        &self,
        user_id: &str,
        mission: &MissionRecord,
        next_value: F,
    ) -> Result<ProgressUpdate, ProgressionError>
    where
        F: Fn(u32) -> u32,
    {
        let key = Self::progress_key(user_id, &mission.id);
        let target = mission.requirement.target();
        loop {
            let current = self.progress.get(&key)?;
            let row: MissionProgress = match &current {
                Some(bytes) => Self::deserialize(bytes.clone())?,
                None => MissionProgress::new(user_id, &mission.id),
            };

            let mut next = row.clone();
            next.progress = if row.completed {
                next_value(row.progress).max(row.progress)
            } else {
                next_value(row.progress)
            };
            let crossed = !row.completed && next.progress >= target;
            if crossed {
                next.completed = true;
                next.completed_at = Some(Utc::now());
            }

            // Nothing to write (e.g. a stale recompute on a completed row).
            if current.is_some() && next.progress == row.progress && !crossed {
                return Ok(ProgressUpdate {
                    progress: row.progress,
                    just_completed: false,
                });
            }
            next.updated_at = Utc::now();

            let bytes = Self::serialize(&next)?;
            match self.progress.compare_and_swap(&key, current, Some(bytes))? {
                Ok(()) => {
                    self.progress.flush()?;
                    return Ok(ProgressUpdate {
                        progress: next.progress,
                        just_completed: crossed,
                    });
                }
                // Raced with a concurrent update; re-read and retry.
                Err(_) => continue,
            }
        }
    }

    /// Zero progress and clear completion on every row belonging to one of
    /// `mission_ids`. Single-writer bulk operation used by the reset jobs;
    /// returns the number of rows reset.
    pub fn reset_progress(
        &self,
        mission_ids: &HashSet<String>,
    ) -> Result<usize, ProgressionError> {
        let mut reset = 0usize;
        for entry in self.progress.scan_prefix(b"progress:") {
            let (key, value) = entry?;
            let row: MissionProgress = Self::deserialize(value)?;
            if !mission_ids.contains(&row.mission_id) {
                continue;
            }
            if row.progress == 0 && !row.completed {
                continue;
            }
            let mut cleared = row;
            cleared.progress = 0;
            cleared.completed = false;
            cleared.completed_at = None;
            cleared.updated_at = Utc::now();
            let bytes = Self::serialize(&cleared)?;
            self.progress.insert(key, bytes)?;
            reset += 1;
        }
        self.progress.flush()?;
        Ok(reset)
    }

    // ========================================================================
    // User Points & XP Ledger
    // ========================================================================

    pub fn get_points(&self, user_id: &str) -> Result<Option<UserPoints>, ProgressionError> {
        let key = Self::points_key(user_id);
        let Some(bytes) = self.catalog.get(&key)? else {
            return Ok(None);
        };
        let record: UserPoints = Self::deserialize(bytes)?;
        if record.schema_version != POINTS_SCHEMA_VERSION {
            return Err(ProgressionError::SchemaMismatch {
                entity: "points",
                expected: POINTS_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        Ok(Some(record))
    }

    /// Fetch-or-create the points row and apply `mutate` under the same
    /// optimistic loop as progress rows. Returns (before, after).
    pub fn update_points<F>(
        &self,
        user_id: &str,
        mutate: F,
    ) -> Result<(UserPoints, UserPoints), ProgressionError>
    where
        F: Fn(&mut UserPoints),
    {
        let key = Self::points_key(user_id);
        loop {
            let current = self.catalog.get(&key)?;
            let before: UserPoints = match &current {
                Some(bytes) => Self::deserialize(bytes.clone())?,
                None => UserPoints::new(user_id),
            };
            let mut after = before.clone();
            mutate(&mut after);
            after.updated_at = Utc::now();

            let bytes = Self::serialize(&after)?;
            match self.catalog.compare_and_swap(&key, current, Some(bytes))? {
                Ok(()) => {
                    self.catalog.flush()?;
                    return Ok((before, after));
                }
                Err(_) => continue,
            }
        }
    }

    /// Append an entry to the XP ledger. Entries are never mutated or
    /// deleted.
    pub fn append_xp_transaction(&self, tx: &XpTransaction) -> Result<(), ProgressionError> {
        let key = format!(
            "xp:{}:{}:{}",
            tx.user_id,
            next_timestamp_nanos(),
            &tx.id[..8]
        )
        .into_bytes();
        let bytes = Self::serialize(tx)?;
        self.ledger.insert(key, bytes)?;
        self.ledger.flush()?;
        Ok(())
    }

    /// A user's ledger entries in append order.
    pub fn list_xp_transactions(
        &self,
        user_id: &str,
    ) -> Result<Vec<XpTransaction>, ProgressionError> {
        let prefix = format!("xp:{}:", user_id);
        let mut transactions = Vec::new();
        for entry in self.ledger.scan_prefix(prefix.as_bytes()) {
            let (_, value) = entry?;
            transactions.push(Self::deserialize(value)?);
        }
        Ok(transactions)
    }

    /// Zero `monthly_xp` for every user with a non-zero monthly total.
    /// Returns the number of affected users. Single-writer monthly job.
    pub fn reset_monthly_xp(&self) -> Result<usize, ProgressionError> {
        let mut affected = 0usize;
        for entry in self.catalog.scan_prefix(b"points:") {
            let (key, value) = entry?;
            let mut points: UserPoints = Self::deserialize(value)?;
            if points.monthly_xp == 0 {
                continue;
            }
            points.monthly_xp = 0;
            points.updated_at = Utc::now();
            let bytes = Self::serialize(&points)?;
            self.catalog.insert(key, bytes)?;
            affected += 1;
        }
        self.catalog.flush()?;
        Ok(affected)
    }

    // ========================================================================
    // Badge Awards
    // ========================================================================

    /// Award a badge, relying on the (user, badge) key as the concurrency
    /// guard. Returns true when newly awarded; a duplicate award is a
    /// successful no-op, never an error.
    pub fn award_badge(&self, user_id: &str, badge_id: &str) -> Result<bool, ProgressionError> {
        let key = Self::award_key(user_id, badge_id);
        let award = UserBadge::new(user_id, badge_id);
        let bytes = Self::serialize(&award)?;
        let inserted = self
            .awards
            .compare_and_swap(&key, None as Option<&[u8]>, Some(bytes))?
            .is_ok();
        if inserted {
            self.awards.flush()?;
        }
        Ok(inserted)
    }

    pub fn has_badge(&self, user_id: &str, badge_id: &str) -> Result<bool, ProgressionError> {
        let key = Self::award_key(user_id, badge_id);
        Ok(self.awards.get(&key)?.is_some())
    }

    pub fn list_user_badges(&self, user_id: &str) -> Result<Vec<UserBadge>, ProgressionError> {
        let prefix = format!("earned:{}:", user_id);
        let mut earned = Vec::new();
        for entry in self.awards.scan_prefix(prefix.as_bytes()) {
            let (_, value) = entry?;
            earned.push(Self::deserialize(value)?);
        }
        Ok(earned)
    }

    // ========================================================================
    // Completion Audit
    // ========================================================================

    pub fn append_completion(&self, entry: &CompletionAudit) -> Result<(), ProgressionError> {
        let key = format!("completions:{}:{}", entry.user_id, next_timestamp_nanos()).into_bytes();
        let bytes = Self::serialize(entry)?;
        self.audit.insert(key, bytes)?;
        self.audit.flush()?;
        Ok(())
    }

    pub fn list_completions(
        &self,
        user_id: &str,
    ) -> Result<Vec<CompletionAudit>, ProgressionError> {
        let prefix = format!("completions:{}:", user_id);
        let mut completions = Vec::new();
        for entry in self.audit.scan_prefix(prefix.as_bytes()) {
            let (_, value) = entry?;
            completions.push(Self::deserialize(value)?);
        }
        Ok(completions)
    }

    // ========================================================================
    // Action History
    // ========================================================================

    pub fn record_check_in(&self, record: &CheckInRecord) -> Result<(), ProgressionError> {
        let key = format!("checkins:{}:{}", record.user_id, next_timestamp_nanos()).into_bytes();
        let bytes = Self::serialize(record)?;
        self.history.insert(key, bytes)?;
        self.history.flush()?;
        Ok(())
    }

    pub fn record_review(&self, record: &ReviewRecord) -> Result<(), ProgressionError> {
        let key = format!("reviews:{}:{}", record.user_id, next_timestamp_nanos()).into_bytes();
        let bytes = Self::serialize(record)?;
        self.history.insert(key, bytes)?;
        self.history.flush()?;
        Ok(())
    }

    pub fn record_photo(&self, record: &PhotoRecord) -> Result<(), ProgressionError> {
        let key = format!("photos:{}:{}", record.user_id, next_timestamp_nanos()).into_bytes();
        let bytes = Self::serialize(record)?;
        self.history.insert(key, bytes)?;
        self.history.flush()?;
        Ok(())
    }

    pub fn record_vote_received(
        &self,
        record: &VoteReceivedRecord,
    ) -> Result<(), ProgressionError> {
        let key = format!("votes:{}:{}", record.user_id, next_timestamp_nanos()).into_bytes();
        let bytes = Self::serialize(record)?;
        self.history.insert(key, bytes)?;
        self.history.flush()?;
        Ok(())
    }

    /// Record a follow edge under both endpoints so either side's count is
    /// a single prefix scan. Re-following is idempotent (same keys).
    pub fn record_follow(&self, edge: &FollowEdge) -> Result<(), ProgressionError> {
        let bytes = Self::serialize(edge)?;
        let following_key =
            format!("following:{}:{}", edge.follower_id, edge.followed_id).into_bytes();
        let follower_key =
            format!("followers:{}:{}", edge.followed_id, edge.follower_id).into_bytes();
        self.history.insert(following_key, bytes.clone())?;
        self.history.insert(follower_key, bytes)?;
        self.history.flush()?;
        Ok(())
    }

    fn scan_check_ins(
        &self,
        user_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<CheckInRecord>, ProgressionError> {
        let prefix = format!("checkins:{}:", user_id);
        let mut records = Vec::new();
        for entry in self.history.scan_prefix(prefix.as_bytes()) {
            let (_, value) = entry?;
            let record: CheckInRecord = Self::deserialize(value)?;
            if since.map_or(true, |cutoff| record.at >= cutoff) {
                records.push(record);
            }
        }
        Ok(records)
    }

    pub fn count_check_ins(
        &self,
        user_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<u32, ProgressionError> {
        Ok(self.scan_check_ins(user_id, since)?.len() as u32)
    }

    pub fn count_check_ins_in_zone(
        &self,
        user_id: &str,
        zone: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<u32, ProgressionError> {
        Ok(self
            .scan_check_ins(user_id, since)?
            .iter()
            .filter(|record| record.zone == zone)
            .count() as u32)
    }

    /// Count of distinct establishment ids in the user's check-in history.
    pub fn distinct_establishments(
        &self,
        user_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<u32, ProgressionError> {
        let mut seen = HashSet::new();
        for record in self.scan_check_ins(user_id, since)? {
            seen.insert(record.establishment_id);
        }
        Ok(seen.len() as u32)
    }

    /// Count of distinct zones across the user's check-in history.
    pub fn distinct_zones(
        &self,
        user_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<u32, ProgressionError> {
        let mut seen = HashSet::new();
        for record in self.scan_check_ins(user_id, since)? {
            seen.insert(record.zone);
        }
        Ok(seen.len() as u32)
    }

    /// Count reviews meeting the optional length and photo predicates.
    pub fn count_reviews(
        &self,
        user_id: &str,
        min_length: Option<u32>,
        with_photo: bool,
        since: Option<DateTime<Utc>>,
    ) -> Result<u32, ProgressionError> {
        let prefix = format!("reviews:{}:", user_id);
        let mut count = 0u32;
        for entry in self.history.scan_prefix(prefix.as_bytes()) {
            let (_, value) = entry?;
            let record: ReviewRecord = Self::deserialize(value)?;
            if let Some(cutoff) = since {
                if record.at < cutoff {
                    continue;
                }
            }
            if let Some(min) = min_length {
                if record.length < min {
                    continue;
                }
            }
            if with_photo && !record.has_photo {
                continue;
            }
            count += 1;
        }
        Ok(count)
    }

    pub fn count_photos(&self, user_id: &str) -> Result<u32, ProgressionError> {
        let prefix = format!("photos:{}:", user_id);
        Ok(self.history.scan_prefix(prefix.as_bytes()).count() as u32)
    }

    pub fn count_votes_received(
        &self,
        user_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<u32, ProgressionError> {
        let prefix = format!("votes:{}:", user_id);
        let mut count = 0u32;
        for entry in self.history.scan_prefix(prefix.as_bytes()) {
            let (_, value) = entry?;
            let record: VoteReceivedRecord = Self::deserialize(value)?;
            if since.map_or(true, |cutoff| record.at >= cutoff) {
                count += 1;
            }
        }
        Ok(count)
    }

    /// How many users this user follows.
    pub fn following_count(
        &self,
        user_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<u32, ProgressionError> {
        self.count_follow_edges(&format!("following:{}:", user_id), since)
    }

    /// How many users follow this user.
    pub fn follower_count(
        &self,
        user_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<u32, ProgressionError> {
        self.count_follow_edges(&format!("followers:{}:", user_id), since)
    }

    fn count_follow_edges(
        &self,
        prefix: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<u32, ProgressionError> {
        let mut count = 0u32;
        for entry in self.history.scan_prefix(prefix.as_bytes()) {
            let (_, value) = entry?;
            let edge: FollowEdge = Self::deserialize(value)?;
            if since.map_or(true, |cutoff| edge.at >= cutoff) {
                count += 1;
            }
        }
        Ok(count)
    }
}
