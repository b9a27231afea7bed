use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MISSION_SCHEMA_VERSION: u8 = 1;
pub const BADGE_SCHEMA_VERSION: u8 = 1;
pub const PROGRESS_SCHEMA_VERSION: u8 = 1;
pub const POINTS_SCHEMA_VERSION: u8 = 1;

/// How often a mission's progress window rolls over.
///
/// `Narrative` missions never reset; their window is all-time and their
/// progress rows survive the periodic reset jobs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MissionPeriod {
    Daily,
    Weekly,
    Narrative,
}

/// Action categories the engine reacts to. Used by the static relevance
/// mapping shared between mission dispatch and badge evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    CheckIn,
    Review,
    VoteCast,
    VoteReceived,
    Follow,
    FollowerGained,
    PhotoUpload,
}

/// Mission requirement variants. Each carries only its relevant typed
/// parameters; evaluation is an exhaustive match per kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MissionRequirement {
    /// Check in `count` times. With `unique`, count distinct establishments
    /// instead of raw check-ins.
    CheckInCount {
        count: u32,
        #[serde(default)]
        unique: bool,
    },
    /// Check in `count` times at establishments in `zone`.
    CheckInZone { zone: String, count: u32 },
    /// Visit `count` distinct zones.
    CheckInAllZones { count: u32 },
    /// Write `count` reviews, optionally constrained by length and photos.
    WriteReviews {
        count: u32,
        #[serde(default)]
        min_length: Option<u32>,
        #[serde(default)]
        with_photos: bool,
    },
    /// Write `count` reviews that meet both the length and photo bar.
    WriteQualityReview {
        min_length: u32,
        with_photo: bool,
        count: u32,
    },
    /// Follow `count` other users.
    FollowUsers { count: u32 },
    /// Be followed by `count` other users.
    GainFollowers { count: u32 },
}

impl MissionRequirement {
    /// The completion threshold for this requirement.
    pub fn target(&self) -> u32 {
        use MissionRequirement::*;
        match self {
            CheckInCount { count, .. }
            | CheckInZone { count, .. }
            | CheckInAllZones { count }
            | WriteReviews { count, .. }
            | WriteQualityReview { count, .. }
            | FollowUsers { count }
            | GainFollowers { count } => *count,
        }
    }

    /// Static relevance mapping from requirement kind to action kind, so a
    /// check-in never triggers review evaluation and vice versa.
    pub fn reacts_to(&self, kind: ActionKind) -> bool {
        use MissionRequirement::*;
        match self {
            CheckInCount { .. } | CheckInZone { .. } | CheckInAllZones { .. } => {
                kind == ActionKind::CheckIn
            }
            WriteReviews { .. } | WriteQualityReview { .. } => kind == ActionKind::Review,
            FollowUsers { .. } => kind == ActionKind::Follow,
            GainFollowers { .. } => kind == ActionKind::FollowerGained,
        }
    }

    /// Whether evaluation recomputes an absolute qualifying count (distinct
    /// aggregations, predicate or window filters) rather than adding +1 per
    /// event. Recomputed kinds are applied with `set_absolute` so replayed
    /// events cannot drift progress past the real count.
    pub fn is_recomputed(&self) -> bool {
        use MissionRequirement::*;
        match self {
            CheckInCount { unique, .. } => *unique,
            CheckInZone { .. } | CheckInAllZones { .. } => true,
            WriteReviews {
                min_length,
                with_photos,
                ..
            } => min_length.is_some() || *with_photos,
            WriteQualityReview { .. } => true,
            FollowUsers { .. } | GainFollowers { .. } => true,
        }
    }
}

/// Position of a mission inside a narrative quest chain. Completing the
/// mission at `step` unlocks the chain's mission at `step + 1`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestSlot {
    pub quest_id: String,
    pub step: u32,
}

/// A tracked objective with a requirement and a reward. Definitions are
/// immutable during normal operation; only external admin tooling edits them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MissionRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    pub period: MissionPeriod,
    pub requirement: MissionRequirement,
    pub xp_reward: u32,
    /// Badge granted on completion, if any.
    #[serde(default)]
    pub badge_reward: Option<String>,
    /// Present when the mission is a step of a narrative quest chain.
    #[serde(default)]
    pub quest: Option<QuestSlot>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl MissionRecord {
    pub fn new(
        id: &str,
        name: &str,
        description: &str,
        period: MissionPeriod,
        requirement: MissionRequirement,
        xp_reward: u32,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            period,
            requirement,
            xp_reward,
            badge_reward: None,
            quest: None,
            is_active: true,
            created_at: Utc::now(),
            schema_version: MISSION_SCHEMA_VERSION,
        }
    }

    pub fn with_badge_reward(mut self, badge_id: &str) -> Self {
        self.badge_reward = Some(badge_id.to_string());
        self
    }

    pub fn with_quest_step(mut self, quest_id: &str, step: u32) -> Self {
        self.quest = Some(QuestSlot {
            quest_id: quest_id.to_string(),
            step,
        });
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

/// Per-(user, mission) progress row. Created lazily on the first qualifying
/// event, or by a quest-chain unlock.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MissionProgress {
    pub user_id: String,
    pub mission_id: String,
    pub progress: u32,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl MissionProgress {
    pub fn new(user_id: &str, mission_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            mission_id: mission_id.to_string(),
            progress: 0,
            completed: false,
            completed_at: None,
            updated_at: Utc::now(),
            schema_version: PROGRESS_SCHEMA_VERSION,
        }
    }
}

/// Result of an atomic progress update. `just_completed` is reported to
/// exactly one caller per (user, mission) crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub progress: u32,
    pub just_completed: bool,
}

/// One row per user: XP totals, level, and check-in streak counters.
/// `current_level` always equals `calculate_level(total_xp)` after a write.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserPoints {
    pub user_id: String,
    pub total_xp: i64,
    pub monthly_xp: i64,
    pub current_level: u32,
    #[serde(default)]
    pub current_streak_days: u32,
    #[serde(default)]
    pub longest_streak_days: u32,
    /// Local calendar date of the most recent verified check-in.
    #[serde(default)]
    pub last_check_in_date: Option<NaiveDate>,
    pub updated_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl UserPoints {
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            total_xp: 0,
            monthly_xp: 0,
            current_level: 1,
            current_streak_days: 0,
            longest_streak_days: 0,
            last_check_in_date: None,
            updated_at: Utc::now(),
            schema_version: POINTS_SCHEMA_VERSION,
        }
    }
}

/// Reason attached to an XP ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum XpReason {
    MissionReward,
    AdminBonus,
    Other { description: String },
}

/// What granted an XP transaction, for ledger auditing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum XpSourceType {
    Mission,
    Badge,
    Admin,
}

/// Append-only XP ledger entry. Never mutated or deleted; the sum of a
/// user's entries reconciles with `UserPoints::total_xp`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct XpTransaction {
    pub id: String,
    pub user_id: String,
    pub amount: i64,
    pub reason: XpReason,
    #[serde(default)]
    pub source_type: Option<XpSourceType>,
    #[serde(default)]
    pub source_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl XpTransaction {
    pub fn new(
        user_id: &str,
        amount: i64,
        reason: XpReason,
        source_type: Option<XpSourceType>,
        source_id: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            amount,
            reason,
            source_type,
            source_id,
            created_at: Utc::now(),
        }
    }
}

/// Badge requirement variants, evaluated independently of missions on the
/// same action events, always against all-time history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BadgeRequirement {
    ReviewCount { required: u32 },
    CheckInCount { required: u32 },
    UniqueEstablishments { required: u32 },
    UniqueZonesVisited { required: u32 },
    FollowerCount { required: u32 },
    PhotoCount { required: u32 },
    HelpfulVotesReceived { required: u32 },
    QualityReviews { min_length: u32, required: u32 },
    /// Account age is not derivable from action history; awarded upstream.
    AccountAge { days: u32 },
}

impl BadgeRequirement {
    pub fn required(&self) -> u32 {
        use BadgeRequirement::*;
        match self {
            ReviewCount { required }
            | CheckInCount { required }
            | UniqueEstablishments { required }
            | UniqueZonesVisited { required }
            | FollowerCount { required }
            | PhotoCount { required }
            | HelpfulVotesReceived { required }
            | QualityReviews { required, .. } => *required,
            AccountAge { days } => *days,
        }
    }

    /// Same relevance mapping as missions, reused for badge evaluation.
    pub fn reacts_to(&self, kind: ActionKind) -> bool {
        use BadgeRequirement::*;
        match self {
            CheckInCount { .. } | UniqueEstablishments { .. } | UniqueZonesVisited { .. } => {
                kind == ActionKind::CheckIn
            }
            ReviewCount { .. } | QualityReviews { .. } => kind == ActionKind::Review,
            FollowerCount { .. } => kind == ActionKind::FollowerGained,
            PhotoCount { .. } => kind == ActionKind::PhotoUpload,
            HelpfulVotesReceived { .. } => kind == ActionKind::VoteReceived,
            AccountAge { .. } => false,
        }
    }
}

/// Badge definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BadgeRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    pub requirement: BadgeRequirement,
    pub created_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl BadgeRecord {
    pub fn new(id: &str, name: &str, description: &str, requirement: BadgeRequirement) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            requirement,
            created_at: Utc::now(),
            schema_version: BADGE_SCHEMA_VERSION,
        }
    }
}

/// A badge a user has earned. Keyed on (user, badge) in the store, which
/// makes awarding idempotent by construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserBadge {
    pub user_id: String,
    pub badge_id: String,
    pub awarded_at: DateTime<Utc>,
}

impl UserBadge {
    pub fn new(user_id: &str, badge_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            badge_id: badge_id.to_string(),
            awarded_at: Utc::now(),
        }
    }
}

/// Audit row appended on each mission completion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionAudit {
    pub user_id: String,
    pub mission_id: String,
    pub completed_at: DateTime<Utc>,
}

impl CompletionAudit {
    pub fn new(user_id: &str, mission_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            mission_id: mission_id.to_string(),
            completed_at: Utc::now(),
        }
    }
}

// ============================================================================
// Action History
// ============================================================================

/// A verified check-in at an establishment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckInRecord {
    pub user_id: String,
    pub establishment_id: String,
    pub zone: String,
    pub at: DateTime<Utc>,
}

/// A published review.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewRecord {
    pub user_id: String,
    pub review_id: String,
    pub length: u32,
    pub has_photo: bool,
    pub at: DateTime<Utc>,
}

/// An uploaded photo.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhotoRecord {
    pub user_id: String,
    pub photo_id: String,
    #[serde(default)]
    pub establishment_id: Option<String>,
    pub at: DateTime<Utc>,
}

/// A helpful vote received on one of the user's reviews.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VoteReceivedRecord {
    pub user_id: String,
    pub voter_id: String,
    pub review_id: String,
    pub at: DateTime<Utc>,
}

/// A follow edge. Stored under both the follower and the followed user so
/// either side's count is a single prefix scan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FollowEdge {
    pub follower_id: String,
    pub followed_id: String,
    pub at: DateTime<Utc>,
}

// ============================================================================
// Listener Event Payloads
// ============================================================================

/// Already-validated check-in, as handed over by the host system.
#[derive(Debug, Clone)]
pub struct CheckInEvent {
    pub user_id: String,
    pub establishment_id: String,
    pub zone: String,
    /// Unverified check-ins are not countable and short-circuit dispatch.
    pub verified: bool,
}

#[derive(Debug, Clone)]
pub struct ReviewEvent {
    pub user_id: String,
    pub review_id: String,
    /// Review body length in characters.
    pub length: u32,
    pub has_photo: bool,
}

#[derive(Debug, Clone)]
pub struct VoteCastEvent {
    pub voter_id: String,
    pub review_id: String,
    /// Only helpful votes are countable.
    pub helpful: bool,
}

#[derive(Debug, Clone)]
pub struct VoteReceivedEvent {
    pub recipient_id: String,
    pub voter_id: String,
    pub review_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowAction {
    Followed,
    Unfollowed,
}

#[derive(Debug, Clone)]
pub struct FollowEvent {
    pub follower_id: String,
    pub followed_id: String,
    pub action: FollowAction,
}

#[derive(Debug, Clone)]
pub struct PhotoUploadEvent {
    pub user_id: String,
    pub photo_id: String,
    pub establishment_id: Option<String>,
}
