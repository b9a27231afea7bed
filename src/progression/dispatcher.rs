//! Listener entry points, one per domain event category.
//!
//! Every listener is fire-and-forget from the caller's perspective: the
//! triggering action (check-in, review, vote, …) must never fail because
//! gamification failed, so store errors are logged here and swallowed.
//! Within a run, a failing mission or badge is skipped and the rest
//! proceed.

use std::sync::Arc;

use chrono::{FixedOffset, Utc};
use log::{debug, warn};

use crate::progression::badges;
use crate::progression::completion;
use crate::progression::errors::ProgressionError;
use crate::progression::evaluator::{self, ProgressApply};
use crate::progression::leveling;
use crate::progression::storage::ProgressionStore;
use crate::progression::types::{
    ActionKind, CheckInEvent, CheckInRecord, FollowAction, FollowEdge, FollowEvent, PhotoRecord,
    PhotoUploadEvent, ReviewEvent, ReviewRecord, UserPoints, VoteCastEvent, VoteReceivedEvent,
    VoteReceivedRecord, XpReason, XpSourceType,
};

/// The progression engine: dispatches already-validated action events to
/// mission and badge evaluation. Cheap to clone and share across call
/// sites; listeners run as short, complete units of work.
#[derive(Clone)]
pub struct ProgressionEngine {
    store: Arc<ProgressionStore>,
    timezone: FixedOffset,
}

impl ProgressionEngine {
    pub fn new(store: Arc<ProgressionStore>, timezone: FixedOffset) -> Self {
        Self { store, timezone }
    }

    /// Open a store from configuration and wrap it in an engine.
    pub fn open(config: &crate::config::Config) -> Result<Self, ProgressionError> {
        let store = Arc::new(ProgressionStore::open(&config.engine.data_dir)?);
        Ok(Self::new(store, config.engine.timezone()))
    }

    /// The underlying store, for host-side reads and the reset jobs.
    pub fn store(&self) -> &Arc<ProgressionStore> {
        &self.store
    }

    // ========================================================================
    // Listener entry points
    // ========================================================================

    /// A verified check-in at an establishment. Unverified check-ins are
    /// not countable and short-circuit before any store access.
    pub fn on_check_in(&self, event: CheckInEvent) {
        if !event.verified {
            debug!("ignoring unverified check-in from {}", event.user_id);
            return;
        }
        if let Err(err) = self.handle_check_in(&event) {
            warn!("check-in progression failed for {}: {}", event.user_id, err);
        }
    }

    /// A published review.
    pub fn on_review_created(&self, event: ReviewEvent) {
        if let Err(err) = self.handle_review(&event) {
            warn!("review progression failed for {}: {}", event.user_id, err);
        }
    }

    /// A vote cast on someone else's review. Only helpful votes are
    /// countable.
    pub fn on_vote_cast(&self, event: VoteCastEvent) {
        if !event.helpful {
            debug!("ignoring non-helpful vote from {}", event.voter_id);
            return;
        }
        if let Err(err) = self.run_user_actions(&event.voter_id, ActionKind::VoteCast) {
            warn!("vote progression failed for {}: {}", event.voter_id, err);
        }
    }

    /// A follow-graph change. Unfollows are not countable.
    pub fn on_follow_action(&self, event: FollowEvent) {
        if event.action == FollowAction::Unfollowed {
            debug!(
                "ignoring unfollow of {} by {}",
                event.followed_id, event.follower_id
            );
            return;
        }
        if let Err(err) = self.handle_follow(&event) {
            warn!(
                "follow progression failed for {} -> {}: {}",
                event.follower_id, event.followed_id, err
            );
        }
    }

    /// A helpful vote received on one of the user's reviews.
    pub fn on_helpful_vote_received(&self, event: VoteReceivedEvent) {
        if let Err(err) = self.handle_vote_received(&event) {
            warn!(
                "received-vote progression failed for {}: {}",
                event.recipient_id, err
            );
        }
    }

    /// A photo uploaded by the user.
    pub fn on_photo_uploaded(&self, event: PhotoUploadEvent) {
        if let Err(err) = self.handle_photo(&event) {
            warn!("photo progression failed for {}: {}", event.user_id, err);
        }
    }

    // ========================================================================
    // External reward flows
    // ========================================================================

    /// Grant XP outside mission flow (e.g. an explicit admin bonus).
    /// Validation errors propagate; they indicate an upstream bug.
    pub fn award_xp(
        &self,
        user_id: &str,
        amount: i64,
        reason: XpReason,
        source_type: Option<XpSourceType>,
        source_id: Option<String>,
    ) -> Result<UserPoints, ProgressionError> {
        leveling::award_xp(&self.store, user_id, amount, reason, source_type, source_id)
    }

    pub fn user_points(&self, user_id: &str) -> Result<UserPoints, ProgressionError> {
        leveling::get_user_points(&self.store, user_id)
    }

    /// Zero every user's monthly XP; returns the affected-user count.
    pub fn reset_monthly_xp(&self) -> Result<usize, ProgressionError> {
        leveling::reset_monthly_xp(&self.store)
    }

    // ========================================================================
    // Internal handlers
    // ========================================================================

    fn handle_check_in(&self, event: &CheckInEvent) -> Result<(), ProgressionError> {
        let now = Utc::now();
        self.store.record_check_in(&CheckInRecord {
            user_id: event.user_id.clone(),
            establishment_id: event.establishment_id.clone(),
            zone: event.zone.clone(),
            at: now,
        })?;
        leveling::record_check_in_streak(
            &self.store,
            &event.user_id,
            evaluator::local_date(self.timezone, now),
        )?;
        self.run_user_actions(&event.user_id, ActionKind::CheckIn)
    }

    fn handle_review(&self, event: &ReviewEvent) -> Result<(), ProgressionError> {
        self.store.record_review(&ReviewRecord {
            user_id: event.user_id.clone(),
            review_id: event.review_id.clone(),
            length: event.length,
            has_photo: event.has_photo,
            at: Utc::now(),
        })?;
        self.run_user_actions(&event.user_id, ActionKind::Review)
    }

    fn handle_follow(&self, event: &FollowEvent) -> Result<(), ProgressionError> {
        self.store.record_follow(&FollowEdge {
            follower_id: event.follower_id.clone(),
            followed_id: event.followed_id.clone(),
            at: Utc::now(),
        })?;
        // The same edge advances both sides: the follower's follow_users
        // missions and the followed user's gain_followers missions.
        self.run_user_actions(&event.follower_id, ActionKind::Follow)?;
        self.run_user_actions(&event.followed_id, ActionKind::FollowerGained)
    }

    fn handle_vote_received(&self, event: &VoteReceivedEvent) -> Result<(), ProgressionError> {
        self.store.record_vote_received(&VoteReceivedRecord {
            user_id: event.recipient_id.clone(),
            voter_id: event.voter_id.clone(),
            review_id: event.review_id.clone(),
            at: Utc::now(),
        })?;
        self.run_user_actions(&event.recipient_id, ActionKind::VoteReceived)
    }

    fn handle_photo(&self, event: &PhotoUploadEvent) -> Result<(), ProgressionError> {
        self.store.record_photo(&PhotoRecord {
            user_id: event.user_id.clone(),
            photo_id: event.photo_id.clone(),
            establishment_id: event.establishment_id.clone(),
            at: Utc::now(),
        })?;
        self.run_user_actions(&event.user_id, ActionKind::PhotoUpload)
    }

    /// Advance every relevant mission for the user, then badges. Only the
    /// history write can fail the whole run; per-mission failures are
    /// logged and skipped so the others proceed.
    fn run_user_actions(&self, user_id: &str, kind: ActionKind) -> Result<(), ProgressionError> {
        let now = Utc::now();

        // Eligibility is decided up front, before any update runs: a quest
        // step unlocked by a completion in this very run only counts future
        // qualifying events, regardless of catalog iteration order.
        let mut runnable = Vec::new();
        for mission in self.store.list_active_missions()? {
            if !mission.requirement.reacts_to(kind) {
                continue;
            }
            if mission.requirement.target() == 0 {
                warn!("mission {} has a zero completion target, skipping", mission.id);
                continue;
            }

            let existing = match self.store.get_progress(user_id, &mission.id) {
                Ok(row) => row,
                Err(err) => {
                    warn!("progress read failed for mission {}: {}", mission.id, err);
                    continue;
                }
            };
            if let Some(row) = &existing {
                if row.completed {
                    continue;
                }
            } else if let Some(slot) = &mission.quest {
                // Later quest steps stay locked until the prior step's
                // completion creates their row.
                if slot.step > 1 {
                    continue;
                }
            }
            runnable.push(mission);
        }

        for mission in runnable {
            let apply = match evaluator::evaluate(&self.store, user_id, &mission, self.timezone, now)
            {
                Ok(apply) => apply,
                Err(err) => {
                    warn!("evaluation failed for mission {}: {}", mission.id, err);
                    continue;
                }
            };
            let update = match apply {
                ProgressApply::Increment(delta) => {
                    self.store.increment_and_check(user_id, &mission, delta)
                }
                ProgressApply::SetAbsolute(value) => {
                    self.store.set_absolute(user_id, &mission, value)
                }
            };
            let update = match update {
                Ok(update) => update,
                Err(err) => {
                    warn!("progress update failed for mission {}: {}", mission.id, err);
                    continue;
                }
            };

            if update.just_completed {
                if let Err(err) = completion::handle_completion(&self.store, user_id, &mission) {
                    warn!("completion handling failed for mission {}: {}", mission.id, err);
                }
            }
        }

        if let Err(err) = badges::evaluate_badges(&self.store, user_id, kind) {
            warn!("badge evaluation failed for {}: {}", user_id, err);
        }

        Ok(())
    }
}
