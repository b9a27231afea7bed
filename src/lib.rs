//! # Patronage - Progression & Rewards Engine
//!
//! Patronage is the gamification core of a venue check-in and review
//! community. It listens for already-validated user actions (check-ins,
//! reviews, helpful votes, follows, photo uploads), evaluates a catalog of
//! daily, weekly, and narrative "missions", advances per-user progress
//! counters atomically, grants experience points and badges exactly once,
//! and unlocks the next step of multi-step quest chains.
//!
//! ## Features
//!
//! - **Typed Requirements**: Mission and badge requirements are closed
//!   tagged-variant types; evaluation is an exhaustive match per kind.
//! - **Atomic Counters**: Progress updates run through an optimistic
//!   compare-and-swap loop, so concurrent events for the same user and
//!   mission cross the completion threshold exactly once.
//! - **Idempotent Rewards**: Badge awards key on (user, badge), and the XP
//!   ledger is append-only; replays and duplicates are harmless no-ops.
//! - **Quest Chains**: Completing a narrative step lazily unlocks the next
//!   one; only future qualifying events count toward it.
//! - **Periodic Resets**: Daily and weekly progress resets at local
//!   boundaries in an explicitly configured timezone, with overlap guards.
//! - **Best-Effort Listeners**: A gamification failure never fails the
//!   triggering action; errors are logged and swallowed at the boundary.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use patronage::config::Config;
//! use patronage::progression::{CheckInEvent, ProgressionEngine};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let engine = ProgressionEngine::open(&config)?;
//!
//!     // Fire-and-forget from the caller's perspective.
//!     engine.on_check_in(CheckInEvent {
//!         user_id: "alice".to_string(),
//!         establishment_id: "cafe_luna".to_string(),
//!         zone: "downtown".to_string(),
//!         verified: true,
//!     });
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`progression`] - The engine core: dispatcher, evaluator, atomic
//!   progress store, completion handling, leveling, badges, resets
//! - [`config`] - Configuration management and validation

pub mod config;
pub mod progression;
