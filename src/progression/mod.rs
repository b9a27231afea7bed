//! Progression and rewards engine.
//! Listens for validated user actions, advances mission progress through
//! atomic counters, grants XP and badges exactly once, and unlocks
//! narrative quest chains. Periodic resets and the XP ledger live here too.

pub mod badges;
pub mod completion;
pub mod dispatcher;
pub mod errors;
pub mod evaluator;
pub mod leveling;
pub mod scheduler;
pub mod seed;
pub mod storage;
pub mod types;

pub use badges::evaluate_badges;
pub use completion::handle_completion;
pub use dispatcher::ProgressionEngine;
pub use errors::ProgressionError;
pub use evaluator::{evaluate, window_for, ProgressApply, ProgressWindow};
pub use leveling::{
    award_xp, calculate_level, get_user_points, reset_monthly_xp, xp_for_next_level,
};
pub use scheduler::{ResetOutcome, ResetScheduler};
pub use seed::{
    load_badge_seeds, load_mission_seeds, seed_starter_badges, seed_starter_missions,
};
pub use storage::{ProgressionStore, ProgressionStoreBuilder};
pub use types::*;
