//! Starter mission/badge catalog and JSON seed loading.
//!
//! The built-in catalog gives a fresh store a usable set of daily and
//! weekly missions, one narrative quest chain, and a badge shelf. Deployed
//! systems usually replace it with seed files so admins can tune content
//! without recompiling.

use std::fs;
use std::path::Path;

use crate::progression::errors::ProgressionError;
use crate::progression::types::{
    BadgeRecord, BadgeRequirement, MissionPeriod, MissionRecord, MissionRequirement,
};

/// Built-in mission catalog inserted on first store open.
pub fn seed_starter_missions() -> Vec<MissionRecord> {
    use MissionPeriod::*;
    use MissionRequirement::*;

    let mut missions = Vec::new();

    // Daily missions
    missions.push(MissionRecord::new(
        "daily_check_in",
        "Out and About",
        "Check in somewhere today",
        Daily,
        CheckInCount {
            count: 1,
            unique: false,
        },
        10,
    ));

    missions.push(MissionRecord::new(
        "daily_explorer",
        "Two for the Road",
        "Check in at two different establishments today",
        Daily,
        CheckInCount {
            count: 2,
            unique: true,
        },
        20,
    ));

    missions.push(MissionRecord::new(
        "daily_reviewer",
        "Word on the Street",
        "Write a review today",
        Daily,
        WriteReviews {
            count: 1,
            min_length: None,
            with_photos: false,
        },
        15,
    ));

    // Weekly missions
    missions.push(MissionRecord::new(
        "weekly_regular",
        "Regular",
        "Check in five times this week",
        Weekly,
        CheckInCount {
            count: 5,
            unique: false,
        },
        50,
    ));

    missions.push(MissionRecord::new(
        "weekly_zone_hopper",
        "Zone Hopper",
        "Visit three different zones this week",
        Weekly,
        CheckInAllZones { count: 3 },
        60,
    ));

    missions.push(MissionRecord::new(
        "weekly_quality_critic",
        "Quality Critic",
        "Write two reviews of 100+ characters with photos this week",
        Weekly,
        WriteQualityReview {
            min_length: 100,
            with_photo: true,
            count: 2,
        },
        75,
    ));

    // Narrative quest chain: city_explorer
    missions.push(
        MissionRecord::new(
            "first_steps",
            "First Steps",
            "Make your first check-in",
            Narrative,
            CheckInCount {
                count: 1,
                unique: false,
            },
            25,
        )
        .with_quest_step("city_explorer", 1),
    );

    missions.push(
        MissionRecord::new(
            "getting_around",
            "Getting Around",
            "Check in at three different establishments",
            Narrative,
            CheckInCount {
                count: 3,
                unique: true,
            },
            50,
        )
        .with_quest_step("city_explorer", 2),
    );

    missions.push(
        MissionRecord::new(
            "local_legend",
            "Local Legend",
            "Visit five different zones",
            Narrative,
            CheckInAllZones { count: 5 },
            100,
        )
        .with_quest_step("city_explorer", 3)
        .with_badge_reward("local_legend"),
    );

    missions
}

/// Built-in badge shelf inserted on first store open.
pub fn seed_starter_badges() -> Vec<BadgeRecord> {
    use BadgeRequirement::*;

    vec![
        BadgeRecord::new(
            "first_review",
            "First Review",
            "Publish your first review",
            ReviewCount { required: 1 },
        ),
        BadgeRecord::new(
            "prolific_reviewer",
            "Prolific Reviewer",
            "Publish 25 reviews",
            ReviewCount { required: 25 },
        ),
        BadgeRecord::new(
            "regular",
            "Regular",
            "Check in 50 times",
            CheckInCount { required: 50 },
        ),
        BadgeRecord::new(
            "wanderer",
            "Wanderer",
            "Visit 10 different establishments",
            UniqueEstablishments { required: 10 },
        ),
        BadgeRecord::new(
            "globetrotter",
            "Globetrotter",
            "Visit 10 different zones",
            UniqueZonesVisited { required: 10 },
        ),
        BadgeRecord::new(
            "shutterbug",
            "Shutterbug",
            "Upload 20 photos",
            PhotoCount { required: 20 },
        ),
        BadgeRecord::new(
            "crowd_favorite",
            "Crowd Favorite",
            "Receive 50 helpful votes on your reviews",
            HelpfulVotesReceived { required: 50 },
        ),
        BadgeRecord::new(
            "well_connected",
            "Well Connected",
            "Gain 10 followers",
            FollowerCount { required: 10 },
        ),
        BadgeRecord::new(
            "local_legend",
            "Local Legend",
            "Visit five different zones",
            UniqueZonesVisited { required: 5 },
        ),
    ]
}

/// Load mission definitions from a JSON seed file.
pub fn load_mission_seeds<P: AsRef<Path>>(path: P) -> Result<Vec<MissionRecord>, ProgressionError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let missions: Vec<MissionRecord> = serde_json::from_str(&contents).map_err(|e| {
        ProgressionError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Failed to parse {}: {}", path.display(), e),
        ))
    })?;
    Ok(missions)
}

/// Load badge definitions from a JSON seed file.
pub fn load_badge_seeds<P: AsRef<Path>>(path: P) -> Result<Vec<BadgeRecord>, ProgressionError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let badges: Vec<BadgeRecord> = serde_json::from_str(&contents).map_err(|e| {
        ProgressionError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Failed to parse {}: {}", path.display(), e),
        ))
    })?;
    Ok(badges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn starter_catalog_is_well_formed() {
        let missions = seed_starter_missions();
        assert!(!missions.is_empty());
        for mission in &missions {
            assert!(mission.requirement.target() > 0, "{} has no target", mission.id);
            assert!(mission.is_active);
        }

        // The quest chain is contiguous from step 1.
        let mut steps: Vec<u32> = missions
            .iter()
            .filter_map(|m| m.quest.as_ref())
            .filter(|slot| slot.quest_id == "city_explorer")
            .map(|slot| slot.step)
            .collect();
        steps.sort_unstable();
        assert_eq!(steps, vec![1, 2, 3]);
    }

    #[test]
    fn mission_badge_rewards_exist_in_badge_catalog() {
        let badges = seed_starter_badges();
        for mission in seed_starter_missions() {
            if let Some(badge_id) = &mission.badge_reward {
                assert!(
                    badges.iter().any(|b| &b.id == badge_id),
                    "mission {} rewards unknown badge {}",
                    mission.id,
                    badge_id
                );
            }
        }
    }

    #[test]
    fn mission_seeds_round_trip_through_json() {
        let missions = seed_starter_missions();
        let json = serde_json::to_string_pretty(&missions).expect("serialize");

        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(json.as_bytes()).expect("write");

        let loaded = load_mission_seeds(file.path()).expect("load");
        assert_eq!(loaded.len(), missions.len());
        assert_eq!(loaded[0].id, missions[0].id);
    }

    #[test]
    fn malformed_seed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(b"not json").expect("write");
        assert!(load_mission_seeds(file.path()).is_err());
    }
}
