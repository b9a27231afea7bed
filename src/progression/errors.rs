use thiserror::Error;

/// Errors that can arise while interacting with the progression storage
/// layer or the reward subsystems.
#[derive(Debug, Error)]
pub enum ProgressionError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around bincode serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Wrapper around IO errors (directory creation, seed files, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when fetching a record that is not present.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Returned when deserializing a record with an unexpected schema version.
    #[error("schema mismatch for {entity}: expected {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },

    /// XP grants must be positive; zero and negative amounts indicate an
    /// upstream programming error and are rejected synchronously.
    #[error("xp amount must be a positive integer, got {0}")]
    InvalidXpAmount(i64),

    /// Malformed mission requirement (e.g. a zero completion target).
    #[error("invalid requirement for mission {mission}: {detail}")]
    InvalidRequirement { mission: String, detail: String },
}
