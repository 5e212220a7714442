//! ArtistStore trait definition.

use super::models::{ArtistFilter, ArtistProfile, ArtistQuery, StoredArtist};
use thiserror::Error;

/// Errors raised by artist store backends.
///
/// `Storage` messages are meant for logs; the HTTP layer never returns them.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Artist {0} not found")]
    NotFound(i64),

    #[error("An artist named '{0}' already exists")]
    DuplicateName(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::SqliteFailure(err, msg)
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StoreError::Constraint(msg.unwrap_or_else(|| err.to_string()))
            }
            other => StoreError::Storage(other.to_string()),
        }
    }
}

/// Trait for artist storage backends.
pub trait ArtistStore: Send + Sync {
    /// All artists whose normalized name equals `normalized_name`, ordered by id.
    fn find_by_normalized_name(&self, normalized_name: &str) -> Result<Vec<StoredArtist>, StoreError>;

    fn get(&self, id: i64) -> Result<Option<StoredArtist>, StoreError>;

    fn list(&self, query: &ArtistQuery) -> Result<Vec<StoredArtist>, StoreError>;

    /// Number of artists matching `filter` (all artists if `None`).
    fn count(&self, filter: Option<&ArtistFilter>) -> Result<usize, StoreError>;

    /// Insert the profile unless an artist with the same normalized name
    /// exists. The check and the insert share one transaction.
    ///
    /// Returns the new artist id.
    fn insert_if_absent(&self, profile: &ArtistProfile) -> Result<i64, StoreError>;

    /// Overwrite the present fields of artist `id`, leaving the others as they
    /// are. Applying the same profile twice yields the same row.
    fn update_partial(&self, id: i64, profile: &ArtistProfile) -> Result<(), StoreError>;
}
