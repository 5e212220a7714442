mod models;
mod schema;
mod store;
mod trait_def;
mod validation;

pub use models::*;
pub use schema::ARTIST_VERSIONED_SCHEMAS;
pub use store::SqliteArtistStore;
pub use trait_def::{ArtistStore, StoreError};
pub use validation::{validate_profile, validate_target, ValidationError, ValidationResult};
