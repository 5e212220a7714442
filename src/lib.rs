//! Artist Registry Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod apply;
pub mod artist_store;
pub mod config;
pub mod dedup;
pub mod resolver;
pub mod server;
pub mod sqlite_persistence;
pub mod statement;
pub mod upstream;

// Re-export commonly used types for convenience
pub use apply::{ApplyRequest, ApplyService};
pub use artist_store::{ArtistProfile, ArtistStore, SqliteArtistStore};
pub use resolver::{ArtistResolver, SearchOutcome};
pub use server::{run_server, RequestsLoggingLevel};
