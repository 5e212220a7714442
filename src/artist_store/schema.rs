//! SQLite schema for the artist store.
//!
//! Column names match the MySQL `Artists` table the rendered statements
//! target, plus `normalized_name` for the dedup lookup and store timestamps.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP};

const ARTISTS_TABLE_V1: Table = Table {
    name: "artists",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("normalized_name", &SqlType::Text, non_null = true),
        sqlite_column!("eng_name", &SqlType::Text),
        sqlite_column!("birth_date", &SqlType::Text), // YYYY-MM-DD
        sqlite_column!("height_cm", &SqlType::Integer),
        sqlite_column!("debut_date", &SqlType::Text), // YYYY-MM-DD
        sqlite_column!("debut_title", &SqlType::Text),
        sqlite_column!("recent_activity_category", &SqlType::Text),
        sqlite_column!("recent_activity_name", &SqlType::Text),
        sqlite_column!("genre", &SqlType::Text),
        sqlite_column!("current_agency_name", &SqlType::Text),
        sqlite_column!("nationality", &SqlType::Text),
        sqlite_column!(
            "is_korean",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!("gender", &SqlType::Text),
        sqlite_column!(
            "status",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'ACTIVE'")
        ),
        sqlite_column!("profile_photo", &SqlType::Text),
        sqlite_column!("guarantee_krw", &SqlType::Integer),
        sqlite_column!("wiki_summary", &SqlType::Text),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "updated_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_artists_normalized_name", "normalized_name")],
};

pub const ARTIST_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 1,
    tables: &[ARTISTS_TABLE_V1],
    migration: None,
}];

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn latest_schema_creates_and_validates() {
        let conn = Connection::open_in_memory().unwrap();
        let latest = ARTIST_VERSIONED_SCHEMAS.last().unwrap();
        latest.create(&conn).unwrap();
        latest.validate(&conn).unwrap();
    }

    #[test]
    fn versions_are_increasing() {
        let versions: Vec<_> = ARTIST_VERSIONED_SCHEMAS.iter().map(|s| s.version).collect();
        let mut sorted = versions.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(versions, sorted);
    }
}
