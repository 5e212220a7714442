//! SQLite-backed artist store.

use super::models::*;
use super::schema::ARTIST_VERSIONED_SCHEMAS;
use super::trait_def::{ArtistStore, StoreError};
use crate::dedup::normalize_name;
use crate::sqlite_persistence::BASE_DB_VERSION;
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

const ARTIST_COLUMNS: &str = "id, name, eng_name, birth_date, height_cm, debut_date, debut_title, \
     recent_activity_category, recent_activity_name, genre, current_agency_name, nationality, \
     is_korean, gender, status, profile_photo, guarantee_krw, wiki_summary, created_at, updated_at";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite-backed artist store with one write connection and one read
/// connection over a WAL journal.
#[derive(Clone)]
pub struct SqliteArtistStore {
    write_conn: Arc<Mutex<Connection>>,
    read_conn: Arc<Mutex<Connection>>,
}

fn migrate_if_needed(conn: &mut Connection) -> Result<()> {
    let latest_schema = ARTIST_VERSIONED_SCHEMAS
        .last()
        .context("No artist schema defined")?;

    let table_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |r| r.get(0),
    )?;

    if table_count == 0 {
        info!(
            "Creating artist db schema at version {}",
            latest_schema.version
        );
        latest_schema.create(conn)?;
        return Ok(());
    }

    let raw_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    let db_version = raw_version - BASE_DB_VERSION as i64;
    if db_version < 1 {
        bail!(
            "Artist database version {} is invalid (expected >= 1)",
            db_version
        );
    }

    let schema_index = ARTIST_VERSIONED_SCHEMAS
        .iter()
        .position(|s| s.version as i64 == db_version)
        .with_context(|| format!("Unknown artist database version {}", db_version))?;
    ARTIST_VERSIONED_SCHEMAS[schema_index]
        .validate(conn)
        .with_context(|| {
            format!(
                "Artist database schema validation failed for version {}",
                db_version
            )
        })?;

    if schema_index + 1 == ARTIST_VERSIONED_SCHEMAS.len() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    let mut current_version = db_version as usize;
    for schema in ARTIST_VERSIONED_SCHEMAS.iter().skip(schema_index + 1) {
        info!(
            "Migrating artist db from version {} to {}",
            current_version, schema.version
        );
        if let Some(migration_fn) = schema.migration {
            migration_fn(&tx)
                .with_context(|| format!("Failed to run migration to version {}", schema.version))?;
        }
        current_version = schema.version;
    }
    tx.pragma_update(None, "user_version", BASE_DB_VERSION + current_version)?;
    tx.commit()?;
    Ok(())
}

impl SqliteArtistStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();

        let mut write_conn = Connection::open_with_flags(
            db_path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open artist database")?;

        migrate_if_needed(&mut write_conn)?;
        write_conn.pragma_update(None, "journal_mode", "WAL")?;
        write_conn.busy_timeout(std::time::Duration::from_secs(5))?;

        let artist_count: i64 = write_conn
            .query_row("SELECT COUNT(*) FROM artists", [], |r| r.get(0))
            .unwrap_or(0);
        info!("Opened artist store: {} artists", artist_count);

        let read_conn = Connection::open_with_flags(
            db_path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open artist database for reading")?;
        read_conn.busy_timeout(std::time::Duration::from_secs(5))?;

        Ok(Self {
            write_conn: Arc::new(Mutex::new(write_conn)),
            read_conn: Arc::new(Mutex::new(read_conn)),
        })
    }

    fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>, StoreError> {
        conn.lock()
            .map_err(|_| StoreError::Storage("connection lock poisoned".to_string()))
    }

    fn row_to_stored_artist(row: &rusqlite::Row) -> rusqlite::Result<StoredArtist> {
        let parse_date = |s: Option<String>| {
            s.and_then(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).ok())
        };

        let profile = ArtistProfile {
            name: row.get("name")?,
            eng_name: row.get("eng_name")?,
            birth_date: parse_date(row.get("birth_date")?),
            height_cm: row
                .get::<_, Option<i64>>("height_cm")?
                .and_then(|h| u16::try_from(h).ok()),
            debut_date: parse_date(row.get("debut_date")?),
            debut_title: row.get("debut_title")?,
            recent_activity_category: row.get("recent_activity_category")?,
            recent_activity_name: row.get("recent_activity_name")?,
            genre: row.get("genre")?,
            current_agency_name: row.get("current_agency_name")?,
            nationality: row.get("nationality")?,
            is_korean: row.get::<_, i64>("is_korean")? != 0,
            gender: row
                .get::<_, Option<String>>("gender")?
                .and_then(|g| Gender::from_db_str(&g)),
            status: ArtistStatus::from_db_str(&row.get::<_, String>("status")?),
            profile_photo: row.get("profile_photo")?,
            guarantee_krw: row
                .get::<_, Option<i64>>("guarantee_krw")?
                .and_then(|g| u64::try_from(g).ok()),
            wiki_summary: row.get("wiki_summary")?,
        };

        Ok(StoredArtist {
            id: row.get("id")?,
            profile,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn to_sql_value(value: FieldValue) -> Value {
        match value {
            FieldValue::Text(s) => Value::Text(s),
            FieldValue::Integer(i) => Value::Integer(i),
            FieldValue::Bool(b) => Value::Integer(b as i64),
            FieldValue::Date(d) => Value::Text(d.format(DATE_FORMAT).to_string()),
        }
    }

    fn filter_values(filter: Option<&ArtistFilter>) -> [Value; 4] {
        let text = |v: Option<String>| v.map(Value::Text).unwrap_or(Value::Null);
        match filter {
            None => [Value::Null, Value::Null, Value::Null, Value::Null],
            Some(f) => [
                text(f.text.as_deref().map(Self::like_pattern)),
                text(f.status.map(|s| s.to_db_str().to_string())),
                text(f.gender.map(|g| g.to_db_str().to_string())),
                text(f.nationality.clone()),
            ],
        }
    }

    /// `%text%` LIKE pattern with wildcards in the input escaped.
    fn like_pattern(text: &str) -> String {
        let mut pattern = String::with_capacity(text.len() + 2);
        pattern.push('%');
        for c in text.to_lowercase().chars() {
            if matches!(c, '%' | '_' | '\\') {
                pattern.push('\\');
            }
            pattern.push(c);
        }
        pattern.push('%');
        pattern
    }
}

/// Filter bindings: ?1 text pattern, ?2 status, ?3 gender, ?4 nationality.
const FILTER_CLAUSE: &str = "(?1 IS NULL \
     OR lower(name) LIKE ?1 ESCAPE '\\' \
     OR lower(coalesce(eng_name, '')) LIKE ?1 ESCAPE '\\' \
     OR lower(coalesce(genre, '')) LIKE ?1 ESCAPE '\\' \
     OR lower(coalesce(nationality, '')) LIKE ?1 ESCAPE '\\') \
     AND (?2 IS NULL OR status = ?2) \
     AND (?3 IS NULL OR gender = ?3) \
     AND (?4 IS NULL OR nationality = ?4)";

impl ArtistStore for SqliteArtistStore {
    fn find_by_normalized_name(&self, normalized_name: &str) -> Result<Vec<StoredArtist>, StoreError> {
        let conn = Self::lock(&self.read_conn)?;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM artists WHERE normalized_name = ?1 ORDER BY id",
            ARTIST_COLUMNS
        ))?;
        let artists = stmt
            .query_map(params![normalized_name], Self::row_to_stored_artist)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(artists)
    }

    fn get(&self, id: i64) -> Result<Option<StoredArtist>, StoreError> {
        let conn = Self::lock(&self.read_conn)?;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM artists WHERE id = ?1",
            ARTIST_COLUMNS
        ))?;
        Ok(stmt
            .query_row(params![id], Self::row_to_stored_artist)
            .optional()?)
    }

    fn list(&self, query: &ArtistQuery) -> Result<Vec<StoredArtist>, StoreError> {
        let conn = Self::lock(&self.read_conn)?;
        let limit: i64 = if query.limit == 0 {
            -1
        } else {
            query.limit as i64
        };
        let mut values = Self::filter_values(Some(&query.filter)).to_vec();
        values.push(Value::Integer(limit));
        values.push(Value::Integer(query.offset as i64));

        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM artists WHERE {} ORDER BY id LIMIT ?5 OFFSET ?6",
            ARTIST_COLUMNS, FILTER_CLAUSE
        ))?;
        let artists = stmt
            .query_map(params_from_iter(values), Self::row_to_stored_artist)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(artists)
    }

    fn count(&self, filter: Option<&ArtistFilter>) -> Result<usize, StoreError> {
        let conn = Self::lock(&self.read_conn)?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM artists WHERE {}", FILTER_CLAUSE),
            params_from_iter(Self::filter_values(filter)),
            |r| r.get(0),
        )?;
        Ok(count as usize)
    }

    fn insert_if_absent(&self, profile: &ArtistProfile) -> Result<i64, StoreError> {
        let normalized = normalize_name(&profile.name);
        let fields = profile.present_fields();

        let mut conn = Self::lock(&self.write_conn)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM artists WHERE normalized_name = ?1 LIMIT 1",
                params![normalized],
                |r| r.get(0),
            )
            .optional()?;
        if let Some(existing_id) = existing {
            debug!(
                "Refusing insert of '{}': artist {} has the same normalized name",
                profile.name, existing_id
            );
            return Err(StoreError::DuplicateName(profile.name.trim().to_string()));
        }

        let mut columns: Vec<&str> = Vec::with_capacity(fields.len() + 1);
        let mut values: Vec<Value> = Vec::with_capacity(fields.len() + 1);
        for (column, value) in fields {
            columns.push(column.column_name());
            values.push(Self::to_sql_value(value));
        }
        columns.push("normalized_name");
        values.push(Value::Text(normalized));

        let placeholders = (1..=values.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        tx.execute(
            &format!(
                "INSERT INTO artists ({}) VALUES ({})",
                columns.join(", "),
                placeholders
            ),
            params_from_iter(values),
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        info!("Inserted artist {} '{}'", id, profile.name);
        Ok(id)
    }

    fn update_partial(&self, id: i64, profile: &ArtistProfile) -> Result<(), StoreError> {
        let normalized = normalize_name(&profile.name);
        let fields = profile.present_fields();

        let mut conn = Self::lock(&self.write_conn)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current_normalized: String = tx
            .query_row(
                "SELECT normalized_name FROM artists WHERE id = ?1",
                params![id],
                |r| r.get(0),
            )
            .optional()?
            .ok_or(StoreError::NotFound(id))?;

        if current_normalized != normalized {
            let clash: Option<i64> = tx
                .query_row(
                    "SELECT id FROM artists WHERE normalized_name = ?1 AND id != ?2 LIMIT 1",
                    params![normalized, id],
                    |r| r.get(0),
                )
                .optional()?;
            if clash.is_some() {
                return Err(StoreError::DuplicateName(profile.name.trim().to_string()));
            }
        }

        let mut assignments: Vec<String> = Vec::with_capacity(fields.len() + 2);
        let mut values: Vec<Value> = Vec::with_capacity(fields.len() + 2);
        for (column, value) in fields {
            values.push(Self::to_sql_value(value));
            assignments.push(format!("{} = ?{}", column.column_name(), values.len()));
        }
        values.push(Value::Text(normalized));
        assignments.push(format!("normalized_name = ?{}", values.len()));
        assignments.push("updated_at = cast(strftime('%s','now') as int)".to_string());
        values.push(Value::Integer(id));

        tx.execute(
            &format!(
                "UPDATE artists SET {} WHERE id = ?{}",
                assignments.join(", "),
                values.len()
            ),
            params_from_iter(values),
        )?;
        tx.commit()?;

        info!("Updated artist {} '{}'", id, profile.name);
        Ok(())
    }
}
