//! Statement generator.
//!
//! Turns a resolved profile plus the existence decision into a reviewable
//! MySQL statement and an equivalent automation script. Values are kept as
//! typed bindings in a [`Statement`] and only rendered to literal SQL text at
//! the very end. Output is a pure function of the input.

mod escape;
mod script;

pub use escape::{quote_identifier, quote_literal};
pub use script::render_apply_script;

use crate::artist_store::{
    validate_profile, validate_target, ArtistProfile, FieldValue, ValidationError,
};
use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_TABLE: &str = "artists";

#[derive(Debug, Error)]
pub enum StatementError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Failed to serialize apply request: {0}")]
    Serialization(String),
}

/// Where rendered statements point and where the script sends its request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatementConfig {
    pub table: String,
    pub schema: Option<String>,
    pub api_base_url: String,
}

impl Default for StatementConfig {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE.to_string(),
            schema: None,
            api_base_url: "http://localhost:3001".to_string(),
        }
    }
}

impl StatementConfig {
    fn qualified_table(&self) -> String {
        match &self.schema {
            Some(schema) => format!(
                "{}.{}",
                quote_identifier(schema),
                quote_identifier(&self.table)
            ),
            None => quote_identifier(&self.table),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SqlValue {
    Text(String),
    Integer(i64),
}

impl SqlValue {
    fn render(&self) -> String {
        match self {
            SqlValue::Text(s) => quote_literal(s),
            SqlValue::Integer(i) => i.to_string(),
        }
    }
}

impl From<FieldValue> for SqlValue {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Text(s) => SqlValue::Text(s),
            FieldValue::Integer(i) => SqlValue::Integer(i),
            FieldValue::Bool(b) => SqlValue::Integer(b as i64),
            FieldValue::Date(d) => SqlValue::Text(d.format("%Y-%m-%d").to_string()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatementKind {
    Insert,
    Update { id: i64 },
}

/// A parameterized write against the artists table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Statement {
    pub kind: StatementKind,
    pub bindings: Vec<(&'static str, SqlValue)>,
}

impl Statement {
    pub fn for_profile(profile: &ArtistProfile, kind: StatementKind) -> Self {
        let bindings = profile
            .present_fields()
            .into_iter()
            .map(|(column, value)| (column.column_name(), SqlValue::from(value)))
            .collect();
        Self { kind, bindings }
    }

    /// Literal MySQL text, terminated by a semicolon.
    pub fn render(&self, config: &StatementConfig) -> String {
        let table = config.qualified_table();
        match self.kind {
            StatementKind::Insert => {
                let columns = self
                    .bindings
                    .iter()
                    .map(|(column, _)| quote_identifier(column))
                    .collect::<Vec<_>>()
                    .join(", ");
                let values = self
                    .bindings
                    .iter()
                    .map(|(_, value)| value.render())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("INSERT INTO {} ({}) VALUES ({});", table, columns, values)
            }
            StatementKind::Update { id } => {
                let assignments = self
                    .bindings
                    .iter()
                    .map(|(column, value)| {
                        format!("{} = {}", quote_identifier(column), value.render())
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                format!(
                    "UPDATE {} SET {} WHERE {} = {};",
                    table,
                    assignments,
                    quote_identifier("id"),
                    id
                )
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedArtifacts {
    pub sql_statement: String,
    pub automation_script: String,
}

/// Build both artifacts for `profile`.
///
/// `exists = true` requires `matched_id` and yields an UPDATE keyed by it;
/// otherwise an INSERT is produced and `matched_id` is ignored.
pub fn generate(
    profile: &ArtistProfile,
    exists: bool,
    matched_id: Option<i64>,
    config: &StatementConfig,
) -> Result<GeneratedArtifacts, StatementError> {
    let trimmed;
    let profile = if profile.name.trim().len() != profile.name.len() {
        trimmed = ArtistProfile {
            name: profile.name.trim().to_string(),
            ..profile.clone()
        };
        &trimmed
    } else {
        profile
    };

    validate_profile(profile)?;
    let kind = match validate_target(exists, matched_id)? {
        Some(id) => StatementKind::Update { id },
        None => StatementKind::Insert,
    };

    let sql_statement = Statement::for_profile(profile, kind).render(config);
    let automation_script = render_apply_script(profile, kind, config)?;

    Ok(GeneratedArtifacts {
        sql_statement,
        automation_script,
    })
}

#[cfg(test)]
mod tests {
    use super::escape::unquote_literal;
    use super::*;
    use crate::artist_store::{ArtistStatus, Gender};
    use chrono::NaiveDate;

    fn config() -> StatementConfig {
        StatementConfig {
            api_base_url: "http://admin.local:3001".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn new_artist_renders_insert_with_present_fields_only() {
        let artifacts = generate(&ArtistProfile::new("IU"), false, None, &config()).unwrap();
        assert_eq!(
            artifacts.sql_statement,
            "INSERT INTO `artists` (`name`, `is_korean`, `status`) VALUES ('IU', 0, 'ACTIVE');"
        );
    }

    #[test]
    fn existing_artist_renders_update_keyed_by_id() {
        let profile = ArtistProfile {
            height_cm: Some(162),
            is_korean: true,
            nationality: Some("KOREAN".to_string()),
            ..ArtistProfile::new("IU")
        };
        let artifacts = generate(&profile, true, Some(42), &config()).unwrap();
        assert_eq!(
            artifacts.sql_statement,
            "UPDATE `artists` SET `name` = 'IU', `height_cm` = 162, `nationality` = 'KOREAN', \
             `is_korean` = 1, `status` = 'ACTIVE' WHERE `id` = 42;"
        );
    }

    #[test]
    fn insert_and_update_share_the_field_set() {
        let profile = ArtistProfile {
            eng_name: Some("IU".to_string()),
            birth_date: NaiveDate::from_ymd_opt(1993, 5, 16),
            gender: Some(Gender::Woman),
            guarantee_krw: Some(100_000_000),
            ..ArtistProfile::new("아이유")
        };
        let insert = Statement::for_profile(&profile, StatementKind::Insert);
        let update = Statement::for_profile(&profile, StatementKind::Update { id: 7 });
        assert_eq!(insert.bindings, update.bindings);
        assert!(insert.render(&config()).contains("'1993-05-16'"));
        assert!(update.render(&config()).contains("`gender` = 'WOMAN'"));
        assert!(update.render(&config()).contains("`guarantee_krw` = 100000000"));
    }

    #[test]
    fn exists_without_matched_id_is_validation_error() {
        let err = generate(&ArtistProfile::new("IU"), true, None, &config()).unwrap_err();
        assert!(matches!(
            err,
            StatementError::Validation(ValidationError::MissingMatchedId)
        ));
    }

    #[test]
    fn empty_name_is_validation_error() {
        let err = generate(&ArtistProfile::new(" "), false, None, &config()).unwrap_err();
        assert!(matches!(err, StatementError::Validation(_)));
    }

    #[test]
    fn quotes_in_values_are_escaped() {
        let profile = ArtistProfile {
            debut_title: Some("It's me\\you".to_string()),
            ..ArtistProfile::new("O'Neil")
        };
        let sql = generate(&profile, false, None, &config())
            .unwrap()
            .sql_statement;
        assert!(sql.contains("'O''Neil'"));
        assert!(sql.contains(r"'It''s me\\you'"));
    }

    #[test]
    fn schema_qualified_table() {
        let config = StatementConfig {
            table: "Artists".to_string(),
            schema: Some("first_ent".to_string()),
            ..config()
        };
        let sql = generate(&ArtistProfile::new("IU"), true, Some(1), &config)
            .unwrap()
            .sql_statement;
        assert!(sql.starts_with("UPDATE `first_ent`.`Artists` SET "));
    }

    #[test]
    fn output_is_deterministic() {
        let profile = ArtistProfile {
            wiki_summary: Some("multi\nline".to_string()),
            ..ArtistProfile::new("IU")
        };
        let first = generate(&profile, true, Some(42), &config()).unwrap();
        let second = generate(&profile, true, Some(42), &config()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn padded_name_is_rendered_trimmed() {
        let sql = generate(&ArtistProfile::new("  IU "), false, None, &config())
            .unwrap()
            .sql_statement;
        assert!(sql.contains("VALUES ('IU', 0, 'ACTIVE');"));
    }

    /// Splits a rendered VALUES list on the commas outside literals.
    fn split_values(list: &str) -> Vec<&str> {
        let mut parts = Vec::new();
        let mut start = 0;
        let mut in_literal = false;
        let mut escaped = false;
        for (i, c) in list.char_indices() {
            if escaped {
                escaped = false;
                continue;
            }
            match c {
                '\\' if in_literal => escaped = true,
                '\'' => in_literal = !in_literal,
                ',' if !in_literal => {
                    parts.push(list[start..i].trim());
                    start = i + 1;
                }
                _ => {}
            }
        }
        parts.push(list[start..].trim());
        parts
    }

    /// Rebuilds a profile from the columns and literals of a rendered INSERT.
    fn profile_from_insert(sql: &str) -> ArtistProfile {
        let (head, tail) = sql.split_once(" VALUES (").unwrap();
        let columns: Vec<&str> = head
            .split_once(" (")
            .unwrap()
            .1
            .strip_suffix(')')
            .unwrap()
            .split(", ")
            .map(|c| c.trim_matches('`'))
            .collect();
        let values = split_values(tail.strip_suffix(");").unwrap());
        assert_eq!(columns.len(), values.len());

        let mut profile = ArtistProfile::default();
        for (column, raw) in columns.into_iter().zip(values) {
            let text = || unquote_literal(raw).unwrap();
            let date = || NaiveDate::parse_from_str(&text(), "%Y-%m-%d").unwrap();
            match column {
                "name" => profile.name = text(),
                "eng_name" => profile.eng_name = Some(text()),
                "birth_date" => profile.birth_date = Some(date()),
                "height_cm" => profile.height_cm = Some(raw.parse().unwrap()),
                "debut_date" => profile.debut_date = Some(date()),
                "debut_title" => profile.debut_title = Some(text()),
                "recent_activity_category" => profile.recent_activity_category = Some(text()),
                "recent_activity_name" => profile.recent_activity_name = Some(text()),
                "genre" => profile.genre = Some(text()),
                "current_agency_name" => profile.current_agency_name = Some(text()),
                "nationality" => profile.nationality = Some(text()),
                "is_korean" => profile.is_korean = raw == "1",
                "gender" => profile.gender = Gender::from_db_str(&text()),
                "status" => profile.status = ArtistStatus::from_db_str(&text()),
                "profile_photo" => profile.profile_photo = Some(text()),
                "guarantee_krw" => profile.guarantee_krw = Some(raw.parse().unwrap()),
                "wiki_summary" => profile.wiki_summary = Some(text()),
                other => panic!("unexpected column {other}"),
            }
        }
        profile
    }

    #[test]
    fn insert_literals_read_back_as_the_original_profile() {
        let profile = ArtistProfile {
            eng_name: Some("IU".to_string()),
            birth_date: NaiveDate::from_ymd_opt(1993, 5, 16),
            height_cm: Some(162),
            debut_date: NaiveDate::from_ymd_opt(2008, 9, 18),
            debut_title: Some("Lost Child, 'Mia'".to_string()),
            recent_activity_category: Some("드라마".to_string()),
            recent_activity_name: Some("폭싹 속았수다".to_string()),
            genre: Some("K-pop, ballad".to_string()),
            current_agency_name: Some("EDAM Entertainment".to_string()),
            nationality: Some("KOREAN".to_string()),
            is_korean: true,
            gender: Some(Gender::Woman),
            status: ArtistStatus::Active,
            profile_photo: Some("https://img.example/iu.jpg?w=1,h=2".to_string()),
            guarantee_krw: Some(150_000_000),
            wiki_summary: Some("it's a \\ test\nline".to_string()),
            ..ArtistProfile::new("아이유")
        };

        let sql = generate(&profile, false, None, &config())
            .unwrap()
            .sql_statement;
        assert_eq!(profile_from_insert(&sql), profile);
    }
}
