use anyhow::{bail, Result};
use rusqlite::{params, types::Type, Connection};

pub const DEFAULT_TIMESTAMP: &str = "(cast(strftime('%s','now') as int))";

/// Offset added to every schema version stored in `PRAGMA user_version`, so
/// that a database created by some other tool (user_version 0) is never
/// mistaken for one of ours.
pub const BASE_DB_VERSION: usize = 7000;

#[macro_export]
macro_rules! sqlite_column {
    ($name:expr, $sql_type:expr $(, $field:ident = $value:expr)*) => {
        {
            #[allow(unused_mut)]
            let mut column = Column {
                name: $name,
                sql_type: $sql_type,
                is_primary_key: false,
                non_null: false,
                default_value: None,
            };
            $(
                column.$field = $value;
            )*
            column
        }
    };
}

#[derive(Debug, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Integer,
    Real,
}

impl SqlType {
    fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
        }
    }

    fn from_sql(s: &str) -> Option<&'static SqlType> {
        match s {
            "TEXT" => Some(&SqlType::Text),
            "INTEGER" => Some(&SqlType::Integer),
            "REAL" => Some(&SqlType::Real),
            _ => None,
        }
    }
}

pub struct Column<'a, S: AsRef<str>> {
    pub name: S,
    pub sql_type: &'a SqlType,
    pub is_primary_key: bool,
    pub non_null: bool,
    pub default_value: Option<S>,
}

pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column<'static, &'static str>],
    /// (index name, indexed column)
    pub indices: &'static [(&'static str, &'static str)],
}

impl Table {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        let column_defs = self
            .columns
            .iter()
            .map(|column| {
                let mut def = format!("{} {}", column.name, column.sql_type.as_sql());
                if column.is_primary_key {
                    def.push_str(" PRIMARY KEY");
                }
                if column.non_null {
                    def.push_str(" NOT NULL");
                }
                if let Some(default_value) = column.default_value {
                    def.push_str(&format!(" DEFAULT {}", default_value));
                }
                def
            })
            .collect::<Vec<_>>()
            .join(", ");

        conn.execute(
            &format!("CREATE TABLE {} ({});", self.name, column_defs),
            params![],
        )?;

        for (index_name, column_name) in self.indices {
            conn.execute(
                &format!(
                    "CREATE INDEX {} ON {}({});",
                    index_name, self.name, column_name
                ),
                params![],
            )?;
        }
        Ok(())
    }
}

pub struct VersionedSchema {
    pub version: usize,
    pub tables: &'static [Table],
    pub migration: Option<fn(&Connection) -> Result<()>>,
}

fn strip_leading_and_trailing_parentheses<S: AsRef<str>>(s: S) -> String {
    let s = s.as_ref();
    if s.starts_with('(') && s.ends_with(')') {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}

impl VersionedSchema {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        for table in self.tables {
            table.create(conn)?;
        }
        conn.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + self.version),
            [],
        )?;
        Ok(())
    }

    /// Checks that every table of this schema exists with exactly the expected
    /// columns (name, type, nullability, default, primary key) and indices.
    pub fn validate(&self, conn: &Connection) -> Result<()> {
        for table in self.tables {
            let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", table.name))?;
            let actual_columns: Vec<Column<'_, String>> = stmt
                .query_map(params![], |row| {
                    let type_name = row.get::<_, String>(2)?;
                    let sql_type = SqlType::from_sql(&type_name).ok_or_else(|| {
                        rusqlite::Error::InvalidColumnType(2, type_name.clone(), Type::Text)
                    })?;
                    Ok(Column {
                        name: row.get::<_, String>(1)?,
                        sql_type,
                        non_null: row.get::<_, i32>(3)? == 1,
                        default_value: row.get::<_, Option<String>>(4)?,
                        is_primary_key: row.get::<_, i32>(5)? == 1,
                    })
                })?
                .collect::<Result<_, _>>()?;

            if actual_columns.len() != table.columns.len() {
                bail!(
                    "Table {} has {} columns, expected {}. Found: {}",
                    table.name,
                    actual_columns.len(),
                    table.columns.len(),
                    actual_columns
                        .iter()
                        .map(|c| c.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }

            for (actual, expected) in actual_columns.iter().zip(table.columns.iter()) {
                if actual.name != expected.name {
                    bail!(
                        "Table {} column name mismatch: expected {}, got {}",
                        table.name,
                        expected.name,
                        actual.name
                    );
                }
                if actual.sql_type != expected.sql_type {
                    bail!(
                        "Table {} column {} type mismatch: expected {:?}, got {:?}",
                        table.name,
                        expected.name,
                        expected.sql_type,
                        actual.sql_type
                    );
                }
                if actual.non_null != expected.non_null {
                    bail!(
                        "Table {} column {} non-null mismatch: expected {}, got {}",
                        table.name,
                        expected.name,
                        expected.non_null,
                        actual.non_null
                    );
                }
                // SQLite may report defaults wrapped in parentheses
                if actual
                    .default_value
                    .as_ref()
                    .map(strip_leading_and_trailing_parentheses)
                    != expected
                        .default_value
                        .map(strip_leading_and_trailing_parentheses)
                {
                    bail!(
                        "Table {} column {} default value mismatch: expected {:?}, got {:?}",
                        table.name,
                        expected.name,
                        expected.default_value,
                        actual.default_value
                    );
                }
                if actual.is_primary_key != expected.is_primary_key {
                    bail!(
                        "Table {} column {} primary key mismatch: expected {}, got {}",
                        table.name,
                        expected.name,
                        expected.is_primary_key,
                        actual.is_primary_key
                    );
                }
            }

            for (index_name, _column) in table.indices {
                let index_exists: bool = conn
                    .query_row(
                        "SELECT 1 FROM sqlite_master WHERE type='index' AND name=?1 AND tbl_name=?2",
                        params![index_name, table.name],
                        |_| Ok(true),
                    )
                    .unwrap_or(false);

                if !index_exists {
                    bail!("Table {} is missing index '{}'", table.name, index_name);
                }
            }
        }
        Ok(())
    }
}
