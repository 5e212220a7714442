//! Artist models shared by the resolver, the statement generator and the store.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// =============================================================================
// Enumerations
// =============================================================================

/// Gender classification as stored in the artists table.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Gender {
    Woman,
    Men,
    Na,
    Extra,
    Foreign,
}

impl Gender {
    /// Convert from database string representation
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "WOMAN" => Some(Gender::Woman),
            "MEN" => Some(Gender::Men),
            "NA" => Some(Gender::Na),
            "EXTRA" => Some(Gender::Extra),
            "FOREIGN" => Some(Gender::Foreign),
            _ => None,
        }
    }

    /// Convert to database string representation
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Gender::Woman => "WOMAN",
            Gender::Men => "MEN",
            Gender::Na => "NA",
            Gender::Extra => "EXTRA",
            Gender::Foreign => "FOREIGN",
        }
    }
}

/// Activity status of an artist.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ArtistStatus {
    #[default]
    Active,
    Inactive,
    Paused,
    Retired,
    Unknown,
}

impl ArtistStatus {
    /// Convert from database string representation
    pub fn from_db_str(s: &str) -> Self {
        match s {
            "ACTIVE" => ArtistStatus::Active,
            "INACTIVE" => ArtistStatus::Inactive,
            "PAUSED" => ArtistStatus::Paused,
            "RETIRED" => ArtistStatus::Retired,
            _ => ArtistStatus::Unknown,
        }
    }

    /// Convert to database string representation
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ArtistStatus::Active => "ACTIVE",
            ArtistStatus::Inactive => "INACTIVE",
            ArtistStatus::Paused => "PAUSED",
            ArtistStatus::Retired => "RETIRED",
            ArtistStatus::Unknown => "UNKNOWN",
        }
    }
}

// =============================================================================
// Columns
// =============================================================================

/// Persisted artist columns, in canonical order.
///
/// Every statement and every store write lists columns in this order.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ArtistColumn {
    Name,
    EngName,
    BirthDate,
    HeightCm,
    DebutDate,
    DebutTitle,
    RecentActivityCategory,
    RecentActivityName,
    Genre,
    CurrentAgencyName,
    Nationality,
    IsKorean,
    Gender,
    Status,
    ProfilePhoto,
    GuaranteeKrw,
    WikiSummary,
}

impl ArtistColumn {
    pub fn column_name(&self) -> &'static str {
        match self {
            ArtistColumn::Name => "name",
            ArtistColumn::EngName => "eng_name",
            ArtistColumn::BirthDate => "birth_date",
            ArtistColumn::HeightCm => "height_cm",
            ArtistColumn::DebutDate => "debut_date",
            ArtistColumn::DebutTitle => "debut_title",
            ArtistColumn::RecentActivityCategory => "recent_activity_category",
            ArtistColumn::RecentActivityName => "recent_activity_name",
            ArtistColumn::Genre => "genre",
            ArtistColumn::CurrentAgencyName => "current_agency_name",
            ArtistColumn::Nationality => "nationality",
            ArtistColumn::IsKorean => "is_korean",
            ArtistColumn::Gender => "gender",
            ArtistColumn::Status => "status",
            ArtistColumn::ProfilePhoto => "profile_photo",
            ArtistColumn::GuaranteeKrw => "guarantee_krw",
            ArtistColumn::WikiSummary => "wiki_summary",
        }
    }
}

/// A typed column value, independent of any SQL dialect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Bool(bool),
    Date(NaiveDate),
}

// =============================================================================
// Core Entities
// =============================================================================

/// Canonical artist record produced by the resolver and consumed by the
/// statement generator and the apply path.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistProfile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eng_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_cm: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debut_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debut_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_activity_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_activity_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_agency_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    #[serde(default)]
    pub is_korean: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub status: ArtistStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guarantee_krw: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wiki_summary: Option<String>,
}

impl ArtistProfile {
    /// A profile carrying only a name and the defaults.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Returns the non-absent fields in canonical column order.
    ///
    /// `name`, `is_korean` and `status` are always present.
    pub fn present_fields(&self) -> Vec<(ArtistColumn, FieldValue)> {
        let text = |v: &Option<String>| v.as_ref().map(|s| FieldValue::Text(s.clone()));

        let candidates = [
            (ArtistColumn::Name, Some(FieldValue::Text(self.name.clone()))),
            (ArtistColumn::EngName, text(&self.eng_name)),
            (ArtistColumn::BirthDate, self.birth_date.map(FieldValue::Date)),
            (
                ArtistColumn::HeightCm,
                self.height_cm.map(|h| FieldValue::Integer(h as i64)),
            ),
            (ArtistColumn::DebutDate, self.debut_date.map(FieldValue::Date)),
            (ArtistColumn::DebutTitle, text(&self.debut_title)),
            (
                ArtistColumn::RecentActivityCategory,
                text(&self.recent_activity_category),
            ),
            (
                ArtistColumn::RecentActivityName,
                text(&self.recent_activity_name),
            ),
            (ArtistColumn::Genre, text(&self.genre)),
            (ArtistColumn::CurrentAgencyName, text(&self.current_agency_name)),
            (ArtistColumn::Nationality, text(&self.nationality)),
            (ArtistColumn::IsKorean, Some(FieldValue::Bool(self.is_korean))),
            (
                ArtistColumn::Gender,
                self.gender
                    .map(|g| FieldValue::Text(g.to_db_str().to_string())),
            ),
            (
                ArtistColumn::Status,
                Some(FieldValue::Text(self.status.to_db_str().to_string())),
            ),
            (ArtistColumn::ProfilePhoto, text(&self.profile_photo)),
            // Validation caps guarantee_krw at i64::MAX before anything is written
            (
                ArtistColumn::GuaranteeKrw,
                self.guarantee_krw
                    .map(|g| FieldValue::Integer(i64::try_from(g).unwrap_or(i64::MAX))),
            ),
            (ArtistColumn::WikiSummary, text(&self.wiki_summary)),
        ];

        candidates
            .into_iter()
            .filter_map(|(column, value)| value.map(|v| (column, v)))
            .collect()
    }
}

/// An artist row as persisted by the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredArtist {
    pub id: i64,
    #[serde(flatten)]
    pub profile: ArtistProfile,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Which stored artists to list or count. Absent fields match everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArtistFilter {
    /// Case-insensitive substring matched against name, genre and nationality.
    pub text: Option<String>,
    pub status: Option<ArtistStatus>,
    pub gender: Option<Gender>,
    /// Exact match.
    pub nationality: Option<String>,
}

/// Filter and paging for listing stored artists.
#[derive(Clone, Debug, Default)]
pub struct ArtistQuery {
    pub filter: ArtistFilter,
    pub limit: usize,
    pub offset: usize,
}
