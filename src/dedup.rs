//! Existence check: decides whether a resolved artist is already stored.

use crate::artist_store::{ArtistStore, StoreError, StoredArtist};

/// Canonical form used for name equality: Unicode lowercase, trimmed, with
/// internal whitespace runs collapsed to a single space.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Which fields identify an artist.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IdentityKey {
    #[default]
    Name,
    /// Name plus agency. Records without an agency still match on name alone.
    NameAndAgency,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExistenceCheck {
    New,
    Existing { id: i64 },
    Ambiguous { ids: Vec<i64> },
}

impl ExistenceCheck {
    pub fn matched_id(&self) -> Option<i64> {
        match self {
            ExistenceCheck::Existing { id } => Some(*id),
            _ => None,
        }
    }
}

/// Stored artists sharing the normalized form of `name`.
pub fn lookup_candidates(
    store: &dyn ArtistStore,
    name: &str,
) -> Result<Vec<StoredArtist>, StoreError> {
    let normalized = normalize_name(name);
    if normalized.is_empty() {
        return Ok(Vec::new());
    }
    store.find_by_normalized_name(&normalized)
}

/// Decide the outcome from name candidates. Never picks one of several.
pub fn classify(
    mut candidates: Vec<StoredArtist>,
    agency: Option<&str>,
    key: IdentityKey,
) -> ExistenceCheck {
    if key == IdentityKey::NameAndAgency {
        if let Some(agency) = agency.map(normalize_name).filter(|a| !a.is_empty()) {
            candidates.retain(|artist| {
                artist
                    .profile
                    .current_agency_name
                    .as_deref()
                    .map(|a| normalize_name(a) == agency)
                    .unwrap_or(true)
            });
        }
    }

    match candidates.as_slice() {
        [] => ExistenceCheck::New,
        [single] => ExistenceCheck::Existing { id: single.id },
        many => ExistenceCheck::Ambiguous {
            ids: many.iter().map(|a| a.id).collect(),
        },
    }
}

pub fn check_existence(
    store: &dyn ArtistStore,
    name: &str,
    agency: Option<&str>,
    key: IdentityKey,
) -> Result<ExistenceCheck, StoreError> {
    let candidates = lookup_candidates(store, name)?;
    Ok(classify(candidates, agency, key))
}
