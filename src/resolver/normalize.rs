//! Value normalization for extracted fields.

use crate::artist_store::{ArtistStatus, Gender};
use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

pub const KOREAN_NATIONALITY: &str = "KOREAN";

const KOREAN_MARKERS: &[&str] = &["대한민국", "한국", "south korea", "korea, republic of", "korean"];
const NON_KOREAN_MARKERS: &[&str] = &["north korea", "북한", "조선민주주의인민공화국"];

lazy_static! {
    static ref REFERENCE_MARKER: Regex = Regex::new(r"\[\d+\]").expect("valid regex");
    static ref HEIGHT: Regex = Regex::new(r"(?i)(\d+)(?:\.\d+)?\s*cm").expect("valid regex");
    static ref DATE_ISO: Regex =
        Regex::new(r"(\d{4})-(\d{1,2})-(\d{1,2})").expect("valid regex");
    static ref DATE_DOTTED: Regex =
        Regex::new(r"(\d{4})\.\s*(\d{1,2})\.\s*(\d{1,2})").expect("valid regex");
    static ref DATE_KOREAN: Regex =
        Regex::new(r"(\d{4})\s*년\s*(\d{1,2})\s*월\s*(\d{1,2})\s*일").expect("valid regex");
    static ref DATE_ENGLISH: Regex = Regex::new(
        r"(?i)\b(January|February|March|April|May|June|July|August|September|October|November|December)\s+(\d{1,2}),?\s+(\d{4})"
    )
    .expect("valid regex");
}

/// Remove `[n]` citation markers and trim.
pub fn clean_refs(value: &str) -> String {
    REFERENCE_MARKER.replace_all(value, "").trim().to_string()
}

/// Returns `(nationality, is_korean)`.
///
/// Korean-locale markers collapse to `KOREAN`; anything else is kept as
/// written.
pub fn normalize_nationality(value: Option<&str>) -> (Option<String>, bool) {
    let Some(cleaned) = value.map(clean_refs).filter(|v| !v.is_empty()) else {
        return (None, false);
    };

    let lowered = cleaned.to_lowercase();
    let is_korean = KOREAN_MARKERS.iter().any(|m| lowered.contains(m))
        && !NON_KOREAN_MARKERS.iter().any(|m| lowered.contains(m));

    if is_korean {
        (Some(KOREAN_NATIONALITY.to_string()), true)
    } else {
        (Some(cleaned), false)
    }
}

/// Leading integer of the first `<number>cm` token. Zero and values that do
/// not fit a `u16` are dropped.
pub fn parse_height(text: &str) -> Option<u16> {
    let captures = HEIGHT.captures(text)?;
    captures[1]
        .parse::<u16>()
        .ok()
        .filter(|height| *height > 0)
}

fn month_number(name: &str) -> Option<u32> {
    let month = match name.to_ascii_lowercase().as_str() {
        "january" => 1,
        "february" => 2,
        "march" => 3,
        "april" => 4,
        "may" => 5,
        "june" => 6,
        "july" => 7,
        "august" => 8,
        "september" => 9,
        "october" => 10,
        "november" => 11,
        "december" => 12,
        _ => return None,
    };
    Some(month)
}

/// Earliest full calendar date in `text`.
///
/// Accepts `YYYY-MM-DD`, `YYYY.MM.DD`, `YYYY년 M월 D일` and `Month D, YYYY`.
/// Year-only and year-month values are never completed.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let mut found: Vec<(usize, Option<NaiveDate>)> = Vec::new();

    for pattern in [&*DATE_ISO, &*DATE_DOTTED, &*DATE_KOREAN] {
        if let Some(c) = pattern.captures(text) {
            let date = match (c[1].parse(), c[2].parse(), c[3].parse()) {
                (Ok(y), Ok(m), Ok(d)) => NaiveDate::from_ymd_opt(y, m, d),
                _ => None,
            };
            found.push((c.get(0).map(|m| m.start()).unwrap_or(0), date));
        }
    }

    if let Some(c) = DATE_ENGLISH.captures(text) {
        let date = match (month_number(&c[1]), c[2].parse(), c[3].parse()) {
            (Some(m), Ok(d), Ok(y)) => NaiveDate::from_ymd_opt(y, m, d),
            _ => None,
        };
        found.push((c.get(0).map(|m| m.start()).unwrap_or(0), date));
    }

    found.sort_by_key(|(start, _)| *start);
    found.into_iter().find_map(|(_, date)| date)
}

/// Activity status stated in the text, `ACTIVE` when nothing says otherwise.
pub fn detect_status(text: &str) -> ArtistStatus {
    let lowered = text.to_lowercase();
    let has = |markers: &[&str]| markers.iter().any(|m| lowered.contains(m));

    if has(&["은퇴", "retired"]) {
        ArtistStatus::Retired
    } else if has(&["해체", "disbanded"]) {
        ArtistStatus::Inactive
    } else if has(&["활동 중단", "활동중단", "hiatus"]) {
        ArtistStatus::Paused
    } else {
        ArtistStatus::Active
    }
}

/// Gender from a labeled value; unmapped values become `NA`.
pub fn parse_gender(value: &str) -> Gender {
    let lowered = value.to_lowercase();
    let has = |markers: &[&str]| markers.iter().any(|m| lowered.contains(m));

    // female/woman before male/man: the latter are substrings
    if has(&["여성", "여자", "female", "woman"]) {
        Gender::Woman
    } else if has(&["남성", "남자", "male", "man"]) {
        Gender::Men
    } else {
        Gender::Na
    }
}
