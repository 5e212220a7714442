//! Field extraction from encyclopedia text.
//!
//! Pages are read as plain text. Infobox-style fields show up as
//! `label: value` or `label = value` lines, which is what the labeled
//! patterns below look for.

use super::normalize::{
    clean_refs, detect_status, normalize_nationality, parse_date, parse_gender, parse_height,
};
use crate::artist_store::ArtistProfile;
use crate::upstream::ArticleSummary;
use lazy_static::lazy_static;
use regex::Regex;

fn labeled(labels: &str) -> Regex {
    let pattern = format!(r"(?im)^[ \t]*(?:{})[ \t]*[:=][ \t]*(.+?)[ \t]*$", labels);
    Regex::new(&pattern).expect("valid labeled field regex")
}

lazy_static! {
    static ref ENG_NAME: Regex = labeled("영어 이름|english name");
    static ref BIRTH: Regex = labeled("출생일|생년월일|출생|born|birth date");
    static ref DEBUT: Regex = labeled("데뷔일|데뷔|debut");
    static ref DEBUT_TITLE: Regex = labeled("데뷔곡|debut single|debut song");
    static ref GENRE: Regex = labeled("장르|genres?");
    static ref AGENCY: Regex = labeled("소속사|기획사|labels?|agency");
    static ref NATIONALITY: Regex = labeled("국적|nationality");
    static ref GENDER: Regex = labeled("성별|gender");
    static ref HEIGHT: Regex = labeled("신체|신장|키|height");
    static ref LEAD_PARENTHETICAL: Regex = Regex::new(r"^[^(\n]*\(([^)\n]*)\)").expect("valid regex");
    static ref ENGLISH_BORN: Regex = Regex::new(r"\bborn\s+([^);]+)").expect("valid regex");
    static ref TRAILING_QUALIFIER: Regex = Regex::new(r"\s*\([^)]*\)\s*$").expect("valid regex");
}

/// Cleaned value of the first line matching `pattern`.
fn field(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .map(|c| clean_refs(&c[1]))
        .filter(|v| !v.is_empty())
}

/// First comma-separated entry of a labeled value.
fn first_entry(value: String) -> Option<String> {
    value
        .split([',', '，', '、'])
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

fn is_latin_name(value: &str) -> bool {
    value.chars().any(|c| c.is_ascii_alphabetic())
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || " .-'&".contains(c))
}

fn english_name(query: &str, summary: &ArticleSummary, text: &str) -> Option<String> {
    if let Some(labeled) = field(&ENG_NAME, text) {
        return Some(labeled);
    }

    // `아이유(IU, 1993년 5월 16일 ~ )는 ...`
    let from_parenthetical = LEAD_PARENTHETICAL
        .captures(&summary.extract)
        .and_then(|c| c[1].split([',', ';']).next().map(clean_refs))
        .filter(|s| is_latin_name(s));
    if from_parenthetical.is_some() {
        return from_parenthetical;
    }

    if summary.lang == "en" {
        let title = TRAILING_QUALIFIER.replace(&summary.title, "").trim().to_string();
        if !title.is_empty() && title.to_lowercase() != query.trim().to_lowercase() {
            return Some(title);
        }
    }
    None
}

/// Birth date from the labeled field, else from the lead section
/// (`born May 16, 1993` or a `1993년 5월 16일 ~` range in the first
/// parenthetical).
fn birth_date(summary: &ArticleSummary, text: &str) -> Option<chrono::NaiveDate> {
    if let Some(date) = field(&BIRTH, text).and_then(|v| parse_date(&v)) {
        return Some(date);
    }
    if let Some(date) = ENGLISH_BORN
        .captures(&summary.extract)
        .and_then(|c| parse_date(&c[1]))
    {
        return Some(date);
    }
    LEAD_PARENTHETICAL
        .captures(&summary.extract)
        .filter(|c| c[1].contains('~'))
        .and_then(|c| parse_date(&c[1]))
}

/// Build a profile for `query` from a resolved page.
///
/// `name` is always the query as typed (trimmed).
pub fn extract_profile(query: &str, summary: &ArticleSummary) -> ArtistProfile {
    let text = summary.combined_text();

    let (nationality, is_korean) = normalize_nationality(field(&NATIONALITY, &text).as_deref());
    let height_cm = field(&HEIGHT, &text)
        .and_then(|v| parse_height(&v))
        .or_else(|| parse_height(&text));
    let wiki_summary = Some(clean_refs(&summary.extract)).filter(|s| !s.is_empty());

    ArtistProfile {
        name: query.trim().to_string(),
        eng_name: english_name(query, summary, &text),
        birth_date: birth_date(summary, &text),
        height_cm,
        debut_date: field(&DEBUT, &text).and_then(|v| parse_date(&v)),
        debut_title: field(&DEBUT_TITLE, &text),
        recent_activity_category: None,
        recent_activity_name: None,
        genre: field(&GENRE, &text).and_then(first_entry),
        current_agency_name: field(&AGENCY, &text).and_then(first_entry),
        nationality,
        is_korean,
        gender: field(&GENDER, &text).map(|v| parse_gender(&v)),
        status: detect_status(&summary.extract),
        profile_photo: summary.thumbnail.clone(),
        guarantee_krw: None,
        wiki_summary,
    }
}
