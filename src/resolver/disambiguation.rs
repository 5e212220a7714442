//! Candidate selection when a name lands on a disambiguation page.

use crate::upstream::SearchHit;

const ENTERTAINMENT_KEYWORDS: &[&str] = &[
    "배우", "가수", "모델", "방송인", "아이돌", "멤버", "그룹", "엔터테인먼트", "연기자",
    "예술가", "뮤지컬", "아나운서", "코미디언", "코메디언", "인플루언서", "래퍼",
    "actor", "actress", "singer", "model", "entertainer", "idol", "member", "group",
    "band", "rapper", "artist", "musical",
];

const EXCLUDED_KEYWORDS: &[&str] = &[
    "정치인", "기업인", "감독", "선수", "학자", "교수", "politician", "footballer",
    "baseball player", "businessman", "executive", "director", "player", "scholar",
    "professor", "athlete", "cartoonist",
];

const DISAMBIGUATION_TITLE_MARKERS: &[&str] = &["동음이의", "disambiguation"];

/// True when the text reads like an entertainer and not like one of the
/// excluded professions.
pub fn is_entertainment_context(text: &str) -> bool {
    let lowered = text.to_lowercase();
    ENTERTAINMENT_KEYWORDS.iter().any(|k| lowered.contains(k))
        && !EXCLUDED_KEYWORDS.iter().any(|k| lowered.contains(k))
}

/// First hit, in rank order, that looks like an entertainer.
///
/// `skip_title` is the disambiguation page itself.
pub fn pick_candidate<'a>(hits: &'a [SearchHit], skip_title: &str) -> Option<&'a SearchHit> {
    hits.iter().find(|hit| {
        let title = hit.title.to_lowercase();
        hit.title != skip_title
            && !DISAMBIGUATION_TITLE_MARKERS.iter().any(|m| title.contains(m))
            && is_entertainment_context(&format!("{} {}", hit.title, hit.snippet))
    })
}
