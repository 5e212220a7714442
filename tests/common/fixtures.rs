//! Fixture encyclopedia used in place of Wikipedia
//!
//! Serves a handful of canned pages and search hits, plus two names that
//! misbehave: one that is too slow and one that fails.

use super::constants::*;
use artist_registry_server::upstream::{
    ArticleSummary, SearchHit, SummaryProvider, UpstreamError, WebSearchProvider,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

pub struct FixtureEncyclopedia {
    pages: HashMap<String, ArticleSummary>,
    hits: HashMap<String, Vec<SearchHit>>,
}

fn page(title: &str, uri: &str, extract: &str, content: Option<&str>) -> ArticleSummary {
    ArticleSummary {
        title: title.to_string(),
        lang: "ko".to_string(),
        extract: extract.to_string(),
        content: content.map(str::to_string),
        page_uri: uri.to_string(),
        thumbnail: None,
        is_disambiguation: false,
    }
}

fn hit(title: &str, uri: &str, snippet: &str) -> SearchHit {
    SearchHit {
        title: title.to_string(),
        uri: uri.to_string(),
        snippet: snippet.to_string(),
        lang: "ko".to_string(),
    }
}

impl FixtureEncyclopedia {
    pub fn new() -> Self {
        let iu = ArticleSummary {
            thumbnail: Some("https://upload.wikimedia.test/iu.jpg".to_string()),
            ..page(
                IU_NAME,
                IU_PAGE_URI,
                "아이유(IU, 1993년 5월 16일 ~ )는 대한민국의 가수이자 배우이다.[1]",
                Some(
                    "본명: 이지은\n\
                     영어 이름: IU\n\
                     출생: 1993년 5월 16일\n\
                     신체: 161.8cm\n\
                     국적: 대한민국\n\
                     성별: 여성\n\
                     데뷔: 2008년 9월 18일\n\
                     데뷔곡: 미아\n\
                     장르: 발라드, 댄스\n\
                     소속사: EDAM엔터테인먼트\n",
                ),
            )
        };

        let disambiguation = ArticleSummary {
            is_disambiguation: true,
            ..page(
                AMBIGUOUS_PAGE_NAME,
                "https://ko.wikipedia.org/wiki/kim_min_ji",
                "김민지는 다음 사람을 가리킨다.",
                None,
            )
        };

        let minji = page(
            DISAMBIGUATED_TITLE,
            "https://ko.wikipedia.org/wiki/kim_min_ji_2006",
            "김민지(Minji, 2004년 5월 7일 ~ )는 대한민국의 가수로, 걸그룹 뉴진스의 멤버이다.",
            Some("국적: 대한민국\n성별: 여성\n소속사: ADOR\n"),
        );

        let mut hits = HashMap::new();
        hits.insert(
            IU_NAME.to_string(),
            vec![hit(IU_NAME, IU_PAGE_URI, "대한민국의 가수이자 배우")],
        );
        hits.insert(
            AMBIGUOUS_PAGE_NAME.to_string(),
            vec![
                hit(
                    "김민지 (정치인)",
                    "https://ko.wikipedia.org/wiki/kim_min_ji_politician",
                    "대한민국의 정치인",
                ),
                hit(
                    DISAMBIGUATED_TITLE,
                    &minji.page_uri,
                    "대한민국의 가수. 걸그룹 뉴진스의 멤버",
                ),
            ],
        );

        let pages = [iu, disambiguation, minji]
            .into_iter()
            .map(|p| (p.title.clone(), p))
            .collect();

        Self { pages, hits }
    }

    async fn misbehave(query: &str) -> Result<(), UpstreamError> {
        if query == SLOW_ARTIST {
            tokio::time::sleep(Duration::from_millis(SLOW_PROVIDER_DELAY_MS)).await;
        }
        if query == FAILING_ARTIST {
            return Err(UpstreamError::Api { status: 503 });
        }
        Ok(())
    }
}

#[async_trait]
impl WebSearchProvider for FixtureEncyclopedia {
    fn name(&self) -> &str {
        "fixture_search"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, UpstreamError> {
        Self::misbehave(query).await?;
        Ok(self
            .hits
            .get(query)
            .map(|hits| hits.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl SummaryProvider for FixtureEncyclopedia {
    fn name(&self) -> &str {
        "fixture_summary"
    }

    async fn summary(&self, title: &str) -> Result<Option<ArticleSummary>, UpstreamError> {
        Self::misbehave(title).await?;
        Ok(self.pages.get(title).cloned())
    }
}
