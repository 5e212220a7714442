use serde::{Deserialize, Serialize};

/// One ranked result of a web search.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub uri: String,
    /// Plain-text snippet, markup stripped.
    pub snippet: String,
    pub lang: String,
}

/// Biography summary of a single encyclopedia page.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub title: String,
    pub lang: String,
    /// Lead section as plain text.
    pub extract: String,
    /// Full page as plain text, when the provider could fetch it.
    pub content: Option<String>,
    pub page_uri: String,
    pub thumbnail: Option<String>,
    pub is_disambiguation: bool,
}

impl ArticleSummary {
    /// Lead section followed by the full page text.
    pub fn combined_text(&self) -> String {
        match &self.content {
            Some(content) if !content.is_empty() => format!("{}\n{}", self.extract, content),
            _ => self.extract.clone(),
        }
    }
}
