use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    Post,
    Report,
}

/// One row of the search popup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub kind: SearchKind,
    pub title: String,
    pub snippet: String,
    pub target_url: String,
    pub date: Option<String>,
    pub facet_label: Option<String>,
}

/// Published post projection returned by a title/excerpt search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostSearchHit {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub published_at: Option<i64>,
    pub category_name: Option<String>,
}

/// Published report projection returned by a title search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSearchHit {
    pub id: String,
    pub title: String,
    pub content: String,
    pub session: Option<String>,
    pub report_date: String,
}
