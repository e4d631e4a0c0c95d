pub mod controller;

pub use controller::{Direction, SearchController};

use chrono::DateTime;
use regex::Regex;
use std::sync::LazyLock;

use crate::models::{PostSearchHit, ReportSearchHit, SearchKind, SearchResult};

/// Characters of report body shown under a report hit
pub const REPORT_SNIPPET_CHARS: usize = 100;

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

/// Strip markup and keep the first `max_chars` characters
pub fn plain_snippet(html: &str, max_chars: usize) -> String {
    HTML_TAG.replace_all(html, "").chars().take(max_chars).collect()
}

pub fn post_result(hit: &PostSearchHit) -> SearchResult {
    SearchResult {
        id: hit.id.clone(),
        kind: SearchKind::Post,
        title: hit.title.clone(),
        snippet: hit.excerpt.clone().unwrap_or_default(),
        target_url: format!("/posts/{}", hit.slug),
        date: hit
            .published_at
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .map(|dt| dt.to_rfc3339()),
        facet_label: hit.category_name.clone(),
    }
}

pub fn report_result(hit: &ReportSearchHit) -> SearchResult {
    SearchResult {
        id: hit.id.clone(),
        kind: SearchKind::Report,
        title: hit.title.clone(),
        snippet: plain_snippet(&hit.content, REPORT_SNIPPET_CHARS),
        target_url: format!("/trading-reports/{}", hit.id),
        date: Some(hit.report_date.clone()),
        facet_label: hit.session.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_snippet_strips_tags() {
        assert_eq!(plain_snippet("<p>Giá <b>vàng</b> tăng</p>", 100), "Giá vàng tăng");
    }

    #[test]
    fn test_plain_snippet_counts_characters() {
        let content = "ệ".repeat(150);
        assert_eq!(plain_snippet(&content, REPORT_SNIPPET_CHARS).chars().count(), 100);
    }

    #[test]
    fn test_post_result() {
        let hit = PostSearchHit {
            id: "POST-1".to_string(),
            title: "Sách Tâm Lý".to_string(),
            slug: "sach-tam-ly".to_string(),
            excerpt: None,
            published_at: Some(1_709_251_200),
            category_name: Some("Sách".to_string()),
        };
        let result = post_result(&hit);
        assert_eq!(result.kind, SearchKind::Post);
        assert_eq!(result.target_url, "/posts/sach-tam-ly");
        assert_eq!(result.snippet, "");
        assert_eq!(result.date.as_deref(), Some("2024-03-01T00:00:00+00:00"));
        assert_eq!(result.facet_label.as_deref(), Some("Sách"));
    }

    #[test]
    fn test_report_result() {
        let hit = ReportSearchHit {
            id: "REPORT-1".to_string(),
            title: "Phiên Á".to_string(),
            content: "<h2>Tổng quan</h2><p>BTC đi ngang</p>".to_string(),
            session: Some("SS1".to_string()),
            report_date: "2024-03-01".to_string(),
        };
        let result = report_result(&hit);
        assert_eq!(result.target_url, "/trading-reports/REPORT-1");
        assert_eq!(result.snippet, "Tổng quanBTC đi ngang");
        assert_eq!(result.date.as_deref(), Some("2024-03-01"));
        assert_eq!(result.facet_label.as_deref(), Some("SS1"));
    }
}
