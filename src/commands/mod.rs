pub mod categories;
pub mod posts;
pub mod reports;
pub mod search;
pub mod site;
pub mod stats;
pub mod tags;
pub mod trades;

pub use stats::*;

use chrono::Utc;

use crate::error::AppError;

/// Row id shaped `PREFIX-<millis>-<uuid>`
pub(crate) fn new_id(prefix: &str) -> String {
    format!("{}-{}-{}", prefix, Utc::now().timestamp_millis(), uuid::Uuid::new_v4())
}

pub(crate) fn now() -> i64 {
    Utc::now().timestamp()
}

/// Lower-cased `%term%` for a `unicode_lower(col) LIKE ? ESCAPE '\'` clause,
/// with wildcards in `term` escaped
pub(crate) fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.trim().to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// 1-based page number to a row offset
pub(crate) fn page_offset(page: u32, page_size: u32) -> i64 {
    (page.max(1) as i64 - 1) * page_size as i64
}

pub(crate) fn validation(result: std::result::Result<(), String>) -> Result<(), AppError> {
    result.map_err(AppError::Validation)
}

/// Treat an empty or whitespace-only search box as no filter
pub(crate) fn search_term(search: &Option<String>) -> Option<&str> {
    search.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
