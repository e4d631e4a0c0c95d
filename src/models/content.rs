use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::slug::is_valid_slug;

/// Draft/published lifecycle shared by posts and trading reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishStatus {
    Draft,
    Published,
}

impl PublishStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublishStatus::Draft => "draft",
            PublishStatus::Published => "published",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            PublishStatus::Draft => PublishStatus::Published,
            PublishStatus::Published => PublishStatus::Draft,
        }
    }
}

impl fmt::Display for PublishStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PublishStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PublishStatus::Draft),
            "published" => Ok(PublishStatus::Published),
            other => Err(format!("unknown status: {}", other)),
        }
    }
}

impl ToSql for PublishStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for PublishStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub post_count: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryInput {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagInput {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub category_id: Option<String>,
    pub category_name: Option<String>,
    pub author_name: Option<String>,
    pub status: PublishStatus,
    pub published_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostInput {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub content: String,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub category_id: Option<String>,
    pub author_name: Option<String>,
    #[serde(default)]
    pub tag_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostFilters {
    pub status: Option<PublishStatus>,
    pub category_id: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingReport {
    pub id: String,
    pub title: String,
    pub content: String,
    pub session: Option<String>,
    pub report_date: String,
    pub status: PublishStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportInput {
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub session: Option<String>,
    pub report_date: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportFilters {
    pub status: Option<PublishStatus>,
    pub session: Option<String>,
    pub search: Option<String>,
}

/// One page of a public listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> i64 {
        if self.page_size == 0 {
            return 0;
        }
        let size = self.page_size as i64;
        (self.total + size - 1) / size
    }
}

fn require_name(label: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is required", label));
    }
    Ok(())
}

fn require_slug(slug: &str) -> Result<(), String> {
    if !is_valid_slug(slug) {
        return Err(format!("invalid slug: {:?}", slug));
    }
    Ok(())
}

impl CategoryInput {
    pub fn validate(&self) -> Result<(), String> {
        require_name("name", &self.name)?;
        require_slug(&self.slug)
    }
}

impl TagInput {
    pub fn validate(&self) -> Result<(), String> {
        require_name("name", &self.name)?;
        require_slug(&self.slug)
    }
}

impl PostInput {
    pub fn validate(&self) -> Result<(), String> {
        require_name("title", &self.title)?;
        require_slug(&self.slug)
    }
}

impl ReportInput {
    pub fn validate(&self) -> Result<(), String> {
        require_name("title", &self.title)?;
        chrono::NaiveDate::parse_from_str(&self.report_date, "%Y-%m-%d")
            .map_err(|_| format!("report date must be YYYY-MM-DD, got {:?}", self.report_date))?;
        Ok(())
    }
}
