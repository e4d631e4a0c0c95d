//! Narrow data-access interfaces, one per entity.
//!
//! Each trait exposes only the query shapes the blog and admin screens use.
//! `Database` implements all of them over SQLite (see `commands`); any other
//! store can be plugged in behind the same traits.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    AdminOverview, Category, CategoryInput, Page, Post, PostFilters, PostInput, PostSearchHit,
    PublishStatus, ReportFilters, ReportInput, ReportSearchHit, SitemapEntry, Tag, TagInput, Trade,
    TradeFilters, TradeInput, TradingReport,
};

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn list_posts(&self, filters: PostFilters) -> Result<Vec<Post>>;
    async fn list_published_posts(
        &self,
        page: u32,
        page_size: u32,
        category_id: Option<String>,
    ) -> Result<Page<Post>>;
    async fn get_post(&self, id: &str) -> Result<Post>;
    async fn get_published_post_by_slug(&self, slug: &str) -> Result<Post>;
    async fn related_posts(&self, post: &Post, limit: u32) -> Result<Vec<Post>>;
    async fn save_post(&self, id: Option<String>, input: PostInput, status: PublishStatus) -> Result<Post>;
    async fn delete_post(&self, id: &str) -> Result<()>;
    async fn toggle_post_status(&self, id: &str) -> Result<Post>;
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<Category>>;
    async fn save_category(&self, id: Option<String>, input: CategoryInput) -> Result<Category>;
    async fn delete_category(&self, id: &str) -> Result<()>;
}

#[async_trait]
pub trait TagRepository: Send + Sync {
    async fn list_tags(&self) -> Result<Vec<Tag>>;
    async fn save_tag(&self, id: Option<String>, input: TagInput) -> Result<Tag>;
    async fn delete_tag(&self, id: &str) -> Result<()>;
}

#[async_trait]
pub trait ReportRepository: Send + Sync {
    async fn list_reports(&self, filters: ReportFilters) -> Result<Vec<TradingReport>>;
    async fn list_published_reports(
        &self,
        page: u32,
        page_size: u32,
        session: Option<String>,
    ) -> Result<Page<TradingReport>>;
    async fn get_report(&self, id: &str) -> Result<TradingReport>;
    async fn get_published_report(&self, id: &str) -> Result<TradingReport>;
    async fn save_report(
        &self,
        id: Option<String>,
        input: ReportInput,
        status: PublishStatus,
    ) -> Result<TradingReport>;
    async fn delete_report(&self, id: &str) -> Result<()>;
    async fn toggle_report_status(&self, id: &str) -> Result<TradingReport>;
}

#[async_trait]
pub trait TradeRepository: Send + Sync {
    async fn list_trades(&self, filters: TradeFilters) -> Result<Vec<Trade>>;
    /// Trades at or after `since` (all when None), oldest first
    async fn trades_since(&self, since: Option<i64>) -> Result<Vec<Trade>>;
    async fn trades_for_report(&self, report_id: &str) -> Result<Vec<Trade>>;
    async fn get_trade(&self, id: &str) -> Result<Trade>;
    async fn create_trade(&self, input: TradeInput) -> Result<Trade>;
    async fn update_trade(&self, id: &str, input: TradeInput) -> Result<Trade>;
    async fn delete_trade(&self, id: &str) -> Result<()>;
}

/// The two lookups behind search-as-you-type
#[async_trait]
pub trait SearchSource: Send + Sync {
    /// Published posts whose title or excerpt contains `term`, newest first
    async fn search_posts(&self, term: &str, limit: u32) -> Result<Vec<PostSearchHit>>;
    /// Published reports whose title contains `term`, newest first
    async fn search_reports(&self, term: &str, limit: u32) -> Result<Vec<ReportSearchHit>>;
}

#[async_trait]
pub trait SiteRepository: Send + Sync {
    async fn admin_overview(&self) -> Result<AdminOverview>;
    async fn sitemap_entries(&self, site_url: &str) -> Result<Vec<SitemapEntry>>;
}
