use serde::{Deserialize, Serialize};

/// Row counts shown on the admin landing page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminOverview {
    pub posts: i64,
    pub reports: i64,
    pub trades: i64,
    pub categories: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFrequency {
    Daily,
    Weekly,
    Monthly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SitemapEntry {
    pub url: String,
    pub last_modified: i64,
    pub change_frequency: ChangeFrequency,
    pub priority: f64,
}
