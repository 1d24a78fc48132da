use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::enrich::EnrichConfig;
use crate::fetch::FetcherConfig;
use crate::harvest::HarvestConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub fetcher: FetcherConfig,
    pub enrich: EnrichConfig,
    pub harvest: HarvestConfig,
    pub database: DatabaseConfig,
    /// Directory for snapshots and progress checkpoints.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site: SiteConfig::default(),
            fetcher: FetcherConfig::default(),
            enrich: EnrichConfig::default(),
            harvest: HarvestConfig::default(),
            database: DatabaseConfig::default(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("scrape_data")
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Target site configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    pub base_url: String,
    pub categories: Vec<CategorySpec>,
}

/// One harvestable category: a stable key plus the site's path segment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CategorySpec {
    pub key: String,
    pub path: String,
}

impl CategorySpec {
    pub fn new(key: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            path: path.into(),
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.piaohua.com".to_string(),
            categories: vec![
                CategorySpec::new("action", "dongzuo"),
                CategorySpec::new("comedy", "xiju"),
                CategorySpec::new("romance", "aiqing"),
                CategorySpec::new("scifi", "kehuan"),
                CategorySpec::new("drama", "juqing"),
                CategorySpec::new("suspense", "xuanyi"),
                CategorySpec::new("war", "zhanzheng"),
                CategorySpec::new("horror", "kongbu"),
                CategorySpec::new("disaster", "zainan"),
                CategorySpec::new("anime", "dongman"),
                CategorySpec::new("shaw", "shaoshi"),
                CategorySpec::new("mandarin", "guoyu"),
                CategorySpec::new("misc", "zonghe"),
            ],
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("reelharvest.db")
}

impl Config {
    /// Look a category up by its stable key.
    pub fn category(&self, key: &str) -> Option<&CategorySpec> {
        self.site.categories.iter().find(|c| c.key == key)
    }
}
