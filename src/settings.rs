use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::fetcher::StatusPolicy;
use crate::parser::regions::RegionSelectors;

/// Runtime settings: defaults, then `scraper.toml`, then `SCRAPER_*` env vars.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub db_path: PathBuf,
    pub categories_file: PathBuf,
    pub links_dir: PathBuf,
    pub request_delay_secs: u64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub status_policy: StatusPolicy,
    pub regions: RegionSelectors,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            db_path: PathBuf::from("data/products.sqlite"),
            categories_file: PathBuf::from("data/product_categories.txt"),
            links_dir: PathBuf::from("data/category_links"),
            request_delay_secs: 5,
            request_timeout_secs: 30,
            user_agent: concat!("product_scraper/", env!("CARGO_PKG_VERSION")).to_string(),
            status_policy: StatusPolicy::Reject,
            regions: RegionSelectors::default(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        Config::builder()
            .add_source(File::with_name("scraper").required(false))
            .add_source(Environment::with_prefix("SCRAPER"))
            .build()
            .context("Failed to load settings")?
            .try_deserialize()
            .context("Invalid settings")
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_secs(self.request_delay_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
