use std::path::PathBuf;

use ::config::builder::DefaultState;
use ::config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

pub const DEFAULT_SOURCE_URL: &str = "https://news.sky.com/sky-news-profiles";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";
const DEFAULT_DB_PATH: &str = "data/profiles.sqlite";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyKind {
    Log,
    Webhook,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub source_url: String,
    pub user_agent: String,
    pub db_path: PathBuf,
    pub title_case_job_titles: bool,
    pub notify: NotifyKind,
    pub webhook_url: Option<String>,
}

impl Settings {
    /// Defaults, then `profile_sync.toml` if present, then `PROFILES_*` env vars.
    pub fn load() -> Result<Self, ConfigError> {
        defaults()?
            .add_source(File::with_name("profile_sync").required(false))
            .add_source(Environment::with_prefix("PROFILES"))
            .build()?
            .try_deserialize()
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("source_url", DEFAULT_SOURCE_URL)?
        .set_default("user_agent", DEFAULT_USER_AGENT)?
        .set_default("db_path", DEFAULT_DB_PATH)?
        .set_default("title_case_job_titles", false)?
        .set_default("notify", "log")
}
