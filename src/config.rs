// Configuration loaded from ~/.config/pr-annotate/config.toml.
// Every key is optional; a missing file means all defaults.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_GREETING: &str = "🤖 pr-annotate";
pub const DEFAULT_COMMENT_TAG: &str = "<!-- This is an auto-generated comment by pr-annotate -->";
pub const DEFAULT_REPLY_TAG: &str =
    "<!-- This is an auto-generated reply by pr-annotate -->";
pub const DEFAULT_DESCRIPTION_START: &str = "<!-- pr-annotate: summary start -->";
pub const DEFAULT_DESCRIPTION_END: &str = "<!-- pr-annotate: summary end -->";

/// GitHub rejects `per_page` above this.
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub api_url: String,
    pub greeting: String,
    pub comment_tag: String,
    pub reply_tag: String,
    pub description_start: String,
    pub description_end: String,
    pub page_size: u32,
    pub max_pages: u32,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            greeting: DEFAULT_GREETING.to_string(),
            comment_tag: DEFAULT_COMMENT_TAG.to_string(),
            reply_tag: DEFAULT_REPLY_TAG.to_string(),
            description_start: DEFAULT_DESCRIPTION_START.to_string(),
            description_end: DEFAULT_DESCRIPTION_END.to_string(),
            page_size: MAX_PAGE_SIZE,
            max_pages: 100,
            request_timeout_secs: 30,
        }
    }
}

/// Page size and safety bound for listing comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub page_size: u32,
    pub max_pages: u32,
}

impl Config {
    pub fn paging(&self) -> Paging {
        Paging {
            page_size: self.page_size,
            max_pages: self.max_pages,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Config = toml::from_str(raw).context("Invalid config file")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            anyhow::bail!(
                "page_size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE,
                self.page_size
            );
        }
        if self.max_pages == 0 {
            anyhow::bail!("max_pages must be at least 1");
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be at least 1");
        }
        for (key, value) in [
            ("comment_tag", &self.comment_tag),
            ("reply_tag", &self.reply_tag),
            ("description_start", &self.description_start),
            ("description_end", &self.description_end),
        ] {
            if value.trim().is_empty() {
                anyhow::bail!("{} must not be empty", key);
            }
        }
        if self.reply_tag.contains(self.comment_tag.as_str())
            || self.comment_tag.contains(self.reply_tag.as_str())
        {
            anyhow::bail!("comment_tag and reply_tag must not contain one another");
        }
        if self.description_start == self.description_end {
            anyhow::bail!("description_start and description_end must differ");
        }
        Ok(())
    }
}

/// Default config location.
///
/// Prefers `$XDG_CONFIG_HOME/pr-annotate/config.toml`; falls back to
/// `~/.config/pr-annotate/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var_os("HOME")
                .filter(|v| !v.is_empty())
                .map(|home| PathBuf::from(home).join(".config"))
        })?;
    Some(base.join("pr-annotate").join("config.toml"))
}

/// Load the config from `path`, or from the default location when `None`.
/// A missing file yields the defaults; an explicitly given path must exist.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let (path, explicit) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => match default_config_path() {
            Some(p) => (p, false),
            None => return Ok(Config::default()),
        },
    };

    match std::fs::read_to_string(&path) {
        Ok(raw) => Config::from_toml(&raw).with_context(|| format!("in {}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && !explicit => {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Config::default())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to read config {}", path.display())),
    }
}
