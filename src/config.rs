//! Run configuration.
//!
//! Settings come from an optional YAML file; every field has a default so
//! an empty file (or no file) yields the built-in site list. CLI flags are
//! applied on top in `main`.
//!
//! ```yaml
//! sites:
//!   - name: BBC News
//!     base_url: https://www.bbc.com/news
//! politeness_delay_ms: 1000
//! max_articles_per_site: 10
//! ```

use crate::crawler::{CrawlSettings, DEFAULT_CONCURRENCY};
use crate::discover::DiscoverOptions;
use crate::error::ConfigError;
use crate::fetcher::{DEFAULT_USER_AGENT, FetcherConfig};
use crate::models::SiteSpec;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

/// Front pages crawled when no config file names any.
pub const DEFAULT_SITES: &[(&str, &str)] = &[
    ("BBC News", "https://www.bbc.com/news"),
    ("CNN", "https://edition.cnn.com"),
    ("The Guardian", "https://www.theguardian.com/international"),
    ("NPR", "https://www.npr.org/sections/news/"),
];

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub sites: Vec<SiteSpec>,
    pub user_agent: String,
    /// Extra request headers.
    pub headers: BTreeMap<String, String>,
    pub request_timeout_secs: u64,
    pub politeness_delay_ms: u64,
    pub max_articles_per_site: usize,
    pub max_candidates_per_site: Option<usize>,
    pub concurrency: usize,
    pub max_retries: usize,
    pub retry_base_delay_ms: u64,
    /// Characters of body text kept in output records; `None` keeps all.
    pub preview_len: Option<usize>,
    pub same_host_only: bool,
    /// Run the keyword annotator before matching.
    pub keywords: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sites: default_sites(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headers: BTreeMap::new(),
            request_timeout_secs: 10,
            politeness_delay_ms: 1000,
            max_articles_per_site: 10,
            max_candidates_per_site: None,
            concurrency: DEFAULT_CONCURRENCY,
            max_retries: 0,
            retry_base_delay_ms: 1000,
            preview_len: Some(500),
            same_host_only: true,
            keywords: true,
        }
    }
}

fn default_sites() -> Vec<SiteSpec> {
    DEFAULT_SITES
        .iter()
        .map(|(name, url)| SiteSpec {
            name: (*name).to_string(),
            base_url: Url::parse(url).expect("built-in site URL"),
        })
        .collect()
}

impl AppConfig {
    /// Load and validate a YAML config file.
    ///
    /// Fields missing from the file keep their defaults.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the YAML file
    ///
    /// # Returns
    ///
    /// The validated configuration, or a [`ConfigError`] if the file cannot
    /// be read, does not parse, or holds invalid values.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&raw)?;
        info!(sites = config.sites.len(), "Loaded configuration");
        Ok(config)
    }

    /// Parse and validate YAML text; an empty document yields the defaults.
    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = if raw.trim().is_empty() {
            AppConfig::default()
        } else {
            serde_yaml::from_str(raw)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sites.is_empty() {
            return Err(ConfigError::NoSites);
        }
        for site in &self.sites {
            site.validate()?;
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidSetting {
                field: "request_timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidSetting {
                field: "concurrency",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig {
            timeout: Duration::from_secs(self.request_timeout_secs),
            user_agent: self.user_agent.clone(),
            headers: self
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    pub fn crawl_settings(&self) -> CrawlSettings {
        CrawlSettings {
            politeness_delay: Duration::from_millis(self.politeness_delay_ms),
            concurrency: self.concurrency,
            max_candidates_per_site: self.max_candidates_per_site,
            discover: DiscoverOptions {
                same_host_only: self.same_host_only,
            },
        }
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!(config.sites.len(), DEFAULT_SITES.len());
        assert_eq!(config.crawl_settings().politeness_delay, Duration::from_secs(1));
        assert_eq!(config.fetcher_config().timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config = AppConfig::from_yaml("  \n").unwrap();
        assert_eq!(config.sites.len(), DEFAULT_SITES.len());
    }

    #[test]
    fn test_partial_yaml_overrides() {
        let yaml = r#"
sites:
  - name: Test
    base_url: http://a.example
politeness_delay_ms: 0
max_retries: 2
headers:
  X-Crawler: tagged-news
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.sites.len(), 1);
        assert_eq!(config.sites[0].name, "Test");
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.crawl_settings().politeness_delay, Duration::ZERO);
        assert_eq!(config.max_articles_per_site, 10);
        assert_eq!(
            config.fetcher_config().headers,
            vec![("X-Crawler".to_string(), "tagged-news".to_string())]
        );
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            AppConfig::from_yaml("sites: []"),
            Err(ConfigError::NoSites)
        ));
        assert!(matches!(
            AppConfig::from_yaml("request_timeout_secs: 0"),
            Err(ConfigError::InvalidSetting { .. })
        ));
        assert!(matches!(
            AppConfig::from_yaml("concurrency: 0"),
            Err(ConfigError::InvalidSetting { .. })
        ));
        assert!(matches!(
            AppConfig::from_yaml("sites:\n  - name: Feed\n    base_url: ftp://a.example\n"),
            Err(ConfigError::InvalidSite { .. })
        ));
        assert!(matches!(
            AppConfig::from_yaml("unknown_field: 1"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_articles_per_site: 25").unwrap();
        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.max_articles_per_site, 25);

        assert!(matches!(
            AppConfig::load(Path::new("/definitely/not/here.yaml")),
            Err(ConfigError::Io(_))
        ));
    }
}
