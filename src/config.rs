use std::env;
use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::models::CompetitorSite;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub browser: BrowserConfig,
    pub run: RunConfig,
    pub sites: Vec<CompetitorSite>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    pub headless: bool,
    /// Page-load timeout in seconds.
    pub page_load_timeout: u64,
    /// Explicit element-wait timeout in seconds.
    pub wait_timeout: u64,
    pub user_agent: String,
    /// Adds launch flags that suppress common automation signals.
    pub stealth: bool,
    pub chrome_path: Option<String>,
    pub proxy: Option<ProxyConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ProxyConfig {
    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn credentials(&self) -> Option<(String, String)> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some((user.clone(), pass.clone())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Pause between consecutive site calls, in milliseconds.
    pub politeness_delay_ms: u64,
    /// Extra attempts for timeout/error quotes. Zero disables retry.
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    /// Used when the caller does not pass a threshold explicitly.
    pub default_threshold_percent: u8,
}

impl BrowserConfig {
    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout)
    }
}

impl RunConfig {
    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let config_dir = env::var("PRICEWATCH_CONFIG_DIR").unwrap_or_else(|_| "config".into());
        Self::load_from(Path::new(&config_dir))
    }

    pub fn load_from(dir: &Path) -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        let path = |name: &str| dir.join(name).display().to_string();

        let s = Config::builder()
            // Start with default configuration
            .add_source(File::with_name(&path("default")))
            // Add environment-specific config
            .add_source(File::with_name(&path(&run_mode)).required(false))
            // Add local config (ignored by git)
            .add_source(File::with_name(&path("local")).required(false))
            // Add environment variables with prefix "PRICEWATCH_"
            .add_source(Environment::with_prefix("PRICEWATCH").separator("__"))
            .build()?;

        let mut config: AppConfig = s.try_deserialize()?;

        // Add Chrome path from environment if not set
        if config.browser.chrome_path.is_none() {
            config.browser.chrome_path = env::var("CHROME_PATH").ok();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate browser configuration
        if self.browser.page_load_timeout == 0 {
            return Err(ConfigError::Message(
                "Browser page_load_timeout must be greater than 0".into(),
            ));
        }

        if self.browser.wait_timeout == 0 {
            return Err(ConfigError::Message(
                "Browser wait_timeout must be greater than 0".into(),
            ));
        }

        if self.browser.user_agent.trim().is_empty() {
            return Err(ConfigError::Message(
                "Browser user_agent must not be empty".into(),
            ));
        }

        if let Some(proxy) = &self.browser.proxy {
            if proxy.port == 0 {
                return Err(ConfigError::Message(
                    "Proxy port must be greater than 0".into(),
                ));
            }
        }

        // Validate run configuration
        if self.run.default_threshold_percent < 5 || self.run.default_threshold_percent > 50 {
            return Err(ConfigError::Message(
                "Run default_threshold_percent must be between 5 and 50".into(),
            ));
        }

        // Validate the site table
        if self.sites.is_empty() {
            return Err(ConfigError::Message(
                "At least one competitor site must be configured".into(),
            ));
        }

        for site in &self.sites {
            if site.id.trim().is_empty() {
                return Err(ConfigError::Message("Site id must not be empty".into()));
            }

            if Url::parse(&site.base_url).is_err() {
                return Err(ConfigError::Message(format!(
                    "Site '{}' has an invalid base_url",
                    site.id
                )));
            }

            if !site.search_url_template.contains("{query}") {
                return Err(ConfigError::Message(format!(
                    "Site '{}' search_url_template is missing the {{query}} placeholder",
                    site.id
                )));
            }

            if site.ready_selector.trim().is_empty() {
                return Err(ConfigError::Message(format!(
                    "Site '{}' ready_selector must not be empty",
                    site.id
                )));
            }

            if site.price_selectors.is_empty() {
                return Err(ConfigError::Message(format!(
                    "Site '{}' needs at least one price selector",
                    site.id
                )));
            }
        }

        let mut ids: Vec<&str> = self.sites.iter().map(|s| s.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.len() != self.sites.len() {
            return Err(ConfigError::Message("Site ids must be unique".into()));
        }

        Ok(())
    }
}
