use crate::core::currency::Currency;
use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

pub const MAX_LOG_QUEUE_CAPACITY: usize = 1 << 20;

const DEFAULT_JSDELIVR_URL: &str = "https://cdn.jsdelivr.net/npm/@fawazahmed0/currency-api";

fn default_timeout_secs() -> u64 {
    30
}

fn default_days_look_back() -> u32 {
    1
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_interval_secs() -> u64 {
    60 * 60
}

fn default_run_on_start() -> bool {
    true
}

fn default_log_queue_capacity() -> usize {
    1024
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct JsDelivrProviderConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl JsDelivrProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for JsDelivrProviderConfig {
    fn default() -> Self {
        JsDelivrProviderConfig {
            base_url: DEFAULT_JSDELIVR_URL.to_string(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub jsdelivr: JsDelivrProviderConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScheduleConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_run_on_start")]
    pub run_on_start: bool,
}

impl ScheduleConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        ScheduleConfig {
            interval_secs: default_interval_secs(),
            run_on_start: default_run_on_start(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub currencies: Vec<Currency>,
    #[serde(default = "default_days_look_back")]
    pub days_look_back: u32,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default = "default_log_queue_capacity")]
    pub log_queue_capacity: usize,
    pub data_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            currencies: Vec::new(),
            days_look_back: default_days_look_back(),
            api_key: String::new(),
            listen_addr: default_listen_addr(),
            providers: ProvidersConfig::default(),
            schedule: ScheduleConfig::default(),
            log_queue_capacity: default_log_queue_capacity(),
            data_path: None,
        }
    }
}

impl AppConfig {
    /// Loads the default config file if present, then applies environment overrides.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if config_path.exists() {
            return Self::load_from_path(&config_path);
        }

        debug!(
            "No config file at {}, using defaults and environment",
            config_path.display()
        );
        let mut config = Self::default();
        config.apply_env()?;
        config.finalize()?;
        Ok(config)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "fxsync", "fxsync")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("dev", "fxsync", "fxsync")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    /// Loads `path`, then applies overrides from `.env` and the process environment.
    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::load_from_path_with(path, |key| std::env::var(key).ok())
    }

    /// Loads `path` with overrides resolved through `lookup` instead of the environment.
    pub fn load_from_path_with<P, F>(path: P, lookup: F) -> Result<Self>
    where
        P: AsRef<std::path::Path>,
        F: Fn(&str) -> Option<String>,
    {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let mut config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config.apply_overrides(lookup)?;
        config.finalize()?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        dotenvy::dotenv().ok();
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Overrides file values with `CURRENCIES`, `DAYS_LOOK_BACK`, `API_KEY`,
    /// `API_BASE_URL`, `APP_PORT`, `SYNC_INTERVAL_SECS` and `DATA_PATH`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(currencies) = lookup("CURRENCIES") {
            self.currencies = currencies.split(',').map(Currency::new).collect();
        }
        if let Some(days) = lookup("DAYS_LOOK_BACK") {
            self.days_look_back = days
                .trim()
                .parse()
                .with_context(|| format!("Invalid DAYS_LOOK_BACK: {days}"))?;
        }
        if let Some(api_key) = lookup("API_KEY") {
            self.api_key = api_key;
        }
        if let Some(base_url) = lookup("API_BASE_URL") {
            self.providers.jsdelivr.base_url = base_url;
        }
        if let Some(port) = lookup("APP_PORT") {
            let port: u16 = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid APP_PORT: {port}"))?;
            self.listen_addr.set_port(port);
        }
        if let Some(secs) = lookup("SYNC_INTERVAL_SECS") {
            self.schedule.interval_secs = secs
                .trim()
                .parse()
                .with_context(|| format!("Invalid SYNC_INTERVAL_SECS: {secs}"))?;
        }
        if let Some(data_path) = lookup("DATA_PATH") {
            self.data_path = Some(data_path);
        }
        Ok(())
    }

    /// Drops empty and repeated currencies (first occurrence wins) and checks limits.
    pub fn finalize(&mut self) -> Result<()> {
        let mut unique: Vec<Currency> = Vec::with_capacity(self.currencies.len());
        for currency in self.currencies.drain(..) {
            if !currency.is_empty() && !unique.contains(&currency) {
                unique.push(currency);
            }
        }
        self.currencies = unique;

        if self.schedule.interval_secs == 0 {
            bail!("schedule.interval_secs must be greater than zero");
        }
        if self.log_queue_capacity == 0 || self.log_queue_capacity > MAX_LOG_QUEUE_CAPACITY {
            bail!(
                "log_queue_capacity must be between 1 and {MAX_LOG_QUEUE_CAPACITY}, got {}",
                self.log_queue_capacity
            );
        }
        Ok(())
    }

    pub fn require_api_key(&self) -> Result<&str> {
        if self.api_key.trim().is_empty() {
            bail!("api_key must be configured (config file or API_KEY) before serving");
        }
        Ok(&self.api_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn parse(yaml: &str) -> AppConfig {
        let mut config: AppConfig = serde_yaml::from_str(yaml).expect("Failed to deserialize");
        config.finalize().expect("Failed to finalize");
        config
    }

    #[test]
    fn test_config_deserialization() {
        let config = parse(
            r#"
currencies: ["EUR", "USD", "rub", "JPY"]
days_look_back: 3
api_key: "secret"
listen_addr: "127.0.0.1:9000"
providers:
  jsdelivr:
    base_url: "http://example.com/currency-api"
schedule:
  interval_secs: 600
  run_on_start: false
data_path: "/tmp/fxsync"
"#,
        );

        assert_eq!(
            config.currencies,
            vec![
                Currency::new("eur"),
                Currency::new("usd"),
                Currency::new("rub"),
                Currency::new("jpy")
            ]
        );
        assert_eq!(config.days_look_back, 3);
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.listen_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(
            config.providers.jsdelivr.base_url,
            "http://example.com/currency-api"
        );
        assert_eq!(config.providers.jsdelivr.timeout_secs, 30);
        assert_eq!(config.schedule.interval(), Duration::from_secs(600));
        assert!(!config.schedule.run_on_start);
        assert_eq!(
            config.default_data_path().unwrap(),
            PathBuf::from("/tmp/fxsync")
        );
    }

    #[test]
    fn test_config_defaults() {
        let config = parse("currencies: [usd, eur]");

        assert_eq!(config.days_look_back, 1);
        assert!(config.api_key.is_empty());
        assert_eq!(config.listen_addr, default_listen_addr());
        assert_eq!(config.providers.jsdelivr.base_url, DEFAULT_JSDELIVR_URL);
        assert_eq!(config.schedule.interval_secs, 3600);
        assert!(config.schedule.run_on_start);
        assert_eq!(config.log_queue_capacity, 1024);
        assert!(config.require_api_key().is_err());
    }

    #[test]
    fn test_currencies_are_deduplicated_in_order() {
        let config = parse(r#"currencies: ["USD", "eur", "usd", "", "JPY", "EUR"]"#);

        assert_eq!(
            config.currencies,
            vec![
                Currency::new("usd"),
                Currency::new("eur"),
                Currency::new("jpy")
            ]
        );
    }

    #[test]
    fn test_environment_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("DAYS_LOOK_BACK", "2"),
            ("APP_PORT", "8088"),
            ("API_BASE_URL", "http://example"),
            ("CURRENCIES", "USD,EUR,JPY"),
            ("API_KEY", "secret"),
            ("SYNC_INTERVAL_SECS", "120"),
        ]);

        let mut config = AppConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        config.finalize().unwrap();

        assert_eq!(config.days_look_back, 2);
        assert_eq!(config.listen_addr.port(), 8088);
        assert_eq!(config.providers.jsdelivr.base_url, "http://example");
        assert_eq!(
            config.currencies,
            vec![
                Currency::new("usd"),
                Currency::new("eur"),
                Currency::new("jpy")
            ]
        );
        assert_eq!(config.require_api_key().unwrap(), "secret");
        assert_eq!(config.schedule.interval_secs, 120);
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let mut config = AppConfig::default();
        let result = config.apply_overrides(|key| {
            (key == "DAYS_LOOK_BACK").then(|| "minus one".to_string())
        });

        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Invalid DAYS_LOOK_BACK")
        );
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let mut config: AppConfig =
            serde_yaml::from_str("schedule:\n  interval_secs: 0\n").unwrap();
        assert!(config.finalize().is_err());
    }

    #[test]
    fn test_load_from_path_ignores_unrelated_environment() {
        let file = tempfile::NamedTempFile::new().unwrap();
        fs::write(
            file.path(),
            "currencies: [usd, eur]\napi_key: k\ndays_look_back: 0\n",
        )
        .unwrap();

        let config = AppConfig::load_from_path_with(file.path(), |_| None).unwrap();
        assert_eq!(
            config.currencies,
            vec![Currency::new("usd"), Currency::new("eur")]
        );
        assert_eq!(config.days_look_back, 0);
        assert_eq!(config.api_key, "k");
    }

    #[test]
    fn test_load_from_path_applies_given_overrides() {
        let file = tempfile::NamedTempFile::new().unwrap();
        fs::write(file.path(), "currencies: [usd, eur]\napi_key: k\n").unwrap();

        let config = AppConfig::load_from_path_with(file.path(), |key| {
            (key == "CURRENCIES").then(|| "gbp,chf,gbp".to_string())
        })
        .unwrap();
        assert_eq!(
            config.currencies,
            vec![Currency::new("gbp"), Currency::new("chf")]
        );
    }

    #[test]
    fn test_log_queue_capacity_bounds() {
        let mut config = AppConfig {
            log_queue_capacity: 0,
            ..AppConfig::default()
        };
        assert!(config.finalize().is_err());

        config.log_queue_capacity = usize::MAX;
        let err = config.finalize().unwrap_err();
        assert!(err.to_string().contains("log_queue_capacity must be between 1 and"));

        config.log_queue_capacity = MAX_LOG_QUEUE_CAPACITY;
        assert!(config.finalize().is_ok());
    }
}
