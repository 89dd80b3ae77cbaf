//! Application configuration

use crate::core::{Result, SyncError};
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Inactivity window before a forced logout, in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Upper bound for the initial fan-out load, in seconds
    #[serde(default = "default_load_timeout")]
    pub load_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout(),
            load_timeout_secs: default_load_timeout(),
        }
    }
}

fn default_idle_timeout() -> u64 { 300 }
fn default_load_timeout() -> u64 { 30 }

/// Longest accepted idle window (one week)
pub const MAX_IDLE_TIMEOUT_SECS: u64 = 7 * 24 * 60 * 60;

/// Longest accepted enrichment cool-down (about a century)
pub const MAX_COOLDOWN_DAYS: i64 = 36_500;

impl SessionConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_secs(self.load_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// Run the background job after login
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Animals per lookup call
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause between consecutive lookup calls, in milliseconds
    #[serde(default = "default_pacing_delay")]
    pub pacing_delay_ms: u64,

    /// Minimum days between two runs
    #[serde(default = "default_cooldown_days")]
    pub cooldown_days: i64,

    /// Lookup service URL
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            batch_size: default_batch_size(),
            pacing_delay_ms: default_pacing_delay(),
            cooldown_days: default_cooldown_days(),
            endpoint: None,
            api_key: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_true() -> bool { true }
fn default_batch_size() -> usize { 10 }
fn default_pacing_delay() -> u64 { 5_000 }
fn default_cooldown_days() -> i64 { 30 }
fn default_request_timeout() -> u64 { 30 }

impl EnrichmentConfig {
    pub fn pacing_delay(&self) -> Duration {
        Duration::from_millis(self.pacing_delay_ms)
    }

    /// Cool-down between runs, saturating at [`MAX_COOLDOWN_DAYS`]
    pub fn cooldown(&self) -> TimeDelta {
        TimeDelta::try_days(self.cooldown_days.clamp(0, MAX_COOLDOWN_DAYS)).unwrap_or(TimeDelta::zero())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory used by the file gateway
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|err| {
            SyncError::Config(format!("Failed to read '{}': {}", path.display(), err))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.session.idle_timeout_secs == 0 {
            return Err(SyncError::Config("session.idle_timeout_secs must be > 0".into()));
        }
        if self.session.idle_timeout_secs > MAX_IDLE_TIMEOUT_SECS {
            return Err(SyncError::Config(format!(
                "session.idle_timeout_secs must be <= {MAX_IDLE_TIMEOUT_SECS}"
            )));
        }
        if self.enrichment.batch_size == 0 {
            return Err(SyncError::Config("enrichment.batch_size must be > 0".into()));
        }
        if !(0..=MAX_COOLDOWN_DAYS).contains(&self.enrichment.cooldown_days) {
            return Err(SyncError::Config(format!(
                "enrichment.cooldown_days must be between 0 and {MAX_COOLDOWN_DAYS}"
            )));
        }
        Ok(())
    }

    /// Set the idle timeout
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.session.idle_timeout_secs = timeout.as_secs().max(1);
        self
    }

    /// Set the load timeout
    pub fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.session.load_timeout_secs = timeout.as_secs();
        self
    }

    /// Set the enrichment batch size
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.enrichment.batch_size = batch_size;
        self
    }

    /// Set the pause between enrichment batches
    pub fn with_pacing_delay(mut self, delay: Duration) -> Self {
        self.enrichment.pacing_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Enable or disable the background enrichment job
    pub fn with_enrichment(mut self, enabled: bool) -> Self {
        self.enrichment.enabled = enabled;
        self
    }

    /// Set the data directory
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.storage.data_dir = data_dir.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.session.idle_timeout(), Duration::from_secs(300));
        assert_eq!(config.enrichment.batch_size, 10);
        assert_eq!(config.enrichment.pacing_delay(), Duration::from_secs(5));
        assert_eq!(config.enrichment.cooldown(), chrono::Duration::days(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [session]
            idle_timeout_secs = 600

            [enrichment]
            endpoint = "https://species.example/lookup"
            "#,
        )
        .unwrap();
        assert_eq!(config.session.idle_timeout_secs, 600);
        assert_eq!(config.session.load_timeout_secs, 30);
        assert_eq!(config.enrichment.batch_size, 10);
        assert_eq!(
            config.enrichment.endpoint.as_deref(),
            Some("https://species.example/lookup")
        );
        assert_eq!(config.storage.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn test_validation_rejects_zero_batch() {
        let err = AppConfig::from_toml_str("[enrichment]\nbatch_size = 0\n").unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));
    }

    #[test]
    fn test_builders() {
        let config = AppConfig::default()
            .with_idle_timeout(Duration::from_secs(60))
            .with_batch_size(3)
            .with_pacing_delay(Duration::from_millis(250))
            .with_enrichment(false);
        assert_eq!(config.session.idle_timeout_secs, 60);
        assert_eq!(config.enrichment.batch_size, 3);
        assert_eq!(config.enrichment.pacing_delay_ms, 250);
        assert!(!config.enrichment.enabled);
    }

    #[test]
    fn test_validation_rejects_unrepresentable_cooldown() {
        let err = AppConfig::from_toml_str("[enrichment]\ncooldown_days = 9223372036854775807\n")
            .unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));
        assert!(AppConfig::from_toml_str("[enrichment]\ncooldown_days = -1\n").is_err());

        let mut config = AppConfig::default();
        config.enrichment.cooldown_days = i64::MAX;
        assert!(config.validate().is_err());
        assert_eq!(
            config.enrichment.cooldown(),
            TimeDelta::try_days(MAX_COOLDOWN_DAYS).unwrap()
        );
    }

    #[test]
    fn test_validation_bounds_idle_timeout() {
        let err = AppConfig::from_toml_str("[session]\nidle_timeout_secs = 9223372036854775807\n")
            .unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));
        assert!(AppConfig::default()
            .with_idle_timeout(Duration::from_secs(MAX_IDLE_TIMEOUT_SECS))
            .validate()
            .is_ok());
        assert!(AppConfig::default()
            .with_idle_timeout(Duration::from_secs(MAX_IDLE_TIMEOUT_SECS + 1))
            .validate()
            .is_err());
    }
}
