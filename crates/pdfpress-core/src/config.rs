// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service configuration.
//
// Loading order: built-in defaults, then an optional JSON file named by
// `PDFPRESS_CONFIG`, then individual environment overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{PdfpressError, Result};
use crate::types::{CompressionTier, MIN_GAIN_PERCENT, StrategyKind};

/// Environment variable naming an optional JSON config file.
pub const CONFIG_ENV: &str = "PDFPRESS_CONFIG";

const MIB: u64 = 1024 * 1024;

/// Process-wide settings for the HTTP service and the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// TCP port (`PORT` overrides, matching common PaaS conventions).
    pub port: u16,
    /// Largest accepted upload, in bytes.
    pub max_upload_bytes: u64,
    /// Root under which `uploads/` and `compressed/` are created.
    pub staging_dir: PathBuf,
    /// Tier used when the client does not send `compression_level`.
    pub default_tier: CompressionTier,
    /// Compressed outputs never downloaded are removed after this many seconds.
    pub download_ttl_secs: u64,
    /// How often the expiry sweep runs.
    pub sweep_interval_secs: u64,
    /// Strategies switched off even if their backend is available.
    pub disabled_strategies: Vec<StrategyKind>,
    /// Acceptance threshold for a strategy's size reduction, in percent.
    pub min_gain_percent: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5000,
            max_upload_bytes: 500 * MIB,
            staging_dir: PathBuf::from("staging"),
            default_tier: CompressionTier::Medium,
            download_ttl_secs: 3600,
            sweep_interval_secs: 300,
            disabled_strategies: Vec::new(),
            min_gain_percent: MIN_GAIN_PERCENT,
        }
    }
}

impl ServerConfig {
    /// Resolve the configuration from the process environment.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file. Missing keys keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|e| {
            PdfpressError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&data)?;
        info!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    /// Apply `PORT` and `PDFPRESS_*` overrides through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(port) = lookup("PORT") {
            self.port = parse_number("PORT", &port)?;
        }
        if let Some(host) = lookup("PDFPRESS_HOST") {
            self.host = host;
        }
        if let Some(bytes) = lookup("PDFPRESS_MAX_UPLOAD_BYTES") {
            self.max_upload_bytes = parse_number("PDFPRESS_MAX_UPLOAD_BYTES", &bytes)?;
        }
        if let Some(dir) = lookup("PDFPRESS_STAGING_DIR") {
            self.staging_dir = PathBuf::from(dir);
        }
        if let Some(tier) = lookup("PDFPRESS_DEFAULT_TIER") {
            self.default_tier = tier
                .parse()
                .map_err(|_| PdfpressError::Config(format!("PDFPRESS_DEFAULT_TIER: '{tier}'")))?;
        }
        if let Some(ttl) = lookup("PDFPRESS_DOWNLOAD_TTL_SECS") {
            self.download_ttl_secs = parse_number("PDFPRESS_DOWNLOAD_TTL_SECS", &ttl)?;
        }
        if let Some(list) = lookup("PDFPRESS_DISABLED_STRATEGIES") {
            self.disabled_strategies = list
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(str::parse)
                .collect::<Result<Vec<_>>>()?;
        }
        debug!(port = self.port, tier = %self.default_tier, "config overrides applied");
        Ok(())
    }

    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_upload_bytes == 0 {
            return Err(PdfpressError::Config("max_upload_bytes must be positive".into()));
        }
        if !(0.0..100.0).contains(&self.min_gain_percent) {
            return Err(PdfpressError::Config(format!(
                "min_gain_percent must be in [0, 100), got {}",
                self.min_gain_percent
            )));
        }
        if self.sweep_interval_secs == 0 {
            return Err(PdfpressError::Config("sweep_interval_secs must be positive".into()));
        }
        Ok(())
    }

    pub fn download_ttl(&self) -> Duration {
        Duration::from_secs(self.download_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Upload limit in whole MiB, for user-facing messages.
    pub fn max_upload_mib(&self) -> u64 {
        self.max_upload_bytes.div_ceil(MIB)
    }

    pub fn is_enabled(&self, strategy: StrategyKind) -> bool {
        !self.disabled_strategies.contains(&strategy)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| PdfpressError::Config(format!("{key}: '{raw}' is not a valid number")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_reference_service() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.max_upload_bytes, 500 * MIB);
        assert_eq!(config.max_upload_mib(), 500);
        assert_eq!(config.default_tier, CompressionTier::Medium);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = ServerConfig::default();
        config
            .apply_overrides(lookup_from(&[
                ("PORT", "8080"),
                ("PDFPRESS_DEFAULT_TIER", "high"),
                ("PDFPRESS_DISABLED_STRATEGIES", "raster, basic"),
            ]))
            .expect("overrides");
        assert_eq!(config.port, 8080);
        assert_eq!(config.default_tier, CompressionTier::High);
        assert!(!config.is_enabled(StrategyKind::Rasterization));
        assert!(!config.is_enabled(StrategyKind::BasicStructural));
        assert!(config.is_enabled(StrategyKind::StreamRecompressor));
    }

    #[test]
    fn bad_port_is_config_error() {
        let mut config = ServerConfig::default();
        let err = config
            .apply_overrides(lookup_from(&[("PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, PdfpressError::Config(_)));
    }

    #[test]
    fn json_file_fills_missing_keys_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{"port": 9000, "default_tier": "low"}}"#).expect("write");

        let config = ServerConfig::from_file(file.path()).expect("load");
        assert_eq!(config.port, 9000);
        assert_eq!(config.default_tier, CompressionTier::Low);
        assert_eq!(config.max_upload_bytes, 500 * MIB);
    }

    #[test]
    fn zero_upload_limit_is_rejected() {
        let config = ServerConfig {
            max_upload_bytes: 0,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
