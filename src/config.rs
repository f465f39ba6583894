//! Configuration for the Curve Tracker
//!
//! Layered, lowest precedence first:
//! 1. `Config::default()`
//! 2. TOML file (`--config <path>` or `./curve-tracker.toml`)
//! 3. Environment variables (`.env` supported)
//! 4. CLI flags (applied by `main`)

use eyre::{eyre, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::providers::{Chain, DEFAULT_CHAIN};

/// Config file picked up from the working directory when present
pub const DEFAULT_CONFIG_FILE: &str = "curve-tracker.toml";

// ============================================
// EXPORT MODE
// ============================================

/// How exported sheets treat existing files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportMode {
    /// Add rows to existing sheets
    #[default]
    Append,

    /// Rewrite every sheet touched by this run
    Replace,
}

impl std::fmt::Display for ExportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportMode::Append => write!(f, "append"),
            ExportMode::Replace => write!(f, "replace"),
        }
    }
}

impl std::str::FromStr for ExportMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "append" => Ok(ExportMode::Append),
            "replace" | "overwrite" => Ok(ExportMode::Replace),
            other => Err(format!("unknown export mode '{}'", other)),
        }
    }
}

// ============================================
// MAIN CONFIGURATION
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // ========== Provider Endpoints ==========
    /// Curve API base URL
    pub curve_api_url: String,

    /// Yearn yDaemon base URL
    pub yearn_api_url: String,

    /// StakeDAO API base URL
    pub stakedao_api_url: String,

    // ========== Run Defaults ==========
    /// Chain used when a request doesn't name one
    pub default_chain: String,

    /// Augment records with Yearn vault data
    pub enable_yearn: bool,

    /// Augment records with StakeDAO strategy data
    pub enable_stakedao: bool,

    /// Requests resolved concurrently (1 = strictly sequential)
    pub batch_concurrency: usize,

    // ========== HTTP ==========
    /// Per-request timeout
    pub http_timeout_secs: u64,

    /// Retries after the first failed attempt
    pub http_max_retries: u32,

    pub user_agent: String,

    // ========== Export ==========
    /// Directory for CSV sheets (no export when unset)
    pub export_dir: Option<PathBuf>,

    pub export_mode: ExportMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            curve_api_url: "https://api.curve.finance/v1".to_string(),
            yearn_api_url: "https://ydaemon.yearn.fi".to_string(),
            stakedao_api_url: "https://api.stakedao.org/api".to_string(),
            default_chain: DEFAULT_CHAIN.to_string(),
            enable_yearn: false,
            enable_stakedao: false,
            batch_concurrency: 1,
            http_timeout_secs: 15,
            http_max_retries: 1,
            user_agent: "CurveTracker/1.0".to_string(),
            export_dir: None,
            export_mode: ExportMode::Append,
        }
    }
}

impl Config {
    /// Load defaults <- file <- environment
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE)?,
            None => Self::default(),
        };
        config.apply_env(|key| env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .wrap_err_with(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Override fields from `lookup` (environment in production)
    ///
    /// Unparseable values are ignored, keeping the previous layer's value.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("CURVE_API_URL") {
            self.curve_api_url = v;
        }
        if let Some(v) = lookup("YEARN_API_URL") {
            self.yearn_api_url = v;
        }
        if let Some(v) = lookup("STAKEDAO_API_URL") {
            self.stakedao_api_url = v;
        }
        if let Some(v) = lookup("DEFAULT_CHAIN") {
            self.default_chain = v;
        }
        if let Some(v) = lookup("ENABLE_YEARN").and_then(|v| parse_bool(&v)) {
            self.enable_yearn = v;
        }
        if let Some(v) = lookup("ENABLE_STAKEDAO").and_then(|v| parse_bool(&v)) {
            self.enable_stakedao = v;
        }
        if let Some(v) = lookup("BATCH_CONCURRENCY").and_then(|v| v.parse().ok()) {
            self.batch_concurrency = v;
        }
        if let Some(v) = lookup("HTTP_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.http_timeout_secs = v;
        }
        if let Some(v) = lookup("HTTP_MAX_RETRIES").and_then(|v| v.parse().ok()) {
            self.http_max_retries = v;
        }
        if let Some(v) = lookup("HTTP_USER_AGENT") {
            self.user_agent = v;
        }
        if let Some(v) = lookup("EXPORT_DIR").filter(|v| !v.trim().is_empty()) {
            self.export_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("EXPORT_MODE").and_then(|v| v.parse().ok()) {
            self.export_mode = v;
        }
    }

    pub fn default_chain(&self) -> Chain {
        Chain::new(&self.default_chain)
    }

    /// Validate before any network traffic
    pub fn validate(&self) -> Result<()> {
        for (name, url) in [
            ("curve_api_url", &self.curve_api_url),
            ("yearn_api_url", &self.yearn_api_url),
            ("stakedao_api_url", &self.stakedao_api_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(eyre!("{} must be an http(s) URL (got '{}')", name, url));
            }
        }

        if self.default_chain.trim().is_empty() {
            return Err(eyre!("default_chain must not be empty"));
        }
        if self.http_timeout_secs == 0 {
            return Err(eyre!("http_timeout_secs must be > 0"));
        }
        if self.batch_concurrency == 0 {
            return Err(eyre!("batch_concurrency must be >= 1"));
        }

        Ok(())
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        let on_off = |enabled: bool| if enabled { "✓ Enabled" } else { "✗ Disabled" };

        println!("╔════════════════════════════════════════════════════════════╗");
        println!("║              CURVE TRACKER - CONFIGURATION                 ║");
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ Default Chain:     {:^40} ║", self.default_chain);
        println!("║ Concurrency:       {:^40} ║", self.batch_concurrency);
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ PROVIDERS                                                  ║");
        println!("║ • Curve:           {:^40} ║", truncate(&self.curve_api_url, 40));
        println!("║ • Yearn:           {:^40} ║", on_off(self.enable_yearn));
        println!("║ • StakeDAO:        {:^40} ║", on_off(self.enable_stakedao));
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ HTTP                                                       ║");
        println!("║ • Timeout:         {:>38} s ║", self.http_timeout_secs);
        println!("║ • Max Retries:     {:^40} ║", self.http_max_retries);
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ EXPORT                                                     ║");
        println!(
            "║ • Directory:       {:^40} ║",
            self.export_dir
                .as_ref()
                .map(|d| truncate(&d.display().to_string(), 40))
                .unwrap_or_else(|| "✗ Not Set".to_string())
        );
        println!("║ • Mode:            {:^40} ║", self.export_mode);
        println!("╚════════════════════════════════════════════════════════════╝");
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() > max {
        let head: String = value.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        value.to_string()
    }
}

// ============================================
// TESTS
// ============================================
