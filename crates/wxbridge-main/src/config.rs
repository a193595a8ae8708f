// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of wxbridge.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use wxbridge_adapters::{
    FroniusConfig, FroniusHandler, PvPrivateConfig, PvPrivateHandler, WindguruConfig,
    WindguruHandler,
};
use wxbridge_core::{DeviceTimeZone, HandlerChain, UsePreferredHandler};

/// Handler names in their default invocation order
const DEFAULT_ORDER: [&str; 4] = [
    FroniusHandler::NAME,
    PvPrivateHandler::NAME,
    UsePreferredHandler::NAME,
    WindguruHandler::NAME,
];

const CONFIG_ENV: &str = "WXBRIDGE_CONFIG";
const CONFIG_CANDIDATES: [&str; 2] = ["wxbridge.toml", "wxbridge.json"];

/// Main application configuration
///
/// Section and key names used by station configs (`[StdArchive]`, `[Fronius]`,
/// `installedWP`, ...) are accepted as aliases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Process-level settings
    #[serde(default)]
    pub system: SystemConfig,

    /// Host archive settings shared by all handlers
    #[serde(alias = "StdArchive")]
    pub archive: ArchiveConfig,

    /// Handler ordering
    #[serde(default, alias = "Engine")]
    pub engine: EngineConfig,

    #[serde(alias = "Fronius")]
    pub fronius: Option<FroniusSection>,

    pub pvprivate: Option<PvPrivateSection>,

    /// primary field -> preferred field
    #[serde(alias = "UsePreferred")]
    pub use_preferred: Option<BTreeMap<String, String>>,

    #[serde(alias = "Windguru")]
    pub windguru: Option<WindguruSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Log level used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Width of one archive record in seconds
    #[serde(default = "default_archive_interval")]
    pub archive_interval: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Explicit handler order; defaults to every configured handler in the built-in order
    #[serde(default)]
    pub handlers: Option<Vec<String>>,
}

/// Fronius Solar API source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FroniusSection {
    /// GetArchiveData endpoint including the trailing `?`
    pub api_url: String,

    /// Device time zone: `Z`, a UTC offset or an IANA name
    #[serde(default = "default_time_zone", alias = "timeZone")]
    pub time_zone: String,

    /// Installed watts peak
    #[serde(alias = "installedWP")]
    pub installed_wp: f64,

    #[serde(default = "default_archive_column")]
    pub archive_column: String,

    #[serde(default = "default_device_timeout")]
    pub timeout_secs: u64,
}

/// Private PV telemetry source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PvPrivateSection {
    pub api_url: String,

    #[serde(alias = "installedWP")]
    pub installed_wp: f64,

    #[serde(default = "default_archive_column")]
    pub archive_column: String,

    #[serde(default, alias = "deviceId")]
    pub device_id: Option<String>,

    #[serde(default = "default_device_timeout")]
    pub timeout_secs: u64,
}

/// Windguru upload target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindguruSection {
    pub url: String,

    pub uid: String,

    /// Record field used as sea-level pressure
    #[serde(default = "default_barometer")]
    pub barometer: String,

    #[serde(default = "default_upload_timeout")]
    pub timeout_secs: u64,
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_archive_interval() -> i64 {
    300 // 5 minutes, the host default
}

fn default_time_zone() -> String {
    "Z".to_owned()
}

fn default_archive_column() -> String {
    "radiation".to_owned()
}

fn default_barometer() -> String {
    "pressure".to_owned()
}

fn default_device_timeout() -> u64 {
    10
}

fn default_upload_timeout() -> u64 {
    1
}

impl FroniusSection {
    pub fn to_handler_config(&self) -> Result<FroniusConfig> {
        let time_zone: DeviceTimeZone = self
            .time_zone
            .parse()
            .with_context(|| format!("Invalid fronius.time_zone '{}'", self.time_zone))?;

        Ok(FroniusConfig {
            api_url: self.api_url.clone(),
            time_zone,
            installed_wp: self.installed_wp,
            archive_column: self.archive_column.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        })
    }
}

impl PvPrivateSection {
    pub fn to_handler_config(&self) -> PvPrivateConfig {
        PvPrivateConfig {
            api_url: self.api_url.clone(),
            installed_wp: self.installed_wp,
            archive_column: self.archive_column.clone(),
            device_id: self.device_id.clone().filter(|id| !id.is_empty()),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

impl WindguruSection {
    pub fn to_handler_config(&self) -> WindguruConfig {
        WindguruConfig {
            url: self.url.clone(),
            uid: self.uid.clone(),
            barometer: self.barometer.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

impl AppConfig {
    /// Load configuration from an explicit path, `WXBRIDGE_CONFIG`, or the working directory
    pub fn load(path: Option<&Path>) -> Result<(Self, PathBuf)> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::locate()?,
        };

        let config = Self::from_file(&path)?;
        Ok((config, path))
    }

    fn locate() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Ok(PathBuf::from(path));
        }

        CONFIG_CANDIDATES
            .iter()
            .map(PathBuf::from)
            .find(|candidate| candidate.is_file())
            .with_context(|| {
                format!(
                    "No configuration found: pass --config, set {CONFIG_ENV}, or create one of {}",
                    CONFIG_CANDIDATES.join(", ")
                )
            })
    }

    /// Parse and validate a config file; `.json` files are JSON, anything else TOML
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config: AppConfig = if is_json {
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Handlers in invocation order
    pub fn handler_order(&self) -> Vec<String> {
        match &self.engine.handlers {
            Some(handlers) => handlers.clone(),
            None => DEFAULT_ORDER
                .iter()
                .filter(|name| self.is_configured(name))
                .map(|name| (*name).to_owned())
                .collect(),
        }
    }

    fn is_configured(&self, name: &str) -> bool {
        match name {
            FroniusHandler::NAME => self.fronius.is_some(),
            PvPrivateHandler::NAME => self.pvprivate.is_some(),
            UsePreferredHandler::NAME => self.use_preferred.is_some(),
            WindguruHandler::NAME => self.windguru.is_some(),
            _ => false,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.archive.archive_interval <= 0 {
            anyhow::bail!(
                "archive_interval must be positive, got {}",
                self.archive.archive_interval
            );
        }

        let order = self.handler_order();
        if order.is_empty() {
            anyhow::bail!("Configuration must enable at least one handler");
        }

        let mut seen = HashSet::new();
        for name in &order {
            if !DEFAULT_ORDER.contains(&name.as_str()) {
                anyhow::bail!(
                    "Unknown handler '{}' (must be one of: {})",
                    name,
                    DEFAULT_ORDER.join(", ")
                );
            }
            if !self.is_configured(name) {
                anyhow::bail!("Handler '{name}' is enabled but has no [{name}] section");
            }
            if !seen.insert(name.as_str()) {
                anyhow::bail!("Handler '{name}' is listed more than once");
            }
        }

        if let Some(fronius) = &self.fronius {
            validate_source("fronius", &fronius.api_url, fronius.installed_wp)?;
            validate_column("fronius", &fronius.archive_column)?;
            validate_timeout("fronius", fronius.timeout_secs)?;
            fronius.time_zone.parse::<DeviceTimeZone>().with_context(|| {
                format!("fronius.time_zone '{}' is not a valid zone", fronius.time_zone)
            })?;
        }

        if let Some(pv) = &self.pvprivate {
            validate_source("pvprivate", &pv.api_url, pv.installed_wp)?;
            validate_column("pvprivate", &pv.archive_column)?;
            validate_timeout("pvprivate", pv.timeout_secs)?;
        }

        if let (Some(fronius), Some(pv)) = (&self.fronius, &self.pvprivate)
            && fronius.archive_column == pv.archive_column
            && seen.contains(FroniusHandler::NAME)
            && seen.contains(PvPrivateHandler::NAME)
        {
            warn!(
                "fronius and pvprivate both write '{}', the later handler wins",
                fronius.archive_column
            );
        }

        if let Some(pairs) = &self.use_preferred {
            for (primary, preferred) in pairs {
                if primary.is_empty() || preferred.is_empty() {
                    anyhow::bail!("use_preferred entries must name both fields");
                }
                if primary == preferred {
                    warn!("use_preferred maps '{}' onto itself", primary);
                }
            }
        }

        if let Some(windguru) = &self.windguru {
            if windguru.url.is_empty() {
                anyhow::bail!("windguru.url cannot be empty");
            }
            if windguru.uid.is_empty() {
                anyhow::bail!("windguru.uid cannot be empty");
            }
            if windguru.barometer.is_empty() {
                anyhow::bail!("windguru.barometer cannot be empty");
            }
            validate_timeout("windguru", windguru.timeout_secs)?;
        }

        Ok(())
    }

    /// Build the handler chain in configured order
    pub fn build_chain(&self) -> Result<HandlerChain> {
        let mut chain = HandlerChain::new();

        for name in self.handler_order() {
            match name.as_str() {
                FroniusHandler::NAME => {
                    let section = self.fronius.as_ref().context("Missing [fronius] section")?;
                    let handler = FroniusHandler::new(section.to_handler_config()?)
                        .context("Failed to create Fronius handler")?;
                    chain.register(Arc::new(handler));
                }
                PvPrivateHandler::NAME => {
                    let section = self
                        .pvprivate
                        .as_ref()
                        .context("Missing [pvprivate] section")?;
                    let handler = PvPrivateHandler::new(section.to_handler_config())
                        .context("Failed to create private PV handler")?;
                    chain.register(Arc::new(handler));
                }
                UsePreferredHandler::NAME => {
                    let pairs = self
                        .use_preferred
                        .clone()
                        .context("Missing [use_preferred] section")?;
                    chain.register(Arc::new(UsePreferredHandler::new(pairs)));
                }
                WindguruHandler::NAME => {
                    let section = self
                        .windguru
                        .as_ref()
                        .context("Missing [windguru] section")?;
                    let handler = WindguruHandler::new(section.to_handler_config())
                        .context("Failed to create Windguru handler")?;
                    chain.register(Arc::new(handler));
                }
                other => anyhow::bail!("Unknown handler '{other}'"),
            }
        }

        Ok(chain)
    }
}

fn validate_source(section: &str, api_url: &str, installed_wp: f64) -> Result<()> {
    if api_url.is_empty() {
        anyhow::bail!("{section}.api_url cannot be empty");
    }
    if installed_wp <= 0.0 || !installed_wp.is_finite() {
        anyhow::bail!("{section}.installed_wp must be positive, got {installed_wp}");
    }
    Ok(())
}

fn validate_column(section: &str, column: &str) -> Result<()> {
    if column.is_empty() {
        anyhow::bail!("{section}.archive_column cannot be empty");
    }
    Ok(())
}

fn validate_timeout(section: &str, timeout_secs: u64) -> Result<()> {
    if timeout_secs == 0 {
        anyhow::bail!("{section}.timeout_secs must be at least 1 second");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const FULL_TOML: &str = r#"
[system]
log_level = "debug"

[archive]
archive_interval = 600

[engine]
handlers = ["pvprivate", "use_preferred", "windguru"]

[fronius]
api_url = "http://inverter/solar_api/v1/GetArchiveData.cgi?"
time_zone = "Europe/Vienna"
installed_wp = 3000.0

[pvprivate]
api_url = "http://pv:8080/api/getSumProduced/"
installed_wp = 4200.0
archive_column = "signal1"
device_id = "roof"

[use_preferred]
radiation = "signal1"

[windguru]
url = "http://www.windguru.cz/upload/upload_custom.php"
uid = "station-uid"
barometer = "barometer"
"#;

    fn parse(toml_str: &str) -> AppConfig {
        toml::from_str(toml_str).unwrap()
    }

    fn write_temp(contents: &str, suffix: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_full_config() {
        let config = parse(FULL_TOML);

        assert_eq!(config.system.log_level, "debug");
        assert_eq!(config.archive.archive_interval, 600);
        assert_eq!(
            config.handler_order(),
            vec!["pvprivate", "use_preferred", "windguru"]
        );
        let pv = config.pvprivate.as_ref().unwrap();
        assert_eq!(pv.device_id.as_deref(), Some("roof"));
        assert_eq!(pv.timeout_secs, 10);
        assert_eq!(config.windguru.as_ref().unwrap().timeout_secs, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config = parse(
            r#"
[archive]

[fronius]
api_url = "http://inverter/?"
installed_wp = 3000.0

[windguru]
url = "http://windguru/upload"
uid = "abc"
"#,
        );

        assert_eq!(config.system.log_level, "info");
        assert_eq!(config.archive.archive_interval, 300);
        let fronius = config.fronius.as_ref().unwrap();
        assert_eq!(fronius.time_zone, "Z");
        assert_eq!(fronius.archive_column, "radiation");
        assert_eq!(config.windguru.as_ref().unwrap().barometer, "pressure");
        assert_eq!(config.handler_order(), vec!["fronius", "windguru"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_station_style_aliases() {
        let config = parse(
            r#"
[StdArchive]
archive_interval = 300

[Fronius]
api_url = "http://inverter/solar_api/v1/GetArchiveData.cgi?"
timeZone = "+01:00"
installedWP = 3000
archive_column = "signal1"

[pvprivate]
api_url = "http://pv/api/getSumProduced/"
installedWP = 2500
deviceId = "garage"

[UsePreferred]
radiation = "signal1"
outTemp = "extraTemp1"

[Windguru]
url = "http://www.windguru.cz/upload/upload_custom.php"
uid = "uid"
barometer = "barometer"
"#,
        );

        let fronius = config.fronius.as_ref().unwrap();
        assert_eq!(fronius.time_zone, "+01:00");
        assert!((fronius.installed_wp - 3000.0).abs() < f64::EPSILON);
        assert_eq!(
            config.pvprivate.as_ref().unwrap().device_id.as_deref(),
            Some("garage")
        );
        assert_eq!(config.use_preferred.as_ref().unwrap().len(), 2);
        assert_eq!(
            config.handler_order(),
            vec!["fronius", "pvprivate", "use_preferred", "windguru"]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_interval() {
        let mut config = parse(FULL_TOML);
        config.archive.archive_interval = 0;

        assert!(
            config
                .validate()
                .unwrap_err()
                .to_string()
                .contains("archive_interval must be positive")
        );
    }

    #[test]
    fn test_validate_unknown_handler() {
        let mut config = parse(FULL_TOML);
        config.engine.handlers = Some(vec!["wunderground".to_owned()]);

        assert!(
            config
                .validate()
                .unwrap_err()
                .to_string()
                .contains("Unknown handler 'wunderground'")
        );
    }

    #[test]
    fn test_validate_handler_without_section() {
        let mut config = parse(FULL_TOML);
        config.windguru = None;

        assert!(
            config
                .validate()
                .unwrap_err()
                .to_string()
                .contains("has no [windguru] section")
        );
    }

    #[test]
    fn test_validate_duplicate_handler() {
        let mut config = parse(FULL_TOML);
        config.engine.handlers = Some(vec!["windguru".to_owned(), "windguru".to_owned()]);

        assert!(config.validate().unwrap_err().to_string().contains("more than once"));
    }

    #[test]
    fn test_validate_no_handlers() {
        let config = parse("[archive]\narchive_interval = 300\n");

        assert!(
            config
                .validate()
                .unwrap_err()
                .to_string()
                .contains("at least one handler")
        );
    }

    #[test]
    fn test_validate_installed_capacity() {
        let mut config = parse(FULL_TOML);
        config.pvprivate.as_mut().unwrap().installed_wp = 0.0;

        assert!(
            config
                .validate()
                .unwrap_err()
                .to_string()
                .contains("pvprivate.installed_wp must be positive")
        );
    }

    #[test]
    fn test_validate_time_zone() {
        let mut config = parse(FULL_TOML);
        config.fronius.as_mut().unwrap().time_zone = "Atlantis/Central".to_owned();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_windguru_uid() {
        let mut config = parse(FULL_TOML);
        config.windguru.as_mut().unwrap().uid = String::new();

        assert!(config.validate().unwrap_err().to_string().contains("uid"));
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = parse(FULL_TOML);
        config.windguru.as_mut().unwrap().timeout_secs = 0;

        assert!(config.validate().unwrap_err().to_string().contains("timeout_secs"));
    }

    #[test]
    fn test_build_chain_follows_order() {
        let config = parse(FULL_TOML);

        let chain = config.build_chain().unwrap();

        assert_eq!(chain.names(), vec!["pvprivate", "use_preferred", "windguru"]);
    }

    #[test]
    fn test_section_conversion() {
        let config = parse(FULL_TOML);

        let fronius = config.fronius.as_ref().unwrap().to_handler_config().unwrap();
        assert_eq!(fronius.time_zone.to_string(), "Europe/Vienna");
        assert_eq!(fronius.timeout, Duration::from_secs(10));

        let windguru = config.windguru.as_ref().unwrap().to_handler_config();
        assert_eq!(windguru.barometer, "barometer");
        assert_eq!(windguru.timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_empty_device_id_is_ignored() {
        let mut config = parse(FULL_TOML);
        config.pvprivate.as_mut().unwrap().device_id = Some(String::new());

        let pv = config.pvprivate.as_ref().unwrap().to_handler_config();

        assert_eq!(pv.device_id, None);
    }

    #[test]
    fn test_load_toml_file() {
        let file = write_temp(FULL_TOML, ".toml");

        let (config, path) = AppConfig::load(Some(file.path())).unwrap();

        assert_eq!(path, file.path());
        assert_eq!(config.archive.archive_interval, 600);
    }

    #[test]
    fn test_load_json_file() {
        let json = serde_json::json!({
            "archive": { "archive_interval": 300 },
            "use_preferred": { "outTemp": "extraTemp1" }
        })
        .to_string();
        let file = write_temp(&json, ".json");

        let config = AppConfig::from_file(file.path()).unwrap();

        assert_eq!(config.handler_order(), vec!["use_preferred"]);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let file = write_temp("[archive]\narchive_interval = -5\n[use_preferred]\na = \"b\"\n", ".toml");

        assert!(AppConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let result = AppConfig::from_file(Path::new("/nonexistent/wxbridge.toml"));

        assert!(result.unwrap_err().to_string().contains("Failed to read"));
    }
}
