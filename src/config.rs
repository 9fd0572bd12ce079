//! Configuration loading, defaults, and validation.
//!
//! The configuration lives at `~/.config/poolpump/poolpump.toml` (respecting
//! `XDG_CONFIG_HOME`). A commented default file is written on first start.
//! An optional `geo.toml` next to it may carry `latitude`/`longitude`, which
//! then override the coordinates of the main file.
//!
//! ## Configuration Structure
//!
//! ```toml
//! #[Host files]
//! mode_path = "/run/poolpump/mode"
//! temperature_path = "/run/poolpump/temperature"
//! switch_path = "/run/poolpump/switch"
//! schedule_path = "/run/poolpump/schedule"
//!
//! #[Schedule]
//! season = "swimming"
//! sunrise = "06:00:00"
//! scan_interval = 30
//! ```
//!
//! Without coordinates the fixed `sunrise` time anchors every day.

use anyhow::{Context, Result};
use chrono::NaiveTime;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::*;
use crate::logger::Log;
use crate::season::Season;

/// Coordinate override read from `geo.toml`.
#[derive(Debug, Deserialize, Default)]
struct GeoConfig {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

/// Daemon configuration, created once at startup.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// File holding the pump switch state. Without it decisions cannot be applied.
    pub switch_path: Option<String>,
    /// File holding the pump mode; `Auto` enables automatic control.
    pub mode_path: String,
    /// File holding the pool water temperature in °C.
    pub temperature_path: String,
    pub water_level_critical_path: Option<String>,
    /// File the schedule label is written to.
    pub schedule_path: Option<String>,
    pub season: Option<Season>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub sunrise: Option<String>, // HH:MM:SS, used without coordinates
    pub scan_interval: Option<u64>, // seconds
}

impl Config {
    /// Path of the geo.toml that sits next to `config_path`.
    pub fn geo_path_for(config_path: &Path) -> Option<PathBuf> {
        config_path.parent().map(|parent| parent.join("geo.toml"))
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;
        Ok(config_dir.join("poolpump").join("poolpump.toml"))
    }

    /// Write a commented default configuration to `path`.
    pub fn create_default_config(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = ConfigBuilder::new()
            .add_section("Host files")
            .add_setting(
                "mode_path",
                &format!("\"{}\"", DEFAULT_MODE_PATH),
                "Pump mode, \"Auto\" enables automatic control",
            )
            .add_setting(
                "temperature_path",
                &format!("\"{}\"", DEFAULT_TEMPERATURE_PATH),
                "Pool water temperature in °C (halved into daily run-hours)",
            )
            .add_setting(
                "switch_path",
                &format!("\"{}\"", DEFAULT_SWITCH_PATH),
                "Pump switch state, \"on\" or \"off\"",
            )
            .add_setting(
                "schedule_path",
                &format!("\"{}\"", DEFAULT_SCHEDULE_PATH),
                "Where the next run label is written",
            )
            .add_section("Schedule")
            .add_setting(
                "season",
                &format!("\"{}\"", DEFAULT_SEASON),
                "\"swimming\" or \"off_season\"",
            )
            .add_setting(
                "sunrise",
                &format!("\"{}\"", DEFAULT_SUNRISE),
                "Fixed sunrise used without latitude/longitude",
            )
            .add_setting(
                "scan_interval",
                &DEFAULT_SCAN_INTERVAL.to_string(),
                &format!(
                    "Seconds between checks ({}-{})",
                    MINIMUM_SCAN_INTERVAL, MAXIMUM_SCAN_INTERVAL
                ),
            )
            .build();

        fs::write(path, content)
            .with_context(|| format!("Failed to write default config to {}", path.display()))?;

        Log::log_block_start(&format!(
            "Created default configuration at {}",
            path_for_display(path)
        ));
        Ok(())
    }

    fn apply_defaults_and_validate_fields(config: &mut Config) -> Result<()> {
        if config.season.is_none() {
            config.season = Some(Season::default());
        }

        match &config.sunrise {
            Some(sunrise) => {
                NaiveTime::parse_from_str(sunrise, "%H:%M:%S")
                    .context("Invalid sunrise time format in config. Use HH:MM:SS format")?;
            }
            None => config.sunrise = Some(DEFAULT_SUNRISE.to_string()),
        }

        if let Some(interval) = config.scan_interval {
            if !(MINIMUM_SCAN_INTERVAL..=MAXIMUM_SCAN_INTERVAL).contains(&interval) {
                anyhow::bail!(
                    "Scan interval must be between {} and {} seconds",
                    MINIMUM_SCAN_INTERVAL,
                    MAXIMUM_SCAN_INTERVAL
                );
            }
        } else {
            config.scan_interval = Some(DEFAULT_SCAN_INTERVAL);
        }

        Ok(())
    }

    /// Load an explicit configuration file.
    ///
    /// Unlike [`Config::load`], a missing file is an error and nothing is created.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!(
                "Configuration file not found at specified path: {}",
                path.display()
            );
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        Self::apply_defaults_and_validate_fields(&mut config)?;
        Self::load_geo_override_from_path(&mut config, path);
        validate_config(&config)?;

        Ok(config)
    }

    /// Apply `geo.toml` next to `config_path`, if there is one.
    ///
    /// A missing file is fine. An unreadable or malformed one is logged and skipped.
    fn load_geo_override_from_path(config: &mut Config, config_path: &Path) {
        let Some(geo_path) = Self::geo_path_for(config_path) else {
            return;
        };
        if !geo_path.exists() {
            return;
        }

        let content = match fs::read_to_string(&geo_path) {
            Ok(content) => content,
            Err(e) => {
                Log::log_warning(&format!(
                    "Failed to read geo.toml: {}. Using coordinates from main config.",
                    e
                ));
                return;
            }
        };

        match toml::from_str::<GeoConfig>(&content) {
            Ok(geo) => {
                if let Some(lat) = geo.latitude {
                    config.latitude = Some(lat);
                }
                if let Some(lon) = geo.longitude {
                    config.longitude = Some(lon);
                }
                Log::log_indented(&format!(
                    "Loaded geographic overrides from {}",
                    path_for_display(&geo_path)
                ));
            }
            Err(e) => {
                Log::log_warning(&format!(
                    "Failed to parse geo.toml: {}. Using coordinates from main config.",
                    e
                ));
            }
        }
    }

    /// Load the default configuration file, creating it when missing.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)
                .context("Failed to create default config during load")?;
        }

        Self::load_from_path(&config_path).with_context(|| {
            Log::log_pipe();
            format!(
                "Failed to load configuration from {}",
                config_path.display()
            )
        })
    }

    pub fn season(&self) -> Season {
        self.season.unwrap_or_default()
    }

    pub fn scan_interval(&self) -> u64 {
        self.scan_interval.unwrap_or(DEFAULT_SCAN_INTERVAL)
    }

    pub fn log_config(&self, config_path: &Path) {
        Log::log_block_start(&format!(
            "Loaded configuration from {}",
            path_for_display(config_path)
        ));
        if let Some(geo_path) = Self::geo_path_for(config_path).filter(|p| p.exists()) {
            Log::log_indented(&format!(
                "Loaded geo coordinates from {}",
                path_for_display(&geo_path)
            ));
        }

        Log::log_indented(&format!("Mode: {}", self.mode_path));
        Log::log_indented(&format!("Temperature: {}", self.temperature_path));
        Log::log_indented(&format!(
            "Switch: {}",
            self.switch_path.as_deref().unwrap_or("not configured")
        ));
        if let Some(path) = &self.water_level_critical_path {
            Log::log_indented(&format!("Water level: {}", path));
        }
        if let Some(path) = &self.schedule_path {
            Log::log_indented(&format!("Schedule output: {}", path));
        }

        Log::log_indented(&format!("Season: {}", self.season().as_str()));
        if let (Some(lat), Some(lon)) = (self.latitude, self.longitude) {
            let lat_dir = if lat >= 0.0 { "N" } else { "S" };
            let lon_dir = if lon >= 0.0 { "E" } else { "W" };
            Log::log_indented(&format!(
                "Location: {:.4}°{}, {:.4}°{}",
                lat.abs(),
                lat_dir,
                lon.abs(),
                lon_dir
            ));
        } else {
            Log::log_indented(&format!(
                "Sunrise time: {}",
                self.sunrise.as_deref().unwrap_or(DEFAULT_SUNRISE)
            ));
        }
        Log::log_indented(&format!(
            "Scan interval: {} seconds",
            self.scan_interval()
        ));
    }
}

/// Validation of the loaded configuration as a whole.
pub fn validate_config(config: &Config) -> Result<()> {
    if config.mode_path.trim().is_empty() {
        anyhow::bail!("mode_path must not be empty");
    }
    if config.temperature_path.trim().is_empty() {
        anyhow::bail!("temperature_path must not be empty");
    }
    for (key, value) in [
        ("switch_path", &config.switch_path),
        ("water_level_critical_path", &config.water_level_critical_path),
        ("schedule_path", &config.schedule_path),
    ] {
        if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
            anyhow::bail!("{} must not be empty when set", key);
        }
    }

    match (config.latitude, config.longitude) {
        (Some(lat), Some(lon)) => {
            if !(-90.0..=90.0).contains(&lat) {
                anyhow::bail!(
                    "Latitude must be between -90 and 90 degrees (got {})",
                    lat
                );
            }
            if !(-180.0..=180.0).contains(&lon) {
                anyhow::bail!(
                    "Longitude must be between -180 and 180 degrees (got {})",
                    lon
                );
            }
        }
        (None, None) => {}
        _ => anyhow::bail!("latitude and longitude must be set together"),
    }

    if let Some(sunrise) = &config.sunrise {
        NaiveTime::parse_from_str(sunrise, "%H:%M:%S")
            .context("Invalid sunrise time format")?;
    }

    let interval = config.scan_interval();
    if !(MINIMUM_SCAN_INTERVAL..=MAXIMUM_SCAN_INTERVAL).contains(&interval) {
        anyhow::bail!(
            "Scan interval ({} seconds) must be between {} and {} seconds",
            interval,
            MINIMUM_SCAN_INTERVAL,
            MAXIMUM_SCAN_INTERVAL
        );
    }

    Ok(())
}

/// Show paths under the home directory with a `~` prefix.
fn path_for_display(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(rest) = path.strip_prefix(&home) {
            return format!("~/{}", rest.display());
        }
    }
    path.display().to_string()
}

/// Builds a config file with settings aligned into one comment column.
struct ConfigBuilder {
    entries: Vec<ConfigEntry>,
}

struct ConfigEntry {
    content: String,
    entry_type: EntryType,
}

enum EntryType {
    Section,
    Setting { line: String, comment: String },
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn add_section(mut self, title: &str) -> Self {
        self.entries.push(ConfigEntry {
            content: format!("#[{}]", title),
            entry_type: EntryType::Section,
        });
        self
    }

    fn add_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        let line = format!("{} = {}", key, value);
        self.entries.push(ConfigEntry {
            content: line.clone(),
            entry_type: EntryType::Setting {
                line,
                comment: format!("# {}", comment),
            },
        });
        self
    }

    fn build(self) -> String {
        let width = self
            .entries
            .iter()
            .filter_map(|entry| match &entry.entry_type {
                EntryType::Setting { line, .. } => Some(line.len()),
                EntryType::Section => None,
            })
            .max()
            .unwrap_or(0)
            + 1;

        let mut lines = Vec::new();
        for (index, entry) in self.entries.into_iter().enumerate() {
            match entry.entry_type {
                EntryType::Section => {
                    if index > 0 {
                        lines.push(String::new());
                    }
                    lines.push(entry.content);
                }
                EntryType::Setting { line, comment } => {
                    lines.push(format!("{:<width$}{}", line, comment, width = width));
                }
            }
        }

        lines.push(String::new());
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::test_constants::*;
    use serial_test::serial;
    use tempfile::tempdir;

    fn create_test_config() -> Config {
        Config {
            switch_path: Some("/tmp/switch".to_string()),
            mode_path: "/tmp/mode".to_string(),
            temperature_path: "/tmp/temperature".to_string(),
            water_level_critical_path: None,
            schedule_path: None,
            season: Some(Season::Swimming),
            latitude: None,
            longitude: None,
            sunrise: Some(TEST_STANDARD_SUNRISE.to_string()),
            scan_interval: Some(TEST_STANDARD_SCAN_INTERVAL),
        }
    }

    fn write_config(dir: &Path, content: &str) -> PathBuf {
        let config_dir = dir.join("poolpump");
        fs::create_dir_all(&config_dir).unwrap();
        let path = config_dir.join("poolpump.toml");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_config_validation_basic() {
        assert!(validate_config(&create_test_config()).is_ok());
    }

    #[test]
    fn test_config_validation_empty_paths() {
        let mut config = create_test_config();
        config.mode_path = "  ".to_string();
        assert!(validate_config(&config).is_err());

        let mut config = create_test_config();
        config.temperature_path = String::new();
        assert!(validate_config(&config).is_err());

        let mut config = create_test_config();
        config.switch_path = Some(String::new());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_config_validation_coordinates() {
        let mut config = create_test_config();
        config.latitude = Some(40.7128);
        config.longitude = Some(-74.0060);
        assert!(validate_config(&config).is_ok());

        config.latitude = Some(91.0);
        assert!(validate_config(&config).is_err());

        config.latitude = Some(40.7128);
        config.longitude = Some(-181.0);
        assert!(validate_config(&config).is_err());

        config.longitude = None;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_config_validation_scan_interval() {
        let mut config = create_test_config();
        config.scan_interval = Some(MINIMUM_SCAN_INTERVAL);
        assert!(validate_config(&config).is_ok());
        config.scan_interval = Some(MAXIMUM_SCAN_INTERVAL);
        assert!(validate_config(&config).is_ok());
        config.scan_interval = Some(MINIMUM_SCAN_INTERVAL - 1);
        assert!(validate_config(&config).is_err());
        config.scan_interval = Some(MAXIMUM_SCAN_INTERVAL + 1);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_config_validation_invalid_sunrise() {
        let mut config = create_test_config();
        config.sunrise = Some("6:00".to_string());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_config_toml_parsing_applies_defaults() {
        let temp_dir = tempdir().unwrap();
        let path = write_config(
            temp_dir.path(),
            r#"
mode_path = "/run/poolpump/mode"
temperature_path = "/run/poolpump/temperature"
"#,
        );

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.season, Some(Season::Swimming));
        assert_eq!(config.sunrise.as_deref(), Some(DEFAULT_SUNRISE));
        assert_eq!(config.scan_interval, Some(DEFAULT_SCAN_INTERVAL));
        assert_eq!(config.switch_path, None);
    }

    #[test]
    fn test_config_toml_parsing_off_season() {
        let temp_dir = tempdir().unwrap();
        let path = write_config(
            temp_dir.path(),
            r#"
mode_path = "/run/poolpump/mode"
temperature_path = "/run/poolpump/temperature"
switch_path = "/run/poolpump/switch"
season = "off_season"
sunrise = "07:30:00"
scan_interval = 60
"#,
        );

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.season(), Season::OffSeason);
        assert_eq!(config.sunrise.as_deref(), Some("07:30:00"));
        assert_eq!(config.scan_interval(), 60);
    }

    #[test]
    fn test_config_malformed_toml() {
        let temp_dir = tempdir().unwrap();
        let path = write_config(temp_dir.path(), "mode_path = [unterminated");
        assert!(Config::load_from_path(&path).is_err());
    }

    #[test]
    fn test_config_missing_required_path() {
        let temp_dir = tempdir().unwrap();
        let path = write_config(temp_dir.path(), "mode_path = \"/run/poolpump/mode\"\n");
        assert!(Config::load_from_path(&path).is_err());
    }

    #[test]
    fn test_config_unknown_season() {
        let temp_dir = tempdir().unwrap();
        let path = write_config(
            temp_dir.path(),
            r#"
mode_path = "/run/poolpump/mode"
temperature_path = "/run/poolpump/temperature"
season = "winter"
"#,
        );
        assert!(Config::load_from_path(&path).is_err());
    }

    #[test]
    fn test_load_from_missing_path() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("absent.toml");
        assert!(Config::load_from_path(&path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_default_config_file_creation() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("poolpump").join("poolpump.toml");

        Config::create_default_config(&path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("#[Host files]"));
        assert!(content.contains("#[Schedule]"));
        assert!(content.contains("season = \"swimming\""));

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.mode_path, DEFAULT_MODE_PATH);
        assert_eq!(config.switch_path.as_deref(), Some(DEFAULT_SWITCH_PATH));
        assert_eq!(config.scan_interval(), DEFAULT_SCAN_INTERVAL);
    }

    #[test]
    fn test_config_builder_aligns_comments() {
        let content = ConfigBuilder::new()
            .add_section("A")
            .add_setting("a", "1", "first")
            .add_setting("longer_key", "2", "second")
            .build();
        let columns: Vec<usize> = content
            .lines()
            .filter(|line| !line.starts_with("#["))
            .filter_map(|line| line.find('#'))
            .collect();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0], columns[1]);
    }

    #[test]
    fn test_geo_path_is_next_to_config() {
        let config_path = Path::new("/etc/poolpump/poolpump.toml");
        assert_eq!(
            Config::geo_path_for(config_path),
            Some(PathBuf::from("/etc/poolpump/geo.toml"))
        );
        assert_eq!(Config::geo_path_for(Path::new("")), None);
    }

    #[test]
    fn test_geo_toml_overrides_main_config() {
        let temp_dir = tempdir().unwrap();
        let path = write_config(
            temp_dir.path(),
            r#"
mode_path = "/run/poolpump/mode"
temperature_path = "/run/poolpump/temperature"
latitude = 40.7128
longitude = -74.0060
"#,
        );
        fs::write(
            path.parent().unwrap().join("geo.toml"),
            "latitude = 51.5074\nlongitude = -0.1278\n",
        )
        .unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.latitude, Some(51.5074));
        assert_eq!(config.longitude, Some(-0.1278));
    }

    #[test]
    fn test_malformed_geo_toml_fallback() {
        let temp_dir = tempdir().unwrap();
        let path = write_config(
            temp_dir.path(),
            r#"
mode_path = "/run/poolpump/mode"
temperature_path = "/run/poolpump/temperature"
latitude = 40.7128
longitude = -74.0060
"#,
        );
        fs::write(path.parent().unwrap().join("geo.toml"), "latitude = [").unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.latitude, Some(40.7128));
        assert_eq!(config.longitude, Some(-74.0060));
    }

    #[test]
    #[serial]
    fn test_config_load_default_creation() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("poolpump").join("poolpump.toml");

        let original = std::env::var("XDG_CONFIG_HOME").ok();
        unsafe {
            std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());
        }

        let result = Config::load();

        unsafe {
            match original {
                Some(val) => std::env::set_var("XDG_CONFIG_HOME", val),
                None => std::env::remove_var("XDG_CONFIG_HOME"),
            }
        }

        assert!(result.is_ok());
        assert!(config_path.exists());
    }
}
