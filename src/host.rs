//! Host-side collaborators: sensor reads, the pump switch, and status output.
//!
//! The daemon talks to the outside world through small text files, one value
//! per file (`Auto`, `21.5`, `on`, ...), which makes it easy to wire up to
//! home automation bridges, GPIO helpers, or plain shell scripts.
//!
//! Everything is read once per cycle into an [`InputSnapshot`] so schedule
//! construction and evaluation only ever see plain data.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::constants::*;
use crate::logger::Log;

/// Read-only view on the pool's live state.
#[cfg_attr(test, mockall::automock)]
pub trait PoolStateReader {
    /// Pump mode, e.g. `Auto` for automatic control.
    fn mode(&self) -> Result<String>;

    /// Pool water temperature in °C.
    fn temperature(&self) -> Result<f64>;

    /// Whether the water level is critical. Unknown or unconfigured reads as `false`.
    fn water_level_critical(&self) -> bool;
}

/// On/off state of the pump switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchState {
    On,
    Off,
}

impl SwitchState {
    pub fn from_decision(on: bool) -> Self {
        if on { SwitchState::On } else { SwitchState::Off }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SwitchState::On => STATE_ON,
            SwitchState::Off => STATE_OFF,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            STATE_ON => Some(SwitchState::On),
            STATE_OFF => Some(SwitchState::Off),
            _ => None,
        }
    }
}

/// The physical or virtual pump switch.
#[cfg_attr(test, mockall::automock)]
pub trait PumpSwitch {
    fn state(&self) -> Result<SwitchState>;
    fn set_state(&self, target: SwitchState) -> Result<()>;
}

/// Destination for the human readable schedule label.
#[cfg_attr(test, mockall::automock)]
pub trait StatusSink {
    fn publish_schedule(&self, label: &str) -> Result<()>;
}

/// Convert a temperature reading into the total daily run-hours.
///
/// Non-finite or negative readings are treated as unavailable.
pub fn run_hours_from_temperature(temperature: f64) -> Result<f64> {
    if !temperature.is_finite() || temperature < 0.0 {
        anyhow::bail!("Unusable pool temperature reading: {}", temperature);
    }
    Ok(temperature / TEMPERATURE_TO_RUN_HOURS_DIVISOR)
}

/// Inputs for one check cycle, resolved once up front.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputSnapshot {
    pub run_hours_total: f64,
    pub water_level_critical: bool,
}

impl InputSnapshot {
    pub fn resolve(reader: &dyn PoolStateReader) -> Result<Self> {
        let temperature = reader
            .temperature()
            .context("Pool temperature unavailable")?;
        let run_hours_total = run_hours_from_temperature(temperature)?;
        Ok(Self {
            run_hours_total,
            water_level_critical: reader.water_level_critical(),
        })
    }
}

fn read_value(path: &Path) -> Result<String> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(content.trim().to_string())
}

/// [`PoolStateReader`] backed by one file per value.
#[derive(Debug, Clone)]
pub struct FileStateReader {
    mode_path: PathBuf,
    temperature_path: PathBuf,
    water_level_critical_path: Option<PathBuf>,
}

impl FileStateReader {
    pub fn new(
        mode_path: impl Into<PathBuf>,
        temperature_path: impl Into<PathBuf>,
        water_level_critical_path: Option<PathBuf>,
    ) -> Self {
        Self {
            mode_path: mode_path.into(),
            temperature_path: temperature_path.into(),
            water_level_critical_path,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.mode_path,
            &config.temperature_path,
            config.water_level_critical_path.as_ref().map(PathBuf::from),
        )
    }
}

impl PoolStateReader for FileStateReader {
    fn mode(&self) -> Result<String> {
        read_value(&self.mode_path).context("Pool pump mode unavailable")
    }

    fn temperature(&self) -> Result<f64> {
        let raw = read_value(&self.temperature_path)?;
        raw.parse::<f64>().with_context(|| {
            format!(
                "Invalid temperature '{}' in {}",
                raw,
                self.temperature_path.display()
            )
        })
    }

    fn water_level_critical(&self) -> bool {
        let Some(path) = &self.water_level_critical_path else {
            return false;
        };
        match read_value(path) {
            Ok(value) => SwitchState::parse(&value) == Some(SwitchState::On),
            Err(e) => {
                Log::log_warning(&format!("Water level state unknown: {}", e));
                false
            }
        }
    }
}

/// [`PumpSwitch`] backed by a state file holding `on` or `off`.
#[derive(Debug, Clone)]
pub struct FileSwitch {
    path: PathBuf,
}

impl FileSwitch {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(config: &Config) -> Option<Self> {
        config.switch_path.as_ref().map(Self::new)
    }
}

impl PumpSwitch for FileSwitch {
    fn state(&self) -> Result<SwitchState> {
        let raw = read_value(&self.path)?;
        SwitchState::parse(&raw).with_context(|| {
            format!("Unknown switch state '{}' in {}", raw, self.path.display())
        })
    }

    fn set_state(&self, target: SwitchState) -> Result<()> {
        fs::write(&self.path, format!("{}\n", target.as_str()))
            .with_context(|| format!("Failed to write switch state to {}", self.path.display()))
    }
}

/// [`StatusSink`] writing the label to a file; a no-op when no path is configured.
#[derive(Debug, Clone, Default)]
pub struct FileStatusSink {
    path: Option<PathBuf>,
}

impl FileStatusSink {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.schedule_path.as_ref().map(PathBuf::from))
    }
}

impl StatusSink for FileStatusSink {
    fn publish_schedule(&self, label: &str) -> Result<()> {
        let Some(path) = &self.path else {
            Log::log_debug(&format!("Schedule: {}", label));
            return Ok(());
        };
        fs::write(path, format!("{}\n", label))
            .with_context(|| format!("Failed to write schedule to {}", path.display()))
    }
}
