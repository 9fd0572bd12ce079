//! # Poolpump
//!
//! Daily run schedule and on/off control for a pool circulation pump.
//!
//! Each day the pump runs twice, with a break between runs. The first run
//! starts a season-dependent offset after sunrise, and run starts snap onto a
//! 5-minute grid. The total run time comes from the pool temperature. A
//! critical water level keeps the pump off regardless of the schedule.
//!
//! ## Architecture
//!
//! - **run**: A single scheduled interval and its display label
//! - **schedule**: Parameter derivation, schedule construction, and evaluation
//! - **season**: Swimming and off-season presets
//! - **error**: Schedule construction errors
//! - **sun**: Sunrise providers (solar calculation or a fixed time)
//! - **host**: File-backed sensors, pump switch, and status output
//! - **manager**: One check cycle tying the pieces together
//! - **config**: Configuration loading, validation, and default generation
//! - **constants**: Application-wide constants and defaults
//! - **logger**: Structured logging with visual formatting
//! - **args**: Command-line parsing

pub mod args;
pub mod config;
pub mod constants;
pub mod error;
pub mod host;
pub mod logger;
pub mod manager;
pub mod run;
pub mod schedule;
pub mod season;
pub mod sun;

// Re-export important types for easier access
pub use config::Config;
pub use error::ScheduleError;
pub use host::{FileStateReader, FileStatusSink, FileSwitch, InputSnapshot, SwitchState};
pub use logger::{Log, LogLevel};
pub use manager::{CycleReport, PoolPumpManager, SwitchOutcome};
pub use run::Run;
pub use schedule::{Schedule, ScheduleBuilder, ScheduleParameters, build_schedule};
pub use season::{Season, SeasonPolicy};
pub use sun::{FixedSunrise, SolarSunrise, SunriseProvider};
