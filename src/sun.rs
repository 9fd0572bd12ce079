//! Sunrise lookup for a calendar date.
//!
//! The schedule is anchored on the reference day's sunrise. Two providers exist:
//! - [`SolarSunrise`] computes sunrise from geographic coordinates with the
//!   `sunrise` crate and converts it to local time.
//! - [`FixedSunrise`] uses a configured time of day, for setups without a
//!   location or where a fixed anchor is preferred.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use sunrise::{Coordinates, SolarDay, SolarEvent};

use crate::config::Config;
use crate::constants::DEFAULT_SUNRISE;
use crate::logger::Log;

/// Source of the local sunrise instant for a date.
#[cfg_attr(test, mockall::automock)]
pub trait SunriseProvider {
    fn sunrise_on(&self, date: NaiveDate) -> Result<NaiveDateTime>;
}

/// Sunrise calculated from latitude and longitude.
#[derive(Debug, Clone, Copy)]
pub struct SolarSunrise {
    latitude: f64,
    longitude: f64,
}

impl SolarSunrise {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            anyhow::bail!(
                "Invalid latitude: {}. Must be between -90 and 90 degrees",
                latitude
            );
        }
        if !(-180.0..=180.0).contains(&longitude) {
            anyhow::bail!(
                "Invalid longitude: {}. Must be between -180 and 180 degrees",
                longitude
            );
        }

        let solar = Self {
            latitude,
            longitude,
        };
        solar.coordinates()?;
        Ok(solar)
    }

    fn coordinates(&self) -> Result<Coordinates> {
        Coordinates::new(self.latitude, self.longitude)
            .ok_or_else(|| anyhow::anyhow!("Failed to create coordinates"))
    }
}

impl SunriseProvider for SolarSunrise {
    fn sunrise_on(&self, date: NaiveDate) -> Result<NaiveDateTime> {
        let sunrise_utc = SolarDay::new(self.coordinates()?, date).event_time(SolarEvent::Sunrise);
        let sunrise = sunrise_utc.with_timezone(&Local).naive_local();

        // Near the poles the sun may not rise at all on some dates
        if (sunrise.date() - date).num_days().abs() > 1 {
            anyhow::bail!(
                "No usable sunrise for {:.4}, {:.4} on {}",
                self.latitude,
                self.longitude,
                date
            );
        }

        Ok(sunrise)
    }
}

/// Sunrise at the same configured time every day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedSunrise {
    time: NaiveTime,
}

impl FixedSunrise {
    pub fn new(time: NaiveTime) -> Self {
        Self { time }
    }

    /// Parse a `HH:MM:SS` time of day.
    pub fn parse(time: &str) -> Result<Self> {
        let time = NaiveTime::parse_from_str(time, "%H:%M:%S")
            .with_context(|| format!("Invalid sunrise time '{}'. Use HH:MM:SS format", time))?;
        Ok(Self::new(time))
    }
}

impl SunriseProvider for FixedSunrise {
    fn sunrise_on(&self, date: NaiveDate) -> Result<NaiveDateTime> {
        Ok(date.and_time(self.time))
    }
}

/// Pick the sunrise provider the configuration asks for.
///
/// Coordinates win; without them the fixed `sunrise` time is used.
pub fn sunrise_provider_from_config(config: &Config) -> Result<Box<dyn SunriseProvider>> {
    if let (Some(lat), Some(lon)) = (config.latitude, config.longitude) {
        Log::log_debug(&format!("Using solar sunrise for {:.4}, {:.4}", lat, lon));
        return Ok(Box::new(SolarSunrise::new(lat, lon)?));
    }

    let sunrise = config.sunrise.as_deref().unwrap_or(DEFAULT_SUNRISE);
    Log::log_debug(&format!("Using fixed sunrise at {}", sunrise));
    Ok(Box::new(FixedSunrise::parse(sunrise)?))
}
