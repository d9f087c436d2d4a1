//! Configuration management.
//!
//! [`SweepConfig`] carries the validated sweep parameters; [`Settings`] is the
//! on-disk TOML shape (`[sweep]`, `[output]`, `[logging]` tables) loaded
//! through the `config` crate. Defaults match the qualification procedure's
//! historical parameters: 0 V to 150 V in 5 V steps with a 1 s settle delay.

use crate::error::{AppResult, SweepError};
use config::Config;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Parameters of one voltage sweep.
///
/// Units are volts and seconds. Setpoints are positive magnitudes; the
/// hardware's negative sign convention is applied at the driver boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    /// First setpoint magnitude in volts.
    #[serde(default = "default_voltage_min")]
    pub voltage_min: f64,
    /// Last setpoint magnitude in volts (inclusive).
    #[serde(default = "default_voltage_max")]
    pub voltage_max: f64,
    /// Increment between setpoints in volts.
    #[serde(default = "default_voltage_step")]
    pub voltage_step: f64,
    /// Settle delay after commanding each setpoint, in seconds.
    #[serde(default = "default_delay_sec")]
    pub delay_sec: f64,
}

fn default_voltage_min() -> f64 {
    0.0
}

fn default_voltage_max() -> f64 {
    150.0
}

fn default_voltage_step() -> f64 {
    5.0
}

fn default_delay_sec() -> f64 {
    1.0
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            voltage_min: default_voltage_min(),
            voltage_max: default_voltage_max(),
            voltage_step: default_voltage_step(),
            delay_sec: default_delay_sec(),
        }
    }
}

impl SweepConfig {
    /// Check the sweep parameters before any hardware is touched.
    ///
    /// Rejects a non-positive or non-finite step, an inverted range,
    /// non-finite bounds, and a delay that is negative or too large to
    /// become a sleep duration.
    pub fn validate(&self) -> AppResult<()> {
        let fields = [
            ("voltage_min", self.voltage_min),
            ("voltage_max", self.voltage_max),
            ("voltage_step", self.voltage_step),
            ("delay_sec", self.delay_sec),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(SweepError::Configuration(format!(
                    "{} must be finite, got {}",
                    name, value
                )));
            }
        }
        if self.voltage_step <= 0.0 {
            return Err(SweepError::Configuration(format!(
                "voltage_step must be positive, got {}",
                self.voltage_step
            )));
        }
        if self.voltage_max < self.voltage_min {
            return Err(SweepError::Configuration(format!(
                "voltage_max ({}) must be >= voltage_min ({})",
                self.voltage_max, self.voltage_min
            )));
        }
        if self.delay_sec < 0.0 {
            return Err(SweepError::Configuration(format!(
                "delay_sec must be >= 0, got {}",
                self.delay_sec
            )));
        }
        // Finite and non-negative, so only overflow can remain.
        if Duration::try_from_secs_f64(self.delay_sec).is_err() {
            return Err(SweepError::Configuration(format!(
                "delay_sec is too large for a sleep duration, got {}",
                self.delay_sec
            )));
        }
        Ok(())
    }

    /// The setpoint sequence `min, min+step, …` up to and including `max`.
    pub fn setpoints(&self) -> Vec<f64> {
        let mut points = Vec::new();
        let mut volt_set = self.voltage_min;
        while volt_set <= self.voltage_max {
            points.push(volt_set);
            volt_set += self.voltage_step;
        }
        points
    }
}

/// Where the rendered IV log goes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Path of the IV log file.
    #[serde(default = "default_output_path")]
    pub path: String,
}

fn default_output_path() -> String {
    "ivCurve.log".to_string()
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            path: default_output_path(),
        }
    }
}

/// Logging level and format, parsed by [`crate::logging`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format: pretty, compact, json.
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "compact".to_string()
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Top-level settings file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// `[sweep]` table.
    #[serde(default)]
    pub sweep: SweepConfig,
    /// `[output]` table.
    #[serde(default)]
    pub output: OutputSettings,
    /// `[logging]` table.
    #[serde(default)]
    pub logging: LogSettings,
}

impl Settings {
    /// Load settings from a TOML file. Missing tables fall back to defaults.
    pub fn load(path: &str) -> AppResult<Self> {
        let s = Config::builder()
            .add_source(config::File::with_name(path))
            .build()
            .map_err(SweepError::Config)?;

        s.try_deserialize().map_err(SweepError::Config)
    }
}
