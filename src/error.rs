//! Custom error types for the sweep controller.
//!
//! This module defines the primary error type, `SweepError`, for the entire
//! crate, plus the structured `SupplyError` raised by [`HvSupply`] drivers.
//!
//! ## Error Hierarchy
//!
//! `SweepError` consolidates the failure modes that can surface to a caller:
//!
//! - **`Config`**: wraps errors from the `config` crate, raised when the
//!   settings file fails to parse.
//! - **`Configuration`**: semantic errors in sweep parameters that pass
//!   parsing but fail validation (non-positive step, inverted range). Always
//!   raised before any hardware access.
//! - **`Io`**: wraps `std::io::Error` from log-file writes.
//! - **`Supply`**: a structured driver error with a category, so callers can
//!   tell an absent driver from a fault on the wire.
//!
//! Trips, settle mismatches, and operator cancellation are deliberately NOT
//! errors: they are normal terminal conditions carried in the sweep result.
//!
//! [`HvSupply`]: crate::supply::HvSupply

use thiserror::Error;

// =============================================================================
// Supply Errors
// =============================================================================

/// Category of a supply driver failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupplyErrorKind {
    /// No driver is attached, or the driver refused the call outright.
    Unavailable,
    /// The driver exists but does not implement the requested operation.
    NotSupported,
    /// The driver failed talking to the instrument.
    Communication,
    /// The instrument reported a hardware-level fault.
    Hardware,
}

impl std::fmt::Display for SupplyErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SupplyErrorKind::Unavailable => "unavailable",
            SupplyErrorKind::NotSupported => "not_supported",
            SupplyErrorKind::Communication => "communication",
            SupplyErrorKind::Hardware => "hardware",
        };
        write!(f, "{}", label)
    }
}

/// Structured error raised by an HV supply driver.
#[derive(Error, Debug, Clone)]
#[error("HV supply '{supply}' {kind} error: {message}")]
pub struct SupplyError {
    /// Driver name, e.g. `"mock"` or `"null"`.
    pub supply: String,
    /// Failure category.
    pub kind: SupplyErrorKind,
    /// Driver-specific detail.
    pub message: String,
}

impl SupplyError {
    /// Build a supply error with an explicit category.
    pub fn new(
        supply: impl Into<String>,
        kind: SupplyErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            supply: supply.into(),
            kind,
            message: message.into(),
        }
    }

    /// Shorthand for an [`SupplyErrorKind::Unavailable`] error.
    pub fn unavailable(supply: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(supply, SupplyErrorKind::Unavailable, message)
    }

    /// Shorthand for an [`SupplyErrorKind::NotSupported`] error.
    pub fn not_supported(supply: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(supply, SupplyErrorKind::NotSupported, message)
    }
}

/// Convenience alias for results using the crate error type.
pub type AppResult<T> = std::result::Result<T, SweepError>;

/// Primary error type for the sweep controller.
#[derive(Error, Debug)]
pub enum SweepError {
    /// Settings file parsing failed.
    ///
    /// **Source**: wraps `config::ConfigError` from the `config` crate.
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Sweep parameter validation failed.
    ///
    /// Raised by [`SweepConfig::validate`](crate::config::SweepConfig::validate)
    /// before any hardware interaction; never retried.
    #[error("Configuration validation error: {0}")]
    Configuration(String),

    /// Standard I/O operation failed, typically while writing the IV log.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Structured supply error with category.
    ///
    /// An [`SupplyErrorKind::Unavailable`] failure on the very first hardware
    /// call means the supply was never engaged and no ramp-down is owed; any
    /// failure after engagement reaches the caller only after the ramp-down
    /// finalizer has run.
    #[error("{0}")]
    Supply(#[from] SupplyError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SweepError::Configuration("voltage_step must be positive".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration validation error: voltage_step must be positive"
        );
    }

    #[test]
    fn test_supply_error_display() {
        let err = SweepError::Supply(SupplyError::new(
            "null",
            SupplyErrorKind::Unavailable,
            "no HV supply attached",
        ));
        assert_eq!(
            err.to_string(),
            "HV supply 'null' unavailable error: no HV supply attached"
        );
    }

    #[test]
    fn test_supply_error_kind_is_inspectable() {
        let err = SupplyError::not_supported("mock", "bulk sweep");
        assert_eq!(err.kind, SupplyErrorKind::NotSupported);
        assert!(err.to_string().contains("not_supported"));
    }
}
