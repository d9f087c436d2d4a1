//! HV Supply Capability Interface
//!
//! The sweep controller talks to the power supply through one small trait,
//! [`HvSupply`], selected at construction time rather than compile time. This
//! crate ships two implementations:
//!
//! - [`NullHvSupply`]: no hardware attached; every operation fails with an
//!   unavailable error so the controller stays runnable on any machine.
//! - [`MockHvSupply`]: configurable in-memory supply for tests and demos.
//!
//! Real serial drivers implement the same trait out of tree.
//!
//! # Design Philosophy
//!
//! The trait:
//! - Is async (uses #[async_trait])
//! - Is thread-safe (requires Send + Sync)
//! - Uses structured [`SupplyError`] results so callers can classify failures
//! - Covers exactly the five operations the sweep algorithm needs

pub mod mock;
pub mod null;

pub use mock::MockHvSupply;
pub use null::NullHvSupply;

use crate::error::SupplyError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One reading returned by a driver-managed bulk sweep.
///
/// Points pair with the commanded setpoint sequence by index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    /// Seconds since the Unix epoch at read time.
    pub timestamp: i64,
    /// Voltage as read back, negative by hardware convention.
    pub voltage: f64,
    /// Current in amps, negative by hardware convention.
    pub current_amps: f64,
}

/// Capability: High-Voltage Supply
///
/// # Contract
/// - Units are volts, amps, and integer epoch seconds.
/// - Commanded setpoints are positive magnitudes; readback voltage and
///   current come back negative per the hardware convention.
/// - `set_voltage` commands the setpoint and returns without waiting for the
///   output to settle; the caller owns settle timing.
/// - Exactly one controller holds the supply for the duration of a sweep; no
///   concurrent access.
#[async_trait]
pub trait HvSupply: Send + Sync {
    /// Driver name used in errors and logs.
    fn name(&self) -> &str;

    /// Command the supply toward the setpoint `volts`.
    async fn set_voltage(&self, volts: f64) -> Result<(), SupplyError>;

    /// Instantaneous `(measured_voltage, current_amps)` reading.
    async fn read_voltage_current(&self) -> Result<(f64, f64), SupplyError>;

    /// True if the supply's own overcurrent protection has latched.
    async fn tripped(&self) -> Result<bool, SupplyError>;

    /// True if the driver can perform the whole sweep atomically.
    fn supports_bulk_sweep(&self) -> bool {
        false
    }

    /// Driver-managed traversal of `setpoints`, one reading per setpoint.
    ///
    /// Only called when [`supports_bulk_sweep`](Self::supports_bulk_sweep)
    /// returns true.
    async fn sweep(&self, setpoints: &[f64]) -> Result<Vec<SweepPoint>, SupplyError> {
        let _ = setpoints;
        Err(SupplyError::not_supported(
            self.name(),
            "bulk sweep not supported by this driver",
        ))
    }
}
