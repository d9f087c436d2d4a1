//! Null HV supply for machines with no hardware attached.

use super::HvSupply;
use crate::error::SupplyError;
use async_trait::async_trait;

const DRIVER_NAME: &str = "null";

/// Stand-in driver used when no HV supply is present.
///
/// `supports_bulk_sweep` stays false so the controller never takes the bulk
/// path, and every hardware operation fails with an unavailable-kind
/// [`SupplyError`]. The very first such failure happens before the supply is
/// engaged, so the controller owes no ramp-down.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHvSupply;

impl NullHvSupply {
    /// Create a null supply.
    pub fn new() -> Self {
        Self
    }

    fn unavailable(operation: &str) -> SupplyError {
        SupplyError::unavailable(DRIVER_NAME, format!("{}: no HV supply attached", operation))
    }
}

#[async_trait]
impl HvSupply for NullHvSupply {
    fn name(&self) -> &str {
        DRIVER_NAME
    }

    async fn set_voltage(&self, _volts: f64) -> Result<(), SupplyError> {
        Err(Self::unavailable("set_voltage"))
    }

    async fn read_voltage_current(&self) -> Result<(f64, f64), SupplyError> {
        Err(Self::unavailable("read_voltage_current"))
    }

    async fn tripped(&self) -> Result<bool, SupplyError> {
        Err(Self::unavailable("tripped"))
    }

    fn supports_bulk_sweep(&self) -> bool {
        false
    }
}
