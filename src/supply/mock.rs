//! Mock HV supply for testing and hardware-less demos.
//!
//! The mock follows the hardware sign convention: commanded setpoints are
//! positive magnitudes, readback voltage and current come back negative.
//! Every commanded setpoint is recorded so tests can assert the exact
//! sequence the controller issued, ramp-down included.

use super::{HvSupply, SweepPoint};
use crate::error::SupplyError;
use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Configurable in-memory HV supply.
///
/// A fresh mock reads back the setpoint exactly (negated) with zero current.
/// The `with_*` builders dial in settle offsets, reported current, a trip
/// latch voltage, readback noise, and bulk-sweep support.
///
/// # Example
///
/// ```rust,ignore
/// let supply = MockHvSupply::new()
///     .with_settle_offset(2.0)
///     .with_current_micro_amps(1.5);
/// ```
#[derive(Debug, Clone)]
pub struct MockHvSupply {
    setpoint: Arc<RwLock<f64>>,
    commanded: Arc<RwLock<Vec<f64>>>,
    settle_offset_volts: f64,
    current_micro_amps: f64,
    trip_latch_volts: Option<f64>,
    noise_volts: f64,
    bulk_sweep: bool,
}

impl MockHvSupply {
    /// Create a well-behaved mock: exact readback, zero current, no trip.
    pub fn new() -> Self {
        Self {
            setpoint: Arc::new(RwLock::new(0.0)),
            commanded: Arc::new(RwLock::new(Vec::new())),
            settle_offset_volts: 0.0,
            current_micro_amps: 0.0,
            trip_latch_volts: None,
            noise_volts: 0.0,
            bulk_sweep: false,
        }
    }

    /// Offset added to every voltage readback, in volts.
    ///
    /// An offset at or beyond the settle tolerance makes every setpoint
    /// exhaust its read attempts.
    pub fn with_settle_offset(mut self, volts: f64) -> Self {
        self.settle_offset_volts = volts;
        self
    }

    /// Magnitude of the reported current, in microamps.
    pub fn with_current_micro_amps(mut self, micro_amps: f64) -> Self {
        self.current_micro_amps = micro_amps;
        self
    }

    /// Latch the supply's own trip protection once the commanded setpoint
    /// reaches `volts`.
    pub fn with_trip_latch(mut self, volts: f64) -> Self {
        self.trip_latch_volts = Some(volts);
        self
    }

    /// Add uniform readback noise of up to ± `volts`.
    pub fn with_noise(mut self, volts: f64) -> Self {
        self.noise_volts = volts;
        self
    }

    /// Advertise and implement driver-managed bulk sweeps.
    pub fn with_bulk_sweep(mut self) -> Self {
        self.bulk_sweep = true;
        self
    }

    /// Every setpoint commanded so far, in order (ramp-down included).
    pub async fn commanded_setpoints(&self) -> Vec<f64> {
        self.commanded.read().await.clone()
    }

    fn read_back(&self, setpoint: f64) -> (f64, f64) {
        let noise = if self.noise_volts > 0.0 {
            rand::thread_rng().gen_range(-self.noise_volts..=self.noise_volts)
        } else {
            0.0
        };
        let measured_voltage = -setpoint + self.settle_offset_volts + noise;
        let current_amps = -self.current_micro_amps * 1e-6;
        (measured_voltage, current_amps)
    }
}

impl Default for MockHvSupply {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HvSupply for MockHvSupply {
    fn name(&self) -> &str {
        "mock"
    }

    async fn set_voltage(&self, volts: f64) -> Result<(), SupplyError> {
        *self.setpoint.write().await = volts;
        self.commanded.write().await.push(volts);
        Ok(())
    }

    async fn read_voltage_current(&self) -> Result<(f64, f64), SupplyError> {
        let setpoint = *self.setpoint.read().await;
        Ok(self.read_back(setpoint))
    }

    async fn tripped(&self) -> Result<bool, SupplyError> {
        let setpoint = *self.setpoint.read().await;
        Ok(self
            .trip_latch_volts
            .map_or(false, |latch| setpoint >= latch))
    }

    fn supports_bulk_sweep(&self) -> bool {
        self.bulk_sweep
    }

    async fn sweep(&self, setpoints: &[f64]) -> Result<Vec<SweepPoint>, SupplyError> {
        let mut points = Vec::with_capacity(setpoints.len());
        for &volt_set in setpoints {
            *self.setpoint.write().await = volt_set;
            self.commanded.write().await.push(volt_set);
            let (voltage, current_amps) = self.read_back(volt_set);
            points.push(SweepPoint {
                timestamp: chrono::Utc::now().timestamp(),
                voltage,
                current_amps,
            });
        }
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn readback_negates_the_setpoint() {
        let supply = MockHvSupply::new();
        supply.set_voltage(10.0).await.unwrap();

        let (volts, amps) = supply.read_voltage_current().await.unwrap();
        assert_eq!(volts, -10.0);
        assert_eq!(amps, 0.0);
    }

    #[tokio::test]
    async fn settle_offset_shifts_the_readback() {
        let supply = MockHvSupply::new().with_settle_offset(2.0);
        supply.set_voltage(10.0).await.unwrap();

        let (volts, _) = supply.read_voltage_current().await.unwrap();
        assert_eq!(volts, -8.0);
    }

    #[tokio::test]
    async fn reported_current_is_negative_amps() {
        let supply = MockHvSupply::new().with_current_micro_amps(1.5);
        supply.set_voltage(5.0).await.unwrap();

        let (_, amps) = supply.read_voltage_current().await.unwrap();
        assert!((amps - (-1.5e-6)).abs() < 1e-12);
    }

    #[tokio::test]
    async fn trip_latch_fires_at_its_threshold() {
        let supply = MockHvSupply::new().with_trip_latch(10.0);

        supply.set_voltage(5.0).await.unwrap();
        assert!(!supply.tripped().await.unwrap());

        supply.set_voltage(10.0).await.unwrap();
        assert!(supply.tripped().await.unwrap());
    }

    #[tokio::test]
    async fn commanded_setpoints_are_recorded_in_order() {
        let supply = MockHvSupply::new();
        for volts in [0.0, 5.0, 10.0] {
            supply.set_voltage(volts).await.unwrap();
        }
        assert_eq!(supply.commanded_setpoints().await, vec![0.0, 5.0, 10.0]);
    }

    #[tokio::test]
    async fn bulk_sweep_returns_one_point_per_setpoint() {
        let supply = MockHvSupply::new().with_bulk_sweep();
        assert!(supply.supports_bulk_sweep());

        let points = supply.sweep(&[0.0, 5.0, 10.0]).await.unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[1].voltage, -5.0);
        assert_eq!(supply.commanded_setpoints().await, vec![0.0, 5.0, 10.0]);
    }

    #[tokio::test]
    async fn noise_stays_within_the_configured_band() {
        let supply = MockHvSupply::new().with_noise(0.1);
        supply.set_voltage(10.0).await.unwrap();

        for _ in 0..50 {
            let (volts, _) = supply.read_voltage_current().await.unwrap();
            assert!((volts + 10.0).abs() <= 0.1 + 1e-12);
        }
    }
}
