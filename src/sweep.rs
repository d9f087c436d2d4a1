//! Voltage Sweep Controller
//!
//! Drives an [`HvSupply`] through a stepped IV traversal: per-step settle
//! delay, bounded retry-until-settled reads, overcurrent trip detection,
//! cooperative cancellation, and the mandatory ramp-down finalizer that runs
//! on every exit once the supply has been engaged.
//!
//! A single sweep moves through
//! `Idle → Validating → (BulkSweeping | Stepping) → RampingDown → Done`;
//! trips and operator stops absorb into `Tripped` / `Cancelled` before the
//! ramp-down. Neither is an error: both are carried in the [`SweepResult`].

use crate::config::SweepConfig;
use crate::error::AppResult;
use crate::observer::SampleObserver;
use crate::supply::HvSupply;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

// =============================================================================
// Constants
// =============================================================================

/// Readback must land within this many volts of the (negated) setpoint to
/// count as settled.
pub const SETTLE_TOLERANCE_VOLTS: f64 = 0.5;

/// Current magnitude above this many microamps, with nonzero measured
/// voltage, counts as an overcurrent trip.
pub const TRIP_THRESHOLD_MICRO_AMPS: f64 = 99.0;

/// Maximum reads issued per setpoint while waiting for settle.
pub const MAX_READ_ATTEMPTS: u32 = 5;

/// Ramp-down decrement in volts.
const RAMP_STEP_VOLTS: f64 = 50.0;

/// Ramp-down issues no setpoint at or below this floor.
const RAMP_FLOOR_VOLTS: f64 = 100.0;

// =============================================================================
// Data Types
// =============================================================================

/// One recorded measurement of the IV traversal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Magnitude of the commanded setpoint, in volts.
    pub target_voltage: f64,
    /// Voltage as read back, negative by hardware convention.
    pub measured_voltage: f64,
    /// Current magnitude in microamps.
    pub current_micro_amps: f64,
    /// Seconds since the Unix epoch at recording time.
    pub timestamp: i64,
    /// Reads issued for this setpoint, `1..=MAX_READ_ATTEMPTS`.
    pub attempts: u32,
    /// Whether the readback reached the setpoint within tolerance.
    pub settled: bool,
}

/// Outcome of one [`VoltageSweepController::run_sweep`] invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepResult {
    /// Samples in sweep order, strictly increasing in target voltage.
    pub samples: Vec<Sample>,
    /// True if the supply latched or the current threshold was exceeded.
    pub tripped: bool,
    /// Target voltage at which the trip occurred; present only if `tripped`.
    ///
    /// The sample recorded at this voltage stays in `samples` for
    /// diagnostics, but the recorder excludes it from the durable log.
    pub trip_voltage: Option<f64>,
    /// True if the operator requested a stop mid-sweep.
    pub cancelled: bool,
}

/// Phase of a single sweep execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SweepState {
    /// Not yet started.
    Idle,
    /// Checking configuration before any hardware access.
    Validating,
    /// Driver-managed atomic traversal.
    BulkSweeping,
    /// Stepping through setpoints one by one.
    Stepping,
    /// Overcurrent trip latched; heading into ramp-down.
    Tripped,
    /// Operator stop honoured; heading into ramp-down.
    Cancelled,
    /// Driving the voltage back toward the floor.
    RampingDown,
    /// Sweep concluded and the supply released.
    Done,
}

// =============================================================================
// Cancellation
// =============================================================================

/// Read-only half of the operator stop signal.
///
/// The controller polls the token at the top of the voltage loop and at the
/// top of each read attempt, and never writes it. The sender half stays with
/// the operator side (a stop button, Ctrl-C).
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// Create a token plus the sender half the operator side keeps.
    pub fn channel() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        (tx, Self { rx })
    }

    /// True once a stop has been requested.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }
}

// =============================================================================
// Controller
// =============================================================================

/// Executes stepped IV sweeps against an [`HvSupply`].
///
/// Holds no sweep data across calls; `state()` exposes the current phase for
/// observability.
#[derive(Debug)]
pub struct VoltageSweepController {
    state: SweepState,
}

impl VoltageSweepController {
    /// Create an idle controller.
    pub fn new() -> Self {
        Self {
            state: SweepState::Idle,
        }
    }

    /// Current phase of the sweep.
    pub fn state(&self) -> SweepState {
        self.state
    }

    /// Run one sweep to completion, trip, or cancellation.
    ///
    /// Validates `config` before touching the supply, walks the setpoint
    /// sequence (or delegates to the driver's bulk sweep), reports each
    /// sample to `observer`, and always finishes with the ramp-down
    /// finalizer once the supply has been engaged. Trips and cancellations
    /// are normal terminations carried in the returned [`SweepResult`];
    /// only configuration and driver failures surface as errors.
    pub async fn run_sweep(
        &mut self,
        config: &SweepConfig,
        supply: &dyn HvSupply,
        cancel: &CancelToken,
        observer: &dyn SampleObserver,
    ) -> AppResult<SweepResult> {
        self.state = SweepState::Validating;
        config.validate()?;

        info!(
            "starting IV sweep on '{}': {} V to {} V in {} V steps",
            supply.name(),
            config.voltage_min,
            config.voltage_max,
            config.voltage_step
        );

        let mut result = SweepResult::default();
        let mut engaged = false;

        let outcome = if supply.supports_bulk_sweep() {
            self.state = SweepState::BulkSweeping;
            self.run_bulk(config, supply, observer, &mut result, &mut engaged)
                .await
        } else {
            self.state = SweepState::Stepping;
            self.run_stepped(config, supply, cancel, observer, &mut result, &mut engaged)
                .await
        };

        // The ramp-down finalizer runs on every loop exit; an error before
        // the supply was ever engaged leaves nothing to ramp.
        match outcome {
            Ok(()) => {
                self.state = SweepState::RampingDown;
                self.ramp_down(config, supply).await;
                self.state = SweepState::Done;
                info!("IV sweep done: {} samples", result.samples.len());
                Ok(result)
            }
            Err(e) => {
                if engaged {
                    self.state = SweepState::RampingDown;
                    self.ramp_down(config, supply).await;
                }
                self.state = SweepState::Done;
                Err(e)
            }
        }
    }

    /// Fast path: the driver traverses the whole setpoint sequence itself.
    async fn run_bulk(
        &mut self,
        config: &SweepConfig,
        supply: &dyn HvSupply,
        observer: &dyn SampleObserver,
        result: &mut SweepResult,
        engaged: &mut bool,
    ) -> AppResult<()> {
        let setpoints = config.setpoints();
        debug!("driver-managed bulk sweep over {} setpoints", setpoints.len());

        let points = supply.sweep(&setpoints).await?;
        *engaged = true;

        for (volt_set, point) in setpoints.iter().zip(points) {
            let sample = Sample {
                target_voltage: volt_set.abs(),
                measured_voltage: point.voltage,
                current_micro_amps: (point.current_amps * 1e6).abs(),
                timestamp: point.timestamp,
                attempts: 1,
                settled: true,
            };
            result.samples.push(sample);
            self.emit(observer, &sample);
        }
        Ok(())
    }

    /// Step path: one setpoint at a time with settle delay and bounded reads.
    async fn run_stepped(
        &mut self,
        config: &SweepConfig,
        supply: &dyn HvSupply,
        cancel: &CancelToken,
        observer: &dyn SampleObserver,
        result: &mut SweepResult,
        engaged: &mut bool,
    ) -> AppResult<()> {
        let settle_delay = Duration::from_secs_f64(config.delay_sec);

        for volt_set in config.setpoints() {
            // Poll point one: before engaging the next setpoint. No partial
            // sample is recorded for it.
            if cancel.is_cancelled() {
                info!("sweep cancelled by operator");
                self.state = SweepState::Cancelled;
                result.cancelled = true;
                return Ok(());
            }

            supply.set_voltage(volt_set).await?;
            *engaged = true;
            tokio::time::sleep(settle_delay).await;

            // Get within the settle tolerance of the setpoint, reading at
            // most MAX_READ_ATTEMPTS times. The readback is negative, so the
            // sum measures the distance from the setpoint.
            let mut attempts = 0;
            let mut settled = false;
            let mut measured_voltage = 0.0;
            let mut micro_amps = 0.0;
            while attempts < MAX_READ_ATTEMPTS {
                // Poll point two: the top of each read attempt.
                if cancel.is_cancelled() {
                    info!("sweep cancelled by operator");
                    self.state = SweepState::Cancelled;
                    result.cancelled = true;
                    return Ok(());
                }
                let (volts, amps) = supply.read_voltage_current().await?;
                attempts += 1;
                measured_voltage = volts;
                micro_amps = amps * 1e6;
                if (volt_set + measured_voltage).abs() < SETTLE_TOLERANCE_VOLTS {
                    settled = true;
                    break;
                }
            }
            if !settled {
                warn!(
                    "voltage did not settle: target {} V, measured {} V after {} reads",
                    volt_set, measured_voltage, attempts
                );
            }

            let timestamp = chrono::Utc::now().timestamp();
            let sample = Sample {
                target_voltage: volt_set.abs(),
                measured_voltage,
                current_micro_amps: micro_amps.abs(),
                timestamp,
                attempts,
                settled,
            };
            result.samples.push(sample);

            let over_threshold =
                micro_amps.abs() > TRIP_THRESHOLD_MICRO_AMPS && measured_voltage != 0.0;
            if supply.tripped().await? || over_threshold {
                error!("HV supply tripped, aborting IV sweep");
                self.state = SweepState::Tripped;
                result.tripped = true;
                result.trip_voltage = Some(volt_set.abs());
                return Ok(());
            }

            // Whole volts for display; negating the f64 would print the
            // zero setpoint as "-0".
            info!(
                "V = {:4} (meas: {:+7.2}) I = {:.2e} uA (attempts = {}) {}",
                -(volt_set as i64),
                measured_voltage,
                micro_amps,
                attempts,
                timestamp
            );
            self.emit(observer, &sample);
        }
        Ok(())
    }

    /// Drive the voltage back toward the floor in fixed decrements.
    ///
    /// Best-effort: a failing setpoint is logged and the ramp continues, so
    /// the voltage gets as low as the hardware still allows.
    async fn ramp_down(&self, config: &SweepConfig, supply: &dyn HvSupply) {
        let mut volt_set = config.voltage_max - RAMP_STEP_VOLTS;
        while volt_set > RAMP_FLOOR_VOLTS {
            debug!("ramping down voltage, Vset = {}", volt_set);
            if let Err(e) = supply.set_voltage(volt_set).await {
                warn!("ramp-down setpoint {} V failed: {}", volt_set, e);
            }
            volt_set -= RAMP_STEP_VOLTS;
        }
    }

    fn emit(&self, observer: &dyn SampleObserver, sample: &Sample) {
        if let Err(e) = observer.on_sample(sample) {
            warn!("sample observer failed: {}", e);
        }
    }
}

impl Default for VoltageSweepController {
    fn default() -> Self {
        Self::new()
    }
}
