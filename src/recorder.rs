//! Sweep Log Rendering
//!
//! Renders a [`SweepResult`] into the tab-separated IV log format and writes
//! it to disk. The log keeps the hardware's sign conventions: voltages appear
//! as measured (negative), currents in signed amperes.

use crate::error::AppResult;
use crate::sweep::SweepResult;
use chrono::{DateTime, Local};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Renders sweep results into the durable IV log format.
pub struct SweepRecorder;

impl SweepRecorder {
    /// Render `result` as the complete log text.
    ///
    /// Two header lines, then one row per sample:
    /// measured voltage, current in amperes, epoch timestamp. After a trip,
    /// rows from the trip voltage onward are excluded; the truncated log
    /// holds only measurements taken while the supply was healthy.
    pub fn render(result: &SweepResult, started_at: DateTime<Local>) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "# IV test from {}\n",
            started_at.format("%a %b %e %H:%M:%S %Y")
        ));
        out.push_str("#voltage(V)\tcurrent(A)\ttimestamp\n");

        for sample in &result.samples {
            if let Some(trip_voltage) = result.trip_voltage {
                if sample.target_voltage >= trip_voltage {
                    break;
                }
            }
            let current_amps = -1e-6 * sample.current_micro_amps;
            out.push_str(&format!(
                "{:+8.3}\t{:+.6e}\t{}\n",
                sample.measured_voltage, current_amps, sample.timestamp
            ));
        }
        out
    }

    /// Render `result` and write it to `path`, creating or truncating the file.
    pub fn write_to_file(
        path: &Path,
        result: &SweepResult,
        started_at: DateTime<Local>,
    ) -> AppResult<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(Self::render(result, started_at).as_bytes())?;
        writer.flush()?;
        info!("wrote IV log to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sweep::Sample;

    fn sample(target: f64, measured: f64, micro_amps: f64, timestamp: i64) -> Sample {
        Sample {
            target_voltage: target,
            measured_voltage: measured,
            current_micro_amps: micro_amps,
            timestamp,
            attempts: 1,
            settled: true,
        }
    }

    #[test]
    fn render_emits_header_and_one_row_per_sample() {
        let result = SweepResult {
            samples: vec![
                sample(0.0, 0.0, 0.1, 1_700_000_000),
                sample(5.0, -5.02, 0.2, 1_700_000_001),
            ],
            ..SweepResult::default()
        };

        let text = SweepRecorder::render(&result, Local::now());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("# IV test from "));
        assert_eq!(lines[1], "#voltage(V)\tcurrent(A)\ttimestamp");
        assert!(lines[3].starts_with("  -5.020\t"));
        assert!(lines[3].ends_with("\t1700000001"));
    }

    #[test]
    fn render_negates_the_stored_current_magnitude() {
        let result = SweepResult {
            samples: vec![sample(10.0, -10.0, 2.5, 1_700_000_000)],
            ..SweepResult::default()
        };

        let text = SweepRecorder::render(&result, Local::now());
        let row = text.lines().nth(2).unwrap();
        let current: f64 = row.split('\t').nth(1).unwrap().parse().unwrap();
        assert!((current - (-2.5e-6)).abs() < 1e-12);
    }

    #[test]
    fn render_truncates_at_the_trip_voltage() {
        let result = SweepResult {
            samples: vec![
                sample(0.0, 0.0, 0.1, 1),
                sample(5.0, -5.0, 0.2, 2),
                sample(10.0, -10.0, 150.0, 3),
            ],
            tripped: true,
            trip_voltage: Some(10.0),
            cancelled: false,
        };

        let text = SweepRecorder::render(&result, Local::now());
        assert_eq!(text.lines().count(), 4);
        assert!(!text.contains("\t3"));
    }

    #[test]
    fn render_of_an_empty_result_is_header_only() {
        let text = SweepRecorder::render(&SweepResult::default(), Local::now());
        assert_eq!(text.lines().count(), 2);
    }
}
