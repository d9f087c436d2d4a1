//! # IV Sweep Controller Library
//!
//! This crate is the core library for the `iv-sweep` application. It drives a
//! high-voltage supply through stepped IV-curve sweeps for detector
//! qualification and renders the results into a durable log. Organizing the
//! project as a library keeps the sweep engine shareable between the CLI
//! binary (`main.rs`) and embedding test stands.
//!
//! ## Crate Structure
//!
//! The library is organized into several modules, each with a distinct
//! responsibility:
//!
//! - **`config`**: Sweep parameters with validation, plus the file-based
//!   application settings. See `config::Settings`.
//! - **`error`**: The crate error taxonomy (`SweepError`, `SupplyError`) and
//!   the `AppResult` alias used across the crate.
//! - **`logging`**: `tracing` subscriber setup with level and format control.
//! - **`observer`**: The per-sample callback seam for live consumers such as
//!   plots and progress displays.
//! - **`recorder`**: Renders completed sweeps into the tab-separated IV log
//!   format and writes them to disk.
//! - **`supply`**: The `HvSupply` capability trait with the mock and null
//!   driver implementations.
//! - **`sweep`**: The sweep controller: stepping, settle retries, trip
//!   detection, cancellation, and the ramp-down finalizer.

pub mod config;
pub mod error;
pub mod logging;
pub mod observer;
pub mod recorder;
pub mod supply;
pub mod sweep;
