// src/common/timing.rs

use core::time::Duration;

// Timing figures for Implexx sap flow sensors. These are properties of the
// sensor firmware, not of the SDI-12 bus, so they are only ever written into
// generated programs.

// === Measurement Waits ===

/// Wait after `aM!` before data may be requested. The sensor reports about
/// 95 s of measurement time; the rest is margin.
pub const STANDARD_MEASURE_WAIT: Duration = Duration::from_secs(100);

/// Wait after `aM1!`..`aM9!`. These return values computed during the last
/// standard measurement, so data is ready almost immediately.
pub const ADDITIONAL_MEASURE_WAIT: Duration = Duration::from_secs(2);

/// Used by commands that reuse a measurement already waited for.
pub const NO_WAIT: Duration = Duration::ZERO;

// === Service Interval ===

/// Shortest interval between heat pulses the sensor manufacturer recommends.
pub const MIN_MEASURE_INTERVAL_MINUTES: u64 = 10;
