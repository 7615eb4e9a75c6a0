// src/logger/validate.rs

use tracing::warn;

use crate::common::timing::MIN_MEASURE_INTERVAL_MINUTES;
use crate::common::{GenerateError, Sdi12Addr};

use super::SynthesisRequest;

/// Most sensors one bus can address.
pub const MAX_SENSORS: usize = Sdi12Addr::COUNT;

/// What to do with an interval shorter than the sensor's service interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntervalPolicy {
    /// Refuse to generate.
    #[default]
    Reject,
    /// Log a warning and generate anyway.
    Warn,
}

/// Checks that `sensor_count` fits on one bus.
pub fn check_sensor_count(sensor_count: i64) -> Result<u8, GenerateError> {
    match u8::try_from(sensor_count) {
        Ok(n) if (1..=MAX_SENSORS).contains(&(n as usize)) => Ok(n),
        _ => Err(GenerateError::OutOfRangeSensorCount { requested: sensor_count, max: MAX_SENSORS }),
    }
}

/// Checks that the interval respects the sensor's service interval.
pub fn check_interval(interval_minutes: i64) -> Result<u64, GenerateError> {
    match u64::try_from(interval_minutes) {
        Ok(t) if t >= MIN_MEASURE_INTERVAL_MINUTES => Ok(t),
        _ => Err(GenerateError::IntervalTooShort {
            requested: interval_minutes,
            min: MIN_MEASURE_INTERVAL_MINUTES,
        }),
    }
}

/// Input validation for one logger dialect.
///
/// The sensor count is checked first and is always fatal. The interval check
/// follows and is fatal or advisory depending on the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Validator {
    pub interval_policy: IntervalPolicy,
}

impl Validator {
    pub const fn new(interval_policy: IntervalPolicy) -> Self {
        Self { interval_policy }
    }

    pub fn validate(
        &self,
        sensor_count: i64,
        interval_minutes: i64,
    ) -> Result<SynthesisRequest, GenerateError> {
        let sensor_count = check_sensor_count(sensor_count)?;

        let interval = match (check_interval(interval_minutes), self.interval_policy) {
            (Ok(t), _) => t,
            (Err(e), IntervalPolicy::Warn) if interval_minutes > 0 => {
                warn!(
                    requested = interval_minutes,
                    min = MIN_MEASURE_INTERVAL_MINUTES,
                    "{e}; generating anyway"
                );
                interval_minutes as u64
            }
            (Err(e), _) => return Err(e),
        };

        Ok(SynthesisRequest { sensor_count, interval_minutes: interval })
    }
}
