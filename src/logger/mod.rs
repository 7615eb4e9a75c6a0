//! Datalogger program synthesis.
//!
//! Each supported logger dialect implements [`ProgramSynthesizer`]. A caller
//! picks the dialect with [`LoggerType`], validates its two integer inputs and
//! gets back the full program text, or an error and no text at all.

pub mod cr300;
pub mod validate;

use alloc::string::{String, ToString};
use core::fmt;
use core::str::FromStr;

use crate::common::{GenerateError, Sdi12Addr};

pub use cr300::{Cr300Synthesizer, Sdi12Port};
pub use validate::{IntervalPolicy, Validator, MAX_SENSORS};

/// Validated generator input. Only a [`Validator`] can create one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthesisRequest {
    sensor_count: u8,
    interval_minutes: u64,
}

impl SynthesisRequest {
    pub fn sensor_count(&self) -> u8 {
        self.sensor_count
    }

    pub fn interval_minutes(&self) -> u64 {
        self.interval_minutes
    }

    /// Bus addresses of every sensor, in ascending index order.
    pub fn addresses(&self) -> impl Iterator<Item = Result<Sdi12Addr, GenerateError>> {
        (0..self.sensor_count as usize).map(Sdi12Addr::from_index)
    }
}

/// Generated program text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedProgram(String);

impl GeneratedProgram {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for GeneratedProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A datalogger dialect the generator can target.
pub trait ProgramSynthesizer {
    fn logger_type(&self) -> LoggerType;

    fn validate(
        &self,
        sensor_count: i64,
        interval_minutes: i64,
    ) -> Result<SynthesisRequest, GenerateError>;

    fn synthesize(&self, request: &SynthesisRequest) -> Result<GeneratedProgram, GenerateError>;

    fn generate(
        &self,
        sensor_count: i64,
        interval_minutes: i64,
    ) -> Result<GeneratedProgram, GenerateError> {
        let request = self.validate(sensor_count, interval_minutes)?;
        self.synthesize(&request)
    }
}

/// Supported logger families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoggerType {
    /// CR300 series: one record table shared by all sensors.
    Cr300,
}

impl LoggerType {
    pub const fn name(&self) -> &'static str {
        match self {
            LoggerType::Cr300 => "CR300",
        }
    }

    /// Synthesizer for this dialect with default options.
    pub fn synthesizer(&self) -> impl ProgramSynthesizer {
        match self {
            LoggerType::Cr300 => Cr300Synthesizer::default(),
        }
    }
}

impl fmt::Display for LoggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LoggerType {
    type Err = GenerateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("CR300") {
            Ok(LoggerType::Cr300)
        } else {
            Err(GenerateError::UnknownLoggerType(s.to_string()))
        }
    }
}

/// Generates a CR300 program for `sensor_count` sensors logged every
/// `interval_minutes`, with default options.
pub fn generate(sensor_count: i64, interval_minutes: i64) -> Result<String, GenerateError> {
    Cr300Synthesizer::default()
        .generate(sensor_count, interval_minutes)
        .map(GeneratedProgram::into_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_type_parse() {
        assert_eq!("CR300".parse::<LoggerType>(), Ok(LoggerType::Cr300));
        assert_eq!("cr300".parse::<LoggerType>(), Ok(LoggerType::Cr300));
        assert_eq!(
            "CR1000".parse::<LoggerType>(),
            Err(GenerateError::UnknownLoggerType("CR1000".to_string()))
        );
        assert_eq!(LoggerType::Cr300.to_string(), "CR300");
    }

    #[test]
    fn test_synthesizer_for_logger_type() {
        let synth = LoggerType::Cr300.synthesizer();
        assert_eq!(synth.logger_type(), LoggerType::Cr300);
        let program = synth.generate(1, 10).unwrap();
        assert!(program.as_str().starts_with("' CR300 Series Datalogger Program\n"));
    }

    #[test]
    fn test_request_addresses() {
        let req = Validator::default().validate(12, 15).unwrap();
        let addrs: String = req.addresses().map(|a| a.unwrap().as_char()).collect();
        assert_eq!(addrs, "0123456789ab");
    }

    #[test]
    fn test_generate_is_all_or_nothing() {
        assert!(generate(0, 15).is_err());
        assert!(generate(1, 9).is_err());
        assert!(generate(1, 10).is_ok());
    }
}
