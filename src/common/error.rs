// src/common/error.rs

use alloc::string::String;

/// Everything that can stop a program from being generated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerateError {
    /// Requested sensor count does not fit on one SDI-12 bus.
    #[error("number of sensors must be between 1 and {max}, got {requested}")]
    OutOfRangeSensorCount { requested: i64, max: usize },

    /// Requested measurement interval is below the sensor's service interval.
    #[error("measurement interval must be at least {min} minutes, got {requested}")]
    IntervalTooShort { requested: i64, min: u64 },

    /// Sensor index has no single-character bus address.
    #[error("sensor index {0} is outside the SDI-12 address range (0-61)")]
    AddressOutOfRange(usize),

    /// Provided address character is not a valid SDI-12 address.
    #[error("invalid SDI-12 address character: '{0}'")]
    InvalidAddress(char),

    /// The built-in measurement schema contradicts itself.
    #[error("measurement schema group {group}: {fault}")]
    SchemaInconsistency { group: usize, fault: SchemaFault },

    /// Logger type name not recognised.
    #[error("unsupported logger type '{0}'")]
    UnknownLoggerType(String),
}

/// Detail for [`GenerateError::SchemaInconsistency`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SchemaFault {
    #[error("response index {index} is outside a response of {size} values")]
    IndexOutOfBounds { index: u8, size: u8 },

    #[error("alias suffix '{0}' is longer than the name limit allows")]
    AliasTooLong(&'static str),

    #[error("alias suffix '{0}' is used twice")]
    DuplicateAlias(&'static str),

    #[error("trigger or read command index out of range")]
    InvalidCommandIndex,

    #[error("group extracts no data points")]
    EmptyGroup,
}

impl GenerateError {
    /// True when the error came from caller-supplied input rather than from
    /// the generator itself.
    pub fn is_validation(&self) -> bool {
        !matches!(self, GenerateError::SchemaInconsistency { .. })
    }
}
