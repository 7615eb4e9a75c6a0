//! SDI-12 command definitions.
//!
//! Only the measurement commands a datalogger program needs to poll a sensor are
//! modelled here. See SDI-12 Specification v1.4, Section 4.4.

use core::fmt::{self, Write};

use arrayvec::ArrayString;

use super::address::Sdi12Addr;

/// Longest command string we ever render (`aMC9!` plus headroom).
pub const MAX_COMMAND_LEN: usize = 8;

/// A formatted command string, ready to be quoted into program text.
pub type CommandBuffer = ArrayString<MAX_COMMAND_LEN>;

/// Represents an SDI-12 command.
///
/// The `Display` implementation generates the standard SDI-12 command string
/// (e.g., `aM!`, `aM1!`, `aD0!`). An out-of-range index makes formatting fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start Measurement Command (`aM!` or `aM1!`..`aM9!`).
    /// `None` corresponds to `aM!`. `Some(i)` corresponds to `aMi!` (1 <= i <= 9).
    StartMeasurement { address: Sdi12Addr, measurement_index: Option<u8> },

    /// Send Data Command (`aD0!`..`aD9!`) - Requests data from a completed measurement.
    SendData { address: Sdi12Addr, data_index: u8 },
}

/// The command could not be rendered because one of its indices is outside
/// the range the protocol allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("command index out of range for {0:?}")]
pub struct CommandFormatError(pub Command);

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::StartMeasurement { address, measurement_index } => match measurement_index {
                None => write!(f, "{}M!", address),
                Some(idx) if (1..=9).contains(idx) => write!(f, "{}M{}!", address, idx),
                Some(_) => Err(fmt::Error),
            },
            Command::SendData { address, data_index } => {
                if *data_index <= 9 {
                    write!(f, "{}D{}!", address, data_index)
                } else {
                    Err(fmt::Error)
                }
            }
        }
    }
}

impl Command {
    /// Returns the address the command is directed to.
    pub fn address(&self) -> Sdi12Addr {
        match self {
            Command::StartMeasurement { address, .. } => *address,
            Command::SendData { address, .. } => *address,
        }
    }

    /// Checks that every index in the command is one the protocol allows.
    pub fn is_well_formed(&self) -> bool {
        match self {
            Command::StartMeasurement { measurement_index, .. } => {
                measurement_index.map_or(true, |i| (1..=9).contains(&i))
            }
            Command::SendData { data_index, .. } => *data_index <= 9,
        }
    }

    /// Renders the command into a fixed-capacity buffer.
    pub fn format_into(&self) -> Result<CommandBuffer, CommandFormatError> {
        let mut buf = CommandBuffer::new();
        write!(buf, "{}", self).map_err(|_| CommandFormatError(*self))?;
        Ok(buf)
    }
}
