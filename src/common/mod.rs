// src/common/mod.rs

pub mod address;
pub mod command;
pub mod error;
pub mod timing;

// --- Re-export key types for easier access ---

pub use address::Sdi12Addr;
pub use command::{Command, CommandBuffer, CommandFormatError};
pub use error::{GenerateError, SchemaFault};
