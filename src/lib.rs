// src/lib.rs

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod common;
pub mod logger;
pub mod schema;

// Re-export key types for convenience
pub use common::{GenerateError, Sdi12Addr};
pub use logger::{
    generate, Cr300Synthesizer, GeneratedProgram, IntervalPolicy, LoggerType, ProgramSynthesizer,
    Sdi12Port, SynthesisRequest,
};
