//! Simulation input: trace records and the lazy trace-file reader.

pub mod trace;

pub use trace::{TraceReader, TraceRecord};
