//! Error types for configuration, trace input, and simulation.
//!
//! The replay core itself has no recoverable-error taxonomy: it is a
//! deterministic state machine. Everything that can go wrong happens at the
//! edges and is reported here:
//! 1. **Configuration:** Geometry invariant violations detected before any
//!    cache is built.
//! 2. **Trace Input:** I/O failures and malformed records, tagged with the
//!    offending line number.
//! 3. **Simulation:** Records that reference a processor the system does not
//!    have.

use std::io;

use thiserror::Error;

/// A cache or system configuration the simulator cannot honor.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// One of the geometry quantities is zero.
    #[error("cache geometry must be non-zero (size {size}, ways {ways}, line {line})")]
    ZeroGeometry {
        /// Configured total cache size in bytes.
        size: usize,
        /// Configured associativity.
        ways: usize,
        /// Configured line size in bytes.
        line: usize,
    },

    /// The line size cannot be decomposed into block-offset bits.
    #[error("line size {0} is not a power of two")]
    LineNotPowerOfTwo(usize),

    /// The cache size does not split evenly into sets of `ways` lines.
    #[error("cache size {size} is not divisible by ways x line size ({ways} x {line})")]
    SizeNotDivisible {
        /// Configured total cache size in bytes.
        size: usize,
        /// Configured associativity.
        ways: usize,
        /// Configured line size in bytes.
        line: usize,
    },

    /// The derived set count cannot be indexed with whole address bits.
    #[error("set count {0} is not a power of two")]
    SetsNotPowerOfTwo(usize),

    /// A multiprocessor system needs at least one processor.
    #[error("at least one processor is required")]
    ZeroProcessors,

    /// The protocol selector matched neither protocol.
    #[error("unknown protocol {0:?} (expected 0/mci or 1/dragon)")]
    UnknownProtocol(String),
}

/// A failure while reading or parsing the trace input.
#[derive(Debug, Error)]
pub enum TraceError {
    /// The underlying reader failed.
    #[error("failed to read trace: {0}")]
    Io(#[from] io::Error),

    /// A line did not contain exactly `processor op address`.
    #[error("trace line {line}: malformed record {record:?}")]
    Malformed {
        /// 1-based line number in the trace input.
        line: u64,
        /// The offending line, verbatim.
        record: String,
    },

    /// The operation field was neither `r` nor `w`.
    #[error("trace line {line}: unknown operation {op:?} (expected 'r' or 'w')")]
    UnknownOp {
        /// 1-based line number in the trace input.
        line: u64,
        /// The offending operation field, verbatim.
        op: String,
    },

    /// The processor field was not a decimal integer.
    #[error("trace line {line}: invalid processor id {field:?}")]
    BadProcessor {
        /// 1-based line number in the trace input.
        line: u64,
        /// The offending processor field, verbatim.
        field: String,
    },

    /// The address field was not a hexadecimal integer.
    #[error("trace line {line}: invalid address {field:?}")]
    BadAddress {
        /// 1-based line number in the trace input.
        line: u64,
        /// The offending address field, verbatim.
        field: String,
    },
}

/// Any failure that can end a simulation run early.
#[derive(Debug, Error)]
pub enum SimError {
    /// The configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The trace input was unreadable or malformed.
    #[error(transparent)]
    Trace(#[from] TraceError),

    /// A record addressed a processor outside the configured system.
    #[error("trace references processor {processor}, but only {available} are configured")]
    UnknownProcessor {
        /// Processor id found in the trace record.
        processor: usize,
        /// Number of processors in the system.
        available: usize,
    },
}
