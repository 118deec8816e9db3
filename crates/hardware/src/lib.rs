//! Snooping-cache coherence simulator library.
//!
//! This crate implements a trace-driven model of per-processor private caches
//! in a shared-memory multiprocessor, kept coherent over an instantaneous
//! broadcast bus. It provides the following:
//! 1. **Core:** Set-associative cache store (tag lookup, LRU victim selection,
//!    write-back triggering) and the two snooping protocol engines.
//! 2. **Protocols:** MCI, a write-invalidate protocol with Modified / Clean /
//!    Invalid line states, and Dragon, a write-update protocol with Modified /
//!    Exclusive / Shared-Modified / Shared-Clean line states.
//! 3. **System:** The multiprocessor coordinator that replays trace records,
//!    routes each access to the issuing processor's cache, and broadcasts the
//!    resulting bus transaction to every other cache as a snoop.
//! 4. **Simulation:** Lazy trace-file reading and per-cache statistics
//!    collection and reporting.

/// Common types shared across the simulator (memory operations, errors).
pub mod common;
/// Simulator configuration (cache geometry, protocol selection, validation).
pub mod config;
/// Cache structure and coherence protocol engines.
pub mod core;
/// Trace input (record type and lazy trace-file reader).
pub mod sim;
/// Multiprocessor system: per-processor caches and bus broadcast.
pub mod soc;
/// Per-cache statistics counters and report rendering.
pub mod stats;

/// Cache geometry configuration; validate with [`CacheConfig::geometry`].
pub use crate::config::{CacheConfig, ProtocolKind, SimConfig};
/// The two snooping coherence protocols and the seam they implement.
pub use crate::core::protocol::{Dragon, Mci, Protocol};
/// Trace record type and the lazy trace-file reader.
pub use crate::sim::trace::{TraceReader, TraceRecord};
/// Top-level multiprocessor system; construct with [`System::new`].
pub use crate::soc::System;
