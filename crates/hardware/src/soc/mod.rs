//! Multiprocessor system: per-processor caches on an instantaneous bus.
//!
//! The [`System`] owns one private [`Cache`] per processor and replays trace
//! records against them, strictly in order. For each record it runs the
//! issuing cache's access, then broadcasts the resulting bus transaction to
//! every other cache in increasing processor-id order. The whole
//! access-plus-snoops sequence of one record completes before the next
//! record starts, so a snoop always observes the effects of every earlier
//! record and of the current record's access phase.
//!
//! There is no bus arbitration or timing model: the bus is a broadcast that
//! happens "now".

use tracing::debug;

use crate::common::error::{ConfigError, SimError, TraceError};
use crate::config::CacheConfig;
use crate::core::cache::Cache;
use crate::core::protocol::Protocol;
use crate::sim::trace::TraceRecord;

/// A shared-memory multiprocessor: one private cache per processor, kept
/// coherent by protocol `P`.
#[derive(Debug)]
pub struct System<P: Protocol> {
    caches: Vec<Cache<P>>,
}

impl<P: Protocol> System<P> {
    /// Builds a system of `num_processors` identical caches.
    ///
    /// # Errors
    ///
    /// Rejects a zero processor count and any geometry [`CacheConfig`]
    /// rejects.
    pub fn new(cache: &CacheConfig, num_processors: usize) -> Result<Self, SimError> {
        if num_processors == 0 {
            return Err(ConfigError::ZeroProcessors.into());
        }
        let geometry = cache.geometry().map_err(SimError::Config)?;

        Ok(Self {
            caches: (0..num_processors).map(|_| Cache::new(geometry)).collect(),
        })
    }

    /// Number of processors (and caches) in the system.
    pub fn num_processors(&self) -> usize {
        self.caches.len()
    }

    /// All caches, indexed by processor id.
    pub fn caches(&self) -> &[Cache<P>] {
        &self.caches
    }

    /// The cache of one processor, if the id is in range.
    pub fn cache(&self, processor: usize) -> Option<&Cache<P>> {
        self.caches.get(processor)
    }

    /// Replays one trace record: access on the issuing processor's cache,
    /// then the snoop broadcast to everyone else.
    ///
    /// For protocols that probe peers (Dragon), every other cache is first
    /// queried read-only for the block to compute the shared-elsewhere flag.
    /// Compound transactions are decomposed into their ordered parts per
    /// snooping cache.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownProcessor`] when the record's processor id
    /// is outside the configured system.
    pub fn step(&mut self, record: TraceRecord) -> Result<(), SimError> {
        let TraceRecord {
            processor,
            op,
            addr,
        } = record;

        if processor >= self.caches.len() {
            return Err(SimError::UnknownProcessor {
                processor,
                available: self.caches.len(),
            });
        }

        let shared_elsewhere = P::probes_peers()
            && self
                .caches
                .iter()
                .enumerate()
                .any(|(id, cache)| id != processor && cache.lookup(addr).is_some());

        let signal = self.caches[processor].access(addr, op, shared_elsewhere);
        debug!(
            processor,
            op = %op.symbol(),
            addr = %format_args!("{addr:#x}"),
            shared_elsewhere,
            ?signal,
            "access"
        );

        if let Some(signal) = signal {
            let (first, follow) = P::decompose(signal);
            for id in 0..self.caches.len() {
                if id == processor {
                    continue;
                }
                self.caches[id].snoop(addr, first);
                if let Some(second) = follow {
                    self.caches[id].snoop(addr, second);
                }
            }
        }

        Ok(())
    }

    /// Replays a whole trace, one record at a time. End of input is normal
    /// termination; the first trace or simulation error stops the run.
    ///
    /// # Errors
    ///
    /// Propagates reader errors and any error from [`System::step`].
    pub fn run<I>(&mut self, trace: I) -> Result<(), SimError>
    where
        I: IntoIterator<Item = Result<TraceRecord, TraceError>>,
    {
        for record in trace {
            self.step(record?)?;
        }
        Ok(())
    }
}
