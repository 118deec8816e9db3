//! Per-cache statistics collection and reporting.
//!
//! Every cache accumulates one [`CacheStats`] block. The protocol engines
//! and the store charge their events to it; this module only counts and
//! formats, it decides nothing.
//!
//! Counter meanings:
//! 1. **reads / writes:** Processor accesses, counted on every access.
//! 2. **read_misses / write_misses:** Accesses that allocated a line.
//! 3. **write_backs:** Dirty-owner lines written out on eviction or snoop.
//! 4. **mem_transactions:** Bus-to-memory traffic (misses, write-backs,
//!    snoop flushes).
//! 5. **invalidations / interventions:** Snoop outcomes; which one is
//!    meaningful depends on the protocol.
//! 6. **flushes:** Blocks supplied to the bus in response to a snoop.
//! 7. **bus_rdx / bus_upd:** Protocol-specific broadcast counts.

use std::fmt;

use crate::config::ProtocolKind;

/// Accumulated counters for one cache.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Processor reads issued to this cache.
    pub reads: u64,
    /// Reads that missed.
    pub read_misses: u64,
    /// Processor writes issued to this cache.
    pub writes: u64,
    /// Writes that missed.
    pub write_misses: u64,
    /// Dirty-owner lines written back to memory.
    pub write_backs: u64,
    /// Memory transactions (misses, write-backs, snoop flushes).
    pub mem_transactions: u64,
    /// Lines dropped in response to a snooped transaction (write-invalidate
    /// protocols).
    pub invalidations: u64,
    /// Blocks supplied to a requester instead of memory (write-update
    /// protocols).
    pub interventions: u64,
    /// Blocks flushed onto the bus in response to a snoop.
    pub flushes: u64,
    /// BusRdX transactions broadcast by this cache.
    pub bus_rdx: u64,
    /// BusUpd transactions broadcast by this cache.
    pub bus_upd: u64,
}

impl CacheStats {
    /// Total miss rate as a percentage of all accesses; zero when the cache
    /// was never accessed.
    pub fn miss_rate(&self) -> f64 {
        let accesses = self.reads + self.writes;
        if accesses == 0 {
            return 0.0;
        }
        100.0 * (self.read_misses + self.write_misses) as f64 / accesses as f64
    }

    /// A displayable report block for this cache.
    pub const fn report(&self, processor: usize, kind: ProtocolKind) -> CacheReport<'_> {
        CacheReport {
            stats: self,
            processor,
            kind,
        }
    }
}

/// Renders one cache's counters as the fixed-format result block.
#[derive(Debug, Clone, Copy)]
pub struct CacheReport<'a> {
    stats: &'a CacheStats,
    processor: usize,
    kind: ProtocolKind,
}

impl fmt::Display for CacheReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.stats;
        writeln!(
            f,
            "============ Simulation results (Cache {}) ============",
            self.processor
        )?;
        writeln!(f, "{:<48}{}", "01. number of reads:", s.reads)?;
        writeln!(f, "{:<48}{}", "02. number of read misses:", s.read_misses)?;
        writeln!(f, "{:<48}{}", "03. number of writes:", s.writes)?;
        writeln!(f, "{:<48}{}", "04. number of write misses:", s.write_misses)?;
        writeln!(
            f,
            "{:<48}{:.2}%",
            "05. total miss rate:",
            s.miss_rate()
        )?;
        writeln!(f, "{:<48}{}", "06. number of writebacks:", s.write_backs)?;
        writeln!(
            f,
            "{:<48}{}",
            "07. number of memory transactions:", s.mem_transactions
        )?;
        match self.kind {
            ProtocolKind::Mci => {
                writeln!(f, "{:<48}{}", "08. number of invalidations:", s.invalidations)?;
            }
            ProtocolKind::Dragon => {
                writeln!(f, "{:<48}{}", "08. number of interventions:", s.interventions)?;
            }
        }
        writeln!(f, "{:<48}{}", "09. number of flushes:", s.flushes)?;
        match self.kind {
            ProtocolKind::Mci => {
                writeln!(f, "{:<48}{}", "10. number of BusRdX:", s.bus_rdx)?;
            }
            ProtocolKind::Dragon => {
                writeln!(
                    f,
                    "{:<48}{}",
                    "10. number of Bus Transactions(BusUpd):", s.bus_upd
                )?;
            }
        }
        Ok(())
    }
}
