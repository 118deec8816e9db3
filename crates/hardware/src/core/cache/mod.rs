//! Set-associative cache store.
//!
//! One [`Cache`] models the private cache of a single processor: a fixed grid
//! of lines (sets x ways, flattened into one vector), a monotonic access
//! counter that orders recency for LRU replacement, and the statistics block
//! the protocol engines charge their events to.
//!
//! The store handles placement only. Coherence state transitions live in the
//! [`protocol`](crate::core::protocol) engines; the store's contribution is
//! `lookup`, LRU victim selection, and the write-back a fill performs when it
//! evicts the sole up-to-date copy of a block.

use crate::common::MemOp;
use crate::config::Geometry;
use crate::core::protocol::Protocol;
use crate::stats::CacheStats;

/// Residency of a cache line, separate from its coherence state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// No block cached in this line; tag and coherence state are meaningless.
    Invalid,
    /// A block is cached and matches memory.
    Valid,
    /// A block is cached and has been written locally.
    Dirty,
}

/// One cache line: tag, residency, protocol-specific coherence state, and the
/// access-counter value of its most recent use.
///
/// `state` is `None` exactly when the line is not resident, so an invalid
/// line cannot carry a stale coherence state by construction.
#[derive(Debug, Clone)]
pub struct CacheLine<S> {
    pub(crate) tag: u64,
    pub(crate) presence: Presence,
    pub(crate) state: Option<S>,
    pub(crate) last_used: u64,
}

impl<S> CacheLine<S> {
    const fn invalid() -> Self {
        Self {
            tag: 0,
            presence: Presence::Invalid,
            state: None,
            last_used: 0,
        }
    }

    /// The tag of the cached block (meaningful only while resident).
    pub const fn tag(&self) -> u64 {
        self.tag
    }

    /// Residency and dirtiness of this line.
    pub const fn presence(&self) -> Presence {
        self.presence
    }

    /// Access-counter value of the most recent use of this line.
    pub const fn last_used(&self) -> u64 {
        self.last_used
    }

    /// Whether a block is cached in this line.
    pub fn is_resident(&self) -> bool {
        self.presence != Presence::Invalid
    }

    pub(crate) fn invalidate(&mut self) {
        self.tag = 0;
        self.presence = Presence::Invalid;
        self.state = None;
    }
}

impl<S: Copy> CacheLine<S> {
    /// The protocol-specific coherence state, `None` while not resident.
    pub fn state(&self) -> Option<S> {
        self.state
    }
}

/// A set-associative private cache, parameterized by coherence protocol.
#[derive(Debug)]
pub struct Cache<P: Protocol> {
    lines: Vec<CacheLine<P::State>>, // index = (set * ways) + way
    num_sets: usize,
    ways: usize,
    line_bytes: usize,
    current_cycle: u64,
    /// Accumulated counters for this cache; read by the statistics sink.
    pub stats: CacheStats,
}

impl<P: Protocol> Cache<P> {
    /// Creates an empty cache with the given validated geometry.
    pub fn new(geometry: Geometry) -> Self {
        let Geometry {
            num_sets,
            ways,
            line_bytes,
        } = geometry;

        Self {
            lines: std::iter::repeat_with(CacheLine::invalid)
                .take(num_sets * ways)
                .collect(),
            num_sets,
            ways,
            line_bytes,
            current_cycle: 0,
            stats: CacheStats::default(),
        }
    }

    /// Number of sets.
    pub const fn num_sets(&self) -> usize {
        self.num_sets
    }

    /// Associativity (ways per set).
    pub const fn ways(&self) -> usize {
        self.ways
    }

    /// Line (block) size in bytes.
    pub const fn line_bytes(&self) -> usize {
        self.line_bytes
    }

    fn set_index(&self, addr: u64) -> usize {
        (addr as usize / self.line_bytes) % self.num_sets
    }

    fn tag_of(&self, addr: u64) -> u64 {
        addr / (self.line_bytes * self.num_sets) as u64
    }

    /// Flat index of the resident line holding `addr`, if any.
    pub(crate) fn find_way(&self, addr: u64) -> Option<usize> {
        let tag = self.tag_of(addr);
        let base = self.set_index(addr) * self.ways;

        (base..base + self.ways).find(|&idx| self.lines[idx].is_resident() && self.lines[idx].tag == tag)
    }

    /// Looks up `addr` without side effects.
    ///
    /// This is the read-only probe the coordinator uses to compute the
    /// Dragon shared-elsewhere flag, and what tests inspect line state
    /// through.
    pub fn lookup(&self, addr: u64) -> Option<&CacheLine<P::State>> {
        self.find_way(addr).map(|idx| &self.lines[idx])
    }

    pub(crate) fn line(&self, idx: usize) -> &CacheLine<P::State> {
        &self.lines[idx]
    }

    pub(crate) fn line_mut(&mut self, idx: usize) -> &mut CacheLine<P::State> {
        &mut self.lines[idx]
    }

    /// Opens a processor access: bumps the recency counter and the read or
    /// write counter. Called exactly once per access, before any other logic,
    /// so recency is totally ordered across hits and misses.
    pub(crate) fn record_access(&mut self, op: MemOp) {
        self.current_cycle += 1;
        match op {
            MemOp::Read => self.stats.reads += 1,
            MemOp::Write => self.stats.writes += 1,
        }
    }

    /// LRU promotion on a hit.
    pub(crate) fn touch(&mut self, idx: usize) {
        self.lines[idx].last_used = self.current_cycle;
    }

    /// Victim line for a fill: the first invalid way if any, otherwise the
    /// way with the smallest recency stamp. Recency stamps of resident lines
    /// are globally unique, so the strict `<` scan is deterministic.
    fn victim_way(&self, addr: u64) -> usize {
        let base = self.set_index(addr) * self.ways;

        let mut victim = base;
        let mut min_used = u64::MAX;
        for idx in base..base + self.ways {
            if !self.lines[idx].is_resident() {
                return idx;
            }
            if self.lines[idx].last_used < min_used {
                min_used = self.lines[idx].last_used;
                victim = idx;
            }
        }
        victim
    }

    /// Allocates a line for `addr`, evicting the LRU victim if the set is
    /// full. A victim that is the sole up-to-date copy of its block is
    /// written back first (one write-back, one memory transaction).
    ///
    /// The new line is resident and clean but carries no coherence state yet;
    /// assigning it is the protocol engine's job.
    pub(crate) fn fill(&mut self, addr: u64) -> usize {
        let idx = self.victim_way(addr);

        if self.lines[idx].state.is_some_and(P::owns_sole_copy) {
            self.stats.write_backs += 1;
            self.stats.mem_transactions += 1;
        }

        let tag = self.tag_of(addr);
        let cycle = self.current_cycle;
        let line = &mut self.lines[idx];
        line.tag = tag;
        line.presence = Presence::Valid;
        line.state = None;
        line.last_used = cycle;
        idx
    }

    /// Runs the protocol engine for a processor access against this cache and
    /// returns the bus transaction to broadcast, if any.
    ///
    /// `shared_elsewhere` is the coordinator-computed flag saying whether any
    /// other cache currently holds the block; protocols that do not probe
    /// peers ignore it.
    pub fn access(&mut self, addr: u64, op: MemOp, shared_elsewhere: bool) -> Option<P::Signal> {
        P::access(self, addr, op, shared_elsewhere)
    }

    /// Reacts to a bus transaction broadcast by another cache's access.
    pub fn snoop(&mut self, addr: u64, signal: P::Signal) {
        P::snoop(self, addr, signal);
    }
}
