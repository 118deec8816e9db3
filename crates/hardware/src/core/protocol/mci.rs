//! MCI: a write-invalidate snooping protocol.
//!
//! Resident lines are either Modified (this cache wrote the block; memory is
//! stale) or Clean (the block matches memory and may be shared). The third
//! state, Invalid, is a line with no resident block; a snooped transaction
//! invalidates the local copy outright, which is what makes the protocol
//! write-invalidate. Any snooped transaction, including a plain read, drops
//! the local copy.

use tracing::trace;

use crate::common::MemOp;
use crate::config::ProtocolKind;
use crate::core::cache::{Cache, Presence};

use super::Protocol;

/// Coherence state of a resident MCI line. Invalid is the absence of a
/// resident line, not a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MciState {
    /// Written locally; the only up-to-date copy in the system.
    Modified,
    /// Matches memory; other caches may hold the same block.
    Clean,
}

/// Bus transactions MCI can broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MciSignal {
    /// A read miss fetching the block.
    BusRd,
    /// A read with intent to modify; peers must give up their copies.
    BusRdX,
}

/// The MCI write-invalidate protocol.
#[derive(Debug, Clone, Copy)]
pub struct Mci;

impl Protocol for Mci {
    type State = MciState;
    type Signal = MciSignal;

    const KIND: ProtocolKind = ProtocolKind::Mci;

    fn probes_peers() -> bool {
        false
    }

    fn owns_sole_copy(state: MciState) -> bool {
        state == MciState::Modified
    }

    fn access(
        cache: &mut Cache<Self>,
        addr: u64,
        op: MemOp,
        _shared_elsewhere: bool,
    ) -> Option<MciSignal> {
        cache.record_access(op);

        if let Some(way) = cache.find_way(addr) {
            // A snoop may have left the coherence state stale relative to the
            // residency flag; re-derive it before applying the operation.
            let reconciled = if cache.line(way).presence() == Presence::Dirty {
                MciState::Modified
            } else {
                MciState::Clean
            };
            cache.line_mut(way).state = Some(reconciled);
            cache.touch(way);

            match op {
                MemOp::Write => {
                    let line = cache.line_mut(way);
                    line.presence = Presence::Dirty;
                    if line.state == Some(MciState::Clean) {
                        line.state = Some(MciState::Modified);
                    }
                    trace!(addr = %format_args!("{addr:#x}"), "write hit, now Modified");
                    None
                }
                MemOp::Read => {
                    trace!(addr = %format_args!("{addr:#x}"), "read hit");
                    None
                }
            }
        } else {
            let way = cache.fill(addr);
            match op {
                MemOp::Write => {
                    cache.stats.write_misses += 1;
                    cache.stats.mem_transactions += 1;
                    cache.stats.bus_rdx += 1;
                    let line = cache.line_mut(way);
                    line.presence = Presence::Dirty;
                    line.state = Some(MciState::Modified);
                    trace!(addr = %format_args!("{addr:#x}"), "write miss, now Modified");
                    Some(MciSignal::BusRdX)
                }
                MemOp::Read => {
                    cache.stats.read_misses += 1;
                    cache.stats.mem_transactions += 1;
                    cache.line_mut(way).state = Some(MciState::Clean);
                    trace!(addr = %format_args!("{addr:#x}"), "read miss, now Clean");
                    Some(MciSignal::BusRd)
                }
            }
        }
    }

    fn snoop(cache: &mut Cache<Self>, addr: u64, signal: MciSignal) {
        let Some(way) = cache.find_way(addr) else {
            return;
        };

        match (cache.line(way).state(), signal) {
            (Some(MciState::Modified), MciSignal::BusRd | MciSignal::BusRdX) => {
                cache.stats.write_backs += 1;
                cache.stats.mem_transactions += 1;
                cache.stats.flushes += 1;
                cache.stats.invalidations += 1;
                cache.line_mut(way).invalidate();
                trace!(addr = %format_args!("{addr:#x}"), ?signal, "flushed and invalidated");
            }
            (Some(MciState::Clean), MciSignal::BusRd | MciSignal::BusRdX) => {
                cache.stats.invalidations += 1;
                cache.line_mut(way).invalidate();
                trace!(addr = %format_args!("{addr:#x}"), ?signal, "invalidated");
            }
            (None, _) => {}
        }
    }

    fn decompose(signal: MciSignal) -> (MciSignal, Option<MciSignal>) {
        (signal, None)
    }
}
