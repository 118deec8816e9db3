//! Dragon: a write-update snooping protocol.
//!
//! Dragon never invalidates a peer's copy. A write to a shared block instead
//! broadcasts the new value (BusUpd) and every holder merges it, so lines
//! stay resident and only their sharing state moves. The four states split
//! along two axes: modified vs. clean with respect to memory, and exclusive
//! vs. shared across caches.
//!
//! The access side needs to know whether any other cache currently holds the
//! block. That flag is computed by the coordinator, which probes every peer
//! before invoking the engine; it is never derived from local state.
//!
//! A write miss to a shared block needs two transactions: the fetch (BusRd)
//! followed by the update broadcast (BusUpd). The engine emits these as the
//! compound [`DragonSignal::BusRdBusUpd`], which the coordinator decomposes
//! into two ordered snoops per peer.

use tracing::trace;

use crate::common::MemOp;
use crate::config::ProtocolKind;
use crate::core::cache::{Cache, Presence};

use super::Protocol;

/// Coherence state of a resident Dragon line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragonState {
    /// Written locally, held by no other cache; memory is stale.
    Modified,
    /// Clean and held by no other cache.
    Exclusive,
    /// Shared; this cache owns the latest (modified) value and supplies it.
    SharedModified,
    /// Shared; some other agent owns the latest value.
    SharedClean,
}

/// Bus transactions Dragon can broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragonSignal {
    /// A miss fetching the block.
    BusRd,
    /// A write broadcast updating every other holder's copy.
    BusUpd,
    /// A forced write-back of an owned block.
    Flush,
    /// A fetch immediately followed by an update broadcast; produced by a
    /// write miss to a shared block and decomposed before snooping.
    BusRdBusUpd,
}

/// The Dragon write-update protocol.
#[derive(Debug, Clone, Copy)]
pub struct Dragon;

impl Protocol for Dragon {
    type State = DragonState;
    type Signal = DragonSignal;

    const KIND: ProtocolKind = ProtocolKind::Dragon;

    fn probes_peers() -> bool {
        true
    }

    fn owns_sole_copy(state: DragonState) -> bool {
        matches!(state, DragonState::Modified | DragonState::SharedModified)
    }

    fn access(
        cache: &mut Cache<Self>,
        addr: u64,
        op: MemOp,
        shared_elsewhere: bool,
    ) -> Option<DragonSignal> {
        cache.record_access(op);

        if let Some(way) = cache.find_way(addr) {
            cache.touch(way);

            match op {
                MemOp::Write => {
                    let state = cache.line(way).state();
                    cache.line_mut(way).presence = Presence::Dirty;
                    match state {
                        Some(DragonState::Modified) => None,
                        Some(DragonState::Exclusive) => {
                            cache.line_mut(way).state = Some(DragonState::Modified);
                            trace!(addr = %format_args!("{addr:#x}"), "write hit, Exclusive to Modified");
                            None
                        }
                        Some(DragonState::SharedClean | DragonState::SharedModified) => {
                            cache.stats.bus_upd += 1;
                            let next = if shared_elsewhere {
                                DragonState::SharedModified
                            } else {
                                DragonState::Modified
                            };
                            cache.line_mut(way).state = Some(next);
                            trace!(
                                addr = %format_args!("{addr:#x}"),
                                ?next,
                                "write hit on shared line, broadcasting update"
                            );
                            Some(DragonSignal::BusUpd)
                        }
                        // Resident lines always carry a state once the engine
                        // has touched them.
                        None => None,
                    }
                }
                MemOp::Read => None,
            }
        } else {
            let way = cache.fill(addr);
            match op {
                MemOp::Write => {
                    cache.stats.write_misses += 1;
                    cache.stats.mem_transactions += 1;
                    let line = cache.line_mut(way);
                    line.presence = Presence::Dirty;
                    if shared_elsewhere {
                        line.state = Some(DragonState::SharedModified);
                        cache.stats.bus_upd += 1;
                        trace!(addr = %format_args!("{addr:#x}"), "write miss, now SharedModified");
                        Some(DragonSignal::BusRdBusUpd)
                    } else {
                        line.state = Some(DragonState::Modified);
                        trace!(addr = %format_args!("{addr:#x}"), "write miss, now Modified");
                        Some(DragonSignal::BusRd)
                    }
                }
                MemOp::Read => {
                    cache.stats.read_misses += 1;
                    cache.stats.mem_transactions += 1;
                    let next = if shared_elsewhere {
                        DragonState::SharedClean
                    } else {
                        DragonState::Exclusive
                    };
                    cache.line_mut(way).state = Some(next);
                    trace!(addr = %format_args!("{addr:#x}"), ?next, "read miss");
                    Some(DragonSignal::BusRd)
                }
            }
        }
    }

    fn snoop(cache: &mut Cache<Self>, addr: u64, signal: DragonSignal) {
        let Some(way) = cache.find_way(addr) else {
            return;
        };

        match (cache.line(way).state(), signal) {
            (Some(DragonState::Exclusive), DragonSignal::BusRd) => {
                cache.line_mut(way).state = Some(DragonState::SharedClean);
                cache.stats.interventions += 1;
                trace!(addr = %format_args!("{addr:#x}"), "intervention, Exclusive to SharedClean");
            }
            (Some(DragonState::SharedModified), DragonSignal::BusRd) => {
                // Owner supplies the block; state is unchanged.
                cache.stats.flushes += 1;
                cache.stats.write_backs += 1;
                cache.stats.mem_transactions += 1;
                trace!(addr = %format_args!("{addr:#x}"), "owner flush from SharedModified");
            }
            (Some(DragonState::SharedModified), DragonSignal::BusUpd) => {
                cache.line_mut(way).state = Some(DragonState::SharedClean);
                trace!(addr = %format_args!("{addr:#x}"), "update received, SharedModified to SharedClean");
            }
            (Some(DragonState::Modified), DragonSignal::BusRd) => {
                cache.line_mut(way).state = Some(DragonState::SharedModified);
                cache.stats.interventions += 1;
                cache.stats.flushes += 1;
                cache.stats.write_backs += 1;
                cache.stats.mem_transactions += 1;
                trace!(addr = %format_args!("{addr:#x}"), "intervention, Modified to SharedModified");
            }
            // SharedClean merges updates and ignores reads; Flush and the
            // remaining pairings have no effect on this cache.
            _ => {}
        }
    }

    fn decompose(signal: DragonSignal) -> (DragonSignal, Option<DragonSignal>) {
        match signal {
            DragonSignal::BusRdBusUpd => (DragonSignal::BusRd, Some(DragonSignal::BusUpd)),
            other => (other, None),
        }
    }
}
