//! Snooping coherence protocols.
//!
//! A [`Protocol`] is the seam between the cache store and the coherence
//! state machine. Each implementation supplies its own line-state and
//! bus-transaction enums, the access-side transition function (what a
//! processor read or write does to the local line, and what it puts on the
//! bus), and the snoop-side transition function (how a resident line reacts
//! to a transaction broadcast by a peer).
//!
//! Engines are stateless: all mutable state lives in the [`Cache`] they
//! operate on. The protocol is fixed for a whole simulation run, so the seam
//! is a generic parameter rather than a boxed object.

use std::fmt;

use crate::common::MemOp;
use crate::config::ProtocolKind;
use crate::core::cache::Cache;

/// MCI write-invalidate protocol.
pub mod mci;

/// Dragon write-update protocol.
pub mod dragon;

pub use dragon::{Dragon, DragonSignal, DragonState};
pub use mci::{Mci, MciSignal, MciState};

/// A snooping coherence protocol: per-line state, bus transaction vocabulary,
/// and the access/snoop transition functions.
pub trait Protocol: Sized {
    /// Coherence state carried by each resident line.
    type State: Copy + Eq + fmt::Debug;

    /// Bus transactions this protocol can broadcast. "No transaction" is
    /// expressed as `Option::None` by [`Protocol::access`].
    type Signal: Copy + Eq + fmt::Debug;

    /// Which protocol this is, for banners and report labels.
    const KIND: ProtocolKind;

    /// Whether the coordinator must probe every other cache for the block
    /// before invoking [`Protocol::access`] (the Dragon shared-elsewhere
    /// flag). Protocols returning `false` always receive `false`.
    fn probes_peers() -> bool;

    /// Whether a line in `state` holds the only up-to-date copy of its
    /// block, so that evicting it requires a write-back.
    fn owns_sole_copy(state: Self::State) -> bool;

    /// Applies a processor access to `cache` and returns the bus transaction
    /// to broadcast to all other caches, if any.
    fn access(
        cache: &mut Cache<Self>,
        addr: u64,
        op: MemOp,
        shared_elsewhere: bool,
    ) -> Option<Self::Signal>;

    /// Applies a snooped bus transaction to `cache`. Only resident lines
    /// react; everything else is a no-op.
    fn snoop(cache: &mut Cache<Self>, addr: u64, signal: Self::Signal);

    /// Splits a compound transaction into the ordered parts a snooping cache
    /// must observe. Elementary transactions pass through unchanged.
    fn decompose(signal: Self::Signal) -> (Self::Signal, Option<Self::Signal>);
}
