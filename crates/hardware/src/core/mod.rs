//! Cache core: the set-associative store and the coherence protocol engines.

/// Cache line and set-associative cache store (lookup, LRU victim selection,
/// fill with write-back).
pub mod cache;

/// Snooping coherence protocols (MCI write-invalidate, Dragon write-update).
pub mod protocol;

pub use cache::{Cache, CacheLine, Presence};
