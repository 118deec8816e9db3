//! Multiprocessor System Unit Tests.
//!
//! End-to-end trace replay: access routing, the Dragon shared-elsewhere
//! probe, snoop broadcast (including compound-signal ordering), and error
//! reporting for bad records.

use smpsim_core::common::MemOp;
use smpsim_core::common::error::{ConfigError, SimError, TraceError};
use smpsim_core::config::CacheConfig;
use smpsim_core::core::protocol::{DragonState, MciState};
use smpsim_core::{Dragon, Mci, System, TraceRecord};

fn small_cache() -> CacheConfig {
    CacheConfig {
        size_bytes: 256,
        ways: 2,
        line_bytes: 64,
    }
}

fn read(processor: usize, addr: u64) -> TraceRecord {
    TraceRecord {
        processor,
        op: MemOp::Read,
        addr,
    }
}

fn write(processor: usize, addr: u64) -> TraceRecord {
    TraceRecord {
        processor,
        op: MemOp::Write,
        addr,
    }
}

// ══════════════════════════════════════════════════════════
// 1. Single Processor, MCI
// ══════════════════════════════════════════════════════════

/// 1024-byte direct-mapped cache with 32-byte lines (32 sets). The read of
/// 0x0 misses, the write to the same line hits, and 0x20 maps to the next
/// set and misses.
#[test]
fn single_processor_mci_replay() {
    let cache = CacheConfig {
        size_bytes: 1024,
        ways: 1,
        line_bytes: 32,
    };
    let mut system: System<Mci> = System::new(&cache, 1).unwrap();

    system.step(read(0, 0x0)).unwrap();
    system.step(write(0, 0x0)).unwrap();
    system.step(read(0, 0x20)).unwrap();

    let stats = system.cache(0).unwrap().stats;
    assert_eq!(stats.reads, 2);
    assert_eq!(stats.read_misses, 2);
    assert_eq!(stats.writes, 1);
    assert_eq!(stats.write_misses, 0);
    assert_eq!(stats.write_backs, 0);
    assert_eq!(stats.mem_transactions, 2);
    assert_eq!(stats.bus_rdx, 0);
    assert!((stats.miss_rate() - 100.0 * 2.0 / 3.0).abs() < 1e-9);
}

/// With a single processor there is nobody to snoop, so no invalidations
/// ever happen.
#[test]
fn single_processor_never_invalidates() {
    let mut system: System<Mci> = System::new(&small_cache(), 1).unwrap();

    for addr in [0x0, 0x40, 0x80, 0x0] {
        system.step(write(0, addr)).unwrap();
    }

    assert_eq!(system.cache(0).unwrap().stats.invalidations, 0);
}

// ══════════════════════════════════════════════════════════
// 2. MCI Broadcast
// ══════════════════════════════════════════════════════════

/// MCI invalidates peer copies even on a read miss: after both processors
/// read the block, only the latest reader holds it.
#[test]
fn mci_read_miss_invalidates_peer() {
    let mut system: System<Mci> = System::new(&small_cache(), 2).unwrap();

    system.step(read(0, 0x100)).unwrap();
    system.step(read(1, 0x100)).unwrap();

    assert!(system.cache(0).unwrap().lookup(0x100).is_none());
    assert!(system.cache(1).unwrap().lookup(0x100).is_some());
    assert_eq!(system.cache(0).unwrap().stats.invalidations, 1);
}

/// A peer's Modified copy is flushed before it is invalidated.
#[test]
fn mci_write_steals_modified_block() {
    let mut system: System<Mci> = System::new(&small_cache(), 2).unwrap();

    system.step(write(0, 0x100)).unwrap();
    system.step(write(1, 0x100)).unwrap();

    let p0 = system.cache(0).unwrap().stats;
    assert_eq!(p0.write_backs, 1);
    assert_eq!(p0.flushes, 1);
    assert_eq!(p0.invalidations, 1);
    assert!(system.cache(0).unwrap().lookup(0x100).is_none());

    let p1 = system.cache(1).unwrap();
    assert_eq!(
        p1.lookup(0x100).and_then(|l| l.state()),
        Some(MciState::Modified)
    );
    assert_eq!(p1.stats.bus_rdx, 1);
}

// ══════════════════════════════════════════════════════════
// 3. Dragon Broadcast
// ══════════════════════════════════════════════════════════

/// The writer's Modified line becomes the SharedModified owner when a peer
/// reads the block; the reader comes in SharedClean.
#[test]
fn dragon_reader_demotes_modified_writer() {
    let mut system: System<Dragon> = System::new(&small_cache(), 2).unwrap();

    system.step(write(0, 0x1000)).unwrap();
    system.step(read(1, 0x1000)).unwrap();

    let p0 = system.cache(0).unwrap();
    assert_eq!(
        p0.lookup(0x1000).and_then(|l| l.state()),
        Some(DragonState::SharedModified)
    );
    assert_eq!(p0.stats.interventions, 1);
    assert_eq!(p0.stats.flushes, 1);
    assert_eq!(p0.stats.write_backs, 1);
    assert_eq!(p0.stats.mem_transactions, 2);

    let p1 = system.cache(1).unwrap();
    assert_eq!(
        p1.lookup(0x1000).and_then(|l| l.state()),
        Some(DragonState::SharedClean)
    );
    assert_eq!(p1.stats.read_misses, 1);
    assert_eq!(p1.stats.mem_transactions, 1);
}

/// The first writer sees no sharers: its miss leaves the peer untouched.
#[test]
fn dragon_first_write_has_no_snoop_effect() {
    let mut system: System<Dragon> = System::new(&small_cache(), 2).unwrap();

    system.step(write(0, 0x1000)).unwrap();

    assert_eq!(
        system
            .cache(0)
            .unwrap()
            .lookup(0x1000)
            .and_then(|l| l.state()),
        Some(DragonState::Modified)
    );
    assert!(system.cache(1).unwrap().lookup(0x1000).is_none());
    assert_eq!(system.cache(1).unwrap().stats.interventions, 0);
}

/// A write miss to a block a peer holds Modified broadcasts the compound
/// signal, and the peer observes BusRd strictly before BusUpd: it first
/// flushes into SharedModified, then the update demotes it to SharedClean.
#[test]
fn dragon_compound_signal_keeps_order() {
    let mut system: System<Dragon> = System::new(&small_cache(), 2).unwrap();

    system.step(write(0, 0x1000)).unwrap();
    system.step(write(1, 0x1000)).unwrap();

    let p0 = system.cache(0).unwrap();
    assert_eq!(
        p0.lookup(0x1000).and_then(|l| l.state()),
        Some(DragonState::SharedClean)
    );
    assert_eq!(p0.stats.interventions, 1);
    assert_eq!(p0.stats.flushes, 1);
    assert_eq!(p0.stats.write_backs, 1);

    let p1 = system.cache(1).unwrap();
    assert_eq!(
        p1.lookup(0x1000).and_then(|l| l.state()),
        Some(DragonState::SharedModified)
    );
    assert_eq!(p1.stats.bus_upd, 1);
}

/// Sharing is probed across all peers, not just one: with three processors,
/// a block held by the third makes the first's write miss shared.
#[test]
fn dragon_probe_scans_every_peer() {
    let mut system: System<Dragon> = System::new(&small_cache(), 3).unwrap();

    system.step(read(2, 0x1000)).unwrap();
    system.step(write(0, 0x1000)).unwrap();

    assert_eq!(
        system
            .cache(0)
            .unwrap()
            .lookup(0x1000)
            .and_then(|l| l.state()),
        Some(DragonState::SharedModified)
    );
    assert_eq!(system.cache(0).unwrap().stats.bus_upd, 1);
}

// ══════════════════════════════════════════════════════════
// 4. Errors and Run Loop
// ══════════════════════════════════════════════════════════

/// A record addressing a processor outside the system is rejected.
#[test]
fn out_of_range_processor_is_rejected() {
    let mut system: System<Mci> = System::new(&small_cache(), 2).unwrap();

    let err = system.step(read(2, 0x0)).unwrap_err();
    assert!(matches!(
        err,
        SimError::UnknownProcessor {
            processor: 2,
            available: 2
        }
    ));
}

/// `run` stops at the first reader error and surfaces it.
#[test]
fn run_propagates_trace_errors() {
    let mut system: System<Mci> = System::new(&small_cache(), 2).unwrap();

    let records = vec![
        Ok(read(0, 0x0)),
        Err(TraceError::UnknownOp {
            line: 2,
            op: "x".to_string(),
        }),
    ];

    let err = system.run(records).unwrap_err();
    assert!(matches!(err, SimError::Trace(TraceError::UnknownOp { line: 2, .. })));
    // The record before the error was still applied.
    assert_eq!(system.cache(0).unwrap().stats.reads, 1);
}

/// A system needs at least one processor.
#[test]
fn zero_processors_is_rejected() {
    let err = System::<Mci>::new(&small_cache(), 0).unwrap_err();
    assert!(matches!(
        err,
        SimError::Config(ConfigError::ZeroProcessors)
    ));
}

/// Bad cache geometry surfaces through system construction.
#[test]
fn bad_geometry_is_rejected() {
    let cache = CacheConfig {
        size_bytes: 0,
        ways: 2,
        line_bytes: 64,
    };
    let err = System::<Dragon>::new(&cache, 2).unwrap_err();
    assert!(matches!(
        err,
        SimError::Config(ConfigError::ZeroGeometry { .. })
    ));
}
