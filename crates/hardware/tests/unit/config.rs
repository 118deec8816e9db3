//! Configuration Unit Tests.
//!
//! Geometry validation, protocol selector parsing, and JSON
//! deserialization of a whole simulation config.

use rstest::rstest;
use smpsim_core::common::error::ConfigError;
use smpsim_core::config::{CacheConfig, ProtocolKind, SimConfig};

// ══════════════════════════════════════════════════════════
// 1. Geometry Validation
// ══════════════════════════════════════════════════════════

/// 1024 bytes of 2-way 32-byte lines make 16 sets.
#[test]
fn geometry_derives_set_count() {
    let geometry = CacheConfig {
        size_bytes: 1024,
        ways: 2,
        line_bytes: 32,
    }
    .geometry()
    .unwrap();

    assert_eq!(geometry.num_sets, 16);
    assert_eq!(geometry.ways, 2);
    assert_eq!(geometry.line_bytes, 32);
}

/// A direct-mapped cache is a valid degenerate case.
#[test]
fn direct_mapped_is_valid() {
    let geometry = CacheConfig {
        size_bytes: 1024,
        ways: 1,
        line_bytes: 32,
    }
    .geometry()
    .unwrap();

    assert_eq!(geometry.num_sets, 32);
}

/// Any zero quantity is rejected before further checks.
#[rstest]
#[case(0, 2, 64)]
#[case(256, 0, 64)]
#[case(256, 2, 0)]
fn zero_geometry_is_rejected(#[case] size: usize, #[case] ways: usize, #[case] line: usize) {
    let err = CacheConfig {
        size_bytes: size,
        ways,
        line_bytes: line,
    }
    .geometry()
    .unwrap_err();

    assert!(matches!(err, ConfigError::ZeroGeometry { .. }));
}

/// Line sizes must split addresses on a bit boundary.
#[test]
fn non_power_of_two_line_is_rejected() {
    let err = CacheConfig {
        size_bytes: 960,
        ways: 1,
        line_bytes: 48,
    }
    .geometry()
    .unwrap_err();

    assert_eq!(err, ConfigError::LineNotPowerOfTwo(48));
}

/// The cache must split evenly into sets.
#[test]
fn indivisible_size_is_rejected() {
    let err = CacheConfig {
        size_bytes: 1000,
        ways: 2,
        line_bytes: 32,
    }
    .geometry()
    .unwrap_err();

    assert!(matches!(err, ConfigError::SizeNotDivisible { .. }));
}

/// Set counts must be a power of two so set indexing uses whole bits.
#[test]
fn non_power_of_two_sets_is_rejected() {
    let err = CacheConfig {
        size_bytes: 1536,
        ways: 1,
        line_bytes: 32,
    }
    .geometry()
    .unwrap_err();

    assert_eq!(err, ConfigError::SetsNotPowerOfTwo(48));
}

// ══════════════════════════════════════════════════════════
// 2. Protocol Selection
// ══════════════════════════════════════════════════════════

/// The selector accepts numeric and named forms, case-insensitively.
#[rstest]
#[case("0", ProtocolKind::Mci)]
#[case("mci", ProtocolKind::Mci)]
#[case("MSI", ProtocolKind::Mci)]
#[case("1", ProtocolKind::Dragon)]
#[case("Dragon", ProtocolKind::Dragon)]
fn protocol_selector_parses(#[case] input: &str, #[case] expected: ProtocolKind) {
    assert_eq!(input.parse::<ProtocolKind>().unwrap(), expected);
}

/// Anything else is an error naming the bad selector.
#[test]
fn unknown_protocol_is_rejected() {
    let err = "mesi".parse::<ProtocolKind>().unwrap_err();
    assert_eq!(err, ConfigError::UnknownProtocol("mesi".to_string()));
}

// ══════════════════════════════════════════════════════════
// 3. JSON Deserialization
// ══════════════════════════════════════════════════════════

/// A full simulation config round-trips from JSON.
#[test]
fn sim_config_from_json() {
    let json = r#"{
        "cache": { "size_bytes": 8192, "ways": 4, "line_bytes": 64 },
        "num_processors": 2,
        "protocol": "dragon"
    }"#;

    let config: SimConfig = serde_json::from_str(json).unwrap();

    assert_eq!(
        config,
        SimConfig {
            cache: CacheConfig {
                size_bytes: 8192,
                ways: 4,
                line_bytes: 64,
            },
            num_processors: 2,
            protocol: ProtocolKind::Dragon,
        }
    );
    assert!(config.cache.geometry().is_ok());
}
