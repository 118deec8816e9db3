//! Configuration system for the coherence simulator.
//!
//! This module defines the configuration structures used to parameterize a
//! simulation run. It provides:
//! 1. **Defaults:** Baseline geometry constants for quick experiments.
//! 2. **Structures:** Cache geometry and whole-simulation configuration,
//!    deserializable from JSON.
//! 3. **Validation:** [`CacheConfig::geometry`], which checks the geometry
//!    invariants once and yields the derived [`Geometry`] every cache is
//!    built from.
//!
//! Configuration is supplied by the CLI, either as individual flags or as a
//! JSON document deserialized into [`SimConfig`].

use serde::Deserialize;

use crate::common::error::ConfigError;

/// Default configuration constants for the simulator.
mod defaults {
    /// Default total cache size in bytes (8 KiB per processor).
    pub const CACHE_SIZE: usize = 8192;

    /// Default cache line size in bytes.
    pub const CACHE_LINE: usize = 64;

    /// Default associativity (ways per set).
    pub const CACHE_WAYS: usize = 4;

    /// Default processor count.
    pub const NUM_PROCESSORS: usize = 4;
}

/// Which snooping coherence protocol a simulation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolKind {
    /// Write-invalidate protocol with Modified / Clean / Invalid states.
    Mci,
    /// Write-update Dragon protocol with Modified / Exclusive /
    /// Shared-Modified / Shared-Clean states.
    Dragon,
}

impl ProtocolKind {
    /// Human-readable protocol name, as printed in banners and reports.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mci => "MCI",
            Self::Dragon => "Dragon",
        }
    }
}

impl std::str::FromStr for ProtocolKind {
    type Err = ConfigError;

    /// Accepts the numeric selector (`0` or `1`) as well as the protocol
    /// name, case-insensitively. `msi` is accepted as a historical alias
    /// for the write-invalidate protocol.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "0" || s.eq_ignore_ascii_case("mci") || s.eq_ignore_ascii_case("msi") {
            Ok(Self::Mci)
        } else if s == "1" || s.eq_ignore_ascii_case("dragon") {
            Ok(Self::Dragon)
        } else {
            Err(ConfigError::UnknownProtocol(s.to_string()))
        }
    }
}

/// Geometry of a single per-processor cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CacheConfig {
    /// Total cache size in bytes.
    pub size_bytes: usize,
    /// Associativity (ways per set).
    pub ways: usize,
    /// Line (block) size in bytes.
    pub line_bytes: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            size_bytes: defaults::CACHE_SIZE,
            ways: defaults::CACHE_WAYS,
            line_bytes: defaults::CACHE_LINE,
        }
    }
}

impl CacheConfig {
    /// Validates the configured quantities and derives the cache geometry.
    ///
    /// The invariants are: every quantity non-zero, `line_bytes` a power of
    /// two, `size_bytes` divisible by `ways * line_bytes`, and the resulting
    /// set count a power of two (so set indexing uses whole address bits).
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant as a [`ConfigError`].
    pub fn geometry(&self) -> Result<Geometry, ConfigError> {
        let Self {
            size_bytes: size,
            ways,
            line_bytes: line,
        } = *self;

        if size == 0 || ways == 0 || line == 0 {
            return Err(ConfigError::ZeroGeometry { size, ways, line });
        }
        if !line.is_power_of_two() {
            return Err(ConfigError::LineNotPowerOfTwo(line));
        }
        if size % (ways * line) != 0 {
            return Err(ConfigError::SizeNotDivisible { size, ways, line });
        }
        let num_sets = size / (ways * line);
        if !num_sets.is_power_of_two() {
            return Err(ConfigError::SetsNotPowerOfTwo(num_sets));
        }

        Ok(Geometry {
            num_sets,
            ways,
            line_bytes: line,
        })
    }
}

/// Validated cache geometry, derived once from a [`CacheConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// Number of sets.
    pub num_sets: usize,
    /// Associativity (ways per set).
    pub ways: usize,
    /// Line (block) size in bytes.
    pub line_bytes: usize,
}

/// Configuration of a whole simulation run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimConfig {
    /// Per-processor cache geometry (all caches are identical).
    pub cache: CacheConfig,
    /// Number of processors, each owning one private cache.
    pub num_processors: usize,
    /// Coherence protocol to simulate.
    pub protocol: ProtocolKind,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            num_processors: defaults::NUM_PROCESSORS,
            protocol: ProtocolKind::Mci,
        }
    }
}
