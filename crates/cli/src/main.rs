//! Trace-driven SMP cache coherence simulator CLI.
//!
//! This binary is the single entry point for simulation runs. It performs:
//! 1. **Configuration:** Cache geometry, processor count, and protocol from
//!    individual flags or a JSON config file.
//! 2. **Replay:** Streams the trace through the multiprocessor system under
//!    the selected coherence protocol (MCI write-invalidate or Dragon
//!    write-update).
//! 3. **Reporting:** Prints the per-cache result blocks in processor order.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use smpsim_core::{
    CacheConfig, Dragon, Mci, Protocol, ProtocolKind, SimConfig, System, TraceReader,
};

#[derive(Parser, Debug)]
#[command(
    name = "smp_cache",
    version,
    about = "Trace-driven snooping-cache coherence simulator",
    long_about = "Replay a shared-memory multiprocessor reference trace against per-processor \
private caches under a snooping coherence protocol.\n\nTrace format: one record per line, \
`<processor> <r|w> <hex address>`.\n\nExamples:\n  \
smp_cache -s 8192 -a 4 -b 64 -n 4 -p mci traces/canneal.t\n  \
smp_cache -s 1048576 -a 8 -b 64 -n 8 -p dragon traces/fft.t\n  \
smp_cache --config sim.json traces/canneal.t"
)]
struct Cli {
    /// Trace file: one `<processor> <r|w> <hex address>` record per line.
    trace: PathBuf,

    /// Total per-processor cache size in bytes.
    #[arg(short = 's', long)]
    cache_size: Option<usize>,

    /// Associativity (ways per set).
    #[arg(short = 'a', long)]
    assoc: Option<usize>,

    /// Cache line (block) size in bytes.
    #[arg(short = 'b', long)]
    block_size: Option<usize>,

    /// Number of processors.
    #[arg(short = 'n', long)]
    processors: Option<usize>,

    /// Coherence protocol: 0/mci or 1/dragon.
    #[arg(short = 'p', long)]
    protocol: Option<String>,

    /// JSON configuration file (alternative to the individual flags).
    #[arg(
        long,
        conflicts_with_all = ["cache_size", "assoc", "block_size", "processors", "protocol"]
    )]
    config: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(msg) => {
            eprintln!("Error: {msg}");
            process::exit(1);
        }
    };

    println!("===== SMP cache simulator configuration =====");
    println!("L1_SIZE:                {}", config.cache.size_bytes);
    println!("L1_ASSOC:               {}", config.cache.ways);
    println!("L1_BLOCKSIZE:           {}", config.cache.line_bytes);
    println!("NUMBER OF PROCESSORS:   {}", config.num_processors);
    println!("COHERENCE PROTOCOL:     {}", config.protocol.name());
    println!("TRACE FILE:             {}", cli.trace.display());

    match config.protocol {
        ProtocolKind::Mci => run::<Mci>(&config, &cli.trace),
        ProtocolKind::Dragon => run::<Dragon>(&config, &cli.trace),
    }
}

/// Assembles the simulation configuration from the JSON file or the
/// individual flags. With `--config` the flags are rejected by clap, so the
/// two sources never mix.
fn build_config(cli: &Cli) -> Result<SimConfig, String> {
    if let Some(path) = &cli.config {
        let text = fs::read_to_string(path)
            .map_err(|e| format!("cannot read config {}: {e}", path.display()))?;
        return serde_json::from_str(&text)
            .map_err(|e| format!("cannot parse config {}: {e}", path.display()));
    }

    let (Some(size_bytes), Some(ways), Some(line_bytes), Some(num_processors), Some(protocol)) = (
        cli.cache_size,
        cli.assoc,
        cli.block_size,
        cli.processors,
        cli.protocol.as_deref(),
    ) else {
        return Err(
            "specify --cache-size, --assoc, --block-size, --processors and --protocol, \
             or --config <file>"
                .to_string(),
        );
    };

    let protocol = protocol.parse::<ProtocolKind>().map_err(|e| e.to_string())?;

    Ok(SimConfig {
        cache: CacheConfig {
            size_bytes,
            ways,
            line_bytes,
        },
        num_processors,
        protocol,
    })
}

/// Runs the whole simulation under protocol `P` and prints the per-cache
/// reports. Exits the process with code 1 on configuration or trace errors.
fn run<P: Protocol>(config: &SimConfig, trace: &Path) {
    let mut system = match System::<P>::new(&config.cache, config.num_processors) {
        Ok(system) => system,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let reader = match TraceReader::open(trace) {
        Ok(reader) => reader,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = system.run(reader) {
        eprintln!("Error: {e}");
        process::exit(1);
    }

    for (id, cache) in system.caches().iter().enumerate() {
        print!("{}", cache.stats.report(id, P::KIND));
    }
}
