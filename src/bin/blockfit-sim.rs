//! Block allocation simulator
//!
//! Replays a request script once per strategy against a fresh allocator and
//! prints the resulting memory and page table state.

use anyhow::Context;
use blockfit::{AllocationStrategy, Allocator, SimulatorConfig};
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "blockfit-sim")]
#[command(about = "Compare first/best/worst/next-fit placement on a fixed set of blocks")]
struct Args {
    /// TOML configuration file (defaults to the built-in demonstration)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Run a single strategy (first-fit, best-fit, worst-fit, next-fit)
    #[arg(short = 's', long)]
    strategy: Option<AllocationStrategy>,

    /// Print snapshots as JSON
    #[arg(long)]
    json: bool,
}

fn run_strategy(
    config: &SimulatorConfig,
    strategy: AllocationStrategy,
    json: bool,
) -> anyhow::Result<()> {
    let mut allocator = Allocator::from_config(config)?;

    println!("Testing {} Strategy:", strategy);
    for request in &config.requests {
        match allocator.allocate(strategy, request.size, request.page)? {
            Some(allocation) => println!(
                "{}: Allocated {} to block of size {}",
                strategy, allocation.request, allocation.block_size
            ),
            None => println!("{}: No suitable block found for {}", strategy, request.size),
        }
    }

    let snapshot = allocator.snapshot();
    if json {
        println!("{}", snapshot.to_json()?);
    } else {
        print!("{}", snapshot);
    }

    let stats = allocator.stats();
    println!(
        "free {}/{} blocks, waste {}, failed {}, fragmentation {:.2}",
        stats.free_blocks,
        stats.total_blocks,
        stats.internal_waste,
        stats.failed_requests,
        allocator.fragmentation_score()
    );
    println!();

    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            SimulatorConfig::from_file(path)
                .with_context(|| format!("failed to load {}", path.display()))?
        }
        None => {
            debug!("Using built-in demonstration script");
            SimulatorConfig::default()
        }
    };

    if let Some(strategy) = args.strategy {
        config = config.restrict_to(strategy);
    }

    let initial = Allocator::from_config(&config)?;
    println!("Initial Memory State:");
    if args.json {
        println!("{}", initial.snapshot().to_json()?);
    } else {
        print!("{}", initial.snapshot());
    }
    println!();

    for &strategy in &config.strategies {
        run_strategy(&config, strategy, args.json)?;
    }

    Ok(())
}
