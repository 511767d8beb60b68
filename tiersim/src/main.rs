use std::path::PathBuf;
use std::time::{Duration, Instant};
use clap::{Parser, ValueEnum};
use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tiercache::config::{HierarchyConfig, ReplacementPolicyConfig};
use tiercache::error::ConfigError;
use tiercache::io::read_trace;
use tiercache::parallel_sim::ParallelSimulator;
use tiercache::report::{render_chart, render_summary, write_report, CHART_WIDTH};
use tiercache::simulator::{AggregateCounters, Simulator};
use tiercache::trace::{Trace, DEFAULT_RANDOM_TRACE_LEN};

#[cfg(debug_assertions)]
const DEBUG_DEFAULT: bool = true;

#[cfg(not(debug_assertions))]
const DEBUG_DEFAULT: bool = false;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Mode {
    /// One address at a time, in trace order
    Sequential,
    /// A pool of workers, each cache level owned by its own thread
    Concurrent,
}

#[derive(Parser, Debug)]
#[command(about = String::from("Two level (L1/L2) set associative cache simulator"))]
struct Args {
    /// JSON configuration file. The flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// L1 capacity in bytes
    #[arg(long)]
    l1_size: Option<u64>,

    /// L2 capacity in bytes
    #[arg(long)]
    l2_size: Option<u64>,

    /// Block size in bytes, shared by both levels
    #[arg(long)]
    block_size: Option<u64>,

    /// Lines per set, 1 for direct mapping
    #[arg(long)]
    associativity: Option<u64>,

    /// Replacement policy: LRU, FIFO or RANDOM
    #[arg(long, value_parser = parse_policy)]
    policy: Option<ReplacementPolicyConfig>,

    /// Seed for the random trace and the RANDOM policy
    #[arg(long)]
    seed: Option<u64>,

    /// Trace file, one hexadecimal address per line
    #[arg(short, long, conflicts_with = "random")]
    trace: Option<PathBuf>,

    /// Length of the random trace used when no trace file is given
    #[arg(long)]
    random: Option<usize>,

    #[arg(short, long, value_enum, default_value_t = Mode::Sequential)]
    mode: Mode,

    /// Worker threads for the concurrent mode
    #[arg(short, long, default_value_t = default_workers())]
    workers: usize,

    /// Where the text report is written
    #[arg(short, long, default_value = "results.txt")]
    report: PathBuf,

    /// Also print the counters as JSON
    #[arg(long)]
    json: bool,

    #[arg(short, long)]
    performance: bool,

    #[arg(short, long, default_value_t = DEBUG_DEFAULT)]
    debug: bool,
}

fn parse_policy(name: &str) -> Result<ReplacementPolicyConfig, ConfigError> {
    name.parse()
}

fn default_workers() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4)
}

/// Merges the config file, if any, with the command line flags. Flags win
fn load_config(args: &Args) -> Result<HierarchyConfig, ConfigError> {
    let file = args.config.as_deref().map(HierarchyConfig::from_file).transpose()?;
    let pick = |flag: Option<u64>, from_file: fn(&HierarchyConfig) -> u64, name: &'static str| {
        flag.or(file.as_ref().map(from_file)).ok_or(ConfigError::Missing(name))
    };
    Ok(HierarchyConfig {
        l1_size: pick(args.l1_size, |c| c.l1_size, "--l1-size")?,
        l2_size: pick(args.l2_size, |c| c.l2_size, "--l2-size")?,
        block_size: pick(args.block_size, |c| c.block_size, "--block-size")?,
        associativity: pick(args.associativity, |c| c.associativity, "--associativity")?,
        replacement_policy: args
            .policy
            .or(file.as_ref().map(|c| c.replacement_policy))
            .unwrap_or_default(),
        seed: args.seed.or(file.as_ref().and_then(|c| c.seed)),
    })
}

fn load_trace(args: &Args) -> Result<Trace, String> {
    match &args.trace {
        Some(path) => read_trace(path).map_err(|e| e.to_string()),
        None => {
            let len = args.random.unwrap_or(DEFAULT_RANDOM_TRACE_LEN);
            let mut rng = match args.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            debug!("Generating a random trace of {len} addresses");
            Ok(Trace::random(len, &mut rng))
        }
    }
}

fn main() -> Result<(), String> {
    let start = Instant::now();
    let args = Args::parse();
    let default_filter = if args.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let config = load_config(&args).map_err(|e| format!("Invalid configuration: {e}"))?;
    let trace = load_trace(&args).map_err(|e| format!("Couldn't load the trace: {e}"))?;

    let (result, simulation_time, invalid_lines): (AggregateCounters, Duration, [usize; 2]) = match args.mode {
        Mode::Sequential => {
            let mut simulator = Simulator::new(&config).map_err(|e| format!("Invalid configuration: {e}"))?;
            simulator.simulate(&trace);
            let time = *simulator.get_execution_time();
            let invalid_lines = simulator.get_invalid_line_counts();
            (simulator.into_result(), time, invalid_lines)
        }
        Mode::Concurrent => {
            let run = ParallelSimulator::new(&config, args.workers)
                .map_err(|e| format!("Invalid configuration: {e}"))?
                .simulate(&trace)
                .map_err(|e| format!("Simulation failed: {e}"))?;
            let invalid_lines = run.get_invalid_line_counts();
            (run.result, run.simulation_time, invalid_lines)
        }
    };

    print!("{}", render_summary(&result));
    println!();
    print!("{}", render_chart(&result, CHART_WIDTH));
    if args.json {
        println!("{}", serde_json::to_string_pretty(&result).map_err(|e| format!("Couldn't serialise the output {e}"))?);
    }
    write_report(&args.report, &result).map_err(|e| e.to_string())?;
    println!("Results saved to {}", args.report.display());

    if args.performance {
        let total_time = start.elapsed();
        println!("Simulation time: {}s", simulation_time.as_nanos() as f64 / 1e9);
        println!("Total execution time (includes configuration, trace loading, and output): {}s", total_time.as_nanos() as f64 / 1e9)
    }
    if args.debug {
        #[cfg(debug_assertions)]
        println!("Running the debug binary, debug mode is enabled by default. If benchmarking, do not use this binary, re-compile with the --release argument when using cargo run");
        println!("Parsed input configuration: {config:?}");
        println!("Uninitialised cache lines by layer: (L1: {}, L2: {})", invalid_lines[0], invalid_lines[1]);
        println!("Total uninitialised cache lines: {}", invalid_lines.iter().sum::<usize>())
    }
    Ok(())
}
