//! CAN Dashboard CLI Application
//!
//! Command-line front end for the can-dash-decoder library. It adds:
//! - A vehicle simulator that produces frames for the built-in signal table
//! - A self-test mode that records parser checks in the diagnostic log
//! - A read-only web dashboard polling the vehicle state
//! - A text log of every decoded frame

use anyhow::Result;
use can_dash_decoder::{ingest, Dispatcher, SignalTable, StopSignal, VehicleState};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

mod config;
mod selftest;
mod server;
mod simulator;

use config::AppConfig;
use simulator::VehicleSimulator;

/// CAN Dashboard - decode simulated CAN traffic into a live vehicle dashboard
#[derive(Parser, Debug)]
#[command(name = "can-dash-cli")]
#[command(about = "Decode CAN frames into a live vehicle diagnostics dashboard", long_about = None)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    mode: Option<Mode>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Address for the dashboard server (overrides config)
    #[arg(long, value_name = "ADDR", global = true)]
    bind: Option<String>,

    /// Do not start the dashboard server
    #[arg(long, global = true)]
    no_server: bool,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Run the vehicle simulator through the decoder
    Simulate {
        /// Number of simulation steps (five frames each)
        #[arg(long, value_name = "COUNT")]
        cycles: Option<usize>,

        /// Delay between frames in milliseconds
        #[arg(long, value_name = "MS")]
        interval_ms: Option<u64>,

        /// Decode log file (overrides config)
        #[arg(long, value_name = "FILE")]
        log_file: Option<PathBuf>,

        /// Do not write the decode log
        #[arg(long)]
        no_log: bool,
    },
    /// Run the parser self-test and show the results
    SelfTest {
        /// Keep serving the dashboard after the run
        #[arg(long)]
        serve: bool,
    },
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("CAN Dashboard CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", can_dash_decoder::VERSION);

    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };
    if let Some(bind) = &args.bind {
        config.server.bind = bind.clone();
    }
    if args.no_server {
        config.server.enabled = false;
    }

    match &args.mode {
        Some(Mode::Simulate { cycles, interval_ms, log_file, no_log }) => {
            if cycles.is_some() {
                config.simulation.cycles = *cycles;
            }
            if let Some(interval_ms) = interval_ms {
                config.simulation.frame_interval_ms = *interval_ms;
            }
            if let Some(path) = log_file {
                config.log_sink.path = path.clone();
            }
            if *no_log {
                config.log_sink.enabled = false;
            }
            simulation_mode(&config, args.quiet)
        }
        Some(Mode::SelfTest { serve }) => self_test_mode(&config, *serve),
        None => {
            println!("CAN Dashboard - No mode specified");
            println!("\nQuick Start:");
            println!("  can-dash-cli simulate");
            println!("  can-dash-cli simulate --cycles 100 --interval-ms 20");
            println!("  can-dash-cli self-test --serve");
            println!("\nUse --help for more options");
            Ok(())
        }
    }
}

/// Start the dashboard server if enabled; a bind failure only disables the dashboard
fn start_server(config: &AppConfig, state: &VehicleState, stop: &StopSignal) -> Option<std::thread::JoinHandle<()>> {
    if !config.server.enabled {
        return None;
    }
    match server::spawn(&config.server.bind, state.clone(), stop.clone()) {
        Ok((addr, handle)) => {
            println!("Dashboard: http://{}", addr);
            Some(handle)
        }
        Err(e) => {
            log::warn!("Dashboard disabled: {:#}", e);
            None
        }
    }
}

/// Simulation mode - generate frames, decode them, serve the live state
fn simulation_mode(config: &AppConfig, quiet: bool) -> Result<()> {
    println!("═══════════════════════════════════════════════");
    println!("  CAN Dashboard - Simulation Mode");
    println!("═══════════════════════════════════════════════\n");

    let table = Arc::new(SignalTable::builtin()?);
    let state = VehicleState::new();
    let stop = StopSignal::new();

    let mut dispatcher = Dispatcher::with_sink(table, state.clone(), config.open_log_sink());

    let server = start_server(config, &state, &stop);

    let stats = ingest::run(
        &mut dispatcher,
        VehicleSimulator::new().into_frames(),
        &config.ingest_config(),
        &stop,
        |frame, outcome| {
            if !quiet {
                println!("{}  →  {}", frame, outcome);
            }
        },
    );

    println!("\n📊 Frames processed: {}", stats.frames);
    println!("  Decoded:        {} ({} out of range)", stats.decoded, stats.warnings);
    println!("  Unknown IDs:    {}", stats.unknown_ids);
    println!("  DLC mismatches: {}", stats.dlc_mismatches);
    println!("  Malformed:      {}", stats.malformed);

    stop.stop();
    if let Some(handle) = server {
        if handle.join().is_err() {
            log::error!("Dashboard server thread panicked");
        }
    }

    Ok(())
}

/// Self-test mode - run the built-in checks and publish them on the dashboard
fn self_test_mode(config: &AppConfig, serve: bool) -> Result<()> {
    println!("═══════════════════════════════════════════════");
    println!("  CAN Dashboard - Self-Test Mode");
    println!("═══════════════════════════════════════════════\n");

    let table = Arc::new(SignalTable::builtin()?);
    let state = VehicleState::new();
    let mut dispatcher = Dispatcher::with_sink(table, state.clone(), config.open_log_sink());

    let results = selftest::run_diagnostics(&mut dispatcher, &state);
    for result in &results {
        println!("{:<26} {:<8} {}", result.name, result.status.label(), result.output);
        println!("{:<26} input: {}", "", result.input);
    }
    println!("\nAll tests executed.");

    if serve {
        let stop = StopSignal::new();
        if let Some(handle) = start_server(config, &state, &stop) {
            println!("Serving results, press Ctrl+C to exit");
            if handle.join().is_err() {
                log::error!("Dashboard server thread panicked");
            }
        }
    }

    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
