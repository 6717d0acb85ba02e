// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Standalone ensemble processing element.
//!
//! Loads `ensemble_configuration.toml`, builds the simulation context and
//! serves host commands. With `--ticks N` the node runs once for N ticks and
//! exits; otherwise it runs until a `stop` or `exit` line arrives on stdin.
//! `run N`, `run` (unbounded), `stop` and `exit` are accepted between runs.

use std::collections::HashMap;
use std::env;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::thread;

use anyhow::{Context, Result};
use clap::{CommandFactory, FromArgMatches, Parser};
use crossbeam::channel::{unbounded, Sender};
use tracing::{debug, info, warn};

use ensemble::config::{load_config, EnsembleConfig};
use ensemble::observability::{debug_flags_help, init_logging, CrateDebugFlags};
use ensemble::neural::S1615;
use ensemble::runtime::{packet_channel, ChannelOutputSink, HostCommand, RunLength, TickScheduler};

/// Ensemble node - spiking ensemble with online PES decoder learning
#[derive(Parser, Debug)]
#[command(name = "ensemble-node", version, author, long_about = None)]
struct Args {
    /// Path to the configuration file (searched for when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run for this many ticks, then exit
    #[arg(short, long)]
    ticks: Option<u32>,

    /// Override system.machine_timestep_us
    #[arg(long)]
    timestep_us: Option<u32>,

    /// Run ticks back-to-back instead of in real time
    #[arg(long, default_value_t = false)]
    as_fast_as_possible: bool,

    /// Override recording.record_spikes
    #[arg(long)]
    record_spikes: Option<bool>,

    /// Override logging.level
    #[arg(long)]
    log_level: Option<String>,

    /// Override logging.log_dir
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> HashMap<String, String> {
        let mut cli = HashMap::new();
        if let Some(us) = self.timestep_us {
            cli.insert("timestep_us".to_string(), us.to_string());
        }
        if self.as_fast_as_possible {
            cli.insert("real_time".to_string(), "false".to_string());
        }
        if let Some(record) = self.record_spikes {
            cli.insert("record_spikes".to_string(), record.to_string());
        }
        if let Some(level) = &self.log_level {
            cli.insert("log_level".to_string(), level.clone());
        }
        if let Some(dir) = &self.log_dir {
            cli.insert("log_dir".to_string(), dir.display().to_string());
        }
        cli
    }
}

fn parse_command(line: &str) -> Option<HostCommand> {
    let mut words = line.split_whitespace();
    match (words.next()?, words.next()) {
        ("run", None) => Some(HostCommand::Run(RunLength::Forever)),
        ("run", Some(n)) => n.parse().ok().map(|n| HostCommand::Run(RunLength::Ticks(n))),
        ("stop", None) => Some(HostCommand::Stop),
        ("exit", None) | ("quit", None) => Some(HostCommand::Exit),
        _ => None,
    }
}

/// Forward stdin lines as host commands until `exit` or end of input
fn spawn_stdin_host(commands: Sender<HostCommand>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match parse_command(&line) {
                Some(command) => {
                    let exit = command == HostCommand::Exit;
                    if commands.send(command).is_err() || exit {
                        return;
                    }
                }
                None => warn!("Unknown host command: {}", line.trim()),
            }
        }
        let _ = commands.send(HostCommand::Exit);
    })
}

fn print_banner(config: &EnsembleConfig) {
    info!("Ensemble node v{}", ensemble::VERSION);
    info!(
        "  Neurons: {} in {} populations",
        config.n_neurons(),
        config.populations.lengths.len()
    );
    info!(
        "  Dimensions: {} in, {} out",
        config.system.n_input_dimensions, config.system.n_output_dimensions
    );
    info!(
        "  Timestep: {} us ({})",
        config.system.machine_timestep_us,
        if config.system.real_time {
            "real time"
        } else {
            "as fast as possible"
        }
    );
    info!("  PES rules: {}", config.pes_rules.len());
}

fn main() -> Result<()> {
    // Per-crate debug flags are not clap arguments
    let (debug_args, args): (Vec<String>, Vec<String>) =
        env::args().partition(|arg| arg.starts_with("--debug-"));
    let matches = Args::command()
        .after_help(debug_flags_help())
        .get_matches_from(args);
    let args = Args::from_arg_matches(&matches)?;

    let mut debug_flags = CrateDebugFlags::from_args(debug_args);
    if let Ok(value) = env::var("ENSEMBLE_DEBUG") {
        debug_flags.merge_env_value(&value);
    }

    let config = load_config(args.config.as_deref(), Some(&args.overrides()))
        .context("Failed to load ensemble configuration")?;

    let _logging = init_logging(
        &debug_flags,
        &config.logging.level,
        config.logging.log_dir.clone(),
    )?;
    print_banner(&config);

    let (command_tx, command_rx) = unbounded();
    let (_input_tx, input_rx) = packet_channel();
    let (output_tx, output_rx) = packet_channel();
    let sink = ChannelOutputSink::new(output_tx, config.transmission.keys.clone());
    let output_logger = thread::spawn(move || {
        let mut transmitted = 0u64;
        for packet in output_rx.iter() {
            debug!(
                "[OUTPUT] key=0x{:08x} value={}",
                packet.key,
                packet.value::<f32>()
            );
            transmitted += 1;
        }
        transmitted
    });

    let mut scheduler = TickScheduler::<S1615>::new(command_rx, input_rx, Box::new(sink));
    scheduler
        .initialise(&config)
        .context("Ensemble failed to start")?;

    match args.ticks {
        Some(ticks) => {
            command_tx.send(HostCommand::Run(RunLength::Ticks(ticks)))?;
            command_tx.send(HostCommand::Exit)?;
        }
        None => {
            command_tx.send(HostCommand::Run(RunLength::Forever))?;
            spawn_stdin_host(command_tx.clone());
        }
    }
    drop(command_tx);

    scheduler.run()?;

    let recorded = scheduler
        .context()
        .map(|ctx| ctx.recorder.ticks_recorded())
        .unwrap_or(0);
    let (state, overruns) = (scheduler.state(), scheduler.overruns());
    // Dropping the scheduler closes the output channel
    drop(scheduler);
    let transmitted = output_logger.join().unwrap_or(0);

    info!(
        "Finished in state {}: {} output packets, {} recorded ticks, {} overruns",
        state, transmitted, recorded, overruns
    );
    Ok(())
}
