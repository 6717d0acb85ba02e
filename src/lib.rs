// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Ensemble - spiking ensemble processing element with online decoder learning
//!
//! An ensemble of leaky integrate-and-fire neurons represents a vector; a
//! decoder matrix turns its spikes back into an output vector, and the PES
//! rule adjusts that decoder online from an error signal. This crate
//! re-exports the workspace members and ships the `ensemble-node` binary.
//!
//! ## Crates
//! - **`neural`**: S16.15 values, population layout, spike vectors, decoders, LIF model
//! - **`plasticity`**: PES rule tables and the encoder-learning seam
//! - **`config`**: `ensemble_configuration.toml` loading, validation and region words
//! - **`runtime`**: tick scheduler, input filters, recording and transmission
//! - **`observability`**: logging initialisation and per-crate debug flags
//!
//! ## Feature Flags
//! - **`file-logging`** (default): daily-rolling log files per run
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ensemble::prelude::*;
//! use crossbeam::channel::unbounded;
//!
//! let config = load_config(None, None)?;
//! let (commands, command_rx) = unbounded();
//! let (_packets, packet_rx) = packet_channel();
//!
//! let mut scheduler = TickScheduler::<S1615>::new(command_rx, packet_rx, Box::new(NullSink));
//! scheduler.initialise(&config)?;
//!
//! commands.send(HostCommand::Run(RunLength::Ticks(1000)))?;
//! commands.send(HostCommand::Exit)?;
//! scheduler.run()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use ensemble_config as config;
pub use ensemble_neural as neural;
pub use ensemble_observability as observability;
pub use ensemble_plasticity as plasticity;
pub use ensemble_runtime as runtime;

/// Commonly used items
pub mod prelude {
    pub use crate::config::{load_config, EnsembleConfig};
    pub use crate::neural::{DecoderMatrix, NeuralValue, PopulationLayout, SpikeVector, S1615};
    pub use crate::plasticity::{ActivitySource, PesRule, PesRuleSet};
    pub use crate::runtime::{
        packet_channel, HostCommand, NullSink, OutputSink, Packet, RunLength, SchedulerState,
        SimulationContext, TickScheduler,
    };
}
