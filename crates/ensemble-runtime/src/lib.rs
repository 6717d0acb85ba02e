// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Ensemble Runtime
//!
//! Drives one ensemble processing element:
//! - **Scheduler**: `Init → Idle → Running → Idle` state machine woken by host
//!   commands, with a fixed-period tick loop
//! - **Filters**: low-pass input pipelines fed by routed packets
//! - **Recording** and **transmission** of each tick's results
//!
//! All state lives in a [`SimulationContext`] built once at initialisation.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod context;
pub mod error;
pub mod filters;
pub mod packets;
pub mod recording;
pub mod scheduler;
pub mod state;
pub mod transmit;

pub use context::SimulationContext;
pub use error::{Result, SchedulerError};
pub use filters::{
    lowpass_coefficients, FilterCollection, FilterRoute, InputFilters, LowPassFilter,
};
pub use packets::{packet_channel, Packet, PacketReceiver, PacketSender};
pub use recording::SpikeRecorder;
pub use scheduler::{TickObserver, TickReport, TickScheduler};
pub use state::{HostCommand, RunLength, SchedulerState, TimerMode};
pub use transmit::{
    ChannelOutputSink, CollectingSink, DelayedTransmitter, NullSink, OutputSink, SharedOutputs,
};
