// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Output hand-off to downstream collaborators

use std::sync::Arc;

use ensemble_neural::NeuralValue;
use parking_lot::Mutex;

use crate::packets::{Packet, PacketSender};

/// Receives the decoded output vector
///
/// Called from inside the tick handler, so implementations must not block.
pub trait OutputSink<V: NeuralValue>: Send {
    fn transmit(&mut self, tick: u64, output: &[V]);
}

/// Fires every `delay` ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayedTransmitter {
    delay: u32,
    countdown: u32,
}

impl DelayedTransmitter {
    /// A delay of zero is treated as one
    pub fn new(delay: u32) -> Self {
        let delay = delay.max(1);
        Self {
            delay,
            countdown: delay,
        }
    }

    pub fn delay(&self) -> u32 {
        self.delay
    }

    /// Advance one tick; returns `true` on transmission ticks
    pub fn tick(&mut self) -> bool {
        self.countdown -= 1;
        if self.countdown == 0 {
            self.countdown = self.delay;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.countdown = self.delay;
    }
}

/// Sends one packet per output dimension
#[derive(Debug, Clone)]
pub struct ChannelOutputSink {
    sender: PacketSender,
    keys: Vec<u32>,
}

impl ChannelOutputSink {
    /// Dimension `d` is sent with `keys[d]`, or with key `d` when `keys` is empty
    pub fn new(sender: PacketSender, keys: Vec<u32>) -> Self {
        Self { sender, keys }
    }

    fn key(&self, dimension: usize) -> u32 {
        self.keys
            .get(dimension)
            .copied()
            .unwrap_or(dimension as u32)
    }
}

impl<V: NeuralValue> OutputSink<V> for ChannelOutputSink {
    fn transmit(&mut self, _tick: u64, output: &[V]) {
        for (dimension, &value) in output.iter().enumerate() {
            // A closed channel only means nobody is listening any more
            let _ = self.sender.send(Packet::with_value(self.key(dimension), value));
        }
    }
}

/// Transmitted outputs as `(tick, vector)` pairs
pub type SharedOutputs<V> = Arc<Mutex<Vec<(u64, Vec<V>)>>>;

/// Keeps every transmitted vector in shared memory
#[derive(Debug, Clone)]
pub struct CollectingSink<V: NeuralValue> {
    outputs: SharedOutputs<V>,
}

impl<V: NeuralValue> Default for CollectingSink<V> {
    fn default() -> Self {
        Self {
            outputs: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<V: NeuralValue> CollectingSink<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for reading outputs from another thread
    pub fn outputs(&self) -> SharedOutputs<V> {
        Arc::clone(&self.outputs)
    }
}

impl<V: NeuralValue> OutputSink<V> for CollectingSink<V> {
    fn transmit(&mut self, tick: u64, output: &[V]) {
        self.outputs.lock().push((tick, output.to_vec()));
    }
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl<V: NeuralValue> OutputSink<V> for NullSink {
    fn transmit(&mut self, _tick: u64, _output: &[V]) {}
}
