// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Multicast packets and the channel that delivers them
//!
//! Packets can be sent from any thread. The scheduler drains them between
//! ticks and never blocks on the receiving side.

use crossbeam::channel::{self, Receiver, Sender};
use ensemble_neural::NeuralValue;

/// Routing key plus one S16.15 payload word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet {
    pub key: u32,
    pub payload: u32,
}

impl Packet {
    pub fn new(key: u32, payload: u32) -> Self {
        Self { key, payload }
    }

    /// Packet carrying `value` encoded as S16.15
    pub fn with_value<V: NeuralValue>(key: u32, value: V) -> Self {
        Self {
            key,
            payload: value.to_s1615_bits() as u32,
        }
    }

    pub fn value<V: NeuralValue>(&self) -> V {
        V::from_s1615_bits(self.payload as i32)
    }
}

/// Sending half of a packet channel
#[derive(Debug, Clone)]
pub struct PacketSender {
    tx: Sender<Packet>,
}

impl PacketSender {
    /// Returns `false` once the receiving side has been dropped
    pub fn send(&self, packet: Packet) -> bool {
        self.tx.send(packet).is_ok()
    }
}

/// Receiving half, owned by the scheduler
#[derive(Debug)]
pub struct PacketReceiver {
    rx: Receiver<Packet>,
}

impl PacketReceiver {
    /// Hand every queued packet to `handle` without blocking
    pub fn drain(&self, mut handle: impl FnMut(Packet)) -> usize {
        let mut received = 0;
        for packet in self.rx.try_iter() {
            handle(packet);
            received += 1;
        }
        received
    }

    /// Blocking iterator that ends once every sender is gone
    pub fn iter(&self) -> impl Iterator<Item = Packet> + '_ {
        self.rx.iter()
    }

    /// Drop every queued packet
    pub fn flush(&self) -> usize {
        self.drain(|_| {})
    }
}

/// Unbounded packet channel
pub fn packet_channel() -> (PacketSender, PacketReceiver) {
    let (tx, rx) = channel::unbounded();
    (PacketSender { tx }, PacketReceiver { rx })
}
