// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Per-run spike recording
//!
//! Each recorded tick stores a copy of the spike vector words. The buffer is
//! sized once when the host starts a run: the run's tick count for bounded
//! runs, a fixed number of ticks for unbounded ones. Ticks beyond that are
//! dropped and counted, so recording never allocates inside a tick.

use ensemble_neural::SpikeVector;
use tracing::{debug, warn};

use crate::state::RunLength;

#[derive(Debug, Clone, Default)]
pub struct SpikeRecorder {
    enabled: bool,
    words_per_tick: usize,
    unbounded_run_ticks: u32,
    /// Ticks the buffer holds for the current run
    capacity_ticks: usize,
    buffer: Vec<u32>,
    dropped_ticks: u64,
}

impl SpikeRecorder {
    pub fn new(enabled: bool, words_per_tick: usize, unbounded_run_ticks: u32) -> Self {
        Self {
            enabled,
            words_per_tick,
            unbounded_run_ticks,
            capacity_ticks: 0,
            buffer: Vec::new(),
            dropped_ticks: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Clear the buffer and reserve space for the run about to start
    pub fn reset(&mut self, run_length: RunLength) {
        self.buffer.clear();
        self.dropped_ticks = 0;
        self.capacity_ticks = 0;
        if !self.enabled {
            return;
        }

        let ticks = match run_length {
            RunLength::Ticks(n) => n,
            RunLength::Forever => self.unbounded_run_ticks,
        } as usize;
        let words = ticks.saturating_mul(self.words_per_tick);
        match self.buffer.try_reserve_exact(words) {
            Ok(()) => self.capacity_ticks = ticks,
            Err(_) => warn!(
                "[RECORDING] Could not reserve {} words for {} ticks; spikes of this run are not recorded",
                words, ticks
            ),
        }
        debug!(
            "[RECORDING] Buffer reset for {:?}: {} ticks reserved",
            run_length, self.capacity_ticks
        );
    }

    /// Append one tick; a tick past the reserved capacity is counted and dropped
    pub fn record(&mut self, spikes: &SpikeVector) {
        if !self.enabled {
            return;
        }
        if self.ticks_recorded() >= self.capacity_ticks {
            if self.dropped_ticks == 0 {
                warn!(
                    "[RECORDING] Spike buffer full after {} ticks, dropping further ticks of this run",
                    self.capacity_ticks
                );
            }
            self.dropped_ticks += 1;
            return;
        }
        debug_assert_eq!(spikes.len_words(), self.words_per_tick);
        self.buffer.extend_from_slice(spikes.words());
    }

    pub fn ticks_recorded(&self) -> usize {
        if self.words_per_tick == 0 {
            return 0;
        }
        self.buffer.len() / self.words_per_tick
    }

    /// Ticks the buffer can hold in the current run
    pub fn capacity_ticks(&self) -> usize {
        self.capacity_ticks
    }

    /// Spike words recorded for tick `index` of the current run
    pub fn tick(&self, index: usize) -> Option<&[u32]> {
        let start = index.checked_mul(self.words_per_tick)?;
        let end = start.checked_add(self.words_per_tick)?;
        self.buffer.get(start..end)
    }

    pub fn words(&self) -> &[u32] {
        &self.buffer
    }

    pub fn dropped_ticks(&self) -> u64 {
        self.dropped_ticks
    }
}
