// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Tick scheduler
//!
//! A single-threaded event loop. While `Idle` it blocks on the host command
//! channel; while `Running` it executes one tick handler per timer period.
//! Packets arrive on their own channel from any thread and are drained into
//! the input filters at the start of every tick.
//!
//! Per-tick handler order:
//! 1. Step input filters (feedforward, inhibitory, modulatory, learnt-encoder)
//! 2. PES decoder learning
//! 3. Encoder learning
//! 4. Neuron update and spike generation, output decoding
//! 5. Spike recording
//! 6. Output transmission

use std::thread;
use std::time::Instant;

use crossbeam::channel::{Receiver, TryRecvError};
use ensemble_config::EnsembleConfig;
use ensemble_neural::NeuralValue;
use tracing::{debug, error, info, trace, warn};

use crate::context::SimulationContext;
use crate::error::{Result, SchedulerError};
use crate::packets::PacketReceiver;
use crate::state::{HostCommand, RunLength, SchedulerState};
use crate::transmit::OutputSink;

/// Summary of one executed tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Tick index within the current run, starting at 0
    pub tick: u64,
    pub spike_count: u32,
    /// The handler finished after the tick's deadline
    pub overrun: bool,
}

/// Hook called after every tick
pub trait TickObserver: Send {
    fn on_tick(&mut self, report: &TickReport);
}

impl<F> TickObserver for F
where
    F: FnMut(&TickReport) + Send,
{
    fn on_tick(&mut self, report: &TickReport) {
        self(report)
    }
}

pub struct TickScheduler<V: NeuralValue> {
    state: SchedulerState,
    context: Option<SimulationContext<V>>,
    commands: Receiver<HostCommand>,
    packets: PacketReceiver,
    sink: Box<dyn OutputSink<V>>,
    observers: Vec<Box<dyn TickObserver>>,
    current_tick: u64,
    ticks_remaining: Option<u32>,
    overruns: u64,
    packets_received: u64,
}

impl<V: NeuralValue> TickScheduler<V> {
    pub fn new(
        commands: Receiver<HostCommand>,
        packets: PacketReceiver,
        sink: Box<dyn OutputSink<V>>,
    ) -> Self {
        Self {
            state: SchedulerState::Init,
            context: None,
            commands,
            packets,
            sink,
            observers: Vec::new(),
            current_tick: 0,
            ticks_remaining: None,
            overruns: 0,
            packets_received: 0,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn context(&self) -> Option<&SimulationContext<V>> {
        self.context.as_ref()
    }

    pub fn context_mut(&mut self) -> Option<&mut SimulationContext<V>> {
        self.context.as_mut()
    }

    /// Index of the next tick within the current run
    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    /// Ticks left in a bounded run; `None` for unbounded runs
    pub fn ticks_remaining(&self) -> Option<u32> {
        self.ticks_remaining
    }

    /// Ticks that finished after their deadline, across all runs
    pub fn overruns(&self) -> u64 {
        self.overruns
    }

    pub fn packets_received(&self) -> u64 {
        self.packets_received
    }

    pub fn add_observer(&mut self, observer: Box<dyn TickObserver>) {
        self.observers.push(observer);
    }

    fn expect_state(&self, expected: SchedulerState) -> Result<()> {
        if self.state != expected {
            return Err(SchedulerError::InvalidState {
                expected,
                actual: self.state,
            });
        }
        Ok(())
    }

    /// One-time startup from a configuration
    pub fn initialise(&mut self, config: &EnsembleConfig) -> Result<()> {
        self.initialise_with(|| SimulationContext::from_config(config))
    }

    /// One-time startup from a context builder
    ///
    /// Any failure is terminal: the scheduler moves to `Halted` and the
    /// error is returned.
    pub fn initialise_with<F>(&mut self, build: F) -> Result<()>
    where
        F: FnOnce() -> Result<SimulationContext<V>>,
    {
        self.expect_state(SchedulerState::Init)?;
        info!("[TICK-LOOP] Initialising ensemble");

        match build() {
            Ok(context) => {
                self.context = Some(context);
                self.state = SchedulerState::Idle;
                info!("[TICK-LOOP] Initialisation complete, waiting for host");
                Ok(())
            }
            Err(e) => {
                error!("[TICK-LOOP] ❌ Failed to start: {}", e);
                self.state = SchedulerState::Halted;
                Err(e)
            }
        }
    }

    /// Start a run: reset per-run buffers and enter `Running`
    pub fn begin_run(&mut self, length: RunLength) -> Result<()> {
        self.expect_state(SchedulerState::Idle)?;
        let Some(ctx) = self.context.as_mut() else {
            return Err(SchedulerError::InvalidState {
                expected: SchedulerState::Idle,
                actual: SchedulerState::Init,
            });
        };

        ctx.recorder.reset(length);
        ctx.transmitter.reset();
        self.current_tick = 0;
        self.ticks_remaining = match length {
            RunLength::Ticks(n) => Some(n),
            RunLength::Forever => None,
        };

        if self.ticks_remaining == Some(0) {
            info!("[TICK-LOOP] Zero-length run requested");
            return Ok(());
        }
        self.state = SchedulerState::Running;
        match length {
            RunLength::Ticks(n) => info!("[TICK-LOOP] >>>>> Running for {} ticks", n),
            RunLength::Forever => info!("[TICK-LOOP] >>>>> Running until stopped"),
        }
        Ok(())
    }

    /// Leave `Running`, dropping packets left over from the run
    pub fn end_run(&mut self) {
        if self.state != SchedulerState::Running {
            return;
        }
        let flushed = self.packets.flush();
        self.state = SchedulerState::Idle;
        info!(
            "[TICK-LOOP] Run complete after {} ticks ({} overruns so far)",
            self.current_tick, self.overruns
        );
        if flushed > 0 {
            debug!("[TICK-LOOP] Flushed {} packets received after the last tick", flushed);
        }
        let unrouted = self
            .context
            .as_ref()
            .map_or(0, |ctx| ctx.filters.unrouted_packets());
        if unrouted > 0 {
            warn!(
                "[TICK-LOOP] {} packets matched no filter route since startup",
                unrouted
            );
        }
    }

    /// Execute one tick handler outside the timer loop
    pub fn tick(&mut self) -> Result<TickReport> {
        self.expect_state(SchedulerState::Running)?;
        let report = self.handle_tick()?;
        self.finish_tick(&report);
        Ok(report)
    }

    fn handle_tick(&mut self) -> Result<TickReport> {
        let Some(ctx) = self.context.as_mut() else {
            return Err(SchedulerError::InvalidState {
                expected: SchedulerState::Running,
                actual: self.state,
            });
        };

        let received = self.packets.drain(|packet| ctx.filters.receive(packet));
        self.packets_received += received as u64;

        // (1) Input filters
        ctx.filters.step();

        // (2) PES against this tick's error signals and last tick's spikes
        ctx.rules.apply(
            &ctx.spikes,
            &mut ctx.decoder,
            &ctx.filters.modulatory,
            &ctx.layout,
        );

        // (3) Encoder learning
        ctx.encoder_learning.apply(
            &ctx.spikes,
            &ctx.layout,
            &ctx.filters.modulatory,
            &ctx.filters.learnt_encoder,
        );

        // (4) Inference
        ctx.filters.input.sum_outputs_into(&mut ctx.input);
        let inhibition = ctx.filters.inhibition();
        let spike_count = ctx
            .neurons
            .step(&ctx.input, inhibition, &ctx.layout, &mut ctx.spikes);
        ctx.decoder
            .decode_into(&ctx.spikes, &ctx.layout, &mut ctx.output);

        // (5) Recording
        ctx.recorder.record(&ctx.spikes);

        // (6) Transmission
        if ctx.transmitter.tick() {
            self.sink.transmit(self.current_tick, &ctx.output);
        }

        trace!(
            "[TICK-LOOP] Tick {}: {} packets, {} spikes",
            self.current_tick,
            received,
            spike_count
        );

        Ok(TickReport {
            tick: self.current_tick,
            spike_count,
            overrun: false,
        })
    }

    fn finish_tick(&mut self, report: &TickReport) {
        for observer in &mut self.observers {
            observer.on_tick(report);
        }

        self.current_tick += 1;
        if let Some(remaining) = self.ticks_remaining.as_mut() {
            *remaining = remaining.saturating_sub(1);
            if *remaining == 0 {
                self.end_run();
            }
        }
    }

    /// Timer loop for one run
    ///
    /// Returns `false` when the host asked to exit during the run.
    fn run_ticks(&mut self) -> Result<bool> {
        let period = self.context.as_ref().and_then(|ctx| ctx.timer.period());
        let mut deadline = Instant::now();

        while self.state == SchedulerState::Running {
            let mut report = self.handle_tick()?;

            if let Some(period) = period {
                deadline += period;
                let now = Instant::now();
                if now > deadline {
                    let overshoot = now.duration_since(deadline);
                    warn!(
                        "[TICK-LOOP] ⚠️ Tick overrun: {:.3}ms past deadline (tick {})",
                        overshoot.as_secs_f64() * 1000.0,
                        report.tick
                    );
                    report.overrun = true;
                    self.overruns += 1;
                    // Pace the following ticks from now rather than catching up
                    deadline = now;
                } else {
                    thread::sleep(deadline - now);
                }
            }

            self.finish_tick(&report);

            match self.commands.try_recv() {
                Ok(HostCommand::Stop) => {
                    info!("[TICK-LOOP] Stop requested by host");
                    self.end_run();
                }
                Ok(HostCommand::Exit) => {
                    info!("[TICK-LOOP] Exit requested by host");
                    self.end_run();
                    return Ok(false);
                }
                Ok(HostCommand::Run(length)) => {
                    warn!("[TICK-LOOP] Ignoring {:?}: a run is already in progress", length);
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => {
                    warn!("[TICK-LOOP] Host disconnected during run");
                    self.end_run();
                    return Err(SchedulerError::HostDisconnected);
                }
            }
        }
        Ok(true)
    }

    /// Wait for one host command and act on it
    ///
    /// Returns `false` once the host has asked the scheduler to exit.
    pub fn run_once(&mut self) -> Result<bool> {
        self.expect_state(SchedulerState::Idle)?;

        let command = self
            .commands
            .recv()
            .map_err(|_| SchedulerError::HostDisconnected)?;
        match command {
            HostCommand::Run(length) => {
                self.begin_run(length)?;
                self.run_ticks()
            }
            HostCommand::Stop => {
                debug!("[TICK-LOOP] Stop received while idle");
                Ok(true)
            }
            HostCommand::Exit => Ok(false),
        }
    }

    /// Serve host commands until `Exit`
    pub fn run(&mut self) -> Result<()> {
        while self.run_once()? {}
        info!("[TICK-LOOP] Scheduler exiting");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packets::packet_channel;
    use crate::state::TimerMode;
    use crate::transmit::NullSink;
    use crossbeam::channel::unbounded;

    fn scheduler() -> (
        TickScheduler<f32>,
        crossbeam::channel::Sender<HostCommand>,
    ) {
        let (cmd_tx, cmd_rx) = unbounded();
        let (_packet_tx, packet_rx) = packet_channel();
        (
            TickScheduler::new(cmd_rx, packet_rx, Box::new(NullSink)),
            cmd_tx,
        )
    }

    fn initialised() -> (
        TickScheduler<f32>,
        crossbeam::channel::Sender<HostCommand>,
    ) {
        let (mut sched, tx) = scheduler();
        let mut config = EnsembleConfig::default();
        config.system.real_time = false;
        sched.initialise(&config).unwrap();
        (sched, tx)
    }

    #[test]
    fn test_initialise_moves_to_idle() {
        let (sched, _tx) = initialised();
        assert_eq!(sched.state(), SchedulerState::Idle);
        assert_eq!(
            sched.context().map(|c| c.timer),
            Some(TimerMode::AsFastAsPossible)
        );
    }

    #[test]
    fn test_initialise_twice_is_rejected() {
        let (mut sched, _tx) = initialised();
        let err = sched.initialise(&EnsembleConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            SchedulerError::InvalidState {
                expected: SchedulerState::Init,
                actual: SchedulerState::Idle
            }
        ));
    }

    #[test]
    fn test_tick_requires_running() {
        let (mut sched, _tx) = initialised();
        assert!(sched.tick().is_err());
    }

    #[test]
    fn test_manual_ticks_count_down() {
        let (mut sched, _tx) = initialised();
        sched.begin_run(RunLength::Ticks(2)).unwrap();
        assert_eq!(sched.ticks_remaining(), Some(2));

        assert_eq!(sched.tick().unwrap().tick, 0);
        assert_eq!(sched.ticks_remaining(), Some(1));
        assert_eq!(sched.state(), SchedulerState::Running);

        assert_eq!(sched.tick().unwrap().tick, 1);
        assert_eq!(sched.state(), SchedulerState::Idle);
    }

    #[test]
    fn test_zero_tick_run_stays_idle() {
        let (mut sched, _tx) = initialised();
        sched.begin_run(RunLength::Ticks(0)).unwrap();
        assert_eq!(sched.state(), SchedulerState::Idle);
    }

    #[test]
    fn test_stop_while_idle_is_ignored() {
        let (mut sched, tx) = initialised();
        tx.send(HostCommand::Stop).unwrap();
        tx.send(HostCommand::Exit).unwrap();
        assert!(sched.run_once().unwrap());
        assert!(!sched.run_once().unwrap());
    }

    #[test]
    fn test_rule_outside_decoder_halts_at_initialise() {
        let (mut sched, _tx) = scheduler();
        let mut config = EnsembleConfig::default();
        config.modulatory_filters = vec![ensemble_config::FilterConfig {
            dimensions: 2,
            ..Default::default()
        }];
        // Two error dimensions from row 0 need two decoder rows; there is one
        config.pes_rules = vec![ensemble_config::PesRuleConfig {
            learning_rate: 0.1,
            error_signal_index: 0,
            decoder_row: 0,
            activity_filter_index: -1,
        }];

        let err = sched.initialise(&config).unwrap_err();
        assert!(matches!(err, SchedulerError::Config(_)));
        assert_eq!(sched.state(), SchedulerState::Halted);
        assert!(sched.context().is_none());
        assert!(sched.begin_run(RunLength::Ticks(1)).is_err());
    }

    #[test]
    fn test_unknown_error_signal_halts_at_initialise() {
        let (mut sched, _tx) = scheduler();
        let mut config = EnsembleConfig::default();
        config.pes_rules = vec![ensemble_config::PesRuleConfig {
            learning_rate: 0.1,
            error_signal_index: 3,
            decoder_row: 0,
            activity_filter_index: -1,
        }];

        assert!(matches!(
            sched.initialise(&config),
            Err(SchedulerError::Config(_))
        ));
        assert_eq!(sched.state(), SchedulerState::Halted);
    }

    #[test]
    fn test_host_disconnect_is_reported() {
        let (mut sched, tx) = initialised();
        drop(tx);
        assert!(matches!(sched.run(), Err(SchedulerError::HostDisconnected)));
    }
}
