// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Scheduler state machine and host commands
//!
//! ```text
//! Init ──initialise──▶ Idle ──Run(n)──▶ Running ──budget spent / Stop──▶ Idle
//!   │                                                                     │
//!   └──failure──▶ Halted                                    Exit ◀────────┘
//! ```

use std::fmt;
use std::time::Duration;

/// Scheduler lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SchedulerState {
    Init = 0,
    Idle = 1,
    Running = 2,
    Halted = 3,
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SchedulerState::Init => "Init",
            SchedulerState::Idle => "Idle",
            SchedulerState::Running => "Running",
            SchedulerState::Halted => "Halted",
        };
        f.write_str(name)
    }
}

/// How long a run lasts once the host wakes the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunLength {
    Ticks(u32),
    /// Until the host sends `Stop`
    Forever,
}

/// Commands from the host controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCommand {
    Run(RunLength),
    /// Ends an unbounded run at the next tick boundary
    Stop,
    /// Leave the scheduler loop
    Exit,
}

/// Tick pacing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMode {
    /// One tick per `period` of wall-clock time
    RealTime { period: Duration },
    /// Ticks back-to-back with no sleeping
    AsFastAsPossible,
}

impl TimerMode {
    pub fn from_timestep_us(machine_timestep_us: u32, real_time: bool) -> Self {
        if real_time {
            TimerMode::RealTime {
                period: Duration::from_micros(u64::from(machine_timestep_us)),
            }
        } else {
            TimerMode::AsFastAsPossible
        }
    }

    pub fn period(&self) -> Option<Duration> {
        match self {
            TimerMode::RealTime { period } => Some(*period),
            TimerMode::AsFastAsPossible => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_mode_from_timestep() {
        assert_eq!(
            TimerMode::from_timestep_us(1000, true).period(),
            Some(Duration::from_millis(1))
        );
        assert_eq!(
            TimerMode::from_timestep_us(1000, false),
            TimerMode::AsFastAsPossible
        );
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SchedulerState::Halted.to_string(), "Halted");
    }
}
