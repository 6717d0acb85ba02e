// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for the tick scheduler

use ensemble_config::ConfigError;
use ensemble_neural::EnsembleError;
use thiserror::Error;

use crate::state::SchedulerState;

#[derive(Error, Debug)]
pub enum SchedulerError {
    /// Fatal startup failure; the scheduler is halted
    #[error("Initialisation failed: {0}")]
    Initialisation(#[from] EnsembleError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid scheduler state: expected {expected}, found {actual}")]
    InvalidState {
        expected: SchedulerState,
        actual: SchedulerState,
    },

    #[error("Host command channel disconnected")]
    HostDisconnected,
}

impl From<ConfigError> for SchedulerError {
    fn from(err: ConfigError) -> Self {
        SchedulerError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
