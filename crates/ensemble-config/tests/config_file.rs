// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Loads the shipped `ensemble_configuration.toml` and checks the regions built from it

use std::collections::HashMap;
use std::fs;

use ensemble_config::{
    load_config, pes_region_words, pes_rule_set, population_layout, validate_config,
    EnsembleConfig, FilterKind, CONFIG_FILE_NAME,
};
use ensemble_neural::{LifParameters, S1615};
use ensemble_plasticity::{ActivitySource, PesRuleSet};
use tempfile::tempdir;

const SHIPPED_CONFIG: &str = include_str!("../../../ensemble_configuration.toml");

fn shipped() -> EnsembleConfig {
    toml::from_str(SHIPPED_CONFIG).unwrap()
}

#[test]
fn test_shipped_config_is_valid() {
    let config = shipped();
    validate_config(&config).unwrap();

    assert_eq!(config.n_neurons(), 64);
    assert_eq!(config.input_filters_of(FilterKind::Input).count(), 1);
    assert_eq!(config.input_filters_of(FilterKind::Inhibitory).count(), 1);
    assert_eq!(config.input_filters_of(FilterKind::LearntEncoder).count(), 0);
    assert_eq!(config.transmission.keys, vec![0x400]);
}

#[test]
fn test_shipped_config_regions() {
    let config = shipped();

    let layout = population_layout(&config).unwrap();
    assert_eq!(layout.n_words(), 2);

    assert_eq!(layout.n_neurons(), 64);
    assert_eq!(layout.n_populations(), 2);

    let params = LifParameters::<f32>::from_time_constants(
        config.dt(),
        config.system.tau_ref,
        config.system.tau_rc,
    );
    assert_eq!(params.t_ref_ticks, 2);
    assert!(!config.recording.record_spikes);

    let words = pes_region_words(&config).unwrap();
    assert_eq!(words[0], 1);
    assert_eq!(words[4] as i32, -1);
    let rules = PesRuleSet::<S1615>::load(&words).unwrap();
    assert_eq!(rules.rules()[0].activity, ActivitySource::Unfiltered);
    assert_eq!(rules, pes_rule_set::<S1615>(&config).unwrap());
}

#[test]
fn test_shipped_config_with_cli_overrides() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    fs::write(&path, SHIPPED_CONFIG).unwrap();

    let mut cli = HashMap::new();
    cli.insert("real_time".to_string(), "false".to_string());
    cli.insert("transmission_delay".to_string(), "8".to_string());
    cli.insert("log_dir".to_string(), "/tmp/ensemble-logs".to_string());

    let config = load_config(Some(&path), Some(&cli)).unwrap();
    assert!(!config.system.real_time);
    assert_eq!(config.transmission.delay, 8);
    assert_eq!(
        config.logging.log_dir.as_deref(),
        Some(std::path::Path::new("/tmp/ensemble-logs"))
    );
}

#[test]
fn test_overlapping_rules_fail_to_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    let document = format!(
        "{}\n[[pes_rules]]\nlearning_rate = 0.1\nerror_signal_index = 0\ndecoder_row = 0\n",
        SHIPPED_CONFIG
    );
    fs::write(&path, document).unwrap();

    let err = load_config(Some(&path), None).unwrap_err();
    assert!(err.to_string().contains("overlapping decoder rows"));
}
