// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Integration tests for PES decoder learning
//!
//! These tests drive `PesRuleSet::apply` against hand-built spike vectors and
//! check the decoder matrix entry by entry.

use ensemble_neural::{DecoderMatrix, NeuralValue, PopulationLayout, SpikeVector, S1615};
use ensemble_plasticity::{ActivitySource, PesRule, PesRuleSet};
use proptest::prelude::*;

fn spikes_at(layout: &PopulationLayout, neurons: &[u32]) -> SpikeVector {
    let mut spikes = SpikeVector::for_layout(layout).unwrap();
    for &n in neurons {
        assert!(spikes.set(layout, n));
    }
    spikes
}

#[test]
fn test_two_population_scenario() {
    let layout = PopulationLayout::new(vec![32, 16]).unwrap();
    let mut decoder = DecoderMatrix::<f32>::new(2, 48).unwrap();
    let rules = PesRuleSet::from_rules(vec![PesRule::unfiltered(0.1, 0, 0)]);
    let modulatory = vec![vec![1.0f32, -2.0]];
    let spikes = spikes_at(&layout, &[0, 31, 32]);

    rules.apply(&spikes, &mut decoder, &modulatory, &layout);

    for column in 0..48 {
        let (row0, row1) = (decoder.get(0, column), decoder.get(1, column));
        if [0, 31, 32].contains(&column) {
            assert!((row0 - (-0.1)).abs() < 1e-6, "row 0 column {column}: {row0}");
            assert!((row1 - 0.2).abs() < 1e-6, "row 1 column {column}: {row1}");
        } else {
            assert_eq!((row0, row1), (0.0, 0.0), "column {column} must be untouched");
        }
    }
}

#[test]
fn test_two_population_scenario_fixed_point() {
    let s = <S1615 as NeuralValue>::from_f32;
    let layout = PopulationLayout::new(vec![32, 16]).unwrap();
    let mut decoder = DecoderMatrix::<S1615>::new(2, 48).unwrap();
    let rules = PesRuleSet::from_rules(vec![PesRule::unfiltered(s(0.1), 0, 0)]);
    let modulatory = vec![vec![s(1.0), s(-2.0)]];
    let spikes = spikes_at(&layout, &[0, 31, 32]);

    rules.apply(&spikes, &mut decoder, &modulatory, &layout);

    assert!((decoder.get(0, 31).to_f32() + 0.1).abs() < 1e-3);
    assert!((decoder.get(1, 32).to_f32() - 0.2).abs() < 1e-3);
    assert_eq!(decoder.get(0, 30), S1615::ZERO);
    assert_eq!(decoder.get(1, 33), S1615::ZERO);
}

#[test]
fn test_zero_spikes_leave_decoder_unchanged() {
    let layout = PopulationLayout::new(vec![10, 50]).unwrap();
    let values: Vec<f32> = (0..120).map(|i| i as f32 * 0.25).collect();
    let mut decoder = DecoderMatrix::from_rows(2, 60, values).unwrap();
    let before = decoder.clone();
    let rules = PesRuleSet::from_rules(vec![PesRule::unfiltered(1.0, 0, 0)]);
    let spikes = SpikeVector::for_layout(&layout).unwrap();

    rules.apply(&spikes, &mut decoder, &vec![vec![3.0f32, 4.0]], &layout);

    assert_eq!(decoder, before);
}

#[test]
fn test_filtered_activity_rules_are_skipped() {
    let layout = PopulationLayout::single(8);
    let mut decoder = DecoderMatrix::<f32>::new(1, 8).unwrap();
    let rules = PesRuleSet::from_rules(vec![PesRule {
        learning_rate: 1.0,
        error_signal_index: 0,
        decoder_row: 0,
        activity: ActivitySource::FilteredBy(0),
    }]);
    let spikes = SpikeVector::from_words(vec![u32::MAX]);

    rules.apply(&spikes, &mut decoder, &vec![vec![1.0f32]], &layout);

    assert!(decoder.values().iter().all(|&v| v == 0.0));
}

#[test]
fn test_zero_length_population_does_not_shift_columns() {
    let layout = PopulationLayout::new(vec![0, 3, 0, 2]).unwrap();
    let mut decoder = DecoderMatrix::<f32>::new(1, 5).unwrap();
    let rules = PesRuleSet::from_rules(vec![PesRule::unfiltered(1.0, 0, 0)]);
    // Population 1 fires neuron 2; population 3 fires its first neuron (column 3)
    let spikes = SpikeVector::from_words(vec![0x2000_0000, 0x8000_0000]);

    rules.apply(&spikes, &mut decoder, &vec![vec![1.0f32]], &layout);

    assert_eq!(decoder.values(), &[0.0, 0.0, -1.0, -1.0, 0.0]);
}

#[test]
fn test_bits_beyond_partial_population_are_never_read() {
    let layout = PopulationLayout::new(vec![5, 4]).unwrap();
    let mut decoder = DecoderMatrix::<f32>::new(1, 9).unwrap();
    let rules = PesRuleSet::from_rules(vec![PesRule::unfiltered(1.0, 0, 0)]);
    // Only bit 4 of word 0 and bit 0 of word 1 are inside the populations
    let spikes = SpikeVector::from_words(vec![0x0FFF_FFFF, 0x87FF_FFFF]);

    rules.apply(&spikes, &mut decoder, &vec![vec![1.0f32]], &layout);

    assert_eq!(
        decoder.values(),
        &[0.0, 0.0, 0.0, 0.0, -1.0, -1.0, 0.0, 0.0, 0.0]
    );
}

#[test]
fn test_rule_only_touches_its_own_rows() {
    let layout = PopulationLayout::single(4);
    let mut decoder = DecoderMatrix::<f32>::new(4, 4).unwrap();
    let rules = PesRuleSet::from_rules(vec![PesRule::unfiltered(2.0, 1, 2)]);
    let modulatory = vec![vec![100.0f32], vec![1.0, 0.5]];
    let spikes = spikes_at(&layout, &[1]);

    rules.apply(&spikes, &mut decoder, &modulatory, &layout);

    assert_eq!(decoder.row(0), &[0.0; 4]);
    assert_eq!(decoder.row(1), &[0.0; 4]);
    assert_eq!(decoder.row(2), &[0.0, -2.0, 0.0, 0.0]);
    assert_eq!(decoder.row(3), &[0.0, -1.0, 0.0, 0.0]);
}

#[test]
fn test_fixed_point_updates_saturate() {
    let layout = PopulationLayout::single(1);
    let mut decoder =
        DecoderMatrix::<S1615>::from_rows(1, 1, vec![S1615::MIN]).unwrap();
    let rules = PesRuleSet::from_rules(vec![PesRule::unfiltered(S1615::ONE, 0, 0)]);
    let spikes = spikes_at(&layout, &[0]);

    rules.apply(&spikes, &mut decoder, &vec![vec![S1615::MAX]], &layout);

    assert_eq!(decoder.get(0, 0), S1615::MIN);
}

fn layout_and_spikes() -> impl Strategy<Value = (PopulationLayout, SpikeVector)> {
    prop::collection::vec(0u32..48, 1..5).prop_flat_map(|lengths| {
        let layout = PopulationLayout::new(lengths).unwrap();
        let n_words = layout.n_words();
        (
            Just(layout),
            prop::collection::vec(any::<u32>(), n_words).prop_map(SpikeVector::from_words),
        )
    })
}

proptest! {
    #[test]
    fn update_law_holds_entry_by_entry(
        (layout, spikes) in layout_and_spikes(),
        rate in -1.0f32..1.0,
        error in prop::collection::vec(-4.0f32..4.0, 1..4),
    ) {
        let n = layout.n_neurons() as usize;
        let rows = error.len() + 1;
        let values: Vec<f32> = (0..rows * n).map(|i| (i % 7) as f32 - 3.0).collect();
        let before = DecoderMatrix::from_rows(rows, n, values).unwrap();
        let mut after = before.clone();
        let rules = PesRuleSet::from_rules(vec![PesRule::unfiltered(rate, 0, 1)]);

        rules.apply(&spikes, &mut after, &vec![error.clone()], &layout);

        let firing: Vec<u32> = spikes.firing(&layout).collect();
        for row in 0..rows {
            for column in 0..n {
                let fired = firing.contains(&(column as u32));
                let expected = if fired && row >= 1 {
                    before.get(row, column) - rate * error[row - 1]
                } else {
                    before.get(row, column)
                };
                prop_assert_eq!(after.get(row, column), expected);
            }
        }
    }

    #[test]
    fn disjoint_rules_commute(
        (layout, spikes) in layout_and_spikes(),
        first in prop::collection::vec(-2.0f32..2.0, 1..3),
        second in prop::collection::vec(-2.0f32..2.0, 1..3),
    ) {
        let n = layout.n_neurons() as usize;
        let modulatory = vec![first.clone(), second.clone()];
        let rule_a = PesRule::unfiltered(0.25f32, 0, 0);
        let rule_b = PesRule::unfiltered(0.5f32, 1, first.len() as u32);
        let rows = first.len() + second.len();

        let mut forward = DecoderMatrix::<f32>::new(rows, n).unwrap();
        PesRuleSet::from_rules(vec![rule_a, rule_b]).apply(&spikes, &mut forward, &modulatory, &layout);

        let mut reverse = DecoderMatrix::<f32>::new(rows, n).unwrap();
        PesRuleSet::from_rules(vec![rule_b, rule_a]).apply(&spikes, &mut reverse, &modulatory, &layout);

        let mut separate = DecoderMatrix::<f32>::new(rows, n).unwrap();
        PesRuleSet::from_rules(vec![rule_a]).apply(&spikes, &mut separate, &modulatory, &layout);
        PesRuleSet::from_rules(vec![rule_b]).apply(&spikes, &mut separate, &modulatory, &layout);

        prop_assert_eq!(&forward, &reverse);
        prop_assert_eq!(&forward, &separate);
    }
}
