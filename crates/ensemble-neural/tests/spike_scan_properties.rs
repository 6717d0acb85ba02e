// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Property tests for the skip-to-next-set-bit spike traversal

use ensemble_neural::{PopulationLayout, SpikeVector, SPIKE_WORD_BITS};
use proptest::prelude::*;

/// Reference traversal: test every bit of every population
fn firing_by_bit_test(words: &[u32], layout: &PopulationLayout) -> Vec<u32> {
    let mut firing = Vec::new();
    for population in layout.populations() {
        for offset in 0..population.length {
            let word = words[population.first_word + (offset / SPIKE_WORD_BITS) as usize];
            if word & (0x8000_0000 >> (offset % SPIKE_WORD_BITS)) != 0 {
                firing.push(population.first_neuron + offset);
            }
        }
    }
    firing
}

fn layout_and_words() -> impl Strategy<Value = (PopulationLayout, Vec<u32>)> {
    prop::collection::vec(0u32..100, 0..6).prop_flat_map(|lengths| {
        let layout = PopulationLayout::new(lengths).unwrap();
        let n_words = layout.n_words();
        (Just(layout), prop::collection::vec(any::<u32>(), n_words))
    })
}

proptest! {
    #[test]
    fn scan_matches_bit_by_bit_reference((layout, words) in layout_and_words()) {
        let expected = firing_by_bit_test(&words, &layout);
        let spikes = SpikeVector::from_words(words);
        let firing: Vec<u32> = spikes.firing(&layout).collect();
        prop_assert_eq!(firing, expected);
    }

    #[test]
    fn scan_is_strictly_increasing_and_in_range((layout, words) in layout_and_words()) {
        let spikes = SpikeVector::from_words(words);
        let firing: Vec<u32> = spikes.firing(&layout).collect();
        prop_assert!(firing.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(firing.iter().all(|&c| c < layout.n_neurons()));
    }

    #[test]
    fn set_then_scan_returns_exactly_the_set_neurons(
        lengths in prop::collection::vec(0u32..70, 1..5),
        picks in prop::collection::vec(any::<prop::sample::Index>(), 0..40),
    ) {
        let layout = PopulationLayout::new(lengths).unwrap();
        prop_assume!(layout.n_neurons() > 0);
        let mut spikes = SpikeVector::for_layout(&layout).unwrap();
        let mut expected: Vec<u32> = picks
            .iter()
            .map(|i| i.index(layout.n_neurons() as usize) as u32)
            .collect();
        for &n in &expected {
            prop_assert!(spikes.set(&layout, n));
        }
        expected.sort_unstable();
        expected.dedup();

        let firing: Vec<u32> = spikes.firing(&layout).collect();
        prop_assert_eq!(spikes.count_spikes() as usize, expected.len());
        prop_assert_eq!(firing, expected);
    }
}

#[test]
fn test_all_zero_words_yield_nothing() {
    let layout = PopulationLayout::new(vec![33, 0, 7]).unwrap();
    let spikes = SpikeVector::for_layout(&layout).unwrap();
    assert_eq!(spikes.len_words(), 3);
    assert_eq!(spikes.firing(&layout).count(), 0);
}

#[test]
fn test_all_ones_visit_every_neuron_once() {
    let layout = PopulationLayout::new(vec![33, 0, 7]).unwrap();
    let spikes = SpikeVector::from_words(vec![u32::MAX; 3]);
    let firing: Vec<u32> = spikes.firing(&layout).collect();
    assert_eq!(firing, (0..40).collect::<Vec<_>>());
}
