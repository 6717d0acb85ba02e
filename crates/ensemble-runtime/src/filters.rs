// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Input filter pipelines
//!
//! Each filter is a first-order low-pass: packets add into an input
//! accumulator, and every tick
//!
//! ```text
//! output = a * output + b * input      a = exp(-dt / tau), b = 1 - a
//! ```
//!
//! after which the accumulator is cleared. A filter that receives nothing
//! decays toward zero. `tau = 0` gives `a = 0`, a pass-through filter.

use ensemble_config::{EnsembleConfig, FilterConfig, FilterKind, RouteConfig};
use ensemble_neural::{try_alloc_filled, NeuralValue, Result};
use ensemble_plasticity::ModulatoryFilters;

use crate::packets::Packet;

/// Packet route into one filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterRoute {
    pub key: u32,
    pub mask: u32,
    pub dimension_mask: u32,
}

impl FilterRoute {
    #[inline]
    pub fn matches(&self, key: u32) -> bool {
        key & self.mask == self.key
    }

    #[inline]
    pub fn dimension(&self, key: u32) -> usize {
        (key & self.dimension_mask) as usize
    }
}

impl From<&RouteConfig> for FilterRoute {
    fn from(route: &RouteConfig) -> Self {
        Self {
            key: route.key,
            mask: route.mask,
            dimension_mask: route.dimension_mask,
        }
    }
}

/// Decay and input gain for a time constant
pub fn lowpass_coefficients(dt: f32, time_constant: f32) -> (f32, f32) {
    if time_constant <= 0.0 {
        return (0.0, 1.0);
    }
    let a = (-dt / time_constant).exp();
    (a, 1.0 - a)
}

#[derive(Debug, Clone)]
pub struct LowPassFilter<V: NeuralValue> {
    decay: V,
    gain: V,
    routes: Vec<FilterRoute>,
    input: Vec<V>,
    output: Vec<V>,
}

impl<V: NeuralValue> LowPassFilter<V> {
    pub fn new(
        dimensions: usize,
        time_constant: f32,
        dt: f32,
        routes: Vec<FilterRoute>,
    ) -> Result<Self> {
        let (a, b) = lowpass_coefficients(dt, time_constant);
        Ok(Self {
            decay: V::from_f32(a),
            gain: V::from_f32(b),
            routes,
            input: try_alloc_filled(dimensions, V::zero(), "filter input")?,
            output: try_alloc_filled(dimensions, V::zero(), "filter output")?,
        })
    }

    pub fn from_config(config: &FilterConfig, dt: f32) -> Result<Self> {
        Self::new(
            config.dimensions as usize,
            config.time_constant,
            dt,
            config.routes.iter().map(FilterRoute::from).collect(),
        )
    }

    pub fn dimensions(&self) -> usize {
        self.output.len()
    }

    pub fn routes(&self) -> &[FilterRoute] {
        &self.routes
    }

    /// Add `value` to the accumulator; out-of-range dimensions are ignored
    pub fn accumulate(&mut self, dimension: usize, value: V) {
        if let Some(slot) = self.input.get_mut(dimension) {
            *slot = slot.saturating_add(value);
        }
    }

    /// Route a packet into this filter; returns whether any route matched
    pub fn receive(&mut self, packet: Packet) -> bool {
        let mut matched = false;
        for route in &self.routes {
            if !route.matches(packet.key) {
                continue;
            }
            if let Some(slot) = self.input.get_mut(route.dimension(packet.key)) {
                *slot = slot.saturating_add(packet.value());
            }
            matched = true;
        }
        matched
    }

    pub fn step(&mut self) {
        for (out, input) in self.output.iter_mut().zip(self.input.iter_mut()) {
            *out = out
                .saturating_mul(self.decay)
                .saturating_add(input.saturating_mul(self.gain));
            *input = V::zero();
        }
    }

    pub fn output(&self) -> &[V] {
        &self.output
    }
}

/// Ordered set of filters fed from the same packet stream
#[derive(Debug, Clone)]
pub struct FilterCollection<V: NeuralValue> {
    filters: Vec<LowPassFilter<V>>,
}

impl<V: NeuralValue> Default for FilterCollection<V> {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
        }
    }
}

impl<V: NeuralValue> FilterCollection<V> {
    pub fn new(filters: Vec<LowPassFilter<V>>) -> Self {
        Self { filters }
    }

    pub fn from_configs<'a, I>(configs: I, dt: f32) -> Result<Self>
    where
        I: IntoIterator<Item = &'a FilterConfig>,
    {
        let filters = configs
            .into_iter()
            .map(|config| LowPassFilter::from_config(config, dt))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { filters })
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn filters(&self) -> &[LowPassFilter<V>] {
        &self.filters
    }

    pub fn receive(&mut self, packet: Packet) -> bool {
        let mut matched = false;
        for filter in &mut self.filters {
            matched |= filter.receive(packet);
        }
        matched
    }

    pub fn step(&mut self) {
        for filter in &mut self.filters {
            filter.step();
        }
    }

    /// Sum of every filter output into `out` (which is cleared first)
    pub fn sum_outputs_into(&self, out: &mut [V]) {
        out.fill(V::zero());
        for filter in &self.filters {
            for (acc, &value) in out.iter_mut().zip(filter.output()) {
                *acc = acc.saturating_add(value);
            }
        }
    }
}

impl<V: NeuralValue> ModulatoryFilters<V> for FilterCollection<V> {
    fn n_filters(&self) -> usize {
        self.filters.len()
    }

    fn output(&self, index: usize) -> &[V] {
        self.filters[index].output()
    }
}

/// The four filter pipelines of an ensemble
#[derive(Debug, Clone)]
pub struct InputFilters<V: NeuralValue> {
    pub input: FilterCollection<V>,
    pub inhibitory: FilterCollection<V>,
    pub modulatory: FilterCollection<V>,
    pub learnt_encoder: FilterCollection<V>,
    /// Unmatched packets since construction
    unrouted: u64,
}

impl<V: NeuralValue> InputFilters<V> {
    pub fn from_config(config: &EnsembleConfig) -> Result<Self> {
        let dt = config.dt();
        let collection = |kind: FilterKind| -> Result<FilterCollection<V>> {
            let filters = config
                .input_filters_of(kind)
                .map(|f| LowPassFilter::from_config(&f.filter(), dt))
                .collect::<Result<Vec<_>>>()?;
            Ok(FilterCollection::new(filters))
        };

        Ok(Self {
            input: collection(FilterKind::Input)?,
            inhibitory: collection(FilterKind::Inhibitory)?,
            modulatory: FilterCollection::from_configs(&config.modulatory_filters, dt)?,
            learnt_encoder: collection(FilterKind::LearntEncoder)?,
            unrouted: 0,
        })
    }

    /// Offer a packet to every pipeline
    pub fn receive(&mut self, packet: Packet) {
        let mut matched = self.input.receive(packet);
        matched |= self.inhibitory.receive(packet);
        matched |= self.modulatory.receive(packet);
        matched |= self.learnt_encoder.receive(packet);
        if !matched {
            self.unrouted += 1;
        }
    }

    /// Step every pipeline once
    pub fn step(&mut self) {
        self.input.step();
        self.inhibitory.step();
        self.modulatory.step();
        self.learnt_encoder.step();
    }

    /// Summed inhibitory output (scalar)
    pub fn inhibition(&self) -> V {
        self.inhibitory
            .filters()
            .iter()
            .filter_map(|f| f.output().first().copied())
            .fold(V::zero(), |acc, v| acc.saturating_add(v))
    }

    /// Packets no pipeline accepted since construction
    pub fn unrouted_packets(&self) -> u64 {
        self.unrouted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(key: u32, mask: u32, dimension_mask: u32) -> FilterRoute {
        FilterRoute {
            key,
            mask,
            dimension_mask,
        }
    }

    #[test]
    fn test_route_matching() {
        let r = route(0x100, 0xff00, 0x3);
        assert!(r.matches(0x102));
        assert!(!r.matches(0x202));
        assert_eq!(r.dimension(0x102), 2);
    }

    #[test]
    fn test_pass_through_filter() {
        let mut filter =
            LowPassFilter::<f32>::new(2, 0.0, 0.001, vec![route(0x10, 0xf0, 0x1)]).unwrap();
        assert!(filter.receive(Packet::with_value(0x11, 0.5f32)));
        assert!(filter.receive(Packet::with_value(0x11, 0.25f32)));
        assert!(!filter.receive(Packet::with_value(0x21, 1.0f32)));
        filter.step();
        assert_eq!(filter.output(), &[0.0, 0.75]);

        // Nothing received: output follows the empty accumulator
        filter.step();
        assert_eq!(filter.output(), &[0.0, 0.0]);
    }

    #[test]
    fn test_lowpass_decays_without_input() {
        let mut filter = LowPassFilter::<f32>::new(1, 0.01, 0.001, Vec::new()).unwrap();
        let (a, b) = lowpass_coefficients(0.001, 0.01);
        filter.accumulate(0, 1.0);
        filter.step();
        assert!((filter.output()[0] - b).abs() < 1e-6);
        filter.step();
        assert!((filter.output()[0] - a * b).abs() < 1e-6);
        assert!(filter.output()[0] < b);
    }

    #[test]
    fn test_out_of_range_dimension_ignored() {
        let mut filter = LowPassFilter::<f32>::new(1, 0.0, 0.001, Vec::new()).unwrap();
        filter.accumulate(3, 1.0);
        filter.step();
        assert_eq!(filter.output(), &[0.0]);
    }

    #[test]
    fn test_collection_sum_and_modulatory_view() {
        let mut collection = FilterCollection::new(vec![
            LowPassFilter::<f32>::new(2, 0.0, 0.001, vec![route(0, 0xf0, 0x1)]).unwrap(),
            LowPassFilter::<f32>::new(2, 0.0, 0.001, vec![route(0x10, 0xf0, 0x1)]).unwrap(),
        ]);
        collection.receive(Packet::with_value(0x00, 1.0f32));
        collection.receive(Packet::with_value(0x11, 2.0f32));
        collection.step();

        let mut sum = vec![9.0; 2];
        collection.sum_outputs_into(&mut sum);
        assert_eq!(sum, vec![1.0, 2.0]);
        assert_eq!(collection.n_filters(), 2);
        assert_eq!(ModulatoryFilters::output(&collection, 1), &[0.0, 2.0]);
    }
}
