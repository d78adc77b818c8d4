// Copyright 2025 the Tracescope Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-channel value ranges.
//!
//! Every channel gets its own vertical offset but the same vertical sensitivity: ranges are
//! measured on the overview chunk, then widened around their midpoints until all spans match
//! the widest one.

use serde::{Deserialize, Serialize};

use crate::chunk::Chunk;

/// A closed value interval.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
}

impl ValueRange {
    /// Creates a range.
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// `max - min`.
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Center of the range.
    pub fn midpoint(&self) -> f64 {
        0.5 * (self.min + self.max)
    }

    /// Widens the range symmetrically to `span`. Narrower targets leave it unchanged.
    #[must_use]
    pub fn widened_to(self, span: f64) -> Self {
        let diff = span - self.span();
        if diff > 0.0 {
            Self::new(self.min - diff / 2.0, self.max + diff / 2.0)
        } else {
            self
        }
    }
}

/// Normalized value ranges for every channel of a dataset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChannelRanges {
    ranges: Vec<ValueRange>,
}

impl ChannelRanges {
    /// Measures `overview` and equalizes the spans.
    pub fn from_overview(overview: &Chunk) -> Self {
        let mut ranges = channel_ranges(overview);
        equalize_spans(&mut ranges);
        Self { ranges }
    }

    /// Range of `channel`, if it exists.
    pub fn get(&self, channel: usize) -> Option<ValueRange> {
        self.ranges.get(channel).copied()
    }

    /// Number of channels.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Whether there are no channels.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// All ranges in channel order.
    pub fn as_slice(&self) -> &[ValueRange] {
        &self.ranges
    }
}

impl From<Vec<ValueRange>> for ChannelRanges {
    fn from(mut ranges: Vec<ValueRange>) -> Self {
        equalize_spans(&mut ranges);
        Self { ranges }
    }
}

/// Raw per-channel extremes of `chunk`, ignoring non-finite values.
///
/// A channel with no finite value gets `{0, 0}`.
pub fn channel_ranges(chunk: &Chunk) -> Vec<ValueRange> {
    (0..chunk.channel_count())
        .map(|c| {
            let min = chunk
                .channel_min(c)
                .filter(|v| v.is_finite())
                .reduce(f64::min);
            let max = chunk
                .channel_max(c)
                .filter(|v| v.is_finite())
                .reduce(f64::max);
            match (min, max) {
                (Some(min), Some(max)) => ValueRange::new(min, max),
                _ => ValueRange::default(),
            }
        })
        .collect()
}

/// Widens every range symmetrically to the widest span among them.
pub fn equalize_spans(ranges: &mut [ValueRange]) {
    let max_span = ranges
        .iter()
        .map(ValueRange::span)
        .fold(0.0_f64, f64::max);
    for range in ranges {
        *range = range.widened_to(max_span);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use core::num::NonZeroU64;

    use proptest::prelude::*;

    use crate::chunk::{ChunkGeometry, ChunkKey, ChunkRows, Level};

    fn envelope(min: Vec<Vec<f64>>, max: Vec<Vec<f64>>) -> Chunk {
        let channels = min.first().map_or(0, Vec::len);
        let geometry = ChunkGeometry::new(NonZeroU64::new(16).unwrap(), channels);
        let key = ChunkKey::new(Level::BASE.coarser(), 0);
        Chunk::from_rows(key, ChunkRows::Envelope { min, max }, &geometry).unwrap()
    }

    #[test]
    fn spans_are_equalized_symmetrically() {
        let mut ranges = [ValueRange::new(-10.0, 10.0), ValueRange::new(-2.0, 2.0)];
        equalize_spans(&mut ranges);
        assert_eq!(ranges[0], ValueRange::new(-10.0, 10.0));
        assert_eq!(ranges[1], ValueRange::new(-10.0, 10.0));

        let mut offset = [ValueRange::new(0.0, 4.0), ValueRange::new(100.0, 101.0)];
        equalize_spans(&mut offset);
        assert_eq!(offset[1], ValueRange::new(98.5, 102.5));
    }

    #[test]
    fn overview_ranges_use_min_and_max_arrays() {
        let chunk = envelope(
            vec![vec![-1.0, 5.0], vec![-3.0, f64::NAN]],
            vec![vec![2.0, 6.0], vec![0.0, f64::NAN]],
        );
        assert_eq!(
            channel_ranges(&chunk),
            vec![ValueRange::new(-3.0, 2.0), ValueRange::new(5.0, 6.0)]
        );
        let ranges = ChannelRanges::from_overview(&chunk);
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges.get(1), Some(ValueRange::new(3.0, 8.0)));
        assert_eq!(ranges.get(2), None);
    }

    #[test]
    fn undefined_channel_is_zero_centered() {
        let chunk = envelope(
            vec![vec![f64::NAN, 1.0]],
            vec![vec![f64::NAN, 3.0]],
        );
        let ranges = ChannelRanges::from_overview(&chunk);
        assert_eq!(ranges.get(0), Some(ValueRange::new(-1.0, 1.0)));
    }

    proptest! {
        #[test]
        fn equalized_spans_match_and_midpoints_hold(
            raw in prop::collection::vec((-1e6_f64..1e6, 0.0_f64..1e6), 1..16),
        ) {
            let original: Vec<_> = raw.iter().map(|&(lo, w)| ValueRange::new(lo, lo + w)).collect();
            let mut ranges = original.clone();
            equalize_spans(&mut ranges);
            let span = ranges[0].span();
            for (before, after) in original.iter().zip(&ranges) {
                prop_assert!((after.span() - span).abs() <= 1e-6 * span.max(1.0));
                prop_assert!((after.midpoint() - before.midpoint()).abs() <= 1e-6 * before.midpoint().abs().max(1.0));
            }
        }
    }
}
