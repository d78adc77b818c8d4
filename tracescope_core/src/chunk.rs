// Copyright 2025 the Tracescope Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chunk identity, chunk geometry, and resolved chunk contents.
//!
//! A dataset is served as a pyramid of fixed-size chunks:
//! - a [`Level`] is a downsampling factor (`1, 3, 9, 27, ...`),
//! - a level is split into chunks of `chunk_size` *buckets*, and
//! - a bucket at level `ds` summarizes `ds` consecutive base samples.
//!
//! All bucket-to-chunk arithmetic lives in [`ChunkGeometry`]. Off-by-one errors here shift
//! rendered data sideways without any other symptom, so callers should never divide bucket
//! indices by hand.

use core::fmt;
use core::num::NonZeroU64;
use core::ops::Range;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A pyramid level, identified by its downsampling factor.
///
/// Invariant: the factor is a power of [`Level::STEP`] and at least `1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct Level(u64);

impl Level {
    /// The undownsampled level (one bucket per base sample).
    pub const BASE: Self = Self(1);

    /// Ratio between the factors of adjacent levels.
    pub const STEP: u64 = 3;

    /// Returns the level for `factor`, or `None` if it is not a power of [`Level::STEP`].
    pub fn from_factor(factor: u64) -> Option<Self> {
        if factor == 0 {
            return None;
        }
        let mut f = factor;
        while f % Self::STEP == 0 {
            f /= Self::STEP;
        }
        (f == 1).then_some(Self(factor))
    }

    /// Number of base samples summarized by one bucket at this level.
    pub fn factor(self) -> u64 {
        self.0
    }

    /// Returns the next coarser level (saturating at the largest representable power).
    #[must_use]
    pub fn coarser(self) -> Self {
        match self.0.checked_mul(Self::STEP) {
            Some(f) => Self(f),
            None => self,
        }
    }

    /// Returns the next finer level, or `None` at [`Level::BASE`].
    pub fn finer(self) -> Option<Self> {
        (self.0 > 1).then(|| Self(self.0 / Self::STEP))
    }

    /// Whether this level carries raw samples.
    pub fn is_base(self) -> bool {
        self.0 == 1
    }

    /// Number of coarsening steps from [`Level::BASE`].
    pub fn depth(self) -> u32 {
        self.0.ilog(Self::STEP)
    }
}

impl Default for Level {
    fn default() -> Self {
        Self::BASE
    }
}

impl TryFrom<u64> for Level {
    type Error = InvalidLevel;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::from_factor(value).ok_or(InvalidLevel(value))
    }
}

impl From<Level> for u64 {
    fn from(value: Level) -> Self {
        value.0
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ds{}", self.0)
    }
}

/// Error returned when a downsampling factor is not a power of three.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("downsampling factor {0} is not a power of 3")]
pub struct InvalidLevel(pub u64);

/// Identity of a chunk: a level plus the chunk's position within that level.
///
/// This is also the fetch-cache key; equality is structural.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkKey {
    /// Pyramid level.
    pub level: Level,
    /// Chunk index among the chunks of `level`.
    pub index: u64,
}

impl ChunkKey {
    /// Creates a chunk key.
    pub fn new(level: Level, index: u64) -> Self {
        Self { level, index }
    }
}

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.level, self.index)
    }
}

/// Fixed chunk shape shared by every level of a dataset.
///
/// `chunk_size` counts buckets, so a chunk at level `ds` spans `chunk_size * ds` base samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkGeometry {
    chunk_size: NonZeroU64,
    channels: usize,
}

impl ChunkGeometry {
    /// Creates a geometry of `chunk_size` buckets per chunk and `channels` values per row.
    pub fn new(chunk_size: NonZeroU64, channels: usize) -> Self {
        Self {
            chunk_size,
            channels,
        }
    }

    /// Buckets per chunk.
    pub fn chunk_size(&self) -> u64 {
        self.chunk_size.get()
    }

    /// Values per row.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Index of the chunk holding `bucket`.
    pub fn chunk_of(&self, bucket: u64) -> u64 {
        bucket / self.chunk_size
    }

    /// Key of the chunk holding `bucket` at `level`.
    pub fn key_for(&self, level: Level, bucket: u64) -> ChunkKey {
        ChunkKey::new(level, self.chunk_of(bucket))
    }

    /// First bucket index covered by chunk `index`.
    pub fn chunk_start(&self, index: u64) -> u64 {
        index.saturating_mul(self.chunk_size())
    }

    /// Half-open range of chunk indices touching the half-open bucket range `buckets`.
    pub fn chunks_covering(&self, buckets: &Range<u64>) -> Range<u64> {
        if buckets.is_empty() {
            return 0..0;
        }
        self.chunk_of(buckets.start)..self.chunk_of(buckets.end - 1) + 1
    }

    /// Offsets within chunk `index` that fall inside `buckets`.
    ///
    /// The result is clamped to `0..chunk_size`; it is empty when the chunk does not overlap.
    pub fn local_range(&self, index: u64, buckets: &Range<u64>) -> Range<usize> {
        let start = self.chunk_start(index);
        let end = start.saturating_add(self.chunk_size());
        let lo = buckets.start.max(start);
        let hi = buckets.end.min(end);
        if lo >= hi {
            return 0..0;
        }
        to_usize(lo - start)..to_usize(hi - start)
    }

    /// Number of buckets at `level` for a dataset of `num_frames` base samples.
    pub fn bucket_count(&self, level: Level, num_frames: u64) -> u64 {
        num_frames.div_ceil(level.factor())
    }

    /// Number of chunks at `level` for a dataset of `num_frames` base samples.
    pub fn chunk_count(&self, level: Level, num_frames: u64) -> u64 {
        self.bucket_count(level, num_frames)
            .div_ceil(self.chunk_size())
    }

    /// Base samples spanned by one chunk at `level`.
    pub fn base_samples_per_chunk(&self, level: Level) -> u64 {
        self.chunk_size().saturating_mul(level.factor())
    }
}

fn to_usize(v: u64) -> usize {
    usize::try_from(v).unwrap_or(usize::MAX)
}

/// Rows as delivered by a chunk store.
///
/// Each row holds one value per channel.
#[derive(Clone, Debug, PartialEq)]
pub enum ChunkRows {
    /// Raw samples (level 1): one row per base sample.
    Raw(Vec<Vec<f64>>),
    /// Min/max envelope (levels above 1): one row per bucket in each array.
    Envelope {
        /// Per-bucket minimum rows.
        min: Vec<Vec<f64>>,
        /// Per-bucket maximum rows.
        max: Vec<Vec<f64>>,
    },
}

/// Contract violations found while validating [`ChunkRows`].
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ChunkError {
    /// Raw rows answered a coarse level, or envelope rows answered the base level.
    #[error("wrong row kind for {level} (envelope: {envelope})")]
    KindMismatch {
        /// Level of the requested key.
        level: Level,
        /// Whether the store answered with an envelope.
        envelope: bool,
    },
    /// A row does not carry one value per channel.
    #[error("row {row} has {found} values, expected {expected}")]
    RowWidth {
        /// Offending row.
        row: usize,
        /// Channel count of the dataset.
        expected: usize,
        /// Values found in the row.
        found: usize,
    },
    /// The `min` and `max` arrays have different lengths.
    #[error("envelope has {min} min rows but {max} max rows")]
    EnvelopeLength {
        /// Rows in `min`.
        min: usize,
        /// Rows in `max`.
        max: usize,
    },
    /// The chunk holds more buckets than the dataset's chunk size.
    #[error("chunk has {rows} rows, chunk size is {chunk_size}")]
    Oversized {
        /// Rows received.
        rows: usize,
        /// Configured chunk size.
        chunk_size: u64,
    },
    /// A bucket's minimum exceeds its maximum.
    #[error("bucket {bucket} channel {channel}: min {min} > max {max}")]
    Inverted {
        /// Offending bucket (chunk-local).
        bucket: usize,
        /// Offending channel.
        channel: usize,
        /// Stored minimum.
        min: f64,
        /// Stored maximum.
        max: f64,
    },
}

/// A validated chunk, stored row-major.
///
/// Invariants: every row has `channels` values; for envelope chunks `min <= max` wherever
/// both values are defined (non-NaN).
#[derive(Clone, Debug, PartialEq)]
pub struct Chunk {
    key: ChunkKey,
    channels: usize,
    buckets: usize,
    min: Vec<f64>,
    max: Option<Vec<f64>>,
}

impl Chunk {
    /// Validates `rows` against `geometry` and flattens them.
    pub fn from_rows(
        key: ChunkKey,
        rows: ChunkRows,
        geometry: &ChunkGeometry,
    ) -> Result<Self, ChunkError> {
        let envelope = matches!(rows, ChunkRows::Envelope { .. });
        if envelope == key.level.is_base() {
            return Err(ChunkError::KindMismatch {
                level: key.level,
                envelope,
            });
        }
        let channels = geometry.channels();
        let (min_rows, max_rows) = match rows {
            ChunkRows::Raw(rows) => (rows, None),
            ChunkRows::Envelope { min, max } => {
                if min.len() != max.len() {
                    return Err(ChunkError::EnvelopeLength {
                        min: min.len(),
                        max: max.len(),
                    });
                }
                (min, Some(max))
            }
        };
        let buckets = min_rows.len();
        if buckets as u64 > geometry.chunk_size() {
            return Err(ChunkError::Oversized {
                rows: buckets,
                chunk_size: geometry.chunk_size(),
            });
        }
        let min = flatten(&min_rows, channels)?;
        let max = max_rows.map(|rows| flatten(&rows, channels)).transpose()?;

        if let Some(max) = &max {
            for (i, (&lo, &hi)) in min.iter().zip(max).enumerate() {
                if lo > hi {
                    return Err(ChunkError::Inverted {
                        bucket: i / channels.max(1),
                        channel: i % channels.max(1),
                        min: lo,
                        max: hi,
                    });
                }
            }
        }

        Ok(Self {
            key,
            channels,
            buckets,
            min,
            max,
        })
    }

    /// The key this chunk was fetched for.
    pub fn key(&self) -> ChunkKey {
        self.key
    }

    /// Values per row.
    pub fn channel_count(&self) -> usize {
        self.channels
    }

    /// Rows held by this chunk (the last chunk of a level may be short).
    pub fn bucket_count(&self) -> usize {
        self.buckets
    }

    /// Whether this chunk carries a separate `max` array.
    pub fn is_envelope(&self) -> bool {
        self.max.is_some()
    }

    /// Minimum (or raw value) of `channel` in `bucket`.
    pub fn min(&self, bucket: usize, channel: usize) -> Option<f64> {
        self.index(bucket, channel).map(|i| self.min[i])
    }

    /// Maximum of `channel` in `bucket`; the raw value for raw chunks.
    pub fn max(&self, bucket: usize, channel: usize) -> Option<f64> {
        let i = self.index(bucket, channel)?;
        Some(self.max.as_ref().map_or(self.min[i], |max| max[i]))
    }

    /// Per-bucket minima of one channel.
    pub fn channel_min(&self, channel: usize) -> impl Iterator<Item = f64> + '_ {
        column(&self.min, self.channels, channel)
    }

    /// Per-bucket maxima of one channel (raw values for raw chunks).
    pub fn channel_max(&self, channel: usize) -> impl Iterator<Item = f64> + '_ {
        column(self.max.as_ref().unwrap_or(&self.min), self.channels, channel)
    }

    fn index(&self, bucket: usize, channel: usize) -> Option<usize> {
        (bucket < self.buckets && channel < self.channels).then(|| bucket * self.channels + channel)
    }
}

fn flatten(rows: &[Vec<f64>], channels: usize) -> Result<Vec<f64>, ChunkError> {
    let mut out = Vec::with_capacity(rows.len() * channels);
    for (row, values) in rows.iter().enumerate() {
        if values.len() != channels {
            return Err(ChunkError::RowWidth {
                row,
                expected: channels,
                found: values.len(),
            });
        }
        out.extend_from_slice(values);
    }
    Ok(out)
}

fn column(values: &[f64], channels: usize, channel: usize) -> impl Iterator<Item = f64> + '_ {
    let skip = if channel < channels { channel } else { values.len() };
    values.iter().skip(skip).step_by(channels.max(1)).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    fn geometry(chunk_size: u64, channels: usize) -> ChunkGeometry {
        ChunkGeometry::new(NonZeroU64::new(chunk_size).unwrap(), channels)
    }

    #[test]
    fn levels_are_powers_of_three() {
        assert_eq!(Level::from_factor(1), Some(Level::BASE));
        assert_eq!(Level::from_factor(27).map(Level::depth), Some(3));
        assert_eq!(Level::from_factor(0), None);
        assert_eq!(Level::from_factor(6), None);
        assert_eq!(Level::BASE.coarser().coarser().factor(), 9);
        assert_eq!(Level::BASE.finer(), None);
        assert_eq!(Level::from_factor(9).and_then(Level::finer), Some(Level(3)));
    }

    #[test]
    fn level_deserialization_rejects_non_powers() {
        let ok: ChunkKey = serde_json::from_str(r#"{"level":81,"index":4}"#).unwrap();
        assert_eq!(ok, ChunkKey::new(Level(81), 4));
        assert!(serde_json::from_str::<ChunkKey>(r#"{"level":12,"index":0}"#).is_err());
    }

    #[test]
    fn chunk_of_uses_floor_division() {
        let g = geometry(1000, 1);
        assert_eq!(g.chunk_of(0), 0);
        assert_eq!(g.chunk_of(999), 0);
        assert_eq!(g.chunk_of(1000), 1);
        assert_eq!(g.chunk_start(3), 3000);
    }

    #[test]
    fn chunks_covering_half_open_range() {
        let g = geometry(10, 1);
        assert_eq!(g.chunks_covering(&(0..10)), 0..1);
        assert_eq!(g.chunks_covering(&(0..11)), 0..2);
        assert_eq!(g.chunks_covering(&(9..10)), 0..1);
        assert_eq!(g.chunks_covering(&(10..10)), 0..0);
        assert_eq!(g.chunks_covering(&(15..35)), 1..4);
    }

    #[test]
    fn local_range_clips_to_both_ends() {
        let g = geometry(10, 1);
        let buckets = 15..35;
        assert_eq!(g.local_range(1, &buckets), 5..10);
        assert_eq!(g.local_range(2, &buckets), 0..10);
        assert_eq!(g.local_range(3, &buckets), 0..5);
        assert_eq!(g.local_range(4, &buckets), 0..0);
        assert_eq!(g.local_range(0, &buckets), 0..0);
    }

    #[test]
    fn counts_round_up() {
        let g = geometry(1000, 2);
        let ds3 = Level::BASE.coarser();
        assert_eq!(g.bucket_count(ds3, 9000), 3000);
        assert_eq!(g.bucket_count(ds3, 9001), 3001);
        assert_eq!(g.chunk_count(ds3, 9001), 4);
        assert_eq!(g.chunk_count(Level::BASE, 0), 0);
        assert_eq!(g.base_samples_per_chunk(ds3), 3000);
    }

    #[test]
    fn raw_rows_flatten_and_mirror_max() {
        let g = geometry(4, 2);
        let key = ChunkKey::new(Level::BASE, 0);
        let chunk =
            Chunk::from_rows(key, ChunkRows::Raw(vec![vec![1.0, 2.0], vec![3.0, 4.0]]), &g)
                .unwrap();
        assert!(!chunk.is_envelope());
        assert_eq!(chunk.bucket_count(), 2);
        assert_eq!(chunk.min(1, 0), Some(3.0));
        assert_eq!(chunk.max(1, 1), Some(4.0));
        assert_eq!(chunk.min(2, 0), None);
        assert_eq!(chunk.channel_min(1).collect::<Vec<_>>(), vec![2.0, 4.0]);
    }

    #[test]
    fn malformed_rows_are_rejected() {
        let g = geometry(4, 2);
        let key = ChunkKey::new(Level(3), 0);
        let base = ChunkKey::new(Level::BASE, 0);
        let narrow = Chunk::from_rows(base, ChunkRows::Raw(vec![vec![1.0]]), &g);
        assert!(matches!(narrow, Err(ChunkError::RowWidth { row: 0, .. })));

        let uneven = Chunk::from_rows(
            key,
            ChunkRows::Envelope {
                min: vec![vec![0.0, 0.0]],
                max: vec![],
            },
            &g,
        );
        assert!(matches!(uneven, Err(ChunkError::EnvelopeLength { .. })));

        let inverted = Chunk::from_rows(
            key,
            ChunkRows::Envelope {
                min: vec![vec![0.0, 5.0]],
                max: vec![vec![1.0, 4.0]],
            },
            &g,
        );
        assert!(matches!(
            inverted,
            Err(ChunkError::Inverted {
                bucket: 0,
                channel: 1,
                ..
            })
        ));

        let oversized = Chunk::from_rows(base, ChunkRows::Raw(vec![vec![0.0, 0.0]; 5]), &g);
        assert!(matches!(oversized, Err(ChunkError::Oversized { rows: 5, .. })));

        let raw_at_coarse = Chunk::from_rows(key, ChunkRows::Raw(vec![vec![0.0, 0.0]]), &g);
        assert_eq!(
            raw_at_coarse,
            Err(ChunkError::KindMismatch {
                level: Level(3),
                envelope: false,
            })
        );
        let envelope_at_base = Chunk::from_rows(
            base,
            ChunkRows::Envelope {
                min: vec![vec![0.0, 0.0]],
                max: vec![vec![9.0, 9.0]],
            },
            &g,
        );
        assert_eq!(
            envelope_at_base,
            Err(ChunkError::KindMismatch {
                level: Level::BASE,
                envelope: true,
            })
        );
    }

    #[test]
    fn nan_buckets_are_not_inverted() {
        let g = geometry(2, 1);
        let chunk = Chunk::from_rows(
            ChunkKey::new(Level(3), 0),
            ChunkRows::Envelope {
                min: vec![vec![f64::NAN], vec![1.0]],
                max: vec![vec![0.0], vec![f64::NAN]],
            },
            &g,
        );
        assert!(chunk.is_ok());
    }

    fn envelope_rows(channels: usize) -> impl Strategy<Value = (Vec<Vec<f64>>, Vec<Vec<f64>>)> {
        prop::collection::vec(
            prop::collection::vec((-1e6_f64..1e6, 0.0_f64..1e3), channels),
            0..64,
        )
        .prop_map(|rows| {
            let min = rows
                .iter()
                .map(|r| r.iter().map(|&(lo, _)| lo).collect())
                .collect();
            let max = rows
                .iter()
                .map(|r| r.iter().map(|&(lo, w)| lo + w).collect())
                .collect();
            (min, max)
        })
    }

    proptest! {
        #[test]
        fn resolved_envelopes_keep_min_below_max((min, max) in envelope_rows(3)) {
            let g = geometry(64, 3);
            let chunk = Chunk::from_rows(
                ChunkKey::new(Level(9), 0),
                ChunkRows::Envelope { min, max },
                &g,
            ).unwrap();
            for b in 0..chunk.bucket_count() {
                for c in 0..3 {
                    prop_assert!(chunk.min(b, c).unwrap() <= chunk.max(b, c).unwrap());
                }
            }
        }

        #[test]
        fn every_bucket_lands_in_exactly_one_chunk(
            chunk_size in 1_u64..50,
            start in 0_u64..500,
            len in 0_u64..500,
        ) {
            let g = geometry(chunk_size, 1);
            let buckets = start..start + len;
            let total: usize = g
                .chunks_covering(&buckets)
                .map(|i| g.local_range(i, &buckets).len())
                .sum();
            prop_assert_eq!(total as u64, len);
        }
    }
}
