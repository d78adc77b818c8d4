// Copyright 2025 the Tracescope Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Level-of-detail selection.
//!
//! The selector trades fetch volume against fidelity. While the viewport is moving it aims
//! for fewer than one bucket per pixel; once the viewport has been still for a while
//! ([`crate::DwellTracker`]) it allows several buckets per pixel, which usually means one
//! level finer.

use core::ops::Range;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::chunk::{ChunkGeometry, ChunkKey, Level};
use crate::dataset::Dataset;
use crate::viewport::Viewport;

/// Tunables for level selection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LodConfig {
    /// Maximum number of points drawn across all channels.
    ///
    /// The per-channel cap is this divided by the channel count. It bounds both the overview
    /// level and the widest window that is rendered at all.
    pub point_budget: f64,
    /// Buckets per pixel allowed while the viewport is moving.
    pub moving_buckets_per_pixel: f64,
    /// Buckets per pixel allowed once the viewport is dwelling.
    pub dwell_buckets_per_pixel: f64,
    /// Stillness required before the viewport counts as dwelling, in milliseconds.
    pub dwell_time_ms: u64,
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            point_budget: 5e7,
            moving_buckets_per_pixel: 0.7,
            dwell_buckets_per_pixel: 3.0,
            dwell_time_ms: 500,
        }
    }
}

impl LodConfig {
    /// Per-channel point cap for a dataset of `num_channels` channels.
    pub fn max_points_per_channel(&self, num_channels: usize) -> f64 {
        self.point_budget / num_channels.max(1) as f64
    }

    /// Buckets per pixel allowed in the given dwell state.
    pub fn buckets_per_pixel(&self, dwelling: bool) -> f64 {
        if dwelling {
            self.dwell_buckets_per_pixel
        } else {
            self.moving_buckets_per_pixel
        }
    }

    /// Stillness required before the viewport counts as dwelling.
    pub fn dwell_time(&self) -> Duration {
        Duration::from_millis(self.dwell_time_ms)
    }
}

/// The coarsest level worth fetching: the overview level.
///
/// Starting from [`Level::BASE`], coarsens while one chunk still spans fewer than both
/// `num_frames` base samples and `max_points` points. The comparisons are inclusive, so a
/// chunk spanning exactly `max_points` stops the walk.
pub fn highest_level(num_frames: u64, chunk_size: u64, max_points: f64) -> Level {
    let mut level = Level::BASE;
    loop {
        let span = chunk_size.saturating_mul(level.factor());
        if span >= num_frames || span as f64 >= max_points {
            return level;
        }
        let next = level.coarser();
        if next == level {
            return level;
        }
        level = next;
    }
}

/// Chooses the level for a window of `span` base samples drawn with `bucket_budget` buckets.
///
/// Coarsens until the *next* level would fit the window into `bucket_budget` buckets, or until
/// a single chunk covers the whole dataset.
pub fn select_level(span: u64, bucket_budget: f64, chunk_size: u64, num_frames: u64) -> Level {
    let mut level = Level::BASE;
    loop {
        let next = level.coarser();
        if span as f64 / next.factor() as f64 <= bucket_budget {
            return level;
        }
        if chunk_size.saturating_mul(level.factor()) >= num_frames || next == level {
            return level;
        }
        level = next;
    }
}

/// The buckets a render pass needs at one level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LodWindow {
    /// Chosen level.
    pub level: Level,
    /// Visible base samples, clamped to the dataset.
    pub base: Range<u64>,
    /// Buckets at `level` covering `base`, including the bucket holding `base.end`.
    pub buckets: Range<u64>,
}

impl LodWindow {
    /// Keys of the chunks covering [`LodWindow::buckets`], in order.
    pub fn chunk_keys<'a>(
        &'a self,
        geometry: &'a ChunkGeometry,
    ) -> impl Iterator<Item = ChunkKey> + 'a {
        geometry
            .chunks_covering(&self.buckets)
            .map(move |index| ChunkKey::new(self.level, index))
    }
}

/// Outcome of level selection for one pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LodSelection {
    /// The window holds more samples than the point cap allows; nothing should be fetched.
    ZoomInRequired,
    /// The window does not overlap the dataset (or is degenerate).
    Empty,
    /// Render these buckets.
    Window(LodWindow),
}

/// Level selection bound to one dataset.
#[derive(Clone, Debug, PartialEq)]
pub struct LodSelector {
    config: LodConfig,
    geometry: ChunkGeometry,
    num_frames: u64,
    start_time: f64,
    sampling_frequency: f64,
    max_points: f64,
    overview: Level,
}

impl LodSelector {
    /// Creates a selector for `dataset`.
    pub fn new(dataset: &Dataset, config: LodConfig) -> Self {
        let geometry = *dataset.geometry();
        let max_points = config.max_points_per_channel(dataset.num_channels());
        let overview = highest_level(dataset.num_frames(), geometry.chunk_size(), max_points);
        Self {
            config,
            geometry,
            num_frames: dataset.num_frames(),
            start_time: dataset.start_time(),
            sampling_frequency: dataset.sampling_frequency(),
            max_points,
            overview,
        }
    }

    /// The configuration in use.
    pub fn config(&self) -> &LodConfig {
        &self.config
    }

    /// Per-channel point cap.
    pub fn max_points(&self) -> f64 {
        self.max_points
    }

    /// The coarsest level; its first chunk bounds every channel's value range.
    pub fn overview_level(&self) -> Level {
        self.overview
    }

    /// Key of the overview chunk.
    pub fn overview_key(&self) -> ChunkKey {
        ChunkKey::new(self.overview, 0)
    }

    /// Whether `viewport` spans more base samples than the point cap.
    pub fn zoom_in_required(&self, viewport: &Viewport) -> bool {
        viewport.duration() * self.sampling_frequency > self.max_points
    }

    /// Selects the level and bucket range for `viewport` drawn `pixel_width` pixels wide.
    pub fn select(&self, viewport: &Viewport, pixel_width: f64, dwelling: bool) -> LodSelection {
        if viewport.is_degenerate() || self.num_frames == 0 {
            return LodSelection::Empty;
        }
        if self.zoom_in_required(viewport) {
            return LodSelection::ZoomInRequired;
        }
        let last = (self.num_frames - 1) as f64;
        let position = |t: f64| (t - self.start_time) * self.sampling_frequency;
        let i1 = position(viewport.start).floor().clamp(0.0, last);
        let i2 = position(viewport.end).ceil().clamp(0.0, last);
        if i1 >= i2 {
            return LodSelection::Empty;
        }
        #[allow(
            clippy::cast_possible_truncation,
            reason = "clamped to the dataset's sample range"
        )]
        let base = i1 as u64..i2 as u64;

        let budget = if pixel_width.is_finite() {
            pixel_width.max(0.0) * self.config.buckets_per_pixel(dwelling)
        } else {
            0.0
        };
        let level = select_level(
            base.end - base.start,
            budget,
            self.geometry.chunk_size(),
            self.num_frames,
        );
        let ds = level.factor();
        let last_bucket = self.geometry.bucket_count(level, self.num_frames);
        let buckets = base.start / ds..(base.end / ds + 1).min(last_bucket);
        LodSelection::Window(LodWindow {
            level,
            base,
            buckets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    use crate::dataset::DatasetDescriptor;

    fn dataset(num_frames: u64, chunk_size: u64, channels: u32) -> Dataset {
        DatasetDescriptor {
            start_time_sec: 0.0,
            sampling_frequency: 1000.0,
            num_frames,
            chunk_size,
            channel_ids: (0..channels).collect(),
        }
        .validate()
        .unwrap()
    }

    fn level(factor: u64) -> Level {
        Level::from_factor(factor).unwrap()
    }

    #[test]
    fn overview_stops_at_point_cap() {
        // 3 * 1000 < 9000, but 3 * 1000 >= 3000.
        assert_eq!(highest_level(9000, 1000, 3000.0), level(3));
        assert_eq!(highest_level(9000, 1000, 1e9), level(9));
        assert_eq!(highest_level(9000, 1000, 2999.0), level(3));
        assert_eq!(highest_level(9000, 1000, 1000.0), Level::BASE);
        assert_eq!(highest_level(500, 1000, 1e9), Level::BASE);
    }

    #[test]
    fn overview_uses_per_channel_cap() {
        let config = LodConfig {
            point_budget: 6000.0,
            ..LodConfig::default()
        };
        let selector = LodSelector::new(&dataset(9000, 1000, 2), config);
        assert_eq!(selector.max_points(), 3000.0);
        assert_eq!(selector.overview_key(), ChunkKey::new(level(3), 0));
    }

    #[test]
    fn full_range_at_700_pixels_fits_moving_budget() {
        let selector = LodSelector::new(&dataset(1_000_000, 1000, 1), LodConfig::default());
        let full = Viewport::new(0.0, 1000.0);
        let LodSelection::Window(window) = selector.select(&full, 700.0, false) else {
            panic!("expected a window");
        };
        let span = (window.base.end - window.base.start) as f64;
        let ds = window.level.factor() as f64;
        assert!(span / (3.0 * ds) <= 490.0, "next level exceeds 490 buckets");
        assert!(span / ds > 490.0, "a finer level would have fit");
        assert_eq!(window.level, level(729));
    }

    #[test]
    fn dwelling_selects_a_finer_level() {
        let selector = LodSelector::new(&dataset(1_000_000, 1000, 1), LodConfig::default());
        let v = Viewport::new(100.0, 200.0);
        let (LodSelection::Window(moving), LodSelection::Window(still)) = (
            selector.select(&v, 700.0, false),
            selector.select(&v, 700.0, true),
        ) else {
            panic!("expected windows");
        };
        assert!(still.level < moving.level);
    }

    #[test]
    fn window_is_clamped_and_bucketed() {
        let selector = LodSelector::new(&dataset(9000, 1000, 1), LodConfig::default());
        let LodSelection::Window(w) = selector.select(&Viewport::new(-5.0, 100.0), 100.0, false)
        else {
            panic!("expected a window");
        };
        assert_eq!(w.base, 0..8999);
        let ds = w.level.factor();
        assert_eq!(w.buckets, 0..8999 / ds + 1);
        let g = *dataset(9000, 1000, 1).geometry();
        let keys: Vec<_> = w.chunk_keys(&g).collect();
        assert_eq!(keys.first(), Some(&ChunkKey::new(w.level, 0)));
    }

    #[test]
    fn degenerate_and_outside_windows_are_empty() {
        let selector = LodSelector::new(&dataset(9000, 1000, 1), LodConfig::default());
        assert_eq!(
            selector.select(&Viewport::new(3.0, 3.0), 100.0, false),
            LodSelection::Empty
        );
        assert_eq!(
            selector.select(&Viewport::new(20.0, 30.0), 100.0, false),
            LodSelection::Empty
        );
        assert_eq!(
            selector.select(&Viewport::new(1.0, 2.0), 0.0, false),
            selector.select(&Viewport::new(1.0, 2.0), f64::NAN, false)
        );
    }

    #[test]
    fn wide_windows_require_zoom() {
        let config = LodConfig {
            point_budget: 1000.0,
            ..LodConfig::default()
        };
        let selector = LodSelector::new(&dataset(9000, 1000, 1), config);
        assert!(selector.zoom_in_required(&Viewport::new(0.0, 1.001)));
        assert!(!selector.zoom_in_required(&Viewport::new(0.0, 1.0)));
        assert_eq!(
            selector.select(&Viewport::new(0.0, 5.0), 100.0, true),
            LodSelection::ZoomInRequired
        );
    }

    proptest! {
        #[test]
        fn level_is_monotonic_in_window_duration(
            start in 0.0_f64..500.0,
            d1 in 0.01_f64..500.0,
            extra in 0.0_f64..500.0,
            width in 10.0_f64..2000.0,
            dwelling in any::<bool>(),
        ) {
            let selector = LodSelector::new(&dataset(1_000_000, 1000, 4), LodConfig::default());
            let narrow = selector.select(&Viewport::new(start, start + d1), width, dwelling);
            let wide = selector.select(&Viewport::new(start, start + d1 + extra), width, dwelling);
            if let (LodSelection::Window(n), LodSelection::Window(w)) = (narrow, wide) {
                prop_assert!(n.level <= w.level);
            }
        }

        #[test]
        fn chosen_level_never_exceeds_next_level_budget(
            span in 1_u64..10_000_000,
            budget in 1.0_f64..5000.0,
        ) {
            let level = select_level(span, budget, 1000, 10_000_000);
            let next = level.coarser().factor() as f64;
            let capped = 1000 * level.factor() >= 10_000_000;
            prop_assert!(capped || span as f64 / next <= budget);
        }
    }
}
