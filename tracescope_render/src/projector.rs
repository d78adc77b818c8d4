// Copyright 2025 the Tracescope Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bucket-to-pixel projection.
//!
//! A render pass first gathers the chunks covering its [`LodWindow`] from the cache
//! ([`WindowData::gather`]), then projects each channel into canvas space
//! ([`PixelProjector::project`]). Buckets whose chunk has not resolved come out as `NaN`
//! instead of being dropped, so every output array stays aligned with the bucket range.

use std::sync::Arc;

use futures::task::Spawn;
use kurbo::Rect;
use peniko::Color;
use smallvec::SmallVec;
use tracescope_core::{
    Chunk, ChunkGeometry, ChunkKey, ChunkStore, Dataset, FetchCache, LodWindow, ValueRange,
};

use crate::amplitude::AmplitudeScale;
use crate::scale::{ScaleLinear, TimeScale};

/// Per-channel geometry produced by one render pass.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelPanel {
    /// Channel row position.
    pub channel: usize,
    /// Trace color.
    pub color: Color,
    /// Canvas x of each bucket.
    pub pixel_times: Vec<f64>,
    /// Canvas y of each bucket's minimum (or raw value); `NaN` where undefined.
    pub pixel_values_min: Vec<f64>,
    /// Canvas y of each bucket's maximum, for envelope levels.
    pub pixel_values_max: Option<Vec<f64>>,
}

impl PixelPanel {
    /// Number of buckets.
    pub fn len(&self) -> usize {
        self.pixel_times.len()
    }

    /// Whether the panel has no buckets.
    pub fn is_empty(&self) -> bool {
        self.pixel_times.is_empty()
    }

    /// Whether at least one bucket has a value.
    pub fn has_values(&self) -> bool {
        self.pixel_values_min.iter().any(|v| !v.is_nan())
    }
}

/// Raw bucket values of one channel over a window.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BucketValues {
    /// Minimum (or raw value) per bucket.
    pub min: Vec<f64>,
    /// Maximum per bucket, for envelope levels.
    pub max: Option<Vec<f64>>,
}

/// The chunks covering a window, as far as the cache has them.
#[derive(Clone, Debug)]
pub struct WindowData {
    window: LodWindow,
    geometry: ChunkGeometry,
    chunks: SmallVec<[(ChunkKey, Option<Arc<Chunk>>); 4]>,
}

impl WindowData {
    /// Looks up every chunk covering `window`; misses schedule fetches.
    pub fn gather<S: ChunkStore, Sp: Spawn>(cache: &FetchCache<S, Sp>, window: LodWindow) -> Self {
        let geometry = *cache.geometry();
        let chunks = window
            .chunk_keys(&geometry)
            .map(|key| (key, cache.get(key)))
            .collect();
        Self {
            window,
            geometry,
            chunks,
        }
    }

    /// The window these chunks cover.
    pub fn window(&self) -> &LodWindow {
        &self.window
    }

    /// Keys still unresolved.
    pub fn missing(&self) -> impl Iterator<Item = ChunkKey> + '_ {
        self.chunks
            .iter()
            .filter(|(_, chunk)| chunk.is_none())
            .map(|(key, _)| *key)
    }

    /// Whether every covering chunk has resolved.
    pub fn is_complete(&self) -> bool {
        self.chunks.iter().all(|(_, chunk)| chunk.is_some())
    }

    /// Values of `channel` for each bucket of the window.
    ///
    /// `max` is present for every level above the base, whether or not its chunks resolved.
    pub fn channel_values(&self, channel: usize) -> BucketValues {
        let buckets = &self.window.buckets;
        #[allow(
            clippy::cast_possible_truncation,
            reason = "bucket windows are bounded by the point cap"
        )]
        let len = (buckets.end - buckets.start) as usize;
        let mut min = vec![f64::NAN; len];
        let mut max = (!self.window.level.is_base()).then(|| vec![f64::NAN; len]);

        for (key, chunk) in &self.chunks {
            let Some(chunk) = chunk else {
                continue;
            };
            let chunk_start = self.geometry.chunk_start(key.index);
            for j in self.geometry.local_range(key.index, buckets) {
                // Short final chunks leave trailing buckets undefined.
                let Some(lo) = chunk.min(j, channel) else {
                    break;
                };
                #[allow(
                    clippy::cast_possible_truncation,
                    reason = "offset within the window computed above"
                )]
                let k = (chunk_start + j as u64 - buckets.start) as usize;
                min[k] = lo;
                if let (Some(max), Some(hi)) = (max.as_mut(), chunk.max(j, channel)) {
                    max[k] = hi;
                }
            }
        }
        BucketValues { min, max }
    }
}

/// Maps bucket indices and values into one channel panel.
#[derive(Clone, Copy, Debug)]
pub struct PixelProjector {
    time: TimeScale,
    start_time: f64,
    sampling_frequency: f64,
    amplitude: AmplitudeScale,
}

impl PixelProjector {
    /// Creates a projector for `dataset` drawn through `time`.
    pub fn new(dataset: &Dataset, time: TimeScale, amplitude: AmplitudeScale) -> Self {
        Self {
            time,
            start_time: dataset.start_time(),
            sampling_frequency: dataset.sampling_frequency(),
            amplitude,
        }
    }

    /// Time of the first base sample of `bucket` at downsampling factor `ds`.
    pub fn bucket_time(&self, bucket: u64, ds: u64) -> f64 {
        self.start_time + (bucket as f64 * ds as f64) / self.sampling_frequency
    }

    /// Projects one channel of `data` into `panel`.
    ///
    /// `range` maps to the panel's full height, `range.min` at the bottom. Values are
    /// multiplied by the amplitude factor before scaling; undefined values stay `NaN`.
    pub fn project(
        &self,
        data: &WindowData,
        channel: usize,
        range: ValueRange,
        panel: Rect,
        color: Color,
    ) -> PixelPanel {
        let window = data.window();
        let ds = window.level.factor();
        let pixel_times = window
            .buckets
            .clone()
            .map(|b| self.time.map(self.bucket_time(b, ds)))
            .collect();

        let y = ScaleLinear::new((range.min, range.max), (panel.y1, panel.y0));
        let amplitude = self.amplitude;
        let to_pixel = |v: f64| {
            if v.is_finite() {
                y.map(amplitude.apply(v))
            } else {
                f64::NAN
            }
        };

        let values = data.channel_values(channel);
        PixelPanel {
            channel,
            color,
            pixel_times,
            pixel_values_min: values.min.into_iter().map(to_pixel).collect(),
            pixel_values_max: values
                .max
                .map(|max| max.into_iter().map(to_pixel).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use futures::FutureExt;
    use futures::executor::LocalPool;
    use futures::future;
    use tracescope_core::{
        ChunkRows, DatasetDescriptor, FnChunkStore, Level, LodConfig, LodSelection, LodSelector,
        StoreError, Viewport,
    };

    fn dataset() -> Dataset {
        DatasetDescriptor {
            start_time_sec: 0.0,
            sampling_frequency: 1.0,
            num_frames: 100,
            chunk_size: 4,
            channel_ids: vec![7, 8],
        }
        .validate()
        .unwrap()
    }

    /// Level-1 store: value = sample index for channel 0, negated for channel 1.
    /// Chunk 1 never resolves.
    fn store() -> impl ChunkStore {
        FnChunkStore::new(|key: ChunkKey| {
            if key.index == 1 {
                return future::pending().boxed();
            }
            let start = key.index * 4;
            let rows = (start..(start + 4).min(100))
                .map(|i| vec![i as f64, -(i as f64)])
                .collect();
            future::ready(Ok::<_, StoreError>(ChunkRows::Raw(rows))).boxed()
        })
    }

    #[test]
    fn unresolved_chunks_become_nan_in_place() {
        let dataset = dataset();
        let mut pool = LocalPool::new();
        let cache = FetchCache::new(store(), pool.spawner(), *dataset.geometry());
        let window = LodWindow {
            level: Level::BASE,
            base: 2..10,
            buckets: 2..11,
        };
        let first = WindowData::gather(&cache, window.clone());
        assert!(!first.is_complete());
        assert_eq!(first.missing().count(), 3);
        pool.run_until_stalled();

        let data = WindowData::gather(&cache, window);
        assert_eq!(
            data.missing().collect::<Vec<_>>(),
            vec![ChunkKey::new(Level::BASE, 1)]
        );
        let values = data.channel_values(1);
        assert!(values.max.is_none());
        assert_eq!(values.min.len(), 9);
        assert_eq!(values.min[0], -2.0);
        assert_eq!(values.min[1], -3.0);
        assert!(values.min[2..6].iter().all(|v| v.is_nan()));
        assert_eq!(values.min[6], -8.0);
        assert_eq!(values.min[8], -10.0);
    }

    #[test]
    fn envelope_levels_always_carry_max() {
        let dataset = dataset();
        let pool = LocalPool::new();
        let cache = FetchCache::new(store(), pool.spawner(), *dataset.geometry());
        let window = LodWindow {
            level: Level::BASE.coarser(),
            base: 0..12,
            buckets: 0..5,
        };
        let data = WindowData::gather(&cache, window);
        let values = data.channel_values(0);
        assert_eq!(values.max.as_ref().map(Vec::len), Some(5));
        assert!(values.min.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn projection_flips_and_applies_amplitude() {
        let dataset = dataset();
        let mut pool = LocalPool::new();
        let cache = FetchCache::new(store(), pool.spawner(), *dataset.geometry());
        let selector = LodSelector::new(&dataset, LodConfig::default());
        let viewport = Viewport::new(0.0, 4.0);
        let LodSelection::Window(window) = selector.select(&viewport, 1000.0, false) else {
            panic!("expected a window");
        };
        assert_eq!(window.buckets, 0..5);
        WindowData::gather(&cache, window.clone());
        pool.run_until_stalled();
        let data = WindowData::gather(&cache, window);

        let time = TimeScale::new(viewport, 0.0, 400.0);
        let projector = PixelProjector::new(&dataset, time, AmplitudeScale::new(2.0));
        let panel = Rect::new(0.0, 100.0, 400.0, 200.0);
        let out = projector.project(&data, 0, ValueRange::new(0.0, 6.0), panel, Color::BLACK);

        assert_eq!(out.pixel_times, vec![0.0, 100.0, 200.0, 300.0, 400.0]);
        // Sample 3 doubled is 6.0, the top of the range.
        assert_eq!(out.pixel_values_min[0], 200.0);
        assert_eq!(out.pixel_values_min[3], 100.0);
        // Bucket 4 lives in the chunk that never resolves.
        assert!(out.pixel_values_min[4].is_nan());
        assert!(out.pixel_values_max.is_none());
        assert!(out.has_values());
    }
}
