// Copyright 2025 the Tracescope Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! An in-memory chunk store serving a deterministic multi-channel signal.

use std::f64::consts::TAU;

use futures::FutureExt;
use futures::future::{self, BoxFuture};
use tracescope_core::{ChunkKey, ChunkRows, ChunkStore, Dataset, StoreError};
use tracing::trace;

/// Each channel is a sine at its own frequency on top of a slow drift, with a short spike
/// every `SPIKE_EVERY` samples so that envelope levels visibly keep the peaks.
const SPIKE_EVERY: u64 = 7919;

#[derive(Clone, Debug)]
pub(crate) struct SyntheticStore {
    num_frames: u64,
    chunk_size: u64,
    channels: usize,
    sampling_frequency: f64,
}

impl SyntheticStore {
    pub(crate) fn new(dataset: &Dataset) -> Self {
        Self {
            num_frames: dataset.num_frames(),
            chunk_size: dataset.geometry().chunk_size(),
            channels: dataset.num_channels(),
            sampling_frequency: dataset.sampling_frequency(),
        }
    }

    fn sample(&self, i: u64, channel: usize) -> f64 {
        let t = i as f64 / self.sampling_frequency;
        let c = channel as f64;
        let freq = 1.5 + 2.0 * c;
        let wave = (10.0 + 5.0 * c) * (TAU * freq * t).sin();
        let drift = 20.0 * (TAU * t / 120.0 + c).sin();
        let spike = if (i + 31 * channel as u64) % SPIKE_EVERY < 3 {
            80.0
        } else {
            0.0
        };
        wave + drift + spike
    }

    fn row(&self, i: u64) -> Vec<f64> {
        (0..self.channels).map(|c| self.sample(i, c)).collect()
    }

    /// Rows for `key`, aggregated on the fly.
    pub(crate) fn rows(&self, key: ChunkKey) -> Result<ChunkRows, StoreError> {
        let ds = key.level.factor();
        let buckets = self.num_frames.div_ceil(ds);
        let start = key.index.saturating_mul(self.chunk_size);
        if start >= buckets {
            return Err(StoreError::Unavailable {
                key,
                reason: format!("chunk starts past the last of {buckets} buckets"),
            });
        }
        let end = (start + self.chunk_size).min(buckets);
        if key.level.is_base() {
            return Ok(ChunkRows::Raw((start..end).map(|i| self.row(i)).collect()));
        }

        let (mut min, mut max) = (Vec::new(), Vec::new());
        for b in start..end {
            let mut lo = vec![f64::INFINITY; self.channels];
            let mut hi = vec![f64::NEG_INFINITY; self.channels];
            for i in b * ds..((b + 1) * ds).min(self.num_frames) {
                for (c, v) in self.row(i).into_iter().enumerate() {
                    lo[c] = lo[c].min(v);
                    hi[c] = hi[c].max(v);
                }
            }
            min.push(lo);
            max.push(hi);
        }
        Ok(ChunkRows::Envelope { min, max })
    }
}

impl ChunkStore for SyntheticStore {
    fn fetch(&self, key: ChunkKey) -> BoxFuture<'static, Result<ChunkRows, StoreError>> {
        let store = self.clone();
        // Aggregation runs when the executor polls the fetch, not inside the render pass.
        future::lazy(move |_| {
            trace!(%key, "generating chunk");
            store.rows(key)
        })
        .boxed()
    }
}
