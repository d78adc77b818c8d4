// Copyright 2025 the Tracescope Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dataset descriptors.
//!
//! A [`DatasetDescriptor`] is what the embedding host hands over (usually as JSON). It is
//! validated once into a [`Dataset`], which every other component reads.

use core::num::NonZeroU64;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chunk::ChunkGeometry;

/// Description of a chunked recording, as supplied by the host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetDescriptor {
    /// Time of the first sample, in seconds.
    pub start_time_sec: f64,
    /// Base sampling rate in Hz.
    pub sampling_frequency: f64,
    /// Number of base samples per channel.
    pub num_frames: u64,
    /// Buckets per chunk, identical at every level.
    pub chunk_size: u64,
    /// Channel identifiers, in row order.
    pub channel_ids: Vec<u32>,
}

/// Reasons a [`DatasetDescriptor`] is rejected.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum DescriptorError {
    /// `chunk_size` is zero.
    #[error("chunk size must be positive")]
    ZeroChunkSize,
    /// The sampling frequency is zero, negative or not finite.
    #[error("sampling frequency must be positive and finite, got {0}")]
    SamplingFrequency(f64),
    /// The start time is not finite.
    #[error("start time must be finite, got {0}")]
    StartTime(f64),
    /// No channels were listed.
    #[error("dataset has no channels")]
    NoChannels,
}

impl DatasetDescriptor {
    /// Checks the descriptor and returns the validated dataset.
    pub fn validate(self) -> Result<Dataset, DescriptorError> {
        Dataset::new(self)
    }
}

/// A validated dataset.
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    descriptor: DatasetDescriptor,
    geometry: ChunkGeometry,
}

impl Dataset {
    /// Validates `descriptor`.
    pub fn new(descriptor: DatasetDescriptor) -> Result<Self, DescriptorError> {
        let chunk_size =
            NonZeroU64::new(descriptor.chunk_size).ok_or(DescriptorError::ZeroChunkSize)?;
        let fs = descriptor.sampling_frequency;
        if !fs.is_finite() || fs <= 0.0 {
            return Err(DescriptorError::SamplingFrequency(fs));
        }
        if !descriptor.start_time_sec.is_finite() {
            return Err(DescriptorError::StartTime(descriptor.start_time_sec));
        }
        if descriptor.channel_ids.is_empty() {
            return Err(DescriptorError::NoChannels);
        }
        let geometry = ChunkGeometry::new(chunk_size, descriptor.channel_ids.len());
        Ok(Self {
            descriptor,
            geometry,
        })
    }

    /// The descriptor this dataset was built from.
    pub fn descriptor(&self) -> &DatasetDescriptor {
        &self.descriptor
    }

    /// Chunk shape shared by all levels.
    pub fn geometry(&self) -> &ChunkGeometry {
        &self.geometry
    }

    /// Number of base samples per channel.
    pub fn num_frames(&self) -> u64 {
        self.descriptor.num_frames
    }

    /// Number of channels.
    pub fn num_channels(&self) -> usize {
        self.descriptor.channel_ids.len()
    }

    /// Channel identifiers in row order.
    pub fn channel_ids(&self) -> &[u32] {
        &self.descriptor.channel_ids
    }

    /// Base sampling rate in Hz.
    pub fn sampling_frequency(&self) -> f64 {
        self.descriptor.sampling_frequency
    }

    /// Time of the first sample, in seconds.
    pub fn start_time(&self) -> f64 {
        self.descriptor.start_time_sec
    }

    /// Time just past the last sample, in seconds.
    pub fn end_time(&self) -> f64 {
        self.start_time() + self.num_frames() as f64 / self.sampling_frequency()
    }

    /// Time of base sample `index`.
    pub fn sample_time(&self, index: f64) -> f64 {
        self.start_time() + index / self.sampling_frequency()
    }

    /// Fractional base-sample position of time `t`.
    pub fn sample_position(&self, t: f64) -> f64 {
        (t - self.start_time()) * self.sampling_frequency()
    }
}
