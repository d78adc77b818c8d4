// Copyright 2025 the Tracescope Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Multi-resolution data model for `tracescope`.
//!
//! Recordings are served as a pyramid of fixed-size chunks, each level downsampled by a factor
//! of three from the one below it. This crate holds everything that does not draw:
//! - **Chunks** and their bucket arithmetic ([`Level`], [`ChunkKey`], [`ChunkGeometry`]).
//! - The [`ChunkStore`] seam and the deduplicating [`FetchCache`] in front of it.
//! - **Level selection** ([`LodSelector`]) driven by window size, pixel width and dwell state.
//! - **Value ranges** ([`ChannelRanges`]) measured on the overview chunk.
//!
//! Drawing lives in `tracescope_render`.

mod cache;
mod chunk;
mod dataset;
mod lod;
mod range;
mod store;
mod viewport;

pub use cache::{EntryStatus, FetchCache};
pub use chunk::{Chunk, ChunkError, ChunkGeometry, ChunkKey, ChunkRows, InvalidLevel, Level};
pub use dataset::{Dataset, DatasetDescriptor, DescriptorError};
pub use lod::{
    LodConfig, LodSelection, LodSelector, LodWindow, highest_level, select_level,
};
pub use range::{ChannelRanges, ValueRange, channel_ranges, equalize_spans};
pub use store::{ChunkStore, FnChunkStore, StoreError};
pub use viewport::{DwellTracker, Viewport};
