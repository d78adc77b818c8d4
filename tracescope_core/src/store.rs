// Copyright 2025 the Tracescope Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The chunk store seam.
//!
//! The viewer never reads sample data directly. It asks a [`ChunkStore`] for whole chunks,
//! which may come from a network service, a memory-mapped file, or a synthetic generator.

use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use thiserror::Error;

use crate::chunk::{ChunkKey, ChunkRows};

/// Errors reported by a [`ChunkStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store has no data for the requested chunk.
    #[error("chunk {key} is not available: {reason}")]
    Unavailable {
        /// Requested chunk.
        key: ChunkKey,
        /// Store-provided explanation.
        reason: String,
    },
    /// The backend failed (I/O, transport, decoding).
    #[error("chunk store backend failed: {0}")]
    Backend(#[source] Box<dyn StdError + Send + Sync>),
}

impl StoreError {
    /// Wraps a backend error.
    pub fn backend(err: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self::Backend(err.into())
    }
}

/// Asynchronous source of chunk rows.
///
/// Level-1 requests return [`ChunkRows::Raw`]; coarser levels return
/// [`ChunkRows::Envelope`]. The returned future must not borrow the store so that fetches
/// can outlive the render pass that issued them.
pub trait ChunkStore: Send + Sync + 'static {
    /// Starts fetching `key`.
    fn fetch(&self, key: ChunkKey) -> BoxFuture<'static, Result<ChunkRows, StoreError>>;
}

impl<T: ChunkStore + ?Sized> ChunkStore for Arc<T> {
    fn fetch(&self, key: ChunkKey) -> BoxFuture<'static, Result<ChunkRows, StoreError>> {
        (**self).fetch(key)
    }
}

/// A [`ChunkStore`] backed by a closure returning a future.
pub struct FnChunkStore<F> {
    fetch: F,
}

impl<F> FnChunkStore<F> {
    /// Wraps `fetch`.
    pub fn new(fetch: F) -> Self {
        Self { fetch }
    }
}

impl<F> fmt::Debug for FnChunkStore<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnChunkStore").finish_non_exhaustive()
    }
}

impl<F, Fut> ChunkStore for FnChunkStore<F>
where
    F: Fn(ChunkKey) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ChunkRows, StoreError>> + Send + 'static,
{
    fn fetch(&self, key: ChunkKey) -> BoxFuture<'static, Result<ChunkRows, StoreError>> {
        (self.fetch)(key).boxed()
    }
}
