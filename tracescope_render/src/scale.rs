// Copyright 2025 the Tracescope Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tiny scale utilities.
//!
//! [`ScaleLinear`] maps data values into panel rows; [`TimeScale`] maps seconds into canvas
//! columns. Both are total: degenerate inputs produce a fixed pixel instead of NaN or a panic.

use tracescope_core::Viewport;

/// A linear mapping from a continuous domain to a continuous range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleLinear {
    domain: (f64, f64),
    range: (f64, f64),
}

impl ScaleLinear {
    /// Creates a new scale mapping `domain` values to `range` values.
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    /// Maps a value from domain space into range space.
    ///
    /// An empty domain maps everything to the start of the range.
    pub fn map(&self, x: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let denom = d1 - d0;
        if denom == 0.0 {
            return r0;
        }
        let t = (x - d0) / denom;
        r0 + t * (r1 - r0)
    }

    /// Returns the configured domain.
    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    /// Returns the configured range.
    pub fn range(&self) -> (f64, f64) {
        self.range
    }
}

/// Affine map from seconds to canvas x, derived from the visible window and the plot columns.
///
/// A degenerate window (empty, inverted or non-finite) maps every time to `0.0`, so transient
/// layout states draw nothing sensible but never fail.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeScale {
    viewport: Viewport,
    x0: f64,
    x1: f64,
}

impl TimeScale {
    /// Maps `viewport` onto the columns `x0..x1`.
    pub fn new(viewport: Viewport, x0: f64, x1: f64) -> Self {
        Self { viewport, x0, x1 }
    }

    /// The visible window.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Left plot column.
    pub fn x0(&self) -> f64 {
        self.x0
    }

    /// Right plot column.
    pub fn x1(&self) -> f64 {
        self.x1
    }

    /// Whether the scale collapses to pixel `0`.
    pub fn is_degenerate(&self) -> bool {
        self.viewport.is_degenerate()
    }

    /// Canvas x of time `t`.
    pub fn map(&self, t: f64) -> f64 {
        if self.is_degenerate() {
            return 0.0;
        }
        let Viewport { start, end } = self.viewport;
        self.x0 + (t - start) / (end - start) * (self.x1 - self.x0)
    }

    /// Pixels per second, or `0.0` when degenerate.
    pub fn pixels_per_second(&self) -> f64 {
        if self.is_degenerate() {
            return 0.0;
        }
        (self.x1 - self.x0) / self.viewport.duration()
    }
}
