// Copyright 2025 the Tracescope Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A tiny arrange pass for stacked channel panels.
//!
//! The canvas is split into a plot rectangle (canvas minus [`Margins`]) which is then divided
//! into one horizontal panel per channel, top to bottom, separated by `panel_spacing`.

use kurbo::Rect;
use serde::{Deserialize, Serialize};

/// A width/height pair in canvas pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl Size {
    /// Creates a size.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Space reserved around the plot rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margins {
    /// Left margin.
    pub left: f64,
    /// Right margin.
    pub right: f64,
    /// Top margin.
    pub top: f64,
    /// Bottom margin; holds the time axis labels.
    pub bottom: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            left: 30.0,
            right: 20.0,
            top: 20.0,
            bottom: 50.0,
        }
    }
}

/// Output of the arrange pass.
#[derive(Clone, Debug, PartialEq)]
pub struct PanelLayout {
    /// Canvas bounds.
    pub view: Rect,
    /// Canvas minus margins; the time axis spans its width.
    pub plot: Rect,
    /// One rectangle per channel, top to bottom.
    pub panels: Vec<Rect>,
}

impl PanelLayout {
    /// Lays out `channels` panels on a canvas of `size`.
    ///
    /// Negative extents collapse to zero-sized rectangles rather than inverting.
    pub fn arrange(size: Size, margins: &Margins, panel_spacing: f64, channels: usize) -> Self {
        let width = size.width.max(0.0);
        let height = size.height.max(0.0);
        let view = Rect::new(0.0, 0.0, width, height);

        let x0 = margins.left.min(width);
        let y0 = margins.top.min(height);
        let plot = Rect::new(
            x0,
            y0,
            (width - margins.right).max(x0),
            (height - margins.bottom).max(y0),
        );

        let spacing = panel_spacing.max(0.0);
        let gaps = spacing * channels.saturating_sub(1) as f64;
        let panel_height = if channels == 0 {
            0.0
        } else {
            ((plot.height() - gaps) / channels as f64).max(0.0)
        };
        let panels = (0..channels)
            .map(|i| {
                let top = plot.y0 + i as f64 * (panel_height + spacing);
                Rect::new(plot.x0, top, plot.x1, top + panel_height)
            })
            .collect();

        Self { view, plot, panels }
    }

    /// Width of the plot (and of every panel).
    pub fn plot_width(&self) -> f64 {
        self.plot.width()
    }
}
