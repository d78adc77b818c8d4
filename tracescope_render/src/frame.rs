// Copyright 2025 the Tracescope Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The result of one render pass.
//!
//! A [`Frame`] holds everything a pass computed: layout, ticks, cursor columns and per-channel
//! geometry. Painting it is a pure replay onto a [`DrawSurface`], so the same frame can be
//! drawn to a live canvas and to an exporter.

use kurbo::Point;
use tracescope_core::{ChunkKey, LodWindow};

use crate::axis::paint_time_axis;
use crate::cursor::{CursorPixels, paint_cursor};
use crate::layout::{PanelLayout, Size};
use crate::projector::PixelPanel;
use crate::style::{StrokeStyle, ViewerStyle};
use crate::surface::{DrawSurface, TextAnchor, TextBaseline};
use crate::time::TimeTick;
use crate::trace::trace_path;

/// Text drawn instead of traces when the window exceeds the point cap.
pub const ZOOM_IN_TEXT: &str = "Zoom in to view traces";
/// Text drawn while chunks needed by the pass are unresolved.
pub const LOADING_TEXT: &str = "Loading data...";

const ZOOM_IN_POS: Point = Point::new(50.0, 50.0);
const LOADING_POS: Point = Point::new(200.0, 4.0);

/// What the plot area shows.
#[derive(Clone, Debug, PartialEq)]
pub enum FrameContent {
    /// The window is too wide; only the placeholder text is drawn.
    ZoomInRequired,
    /// Axes, cursor and one trace per channel.
    Traces {
        /// The window drawn, or `None` when nothing of the dataset is visible.
        window: Option<LodWindow>,
        /// One panel per channel with values; empty until the value ranges are known.
        panels: Vec<PixelPanel>,
    },
}

/// One composed render pass.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    /// Canvas size the frame was composed for.
    pub size: Size,
    /// Plot and channel panel rectangles.
    pub layout: PanelLayout,
    /// Time axis ticks.
    pub ticks: Vec<TimeTick>,
    /// Cursor overlay columns.
    pub cursor: CursorPixels,
    /// Plot contents.
    pub content: FrameContent,
    /// Chunks the pass needed but did not have.
    pub pending: Vec<ChunkKey>,
}

impl Frame {
    /// Whether the loading indicator is shown.
    pub fn is_loading(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Whether the zoom-in placeholder replaces the plot.
    pub fn is_zoom_in_required(&self) -> bool {
        matches!(self.content, FrameContent::ZoomInRequired)
    }

    /// Channel panels with geometry (empty for the placeholder).
    pub fn panels(&self) -> &[PixelPanel] {
        match &self.content {
            FrameContent::Traces { panels, .. } => panels,
            FrameContent::ZoomInRequired => &[],
        }
    }

    /// Clears `surface` and draws the frame onto it.
    ///
    /// Layers go bottom to top: time axis, cursor, traces, then the loading indicator.
    pub fn paint(&self, surface: &mut (impl DrawSurface + ?Sized), style: &ViewerStyle) {
        surface.clear();
        match &self.content {
            FrameContent::ZoomInRequired => {
                surface.fill_text(
                    ZOOM_IN_TEXT,
                    ZOOM_IN_POS,
                    &style.zoom_in_text,
                    TextAnchor::Start,
                    TextBaseline::Alphabetic,
                );
                return;
            }
            FrameContent::Traces { panels, .. } => {
                paint_time_axis(surface, self.layout.plot, &self.ticks, &style.axis);
                paint_cursor(surface, self.layout.plot, &self.cursor, &style.cursor);
                for panel in panels {
                    let path = trace_path(panel);
                    if path.elements().is_empty() {
                        continue;
                    }
                    let stroke = StrokeStyle::solid(panel.color, style.trace_width);
                    surface.stroke_path(&path, &stroke);
                }
            }
        }
        if self.is_loading() {
            surface.fill_text(
                LOADING_TEXT,
                LOADING_POS,
                &style.loading_text,
                TextAnchor::Start,
                TextBaseline::Top,
            );
        }
    }
}
