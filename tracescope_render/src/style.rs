// Copyright 2025 the Tracescope Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paint and font settings for every layer of the viewer.

use peniko::color::palette::css;
use peniko::{Brush, Color};

use crate::layout::Margins;

/// A paint + width pair for stroked paths (traces, ticks, gridlines).
#[derive(Clone, Debug, PartialEq)]
pub struct StrokeStyle {
    /// Stroke paint.
    pub brush: Brush,
    /// Stroke width in pixels.
    pub stroke_width: f64,
}

impl StrokeStyle {
    /// Convenience for a solid stroke.
    pub fn solid(brush: impl Into<Brush>, stroke_width: f64) -> Self {
        Self {
            brush: brush.into(),
            stroke_width,
        }
    }
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self::solid(css::BLACK, 1.0)
    }
}

/// Fill + size for text.
#[derive(Clone, Debug, PartialEq)]
pub struct TextStyle {
    /// Text paint.
    pub fill: Brush,
    /// Font size in pixels.
    pub font_size: f64,
}

impl TextStyle {
    /// Text in a solid color.
    pub fn solid(fill: impl Into<Brush>, font_size: f64) -> Self {
        Self {
            fill: fill.into(),
            font_size,
        }
    }
}

/// Time axis styling.
#[derive(Clone, Debug, PartialEq)]
pub struct AxisStyle {
    /// Gridline at a major tick.
    pub major_grid: StrokeStyle,
    /// Gridline at a minor tick.
    pub minor_grid: StrokeStyle,
    /// Label under a major tick.
    pub major_label: TextStyle,
    /// Label under a minor tick.
    pub minor_label: TextStyle,
    /// The x-axis line.
    pub axis_line: StrokeStyle,
    /// How far gridlines reach below the x-axis.
    pub tick_overhang: f64,
    /// Gap between a gridline's lower end and its label.
    pub label_offset: f64,
    /// Minimum pixel distance between adjacent ticks.
    pub min_tick_spacing: f64,
    /// Stop gridlines at the x-axis instead of running them up through the plot.
    pub hide_x_gridlines: bool,
}

impl Default for AxisStyle {
    fn default() -> Self {
        Self {
            major_grid: StrokeStyle::solid(css::GRAY, 1.0),
            minor_grid: StrokeStyle::solid(css::LIGHT_GRAY, 1.0),
            major_label: TextStyle::solid(css::BLACK, 10.0),
            minor_label: TextStyle::solid(css::GRAY, 10.0),
            axis_line: StrokeStyle::default(),
            tick_overhang: 5.0,
            label_offset: 2.0,
            min_tick_spacing: 60.0,
            hide_x_gridlines: false,
        }
    }
}

/// Cursor overlay styling.
#[derive(Clone, Debug, PartialEq)]
pub struct CursorStyle {
    /// The current-time line.
    pub current_time: StrokeStyle,
    /// Fill of the current-time interval.
    pub interval_fill: Brush,
}

impl Default for CursorStyle {
    fn default() -> Self {
        Self {
            current_time: StrokeStyle::solid(css::BLUE, 1.0),
            interval_fill: Brush::Solid(Color::from_rgba8(255, 225, 225, 102)),
        }
    }
}

/// Everything the renderer needs to know about looks.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewerStyle {
    /// Space around the plot.
    pub margins: Margins,
    /// Vertical gap between channel panels.
    pub panel_spacing: f64,
    /// Width of trace strokes.
    pub trace_width: f64,
    /// Time axis.
    pub axis: AxisStyle,
    /// Cursor overlay.
    pub cursor: CursorStyle,
    /// Text shown instead of traces when the window is too wide.
    pub zoom_in_text: TextStyle,
    /// Text shown while needed chunks are still loading.
    pub loading_text: TextStyle,
}

impl Default for ViewerStyle {
    fn default() -> Self {
        Self {
            margins: Margins::default(),
            panel_spacing: 0.0,
            trace_width: 1.0,
            axis: AxisStyle::default(),
            cursor: CursorStyle::default(),
            zoom_in_text: TextStyle::solid(Color::from_rgb8(100, 100, 155), 30.0),
            loading_text: TextStyle::solid(css::GRAY, 18.0),
        }
    }
}

impl ViewerStyle {
    /// Sets the margins.
    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }

    /// Sets the gap between channel panels.
    pub fn with_panel_spacing(mut self, spacing: f64) -> Self {
        self.panel_spacing = spacing.max(0.0);
        self
    }

    /// Hides or shows the vertical gridlines.
    pub fn with_hidden_x_gridlines(mut self, hide: bool) -> Self {
        self.axis.hide_x_gridlines = hide;
        self
    }
}

const PALETTE: [[u8; 3]; 10] = [
    [0x1f, 0x77, 0xb4],
    [0xff, 0x7f, 0x0e],
    [0x2c, 0xa0, 0x2c],
    [0xd6, 0x27, 0x28],
    [0x94, 0x67, 0xbd],
    [0x8c, 0x56, 0x4b],
    [0xe3, 0x77, 0xc2],
    [0x7f, 0x7f, 0x7f],
    [0xbc, 0xbd, 0x22],
    [0x17, 0xbe, 0xcf],
];

/// Trace color for the channel at row position `channel`.
pub fn channel_color(channel: usize) -> Color {
    let [r, g, b] = PALETTE[channel % PALETTE.len()];
    Color::from_rgb8(r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_cycles() {
        assert_eq!(channel_color(0), channel_color(10));
        assert_ne!(channel_color(0), channel_color(1));
    }

    #[test]
    fn placeholder_color_matches_viewer_default() {
        let style = ViewerStyle::default();
        let Brush::Solid(c) = style.zoom_in_text.fill else {
            panic!("solid fill expected");
        };
        let rgba = c.to_rgba8();
        assert_eq!((rgba.r, rgba.g, rgba.b), (100, 100, 155));
        assert_eq!(style.zoom_in_text.font_size, 30.0);
    }
}
