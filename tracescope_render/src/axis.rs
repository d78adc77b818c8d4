// Copyright 2025 the Tracescope Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The time axis layer: gridlines, tick labels and the x-axis line.

use kurbo::{Point, Rect};

use crate::style::AxisStyle;
use crate::surface::{DrawSurface, TextAnchor, TextBaseline, stroke_line};
use crate::time::TimeTick;

/// Draws the time axis for `plot`.
///
/// Each tick inside the plot's horizontal extent gets a gridline running from the plot top
/// (or from the x-axis when gridlines are hidden) to `tick_overhang` below the x-axis, and a
/// label centred `label_offset` below that. The x-axis line runs along the plot bottom.
pub fn paint_time_axis(
    surface: &mut (impl DrawSurface + ?Sized),
    plot: Rect,
    ticks: &[TimeTick],
    style: &AxisStyle,
) {
    let axis_y = plot.y1;
    let grid_top = if style.hide_x_gridlines {
        axis_y
    } else {
        plot.y0
    };
    let grid_bottom = axis_y + style.tick_overhang;

    for tick in ticks {
        if !tick.x.is_finite() || tick.x < plot.x0 || tick.x > plot.x1 {
            continue;
        }
        let (stroke, text) = if tick.major {
            (&style.major_grid, &style.major_label)
        } else {
            (&style.minor_grid, &style.minor_label)
        };
        stroke_line(surface, (tick.x, grid_top), (tick.x, grid_bottom), stroke);
        surface.fill_text(
            &tick.label,
            Point::new(tick.x, grid_bottom + style.label_offset),
            text,
            TextAnchor::Middle,
            TextBaseline::Top,
        );
    }

    stroke_line(
        surface,
        (plot.x0, axis_y),
        (plot.x1, axis_y),
        &style.axis_line,
    );
}
