// Copyright 2025 the Tracescope Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The cursor overlay: current-time line and current-time interval.

use kurbo::Rect;
use serde::{Deserialize, Serialize};

use crate::scale::TimeScale;
use crate::style::CursorStyle;
use crate::surface::{DrawSurface, stroke_line};

/// Time selection state owned by the host.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// The current time, in seconds.
    pub current_time: Option<f64>,
    /// The current-time interval `(start, end)`, in seconds.
    pub current_interval: Option<(f64, f64)>,
}

/// A [`Selection`] projected into canvas columns.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CursorPixels {
    /// Column of the current time, when it lies inside the plot.
    pub current_x: Option<f64>,
    /// Columns of the interval, clipped to the plot.
    pub interval: Option<(f64, f64)>,
}

impl CursorPixels {
    /// Projects `selection` through `time`, clipping to the columns of `plot`.
    pub fn project(selection: &Selection, time: &TimeScale, plot: Rect) -> Self {
        if time.is_degenerate() {
            return Self::default();
        }
        let current_x = selection
            .current_time
            .map(|t| time.map(t))
            .filter(|x| x.is_finite() && (plot.x0..=plot.x1).contains(x));
        let interval = selection.current_interval.and_then(|(t0, t1)| {
            let (a, b) = (time.map(t0), time.map(t1));
            let (a, b) = (a.min(b).max(plot.x0), a.max(b).min(plot.x1));
            (a.is_finite() && b.is_finite() && a < b).then_some((a, b))
        });
        Self {
            current_x,
            interval,
        }
    }
}

/// Shades the interval over the plot's height, then draws the current-time line.
pub fn paint_cursor(
    surface: &mut (impl DrawSurface + ?Sized),
    plot: Rect,
    cursor: &CursorPixels,
    style: &CursorStyle,
) {
    if let Some((x0, x1)) = cursor.interval {
        surface.fill_rect(Rect::new(x0, plot.y0, x1, plot.y1), &style.interval_fill);
    }
    if let Some(x) = cursor.current_x {
        stroke_line(surface, (x, plot.y0), (x, plot.y1), &style.current_time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tracescope_core::Viewport;

    use crate::layout::Size;
    use crate::surface::{DrawCommand, RecordingSurface};

    const PLOT: Rect = Rect::new(30.0, 20.0, 630.0, 420.0);

    fn scale() -> TimeScale {
        TimeScale::new(Viewport::new(0.0, 60.0), PLOT.x0, PLOT.x1)
    }

    #[test]
    fn projection_clips_to_the_plot() {
        let selection = Selection {
            current_time: Some(90.0),
            current_interval: Some((30.0, 120.0)),
        };
        let px = CursorPixels::project(&selection, &scale(), PLOT);
        assert_eq!(px.current_x, None);
        assert_eq!(px.interval, Some((330.0, 630.0)));
    }

    #[test]
    fn interval_is_painted_under_the_line() {
        let selection = Selection {
            current_time: Some(6.0),
            current_interval: Some((3.0, 9.0)),
        };
        let px = CursorPixels::project(&selection, &scale(), PLOT);
        let mut surface = RecordingSurface::new(Size::new(650.0, 470.0));
        paint_cursor(&mut surface, PLOT, &px, &CursorStyle::default());
        let commands = surface.commands();
        assert_eq!(commands.len(), 2);
        assert!(
            matches!(commands[0], DrawCommand::FillRect { rect, .. } if rect == Rect::new(60.0, 20.0, 120.0, 420.0)),
            "interval fill first: {commands:?}"
        );
        assert!(
            matches!(commands[1], DrawCommand::Stroke { .. }),
            "then the line"
        );
    }

    #[test]
    fn degenerate_scale_draws_nothing() {
        let selection = Selection {
            current_time: Some(0.0),
            current_interval: Some((0.0, 1.0)),
        };
        let time = TimeScale::new(Viewport::new(5.0, 5.0), PLOT.x0, PLOT.x1);
        assert_eq!(
            CursorPixels::project(&selection, &time, PLOT),
            CursorPixels::default()
        );
    }
}
