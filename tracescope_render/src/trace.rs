// Copyright 2025 the Tracescope Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trace path construction.

use kurbo::BezPath;

use crate::projector::PixelPanel;

/// Builds the stroked path for one channel panel.
///
/// Raw panels become a polyline through every defined bucket. Envelope panels draw, per
/// bucket, a vertical segment from min to max, connected from the previous bucket's min.
/// Either way an undefined bucket (`NaN`) breaks the path: the next defined bucket starts a
/// new subpath.
pub fn trace_path(panel: &PixelPanel) -> BezPath {
    let mut path = BezPath::new();
    match &panel.pixel_values_max {
        Some(max) => {
            let rows = panel
                .pixel_times
                .iter()
                .zip(&panel.pixel_values_min)
                .zip(max);
            let mut prev_min = None;
            for ((&t, &lo), &hi) in rows {
                if !(is_defined(t) && is_defined(lo) && is_defined(hi)) {
                    prev_min = None;
                    continue;
                }
                if let Some(prev) = prev_min {
                    path.move_to(prev);
                    path.line_to((t, lo));
                } else {
                    path.move_to((t, lo));
                }
                path.line_to((t, hi));
                prev_min = Some((t, lo));
            }
        }
        None => {
            let mut pen_down = false;
            for (&t, &v) in panel.pixel_times.iter().zip(&panel.pixel_values_min) {
                if !(is_defined(t) && is_defined(v)) {
                    pen_down = false;
                    continue;
                }
                if pen_down {
                    path.line_to((t, v));
                } else {
                    path.move_to((t, v));
                }
                pen_down = true;
            }
        }
    }
    path
}

fn is_defined(v: f64) -> bool {
    v.is_finite()
}
