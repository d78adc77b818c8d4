// Copyright 2025 the Tracescope Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Time tick generation and formatting helpers.
//!
//! Time is a numeric value in **seconds**. Recordings are sampled at kHz rates, so steps go
//! down to a millisecond as well as up to hours:
//! - "nice" tick steps from 1 ms to 12 h
//! - a major/minor split, where major ticks fall on a coarser nice step
//! - formatting for tick labels (e.g. `1:05`, `2:03:00`, `4.250`)

use crate::scale::TimeScale;

// Candidate steps in seconds. Each entry after the first is a multiple of some earlier one so
// that a major step can always be found.
const STEPS: &[f64] = &[
    0.001,
    0.002,
    0.005,
    0.01,
    0.02,
    0.05,
    0.1,
    0.2,
    0.5,
    1.0,
    2.0,
    5.0,
    10.0,
    15.0,
    30.0,
    60.0,
    2.0 * 60.0,
    5.0 * 60.0,
    10.0 * 60.0,
    15.0 * 60.0,
    30.0 * 60.0,
    60.0 * 60.0,
    2.0 * 60.0 * 60.0,
    3.0 * 60.0 * 60.0,
    6.0 * 60.0 * 60.0,
    12.0 * 60.0 * 60.0,
];

/// A labelled time tick, already projected into canvas space.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeTick {
    /// Tick time in seconds.
    pub value: f64,
    /// Canvas x.
    pub x: f64,
    /// Formatted label.
    pub label: String,
    /// Whether the tick lies on the coarser major step.
    pub major: bool,
}

/// Returns the smallest nice step (seconds) that is at least `step`.
pub fn nice_time_step_seconds(step: f64) -> f64 {
    if !step.is_finite() || step <= 0.0 {
        return 0.0;
    }
    for &s in STEPS {
        if s >= step {
            return s;
        }
    }
    let hours = (step / 3600.0).ceil();
    hours.max(1.0) * 3600.0
}

/// The step on which major ticks fall, for ticks spaced `step` apart.
pub fn major_time_step_seconds(step: f64) -> f64 {
    STEPS
        .iter()
        .copied()
        .find(|&s| s >= 2.0 * step && is_multiple(s, step))
        .unwrap_or(step * 2.0)
}

fn is_multiple(v: f64, step: f64) -> bool {
    let n = (v / step).round();
    (n * step - v).abs() <= step * 1e-6
}

/// Ticks for the visible window of `scale`, at least `min_spacing` pixels apart.
///
/// Returns nothing for a degenerate scale.
pub fn time_ticks(scale: &TimeScale, min_spacing: f64) -> Vec<TimeTick> {
    let pps = scale.pixels_per_second();
    if pps <= 0.0 || !pps.is_finite() {
        return Vec::new();
    }
    let step = nice_time_step_seconds(min_spacing.max(1.0) / pps);
    if step == 0.0 {
        return Vec::new();
    }
    let major = major_time_step_seconds(step);
    let viewport = scale.viewport();

    let first = (viewport.start / step).ceil();
    let n_f = ((viewport.end / step).floor() - first).min(10_000.0);
    if n_f.is_nan() || n_f < 0.0 {
        return Vec::new();
    }
    #[allow(
        clippy::cast_possible_truncation,
        reason = "guarded by the non-negative check and capped at 10k"
    )]
    let n = n_f as u64;

    (0..=n)
        .map(|i| {
            let value = (first + i as f64) * step;
            TimeTick {
                value,
                x: scale.map(value),
                label: format_time_seconds(value, step),
                major: is_multiple(value, major),
            }
        })
        .collect()
}

/// Number of fractional digits needed to tell ticks `step` apart.
fn step_decimals(step: f64) -> usize {
    if step.is_nan() || step <= 0.0 || step >= 1.0 {
        return 0;
    }
    let digits = (-step.log10() - 1e-9).ceil().clamp(0.0, 6.0);
    #[allow(clippy::cast_possible_truncation, reason = "clamped to 0..=6")]
    {
        digits as usize
    }
}

/// Formats a tick value (seconds) given the tick step (seconds).
pub fn format_time_seconds(v: f64, step: f64) -> String {
    if !v.is_finite() {
        return format!("{v}");
    }

    let decimals = step_decimals(step.abs());
    let units_per_sec = 10_i64.pow(u32::try_from(decimals).unwrap_or(0));
    let units = {
        let units_f = (v.abs() * units_per_sec as f64)
            .round()
            .clamp(0.0, i64::MAX as f64);
        #[allow(clippy::cast_possible_truncation, reason = "clamped to the i64 range")]
        {
            units_f as i64
        }
    };
    let sign = if units > 0 && v < 0.0 { "-" } else { "" };
    let secs = units / units_per_sec;
    let frac = units % units_per_sec;
    let step = step.abs();

    let h = secs / 3600;
    let m = (secs / 60) % 60;
    let s = secs % 60;
    let frac = if decimals > 0 {
        format!(".{frac:0decimals$}")
    } else {
        String::new()
    };

    if step >= 3600.0 || h > 0 {
        format!("{sign}{h}:{m:02}:{s:02}{frac}")
    } else if step >= 60.0 || m > 0 {
        format!("{sign}{m}:{s:02}{frac}")
    } else {
        format!("{sign}{s}{frac}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tracescope_core::Viewport;

    #[test]
    fn steps_cover_milliseconds_to_hours() {
        assert_eq!(nice_time_step_seconds(0.0007), 0.001);
        assert_eq!(nice_time_step_seconds(0.3), 0.5);
        assert_eq!(nice_time_step_seconds(40.0), 60.0);
        assert_eq!(nice_time_step_seconds(50_000.0), 14.0 * 3600.0);
        assert_eq!(nice_time_step_seconds(-1.0), 0.0);
    }

    #[test]
    fn major_steps_are_multiples() {
        assert_eq!(major_time_step_seconds(1.0), 2.0);
        assert_eq!(major_time_step_seconds(2.0), 10.0);
        assert_eq!(major_time_step_seconds(10.0), 30.0);
        assert_eq!(major_time_step_seconds(0.005), 0.01);
    }

    #[test]
    fn ticks_respect_spacing_and_window() {
        let scale = TimeScale::new(Viewport::new(0.0, 10.0), 30.0, 630.0);
        let ticks = time_ticks(&scale, 50.0);
        // 60 px per second; 50 px needs a 1 s step.
        assert_eq!(ticks.len(), 11);
        assert_eq!(ticks[0].x, 30.0);
        assert_eq!(ticks[10].x, 630.0);
        assert!(ticks[0].major);
        assert!(!ticks[1].major);
        assert_eq!(ticks[3].label, "3");
        for pair in ticks.windows(2) {
            assert!(pair[1].x - pair[0].x >= 50.0);
        }
    }

    #[test]
    fn degenerate_scale_has_no_ticks() {
        let scale = TimeScale::new(Viewport::new(1.0, 1.0), 30.0, 630.0);
        assert!(time_ticks(&scale, 50.0).is_empty());
    }

    #[test]
    fn time_format_seconds_minutes_hours() {
        assert_eq!(format_time_seconds(5.0, 1.0), "5");
        assert_eq!(format_time_seconds(65.0, 1.0), "1:05");
        assert_eq!(format_time_seconds(3723.0, 60.0), "1:02:03");
    }

    #[test]
    fn time_format_sub_second() {
        assert_eq!(format_time_seconds(1.25, 0.05), "1.25");
        assert_eq!(format_time_seconds(65.5, 0.5), "1:05.5");
        assert_eq!(format_time_seconds(0.002, 0.001), "0.002");
        assert_eq!(format_time_seconds(-0.5, 0.5), "-0.5");
        assert_eq!(format_time_seconds(-0.0, 1.0), "0");
    }
}
