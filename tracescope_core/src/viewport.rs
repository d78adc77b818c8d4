// Copyright 2025 the Tracescope Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visible time windows and dwell tracking.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// The visible time window, in seconds.
///
/// Owned by the host's time-range store; the core only reads it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Left edge of the visible window.
    pub start: f64,
    /// Right edge of the visible window.
    pub end: f64,
}

impl Viewport {
    /// Creates a viewport.
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Visible duration in seconds (may be zero or negative during layout transitions).
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Whether the window is empty, inverted or not finite.
    pub fn is_degenerate(&self) -> bool {
        !(self.start.is_finite() && self.end.is_finite()) || self.end <= self.start
    }
}

/// Tracks how long the viewport has been stationary.
///
/// The dwell flag drops whenever the visible window or the amplitude scale changes and rises
/// again once nothing has changed for `dwell_time`. Callers pass `now` explicitly so the
/// tracker stays deterministic under test.
#[derive(Clone, Debug)]
pub struct DwellTracker {
    dwell_time: Duration,
    last: Option<(Viewport, f64)>,
    since: Option<Instant>,
}

impl DwellTracker {
    /// Creates a tracker that reports dwelling after `dwell_time` without change.
    pub fn new(dwell_time: Duration) -> Self {
        Self {
            dwell_time,
            last: None,
            since: None,
        }
    }

    /// Records the state seen by the current pass.
    ///
    /// Returns `true` when it differs from the previous observation.
    pub fn observe(&mut self, viewport: Viewport, amplitude: f64, now: Instant) -> bool {
        let state = (viewport, amplitude);
        if self.last == Some(state) {
            return false;
        }
        self.last = Some(state);
        self.since = Some(now);
        true
    }

    /// Whether the last observed state has been stable for at least the dwell time.
    pub fn is_dwelling(&self, now: Instant) -> bool {
        self.since
            .is_some_and(|since| now.saturating_duration_since(since) >= self.dwell_time)
    }

    /// Time left until [`DwellTracker::is_dwelling`] turns true, if it has not yet.
    ///
    /// Hosts schedule one more pass after this delay to pick up the finer level.
    pub fn time_until_dwell(&self, now: Instant) -> Option<Duration> {
        let since = self.since?;
        let elapsed = now.saturating_duration_since(since);
        (elapsed < self.dwell_time).then(|| self.dwell_time - elapsed)
    }
}
