// Copyright 2025 the Tracescope Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The user-controlled amplitude factor.

/// Multiplicative factor applied to sample values before vertical scaling.
///
/// Always finite and positive.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct AmplitudeScale(f64);

impl AmplitudeScale {
    /// Ratio applied by [`AmplitudeScale::scaled_up`] and [`AmplitudeScale::scaled_down`].
    pub const STEP: f64 = 1.3;

    /// Creates a scale; non-finite or non-positive factors fall back to `1.0`.
    pub fn new(factor: f64) -> Self {
        if factor.is_finite() && factor > 0.0 {
            Self(factor)
        } else {
            Self(1.0)
        }
    }

    /// The factor.
    pub fn factor(self) -> f64 {
        self.0
    }

    /// One toolbar step larger, saturating at the largest finite factor.
    #[must_use]
    pub fn scaled_up(self) -> Self {
        self.stepped(self.0 * Self::STEP)
    }

    /// One toolbar step smaller, never reaching zero.
    #[must_use]
    pub fn scaled_down(self) -> Self {
        self.stepped(self.0 / Self::STEP)
    }

    fn stepped(self, factor: f64) -> Self {
        if factor.is_finite() && factor > 0.0 {
            Self(factor)
        } else {
            self
        }
    }

    /// Applies the factor to `value`.
    pub fn apply(self, value: f64) -> f64 {
        value * self.0
    }
}

impl Default for AmplitudeScale {
    fn default() -> Self {
        Self(1.0)
    }
}
