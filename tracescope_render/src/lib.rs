// Copyright 2025 the Tracescope Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Level-of-detail trace rendering for `tracescope_core`.
//!
//! This crate turns a viewport over a chunked recording into drawing calls:
//! - **Scales** map time and value into canvas coordinates.
//! - The **projector** reads the buckets of a [`LodWindow`] out of the cache and places them in
//!   each channel's panel, keeping unresolved buckets as `NaN` gaps.
//! - **Layers** (time axis, cursor, traces) paint a composed [`Frame`] onto a [`DrawSurface`].
//! - [`TraceViewer`] ties it together, one non-blocking pass per state change.
//!
//! Text shaping and rasterization are out of scope; the [`DrawSurface`] implementation owns
//! them.
//!
//! [`LodWindow`]: tracescope_core::LodWindow

mod amplitude;
mod axis;
mod cursor;
mod frame;
mod layout;
mod projector;
mod scale;
mod style;
mod surface;
mod time;
mod trace;
mod viewer;

pub use amplitude::AmplitudeScale;
pub use axis::paint_time_axis;
pub use cursor::{CursorPixels, Selection, paint_cursor};
pub use frame::{Frame, FrameContent, LOADING_TEXT, ZOOM_IN_TEXT};
pub use layout::{Margins, PanelLayout, Size};
pub use projector::{BucketValues, PixelPanel, PixelProjector, WindowData};
pub use scale::{ScaleLinear, TimeScale};
pub use style::{AxisStyle, CursorStyle, StrokeStyle, TextStyle, ViewerStyle, channel_color};
pub use surface::{DrawCommand, DrawSurface, RecordingSurface, TextAnchor, TextBaseline};
pub use time::{
    TimeTick, format_time_seconds, major_time_step_seconds, nice_time_step_seconds, time_ticks,
};
pub use trace::trace_path;
pub use viewer::TraceViewer;
