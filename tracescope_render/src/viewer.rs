// Copyright 2025 the Tracescope Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The viewport renderer.
//!
//! [`TraceViewer`] owns the per-dataset state that outlives a single pass (the chunk cache,
//! the level selector, dwell tracking, the measured value ranges and the host's amplitude and
//! selection) and turns a viewport into a [`Frame`] on demand.
//!
//! Passes never block. A pass that needs a chunk the cache does not have yet draws what it
//! can, shows the loading indicator and lists the missing keys in [`Frame::pending`]; the host
//! re-renders when the cache reports a resolution (see [`FetchCache::set_observer`]) or when
//! [`TraceViewer::time_until_dwell`] elapses.

use std::fmt;
use std::time::{Duration, Instant};

use futures::task::Spawn;
use tracescope_core::{
    ChannelRanges, ChunkStore, Dataset, DwellTracker, FetchCache, LodConfig, LodSelection,
    LodSelector, Viewport,
};
use tracing::{debug, trace};

use crate::amplitude::AmplitudeScale;
use crate::cursor::{CursorPixels, Selection};
use crate::frame::{Frame, FrameContent};
use crate::layout::{PanelLayout, Size};
use crate::projector::{PixelProjector, WindowData};
use crate::scale::TimeScale;
use crate::style::{ViewerStyle, channel_color};
use crate::surface::DrawSurface;
use crate::time::time_ticks;

/// Renders one dataset through a chunk cache.
pub struct TraceViewer<S, Sp> {
    dataset: Dataset,
    cache: FetchCache<S, Sp>,
    selector: LodSelector,
    style: ViewerStyle,
    amplitude: AmplitudeScale,
    selection: Selection,
    dwell: DwellTracker,
    ranges: Option<ChannelRanges>,
}

impl<S, Sp> fmt::Debug for TraceViewer<S, Sp> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraceViewer")
            .field("dataset", &self.dataset)
            .field("cache", &self.cache)
            .field("selector", &self.selector)
            .field("amplitude", &self.amplitude)
            .field("selection", &self.selection)
            .field("ranges", &self.ranges)
            .finish_non_exhaustive()
    }
}

impl<S: ChunkStore, Sp: Spawn> TraceViewer<S, Sp> {
    /// Creates a viewer fetching `dataset` from `store`, running fetches on `spawner`.
    pub fn new(dataset: Dataset, store: S, spawner: Sp, config: LodConfig) -> Self {
        let cache = FetchCache::new(store, spawner, *dataset.geometry());
        let dwell = DwellTracker::new(config.dwell_time());
        let selector = LodSelector::new(&dataset, config);
        Self {
            dataset,
            cache,
            selector,
            style: ViewerStyle::default(),
            amplitude: AmplitudeScale::default(),
            selection: Selection::default(),
            dwell,
            ranges: None,
        }
    }

    /// Replaces the style.
    #[must_use]
    pub fn with_style(mut self, style: ViewerStyle) -> Self {
        self.style = style;
        self
    }

    /// The dataset being viewed.
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// The chunk cache.
    pub fn cache(&self) -> &FetchCache<S, Sp> {
        &self.cache
    }

    /// The level selector.
    pub fn selector(&self) -> &LodSelector {
        &self.selector
    }

    /// The style in use.
    pub fn style(&self) -> &ViewerStyle {
        &self.style
    }

    /// Replaces the style.
    pub fn set_style(&mut self, style: ViewerStyle) {
        self.style = style;
    }

    /// The amplitude factor.
    pub fn amplitude(&self) -> AmplitudeScale {
        self.amplitude
    }

    /// Sets the amplitude factor. A change restarts the dwell timer on the next pass.
    pub fn set_amplitude(&mut self, amplitude: AmplitudeScale) {
        self.amplitude = amplitude;
    }

    /// The time selection drawn by the cursor layer.
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Sets the time selection.
    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
    }

    /// Per-channel value ranges, once the overview chunk has resolved.
    pub fn ranges(&self) -> Option<&ChannelRanges> {
        self.ranges.as_ref()
    }

    /// Requests the overview chunk and measures the value ranges when it is available.
    ///
    /// Returns whether the ranges are known. Every pass calls this before anything else, so
    /// the overview fetch is always issued first; hosts may call it early to get it going.
    pub fn prefetch_overview(&mut self) -> bool {
        if self.ranges.is_some() {
            return true;
        }
        let Some(overview) = self.cache.get(self.selector.overview_key()) else {
            return false;
        };
        let ranges = ChannelRanges::from_overview(&overview);
        debug!(key = %overview.key(), ?ranges, "measured channel ranges");
        self.ranges = Some(ranges);
        true
    }

    /// How long until the viewport counts as dwelling, if it does not yet.
    ///
    /// A pass composed after this delay may select a finer level.
    pub fn time_until_dwell(&self, now: Instant) -> Option<Duration> {
        self.dwell.time_until_dwell(now)
    }

    /// Composes a frame for `viewport` on a canvas of `size`.
    pub fn compose(&mut self, viewport: Viewport, size: Size, now: Instant) -> Frame {
        self.dwell.observe(viewport, self.amplitude.factor(), now);
        let dwelling = self.dwell.is_dwelling(now);

        let layout = PanelLayout::arrange(
            size,
            &self.style.margins,
            self.style.panel_spacing,
            self.dataset.num_channels(),
        );
        let time = TimeScale::new(viewport, layout.plot.x0, layout.plot.x1);
        let ticks = time_ticks(&time, self.style.axis.min_tick_spacing);
        let cursor = CursorPixels::project(&self.selection, &time, layout.plot);
        let mut frame = Frame {
            size,
            layout,
            ticks,
            cursor,
            content: FrameContent::Traces {
                window: None,
                panels: Vec::new(),
            },
            pending: Vec::new(),
        };

        if self.selector.zoom_in_required(&viewport) {
            debug!(
                start = viewport.start,
                end = viewport.end,
                max_points = self.selector.max_points(),
                "window too wide, asking to zoom in"
            );
            frame.content = FrameContent::ZoomInRequired;
            return frame;
        }

        if !self.prefetch_overview() {
            // Finer levels wait for the ranges they will be scaled by.
            frame.pending.push(self.selector.overview_key());
            return frame;
        }
        let Some(ranges) = self.ranges.as_ref() else {
            return frame;
        };

        let LodSelection::Window(window) =
            self.selector
                .select(&viewport, frame.layout.plot_width(), dwelling)
        else {
            return frame;
        };
        trace!(level = %window.level, buckets = ?window.buckets, dwelling, "selected window");

        let data = WindowData::gather(&self.cache, window);
        frame.pending.extend(data.missing());
        let projector = PixelProjector::new(&self.dataset, time, self.amplitude);
        let panels = ranges
            .as_slice()
            .iter()
            .zip(&frame.layout.panels)
            .enumerate()
            .map(|(channel, (range, rect))| {
                projector.project(&data, channel, *range, *rect, channel_color(channel))
            })
            .collect();
        frame.content = FrameContent::Traces {
            window: Some(data.window().clone()),
            panels,
        };
        frame
    }

    /// Composes a frame sized to `surface` and paints it.
    pub fn render(
        &mut self,
        surface: &mut (impl DrawSurface + ?Sized),
        viewport: Viewport,
        now: Instant,
    ) -> Frame {
        let frame = self.compose(viewport, surface.size(), now);
        frame.paint(surface, &self.style);
        frame
    }
}
