// Copyright 2025 the Tracescope Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pan/zoom demo for `tracescope`.
//!
//! Serves a synthetic recording from memory, drives a [`TraceViewer`] through a scripted
//! interaction and writes every settled frame as SVG.
//!
//! ```text
//! tracescope_demo [DESCRIPTOR] [OUT_DIR]
//! ```
//!
//! The descriptor uses the embedding protocol's field names (`startTimeSec`,
//! `samplingFrequency`, `numFrames`, `chunkSize`, `channelIds`). Set `RUST_LOG=debug` to watch
//! fetches being scheduled and resolved.

mod svg;
mod synthetic;

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use clap::Parser;
use futures::executor::LocalPool;
use tracescope_core::{Dataset, DatasetDescriptor, LodConfig, Viewport};
use tracescope_render::{AmplitudeScale, FrameContent, Selection, Size, TraceViewer};
use tracing::{info, warn};

use crate::svg::SvgSurface;
use crate::synthetic::SyntheticStore;

#[derive(Debug, Parser)]
#[command(
    name = "tracescope_demo",
    about = "Render a scripted pan/zoom over a synthetic recording to SVG frames"
)]
struct Args {
    /// JSON dataset descriptor; a 2M-frame, 4-channel recording when omitted
    descriptor: Option<PathBuf>,

    /// Directory receiving one SVG per scripted step
    #[arg(default_value = "tracescope_frames")]
    out_dir: PathBuf,
}

/// Upper bound on passes per step; a step settles earlier once nothing is pending.
const MAX_PASSES: usize = 8;

#[derive(Debug)]
struct Step {
    name: &'static str,
    viewport: Viewport,
    at: Duration,
    amplitude: AmplitudeScale,
}

fn default_descriptor() -> DatasetDescriptor {
    DatasetDescriptor {
        start_time_sec: 0.0,
        sampling_frequency: 1000.0,
        num_frames: 2_000_000,
        chunk_size: 1000,
        channel_ids: vec![101, 102, 103, 104],
    }
}

fn load_descriptor(path: Option<&Path>) -> Result<DatasetDescriptor, Box<dyn Error>> {
    let Some(path) = path else {
        return Ok(default_descriptor());
    };
    let json = std::fs::read_to_string(path)
        .map_err(|err| format!("reading descriptor {}: {err}", path.display()))?;
    serde_json::from_str(&json)
        .map_err(|err| format!("parsing descriptor {}: {err}", path.display()).into())
}

fn script(dataset: &Dataset) -> Vec<Step> {
    let start = dataset.start_time();
    let end = dataset.end_time();
    let unit = AmplitudeScale::default();
    let loud = unit.scaled_up().scaled_up();
    let step = |name, viewport, ms, amplitude| Step {
        name,
        viewport,
        at: Duration::from_millis(ms),
        amplitude,
    };
    vec![
        step("overview", Viewport::new(start, end), 0, unit),
        step("zoom-60s", Viewport::new(start, start + 60.0), 100, unit),
        step("pan-60s", Viewport::new(start + 30.0, start + 90.0), 200, unit),
        step("dwell-60s", Viewport::new(start + 30.0, start + 90.0), 800, unit),
        step("zoom-2s", Viewport::new(start + 40.0, start + 42.0), 900, unit),
        step(
            "amplified-2s",
            Viewport::new(start + 40.0, start + 42.0),
            1000,
            loud,
        ),
        step("dwell-2s", Viewport::new(start + 40.0, start + 42.0), 1600, loud),
    ]
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let dataset = load_descriptor(args.descriptor.as_deref())?.validate()?;
    let out_dir = args.out_dir;
    std::fs::create_dir_all(&out_dir)?;
    info!(
        frames = dataset.num_frames(),
        channels = dataset.num_channels(),
        duration = dataset.end_time() - dataset.start_time(),
        "loaded dataset"
    );

    let mut pool = LocalPool::new();
    let store = SyntheticStore::new(&dataset);
    let mut viewer = TraceViewer::new(dataset, store, pool.spawner(), LodConfig::default());
    let redraws = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&redraws);
    viewer.cache().set_observer(move |_| {
        counter.fetch_add(1, Ordering::Relaxed);
    });

    let steps = script(viewer.dataset());
    let mut surface = SvgSurface::new(Size::new(900.0, 520.0));
    let t0 = Instant::now();
    for (i, step) in steps.iter().enumerate() {
        let now = t0 + step.at;
        viewer.set_amplitude(step.amplitude);
        viewer.set_selection(Selection {
            current_time: Some(step.viewport.start + step.viewport.duration() / 2.0),
            current_interval: None,
        });

        let mut passes = 0;
        let frame = loop {
            passes += 1;
            let frame = viewer.render(&mut surface, step.viewport, now);
            if !frame.is_loading() || passes == MAX_PASSES {
                break frame;
            }
            pool.run_until_stalled();
        };
        if frame.is_loading() {
            warn!(step = step.name, pending = frame.pending.len(), "step did not settle");
        }

        let level = match &frame.content {
            FrameContent::ZoomInRequired => "zoom in".to_owned(),
            FrameContent::Traces {
                window: Some(window),
                ..
            } => window.level.to_string(),
            FrameContent::Traces { window: None, .. } => "empty".to_owned(),
        };
        let path = out_dir.join(format!("{i:02}-{}.svg", step.name));
        std::fs::write(&path, surface.to_svg_string())?;
        info!(
            step = step.name,
            %level,
            passes,
            dwell_in = ?viewer.time_until_dwell(now),
            path = %path.display(),
            "wrote frame"
        );
    }

    info!(
        cached = viewer.cache().len(),
        redraw_requests = redraws.load(Ordering::Relaxed),
        "done"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    #[test]
    fn command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn positional_arguments_are_optional() {
        let args = Args::try_parse_from(["tracescope_demo"]).unwrap();
        assert_eq!(args.descriptor, None);
        assert_eq!(args.out_dir, PathBuf::from("tracescope_frames"));

        let args = Args::try_parse_from(["tracescope_demo", "rec.json", "out"]).unwrap();
        assert_eq!(args.descriptor, Some(PathBuf::from("rec.json")));
        assert_eq!(args.out_dir, PathBuf::from("out"));
    }

    #[test]
    fn help_is_not_read_as_a_descriptor() {
        let err = Args::try_parse_from(["tracescope_demo", "--help", "/tmp/out"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn missing_descriptor_names_the_path() {
        let err = load_descriptor(Some(Path::new("/nonexistent/rec.json"))).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/rec.json"), "{err}");
    }
}
