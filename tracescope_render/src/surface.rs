// Copyright 2025 the Tracescope Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The drawing surface seam.
//!
//! The viewer draws through [`DrawSurface`], a minimal immediate-mode API shaped after a 2D
//! canvas context. [`RecordingSurface`] keeps every call as a [`DrawCommand`] for tests and
//! for exporters that replay them.

use kurbo::{BezPath, Point, Rect};
use peniko::Brush;

use crate::layout::Size;
use crate::style::{StrokeStyle, TextStyle};

/// Horizontal text anchor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextAnchor {
    /// `pos.x` is the start of the text.
    #[default]
    Start,
    /// `pos.x` is the center of the text.
    Middle,
    /// `pos.x` is the end of the text.
    End,
}

/// Vertical text baseline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextBaseline {
    /// `pos.y` is the alphabetic baseline.
    #[default]
    Alphabetic,
    /// `pos.y` is the top of the text.
    Top,
    /// `pos.y` is the vertical middle of the text.
    Middle,
}

/// A 2D immediate-mode drawing target.
pub trait DrawSurface {
    /// Size of the target in pixels.
    fn size(&self) -> Size;

    /// Erases everything drawn so far.
    fn clear(&mut self);

    /// Strokes `path`.
    fn stroke_path(&mut self, path: &BezPath, style: &StrokeStyle);

    /// Fills `rect`.
    fn fill_rect(&mut self, rect: Rect, brush: &Brush);

    /// Draws `text` positioned at `pos`.
    fn fill_text(
        &mut self,
        text: &str,
        pos: Point,
        style: &TextStyle,
        anchor: TextAnchor,
        baseline: TextBaseline,
    );
}

/// A single recorded drawing call.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// [`DrawSurface::clear`].
    Clear,
    /// [`DrawSurface::stroke_path`].
    Stroke {
        /// Path in canvas coordinates.
        path: BezPath,
        /// Stroke style.
        style: StrokeStyle,
    },
    /// [`DrawSurface::fill_rect`].
    FillRect {
        /// Rectangle in canvas coordinates.
        rect: Rect,
        /// Fill paint.
        brush: Brush,
    },
    /// [`DrawSurface::fill_text`].
    Text {
        /// The string.
        text: String,
        /// Anchor point.
        pos: Point,
        /// Paint and size.
        style: TextStyle,
        /// Horizontal anchor.
        anchor: TextAnchor,
        /// Vertical baseline.
        baseline: TextBaseline,
    },
}

/// A [`DrawSurface`] that records calls.
///
/// `clear` drops earlier commands but is itself recorded, so a replay of
/// [`RecordingSurface::commands`] always starts from a blank target.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordingSurface {
    size: Size,
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    /// Creates an empty surface of `size`.
    pub fn new(size: Size) -> Self {
        Self {
            size,
            commands: Vec::new(),
        }
    }

    /// Changes the surface size (as a host does on resize).
    pub fn resize(&mut self, size: Size) {
        self.size = size;
    }

    /// Commands since the last clear (including the clear).
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Strings drawn since the last clear.
    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Stroked paths since the last clear.
    pub fn strokes(&self) -> impl Iterator<Item = (&BezPath, &StrokeStyle)> + '_ {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Stroke { path, style } => Some((path, style)),
            _ => None,
        })
    }
}

impl DrawSurface for RecordingSurface {
    fn size(&self) -> Size {
        self.size
    }

    fn clear(&mut self) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear);
    }

    fn stroke_path(&mut self, path: &BezPath, style: &StrokeStyle) {
        self.commands.push(DrawCommand::Stroke {
            path: path.clone(),
            style: style.clone(),
        });
    }

    fn fill_rect(&mut self, rect: Rect, brush: &Brush) {
        self.commands.push(DrawCommand::FillRect {
            rect,
            brush: brush.clone(),
        });
    }

    fn fill_text(
        &mut self,
        text: &str,
        pos: Point,
        style: &TextStyle,
        anchor: TextAnchor,
        baseline: TextBaseline,
    ) {
        self.commands.push(DrawCommand::Text {
            text: text.to_owned(),
            pos,
            style: style.clone(),
            anchor,
            baseline,
        });
    }
}

/// Strokes a single straight line.
pub(crate) fn stroke_line(
    surface: &mut (impl DrawSurface + ?Sized),
    from: impl Into<Point>,
    to: impl Into<Point>,
    style: &StrokeStyle,
) {
    let mut path = BezPath::new();
    path.move_to(from);
    path.line_to(to);
    surface.stroke_path(&path, style);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_resets_but_is_recorded() {
        let mut s = RecordingSurface::new(Size::new(10.0, 10.0));
        stroke_line(&mut s, (0.0, 0.0), (1.0, 1.0), &StrokeStyle::default());
        s.fill_text(
            "a",
            Point::ORIGIN,
            &TextStyle::solid(peniko::Color::BLACK, 10.0),
            TextAnchor::Start,
            TextBaseline::Top,
        );
        assert_eq!(s.commands().len(), 2);
        s.clear();
        assert_eq!(s.commands(), &[DrawCommand::Clear]);
        assert_eq!(s.texts().count(), 0);
    }
}
