// Copyright 2025 the Tracescope Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A [`DrawSurface`] that writes SVG.

use std::fmt::Write as _;

use kurbo::{BezPath, Point, Rect};
use peniko::Brush;
use tracescope_render::{DrawSurface, Size, StrokeStyle, TextAnchor, TextBaseline, TextStyle};

#[derive(Debug)]
pub(crate) struct SvgSurface {
    size: Size,
    body: String,
}

impl SvgSurface {
    pub(crate) fn new(size: Size) -> Self {
        Self {
            size,
            body: String::new(),
        }
    }

    pub(crate) fn to_svg_string(&self) -> String {
        let Size { width, height } = self.size;
        let mut out = String::new();
        out.push_str(r#"<svg xmlns="http://www.w3.org/2000/svg" "#);
        let _ = writeln!(
            out,
            r#"viewBox="0 0 {width} {height}" width="{width}" height="{height}">"#
        );
        let _ = writeln!(
            out,
            r##"<rect x="0" y="0" width="{width}" height="{height}" fill="#ffffff"/>"##
        );
        out.push_str(&self.body);
        out.push_str("</svg>\n");
        out
    }
}

impl DrawSurface for SvgSurface {
    fn size(&self) -> Size {
        self.size
    }

    fn clear(&mut self) {
        self.body.clear();
    }

    fn stroke_path(&mut self, path: &BezPath, style: &StrokeStyle) {
        let _ = write!(self.body, r#"<path d="{}" fill="none""#, path.to_svg());
        write_paint_attr(&mut self.body, "stroke", &style.brush);
        let _ = writeln!(self.body, r#" stroke-width="{}"/>"#, style.stroke_width);
    }

    fn fill_rect(&mut self, rect: Rect, brush: &Brush) {
        let _ = write!(
            self.body,
            r#"<rect x="{}" y="{}" width="{}" height="{}""#,
            rect.x0,
            rect.y0,
            rect.width(),
            rect.height(),
        );
        write_paint_attr(&mut self.body, "fill", brush);
        self.body.push_str("/>\n");
    }

    fn fill_text(
        &mut self,
        text: &str,
        pos: Point,
        style: &TextStyle,
        anchor: TextAnchor,
        baseline: TextBaseline,
    ) {
        let baseline = match baseline {
            TextBaseline::Alphabetic => "alphabetic",
            TextBaseline::Top => "hanging",
            TextBaseline::Middle => "middle",
        };
        let anchor = match anchor {
            TextAnchor::Start => "start",
            TextAnchor::Middle => "middle",
            TextAnchor::End => "end",
        };
        let _ = write!(
            self.body,
            r#"<text x="{}" y="{}" font-size="{}" dominant-baseline="{baseline}" text-anchor="{anchor}""#,
            pos.x, pos.y, style.font_size,
        );
        write_paint_attr(&mut self.body, "fill", &style.fill);
        self.body.push('>');
        self.body.push_str(&escape_xml(text));
        self.body.push_str("</text>\n");
    }
}

fn svg_paint(brush: &Brush) -> (String, Option<f64>) {
    match brush {
        Brush::Solid(color) => {
            let rgba = color.to_rgba8();
            let fill = format!("#{:02x}{:02x}{:02x}", rgba.r, rgba.g, rgba.b);
            let fill_opacity = if rgba.a == 255 {
                None
            } else {
                Some(f64::from(rgba.a) / 255.0)
            };
            (fill, fill_opacity)
        }
        _ => ("none".to_string(), None),
    }
}

fn write_paint_attr(out: &mut String, name: &str, brush: &Brush) {
    let (value, opacity) = svg_paint(brush);
    let _ = write!(out, r#" {name}="{value}""#);
    if let Some(o) = opacity {
        let _ = write!(out, r#" {name}-opacity="{o}""#);
    }
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    use peniko::Color;

    #[test]
    fn clear_drops_earlier_drawing() {
        let mut svg = SvgSurface::new(Size::new(100.0, 50.0));
        svg.fill_text(
            "a<b",
            Point::new(1.0, 2.0),
            &TextStyle::solid(Color::BLACK, 12.0),
            TextAnchor::Middle,
            TextBaseline::Top,
        );
        let out = svg.to_svg_string();
        assert!(out.contains("a&lt;b"), "{out}");
        assert!(out.contains(r#"dominant-baseline="hanging""#), "{out}");

        svg.clear();
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.line_to((10.0, 10.0));
        svg.stroke_path(&path, &StrokeStyle::solid(Color::from_rgba8(255, 0, 0, 128), 1.0));
        let out = svg.to_svg_string();
        assert!(!out.contains("<text"), "{out}");
        assert!(out.contains(r##"stroke="#ff0000""##), "{out}");
        assert!(out.contains("stroke-opacity"), "{out}");
    }
}
