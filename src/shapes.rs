//! Fixed-form geometry for the basic SVG shapes. Each function constructs the
//! shape's path on the canvas and reports whether anything was emitted.

use crate::canvas::CanvasOps;
use crate::length::{length_or, parse_absolute_length};
use crate::node::Attributes;
use crate::types::Pt;

// Control point distance for a quarter circle approximated by one cubic.
const KAPPA: f32 = 0.552_284_75;

fn pt(value: f32) -> Pt {
    Pt::from_f32(value)
}

fn get<'a>(attrs: &'a Attributes, name: &str) -> Option<&'a str> {
    attrs.get(name).map(String::as_str)
}

fn coord(attrs: &Attributes, name: &str) -> f32 {
    length_or(get(attrs, name), 0.0)
}

fn required(attrs: &Attributes, name: &str, element: &str) -> Option<f32> {
    let value = get(attrs, name).and_then(parse_absolute_length);
    if value.is_none() {
        tracing::debug!(element, attribute = name, "missing or invalid size, shape skipped");
    }
    value
}

pub(crate) fn draw_rect<C: CanvasOps>(attrs: &Attributes, canvas: &mut C) -> bool {
    let x = coord(attrs, "x");
    let y = coord(attrs, "y");
    let (Some(w), Some(h)) = (required(attrs, "width", "rect"), required(attrs, "height", "rect"))
    else {
        return false;
    };
    if w <= 0.0 || h <= 0.0 {
        return false;
    }

    let rx = get(attrs, "rx").and_then(parse_absolute_length);
    let ry = get(attrs, "ry").and_then(parse_absolute_length);
    let (rx, ry) = match (rx, ry) {
        (Some(rx), Some(ry)) => (rx, ry),
        (Some(r), None) | (None, Some(r)) => (r, r),
        (None, None) => (0.0, 0.0),
    };
    let rx = rx.clamp(0.0, w / 2.0);
    let ry = ry.clamp(0.0, h / 2.0);

    if rx == 0.0 || ry == 0.0 {
        canvas.move_to(pt(x), pt(y));
        canvas.line_to(pt(x + w), pt(y));
        canvas.line_to(pt(x + w), pt(y + h));
        canvas.line_to(pt(x), pt(y + h));
        canvas.close_path();
        return true;
    }

    let ox = rx * KAPPA;
    let oy = ry * KAPPA;
    let right = x + w;
    let bottom = y + h;
    canvas.move_to(pt(x + rx), pt(y));
    canvas.line_to(pt(right - rx), pt(y));
    canvas.curve_to(
        pt(right - rx + ox),
        pt(y),
        pt(right),
        pt(y + ry - oy),
        pt(right),
        pt(y + ry),
    );
    canvas.line_to(pt(right), pt(bottom - ry));
    canvas.curve_to(
        pt(right),
        pt(bottom - ry + oy),
        pt(right - rx + ox),
        pt(bottom),
        pt(right - rx),
        pt(bottom),
    );
    canvas.line_to(pt(x + rx), pt(bottom));
    canvas.curve_to(
        pt(x + rx - ox),
        pt(bottom),
        pt(x),
        pt(bottom - ry + oy),
        pt(x),
        pt(bottom - ry),
    );
    canvas.line_to(pt(x), pt(y + ry));
    canvas.curve_to(pt(x), pt(y + ry - oy), pt(x + rx - ox), pt(y), pt(x + rx), pt(y));
    canvas.close_path();
    true
}

pub(crate) fn draw_circle<C: CanvasOps>(attrs: &Attributes, canvas: &mut C) -> bool {
    let Some(r) = required(attrs, "r", "circle") else {
        return false;
    };
    ellipse(canvas, coord(attrs, "cx"), coord(attrs, "cy"), r, r)
}

pub(crate) fn draw_ellipse<C: CanvasOps>(attrs: &Attributes, canvas: &mut C) -> bool {
    let (Some(rx), Some(ry)) = (
        required(attrs, "rx", "ellipse"),
        required(attrs, "ry", "ellipse"),
    ) else {
        return false;
    };
    ellipse(canvas, coord(attrs, "cx"), coord(attrs, "cy"), rx, ry)
}

fn ellipse<C: CanvasOps>(canvas: &mut C, cx: f32, cy: f32, rx: f32, ry: f32) -> bool {
    if rx <= 0.0 || ry <= 0.0 {
        return false;
    }
    let ox = rx * KAPPA;
    let oy = ry * KAPPA;
    canvas.move_to(pt(cx + rx), pt(cy));
    canvas.curve_to(pt(cx + rx), pt(cy + oy), pt(cx + ox), pt(cy + ry), pt(cx), pt(cy + ry));
    canvas.curve_to(pt(cx - ox), pt(cy + ry), pt(cx - rx), pt(cy + oy), pt(cx - rx), pt(cy));
    canvas.curve_to(pt(cx - rx), pt(cy - oy), pt(cx - ox), pt(cy - ry), pt(cx), pt(cy - ry));
    canvas.curve_to(pt(cx + ox), pt(cy - ry), pt(cx + rx), pt(cy - oy), pt(cx + rx), pt(cy));
    canvas.close_path();
    true
}

pub(crate) fn draw_line<C: CanvasOps>(attrs: &Attributes, canvas: &mut C) -> bool {
    canvas.move_to(pt(coord(attrs, "x1")), pt(coord(attrs, "y1")));
    canvas.line_to(pt(coord(attrs, "x2")), pt(coord(attrs, "y2")));
    true
}

pub(crate) fn draw_polygon<C: CanvasOps>(attrs: &Attributes, canvas: &mut C) -> bool {
    poly(attrs, canvas, true)
}

pub(crate) fn draw_polyline<C: CanvasOps>(attrs: &Attributes, canvas: &mut C) -> bool {
    poly(attrs, canvas, false)
}

fn poly<C: CanvasOps>(attrs: &Attributes, canvas: &mut C, close: bool) -> bool {
    let points = parse_points(get(attrs, "points").unwrap_or(""));
    if points.len() < 2 {
        tracing::debug!(count = points.len(), "fewer than two points, shape skipped");
        return false;
    }
    let (x0, y0) = points[0];
    canvas.move_to(pt(x0), pt(y0));
    for &(x, y) in &points[1..] {
        canvas.line_to(pt(x), pt(y));
    }
    if close {
        canvas.close_path();
    }
    true
}

/// Coordinate pairs of a `points` list. Parsing stops at the first malformed
/// number; an unpaired trailing coordinate is dropped.
pub fn parse_points(input: &str) -> Vec<(f32, f32)> {
    let nums: Vec<f32> = input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map_while(|s| s.parse::<f32>().ok().filter(|v| v.is_finite()))
        .collect();
    nums.chunks_exact(2).map(|pair| (pair[0], pair[1])).collect()
}
