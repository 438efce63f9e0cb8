use crate::canvas::CanvasOps;
use crate::context::DrawContext;
use crate::error::Result;
use crate::length::{length_or, parse_absolute_length};
use crate::node::{Attributes, NodeId, RendererTree};
use crate::transform::AffineTransform;

pub(crate) fn draw_group<C: CanvasOps>(
    tree: &RendererTree,
    id: NodeId,
    ctx: &mut DrawContext<C>,
) -> Result<()> {
    ctx.current_canvas()?.save_state();
    draw_children(tree, id, ctx)?;
    ctx.current_canvas()?.restore_state();
    Ok(())
}

pub(crate) fn draw_svg<C: CanvasOps>(
    tree: &RendererTree,
    id: NodeId,
    ctx: &mut DrawContext<C>,
) -> Result<()> {
    let canvas = ctx.current_canvas()?;
    canvas.save_state();
    let viewport = viewport_transform(tree.attributes(id), tree.parent(id).is_some());
    if !viewport.is_identity() {
        canvas.concat_matrix(&viewport);
    }
    draw_children(tree, id, ctx)?;
    ctx.current_canvas()?.restore_state();
    Ok(())
}

fn draw_children<C: CanvasOps>(
    tree: &RendererTree,
    id: NodeId,
    ctx: &mut DrawContext<C>,
) -> Result<()> {
    for &child in tree.children(id) {
        tree.draw(child, ctx)?;
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Min,
    Mid,
    Max,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AspectRatio {
    // None means "none": scale each axis independently.
    align: Option<(Align, Align)>,
    slice: bool,
}

impl Default for AspectRatio {
    fn default() -> Self {
        Self {
            align: Some((Align::Mid, Align::Mid)),
            slice: false,
        }
    }
}

fn parse_aspect_ratio(input: Option<&str>) -> AspectRatio {
    let Some(input) = input else {
        return AspectRatio::default();
    };
    let mut parts = input.split_whitespace();
    let align = match parts.next() {
        Some("none") => None,
        Some(value) if value.len() == 8 && value.is_ascii() => {
            let axis = |s: &str| match s {
                "Min" => Some(Align::Min),
                "Mid" => Some(Align::Mid),
                "Max" => Some(Align::Max),
                _ => None,
            };
            match (value.strip_prefix('x'), value.get(4..5)) {
                (Some(rest), Some("Y")) => match (axis(&rest[..3]), axis(&value[5..])) {
                    (Some(x), Some(y)) => Some((x, y)),
                    _ => return AspectRatio::default(),
                },
                _ => return AspectRatio::default(),
            }
        }
        _ => return AspectRatio::default(),
    };
    let slice = matches!(parts.next(), Some("slice"));
    AspectRatio { align, slice }
}

pub(crate) fn parse_view_box(view_box: Option<&str>) -> Option<(f32, f32, f32, f32)> {
    let vb = view_box?;
    let nums: Vec<f32> = vb
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f32>().ok().filter(|v| v.is_finite()))
        .collect::<Option<_>>()?;
    let &[min_x, min_y, w, h] = nums.as_slice() else {
        return None;
    };
    if w <= 0.0 || h <= 0.0 {
        return None;
    }
    Some((min_x, min_y, w, h))
}

/// Maps the element's user space into its viewport: the `x`/`y` offset of a nested
/// `svg`, followed by the `viewBox` fit.
fn viewport_transform(attrs: &Attributes, nested: bool) -> AffineTransform {
    let get = |name: &str| attrs.get(name).map(String::as_str);
    let mut out = AffineTransform::identity();
    if nested {
        let x = length_or(get("x"), 0.0);
        let y = length_or(get("y"), 0.0);
        if x != 0.0 || y != 0.0 {
            out = AffineTransform::translate(x, y);
        }
    }

    let Some((min_x, min_y, vb_w, vb_h)) = parse_view_box(get("viewBox")) else {
        if get("viewBox").is_some() {
            tracing::warn!(value = ?get("viewBox"), "ignoring malformed viewBox");
        }
        return out;
    };
    let width = get("width")
        .and_then(parse_absolute_length)
        .filter(|w| *w > 0.0)
        .unwrap_or(vb_w);
    let height = get("height")
        .and_then(parse_absolute_length)
        .filter(|h| *h > 0.0)
        .unwrap_or(vb_h);

    let sx = width / vb_w;
    let sy = height / vb_h;
    let aspect = parse_aspect_ratio(get("preserveAspectRatio"));
    let fit = match aspect.align {
        None => AffineTransform::scale(sx, sy).concat(&AffineTransform::translate(-min_x, -min_y)),
        Some((align_x, align_y)) => {
            let s = if aspect.slice { sx.max(sy) } else { sx.min(sy) };
            let offset = |align: Align, available: f32, used: f32| match align {
                Align::Min => 0.0,
                Align::Mid => (available - used) * 0.5,
                Align::Max => available - used,
            };
            let tx = offset(align_x, width, vb_w * s) - min_x * s;
            let ty = offset(align_y, height, vb_h * s) - min_y * s;
            AffineTransform::translate(tx, ty).concat(&AffineTransform::scale(s, s))
        }
    };
    out.concat(&fit)
}
