use crate::color::{ColorValue, parse_color};
use crate::length::parse_absolute_length;
use crate::node::Attributes;
use crate::types::{Color, Pt};

pub const FILL: &str = "fill";
pub const STROKE: &str = "stroke";
pub const STROKE_WIDTH: &str = "stroke-width";
pub const FILL_RULE: &str = "fill-rule";
const FILL_RULE_EVEN_ODD: &str = "evenodd";
const DEFAULT_STROKE_WIDTH: f32 = 1.0;

/// Paint settings resolved for one node before it draws.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaintState {
    pub fill_enabled: bool,
    pub fill_color: Color,
    pub stroke_enabled: bool,
    pub stroke_color: Color,
    pub stroke_width: Pt,
    pub fill_rule_even_odd: bool,
}

/// Resolves paint from the node's own attributes. `can_fill` is the renderer's
/// answer to whether its geometry has an interior worth filling.
pub fn resolve_paint(attrs: &Attributes, can_fill: bool) -> PaintState {
    let fill_raw = attrs.get(FILL).map(String::as_str);
    let fill_none = fill_raw.is_some_and(|v| v.trim().eq_ignore_ascii_case("none"));
    let fill_color = match fill_raw.and_then(parse_color) {
        Some(ColorValue::Rgb(color)) => color,
        Some(ColorValue::NoPaint) => Color::BLACK,
        None => {
            if let Some(raw) = fill_raw {
                tracing::warn!(value = raw, "unparsable fill color, using black");
            }
            Color::BLACK
        }
    };

    let stroke_raw = attrs.get(STROKE).map(String::as_str);
    let stroke_color = stroke_raw.and_then(parse_color);
    if let (Some(raw), None) = (stroke_raw, stroke_color) {
        tracing::warn!(value = raw, "unparsable stroke color, stroke disabled");
    }
    let stroke_color = stroke_color.and_then(ColorValue::rgb);

    let stroke_width = match attrs.get(STROKE_WIDTH) {
        Some(raw) => parse_absolute_length(raw).unwrap_or_else(|| {
            tracing::warn!(value = raw.as_str(), "unparsable stroke-width, using 1");
            DEFAULT_STROKE_WIDTH
        }),
        None => DEFAULT_STROKE_WIDTH,
    };

    let fill_rule_even_odd = attrs
        .get(FILL_RULE)
        .is_some_and(|v| v.trim().eq_ignore_ascii_case(FILL_RULE_EVEN_ODD));

    PaintState {
        fill_enabled: !fill_none && can_fill,
        fill_color,
        stroke_enabled: stroke_color.is_some(),
        stroke_color: stroke_color.unwrap_or(Color::BLACK),
        stroke_width: Pt::from_f32(stroke_width),
        fill_rule_even_odd,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_fill_black_without_stroke() {
        let paint = resolve_paint(&Attributes::new(), true);
        assert!(paint.fill_enabled);
        assert_eq!(paint.fill_color, Color::BLACK);
        assert!(!paint.stroke_enabled);
        assert_eq!(paint.stroke_width, Pt::from_i32(1));
        assert!(!paint.fill_rule_even_odd);
    }

    #[test]
    fn fill_none_disables_fill() {
        let paint = resolve_paint(&attrs(&[("fill", "NONE")]), true);
        assert!(!paint.fill_enabled);
    }

    #[test]
    fn non_fillable_element_never_fills() {
        let paint = resolve_paint(&attrs(&[("fill", "red")]), false);
        assert!(!paint.fill_enabled);
    }

    #[test]
    fn invalid_fill_falls_back_to_black() {
        let paint = resolve_paint(&attrs(&[("fill", "chartreuse-ish")]), true);
        assert!(paint.fill_enabled);
        assert_eq!(paint.fill_color, Color::BLACK);
    }

    #[test]
    fn stroke_requires_concrete_color() {
        let paint = resolve_paint(&attrs(&[("stroke", "red"), ("stroke-width", "2")]), true);
        assert!(paint.stroke_enabled);
        assert!(paint.stroke_color.approx_eq(Color::rgb(1.0, 0.0, 0.0)));
        assert_eq!(paint.stroke_width, Pt::from_i32(2));

        assert!(!resolve_paint(&attrs(&[("stroke", "none")]), true).stroke_enabled);
        assert!(!resolve_paint(&attrs(&[("stroke", "bogus")]), true).stroke_enabled);
        assert!(!resolve_paint(&attrs(&[("stroke-width", "5")]), true).stroke_enabled);
    }

    #[test]
    fn stroke_width_units_and_fallback() {
        let paint = resolve_paint(&attrs(&[("stroke", "blue"), ("stroke-width", "4px")]), true);
        assert_eq!(paint.stroke_width, Pt::from_i32(3));
        let paint = resolve_paint(&attrs(&[("stroke", "blue"), ("stroke-width", "1em")]), true);
        assert_eq!(paint.stroke_width, Pt::from_i32(1));
    }

    #[test]
    fn fill_rule_is_case_insensitive() {
        assert!(resolve_paint(&attrs(&[("fill-rule", "EvenOdd")]), true).fill_rule_even_odd);
        assert!(!resolve_paint(&attrs(&[("fill-rule", "nonzero")]), true).fill_rule_even_odd);
    }
}
