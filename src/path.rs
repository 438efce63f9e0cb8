//! `path` element: walks the parsed `d` commands and drives the canvas.

use std::f32::consts::PI;

use crate::canvas::{CanvasOps, quad_to_cubic};
use crate::node::Attributes;
use crate::path_data::{PathCommand, PathCommandKind, parse_path_data};
use crate::types::Pt;

pub const D: &str = "d";

#[derive(Debug, Clone, Copy, PartialEq)]
struct Point {
    x: f32,
    y: f32,
}

impl Point {
    const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    // Mirror of `ctrl` through `self`.
    fn reflect(self, ctrl: Point) -> Point {
        Point::new(2.0 * self.x - ctrl.x, 2.0 * self.y - ctrl.y)
    }
}

/// Pen position and the control-point memory the smooth commands need.
struct PathState<'c, C: CanvasOps> {
    canvas: &'c mut C,
    cursor: Point,
    subpath_start: Point,
    prev_cubic_ctrl: Option<Point>,
    prev_quad_ctrl: Option<Point>,
    started: bool,
    emitted: bool,
}

impl<'c, C: CanvasOps> PathState<'c, C> {
    fn new(canvas: &'c mut C) -> Self {
        Self {
            canvas,
            cursor: Point::ORIGIN,
            subpath_start: Point::ORIGIN,
            prev_cubic_ctrl: None,
            prev_quad_ctrl: None,
            started: false,
            emitted: false,
        }
    }

    fn point(&self, relative: bool, x: f32, y: f32) -> Point {
        if relative {
            Point::new(self.cursor.x + x, self.cursor.y + y)
        } else {
            Point::new(x, y)
        }
    }

    fn move_to(&mut self, p: Point) {
        self.canvas.move_to(Pt::from_f32(p.x), Pt::from_f32(p.y));
        self.cursor = p;
        self.subpath_start = p;
    }

    fn line_to(&mut self, p: Point) {
        self.canvas.line_to(Pt::from_f32(p.x), Pt::from_f32(p.y));
        self.cursor = p;
    }

    fn curve_to(&mut self, c1: Point, c2: Point, end: Point) {
        self.canvas.curve_to(
            Pt::from_f32(c1.x),
            Pt::from_f32(c1.y),
            Pt::from_f32(c2.x),
            Pt::from_f32(c2.y),
            Pt::from_f32(end.x),
            Pt::from_f32(end.y),
        );
        self.cursor = end;
    }

    fn quad_to(&mut self, ctrl: Point, end: Point) {
        if self.canvas.supports_quad_to() {
            self.canvas.quad_to(
                Pt::from_f32(ctrl.x),
                Pt::from_f32(ctrl.y),
                Pt::from_f32(end.x),
                Pt::from_f32(end.y),
            );
            self.cursor = end;
        } else {
            let start = self.cursor;
            let (c1x, c1y, c2x, c2y) =
                quad_to_cubic(start.x, start.y, ctrl.x, ctrl.y, end.x, end.y);
            self.curve_to(Point::new(c1x, c1y), Point::new(c2x, c2y), end);
        }
    }

    fn close(&mut self) {
        self.canvas.close_path();
        self.cursor = self.subpath_start;
    }

    /// Emits one command. Returns `false` when the path cannot continue.
    fn apply(&mut self, command: &PathCommand) -> bool {
        use PathCommandKind::*;

        let kind = command.kind;
        let args = command.args.as_slice();
        let rel = kind.is_relative();

        if !self.started && !matches!(kind, MoveAbs | MoveRel) {
            tracing::warn!(command = %kind.letter(), "path data must start with a moveto");
            return false;
        }

        let mut cubic_ctrl = None;
        let mut quad_ctrl = None;
        match (kind, args) {
            (MoveAbs | MoveRel, &[x, y]) => {
                let p = self.point(rel, x, y);
                self.move_to(p);
                self.started = true;
            }
            (LineAbs | LineRel, &[x, y]) => {
                let p = self.point(rel, x, y);
                self.line_to(p);
            }
            (HLineAbs | HLineRel, &[x]) => {
                let x = if rel { self.cursor.x + x } else { x };
                self.line_to(Point::new(x, self.cursor.y));
            }
            (VLineAbs | VLineRel, &[y]) => {
                let y = if rel { self.cursor.y + y } else { y };
                self.line_to(Point::new(self.cursor.x, y));
            }
            (CubicAbs | CubicRel, &[x1, y1, x2, y2, x, y]) => {
                let c1 = self.point(rel, x1, y1);
                let c2 = self.point(rel, x2, y2);
                let end = self.point(rel, x, y);
                self.curve_to(c1, c2, end);
                cubic_ctrl = Some(c2);
            }
            (SmoothCubicAbs | SmoothCubicRel, &[x2, y2, x, y]) => {
                let c1 = match self.prev_cubic_ctrl {
                    Some(prev) => self.cursor.reflect(prev),
                    None => self.cursor,
                };
                let c2 = self.point(rel, x2, y2);
                let end = self.point(rel, x, y);
                self.curve_to(c1, c2, end);
                cubic_ctrl = Some(c2);
            }
            (QuadAbs | QuadRel, &[x1, y1, x, y]) => {
                let ctrl = self.point(rel, x1, y1);
                let end = self.point(rel, x, y);
                self.quad_to(ctrl, end);
                quad_ctrl = Some(ctrl);
            }
            (SmoothQuadAbs | SmoothQuadRel, &[x, y]) => {
                let ctrl = match self.prev_quad_ctrl {
                    Some(prev) => self.cursor.reflect(prev),
                    None => self.cursor,
                };
                let end = self.point(rel, x, y);
                self.quad_to(ctrl, end);
                quad_ctrl = Some(ctrl);
            }
            (ArcAbs | ArcRel, &[rx, ry, rotation, large_arc, sweep, x, y]) => {
                let end = self.point(rel, x, y);
                self.arc_to(rx, ry, rotation, large_arc != 0.0, sweep != 0.0, end);
            }
            (Close, []) => self.close(),
            _ => {
                tracing::warn!(
                    command = %kind.letter(),
                    found = args.len(),
                    expected = kind.arity(),
                    "malformed path command"
                );
                return false;
            }
        }
        self.prev_cubic_ctrl = cubic_ctrl;
        self.prev_quad_ctrl = quad_ctrl;
        self.emitted = true;
        true
    }

    fn arc_to(&mut self, rx: f32, ry: f32, rotation: f32, large_arc: bool, sweep: bool, end: Point) {
        let start = self.cursor;
        if start == end {
            return;
        }
        if rx == 0.0 || ry == 0.0 {
            self.line_to(end);
            return;
        }
        let Some(segments) = arc_to_cubics(start, end, rx.abs(), ry.abs(), rotation, large_arc, sweep)
        else {
            tracing::warn!(rx, ry, "arc radii out of range, drawing a line");
            self.line_to(end);
            return;
        };
        for [c1, c2, p] in segments {
            self.curve_to(c1, c2, p);
        }
    }
}

/// Splits an endpoint-parameterized elliptical arc into cubic segments of at
/// most a quarter turn each, after converting it to center form. `None` when the
/// radii are too small or too large to yield a finite center.
fn arc_to_cubics(
    start: Point,
    end: Point,
    mut rx: f32,
    mut ry: f32,
    rotation_deg: f32,
    large_arc: bool,
    sweep: bool,
) -> Option<Vec<[Point; 3]>> {
    let phi = rotation_deg.to_radians();
    let (sin_phi, cos_phi) = (libm::sinf(phi), libm::cosf(phi));

    let hx = (start.x - end.x) / 2.0;
    let hy = (start.y - end.y) / 2.0;
    let x1p = cos_phi * hx + sin_phi * hy;
    let y1p = -sin_phi * hx + cos_phi * hy;

    // Radii too small to span the endpoints are scaled up uniformly.
    let lambda = (x1p * x1p) / (rx * rx) + (y1p * y1p) / (ry * ry);
    if lambda > 1.0 {
        let s = libm::sqrtf(lambda);
        rx *= s;
        ry *= s;
    }
    if !(rx.is_finite() && ry.is_finite() && rx > 0.0 && ry > 0.0) {
        return None;
    }

    let rx2 = rx * rx;
    let ry2 = ry * ry;
    let num = rx2 * ry2 - rx2 * y1p * y1p - ry2 * x1p * x1p;
    let den = rx2 * y1p * y1p + ry2 * x1p * x1p;
    let coef = if den == 0.0 {
        0.0
    } else {
        let sign = if large_arc == sweep { -1.0 } else { 1.0 };
        sign * libm::sqrtf((num / den).max(0.0))
    };
    let cxp = coef * (rx * y1p / ry);
    let cyp = coef * (-ry * x1p / rx);
    let cx = cos_phi * cxp - sin_phi * cyp + (start.x + end.x) / 2.0;
    let cy = sin_phi * cxp + cos_phi * cyp + (start.y + end.y) / 2.0;
    if !(cx.is_finite() && cy.is_finite()) {
        return None;
    }

    let angle = |ux: f32, uy: f32, vx: f32, vy: f32| libm::atan2f(ux * vy - uy * vx, ux * vx + uy * vy);
    let ux = (x1p - cxp) / rx;
    let uy = (y1p - cyp) / ry;
    let vx = (-x1p - cxp) / rx;
    let vy = (-y1p - cyp) / ry;
    let theta = angle(1.0, 0.0, ux, uy);
    let mut sweep_angle = angle(ux, uy, vx, vy);
    if !sweep && sweep_angle > 0.0 {
        sweep_angle -= 2.0 * PI;
    } else if sweep && sweep_angle < 0.0 {
        sweep_angle += 2.0 * PI;
    }

    let segments = libm::ceilf(sweep_angle.abs() / (PI / 2.0)).max(1.0) as usize;
    let step = sweep_angle / segments as f32;
    let k = (4.0 / 3.0) * libm::tanf(step / 4.0);
    let map = |ux: f32, uy: f32| {
        let (x, y) = (rx * ux, ry * uy);
        Point::new(cx + cos_phi * x - sin_phi * y, cy + sin_phi * x + cos_phi * y)
    };

    let mut out = Vec::with_capacity(segments);
    let mut t1 = theta;
    for i in 0..segments {
        let t2 = t1 + step;
        let (s1, c1) = (libm::sinf(t1), libm::cosf(t1));
        let (s2, c2) = (libm::sinf(t2), libm::cosf(t2));
        // The last segment lands exactly on the requested endpoint.
        let p = if i + 1 == segments { end } else { map(c2, s2) };
        out.push([map(c1 - k * s1, s1 + k * c1), map(c2 + k * s2, s2 - k * c2), p]);
        t1 = t2;
    }
    Some(out)
}

/// Constructs the path described by the `d` attribute. Returns whether any
/// path operator was emitted.
pub(crate) fn draw_path<C: CanvasOps>(attrs: &Attributes, canvas: &mut C) -> bool {
    let Some(d) = attrs.get(D) else {
        tracing::debug!("path without d attribute");
        return false;
    };
    let data = parse_path_data(d);
    if let Some(err) = &data.error {
        tracing::warn!(error = %err, parsed = data.commands.len(), "path data truncated");
    }

    let mut state = PathState::new(canvas);
    for command in &data.commands {
        if !state.apply(command) {
            break;
        }
    }
    state.emitted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{Canvas, Command};
    use crate::context::DrawContext;
    use crate::node::{RendererKind, RendererTree};
    use crate::transform::AffineTransform;
    use crate::types::{Color, Size};

    fn attrs(pairs: &[(&str, &str)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn render_path(pairs: &[(&str, &str)]) -> Vec<Command> {
        let mut tree = RendererTree::new();
        let id = tree.create_node(RendererKind::Path);
        tree.set_attributes_and_styles(id, attrs(pairs)).unwrap();
        let mut ctx = DrawContext::new();
        ctx.push_canvas(Canvas::new(Size::a4()));
        tree.draw(id, &mut ctx).unwrap();
        ctx.pop_canvas().unwrap().into_commands()
    }

    fn construct(d: &str) -> Vec<Command> {
        let mut canvas = Canvas::new(Size::a4());
        draw_path(&attrs(&[("d", d)]), &mut canvas);
        canvas.into_commands()
    }

    /// Canvas that only understands cubic curves.
    #[derive(Default)]
    struct CubicOnly(Vec<Command>);

    impl CanvasOps for CubicOnly {
        fn move_to(&mut self, x: Pt, y: Pt) {
            self.0.push(Command::MoveTo { x, y });
        }
        fn line_to(&mut self, x: Pt, y: Pt) {
            self.0.push(Command::LineTo { x, y });
        }
        fn curve_to(&mut self, x1: Pt, y1: Pt, x2: Pt, y2: Pt, x: Pt, y: Pt) {
            self.0.push(Command::CurveTo { x1, y1, x2, y2, x, y });
        }
        fn close_path(&mut self) {
            self.0.push(Command::ClosePath);
        }
        fn fill(&mut self) {}
        fn eo_fill(&mut self) {}
        fn stroke(&mut self) {}
        fn fill_stroke(&mut self) {}
        fn eo_fill_stroke(&mut self) {}
        fn end_path(&mut self) {}
        fn set_fill_color(&mut self, _color: Color) {}
        fn set_stroke_color(&mut self, _color: Color) {}
        fn set_line_width(&mut self, _width: Pt) {}
        fn concat_matrix(&mut self, _matrix: &AffineTransform) {}
        fn save_state(&mut self) {}
        fn restore_state(&mut self) {}
    }

    #[test]
    fn closed_triangle_with_stray_commas() {
        assert_eq!(
            render_path(&[("d", "M 100,100, L300,100,L200,300,z")]),
            vec![
                Command::SetFillColor(Color::BLACK),
                Command::move_to(100.0, 100.0),
                Command::line_to(300.0, 100.0),
                Command::line_to(200.0, 300.0),
                Command::ClosePath,
                Command::Fill,
            ]
        );
    }

    #[test]
    fn relative_line_adds_cursor() {
        assert_eq!(
            render_path(&[("d", "M 100 100 l300 100 L200 300 z")]),
            vec![
                Command::SetFillColor(Color::BLACK),
                Command::move_to(100.0, 100.0),
                Command::line_to(400.0, 200.0),
                Command::line_to(200.0, 300.0),
                Command::ClosePath,
                Command::Fill,
            ]
        );
    }

    #[test]
    fn quadratic_is_passed_through() {
        assert_eq!(
            render_path(&[("d", "M200,300 Q400,50 600,300,z")]),
            vec![
                Command::SetFillColor(Color::BLACK),
                Command::move_to(200.0, 300.0),
                Command::quad_to(400.0, 50.0, 600.0, 300.0),
                Command::ClosePath,
                Command::Fill,
            ]
        );
    }

    #[test]
    fn quadratic_is_elevated_for_cubic_only_canvas() {
        let mut canvas = CubicOnly::default();
        assert!(draw_path(&attrs(&[("d", "M0,0 Q30,60 90,0")]), &mut canvas));
        assert_eq!(
            canvas.0,
            vec![
                Command::move_to(0.0, 0.0),
                Command::curve_to(20.0, 40.0, 50.0, 40.0, 90.0, 0.0),
            ]
        );
    }

    #[test]
    fn smooth_cubic_reflects_previous_control() {
        assert_eq!(
            render_path(&[("d", "M100,200 C100,100 250,100 250,200 S400,300 400,200 z")]),
            vec![
                Command::SetFillColor(Color::BLACK),
                Command::move_to(100.0, 200.0),
                Command::curve_to(100.0, 100.0, 250.0, 100.0, 250.0, 200.0),
                Command::curve_to(250.0, 300.0, 400.0, 300.0, 400.0, 200.0),
                Command::ClosePath,
                Command::Fill,
            ]
        );
    }

    #[test]
    fn smooth_cubic_without_previous_uses_cursor() {
        let commands = construct("M10,10 L20,20 S30,40 50,50");
        assert_eq!(
            commands[2],
            Command::curve_to(20.0, 20.0, 30.0, 40.0, 50.0, 50.0)
        );
    }

    #[test]
    fn smooth_quad_chain_reflects() {
        let commands = construct("M0,0 Q10,20 20,0 T40,0");
        assert_eq!(commands[2], Command::quad_to(30.0, -20.0, 40.0, 0.0));
    }

    #[test]
    fn evenodd_uses_even_odd_fill() {
        let commands = render_path(&[
            ("d", "M0,0 L100,0 L50,100 z M25,10 L75,10 L50,60 z"),
            ("fill-rule", "evenodd"),
        ]);
        assert_eq!(commands.last(), Some(&Command::FillEvenOdd));
        assert!(!commands.contains(&Command::Fill));
    }

    #[test]
    fn stroke_only_path() {
        assert_eq!(
            render_path(&[
                ("d", "M10,10 L90,90"),
                ("fill", "none"),
                ("stroke", "red"),
                ("stroke-width", "2"),
            ]),
            vec![
                Command::SetStrokeColor(Color::rgb(1.0, 0.0, 0.0)),
                Command::SetLineWidth(Pt::from_f32(2.0)),
                Command::move_to(10.0, 10.0),
                Command::line_to(90.0, 90.0),
                Command::Stroke,
            ]
        );
    }

    #[test]
    fn separators_do_not_change_output() {
        let reference = construct("M10 20 L30 40 C1 2 3 4 5 6 Z");
        for d in [
            "M10,20L30,40C1,2,3,4,5,6Z",
            "  M 10 , 20   L 30\n40 C 1 2,3 4 ,5 6 z ",
            "M10 20,L30 40,C1 2 3 4 5 6,Z",
        ] {
            assert_eq!(construct(d), reference, "{d}");
        }
    }

    #[test]
    fn horizontal_and_vertical_lines_keep_other_axis() {
        assert_eq!(
            construct("M5,5 H20 v10 h-5 V0"),
            vec![
                Command::move_to(5.0, 5.0),
                Command::line_to(20.0, 5.0),
                Command::line_to(20.0, 15.0),
                Command::line_to(15.0, 15.0),
                Command::line_to(15.0, 0.0),
            ]
        );
    }

    #[test]
    fn close_returns_cursor_to_subpath_start() {
        let commands = construct("M10,10 L50,10 Z l5,5");
        assert_eq!(commands[3], Command::line_to(15.0, 15.0));
    }

    #[test]
    fn relative_move_after_implicit_lines() {
        assert_eq!(
            construct("m10,10 5,0 0,5"),
            vec![
                Command::move_to(10.0, 10.0),
                Command::line_to(15.0, 10.0),
                Command::line_to(15.0, 15.0),
            ]
        );
    }

    #[test]
    fn half_circle_arc_is_two_quarter_curves() {
        let commands = construct("M0,0 A10,10 0 0 1 20,0");
        let curves: Vec<_> = commands
            .iter()
            .filter(|c| matches!(c, Command::CurveTo { .. }))
            .collect();
        assert_eq!(curves.len(), 2);
        let &Command::CurveTo { x, y, .. } = curves[0] else {
            unreachable!()
        };
        // Sweep flag 1 in a y-down system passes through the top (10, -10).
        assert!((x.to_f32() - 10.0).abs() < 0.01);
        assert!((y.to_f32().abs() - 10.0).abs() < 0.01);
        let &Command::CurveTo { x, y, .. } = curves[1] else {
            unreachable!()
        };
        assert_eq!((x, y), (Pt::from_f32(20.0), Pt::ZERO));
    }

    #[test]
    fn degenerate_arcs() {
        assert_eq!(
            construct("M0,0 A0,5 0 0 1 10,0"),
            vec![Command::move_to(0.0, 0.0), Command::line_to(10.0, 0.0)]
        );
        assert_eq!(
            construct("M3,3 A5,5 0 0 1 3,3 L4,4"),
            vec![Command::move_to(3.0, 3.0), Command::line_to(4.0, 4.0)]
        );
    }

    #[test]
    fn subnormal_arc_radii_fall_back_to_line() {
        assert_eq!(
            construct("M0,0 A1e-30,1e-30 0 0 1 10,0"),
            vec![Command::move_to(0.0, 0.0), Command::line_to(10.0, 0.0)]
        );
    }

    #[test]
    fn parse_error_keeps_prefix_and_still_paints() {
        let commands = render_path(&[("d", "M0,0 L10,0 X 5 5 L0,10")]);
        assert_eq!(
            commands,
            vec![
                Command::SetFillColor(Color::BLACK),
                Command::move_to(0.0, 0.0),
                Command::line_to(10.0, 0.0),
                Command::Fill,
            ]
        );
    }

    #[test]
    fn drawing_before_moveto_aborts() {
        assert!(construct("L10,10 M0,0").is_empty());
        let mut canvas = Canvas::new(Size::a4());
        assert!(!draw_path(&attrs(&[("d", "L10,10")]), &mut canvas));
        assert!(!draw_path(&Attributes::new(), &mut canvas));
    }
}
