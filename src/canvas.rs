use crate::transform::AffineTransform;
use crate::types::{Color, Pt, Size};

/// The narrow surface of a PDF content-stream emitter that renderers draw through.
///
/// Coordinates are PDF user units. Painting operators consume the current path,
/// exactly like their PDF counterparts.
pub trait CanvasOps {
    fn move_to(&mut self, x: Pt, y: Pt);
    fn line_to(&mut self, x: Pt, y: Pt);
    fn curve_to(&mut self, x1: Pt, y1: Pt, x2: Pt, y2: Pt, x: Pt, y: Pt);

    /// Whether [`CanvasOps::quad_to`] is available. When it is not, callers elevate
    /// quadratic segments with [`quad_to_cubic`] and use `curve_to`.
    fn supports_quad_to(&self) -> bool {
        false
    }

    /// Only called when `supports_quad_to` returns true.
    fn quad_to(&mut self, _x1: Pt, _y1: Pt, _x: Pt, _y: Pt) {}

    fn close_path(&mut self);
    fn fill(&mut self);
    fn eo_fill(&mut self);
    fn stroke(&mut self);
    fn fill_stroke(&mut self);
    fn eo_fill_stroke(&mut self);
    /// Ends the current path without painting it.
    fn end_path(&mut self);

    fn set_fill_color(&mut self, color: Color);
    fn set_stroke_color(&mut self, color: Color);
    fn set_line_width(&mut self, width: Pt);
    fn concat_matrix(&mut self, matrix: &AffineTransform);
    fn save_state(&mut self);
    fn restore_state(&mut self);
}

/// Control points of the cubic Bezier equivalent to the quadratic `p0 -> p1 -> p2`.
pub fn quad_to_cubic(
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
) -> (f32, f32, f32, f32) {
    let c1x = x0 + (2.0 / 3.0) * (x1 - x0);
    let c1y = y0 + (2.0 / 3.0) * (y1 - y0);
    let c2x = x2 + (2.0 / 3.0) * (x1 - x2);
    let c2y = y2 + (2.0 / 3.0) * (y1 - y2);
    (c1x, c1y, c2x, c2y)
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SaveState,
    RestoreState,
    ConcatMatrix {
        a: f32,
        b: f32,
        c: f32,
        d: f32,
        e: Pt,
        f: Pt,
    },
    SetFillColor(Color),
    SetStrokeColor(Color),
    SetLineWidth(Pt),
    MoveTo {
        x: Pt,
        y: Pt,
    },
    LineTo {
        x: Pt,
        y: Pt,
    },
    CurveTo {
        x1: Pt,
        y1: Pt,
        x2: Pt,
        y2: Pt,
        x: Pt,
        y: Pt,
    },
    // PDF has no quadratic operator; the serializer elevates this to a cubic.
    QuadTo {
        x1: Pt,
        y1: Pt,
        x: Pt,
        y: Pt,
    },
    ClosePath,
    Fill,
    FillEvenOdd,
    Stroke,
    FillStroke,
    FillStrokeEvenOdd,
    EndPath,
}

impl Command {
    pub fn move_to(x: f32, y: f32) -> Self {
        Command::MoveTo {
            x: Pt::from_f32(x),
            y: Pt::from_f32(y),
        }
    }

    pub fn line_to(x: f32, y: f32) -> Self {
        Command::LineTo {
            x: Pt::from_f32(x),
            y: Pt::from_f32(y),
        }
    }

    pub fn curve_to(x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) -> Self {
        Command::CurveTo {
            x1: Pt::from_f32(x1),
            y1: Pt::from_f32(y1),
            x2: Pt::from_f32(x2),
            y2: Pt::from_f32(y2),
            x: Pt::from_f32(x),
            y: Pt::from_f32(y),
        }
    }

    pub fn quad_to(x1: f32, y1: f32, x: f32, y: f32) -> Self {
        Command::QuadTo {
            x1: Pt::from_f32(x1),
            y1: Pt::from_f32(y1),
            x: Pt::from_f32(x),
            y: Pt::from_f32(y),
        }
    }

    pub fn concat(m: &AffineTransform) -> Self {
        Command::ConcatMatrix {
            a: m.a,
            b: m.b,
            c: m.c,
            d: m.d,
            e: Pt::from_f32(m.e),
            f: Pt::from_f32(m.f),
        }
    }
}

#[derive(Debug, Clone)]
struct GraphicsState {
    fill_color: Color,
    stroke_color: Color,
    line_width: Pt,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            fill_color: Color::BLACK,
            stroke_color: Color::BLACK,
            line_width: Pt::from_i32(1),
        }
    }
}

/// Records canvas operations as [`Command`]s for one page.
#[derive(Debug, Clone)]
pub struct Canvas {
    page_size: Size,
    commands: Vec<Command>,
    state_stack: Vec<GraphicsState>,
    current_state: GraphicsState,
}

impl Canvas {
    pub fn new(page_size: Size) -> Self {
        Self {
            page_size,
            commands: Vec::new(),
            state_stack: Vec::new(),
            current_state: GraphicsState::default(),
        }
    }

    pub fn page_size(&self) -> Size {
        self.page_size
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<Command> {
        self.commands
    }

    pub fn fill_color(&self) -> Color {
        self.current_state.fill_color
    }

    pub fn stroke_color(&self) -> Color {
        self.current_state.stroke_color
    }

    pub fn line_width(&self) -> Pt {
        self.current_state.line_width
    }

    pub fn state_depth(&self) -> usize {
        self.state_stack.len()
    }
}

impl CanvasOps for Canvas {
    fn move_to(&mut self, x: Pt, y: Pt) {
        self.commands.push(Command::MoveTo { x, y });
    }

    fn line_to(&mut self, x: Pt, y: Pt) {
        self.commands.push(Command::LineTo { x, y });
    }

    fn curve_to(&mut self, x1: Pt, y1: Pt, x2: Pt, y2: Pt, x: Pt, y: Pt) {
        self.commands.push(Command::CurveTo {
            x1,
            y1,
            x2,
            y2,
            x,
            y,
        });
    }

    fn supports_quad_to(&self) -> bool {
        true
    }

    fn quad_to(&mut self, x1: Pt, y1: Pt, x: Pt, y: Pt) {
        self.commands.push(Command::QuadTo { x1, y1, x, y });
    }

    fn close_path(&mut self) {
        self.commands.push(Command::ClosePath);
    }

    fn fill(&mut self) {
        self.commands.push(Command::Fill);
    }

    fn eo_fill(&mut self) {
        self.commands.push(Command::FillEvenOdd);
    }

    fn stroke(&mut self) {
        self.commands.push(Command::Stroke);
    }

    fn fill_stroke(&mut self) {
        self.commands.push(Command::FillStroke);
    }

    fn eo_fill_stroke(&mut self) {
        self.commands.push(Command::FillStrokeEvenOdd);
    }

    fn end_path(&mut self) {
        self.commands.push(Command::EndPath);
    }

    fn set_fill_color(&mut self, color: Color) {
        self.current_state.fill_color = color;
        self.commands.push(Command::SetFillColor(color));
    }

    fn set_stroke_color(&mut self, color: Color) {
        self.current_state.stroke_color = color;
        self.commands.push(Command::SetStrokeColor(color));
    }

    fn set_line_width(&mut self, width: Pt) {
        let width = width.max(Pt::ZERO);
        self.current_state.line_width = width;
        self.commands.push(Command::SetLineWidth(width));
    }

    fn concat_matrix(&mut self, matrix: &AffineTransform) {
        self.commands.push(Command::concat(matrix));
    }

    fn save_state(&mut self) {
        self.state_stack.push(self.current_state.clone());
        self.commands.push(Command::SaveState);
    }

    fn restore_state(&mut self) {
        // An unbalanced restore would make the content stream invalid; drop it.
        if let Some(state) = self.state_stack.pop() {
            self.current_state = state;
            self.commands.push(Command::RestoreState);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_path_and_paint_operators_in_order() {
        let mut canvas = Canvas::new(Size::a4());
        canvas.set_fill_color(Color::BLACK);
        canvas.move_to(Pt::from_i32(1), Pt::from_i32(2));
        canvas.line_to(Pt::from_i32(3), Pt::from_i32(4));
        canvas.close_path();
        canvas.fill();
        assert_eq!(
            canvas.commands(),
            &[
                Command::SetFillColor(Color::BLACK),
                Command::move_to(1.0, 2.0),
                Command::line_to(3.0, 4.0),
                Command::ClosePath,
                Command::Fill,
            ]
        );
    }

    #[test]
    fn restore_brings_back_saved_paint_state() {
        let mut canvas = Canvas::new(Size::a4());
        canvas.save_state();
        canvas.set_fill_color(Color::WHITE);
        canvas.set_line_width(Pt::from_i32(4));
        assert_eq!(canvas.fill_color(), Color::WHITE);
        canvas.restore_state();
        assert_eq!(canvas.fill_color(), Color::BLACK);
        assert_eq!(canvas.line_width(), Pt::from_i32(1));
        assert_eq!(canvas.state_depth(), 0);
    }

    #[test]
    fn unbalanced_restore_is_ignored() {
        let mut canvas = Canvas::new(Size::a4());
        canvas.restore_state();
        assert!(canvas.commands().is_empty());
    }

    #[test]
    fn negative_line_width_is_clamped() {
        let mut canvas = Canvas::new(Size::a4());
        canvas.set_line_width(Pt::from_i32(-3));
        assert_eq!(canvas.commands(), &[Command::SetLineWidth(Pt::ZERO)]);
    }

    #[test]
    fn quad_elevation_uses_two_thirds_rule() {
        let (c1x, c1y, c2x, c2y) = quad_to_cubic(0.0, 0.0, 3.0, 3.0, 6.0, 0.0);
        assert!((c1x - 2.0).abs() < 1e-5 && (c1y - 2.0).abs() < 1e-5);
        assert!((c2x - 4.0).abs() < 1e-5 && (c2y - 2.0).abs() < 1e-5);
    }
}
