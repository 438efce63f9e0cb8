use std::fmt;

/// 2D affine transform `[[a c e], [b d f], [0 0 1]]` acting on column vectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl AffineTransform {
    pub const fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub const fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    pub const fn translate(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    pub const fn scale(sx: f32, sy: f32) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Counter-clockwise rotation in SVG's y-down space, angle in degrees.
    pub fn rotate(deg: f32) -> Self {
        let rad = deg.to_radians();
        let s = libm::sinf(rad);
        let c = libm::cosf(rad);
        Self::new(c, s, -s, c, 0.0, 0.0)
    }

    pub fn rotate_about(deg: f32, cx: f32, cy: f32) -> Self {
        Self::translate(cx, cy)
            .concat(&Self::rotate(deg))
            .concat(&Self::translate(-cx, -cy))
    }

    pub fn skew_x(deg: f32) -> Self {
        Self::new(1.0, 0.0, libm::tanf(deg.to_radians()), 1.0, 0.0, 0.0)
    }

    pub fn skew_y(deg: f32) -> Self {
        Self::new(1.0, libm::tanf(deg.to_radians()), 0.0, 1.0, 0.0, 0.0)
    }

    /// `self * other`: the result applies `other` first, then `self`.
    pub fn concat(&self, other: &Self) -> Self {
        Self {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    /// `other * self`: the result applies `self` first, then `other`.
    pub fn pre_concat(&self, other: &Self) -> Self {
        other.concat(self)
    }

    pub fn determinant(&self) -> f32 {
        self.a * self.d - self.b * self.c
    }

    pub fn invert(&self) -> Option<Self> {
        let det = self.determinant();
        if det.abs() < f32::EPSILON || !det.is_finite() {
            return None;
        }
        let inv = 1.0 / det;
        Some(Self {
            a: self.d * inv,
            b: -self.b * inv,
            c: -self.c * inv,
            d: self.a * inv,
            e: (self.c * self.f - self.d * self.e) * inv,
            f: (self.b * self.e - self.a * self.f) * inv,
        })
    }

    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    pub fn approx_eq(&self, other: &Self, tolerance: f32) -> bool {
        [
            (self.a, other.a),
            (self.b, other.b),
            (self.c, other.c),
            (self.d, other.d),
            (self.e, other.e),
            (self.f, other.f),
        ]
        .iter()
        .all(|(x, y)| (x - y).abs() <= tolerance)
    }
}

impl fmt::Display for AffineTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "matrix({} {} {} {} {} {})",
            self.a, self.b, self.c, self.d, self.e, self.f
        )
    }
}

/// Parses an SVG `transform` list. Functions compose in document order, so the
/// leftmost function is the outermost one. Returns `None` on any malformed entry.
pub fn parse_transform(input: &str) -> Option<AffineTransform> {
    let mut out = AffineTransform::identity();
    let mut s = input.trim();
    if s.is_empty() {
        return None;
    }

    while !s.is_empty() {
        let open = s.find('(')?;
        let name = s[..open].trim();
        let close = s[open + 1..].find(')')?;
        let args = parse_number_list(&s[open + 1..open + 1 + close])?;

        let m = match (name, args.as_slice()) {
            ("matrix", &[a, b, c, d, e, f]) => AffineTransform::new(a, b, c, d, e, f),
            ("translate", &[tx]) => AffineTransform::translate(tx, 0.0),
            ("translate", &[tx, ty]) => AffineTransform::translate(tx, ty),
            ("scale", &[sx]) => AffineTransform::scale(sx, sx),
            ("scale", &[sx, sy]) => AffineTransform::scale(sx, sy),
            ("rotate", &[a]) => AffineTransform::rotate(a),
            ("rotate", &[a, cx, cy]) => AffineTransform::rotate_about(a, cx, cy),
            ("skewX", &[a]) => AffineTransform::skew_x(a),
            ("skewY", &[a]) => AffineTransform::skew_y(a),
            _ => return None,
        };

        out = out.concat(&m);
        s = s[open + 1 + close + 1..].trim_start_matches(|c: char| c.is_whitespace() || c == ',');
    }

    Some(out)
}

fn parse_number_list(input: &str) -> Option<Vec<f32>> {
    input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f32>().ok().filter(|v| v.is_finite()))
        .collect()
}
