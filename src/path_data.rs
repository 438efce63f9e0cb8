//! Tokenizer for the SVG path `d` attribute.
//!
//! The parser is permissive about separators (any mix of whitespace and commas,
//! or none at all between `10-5` and `.5.5`) and turns implicit command repeats into
//! explicit commands, so every [`PathCommand`] carries exactly `kind.arity()`
//! parameters. Parsing stops at the first error; the commands read up to that point
//! are kept and the error is reported next to them.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathCommandKind {
    MoveAbs,
    MoveRel,
    LineAbs,
    LineRel,
    HLineAbs,
    HLineRel,
    VLineAbs,
    VLineRel,
    CubicAbs,
    CubicRel,
    SmoothCubicAbs,
    SmoothCubicRel,
    QuadAbs,
    QuadRel,
    SmoothQuadAbs,
    SmoothQuadRel,
    ArcAbs,
    ArcRel,
    Close,
}

impl PathCommandKind {
    pub fn from_letter(letter: char) -> Option<Self> {
        use PathCommandKind::*;
        Some(match letter {
            'M' => MoveAbs,
            'm' => MoveRel,
            'L' => LineAbs,
            'l' => LineRel,
            'H' => HLineAbs,
            'h' => HLineRel,
            'V' => VLineAbs,
            'v' => VLineRel,
            'C' => CubicAbs,
            'c' => CubicRel,
            'S' => SmoothCubicAbs,
            's' => SmoothCubicRel,
            'Q' => QuadAbs,
            'q' => QuadRel,
            'T' => SmoothQuadAbs,
            't' => SmoothQuadRel,
            'A' => ArcAbs,
            'a' => ArcRel,
            'Z' | 'z' => Close,
            _ => return None,
        })
    }

    pub fn letter(self) -> char {
        use PathCommandKind::*;
        match self {
            MoveAbs => 'M',
            MoveRel => 'm',
            LineAbs => 'L',
            LineRel => 'l',
            HLineAbs => 'H',
            HLineRel => 'h',
            VLineAbs => 'V',
            VLineRel => 'v',
            CubicAbs => 'C',
            CubicRel => 'c',
            SmoothCubicAbs => 'S',
            SmoothCubicRel => 's',
            QuadAbs => 'Q',
            QuadRel => 'q',
            SmoothQuadAbs => 'T',
            SmoothQuadRel => 't',
            ArcAbs => 'A',
            ArcRel => 'a',
            Close => 'Z',
        }
    }

    pub fn arity(self) -> usize {
        use PathCommandKind::*;
        match self {
            Close => 0,
            HLineAbs | HLineRel | VLineAbs | VLineRel => 1,
            MoveAbs | MoveRel | LineAbs | LineRel | SmoothQuadAbs | SmoothQuadRel => 2,
            SmoothCubicAbs | SmoothCubicRel | QuadAbs | QuadRel => 4,
            CubicAbs | CubicRel => 6,
            ArcAbs | ArcRel => 7,
        }
    }

    pub fn is_relative(self) -> bool {
        self != PathCommandKind::Close && self.letter().is_ascii_lowercase()
    }

    // Command used for the parameter groups that follow the first one.
    fn repeated(self) -> Self {
        match self {
            PathCommandKind::MoveAbs => PathCommandKind::LineAbs,
            PathCommandKind::MoveRel => PathCommandKind::LineRel,
            other => other,
        }
    }

    fn is_arc(self) -> bool {
        matches!(self, PathCommandKind::ArcAbs | PathCommandKind::ArcRel)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathCommand {
    pub kind: PathCommandKind,
    pub args: Vec<f32>,
}

impl PathCommand {
    pub fn new(kind: PathCommandKind, args: Vec<f32>) -> Self {
        Self { kind, args }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PathDataError {
    #[error("unsupported path command '{letter}' at byte {offset}")]
    UnknownCommand { letter: char, offset: usize },
    #[error("number at byte {offset} does not belong to any command")]
    UnexpectedNumber { offset: usize },
    #[error("'{letter}' at byte {offset} expects {expected} parameters, found {found}")]
    IncompleteParameters {
        letter: char,
        offset: usize,
        expected: usize,
        found: usize,
    },
    #[error("malformed number at byte {offset}")]
    InvalidNumber { offset: usize },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathData {
    pub commands: Vec<PathCommand>,
    /// Why parsing stopped early, if it did.
    pub error: Option<PathDataError>,
}

impl PathData {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

pub fn parse_path_data(d: &str) -> PathData {
    let mut out = PathData::default();
    let mut p = PathParser::new(d);
    let mut current: Option<PathCommandKind> = None;

    loop {
        p.skip_separators();
        let Some(b) = p.peek() else { break };
        let offset = p.i;

        let kind = if b.is_ascii_alphabetic() {
            p.i += 1;
            let letter = b as char;
            let Some(kind) = PathCommandKind::from_letter(letter) else {
                out.error = Some(PathDataError::UnknownCommand { letter, offset });
                break;
            };
            if kind == PathCommandKind::Close {
                out.commands.push(PathCommand::new(kind, Vec::new()));
                current = Some(kind);
                continue;
            }
            kind
        } else {
            match current {
                Some(kind) if kind != PathCommandKind::Close => kind,
                _ => {
                    out.error = Some(PathDataError::UnexpectedNumber { offset });
                    break;
                }
            }
        };

        match p.read_group(kind, offset) {
            Ok(args) => {
                out.commands.push(PathCommand::new(kind, args));
                current = Some(kind.repeated());
            }
            Err(err) => {
                out.error = Some(err);
                break;
            }
        }
    }

    out
}

struct PathParser<'a> {
    bytes: &'a [u8],
    i: usize,
}

impl<'a> PathParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            bytes: input.as_bytes(),
            i: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.i).copied()
    }

    fn skip_separators(&mut self) {
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() || b == b',' {
                self.i += 1;
            } else {
                break;
            }
        }
    }

    fn read_group(
        &mut self,
        kind: PathCommandKind,
        offset: usize,
    ) -> Result<Vec<f32>, PathDataError> {
        let expected = kind.arity();
        let mut args = Vec::with_capacity(expected);
        for idx in 0..expected {
            self.skip_separators();
            let value = if kind.is_arc() && (idx == 3 || idx == 4) {
                self.next_flag()
            } else {
                self.next_number()
            };
            match value {
                Some(v) => args.push(v),
                None => {
                    return Err(match self.peek() {
                        Some(b) if !b.is_ascii_alphabetic() => {
                            PathDataError::InvalidNumber { offset: self.i }
                        }
                        _ => PathDataError::IncompleteParameters {
                            letter: kind.letter(),
                            offset,
                            expected,
                            found: args.len(),
                        },
                    });
                }
            }
        }
        Ok(args)
    }

    fn next_number(&mut self) -> Option<f32> {
        let start = self.i;
        let bytes = self.bytes;
        let mut i = self.i;
        let mut digits = false;

        if i < bytes.len() && matches!(bytes[i], b'+' | b'-') {
            i += 1;
        }
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
            digits = true;
        }
        if i < bytes.len() && bytes[i] == b'.' {
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
                digits = true;
            }
        }
        if !digits {
            return None;
        }
        if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
            let mut j = i + 1;
            if j < bytes.len() && matches!(bytes[j], b'+' | b'-') {
                j += 1;
            }
            let exp_start = j;
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            if j > exp_start {
                i = j;
            }
        }

        let value = std::str::from_utf8(&bytes[start..i])
            .ok()?
            .parse::<f32>()
            .ok()
            .filter(|v| v.is_finite())?;
        self.i = i;
        Some(value)
    }

    // Arc flags may be written without separators ("a5 5 0 01 10 10").
    fn next_flag(&mut self) -> Option<f32> {
        match self.peek()? {
            b'0' => {
                self.i += 1;
                Some(0.0)
            }
            b'1' => {
                self.i += 1;
                Some(1.0)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PathCommandKind::*;

    fn kinds(data: &PathData) -> Vec<PathCommandKind> {
        data.commands.iter().map(|c| c.kind).collect()
    }

    #[test]
    fn stray_commas_are_separators() {
        let data = parse_path_data("M 100,100, L300,100,L200,300,z");
        assert!(data.is_complete());
        assert_eq!(kinds(&data), vec![MoveAbs, LineAbs, LineAbs, Close]);
        assert_eq!(data.commands[2].args, vec![200.0, 300.0]);
    }

    #[test]
    fn implicit_repeat_after_move_becomes_line() {
        let data = parse_path_data("M0 0 10 10 20 0 m5 5 1 1");
        assert_eq!(kinds(&data), vec![MoveAbs, LineAbs, LineAbs, MoveRel, LineRel]);
    }

    #[test]
    fn implicit_repeat_keeps_other_commands() {
        let data = parse_path_data("M0 0 C1 1 2 2 3 3 4 4 5 5 6 6 h1 2 3");
        assert_eq!(
            kinds(&data),
            vec![MoveAbs, CubicAbs, CubicAbs, HLineRel, HLineRel, HLineRel]
        );
    }

    #[test]
    fn compact_numbers_split_on_sign_and_second_dot() {
        let data = parse_path_data("M10-5L.5.5-1e1-2E-1");
        assert!(data.is_complete());
        assert_eq!(data.commands[0].args, vec![10.0, -5.0]);
        assert_eq!(data.commands[1].args, vec![0.5, 0.5]);
        assert_eq!(data.commands[2].args, vec![-10.0, -0.2]);
    }

    #[test]
    fn arc_flags_can_be_packed() {
        let data = parse_path_data("M10 10 A5 5 0 01 20 20");
        assert!(data.is_complete());
        assert_eq!(data.commands[1].kind, ArcAbs);
        assert_eq!(data.commands[1].args, vec![5.0, 5.0, 0.0, 0.0, 1.0, 20.0, 20.0]);
    }

    #[test]
    fn unknown_command_truncates_but_keeps_prefix() {
        let data = parse_path_data("M0 0 L10 10 X 5 5 L20 20");
        assert_eq!(kinds(&data), vec![MoveAbs, LineAbs]);
        assert_eq!(
            data.error,
            Some(PathDataError::UnknownCommand {
                letter: 'X',
                offset: 12
            })
        );
    }

    #[test]
    fn incomplete_group_is_reported() {
        let data = parse_path_data("M0 0 C1 1 2 2 3");
        assert_eq!(kinds(&data), vec![MoveAbs]);
        assert!(matches!(
            data.error,
            Some(PathDataError::IncompleteParameters {
                letter: 'C',
                expected: 6,
                found: 5,
                ..
            })
        ));
    }

    #[test]
    fn numbers_before_any_command_are_rejected() {
        let data = parse_path_data("10 10 L5 5");
        assert!(data.commands.is_empty());
        assert_eq!(data.error, Some(PathDataError::UnexpectedNumber { offset: 0 }));
    }

    #[test]
    fn numbers_after_close_are_rejected() {
        let data = parse_path_data("M0 0 L1 1 Z 4 4");
        assert_eq!(kinds(&data), vec![MoveAbs, LineAbs, Close]);
        assert!(matches!(data.error, Some(PathDataError::UnexpectedNumber { .. })));
    }

    #[test]
    fn garbage_inside_group_is_invalid_number() {
        let data = parse_path_data("M0 0 L1 #");
        assert_eq!(kinds(&data), vec![MoveAbs]);
        assert_eq!(data.error, Some(PathDataError::InvalidNumber { offset: 8 }));
    }

    #[test]
    fn empty_input_is_empty_and_complete() {
        let data = parse_path_data("   ");
        assert!(data.commands.is_empty());
        assert!(data.is_complete());
    }

    #[test]
    fn relative_flag_follows_letter_case() {
        assert!(CubicRel.is_relative());
        assert!(!ArcAbs.is_relative());
        assert!(!Close.is_relative());
        assert_eq!(PathCommandKind::from_letter('z'), Some(Close));
    }
}
