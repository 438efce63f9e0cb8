//! Content-stream serialization of recorded canvas commands, and a minimal
//! single-page PDF writer built on `lopdf`.

use std::io::Write;

use lopdf::content::{Content, Operation};
use lopdf::{Document as LoDocument, Object as LoObject, Stream as LoStream, dictionary};

use crate::canvas::{Command, quad_to_cubic};
use crate::error::Result;
use crate::types::{Color, Pt, Size};

const PDF_VERSION: &str = "1.7";

// Integral values are written as integers to keep streams short.
fn number(value: f32) -> LoObject {
    if value.fract() == 0.0 && value.abs() < i32::MAX as f32 {
        LoObject::Integer(value as i64)
    } else {
        LoObject::Real(value)
    }
}

fn pt(value: Pt) -> LoObject {
    let milli = value.to_milli_i64();
    if milli % 1000 == 0 {
        LoObject::Integer(milli / 1000)
    } else {
        LoObject::Real(milli as f32 / 1000.0)
    }
}

fn rgb(color: Color) -> Vec<LoObject> {
    vec![number(color.r), number(color.g), number(color.b)]
}

fn op(operator: &str, operands: Vec<LoObject>) -> Operation {
    Operation::new(operator, operands)
}

/// Maps commands to PDF operators. Quadratic segments are elevated to cubics
/// against the tracked current point, since PDF has no quadratic operator.
pub fn content_operations(commands: &[Command]) -> Vec<Operation> {
    let mut ops = Vec::with_capacity(commands.len());
    let mut current = (Pt::ZERO, Pt::ZERO);
    let mut subpath_start = current;

    for cmd in commands {
        match *cmd {
            Command::SaveState => ops.push(op("q", vec![])),
            Command::RestoreState => ops.push(op("Q", vec![])),
            Command::ConcatMatrix { a, b, c, d, e, f } => ops.push(op(
                "cm",
                vec![number(a), number(b), number(c), number(d), pt(e), pt(f)],
            )),
            Command::SetFillColor(color) => ops.push(op("rg", rgb(color))),
            Command::SetStrokeColor(color) => ops.push(op("RG", rgb(color))),
            Command::SetLineWidth(width) => ops.push(op("w", vec![pt(width)])),
            Command::MoveTo { x, y } => {
                ops.push(op("m", vec![pt(x), pt(y)]));
                current = (x, y);
                subpath_start = current;
            }
            Command::LineTo { x, y } => {
                ops.push(op("l", vec![pt(x), pt(y)]));
                current = (x, y);
            }
            Command::CurveTo { x1, y1, x2, y2, x, y } => {
                ops.push(op(
                    "c",
                    vec![pt(x1), pt(y1), pt(x2), pt(y2), pt(x), pt(y)],
                ));
                current = (x, y);
            }
            Command::QuadTo { x1, y1, x, y } => {
                let (c1x, c1y, c2x, c2y) = quad_to_cubic(
                    current.0.to_f32(),
                    current.1.to_f32(),
                    x1.to_f32(),
                    y1.to_f32(),
                    x.to_f32(),
                    y.to_f32(),
                );
                ops.push(op(
                    "c",
                    vec![
                        pt(Pt::from_f32(c1x)),
                        pt(Pt::from_f32(c1y)),
                        pt(Pt::from_f32(c2x)),
                        pt(Pt::from_f32(c2y)),
                        pt(x),
                        pt(y),
                    ],
                ));
                current = (x, y);
            }
            Command::ClosePath => {
                ops.push(op("h", vec![]));
                current = subpath_start;
            }
            Command::Fill => ops.push(op("f", vec![])),
            Command::FillEvenOdd => ops.push(op("f*", vec![])),
            Command::Stroke => ops.push(op("S", vec![])),
            Command::FillStroke => ops.push(op("B", vec![])),
            Command::FillStrokeEvenOdd => ops.push(op("B*", vec![])),
            Command::EndPath => ops.push(op("n", vec![])),
        }
    }
    ops
}

pub fn encode_content(commands: &[Command]) -> Result<Vec<u8>> {
    let content = Content {
        operations: content_operations(commands),
    };
    Ok(content.encode()?)
}

/// Writes a one-page document whose page content is `commands`.
pub fn write_single_page_pdf<W: Write>(commands: &[Command], size: Size, writer: &mut W) -> Result<()> {
    let mut doc = LoDocument::with_version(PDF_VERSION);
    let pages_id = doc.new_object_id();
    let content_id = doc.add_object(LoStream::new(dictionary! {}, encode_content(commands)?));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => dictionary! {},
        "MediaBox" => vec![0.into(), 0.into(), pt(size.width), pt(size.height)],
    });
    doc.objects.insert(
        pages_id,
        LoObject::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();
    doc.save_to(writer)?;
    tracing::debug!(operators = commands.len(), "wrote single page pdf");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::AffineTransform;

    fn operators(commands: &[Command]) -> Vec<String> {
        content_operations(commands)
            .into_iter()
            .map(|o| o.operator)
            .collect()
    }

    fn operands(op: &Operation) -> Vec<f32> {
        op.operands.iter().map(|o| o.as_float().unwrap()).collect()
    }

    #[test]
    fn every_command_has_an_operator() {
        let commands = vec![
            Command::SaveState,
            Command::concat(&AffineTransform::translate(1.0, 2.0)),
            Command::SetFillColor(Color::BLACK),
            Command::SetStrokeColor(Color::WHITE),
            Command::SetLineWidth(Pt::from_f32(0.5)),
            Command::move_to(0.0, 0.0),
            Command::line_to(1.0, 0.0),
            Command::curve_to(1.0, 1.0, 2.0, 2.0, 3.0, 3.0),
            Command::quad_to(4.0, 4.0, 5.0, 5.0),
            Command::ClosePath,
            Command::Fill,
            Command::FillEvenOdd,
            Command::Stroke,
            Command::FillStroke,
            Command::FillStrokeEvenOdd,
            Command::EndPath,
            Command::RestoreState,
        ];
        assert_eq!(
            operators(&commands),
            vec![
                "q", "cm", "rg", "RG", "w", "m", "l", "c", "c", "h", "f", "f*", "S", "B", "B*",
                "n", "Q"
            ]
        );
    }

    #[test]
    fn quad_is_elevated_from_current_point() {
        let ops = content_operations(&[
            Command::move_to(0.0, 0.0),
            Command::quad_to(30.0, 60.0, 90.0, 0.0),
        ]);
        assert_eq!(operands(&ops[1]), vec![20.0, 40.0, 50.0, 40.0, 90.0, 0.0]);
    }

    #[test]
    fn quad_after_close_starts_at_subpath_start() {
        let ops = content_operations(&[
            Command::move_to(0.0, 0.0),
            Command::line_to(90.0, 90.0),
            Command::ClosePath,
            Command::quad_to(30.0, 60.0, 90.0, 0.0),
        ]);
        assert_eq!(operands(&ops[3])[..2], [20.0, 40.0]);
    }

    #[test]
    fn encoded_stream_decodes_back() {
        let bytes = encode_content(&[
            Command::SetLineWidth(Pt::from_f32(1.5)),
            Command::move_to(10.0, 20.0),
            Command::line_to(30.25, 40.0),
            Command::Stroke,
        ])
        .unwrap();
        let decoded = Content::decode(&bytes).unwrap();
        let names: Vec<_> = decoded.operations.iter().map(|o| o.operator.as_str()).collect();
        assert_eq!(names, vec!["w", "m", "l", "S"]);
        assert_eq!(operands(&decoded.operations[0]), vec![1.5]);
        assert_eq!(operands(&decoded.operations[2]), vec![30.25, 40.0]);
    }

    #[test]
    fn single_page_pdf_round_trips_through_lopdf() {
        let mut out = Vec::new();
        write_single_page_pdf(
            &[Command::move_to(0.0, 0.0), Command::line_to(5.0, 5.0), Command::Stroke],
            Size::letter(),
            &mut out,
        )
        .unwrap();
        assert!(out.starts_with(b"%PDF-1.7"));

        let doc = LoDocument::load_mem(&out).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1);
        let page_id = *pages.values().next().unwrap();
        let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
        let names: Vec<_> = content.operations.iter().map(|o| o.operator.as_str()).collect();
        assert_eq!(names, vec!["m", "l", "S"]);

        let page = doc.get_dictionary(page_id).unwrap();
        let media_box: Vec<f32> = page
            .get(b"MediaBox")
            .and_then(LoObject::as_array)
            .unwrap()
            .iter()
            .map(|o| o.as_float().unwrap())
            .collect();
        assert_eq!(media_box, vec![0.0, 0.0, 612.0, 792.0]);
    }
}
