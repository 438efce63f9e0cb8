//! One-call entry points from SVG markup to a recorded canvas or PDF bytes.

use crate::canvas::{Canvas, CanvasOps};
use crate::context::{DrawContext, DrawOptions};
use crate::error::{Result, SvgRenderError};
use crate::group::parse_view_box;
use crate::length::{parse_absolute_length, viewport_user_extent};
use crate::node::RendererKind;
use crate::pdf;
use crate::processor::Processor;
use crate::transform::AffineTransform;
use crate::types::{Pt, Size};

#[derive(Debug, Clone)]
pub struct SvgConverter {
    page_size: Option<Size>,
    flip_y: bool,
    draw_options: DrawOptions,
    processor: Processor,
}

pub struct SvgConverterBuilder {
    page_size: Option<Size>,
    flip_y: bool,
    draw_options: DrawOptions,
    processor: Processor,
}

impl SvgConverterBuilder {
    pub fn new() -> Self {
        Self {
            page_size: None,
            flip_y: true,
            draw_options: DrawOptions::default(),
            processor: Processor::default(),
        }
    }

    /// Fixed page size. Without one the root's `width`/`height` decide, then A4.
    pub fn page_size(mut self, size: Size) -> Self {
        self.page_size = Some(size);
        self
    }

    /// Map SVG's y-down user space onto the PDF page's y-up space.
    pub fn flip_y(mut self, enabled: bool) -> Self {
        self.flip_y = enabled;
        self
    }

    pub fn draw_options(mut self, options: DrawOptions) -> Self {
        self.draw_options = options;
        self
    }

    pub fn processor(mut self, processor: Processor) -> Self {
        self.processor = processor;
        self
    }

    pub fn build(self) -> Result<SvgConverter> {
        if let Some(size) = self.page_size {
            if size.width <= Pt::ZERO || size.height <= Pt::ZERO {
                return Err(SvgRenderError::InvalidConfiguration(
                    "page_size must be positive".to_string(),
                ));
            }
        }
        Ok(SvgConverter {
            page_size: self.page_size,
            flip_y: self.flip_y,
            draw_options: self.draw_options,
            processor: self.processor,
        })
    }
}

impl Default for SvgConverterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SvgConverter {
    pub fn builder() -> SvgConverterBuilder {
        SvgConverterBuilder::new()
    }

    pub fn convert_to_canvas(&self, svg_xml: &str) -> Result<Canvas> {
        let doc = roxmltree::Document::parse(svg_xml)?;
        let root = doc.root_element();
        let tag = root.tag_name().name();
        if self.processor.kind_for(tag) != Some(RendererKind::Svg) {
            return Err(SvgRenderError::MissingRoot(tag.to_string()));
        }

        let extent = RootExtent::of(&root);
        let page_size = self
            .page_size
            .or(extent.points.map(|(w, h)| Size::new(w, h)))
            .unwrap_or_else(Size::a4);
        let tree = self.processor.process(&root)?;
        let Some(root_id) = tree.root() else {
            return Err(SvgRenderError::MissingRoot(tag.to_string()));
        };

        let mut ctx = DrawContext::with_options(self.draw_options);
        let mut canvas = Canvas::new(page_size);
        if self.flip_y {
            canvas.concat_matrix(&AffineTransform::new(
                1.0,
                0.0,
                0.0,
                -1.0,
                0.0,
                page_size.height.to_f32(),
            ));
        }
        if let Some(scale) = extent.user_to_points() {
            canvas.concat_matrix(&scale);
        }
        ctx.push_canvas(canvas);
        tree.draw(root_id, &mut ctx)?;
        let canvas = ctx.pop_canvas()?;
        tracing::debug!(
            nodes = tree.len(),
            commands = canvas.commands().len(),
            "converted svg"
        );
        Ok(canvas)
    }

    pub fn convert_to_pdf_bytes(&self, svg_xml: &str) -> Result<Vec<u8>> {
        let canvas = self.convert_to_canvas(svg_xml)?;
        let mut out = Vec::new();
        pdf::write_single_page_pdf(canvas.commands(), canvas.page_size(), &mut out)?;
        Ok(out)
    }
}

/// Physical size of the root viewport and its size in user units.
struct RootExtent {
    points: Option<(f32, f32)>,
    user: Option<(f32, f32)>,
    has_view_box: bool,
}

impl RootExtent {
    fn of(root: &roxmltree::Node<'_, '_>) -> Self {
        let pair = |parse: fn(&str) -> Option<f32>| {
            let dim = |name: &str| root.attribute(name).and_then(parse).filter(|v| *v > 0.0);
            dim("width").zip(dim("height"))
        };
        Self {
            points: pair(parse_absolute_length),
            user: pair(viewport_user_extent),
            has_view_box: parse_view_box(root.attribute("viewBox")).is_some(),
        }
    }

    // Without a viewBox the root's user units are laid 1:1 over its
    // viewport, so pixel-sized roots shrink onto their point-sized page.
    fn user_to_points(&self) -> Option<AffineTransform> {
        if self.has_view_box {
            return None;
        }
        let ((pw, ph), (uw, uh)) = (self.points?, self.user?);
        let scale = AffineTransform::scale(pw / uw, ph / uh);
        (!scale.is_identity()).then_some(scale)
    }
}
