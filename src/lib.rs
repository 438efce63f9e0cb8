mod canvas;
mod color;
mod context;
mod converter;
mod error;
mod group;
mod length;
mod node;
mod paint;
mod path;
mod path_data;
pub mod pdf;
mod processor;
mod shapes;
mod transform;
mod types;

pub use canvas::{Canvas, CanvasOps, Command, quad_to_cubic};
pub use color::{ColorValue, named_color, parse_color};
pub use context::{DrawContext, DrawOptions};
pub use converter::{SvgConverter, SvgConverterBuilder};
pub use error::{Result, SvgRenderError};
pub use length::parse_absolute_length;
pub use node::{Attributes, NodeId, RendererKind, RendererNode, RendererTree};
pub use paint::{PaintState, resolve_paint};
pub use path_data::{PathCommand, PathCommandKind, PathData, PathDataError, parse_path_data};
pub use processor::{ElementNode, Processor, parse_style_declarations, with_inline_style};
pub use shapes::parse_points;
pub use transform::{AffineTransform, parse_transform};
pub use types::{Color, Pt, Size};
