use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt;

use crate::canvas::CanvasOps;
use crate::context::DrawContext;
use crate::error::{Result, SvgRenderError};
use crate::paint::{FILL, PaintState, resolve_paint};
use crate::transform::parse_transform;
use crate::{group, path, shapes};

pub const TRANSFORM: &str = "transform";
pub const ID: &str = "id";

/// Raw attribute values keyed by their SVG name.
pub type Attributes = BTreeMap<String, String>;

/// Index of a node inside its [`RendererTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RendererKind {
    Svg,
    Group,
    Path,
    Line,
    Rect,
    Circle,
    Ellipse,
    Polygon,
    Polyline,
}

impl RendererKind {
    pub fn tag_name(self) -> &'static str {
        match self {
            RendererKind::Svg => "svg",
            RendererKind::Group => "g",
            RendererKind::Path => "path",
            RendererKind::Line => "line",
            RendererKind::Rect => "rect",
            RendererKind::Circle => "circle",
            RendererKind::Ellipse => "ellipse",
            RendererKind::Polygon => "polygon",
            RendererKind::Polyline => "polyline",
        }
    }

    /// Containers draw their children and never paint a path of their own.
    pub fn is_container(self) -> bool {
        matches!(self, RendererKind::Svg | RendererKind::Group)
    }
}

#[derive(Debug, Clone)]
pub struct RendererNode {
    kind: RendererKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: Attributes,
    attributes_set: bool,
    drawn: Cell<bool>,
}

impl RendererNode {
    fn new(kind: RendererKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            attributes: Attributes::new(),
            attributes_set: false,
            drawn: Cell::new(false),
        }
    }

    pub fn kind(&self) -> RendererKind {
        self.kind
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Owns every renderer node of one document. Nodes refer to each other by
/// [`NodeId`]; ids are only meaningful for the tree that created them and
/// passing a foreign id panics.
#[derive(Debug, Clone, Default)]
pub struct RendererTree {
    nodes: Vec<RendererNode>,
    root: Option<NodeId>,
}

impl RendererTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_node(&mut self, kind: RendererKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(RendererNode::new(kind));
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    pub fn node(&self, id: NodeId) -> &RendererNode {
        &self.nodes[id.0]
    }

    pub fn kind(&self, id: NodeId) -> RendererKind {
        self.nodes[id.0].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Re-parents `child`. It is removed from its previous parent's children; use
    /// [`RendererTree::add_child`] to also list it under the new parent.
    pub fn set_parent(&mut self, child: NodeId, parent: Option<NodeId>) -> Result<()> {
        if let Some(parent) = parent {
            self.check_acyclic(parent, child)?;
        }
        self.detach(child);
        self.nodes[child.0].parent = parent;
        Ok(())
    }

    /// Appends `child` to `parent`'s children. `None` is ignored.
    pub fn add_child(&mut self, parent: NodeId, child: Option<NodeId>) -> Result<()> {
        let Some(child) = child else {
            return Ok(());
        };
        self.check_acyclic(parent, child)?;
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        Ok(())
    }

    /// Sets the attribute map of a node. Repeating the call with an identical map
    /// before the node is drawn is a no-op; any other second call, and any call
    /// once the node has been drawn, is a caller bug.
    pub fn set_attributes_and_styles(&mut self, id: NodeId, attributes: Attributes) -> Result<()> {
        let node = &mut self.nodes[id.0];
        if node.drawn.get() {
            return Err(SvgRenderError::AttributesAlreadySet(id));
        }
        if node.attributes_set {
            if node.attributes == attributes {
                return Ok(());
            }
            return Err(SvgRenderError::AttributesAlreadySet(id));
        }
        node.attributes = attributes;
        node.attributes_set = true;
        Ok(())
    }

    pub fn attributes(&self, id: NodeId) -> &Attributes {
        &self.nodes[id.0].attributes
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes[id.0].attribute(name)
    }

    pub fn set_attribute(&mut self, id: NodeId, name: impl Into<String>, value: impl Into<String>) {
        self.nodes[id.0]
            .attributes
            .insert(name.into(), value.into());
    }

    /// Draws `id` and its subtree onto the context's current canvas.
    ///
    /// Order: the node's own `transform`, paint setup, geometry (or children),
    /// painting, then registration of its `id`.
    pub fn draw<C: CanvasOps>(&self, id: NodeId, ctx: &mut DrawContext<C>) -> Result<()> {
        let node = &self.nodes[id.0];
        let options = ctx.options();
        tracing::trace!(node = %id, kind = node.kind.tag_name(), "draw");
        node.drawn.set(true);

        if options.isolate_nodes {
            ctx.current_canvas()?.save_state();
        }

        if let Some(raw) = node.attribute(TRANSFORM).filter(|v| !v.trim().is_empty()) {
            match parse_transform(raw) {
                Some(transform) => ctx.current_canvas()?.concat_matrix(&transform),
                None => tracing::warn!(node = %id, value = raw, "ignoring unparsable transform"),
            }
        }

        let paint = self.pre_draw(id, ctx)?;
        let constructed = self.do_draw(id, ctx)?;
        if constructed {
            self.post_draw(id, &paint, ctx)?;
        }

        if options.isolate_nodes {
            ctx.current_canvas()?.restore_state();
        }

        if let Some(name) = node.attribute(ID) {
            ctx.add_named_object(name, id);
        }
        Ok(())
    }

    fn pre_draw<C: CanvasOps>(&self, id: NodeId, ctx: &mut DrawContext<C>) -> Result<PaintState> {
        let node = &self.nodes[id.0];
        let paint = resolve_paint(&node.attributes, self.can_element_fill(id));
        let canvas = ctx.current_canvas()?;
        if paint.fill_enabled {
            canvas.set_fill_color(paint.fill_color);
        }
        if paint.stroke_enabled {
            canvas.set_stroke_color(paint.stroke_color);
            canvas.set_line_width(paint.stroke_width);
        }
        Ok(paint)
    }

    // Returns whether a path was constructed that still has to be painted.
    fn do_draw<C: CanvasOps>(&self, id: NodeId, ctx: &mut DrawContext<C>) -> Result<bool> {
        let node = &self.nodes[id.0];
        let attrs = &node.attributes;
        let constructed = match node.kind {
            RendererKind::Svg => {
                group::draw_svg(self, id, ctx)?;
                false
            }
            RendererKind::Group => {
                group::draw_group(self, id, ctx)?;
                false
            }
            RendererKind::Path => path::draw_path(attrs, ctx.current_canvas()?),
            RendererKind::Line => shapes::draw_line(attrs, ctx.current_canvas()?),
            RendererKind::Rect => shapes::draw_rect(attrs, ctx.current_canvas()?),
            RendererKind::Circle => shapes::draw_circle(attrs, ctx.current_canvas()?),
            RendererKind::Ellipse => shapes::draw_ellipse(attrs, ctx.current_canvas()?),
            RendererKind::Polygon => shapes::draw_polygon(attrs, ctx.current_canvas()?),
            RendererKind::Polyline => shapes::draw_polyline(attrs, ctx.current_canvas()?),
        };
        Ok(constructed)
    }

    fn post_draw<C: CanvasOps>(
        &self,
        id: NodeId,
        paint: &PaintState,
        ctx: &mut DrawContext<C>,
    ) -> Result<()> {
        if self.nodes[id.0].kind.is_container() {
            return Ok(());
        }
        let trailing_close = ctx.options().trailing_close_path;
        let canvas = ctx.current_canvas()?;
        match (paint.fill_enabled, paint.stroke_enabled) {
            (true, true) if paint.fill_rule_even_odd => canvas.eo_fill_stroke(),
            (true, true) => canvas.fill_stroke(),
            (true, false) if paint.fill_rule_even_odd => canvas.eo_fill(),
            (true, false) => canvas.fill(),
            (false, true) => canvas.stroke(),
            (false, false) => canvas.end_path(),
        }
        if trailing_close {
            canvas.close_path();
        }
        Ok(())
    }

    fn can_element_fill(&self, id: NodeId) -> bool {
        let node = &self.nodes[id.0];
        match node.kind {
            RendererKind::Line => false,
            // An open polyline only gets an interior when one is asked for.
            RendererKind::Polyline => node.attributes.contains_key(FILL),
            _ => true,
        }
    }

    fn check_acyclic(&self, parent: NodeId, child: NodeId) -> Result<()> {
        let mut cursor = Some(parent);
        while let Some(current) = cursor {
            if current == child {
                return Err(SvgRenderError::CyclicTree { parent, child });
            }
            cursor = self.nodes[current.0].parent;
        }
        Ok(())
    }

    fn detach(&mut self, child: NodeId) {
        if let Some(old) = self.nodes[child.0].parent.take() {
            self.nodes[old.0].children.retain(|c| *c != child);
        }
    }
}
