use std::collections::BTreeMap;

use crate::canvas::{Canvas, CanvasOps};
use crate::error::{Result, SvgRenderError};
use crate::node::NodeId;

/// Knobs for a single render pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawOptions {
    /// Emit a `closePath` after a shape has been painted. PDF ignores it; some
    /// consumers compare content streams byte for byte against older output.
    pub trailing_close_path: bool,
    /// Wrap every node, not only groups, in save/restore so that a node's
    /// transform and paint settings never reach its following siblings.
    pub isolate_nodes: bool,
}

impl DrawOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trailing_close_path(mut self, enabled: bool) -> Self {
        self.trailing_close_path = enabled;
        self
    }

    pub fn isolate_nodes(mut self, enabled: bool) -> Self {
        self.isolate_nodes = enabled;
        self
    }
}

/// Transient state of one render pass: the canvas stack and the id registry.
pub struct DrawContext<C: CanvasOps = Canvas> {
    canvases: Vec<C>,
    named_objects: BTreeMap<String, NodeId>,
    options: DrawOptions,
}

impl<C: CanvasOps> Default for DrawContext<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: CanvasOps> DrawContext<C> {
    pub fn new() -> Self {
        Self::with_options(DrawOptions::default())
    }

    pub fn with_options(options: DrawOptions) -> Self {
        Self {
            canvases: Vec::new(),
            named_objects: BTreeMap::new(),
            options,
        }
    }

    pub fn options(&self) -> DrawOptions {
        self.options
    }

    pub fn push_canvas(&mut self, canvas: C) {
        self.canvases.push(canvas);
    }

    pub fn pop_canvas(&mut self) -> Result<C> {
        self.canvases.pop().ok_or(SvgRenderError::EmptyCanvasStack)
    }

    pub fn current_canvas(&mut self) -> Result<&mut C> {
        self.canvases
            .last_mut()
            .ok_or(SvgRenderError::EmptyCanvasStack)
    }

    pub fn canvas_depth(&self) -> usize {
        self.canvases.len()
    }

    /// Registers `node` under `id`. The first registration of an id wins.
    pub fn add_named_object(&mut self, id: &str, node: NodeId) {
        if let Some(existing) = self.named_objects.get(id) {
            if *existing != node {
                tracing::warn!(id, kept = %existing, ignored = %node, "duplicate id");
            }
            return;
        }
        self.named_objects.insert(id.to_string(), node);
    }

    pub fn named_object(&self, id: &str) -> Option<NodeId> {
        self.named_objects.get(id).copied()
    }

    pub fn named_objects(&self) -> impl Iterator<Item = (&str, NodeId)> + '_ {
        self.named_objects.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Hands back all canvases, bottom of the stack first.
    pub fn into_canvases(self) -> Vec<C> {
        self.canvases
    }
}
