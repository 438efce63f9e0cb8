//! Builds a [`RendererTree`] from a DOM element tree.

use std::collections::HashMap;

use lightningcss::printer::PrinterOptions;
use lightningcss::stylesheet::{ParserOptions, StyleAttribute};

use crate::error::Result;
use crate::node::{Attributes, NodeId, RendererKind, RendererTree};

pub const STYLE: &str = "style";

/// The view of a DOM element the processor needs.
pub trait ElementNode: Sized {
    fn tag_name(&self) -> &str;
    fn attributes(&self) -> Attributes;
    /// Child elements in document order; text and comments are not included.
    fn element_children(&self) -> Vec<Self>;
}

impl<'a, 'input> ElementNode for roxmltree::Node<'a, 'input> {
    fn tag_name(&self) -> &str {
        roxmltree::Node::tag_name(self).name()
    }

    fn attributes(&self) -> Attributes {
        roxmltree::Node::attributes(self)
            .map(|attr| (attr.name().to_string(), attr.value().to_string()))
            .collect()
    }

    fn element_children(&self) -> Vec<Self> {
        self.children().filter(|n| n.is_element()).collect()
    }
}

/// Tag name → renderer factory. Unknown tags become plain groups so their
/// children still render.
#[derive(Debug, Clone)]
pub struct Processor {
    factories: HashMap<String, RendererKind>,
}

impl Default for Processor {
    fn default() -> Self {
        let factories = [
            RendererKind::Svg,
            RendererKind::Group,
            RendererKind::Path,
            RendererKind::Line,
            RendererKind::Rect,
            RendererKind::Circle,
            RendererKind::Ellipse,
            RendererKind::Polygon,
            RendererKind::Polyline,
        ]
        .into_iter()
        .map(|kind| (kind.tag_name().to_string(), kind))
        .collect();
        Self { factories }
    }
}

impl Processor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `tag` to `kind`, replacing any previous mapping.
    pub fn register(&mut self, tag: impl Into<String>, kind: RendererKind) -> &mut Self {
        self.factories.insert(tag.into(), kind);
        self
    }

    pub fn kind_for(&self, tag: &str) -> Option<RendererKind> {
        self.factories.get(tag).copied()
    }

    pub fn process<E: ElementNode>(&self, root: &E) -> Result<RendererTree> {
        let mut tree = RendererTree::new();
        let id = self.build(&mut tree, root)?;
        tree.set_root(id);
        Ok(tree)
    }

    fn build<E: ElementNode>(&self, tree: &mut RendererTree, element: &E) -> Result<NodeId> {
        let tag = element.tag_name();
        let kind = self.kind_for(tag).unwrap_or_else(|| {
            tracing::debug!(tag, "unsupported element rendered as group");
            RendererKind::Group
        });
        let id = tree.create_node(kind);
        tree.set_attributes_and_styles(id, with_inline_style(element.attributes()))?;
        for child in element.element_children() {
            let child_id = self.build(tree, &child)?;
            tree.add_child(id, Some(child_id))?;
        }
        Ok(id)
    }
}

/// Folds `style` declarations over the element's presentation attributes.
/// Declarations win over attributes of the same name and `!important` ones
/// win over the rest.
pub fn with_inline_style(mut attrs: Attributes) -> Attributes {
    let Some(style) = attrs.get(STYLE).cloned() else {
        return attrs;
    };
    for (name, value) in parse_style_declarations(&style) {
        attrs.insert(name, value);
    }
    attrs
}

/// Declarations of a `style` attribute as `(property, value)` pairs, normal
/// declarations first, then important ones. Unparsable input yields nothing.
pub fn parse_style_declarations(style: &str) -> Vec<(String, String)> {
    let options = ParserOptions {
        error_recovery: true,
        ..ParserOptions::default()
    };
    let parsed = match StyleAttribute::parse(style, options) {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::warn!(value = style, error = %err, "ignoring unparsable style attribute");
            return Vec::new();
        }
    };
    let block = &parsed.declarations;
    block
        .declarations
        .iter()
        .chain(block.important_declarations.iter())
        .filter_map(|prop| {
            let name = prop.property_id().name().to_ascii_lowercase();
            match prop.value_to_css_string(PrinterOptions::default()) {
                Ok(value) if !value.is_empty() => Some((name, value)),
                _ => None,
            }
        })
        .collect()
}
