use crate::node::NodeId;

#[derive(Debug, thiserror::Error)]
pub enum SvgRenderError {
    #[error("no canvas on the draw context stack")]
    EmptyCanvasStack,
    #[error("attributes of node {0} were already set")]
    AttributesAlreadySet(NodeId),
    #[error("adding node {child} under node {parent} would create a cycle")]
    CyclicTree { parent: NodeId, child: NodeId },
    #[error("document root is <{0}>, expected <svg>")]
    MissingRoot(String),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("xml error: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("pdf error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SvgRenderError>;
