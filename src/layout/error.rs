use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("duplicate node id '{0}'")]
    DuplicateId(String),
    #[error("unknown node id '{0}'")]
    UnknownNode(String),
    #[error("no tree has been laid out yet")]
    NoLayout,
}
