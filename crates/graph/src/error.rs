#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    UnknownNode(String),
    UnknownSequence(String),
    /// The operation needs spatial metadata the node does not have yet.
    NotFull(String),
    SequenceMismatch {
        node: String,
        sequence: String,
    },
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphError::UnknownNode(key) => write!(f, "unknown node: {key}"),
            GraphError::UnknownSequence(key) => write!(f, "unknown sequence: {key}"),
            GraphError::NotFull(key) => write!(f, "node is not full: {key}"),
            GraphError::SequenceMismatch { node, sequence } => {
                write!(f, "node {node} does not belong to sequence {sequence}")
            }
        }
    }
}

impl std::error::Error for GraphError {}
