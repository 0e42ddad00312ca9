//! Error type shared by every engine operation.

use thiserror::Error;

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors raised by graph construction and analysis.
///
/// "No path" is never an error: path queries report it as an empty or absent result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// The input document could not be parsed (raised by readers).
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// The parsed records violate a structural invariant of the model.
    #[error("Malformed graph: {0}")]
    MalformedGraph(String),

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// Every id missing from a batch request, in request order.
    #[error("Nodes not found: {}", .0.join(", "))]
    NodesNotFound(Vec<String>),

    #[error("Unknown export format: {0}")]
    UnknownFormat(String),

    #[error("Unknown centrality type: {0}")]
    UnknownCentralityKind(String),

    /// Weighted search reached an edge with no `weight`.
    #[error("Edge {from} -> {to} has no weight")]
    MissingWeight { from: String, to: String },

    #[error("Edge {from} -> {to} has negative weight {weight}")]
    NegativeWeight { from: String, to: String, weight: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nodes_not_found_lists_every_id() {
        let err = GraphError::NodesNotFound(vec!["a".into(), "b".into(), "c".into()]);
        assert_eq!(err.to_string(), "Nodes not found: a, b, c");
    }

    #[test]
    fn test_node_not_found_message() {
        let err = GraphError::NodeNotFound("server9".into());
        assert!(err.to_string().contains("server9"));
    }
}
