use tracing::debug;

use crate::error::{GraphError, Result};
use crate::graph::{EdgeRecord, GraphModel, NodeRecord};
use crate::traversal::bfs_visit;

/// Build a fresh model induced by `keep`: the flagged nodes plus every edge
/// with both ends flagged, in the parent's insertion order.
fn induced(graph: &GraphModel, keep: &[bool]) -> Result<GraphModel> {
    let nodes: Vec<NodeRecord> = graph
        .nodes()
        .iter()
        .enumerate()
        .filter(|(ix, _)| keep[*ix])
        .map(|(_, node)| node.clone())
        .collect();

    let edges: Vec<EdgeRecord> = (0..graph.edge_count())
        .filter(|&e| {
            let (from, to) = graph.endpoints(e);
            keep[from] && keep[to]
        })
        .map(|e| graph.edge_at(e).clone())
        .collect();

    debug!(nodes = nodes.len(), edges = edges.len(), "induced subgraph");
    GraphModel::with_metadata(graph.is_directed(), nodes, edges, graph.metadata().derived())
}

/// Nodes within `radius` hops of `center` (following outgoing edges when
/// directed), the center included, with all edges among them.
pub fn ego_graph(graph: &GraphModel, center: &str, radius: u32) -> Result<GraphModel> {
    let origin = graph.require(center)?;

    let mut keep = vec![false; graph.node_count()];
    for ix in bfs_visit(graph, origin, Some(radius), |v| graph.successors(v).iter().copied()) {
        keep[ix] = true;
    }

    induced(graph, &keep)
}

/// Node-induced subgraph over exactly `ids`.
///
/// Every id must exist; otherwise `NodesNotFound` lists all the missing ones
/// in request order.
pub fn subgraph<S: AsRef<str>>(graph: &GraphModel, ids: &[S]) -> Result<GraphModel> {
    let mut keep = vec![false; graph.node_count()];
    let mut missing: Vec<String> = Vec::new();

    for id in ids {
        let id = id.as_ref();
        match graph.ix(id) {
            Some(ix) => keep[ix] = true,
            None => {
                if !missing.iter().any(|m| m == id) {
                    missing.push(id.to_string());
                }
            }
        }
    }

    if !missing.is_empty() {
        return Err(GraphError::NodesNotFound(missing));
    }

    induced(graph, &keep)
}
