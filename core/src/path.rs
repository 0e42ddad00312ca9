use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};

use serde::Serialize;
use tracing::debug;

use crate::error::{GraphError, Result};
use crate::graph::{GraphModel, NodeId, NodeIx};

/// A path between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathResult {
    pub source: NodeId,
    pub target: NodeId,
    /// Node ids from source to target, inclusive.
    pub path: Vec<NodeId>,
    /// Hop count (`path.len() - 1`).
    pub length: usize,
    /// Sum of edge weights for weighted searches. Serialized as `null` otherwise.
    pub total_weight: Option<f64>,
}

impl PathResult {
    fn from_indices(graph: &GraphModel, nodes: &[NodeIx], total_weight: Option<f64>) -> Self {
        let path: Vec<NodeId> = nodes.iter().map(|&ix| graph.id_of(ix).to_string()).collect();
        Self {
            source: path.first().cloned().unwrap_or_default(),
            target: path.last().cloned().unwrap_or_default(),
            length: path.len().saturating_sub(1),
            path,
            total_weight,
        }
    }
}

/// Walk parent pointers back from `target` to the root (whose parent is itself).
fn reconstruct_path(parent: &[Option<NodeIx>], target: NodeIx) -> Vec<NodeIx> {
    let mut path = vec![target];
    let mut current = target;
    while let Some(p) = parent[current] {
        if p == current {
            break;
        }
        path.push(p);
        current = p;
    }
    path.reverse();
    path
}

/// Shortest path between two nodes.
///
/// Unweighted mode runs BFS over successors and returns the first
/// minimum-hop path discovered. Weighted mode runs Dijkstra with edge weights
/// as costs; every edge the search relaxes must carry a non-negative weight.
///
/// Returns `Ok(None)` when no path exists. Both endpoints are validated
/// before the search starts.
pub fn shortest_path(
    graph: &GraphModel,
    source: &str,
    target: &str,
    weighted: bool,
) -> Result<Option<PathResult>> {
    let start = graph.require(source)?;
    let goal = graph.require(target)?;

    let found = if weighted {
        dijkstra(graph, start, goal)?
            .map(|(nodes, cost)| PathResult::from_indices(graph, &nodes, Some(cost)))
    } else {
        bfs_path(graph, start, goal).map(|nodes| PathResult::from_indices(graph, &nodes, None))
    };

    debug!(
        source,
        target,
        weighted,
        hops = found.as_ref().map(|p| p.length),
        "shortest_path"
    );
    Ok(found)
}

fn bfs_path(graph: &GraphModel, start: NodeIx, goal: NodeIx) -> Option<Vec<NodeIx>> {
    if start == goal {
        return Some(vec![start]);
    }

    // parent[start] == Some(start) marks the root.
    let mut parent: Vec<Option<NodeIx>> = vec![None; graph.node_count()];
    let mut queue: VecDeque<NodeIx> = VecDeque::new();
    parent[start] = Some(start);
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        for &next in graph.successors(current) {
            if parent[next].is_none() {
                parent[next] = Some(current);
                if next == goal {
                    return Some(reconstruct_path(&parent, goal));
                }
                queue.push_back(next);
            }
        }
    }

    None
}

#[derive(Clone, Copy, PartialEq)]
struct State {
    node: NodeIx,
    cost: f64,
}

impl Eq for State {}

impl Ord for State {
    // Reversed so BinaryHeap pops the cheapest state first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn dijkstra(graph: &GraphModel, start: NodeIx, goal: NodeIx) -> Result<Option<(Vec<NodeIx>, f64)>> {
    let n = graph.node_count();
    let mut dist = vec![f64::INFINITY; n];
    let mut parent: Vec<Option<NodeIx>> = vec![None; n];
    let mut settled = vec![false; n];
    let mut heap = BinaryHeap::new();

    dist[start] = 0.0;
    parent[start] = Some(start);
    heap.push(State { node: start, cost: 0.0 });

    while let Some(State { node, cost }) = heap.pop() {
        if settled[node] {
            continue;
        }
        settled[node] = true;

        if node == goal {
            return Ok(Some((reconstruct_path(&parent, goal), cost)));
        }

        for adj in graph.out_adj(node) {
            let edge = graph.edge_at(adj.edge);
            let weight = edge.weight.ok_or_else(|| GraphError::MissingWeight {
                from: graph.id_of(node).to_string(),
                to: graph.id_of(adj.node).to_string(),
            })?;
            if weight < 0.0 {
                return Err(GraphError::NegativeWeight {
                    from: graph.id_of(node).to_string(),
                    to: graph.id_of(adj.node).to_string(),
                    weight,
                });
            }

            let next_cost = cost + weight;
            if next_cost < dist[adj.node] {
                dist[adj.node] = next_cost;
                parent[adj.node] = Some(node);
                heap.push(State {
                    node: adj.node,
                    cost: next_cost,
                });
            }
        }
    }

    Ok(None)
}

/// Every simple path from `source` to `target`, depth-first in adjacency order.
///
/// `max_depth` bounds the number of edges per path. A path never revisits a
/// node, so cyclic graphs terminate, but the result can still grow
/// combinatorially on dense graphs. `source == target` yields no paths.
pub fn all_paths(
    graph: &GraphModel,
    source: &str,
    target: &str,
    max_depth: Option<usize>,
) -> Result<Vec<PathResult>> {
    let start = graph.require(source)?;
    let goal = graph.require(target)?;

    let mut results = Vec::new();
    let cutoff = max_depth.unwrap_or(usize::MAX);
    if start == goal || cutoff == 0 {
        return Ok(results);
    }

    let mut on_path = vec![false; graph.node_count()];
    let mut path: Vec<NodeIx> = vec![start];
    // Each frame holds the next successor position to try for the node at
    // the same depth of `path`.
    let mut stack: Vec<usize> = vec![0];
    on_path[start] = true;

    while let Some(cursor) = stack.last_mut() {
        let current = path[path.len() - 1];
        let succ = graph.successors(current);

        if *cursor >= succ.len() {
            stack.pop();
            if let Some(done) = path.pop() {
                on_path[done] = false;
            }
            continue;
        }

        let next = succ[*cursor];
        *cursor += 1;

        if on_path[next] {
            continue;
        }
        if next == goal {
            path.push(next);
            results.push(PathResult::from_indices(graph, &path, None));
            path.pop();
            continue;
        }
        if path.len() < cutoff {
            on_path[next] = true;
            path.push(next);
            stack.push(0);
        }
    }

    debug!(source, target, count = results.len(), "all_paths");
    Ok(results)
}

/// Whether `target` is reachable from `source`. Absent endpoints yield `false`.
pub fn has_path(graph: &GraphModel, source: &str, target: &str) -> bool {
    match (graph.ix(source), graph.ix(target)) {
        (Some(start), Some(goal)) => bfs_path(graph, start, goal).is_some(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeRecord, NodeRecord};
    use crate::traversal::fixtures::*;

    /// Diamond: a -> b, a -> c, b -> d, c -> d
    fn make_diamond() -> GraphModel {
        directed(&["a", "b", "c", "d"], &[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")])
    }

    fn weighted(edges: &[(&str, &str, f64)]) -> GraphModel {
        let mut ids: Vec<&str> = edges.iter().flat_map(|(s, t, _)| [*s, *t]).collect();
        ids.sort();
        ids.dedup();
        GraphModel::new(
            true,
            ids.into_iter().map(NodeRecord::new).collect(),
            edges
                .iter()
                .map(|(s, t, w)| EdgeRecord::new(*s, *t).with_weight(*w))
                .collect(),
        )
        .unwrap()
    }

    // --- shortest path ---

    #[test]
    fn test_shortest_path_chain() {
        let g = chain(5, true);
        let p = shortest_path(&g, "n0", "n4", false).unwrap().unwrap();
        assert_eq!(p.path, vec!["n0", "n1", "n2", "n3", "n4"]);
        assert_eq!(p.length, 4);
        assert_eq!(p.total_weight, None);
    }

    #[test]
    fn test_shortest_path_same_node() {
        let g = chain(3, true);
        let p = shortest_path(&g, "n1", "n1", false).unwrap().unwrap();
        assert_eq!(p.path, vec!["n1"]);
        assert_eq!(p.length, 0);
    }

    #[test]
    fn test_shortest_path_unreachable_is_none() {
        let g = chain(3, true);
        assert!(shortest_path(&g, "n2", "n0", false).unwrap().is_none());
    }

    #[test]
    fn test_shortest_path_missing_endpoint() {
        let g = chain(3, true);
        assert_eq!(
            shortest_path(&g, "n0", "zz", false).unwrap_err(),
            GraphError::NodeNotFound("zz".into())
        );
        assert_eq!(
            shortest_path(&g, "zz", "n0", true).unwrap_err(),
            GraphError::NodeNotFound("zz".into())
        );
    }

    #[test]
    fn test_shortest_path_infra() {
        let g = infra();
        let p = shortest_path(&g, "lb1", "db1", false).unwrap().unwrap();
        assert_eq!(p.length, 2);
        assert_eq!(p.path.first().map(String::as_str), Some("lb1"));
        assert_eq!(p.path.last().map(String::as_str), Some("db1"));
    }

    #[test]
    fn test_weighted_prefers_cheaper_route() {
        // Direct hop costs 10, two-hop detour costs 3.
        let g = weighted(&[("a", "c", 10.0), ("a", "b", 1.0), ("b", "c", 2.0)]);
        let hops = shortest_path(&g, "a", "c", false).unwrap().unwrap();
        assert_eq!(hops.path, vec!["a", "c"]);

        let cheap = shortest_path(&g, "a", "c", true).unwrap().unwrap();
        assert_eq!(cheap.path, vec!["a", "b", "c"]);
        assert_eq!(cheap.length, 2);
        assert_eq!(cheap.total_weight, Some(3.0));
    }

    #[test]
    fn test_weighted_infra_total() {
        let g = infra();
        let p = shortest_path(&g, "lb1", "db1", true).unwrap().unwrap();
        // lb1 -1-> server1 -3-> db1 = 4, lb1 -2-> server2 -1-> db1 = 3
        assert_eq!(p.path, vec!["lb1", "server2", "db1"]);
        assert_eq!(p.total_weight, Some(3.0));
    }

    #[test]
    fn test_weighted_parallel_edges_use_cheapest() {
        let g = weighted(&[("a", "b", 5.0), ("a", "b", 1.5)]);
        let p = shortest_path(&g, "a", "b", true).unwrap().unwrap();
        assert_eq!(p.total_weight, Some(1.5));
    }

    #[test]
    fn test_weighted_missing_weight_is_error() {
        let g = chain(3, true);
        let err = shortest_path(&g, "n0", "n2", true).unwrap_err();
        assert_eq!(
            err,
            GraphError::MissingWeight {
                from: "n0".into(),
                to: "n1".into()
            }
        );
    }

    #[test]
    fn test_weighted_negative_weight_is_error() {
        let g = weighted(&[("a", "b", -1.0)]);
        assert!(matches!(
            shortest_path(&g, "a", "b", true),
            Err(GraphError::NegativeWeight { weight, .. }) if weight == -1.0
        ));
    }

    #[test]
    fn test_weighted_undirected() {
        let g = GraphModel::new(
            false,
            vec![NodeRecord::new("a"), NodeRecord::new("b")],
            vec![EdgeRecord::new("a", "b").with_weight(0.5)],
        )
        .unwrap();
        let p = shortest_path(&g, "b", "a", true).unwrap().unwrap();
        assert_eq!(p.path, vec!["b", "a"]);
        assert_eq!(p.total_weight, Some(0.5));
    }

    // --- all paths ---

    #[test]
    fn test_all_paths_diamond() {
        let g = make_diamond();
        let paths = all_paths(&g, "a", "d", None).unwrap();
        let seqs: Vec<Vec<String>> = paths.iter().map(|p| p.path.clone()).collect();
        assert_eq!(seqs, vec![vec!["a", "b", "d"], vec!["a", "c", "d"]]);
        assert!(paths.iter().all(|p| p.length == 2));
    }

    #[test]
    fn test_all_paths_cycle_terminates() {
        let g = cycle(4, false);
        let paths = all_paths(&g, "n0", "n2", None).unwrap();
        assert_eq!(paths.len(), 2);
        for p in &paths {
            let mut seen = p.path.clone();
            seen.sort();
            seen.dedup();
            assert_eq!(seen.len(), p.path.len());
        }
    }

    #[test]
    fn test_all_paths_depth_bound() {
        let g = directed(&["a", "b", "c"], &[("a", "c"), ("a", "b"), ("b", "c")]);
        let short = all_paths(&g, "a", "c", Some(1)).unwrap();
        assert_eq!(short.len(), 1);
        assert_eq!(short[0].path, vec!["a", "c"]);

        let all = all_paths(&g, "a", "c", Some(2)).unwrap();
        assert_eq!(all.len(), 2);
        assert!(all_paths(&g, "a", "c", Some(0)).unwrap().is_empty());
    }

    #[test]
    fn test_all_paths_same_endpoint_empty() {
        let g = cycle(3, true);
        assert!(all_paths(&g, "n0", "n0", None).unwrap().is_empty());
    }

    #[test]
    fn test_all_paths_missing_node() {
        let g = make_diamond();
        assert!(matches!(
            all_paths(&g, "a", "zz", None),
            Err(GraphError::NodeNotFound(id)) if id == "zz"
        ));
    }

    // --- has path ---

    #[test]
    fn test_has_path() {
        let g = infra();
        assert!(has_path(&g, "lb1", "db1"));
        assert!(!has_path(&g, "db1", "lb1"));
        assert!(has_path(&g, "db1", "db1"));
    }

    #[test]
    fn test_has_path_missing_is_false() {
        let g = infra();
        assert!(!has_path(&g, "lb1", "ghost"));
        assert!(!has_path(&g, "ghost", "lb1"));
    }
}
