use std::collections::{HashSet, VecDeque};

use serde::Serialize;

use crate::components::{strongly_connected, weakly_connected};
use crate::graph::{GraphModel, NodeIx};

/// Whole-graph summary statistics.
///
/// `diameter`, `radius` and `avg_path_length` are filled in only for
/// connected graphs with more than one node; directed graphs must also be
/// strongly connected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub density: f64,
    pub is_directed: bool,
    pub is_connected: bool,
    pub num_components: usize,
    pub avg_degree: f64,
    pub avg_clustering: f64,
    pub has_cycles: bool,
    pub diameter: Option<usize>,
    pub radius: Option<usize>,
    pub avg_path_length: Option<f64>,
}

pub fn stats(graph: &GraphModel) -> GraphStats {
    let n = graph.node_count();
    let m = graph.edge_count();
    let directed = graph.is_directed();

    let density = if n <= 1 {
        0.0
    } else {
        let pairs = (n * (n - 1)) as f64;
        if directed {
            m as f64 / pairs
        } else {
            2.0 * m as f64 / pairs
        }
    };

    let avg_degree = if n == 0 {
        0.0
    } else {
        (0..n).map(|ix| graph.degree_ix(ix)).sum::<usize>() as f64 / n as f64
    };

    let num_components = weakly_connected(graph).len();
    let is_connected = num_components <= 1;

    let mut stats = GraphStats {
        node_count: n,
        edge_count: m,
        density,
        is_directed: directed,
        is_connected,
        num_components,
        avg_degree,
        avg_clustering: average_clustering(graph),
        has_cycles: has_cycles(graph),
        diameter: None,
        radius: None,
        avg_path_length: None,
    };

    let strongly = !directed || strongly_connected(graph).len() == 1;
    if is_connected && strongly && n > 1 {
        let (diameter, radius, avg) = distance_summary(graph);
        stats.diameter = Some(diameter);
        stats.radius = Some(radius);
        stats.avg_path_length = Some(avg);
    }

    stats
}

/// Mean local clustering over all nodes. Undirected graphs use triangle
/// clustering; directed graphs count directed triangles (Fagiolo).
fn average_clustering(graph: &GraphModel) -> f64 {
    let n = graph.node_count();
    if n == 0 {
        return 0.0;
    }
    let total: f64 = if graph.is_directed() {
        (0..n).map(|v| directed_clustering(graph, v)).sum()
    } else {
        (0..n).map(|v| undirected_clustering(graph, v)).sum()
    };
    total / n as f64
}

fn without_self(list: &[NodeIx], v: NodeIx) -> HashSet<NodeIx> {
    list.iter().copied().filter(|&w| w != v).collect()
}

fn undirected_clustering(graph: &GraphModel, v: NodeIx) -> f64 {
    let nbrs = without_self(graph.successors(v), v);
    let k = nbrs.len();
    if k < 2 {
        return 0.0;
    }
    // Each triangle is seen from both of v's other corners.
    let links: usize = nbrs
        .iter()
        .map(|&u| graph.successors(u).iter().filter(|&&w| w != u && nbrs.contains(&w)).count())
        .sum();
    links as f64 / (k * (k - 1)) as f64
}

fn directed_clustering(graph: &GraphModel, i: NodeIx) -> f64 {
    let ipreds = without_self(graph.predecessors(i), i);
    let isuccs = without_self(graph.successors(i), i);

    let mut triangles = 0usize;
    for &j in ipreds.iter().chain(isuccs.iter()) {
        let jpreds = without_self(graph.predecessors(j), j);
        let jsuccs = without_self(graph.successors(j), j);
        triangles += ipreds.intersection(&jpreds).count()
            + ipreds.intersection(&jsuccs).count()
            + isuccs.intersection(&jpreds).count()
            + isuccs.intersection(&jsuccs).count();
    }
    if triangles == 0 {
        return 0.0;
    }

    let total = ipreds.len() + isuccs.len();
    let bidirectional = ipreds.intersection(&isuccs).count();
    let possible = (total * (total - 1) - 2 * bidirectional) * 2;
    triangles as f64 / possible as f64
}

/// Directed: not a DAG (Kahn's algorithm leaves nodes behind). Undirected:
/// a self-loop, or more distinct edges than a spanning forest holds.
fn has_cycles(graph: &GraphModel) -> bool {
    let n = graph.node_count();
    if graph.is_directed() {
        let mut indegree: Vec<usize> = (0..n).map(|v| graph.predecessors(v).len()).collect();
        let mut queue: VecDeque<NodeIx> = (0..n).filter(|&v| indegree[v] == 0).collect();
        let mut removed = 0usize;
        while let Some(v) = queue.pop_front() {
            removed += 1;
            for &w in graph.successors(v) {
                indegree[w] -= 1;
                if indegree[w] == 0 {
                    queue.push_back(w);
                }
            }
        }
        removed < n
    } else {
        let mut ends = 0usize;
        for v in 0..n {
            for &w in graph.successors(v) {
                if w == v {
                    return true;
                }
                ends += 1;
            }
        }
        let forest_edges = n - weakly_connected(graph).len();
        ends / 2 > forest_edges
    }
}

/// Diameter, radius and mean shortest-path length from all-pairs BFS.
/// Callers guarantee every node reaches every other.
fn distance_summary(graph: &GraphModel) -> (usize, usize, f64) {
    let n = graph.node_count();
    let mut diameter = 0usize;
    let mut radius = usize::MAX;
    let mut total = 0usize;

    let mut dist = vec![usize::MAX; n];
    let mut queue = VecDeque::new();
    for s in 0..n {
        dist.iter_mut().for_each(|d| *d = usize::MAX);
        dist[s] = 0;
        queue.push_back(s);
        let mut eccentricity = 0;
        while let Some(v) = queue.pop_front() {
            eccentricity = eccentricity.max(dist[v]);
            total += dist[v];
            for &w in graph.successors(v) {
                if dist[w] == usize::MAX {
                    dist[w] = dist[v] + 1;
                    queue.push_back(w);
                }
            }
        }
        diameter = diameter.max(eccentricity);
        radius = radius.min(eccentricity);
    }

    (diameter, radius, total as f64 / (n * (n - 1)) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traversal::fixtures::*;

    #[test]
    fn test_infra_stats() {
        let g = infra();
        let s = stats(&g);
        assert_eq!(s.node_count, 5);
        assert_eq!(s.edge_count, 6);
        assert!((s.density - 6.0 / 20.0).abs() < 1e-12);
        assert!((s.avg_degree - 12.0 / 5.0).abs() < 1e-12);
        assert!(s.is_connected);
        assert_eq!(s.num_components, 1);
        assert!(!s.has_cycles);
        // Weakly but not strongly connected.
        assert_eq!(s.diameter, None);
        assert_eq!(s.avg_path_length, None);
    }

    #[test]
    fn test_undirected_cycle_stats() {
        let g = cycle(4, false);
        let s = stats(&g);
        assert!(s.has_cycles);
        assert_eq!(s.diameter, Some(2));
        assert_eq!(s.radius, Some(2));
        // Each node: two at distance 1, one at distance 2.
        assert!((s.avg_path_length.unwrap() - 4.0 / 3.0).abs() < 1e-12);
        assert_eq!(s.avg_clustering, 0.0);
    }

    #[test]
    fn test_undirected_tree_has_no_cycles() {
        let g = chain(5, false);
        let s = stats(&g);
        assert!(!s.has_cycles);
        assert_eq!(s.diameter, Some(4));
        assert_eq!(s.radius, Some(2));
    }

    #[test]
    fn test_directed_cycle_is_strongly_connected() {
        let g = cycle(3, true);
        let s = stats(&g);
        assert!(s.has_cycles);
        assert_eq!(s.diameter, Some(2));
        assert_eq!(s.radius, Some(2));
        assert!((s.avg_path_length.unwrap() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_triangle_clustering() {
        let g = undirected(&["a", "b", "c", "d"], &[("a", "b"), ("b", "c"), ("c", "a"), ("c", "d")]);
        let s = stats(&g);
        // a, b: 1.0; c: 1 of 3 pairs linked; d: 0
        let expected = (1.0 + 1.0 + 1.0 / 3.0 + 0.0) / 4.0;
        assert!((s.avg_clustering - expected).abs() < 1e-12);
    }

    #[test]
    fn test_directed_clustering_transitive_triangle() {
        // a -> b -> c, a -> c: each node sees one directed triangle.
        let g = directed(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("a", "c")]);
        let s = stats(&g);
        assert!((s.avg_clustering - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_disconnected_stats() {
        let g = undirected(&["a", "b", "c"], &[("a", "b")]);
        let s = stats(&g);
        assert!(!s.is_connected);
        assert_eq!(s.num_components, 2);
        assert_eq!(s.diameter, None);
    }

    #[test]
    fn test_self_loop_is_cycle() {
        let g = undirected(&["a"], &[("a", "a")]);
        assert!(stats(&g).has_cycles);
        let d = directed(&["a"], &[("a", "a")]);
        assert!(stats(&d).has_cycles);
    }

    #[test]
    fn test_empty_graph_stats() {
        let g = directed(&[], &[]);
        let s = stats(&g);
        assert_eq!(s.density, 0.0);
        assert_eq!(s.avg_degree, 0.0);
        assert!(s.is_connected);
        assert_eq!(s.num_components, 0);
        assert!(!s.has_cycles);
    }
}
