use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{GraphError, Result};
use crate::graph::{GraphModel, NodeId, NodeIx};
use crate::linalg::{l2_norm, DenseMatrix};

/// Which centrality measure to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CentralityKind {
    Degree,
    Betweenness,
    Closeness,
    PageRank,
    Eigenvector,
}

impl CentralityKind {
    pub const ALL: [CentralityKind; 5] = [
        CentralityKind::Degree,
        CentralityKind::Betweenness,
        CentralityKind::Closeness,
        CentralityKind::PageRank,
        CentralityKind::Eigenvector,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CentralityKind::Degree => "degree",
            CentralityKind::Betweenness => "betweenness",
            CentralityKind::Closeness => "closeness",
            CentralityKind::PageRank => "pagerank",
            CentralityKind::Eigenvector => "eigenvector",
        }
    }
}

impl fmt::Display for CentralityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CentralityKind {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self> {
        CentralityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| GraphError::UnknownCentralityKind(s.to_string()))
    }
}

/// Iteration parameters for the iterative measures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CentralityOptions {
    pub pagerank_damping: f64,
    pub pagerank_max_iter: usize,
    /// Convergence threshold for PageRank; the L1 change is compared to `n * tol`.
    pub pagerank_tolerance: f64,
    pub eigenvector_max_iter: usize,
    pub eigenvector_tolerance: f64,
}

impl Default for CentralityOptions {
    fn default() -> Self {
        Self {
            pagerank_damping: 0.85,
            pagerank_max_iter: 100,
            pagerank_tolerance: 1e-6,
            eigenvector_max_iter: 1000,
            eigenvector_tolerance: 1e-6,
        }
    }
}

/// Scores for every node under one measure, keyed by node id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CentralityResult {
    #[serde(rename = "type")]
    pub kind: CentralityKind,
    pub scores: BTreeMap<NodeId, f64>,
}

impl CentralityResult {
    fn from_scores(graph: &GraphModel, kind: CentralityKind, scores: Vec<f64>) -> Self {
        let scores = scores
            .into_iter()
            .enumerate()
            .map(|(ix, score)| (graph.id_of(ix).to_string(), score))
            .collect();
        Self { kind, scores }
    }

    /// Highest-scoring `n` nodes, best first. Ties are broken by node id.
    pub fn top_n(&self, n: usize) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self
            .scores
            .iter()
            .map(|(id, score)| (id.as_str(), *score))
            .collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });
        ranked.truncate(n);
        ranked
    }
}

/// Compute `kind` centrality for every node of `graph`.
pub fn centrality(graph: &GraphModel, kind: CentralityKind, options: &CentralityOptions) -> CentralityResult {
    let scores = match kind {
        CentralityKind::Degree => degree_centrality(graph),
        CentralityKind::Betweenness => betweenness_centrality(graph),
        CentralityKind::Closeness => closeness_centrality(graph),
        CentralityKind::PageRank => pagerank(graph, options),
        CentralityKind::Eigenvector => eigenvector_centrality(graph, options),
    };
    debug!(kind = kind.as_str(), nodes = scores.len(), "centrality computed");
    CentralityResult::from_scores(graph, kind, scores)
}

/// Total degree over `n - 1`. A lone node scores 1.
///
/// Parallel edges and self-loops each add to the degree, so on a multigraph
/// a score can exceed 1. Simple undirected graphs stay within `[0, 1]`.
fn degree_centrality(graph: &GraphModel) -> Vec<f64> {
    let n = graph.node_count();
    if n <= 1 {
        return vec![1.0; n];
    }
    let scale = 1.0 / (n - 1) as f64;
    (0..n).map(|ix| graph.degree_ix(ix) as f64 * scale).collect()
}

/// Brandes' algorithm over unweighted shortest paths, normalised by
/// `1 / ((n-1)(n-2))`.
fn betweenness_centrality(graph: &GraphModel) -> Vec<f64> {
    let n = graph.node_count();
    let mut betweenness = vec![0.0; n];

    let mut stack: Vec<NodeIx> = Vec::with_capacity(n);
    let mut predecessors: Vec<Vec<NodeIx>> = vec![Vec::new(); n];
    let mut sigma = vec![0.0f64; n];
    let mut dist = vec![-1i64; n];
    let mut delta = vec![0.0f64; n];
    let mut queue: VecDeque<NodeIx> = VecDeque::new();

    for s in 0..n {
        stack.clear();
        for p in predecessors.iter_mut() {
            p.clear();
        }
        sigma.iter_mut().for_each(|v| *v = 0.0);
        dist.iter_mut().for_each(|v| *v = -1);
        delta.iter_mut().for_each(|v| *v = 0.0);

        sigma[s] = 1.0;
        dist[s] = 0;
        queue.push_back(s);

        while let Some(v) = queue.pop_front() {
            stack.push(v);
            for &w in graph.successors(v) {
                if dist[w] < 0 {
                    dist[w] = dist[v] + 1;
                    queue.push_back(w);
                }
                if dist[w] == dist[v] + 1 {
                    sigma[w] += sigma[v];
                    predecessors[w].push(v);
                }
            }
        }

        while let Some(w) = stack.pop() {
            for &v in &predecessors[w] {
                delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
            }
            if w != s {
                betweenness[w] += delta[w];
            }
        }
    }

    if n > 2 {
        let scale = 1.0 / ((n - 1) * (n - 2)) as f64;
        betweenness.iter_mut().for_each(|b| *b *= scale);
    }
    betweenness
}

/// Unweighted hop distances from `start` along successors; `None` if unreachable.
fn bfs_distances(graph: &GraphModel, start: NodeIx) -> Vec<Option<usize>> {
    let mut dist = vec![None; graph.node_count()];
    let mut queue = VecDeque::new();
    dist[start] = Some(0);
    queue.push_back(start);
    while let Some(v) = queue.pop_front() {
        let d = dist[v].unwrap_or(0);
        for &w in graph.successors(v) {
            if dist[w].is_none() {
                dist[w] = Some(d + 1);
                queue.push_back(w);
            }
        }
    }
    dist
}

/// Wasserman-Faust closeness over outgoing distances:
/// `(r - 1) / sum(d)` scaled by `(r - 1) / (n - 1)`, where `r` counts the
/// nodes reachable from the node (itself included).
fn closeness_centrality(graph: &GraphModel) -> Vec<f64> {
    let n = graph.node_count();
    (0..n)
        .map(|u| {
            let dist = bfs_distances(graph, u);
            let (reached, total) = dist
                .iter()
                .flatten()
                .fold((0usize, 0usize), |(r, t), d| (r + 1, t + d));
            if total == 0 || n <= 1 {
                return 0.0;
            }
            let others = (reached - 1) as f64;
            (others / total as f64) * (others / (n - 1) as f64)
        })
        .collect()
}

/// Damped PageRank with uniform teleport and uniform redistribution of
/// dangling mass. Edge weights (default 1) split a node's outflow; undirected
/// edges carry rank both ways.
fn pagerank(graph: &GraphModel, options: &CentralityOptions) -> Vec<f64> {
    let n = graph.node_count();
    if n == 0 {
        return Vec::new();
    }
    let alpha = options.pagerank_damping;
    let uniform = 1.0 / n as f64;

    let out_weight: Vec<f64> = (0..n)
        .map(|v| {
            graph
                .out_adj(v)
                .iter()
                .map(|adj| graph.edge_at(adj.edge).weight.unwrap_or(1.0))
                .sum()
        })
        .collect();
    let dangling: Vec<NodeIx> = (0..n).filter(|&v| out_weight[v] == 0.0).collect();

    let mut x = vec![uniform; n];
    for iteration in 0..options.pagerank_max_iter {
        let dangle_sum: f64 = alpha * dangling.iter().map(|&v| x[v]).sum::<f64>();
        let base = dangle_sum * uniform + (1.0 - alpha) * uniform;
        let mut next = vec![base; n];

        for v in 0..n {
            if out_weight[v] == 0.0 {
                continue;
            }
            let share = alpha * x[v] / out_weight[v];
            for adj in graph.out_adj(v) {
                let w = graph.edge_at(adj.edge).weight.unwrap_or(1.0);
                next[adj.node] += share * w;
            }
        }

        let err: f64 = next.iter().zip(&x).map(|(a, b)| (a - b).abs()).sum();
        x = next;
        if err < n as f64 * options.pagerank_tolerance {
            debug!(iterations = iteration + 1, "pagerank converged");
            return x;
        }
    }

    warn!(
        max_iter = options.pagerank_max_iter,
        "pagerank did not converge, returning last iterate"
    );
    x
}

/// In-edge (left) eigenvector centrality.
///
/// Power iteration on `A^T + I` from a uniform start, L2-normalised each
/// step. If it has not settled within the iteration cap the dominant
/// eigenvector is solved directly instead.
fn eigenvector_centrality(graph: &GraphModel, options: &CentralityOptions) -> Vec<f64> {
    let n = graph.node_count();
    if n == 0 {
        return Vec::new();
    }

    let mut x = vec![1.0 / n as f64; n];
    for _ in 0..options.eigenvector_max_iter {
        let mut next = x.clone();
        for v in 0..n {
            for &w in graph.successors(v) {
                next[w] += x[v];
            }
        }
        let norm = match l2_norm(&next) {
            z if z > 0.0 => z,
            _ => 1.0,
        };
        next.iter_mut().for_each(|v| *v /= norm);

        let err: f64 = next.iter().zip(&x).map(|(a, b)| (a - b).abs()).sum();
        x = next;
        if err < n as f64 * options.eigenvector_tolerance {
            return x;
        }
    }

    warn!(
        max_iter = options.eigenvector_max_iter,
        "eigenvector power iteration did not converge, using dense solver"
    );
    dense_eigenvector(graph, &x, options)
}

/// Dominant eigenvector of the in-edge adjacency matrix, normalised so its
/// entries sum positive and its L2 norm is 1.
///
/// Symmetric matrices go through Jacobi. Otherwise inverse iteration is
/// shifted just above a Collatz-Wielandt bound on the spectral radius taken
/// from the last power iterate; for a non-negative matrix the Perron root is
/// then the nearest eigenvalue to the shift.
fn dense_eigenvector(graph: &GraphModel, guess: &[f64], options: &CentralityOptions) -> Vec<f64> {
    let n = graph.node_count();
    let mut m = DenseMatrix::zeros(n);
    for v in 0..n {
        for &w in graph.successors(v) {
            m.set(w, v, 1.0);
        }
    }

    let vector = if m.is_symmetric() {
        let (values, vectors) = m.symmetric_eigen();
        let best = values
            .iter()
            .enumerate()
            .fold(0, |best, (k, &value)| if value > values[best] { k } else { best });
        vectors.column(best)
    } else {
        inverse_iteration(&m, guess, options)
    };

    let total: f64 = vector.iter().sum();
    let norm = l2_norm(&vector);
    if norm == 0.0 {
        return vector;
    }
    let scale = if total < 0.0 { -norm } else { norm };
    vector.into_iter().map(|v| v / scale).collect()
}

/// Cap for the shifted solve loop; independent of the power-iteration cap so
/// the fallback still runs when that cap is tiny.
const INVERSE_ITERATIONS: usize = 500;

fn inverse_iteration(m: &DenseMatrix, guess: &[f64], options: &CentralityOptions) -> Vec<f64> {
    let n = m.size();
    let image = m.mul_vec(guess);
    let max_in_degree = (0..n)
        .map(|row| (0..n).map(|col| m.get(row, col)).sum::<f64>())
        .fold(0.0f64, f64::max);
    let collatz = image
        .iter()
        .zip(guess)
        .filter(|(_, g)| **g > 0.0)
        .map(|(y, g)| y / g)
        .fold(0.0f64, f64::max);
    let bound = if guess.iter().all(|&g| g > 0.0) {
        collatz.min(max_in_degree)
    } else {
        max_in_degree
    };

    let mut shift = bound + 1e-9 * (1.0 + bound);
    let mut factors = None;
    for _ in 0..8 {
        let mut shifted = m.clone();
        for i in 0..n {
            shifted.add_to(i, i, -shift);
        }
        factors = shifted.lu();
        if factors.is_some() {
            break;
        }
        shift += 1e-6 * (1.0 + shift);
    }
    let Some(lu) = factors else {
        warn!("shifted adjacency matrix is singular, keeping power-iteration estimate");
        return guess.to_vec();
    };

    let mut x: Vec<f64> = guess.to_vec();
    for _ in 0..INVERSE_ITERATIONS {
        let mut y = lu.solve(&x);
        let norm = l2_norm(&y);
        if norm == 0.0 || !norm.is_finite() {
            break;
        }
        // Fix the sign so successive iterates are comparable.
        let sign = if y.iter().sum::<f64>() < 0.0 { -1.0 } else { 1.0 };
        y.iter_mut().for_each(|v| *v *= sign / norm);

        let err: f64 = y.iter().zip(&x).map(|(a, b)| (a - b).abs()).sum();
        x = y;
        if err < n as f64 * options.eigenvector_tolerance {
            break;
        }
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traversal::fixtures::*;

    fn score(result: &CentralityResult, id: &str) -> f64 {
        result.scores[id]
    }

    fn run(graph: &GraphModel, kind: CentralityKind) -> CentralityResult {
        centrality(graph, kind, &CentralityOptions::default())
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!("pagerank".parse::<CentralityKind>().unwrap(), CentralityKind::PageRank);
        assert_eq!("Degree".parse::<CentralityKind>().unwrap(), CentralityKind::Degree);
        assert_eq!(
            "katz".parse::<CentralityKind>().unwrap_err(),
            GraphError::UnknownCentralityKind("katz".into())
        );
    }

    #[test]
    fn test_degree_star() {
        let g = star(4);
        let r = run(&g, CentralityKind::Degree);
        assert!((score(&r, "hub") - 1.0).abs() < 1e-12);
        assert!((score(&r, "leaf000") - 0.25).abs() < 1e-12);
        assert_eq!(r.scores.len(), 5);
    }

    #[test]
    fn test_degree_counts_parallel_edges_and_loops() {
        let g = undirected(&["a", "b"], &[("a", "b"), ("a", "b"), ("a", "a")]);
        let r = run(&g, CentralityKind::Degree);
        assert_eq!(score(&r, "a"), 4.0);
        assert_eq!(score(&r, "b"), 2.0);
    }

    #[test]
    fn test_degree_single_node() {
        let g = directed(&["solo"], &[]);
        let r = run(&g, CentralityKind::Degree);
        assert_eq!(score(&r, "solo"), 1.0);
    }

    #[test]
    fn test_betweenness_path_graph() {
        // Undirected a - b - c: b lies on the only a..c path.
        let g = undirected(&["a", "b", "c"], &[("a", "b"), ("b", "c")]);
        let r = run(&g, CentralityKind::Betweenness);
        assert!((score(&r, "b") - 1.0).abs() < 1e-12);
        assert_eq!(score(&r, "a"), 0.0);
        assert_eq!(score(&r, "c"), 0.0);
    }

    #[test]
    fn test_betweenness_directed_chain() {
        let g = chain(4, true);
        let r = run(&g, CentralityKind::Betweenness);
        // n1 carries n0->n2 and n0->n3 out of 6 ordered pairs.
        assert!((score(&r, "n1") - 2.0 / 6.0).abs() < 1e-12);
        assert!((score(&r, "n2") - 2.0 / 6.0).abs() < 1e-12);
        assert_eq!(score(&r, "n0"), 0.0);
    }

    #[test]
    fn test_betweenness_splits_equal_paths() {
        let g = infra();
        let r = run(&g, CentralityKind::Betweenness);
        // lb1 -> db1 and lb1 -> cache1 each split across both servers.
        let expected = 1.0 / 12.0;
        assert!((score(&r, "server1") - expected).abs() < 1e-12);
        assert!((score(&r, "server2") - expected).abs() < 1e-12);
        assert_eq!(score(&r, "lb1"), 0.0);
    }

    #[test]
    fn test_closeness_star_undirected() {
        let g = undirected(
            &["c", "x", "y", "z"],
            &[("c", "x"), ("c", "y"), ("c", "z")],
        );
        let r = run(&g, CentralityKind::Closeness);
        assert!((score(&r, "c") - 1.0).abs() < 1e-12);
        // leaf: distances 1 + 2 + 2 = 5, all 3 reachable
        assert!((score(&r, "x") - 3.0 / 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_closeness_disconnected_scaled() {
        let g = undirected(&["a", "b", "c", "d"], &[("a", "b")]);
        let r = run(&g, CentralityKind::Closeness);
        // one of three others reachable at distance 1
        assert!((score(&r, "a") - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(score(&r, "c"), 0.0);
    }

    #[test]
    fn test_closeness_uses_outgoing_distances() {
        let g = chain(3, true);
        let r = run(&g, CentralityKind::Closeness);
        assert_eq!(score(&r, "n2"), 0.0);
        // n0 reaches both others: (2/3) * (2/2)
        assert!((score(&r, "n0") - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_pagerank_sums_to_one() {
        for g in [infra(), star(10), cycle(6, true), chain(5, false)] {
            let r = run(&g, CentralityKind::PageRank);
            let total: f64 = r.scores.values().sum();
            assert!((total - 1.0).abs() < 0.01, "sum was {}", total);
        }
    }

    #[test]
    fn test_pagerank_cycle_uniform() {
        let g = cycle(5, true);
        let r = run(&g, CentralityKind::PageRank);
        for v in r.scores.values() {
            assert!((v - 0.2).abs() < 1e-6);
        }
    }

    #[test]
    fn test_pagerank_sink_ranks_highest() {
        let g = infra();
        let r = run(&g, CentralityKind::PageRank);
        assert!(score(&r, "db1") > score(&r, "server1"));
        assert!(score(&r, "server1") > score(&r, "lb1"));
    }

    #[test]
    fn test_pagerank_empty() {
        let g = directed(&[], &[]);
        assert!(run(&g, CentralityKind::PageRank).scores.is_empty());
    }

    #[test]
    fn test_eigenvector_undirected_star() {
        let g = undirected(
            &["c", "l1", "l2", "l3", "l4"],
            &[("c", "l1"), ("c", "l2"), ("c", "l3"), ("c", "l4")],
        );
        let r = run(&g, CentralityKind::Eigenvector);
        assert!((score(&r, "c") - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-4);
        assert!((score(&r, "l1") - 1.0 / 8f64.sqrt()).abs() < 1e-4);
    }

    #[test]
    fn test_eigenvector_cycle_uniform() {
        let g = cycle(4, false);
        let r = run(&g, CentralityKind::Eigenvector);
        for v in r.scores.values() {
            assert!((v - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_eigenvector_directed_chain_concentrates_on_sink() {
        // A^T is nilpotent: every eigenvalue is 0 and the only eigenvector
        // sits on the sink.
        let g = chain(3, true);
        let r = run(&g, CentralityKind::Eigenvector);
        assert!((score(&r, "n2") - 1.0).abs() < 1e-3);
        assert!(score(&r, "n0").abs() < 1e-3);
    }

    #[test]
    fn test_eigenvector_fallback_directed() {
        // a <-> b, a -> c: Perron root 1 with eigenvector (1, 1, 1).
        let g = directed(&["a", "b", "c"], &[("a", "b"), ("b", "a"), ("a", "c")]);
        let opts = CentralityOptions {
            eigenvector_max_iter: 1,
            ..CentralityOptions::default()
        };
        let r = centrality(&g, CentralityKind::Eigenvector, &opts);
        let expected = 1.0 / 3f64.sqrt();
        for id in ["a", "b", "c"] {
            assert!((score(&r, id) - expected).abs() < 1e-6, "{} = {}", id, score(&r, id));
        }
    }

    #[test]
    fn test_eigenvector_fallback_symmetric() {
        let g = undirected(&["a", "b", "c"], &[("a", "b"), ("b", "c")]);
        let opts = CentralityOptions {
            eigenvector_max_iter: 1,
            ..CentralityOptions::default()
        };
        let r = centrality(&g, CentralityKind::Eigenvector, &opts);
        // Path P3: eigenvector (1, sqrt 2, 1) / 2
        assert!((score(&r, "b") - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-9);
        assert!((score(&r, "a") - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_top_n_ties_by_id() {
        let g = star(3);
        let r = run(&g, CentralityKind::Degree);
        let top = r.top_n(3);
        assert_eq!(top[0].0, "hub");
        assert_eq!(top[1].0, "leaf000");
        assert_eq!(top[2].0, "leaf001");
        assert_eq!(r.top_n(100).len(), 4);
    }
}
