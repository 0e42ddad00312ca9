use std::collections::{HashSet, VecDeque};

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::graph::{GraphModel, NodeId, NodeIx, NodeRecord};

/// Which relation `neighbors` expands along. Ignored for undirected graphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalDirection {
    /// Successors.
    Outgoing,
    /// Predecessors.
    Incoming,
    Both,
}

/// Which relation `reachable` follows. Ignored for undirected graphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reach {
    /// Descendants.
    Forward,
    /// Ancestors.
    Backward,
    Both,
}

/// Degree information for a single node. In/out degrees are reported for
/// directed graphs only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DegreeInfo {
    pub node: NodeId,
    pub in_degree: Option<usize>,
    pub out_degree: Option<usize>,
    pub total_degree: usize,
}

/// Directed entries serialize as `{node, in_degree, out_degree, total_degree}`,
/// undirected ones as `{node, degree}`.
impl Serialize for DegreeInfo {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("node", &self.node)?;
        match (self.in_degree, self.out_degree) {
            (Some(in_degree), Some(out_degree)) => {
                map.serialize_entry("in_degree", &in_degree)?;
                map.serialize_entry("out_degree", &out_degree)?;
                map.serialize_entry("total_degree", &self.total_degree)?;
            }
            _ => map.serialize_entry("degree", &self.total_degree)?,
        }
        map.end()
    }
}

/// Iterate adjacent nodes according to a direction filter.
///
/// Uses boolean flags rather than boxed iterators; undirected graphs always
/// yield their plain adjacency.
fn iter_neighbors(
    graph: &GraphModel,
    node: NodeIx,
    dir: TraversalDirection,
) -> impl Iterator<Item = NodeIx> + '_ {
    let (use_out, use_in) = if !graph.is_directed() {
        (true, false)
    } else {
        match dir {
            TraversalDirection::Outgoing => (true, false),
            TraversalDirection::Incoming => (false, true),
            TraversalDirection::Both => (true, true),
        }
    };

    let out_iter = graph
        .successors(node)
        .iter()
        .copied()
        .filter(move |_| use_out);
    let in_iter = graph
        .predecessors(node)
        .iter()
        .copied()
        .filter(move |_| use_in);

    out_iter.chain(in_iter)
}

/// Sort node indices by id and resolve them to records.
pub(crate) fn sorted_records(graph: &GraphModel, ids: impl IntoIterator<Item = NodeIx>) -> Vec<&NodeRecord> {
    let mut records: Vec<&NodeRecord> = ids.into_iter().map(|ix| graph.record(ix)).collect();
    records.sort_by(|a, b| a.id.cmp(&b.id));
    records
}

/// Nodes touched by `depth` rounds of frontier expansion from `id`.
///
/// Round k expands the frontier produced by round k-1 (not everything seen so
/// far); the result is the union over all rounds, minus the origin, sorted by id.
pub fn neighbors<'a>(
    graph: &'a GraphModel,
    id: &str,
    direction: TraversalDirection,
    depth: u32,
) -> Result<Vec<&'a NodeRecord>> {
    let origin = graph.require(id)?;

    let mut touched: HashSet<NodeIx> = HashSet::new();
    let mut frontier: HashSet<NodeIx> = HashSet::from([origin]);

    for _ in 0..depth {
        let mut next: HashSet<NodeIx> = HashSet::new();
        for &node in &frontier {
            next.extend(iter_neighbors(graph, node, direction));
        }
        touched.extend(next.iter().copied());
        next.remove(&origin);
        if next.is_empty() {
            break;
        }
        frontier = next;
    }

    touched.remove(&origin);
    debug!(origin = id, depth, found = touched.len(), "neighbors");
    Ok(sorted_records(graph, touched))
}

/// BFS from `start` along `step`, optionally bounded to `max_depth` hops.
/// Returns every visited node including `start`.
pub(crate) fn bfs_visit<'g, F, I>(
    graph: &'g GraphModel,
    start: NodeIx,
    max_depth: Option<u32>,
    step: F,
) -> Vec<NodeIx>
where
    F: Fn(NodeIx) -> I,
    I: Iterator<Item = NodeIx> + 'g,
{
    let mut visited = vec![false; graph.node_count()];
    let mut order = Vec::new();
    let mut queue: VecDeque<(NodeIx, u32)> = VecDeque::new();

    visited[start] = true;
    order.push(start);
    queue.push_back((start, 0));

    while let Some((current, depth)) = queue.pop_front() {
        if max_depth.is_some_and(|max| depth >= max) {
            continue;
        }
        for next in step(current) {
            if !visited[next] {
                visited[next] = true;
                order.push(next);
                queue.push_back((next, depth + 1));
            }
        }
    }

    order
}

/// Nodes reachable from `id`, excluding `id` itself, sorted by id.
///
/// Directed graphs follow edges forward (descendants), backward (ancestors) or
/// both (union). Undirected graphs ignore `reach` and return the origin's
/// connected component. `max_depth` bounds the hop count.
pub fn reachable<'a>(
    graph: &'a GraphModel,
    id: &str,
    reach: Reach,
    max_depth: Option<u32>,
) -> Result<Vec<&'a NodeRecord>> {
    let origin = graph.require(id)?;
    let mut found: HashSet<NodeIx> = HashSet::new();

    if graph.is_directed() {
        if matches!(reach, Reach::Forward | Reach::Both) {
            found.extend(bfs_visit(graph, origin, max_depth, |v| {
                graph.successors(v).iter().copied()
            }));
        }
        if matches!(reach, Reach::Backward | Reach::Both) {
            found.extend(bfs_visit(graph, origin, max_depth, |v| {
                graph.predecessors(v).iter().copied()
            }));
        }
    } else {
        found.extend(bfs_visit(graph, origin, max_depth, |v| {
            graph.successors(v).iter().copied()
        }));
    }

    found.remove(&origin);
    debug!(origin = id, found = found.len(), "reachable");
    Ok(sorted_records(graph, found))
}

/// Nodes adjacent to both `a` and `b`, sorted by id.
///
/// For directed graphs a node's neighbour set is the union of its
/// predecessors and successors. Undirected graphs intersect plain adjacency
/// and never report `a` or `b` themselves.
pub fn common_neighbors<'a>(graph: &'a GraphModel, a: &str, b: &str) -> Result<Vec<&'a NodeRecord>> {
    let ia = graph.require(a)?;
    let ib = graph.require(b)?;

    let around = |ix: NodeIx| -> HashSet<NodeIx> {
        iter_neighbors(graph, ix, TraversalDirection::Both).collect()
    };
    let na = around(ia);
    let nb = around(ib);

    let mut common: HashSet<NodeIx> = na.intersection(&nb).copied().collect();
    if !graph.is_directed() {
        common.remove(&ia);
        common.remove(&ib);
    }

    Ok(sorted_records(graph, common))
}

fn degree_info(graph: &GraphModel, ix: NodeIx) -> DegreeInfo {
    let directed = graph.is_directed();
    DegreeInfo {
        node: graph.id_of(ix).to_string(),
        in_degree: directed.then(|| graph.in_degree_ix(ix)),
        out_degree: directed.then(|| graph.out_degree_ix(ix)),
        total_degree: graph.degree_ix(ix),
    }
}

/// Degree information for one node.
pub fn degree_of(graph: &GraphModel, id: &str) -> Result<DegreeInfo> {
    let ix = graph.require(id)?;
    Ok(degree_info(graph, ix))
}

/// Return nodes ranked by total degree.
///
/// If `top_n` is 0, returns all nodes. Otherwise returns the top N by total
/// degree (descending). Ties are broken by node id (ascending).
pub fn degree_report(graph: &GraphModel, top_n: usize) -> Vec<DegreeInfo> {
    let mut results: Vec<DegreeInfo> = (0..graph.node_count())
        .map(|ix| degree_info(graph, ix))
        .collect();

    results.sort_by(|a, b| {
        b.total_degree
            .cmp(&a.total_degree)
            .then_with(|| a.node.cmp(&b.node))
    });

    if top_n > 0 && top_n < results.len() {
        results.truncate(top_n);
    }

    results
}
