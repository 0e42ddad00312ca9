use std::collections::VecDeque;

use serde::Serialize;
use tracing::debug;

use crate::graph::{GraphModel, NodeId, NodeIx};

/// Connectivity notion for component decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComponentKind {
    /// Plain components; weakly connected for directed graphs.
    #[default]
    Connected,
    Weakly,
    /// Respects edge direction. Same as `Connected` on undirected graphs.
    Strongly,
}

/// Component decomposition, largest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentInfo {
    pub num_components: usize,
    pub component_sizes: Vec<usize>,
    pub largest_component_size: usize,
    /// Member ids, each list sorted alphabetically.
    pub components: Vec<Vec<NodeId>>,
}

/// Decompose `graph` into components of the requested kind.
///
/// Components are ordered by size descending, equal sizes by their first
/// (smallest) member id.
pub fn components(graph: &GraphModel, kind: ComponentKind) -> ComponentInfo {
    let groups = if graph.is_directed() && kind == ComponentKind::Strongly {
        strongly_connected(graph)
    } else {
        weakly_connected(graph)
    };

    let mut components: Vec<Vec<NodeId>> = groups
        .into_iter()
        .map(|members| {
            let mut ids: Vec<NodeId> = members.into_iter().map(|ix| graph.id_of(ix).to_string()).collect();
            ids.sort();
            ids
        })
        .collect();
    components.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.first().cmp(&b.first())));

    let component_sizes: Vec<usize> = components.iter().map(Vec::len).collect();
    debug!(?kind, count = components.len(), "components");

    ComponentInfo {
        num_components: components.len(),
        largest_component_size: component_sizes.first().copied().unwrap_or(0),
        component_sizes,
        components,
    }
}

/// Components ignoring edge direction, via BFS.
pub(crate) fn weakly_connected(graph: &GraphModel) -> Vec<Vec<NodeIx>> {
    let n = graph.node_count();
    let mut seen = vec![false; n];
    let mut groups = Vec::new();
    let mut queue = VecDeque::new();

    for root in 0..n {
        if seen[root] {
            continue;
        }
        seen[root] = true;
        queue.push_back(root);
        let mut members = Vec::new();
        while let Some(v) = queue.pop_front() {
            members.push(v);
            for &w in graph.neighbors_undirected(v) {
                if !seen[w] {
                    seen[w] = true;
                    queue.push_back(w);
                }
            }
        }
        groups.push(members);
    }

    groups
}

/// Strongly connected components with an iterative Tarjan.
pub(crate) fn strongly_connected(graph: &GraphModel) -> Vec<Vec<NodeIx>> {
    const UNVISITED: usize = usize::MAX;

    let n = graph.node_count();
    let mut index = vec![UNVISITED; n];
    let mut lowlink = vec![0usize; n];
    let mut on_stack = vec![false; n];
    let mut stack: Vec<NodeIx> = Vec::new();
    let mut groups = Vec::new();
    let mut counter = 0usize;

    // (node, next successor position)
    let mut call: Vec<(NodeIx, usize)> = Vec::new();

    for root in 0..n {
        if index[root] != UNVISITED {
            continue;
        }
        call.push((root, 0));
        index[root] = counter;
        lowlink[root] = counter;
        counter += 1;
        stack.push(root);
        on_stack[root] = true;

        while let Some(&mut (v, ref mut pos)) = call.last_mut() {
            let succ = graph.successors(v);
            if *pos < succ.len() {
                let w = succ[*pos];
                *pos += 1;
                if index[w] == UNVISITED {
                    index[w] = counter;
                    lowlink[w] = counter;
                    counter += 1;
                    stack.push(w);
                    on_stack[w] = true;
                    call.push((w, 0));
                } else if on_stack[w] {
                    lowlink[v] = lowlink[v].min(index[w]);
                }
                continue;
            }

            call.pop();
            if let Some(&(parent, _)) = call.last() {
                lowlink[parent] = lowlink[parent].min(lowlink[v]);
            }

            if lowlink[v] == index[v] {
                let mut members = Vec::new();
                while let Some(w) = stack.pop() {
                    on_stack[w] = false;
                    members.push(w);
                    if w == v {
                        break;
                    }
                }
                groups.push(members);
            }
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traversal::fixtures::*;

    #[test]
    fn test_weak_components_infra() {
        let g = infra();
        let info = components(&g, ComponentKind::Weakly);
        assert_eq!(info.num_components, 1);
        assert_eq!(info.largest_component_size, 5);
        assert_eq!(info.components[0], vec!["cache1", "db1", "lb1", "server1", "server2"]);
    }

    #[test]
    fn test_connected_on_directed_means_weak() {
        let g = directed(&["a", "b", "c"], &[("a", "b"), ("c", "b")]);
        assert_eq!(components(&g, ComponentKind::Connected).num_components, 1);
    }

    #[test]
    fn test_strong_components() {
        // a <-> b, b -> c, c <-> d, e isolated
        let g = directed(
            &["a", "b", "c", "d", "e"],
            &[("a", "b"), ("b", "a"), ("b", "c"), ("c", "d"), ("d", "c")],
        );
        let info = components(&g, ComponentKind::Strongly);
        assert_eq!(info.num_components, 3);
        assert_eq!(info.component_sizes, vec![2, 2, 1]);
        assert_eq!(info.components[0], vec!["a", "b"]);
        assert_eq!(info.components[1], vec!["c", "d"]);
        assert_eq!(info.components[2], vec!["e"]);
    }

    #[test]
    fn test_strong_components_cycle() {
        let g = cycle(6, true);
        let info = components(&g, ComponentKind::Strongly);
        assert_eq!(info.num_components, 1);
        assert_eq!(info.largest_component_size, 6);
    }

    #[test]
    fn test_strong_components_dag_all_singletons() {
        let g = chain(4, true);
        let info = components(&g, ComponentKind::Strongly);
        assert_eq!(info.num_components, 4);
        assert_eq!(info.components, vec![vec!["n0"], vec!["n1"], vec!["n2"], vec!["n3"]]);
    }

    #[test]
    fn test_undirected_ignores_strongly() {
        let g = undirected(&["a", "b", "x"], &[("a", "b")]);
        let info = components(&g, ComponentKind::Strongly);
        assert_eq!(info.component_sizes, vec![2, 1]);
    }

    #[test]
    fn test_equal_sizes_ordered_by_first_member() {
        let g = undirected(&["z1", "z2", "a1", "a2"], &[("z1", "z2"), ("a2", "a1")]);
        let info = components(&g, ComponentKind::Connected);
        assert_eq!(info.components, vec![vec!["a1", "a2"], vec!["z1", "z2"]]);
    }

    #[test]
    fn test_empty_graph() {
        let g = directed(&[], &[]);
        let info = components(&g, ComponentKind::Weakly);
        assert_eq!(info.num_components, 0);
        assert_eq!(info.largest_component_size, 0);
    }
}
