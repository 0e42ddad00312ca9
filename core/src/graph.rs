use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Serialize;
use tracing::debug;

use crate::attr::{AttrValue, Attributes};
use crate::error::{GraphError, Result};
use crate::metadata::GraphMetadata;

/// Opaque node identifier as it appears in the source document.
pub type NodeId = String;

/// Dense position of a node in the model's node table.
pub type NodeIx = usize;

/// Position of an edge in insertion order.
pub type EdgeIx = usize;

/// Edge fields promoted out of the attribute map into named record fields.
pub const PROMOTED_EDGE_FIELDS: [&str; 4] = ["id", "weight", "type", "label"];

/// Node fields that live on the record itself, never in `attributes`.
pub const RESERVED_NODE_FIELDS: [&str; 2] = ["id", "label"];

/// A graph vertex.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub label: Option<String>,
    pub attributes: Attributes,
}

impl NodeRecord {
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            label: None,
            attributes: Attributes::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// A graph connection. `source`/`target` must name nodes of the same model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeRecord {
    pub id: Option<String>,
    pub source: NodeId,
    pub target: NodeId,
    pub weight: Option<f64>,
    #[serde(rename = "type")]
    pub edge_type: Option<String>,
    pub label: Option<String>,
    pub attributes: Attributes,
}

impl EdgeRecord {
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            id: None,
            source: source.into(),
            target: target.into(),
            weight: None,
            edge_type: None,
            label: None,
            attributes: Attributes::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_type(mut self, edge_type: impl Into<String>) -> Self {
        self.edge_type = Some(edge_type.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Parse edge weight text, rejecting anything non-numeric.
pub fn parse_weight(text: &str) -> Result<f64> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| GraphError::MalformedGraph(format!("non-numeric edge weight '{}'", text)))
}

/// One entry of an adjacency list: the node on the other end and the edge used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adjacent {
    pub node: NodeIx,
    pub edge: EdgeIx,
}

/// Immutable in-memory graph: node/edge records plus adjacency indices.
///
/// For directed graphs `outgoing[a]` holds edges leaving a and `incoming[b]`
/// edges entering b. Undirected graphs store every edge in `outgoing` of both
/// endpoints (a self-loop once) and leave `incoming` empty.
///
/// The `succ`/`pred`/`undirected` tables are the same relations with parallel
/// edges collapsed, in first-seen order; analysis algorithms walk those.
pub struct GraphModel {
    directed: bool,
    nodes: Vec<NodeRecord>,
    index: HashMap<NodeId, NodeIx>,
    edges: Vec<EdgeRecord>,
    endpoints: Vec<(NodeIx, NodeIx)>,
    outgoing: Vec<Vec<Adjacent>>,
    incoming: Vec<Vec<Adjacent>>,
    succ: Vec<Vec<NodeIx>>,
    pred: Vec<Vec<NodeIx>>,
    undirected: Vec<Vec<NodeIx>>,
    degree: Vec<usize>,
    metadata: GraphMetadata,
    node_attr_keys: BTreeSet<String>,
    edge_attr_keys: BTreeSet<String>,
}

impl GraphModel {
    /// Build a model with metadata derived from directedness alone.
    pub fn new(directed: bool, nodes: Vec<NodeRecord>, edges: Vec<EdgeRecord>) -> Result<Self> {
        Self::with_metadata(directed, nodes, edges, GraphMetadata::for_directed(directed))
    }

    /// Build a model from raw records.
    ///
    /// Fails with `MalformedGraph` on a duplicate node id, an edge endpoint
    /// that names no node, or an attribute key that collides with a record
    /// field. O(V + E).
    pub fn with_metadata(
        directed: bool,
        nodes: Vec<NodeRecord>,
        edges: Vec<EdgeRecord>,
        metadata: GraphMetadata,
    ) -> Result<Self> {
        let n = nodes.len();
        let mut index: HashMap<NodeId, NodeIx> = HashMap::with_capacity(n);
        for (ix, node) in nodes.iter().enumerate() {
            if index.insert(node.id.clone(), ix).is_some() {
                return Err(GraphError::MalformedGraph(format!(
                    "duplicate node id '{}'",
                    node.id
                )));
            }
            if let Some(key) = reserved_key(&node.attributes, &RESERVED_NODE_FIELDS) {
                return Err(GraphError::MalformedGraph(format!(
                    "node '{}' carries reserved attribute '{}'",
                    node.id, key
                )));
            }
        }

        let mut endpoints = Vec::with_capacity(edges.len());
        let mut outgoing: Vec<Vec<Adjacent>> = vec![Vec::new(); n];
        let mut incoming: Vec<Vec<Adjacent>> = vec![Vec::new(); if directed { n } else { 0 }];
        let mut degree = vec![0usize; n];

        for (e, edge) in edges.iter().enumerate() {
            let from = lookup_endpoint(&index, &edge.source, "source")?;
            let to = lookup_endpoint(&index, &edge.target, "target")?;
            if let Some(key) = reserved_key(&edge.attributes, &PROMOTED_EDGE_FIELDS) {
                return Err(GraphError::MalformedGraph(format!(
                    "edge {} -> {} carries reserved attribute '{}'",
                    edge.source, edge.target, key
                )));
            }
            if let Some(w) = edge.weight {
                if w.is_nan() {
                    return Err(GraphError::MalformedGraph(format!(
                        "edge {} -> {} has a NaN weight",
                        edge.source, edge.target
                    )));
                }
            }
            endpoints.push((from, to));
            outgoing[from].push(Adjacent { node: to, edge: e });
            if directed {
                incoming[to].push(Adjacent { node: from, edge: e });
            } else if from != to {
                outgoing[to].push(Adjacent { node: from, edge: e });
            }
            // A self-loop contributes two edge ends in both graph kinds.
            degree[from] += 1;
            degree[to] += 1;
        }

        let succ: Vec<Vec<NodeIx>> = outgoing.iter().map(|adj| distinct(adj)).collect();
        let pred: Vec<Vec<NodeIx>> = if directed {
            incoming.iter().map(|adj| distinct(adj)).collect()
        } else {
            Vec::new()
        };
        let undirected = if directed {
            (0..n)
                .map(|ix| {
                    let mut seen = HashSet::new();
                    succ[ix]
                        .iter()
                        .chain(pred[ix].iter())
                        .copied()
                        .filter(|&v| seen.insert(v))
                        .collect()
                })
                .collect()
        } else {
            succ.clone()
        };

        let node_attr_keys = nodes
            .iter()
            .flat_map(|node| node.attributes.keys().cloned())
            .collect();
        let edge_attr_keys = collect_edge_keys(&edges);

        debug!(
            nodes = n,
            edges = edges.len(),
            directed,
            "graph model constructed"
        );

        Ok(Self {
            directed,
            nodes,
            index,
            edges,
            endpoints,
            outgoing,
            incoming,
            succ,
            pred,
            undirected,
            degree,
            metadata,
            node_attr_keys,
            edge_attr_keys,
        })
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn metadata(&self) -> &GraphMetadata {
        &self.metadata
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> &[NodeRecord] {
        &self.nodes
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> &[EdgeRecord] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&NodeRecord> {
        self.index.get(id).map(|&ix| &self.nodes[ix])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Successor ids (directed) or neighbour ids (undirected), one per edge.
    pub fn neighbors_out(&self, id: &str) -> Vec<&str> {
        match self.ix(id) {
            Some(ix) => self.outgoing[ix].iter().map(|a| self.id_of(a.node)).collect(),
            None => Vec::new(),
        }
    }

    /// Predecessor ids, one per edge. Undirected graphs have no separate
    /// incoming relation and report their plain adjacency.
    pub fn neighbors_in(&self, id: &str) -> Vec<&str> {
        if !self.directed {
            return self.neighbors_out(id);
        }
        match self.ix(id) {
            Some(ix) => self.incoming[ix].iter().map(|a| self.id_of(a.node)).collect(),
            None => Vec::new(),
        }
    }

    /// Total degree; a self-loop counts twice.
    pub fn degree(&self, id: &str) -> Option<usize> {
        self.ix(id).map(|ix| self.degree[ix])
    }

    pub fn out_degree(&self, id: &str) -> Option<usize> {
        self.ix(id).map(|ix| self.out_degree_ix(ix))
    }

    pub fn in_degree(&self, id: &str) -> Option<usize> {
        self.ix(id).map(|ix| self.in_degree_ix(ix))
    }

    /// Custom node attribute keys, sorted.
    pub fn node_attribute_keys(&self) -> Vec<String> {
        self.node_attr_keys.iter().cloned().collect()
    }

    /// Edge attribute keys (custom keys plus promoted fields in use), sorted.
    pub fn edge_attribute_keys(&self) -> Vec<String> {
        self.edge_attr_keys.iter().cloned().collect()
    }

    /// Approximate heap usage in bytes.
    pub fn memory_usage(&self) -> usize {
        use std::mem::size_of;

        let nodes_mem = self.nodes.len() * (size_of::<NodeRecord>() + size_of::<NodeIx>() + 48);
        let edges_mem = self.edges.len() * (size_of::<EdgeRecord>() + size_of::<(NodeIx, NodeIx)>());
        let adj_entries: usize = self
            .outgoing
            .iter()
            .chain(self.incoming.iter())
            .map(|v| v.len())
            .sum();
        let simple_entries: usize = self
            .succ
            .iter()
            .chain(self.pred.iter())
            .chain(self.undirected.iter())
            .map(|v| v.len())
            .sum();

        nodes_mem + edges_mem + adj_entries * size_of::<Adjacent>() + simple_entries * size_of::<NodeIx>()
    }

    // -----------------------------------------------------------------------
    // Index-level access for the analysis modules
    // -----------------------------------------------------------------------

    pub(crate) fn ix(&self, id: &str) -> Option<NodeIx> {
        self.index.get(id).copied()
    }

    /// Resolve an id or fail with `NodeNotFound`.
    pub(crate) fn require(&self, id: &str) -> Result<NodeIx> {
        self.ix(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))
    }

    pub(crate) fn id_of(&self, ix: NodeIx) -> &str {
        &self.nodes[ix].id
    }

    pub(crate) fn record(&self, ix: NodeIx) -> &NodeRecord {
        &self.nodes[ix]
    }

    pub(crate) fn edge_at(&self, e: EdgeIx) -> &EdgeRecord {
        &self.edges[e]
    }

    pub(crate) fn endpoints(&self, e: EdgeIx) -> (NodeIx, NodeIx) {
        self.endpoints[e]
    }

    /// Edge-level adjacency following edge direction (both ends if undirected).
    pub(crate) fn out_adj(&self, ix: NodeIx) -> &[Adjacent] {
        &self.outgoing[ix]
    }

    /// Distinct successors (neighbours if undirected).
    pub(crate) fn successors(&self, ix: NodeIx) -> &[NodeIx] {
        &self.succ[ix]
    }

    /// Distinct predecessors (neighbours if undirected).
    pub(crate) fn predecessors(&self, ix: NodeIx) -> &[NodeIx] {
        if self.directed {
            &self.pred[ix]
        } else {
            &self.succ[ix]
        }
    }

    /// Distinct neighbours ignoring direction.
    pub(crate) fn neighbors_undirected(&self, ix: NodeIx) -> &[NodeIx] {
        &self.undirected[ix]
    }

    pub(crate) fn degree_ix(&self, ix: NodeIx) -> usize {
        self.degree[ix]
    }

    pub(crate) fn out_degree_ix(&self, ix: NodeIx) -> usize {
        if self.directed {
            self.outgoing[ix].len()
        } else {
            self.degree[ix]
        }
    }

    pub(crate) fn in_degree_ix(&self, ix: NodeIx) -> usize {
        if self.directed {
            self.incoming[ix].len()
        } else {
            self.degree[ix]
        }
    }
}

impl std::fmt::Debug for GraphModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphModel")
            .field("directed", &self.directed)
            .field("nodes", &self.nodes.len())
            .field("edges", &self.edges.len())
            .finish()
    }
}

fn lookup_endpoint(index: &HashMap<NodeId, NodeIx>, id: &str, role: &str) -> Result<NodeIx> {
    index.get(id).copied().ok_or_else(|| {
        GraphError::MalformedGraph(format!("edge {} '{}' is not a known node", role, id))
    })
}

fn reserved_key<'a>(attributes: &'a Attributes, reserved: &[&str]) -> Option<&'a str> {
    attributes
        .keys()
        .map(String::as_str)
        .find(|key| reserved.contains(key))
}

fn distinct(adj: &[Adjacent]) -> Vec<NodeIx> {
    let mut seen = HashSet::with_capacity(adj.len());
    adj.iter()
        .map(|a| a.node)
        .filter(|&v| seen.insert(v))
        .collect()
}

fn collect_edge_keys(edges: &[EdgeRecord]) -> BTreeSet<String> {
    let mut keys = BTreeSet::new();
    for edge in edges {
        keys.extend(edge.attributes.keys().cloned());
        if edge.id.is_some() {
            keys.insert("id".to_string());
        }
        if edge.weight.is_some() {
            keys.insert("weight".to_string());
        }
        if edge.edge_type.is_some() {
            keys.insert("type".to_string());
        }
        if edge.label.is_some() {
            keys.insert("label".to_string());
        }
    }
    keys
}
