//! gexf-query-core: In-memory graph model and analysis engine.
//!
//! Holds a parsed graph (nodes, edges, typed attributes, metadata) and
//! answers structural queries over it: filtered listings, neighbourhood and
//! reachability traversal, shortest and simple paths, centrality measures,
//! component decomposition, statistics and subgraph extraction.
//! No I/O happens here; readers and exporters live in the `gexf-query` crate.

mod attr;
mod centrality;
mod components;
mod error;
mod filter;
mod format;
mod graph;
mod linalg;
mod metadata;
mod path;
mod stats;
mod subgraph;
mod traversal;

pub use attr::{format_float, AttrValue, Attributes};
pub use centrality::{centrality, CentralityKind, CentralityOptions, CentralityResult};
pub use components::{components, ComponentInfo, ComponentKind};
pub use error::{GraphError, Result};
pub use filter::{wildcard_match, EdgeFilter, NodeFilter};
pub use format::ExportFormat;
pub use graph::{
    parse_weight, Adjacent, EdgeIx, EdgeRecord, GraphModel, NodeId, NodeIx, NodeRecord,
    PROMOTED_EDGE_FIELDS, RESERVED_NODE_FIELDS,
};
pub use metadata::{GraphInfo, GraphMetadata, MetadataRecord};
pub use path::{all_paths, has_path, shortest_path, PathResult};
pub use stats::{stats, GraphStats};
pub use subgraph::{ego_graph, subgraph};
pub use traversal::{
    common_neighbors, degree_of, degree_report, neighbors, reachable, DegreeInfo, Reach,
    TraversalDirection,
};
