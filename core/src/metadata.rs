//! File-level descriptive fields and the summaries built from them.

use serde::Serialize;

use crate::graph::GraphModel;

/// Descriptive fields read once when a graph is loaded.
///
/// Node and edge counts are not stored here; they are always taken from the
/// live model (see [`GraphModel::metadata_record`]).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphMetadata {
    pub creator: Option<String>,
    pub description: Option<String>,
    pub last_modified: Option<String>,
    pub mode: String,
    pub default_edge_type: String,
    pub version: Option<String>,
    /// Name of the document the graph came from, if any.
    #[serde(skip)]
    pub source_name: Option<String>,
}

impl Default for GraphMetadata {
    fn default() -> Self {
        Self {
            creator: None,
            description: None,
            last_modified: None,
            mode: "static".to_string(),
            default_edge_type: "undirected".to_string(),
            version: None,
            source_name: None,
        }
    }
}

impl GraphMetadata {
    pub fn for_directed(directed: bool) -> Self {
        Self {
            default_edge_type: if directed { "directed" } else { "undirected" }.to_string(),
            ..Self::default()
        }
    }

    /// Metadata for a graph cut out of this one.
    pub fn derived(&self) -> Self {
        let parent = self
            .description
            .as_deref()
            .or(self.source_name.as_deref())
            .unwrap_or("graph");
        Self {
            creator: self.creator.clone(),
            description: Some(format!("Subgraph of {}", parent)),
            last_modified: None,
            mode: self.mode.clone(),
            default_edge_type: self.default_edge_type.clone(),
            version: self.version.clone(),
            source_name: self.source_name.clone(),
        }
    }
}

/// Metadata plus live counts, as reported to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataRecord {
    pub creator: Option<String>,
    pub description: Option<String>,
    pub last_modified: Option<String>,
    pub mode: String,
    pub default_edge_type: String,
    pub version: Option<String>,
    pub node_count: usize,
    pub edge_count: usize,
}

/// Summary of a graph's shape and available attribute keys.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphInfo {
    pub version: Option<String>,
    pub mode: String,
    pub default_edge_type: String,
    pub node_count: usize,
    pub edge_count: usize,
    pub node_attributes: Vec<String>,
    pub edge_attributes: Vec<String>,
}

impl GraphModel {
    pub fn metadata_record(&self) -> MetadataRecord {
        let meta = self.metadata();
        MetadataRecord {
            creator: meta.creator.clone(),
            description: meta.description.clone(),
            last_modified: meta.last_modified.clone(),
            mode: meta.mode.clone(),
            default_edge_type: meta.default_edge_type.clone(),
            version: meta.version.clone(),
            node_count: self.node_count(),
            edge_count: self.edge_count(),
        }
    }

    pub fn info(&self) -> GraphInfo {
        let meta = self.metadata();
        GraphInfo {
            version: meta.version.clone(),
            mode: meta.mode.clone(),
            default_edge_type: meta.default_edge_type.clone(),
            node_count: self.node_count(),
            edge_count: self.edge_count(),
            node_attributes: self.node_attribute_keys(),
            edge_attributes: self.edge_attribute_keys(),
        }
    }
}
