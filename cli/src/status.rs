//! `meta`, `info`, `nodes` and `edges`: descriptive queries.

use anyhow::Result;
use gexf_query_core::{EdgeFilter, EdgeRecord, GraphModel, NodeFilter, NodeRecord};
use tracing::debug;

use crate::output;

pub fn meta(graph: &GraphModel, json: bool) -> Result<String> {
    let record = graph.metadata_record();
    if json {
        output::json(&record)
    } else {
        Ok(output::metadata_table(&record))
    }
}

pub fn info(graph: &GraphModel, json: bool) -> Result<String> {
    let info = graph.info();
    if json {
        output::json(&info)
    } else {
        Ok(output::info_table(&info))
    }
}

pub fn nodes(graph: &GraphModel, filter: &NodeFilter, show_attributes: bool, json: bool) -> Result<String> {
    let found: Vec<&NodeRecord> = graph.nodes_matching(filter).collect();
    debug!(matched = found.len(), total = graph.node_count(), "node listing");
    if json {
        output::json(&found)
    } else {
        Ok(output::nodes_table(&found, show_attributes))
    }
}

pub fn edges(graph: &GraphModel, filter: &EdgeFilter, show_attributes: bool, json: bool) -> Result<String> {
    let found: Vec<&EdgeRecord> = graph.edges_matching(filter).collect();
    debug!(matched = found.len(), total = graph.edge_count(), "edge listing");
    if json {
        output::json(&found)
    } else {
        Ok(output::edges_table(&found, show_attributes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::{fixtures::INFRA, parse_gexf};

    #[test]
    fn test_meta_json_counts() {
        let g = parse_gexf(INFRA, None).unwrap();
        let out = meta(&g, true).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(doc["node_count"], 5);
        assert_eq!(doc["edge_count"], 6);
        assert_eq!(doc["version"], "1.3");
    }

    #[test]
    fn test_nodes_json_filtered() {
        let g = parse_gexf(INFRA, None).unwrap();
        let filter = NodeFilter {
            label_pattern: Some("Server*".into()),
            attrs: vec![],
        };
        let out = nodes(&g, &filter, true, true).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&out).unwrap();
        let ids: Vec<&str> = doc
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["server1", "server2"]);
        assert_eq!(doc[0]["attributes"]["cores"], 8);
    }

    #[test]
    fn test_edges_by_source_and_weight() {
        let g = parse_gexf(INFRA, None).unwrap();
        let filter = EdgeFilter {
            attrs: vec![("weight".into(), "1.0".into())],
            source: Some("server2".into()),
            ..Default::default()
        };
        let out = edges(&g, &filter, true, true).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&out).unwrap();
        let targets: Vec<&str> = doc
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["target"].as_str().unwrap())
            .collect();
        assert_eq!(targets, vec!["db1", "cache1"]);
    }

    #[test]
    fn test_empty_listing_message() {
        let g = parse_gexf(INFRA, None).unwrap();
        let filter = NodeFilter {
            label_pattern: Some("Router*".into()),
            attrs: vec![],
        };
        assert_eq!(
            nodes(&g, &filter, true, false).unwrap(),
            "No nodes found matching the filters."
        );
    }
}
