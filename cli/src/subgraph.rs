//! `ego`, `subgraph` and `export`: commands that produce a new graph document.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use gexf_query_core::{ExportFormat, GraphModel};
use tracing::info;

use crate::{export, output};

fn save(graph: &GraphModel, format: ExportFormat, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Cannot write {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    export::write_graph(graph, format, &mut writer)?;
    writer.flush()?;
    info!(path = %path.display(), format = format.as_str(), nodes = graph.node_count(), "graph written");
    Ok(())
}

/// Shared tail for `ego` and `subgraph`: save, print info as JSON, or print the info table.
fn report(extracted: &GraphModel, heading: String, saved: &str, output: Option<&Path>, json: bool) -> Result<String> {
    if let Some(path) = output {
        save(extracted, ExportFormat::Gexf, path)?;
        return Ok(format!("{} {}", saved, path.display()));
    }
    let info = extracted.info();
    if json {
        output::json(&info)
    } else {
        Ok(format!("{}\n\n{}", heading, output::info_table(&info)))
    }
}

pub fn ego(graph: &GraphModel, center: &str, radius: u32, output: Option<&Path>, json: bool) -> Result<String> {
    let extracted = gexf_query_core::ego_graph(graph, center, radius)?;
    report(
        &extracted,
        format!("Ego graph for {} (radius={})", center, radius),
        "Saved ego graph to",
        output,
        json,
    )
}

pub fn subgraph(graph: &GraphModel, ids: &[String], output: Option<&Path>, json: bool) -> Result<String> {
    let extracted = gexf_query_core::subgraph(graph, ids)?;
    report(
        &extracted,
        format!("Subgraph with nodes: {}", ids.join(", ")),
        "Saved subgraph to",
        output,
        json,
    )
}

pub fn export(graph: &GraphModel, format: ExportFormat, output: Option<&Path>) -> Result<String> {
    match output {
        Some(path) => {
            save(graph, format, path)?;
            Ok(format!("Exported to {}", path.display()))
        }
        None => export::export_string(graph, format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::{fixtures::INFRA, load_file, parse_gexf};

    fn infra() -> GraphModel {
        parse_gexf(INFRA, Some("infra.gexf".into())).unwrap()
    }

    #[test]
    fn test_ego_info_json() {
        let out = ego(&infra(), "server2", 1, None, true).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(doc["node_count"], 3);
        assert_eq!(doc["edge_count"], 2);
    }

    #[test]
    fn test_ego_saved_to_file_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ego.gexf");
        let msg = ego(&infra(), "lb1", 1, Some(&path), false).unwrap();
        assert_eq!(msg, format!("Saved ego graph to {}", path.display()));

        let reloaded = load_file(&path).unwrap();
        assert_eq!(reloaded.node_count(), 3);
        assert_eq!(reloaded.edge_count(), 2);
        assert_eq!(
            reloaded.metadata().description.as_deref(),
            Some("Subgraph of Production infrastructure")
        );
    }

    #[test]
    fn test_subgraph_text_and_missing_ids() {
        let ids = vec!["lb1".to_string(), "server1".to_string()];
        let out = subgraph(&infra(), &ids, None, false).unwrap();
        assert!(out.starts_with("Subgraph with nodes: lb1, server1\n"));
        assert!(out.contains("Edge Count"));

        let bad = vec!["lb1".to_string(), "x".to_string(), "y".to_string()];
        let err = subgraph(&infra(), &bad, None, false).unwrap_err();
        assert_eq!(err.to_string(), "Nodes not found: x, y");
    }

    #[test]
    fn test_export_stdout_and_file() {
        let text = export(&infra(), ExportFormat::EdgeList, None).unwrap();
        assert_eq!(text.lines().next(), Some("lb1 server1 1.0"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.graphml");
        let msg = export(&infra(), ExportFormat::GraphMl, Some(&path)).unwrap();
        assert_eq!(msg, format!("Exported to {}", path.display()));
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("<graphml"));
    }
}
