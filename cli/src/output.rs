//! Human-readable rendering of query results.
//!
//! Every function returns the finished text so commands decide where it goes.

use gexf_query_core::{
    CentralityResult, ComponentInfo, DegreeInfo, EdgeRecord, GraphInfo, GraphStats,
    MetadataRecord, NodeRecord, PathResult,
};
use serde::Serialize;
use tabled::{builder::Builder, settings::Style};

/// Component member lists longer than this are cut short in tables.
const MEMBER_PREVIEW: usize = 10;

pub fn json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn render(builder: Builder) -> String {
    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

fn key_value<'a>(title: &str, rows: impl IntoIterator<Item = (&'a str, String)>) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Property", "Value"]);
    for (key, value) in rows {
        builder.push_record([key.to_string(), value]);
    }
    format!("{}\n{}", title, render(builder))
}

fn or_na(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "N/A".to_string())
}

fn yes_no(flag: bool) -> String {
    let text = if flag { "Yes" } else { "No" };
    text.to_string()
}

fn join_attrs<'a, V: std::fmt::Display + 'a>(attrs: impl IntoIterator<Item = (&'a String, &'a V)>) -> String {
    attrs
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn metadata_table(meta: &MetadataRecord) -> String {
    key_value(
        "Graph Metadata",
        [
            ("Version", or_na(&meta.version)),
            ("Creator", or_na(&meta.creator)),
            ("Description", or_na(&meta.description)),
            ("Last Modified", or_na(&meta.last_modified)),
            ("Mode", meta.mode.clone()),
            ("Default Edge Type", meta.default_edge_type.clone()),
            ("Node Count", meta.node_count.to_string()),
            ("Edge Count", meta.edge_count.to_string()),
        ],
    )
}

pub fn info_table(info: &GraphInfo) -> String {
    let table = key_value(
        "Graph Summary",
        [
            ("Version", or_na(&info.version)),
            ("Mode", info.mode.clone()),
            ("Default Edge Type", info.default_edge_type.clone()),
            ("Node Count", info.node_count.to_string()),
            ("Edge Count", info.edge_count.to_string()),
        ],
    );

    let list = |keys: &[String]| {
        if keys.is_empty() {
            "None".to_string()
        } else {
            keys.join(", ")
        }
    };
    format!(
        "{}\n\nNode Attributes: {}\nEdge Attributes: {}",
        table,
        list(&info.node_attributes),
        list(&info.edge_attributes)
    )
}

pub fn nodes_table(nodes: &[&NodeRecord], show_attributes: bool) -> String {
    if nodes.is_empty() {
        return "No nodes found matching the filters.".to_string();
    }

    let mut builder = Builder::default();
    let mut header = vec!["ID", "Label"];
    if show_attributes {
        header.push("Attributes");
    }
    builder.push_record(header);

    for node in nodes {
        let mut row = vec![node.id.clone(), node.label.clone().unwrap_or_default()];
        if show_attributes {
            row.push(join_attrs(&node.attributes));
        }
        builder.push_record(row);
    }
    format!("Nodes ({})\n{}", nodes.len(), render(builder))
}

pub fn edges_table(edges: &[&EdgeRecord], show_attributes: bool) -> String {
    if edges.is_empty() {
        return "No edges found matching the filters.".to_string();
    }

    let mut builder = Builder::default();
    let mut header = vec!["ID", "Source", "Target", "Weight", "Type"];
    if show_attributes {
        header.push("Attributes");
    }
    builder.push_record(header);

    for edge in edges {
        let mut row = vec![
            edge.id.clone().unwrap_or_default(),
            edge.source.clone(),
            edge.target.clone(),
            edge.weight.map(gexf_query_core::format_float).unwrap_or_default(),
            edge.edge_type.clone().unwrap_or_default(),
        ];
        if show_attributes {
            row.push(join_attrs(&edge.attributes));
        }
        builder.push_record(row);
    }
    format!("Edges ({})\n{}", edges.len(), render(builder))
}

pub fn path_text(result: Option<&PathResult>) -> String {
    let Some(result) = result else {
        return "No path found between the nodes.".to_string();
    };

    let mut out = format!(
        "Path from {} to {}\nLength: {} edges\n",
        result.source, result.target, result.length
    );
    if let Some(weight) = result.total_weight {
        out.push_str(&format!("Total Weight: {}\n", gexf_query_core::format_float(weight)));
    }
    out.push_str(&format!("\nPath: {}", result.path.join(" → ")));
    out
}

pub fn paths_text(paths: &[PathResult]) -> String {
    if paths.is_empty() {
        return "No paths found between the nodes.".to_string();
    }

    let mut out = format!("Found {} path(s)\n", paths.len());
    for (i, path) in paths.iter().enumerate() {
        out.push_str(&format!(
            "\nPath {} (length {}):\n  {}",
            i + 1,
            path.length,
            path.path.join(" → ")
        ));
    }
    out
}

pub fn stats_table(stats: &GraphStats) -> String {
    let mut rows = vec![
        ("Node Count", stats.node_count.to_string()),
        ("Edge Count", stats.edge_count.to_string()),
        ("Directed", yes_no(stats.is_directed)),
        ("Density", format!("{:.4}", stats.density)),
        ("Average Degree", format!("{:.2}", stats.avg_degree)),
        ("Avg Clustering Coefficient", format!("{:.4}", stats.avg_clustering)),
        ("Connected", yes_no(stats.is_connected)),
        ("Number of Components", stats.num_components.to_string()),
        ("Has Cycles", yes_no(stats.has_cycles)),
    ];
    if let Some(diameter) = stats.diameter {
        rows.push(("Diameter", diameter.to_string()));
    }
    if let Some(radius) = stats.radius {
        rows.push(("Radius", radius.to_string()));
    }
    if let Some(avg) = stats.avg_path_length {
        rows.push(("Avg Path Length", format!("{:.4}", avg)));
    }

    let mut builder = Builder::default();
    builder.push_record(["Metric", "Value"]);
    for (metric, value) in rows {
        builder.push_record([metric.to_string(), value]);
    }
    format!("Graph Statistics\n{}", render(builder))
}

pub fn centrality_table(result: &CentralityResult, top_n: usize) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Rank", "Node", "Score"]);
    for (rank, (node, score)) in result.top_n(top_n).into_iter().enumerate() {
        builder.push_record([(rank + 1).to_string(), node.to_string(), format!("{:.6}", score)]);
    }

    let kind = result.kind.as_str();
    let mut title = kind[..1].to_uppercase();
    title.push_str(&kind[1..]);
    format!("{} Centrality (Top {})\n{}", title, top_n, render(builder))
}

pub fn components_table(info: &ComponentInfo, show_members: bool) -> String {
    let mut out = format!(
        "Number of Components: {}\nLargest Component Size: {}",
        info.num_components, info.largest_component_size
    );
    if info.num_components == 0 {
        return out;
    }

    let mut builder = Builder::default();
    let mut header = vec!["Component", "Size"];
    if show_members {
        header.push("Members");
    }
    builder.push_record(header);

    for (i, (size, members)) in info.component_sizes.iter().zip(&info.components).enumerate() {
        let mut row = vec![(i + 1).to_string(), size.to_string()];
        if show_members {
            let mut shown = members
                .iter()
                .take(MEMBER_PREVIEW)
                .cloned()
                .collect::<Vec<_>>()
                .join(", ");
            if members.len() > MEMBER_PREVIEW {
                shown.push_str(&format!(", ... (+{} more)", members.len() - MEMBER_PREVIEW));
            }
            row.push(shown);
        }
        builder.push_record(row);
    }

    out.push_str(&format!("\n\nComponents\n{}", render(builder)));
    out
}

pub fn degree_single(info: &DegreeInfo) -> String {
    let mut rows = vec![("Node", info.node.clone())];
    match (info.in_degree, info.out_degree) {
        (Some(in_degree), Some(out_degree)) => {
            rows.push(("In-Degree", in_degree.to_string()));
            rows.push(("Out-Degree", out_degree.to_string()));
            rows.push(("Total Degree", info.total_degree.to_string()));
        }
        _ => rows.push(("Degree", info.total_degree.to_string())),
    }
    key_value("Node Degree", rows)
}

pub fn degree_table(degrees: &[DegreeInfo], top_n: usize) -> String {
    let directed = degrees.first().is_some_and(|d| d.in_degree.is_some());

    let mut builder = Builder::default();
    if directed {
        builder.push_record(["Rank", "Node", "In", "Out", "Total"]);
    } else {
        builder.push_record(["Rank", "Node", "Degree"]);
    }

    for (rank, d) in degrees.iter().take(top_n).enumerate() {
        let mut row = vec![(rank + 1).to_string(), d.node.clone()];
        if directed {
            row.push(d.in_degree.unwrap_or_default().to_string());
            row.push(d.out_degree.unwrap_or_default().to_string());
        }
        row.push(d.total_degree.to_string());
        builder.push_record(row);
    }
    format!("Node Degrees (Top {})\n{}", top_n, render(builder))
}
