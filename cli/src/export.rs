//! Graph writers for every `ExportFormat`.

use std::collections::{BTreeMap, HashSet};
use std::io::Write;

use gexf_query_core::{format_float, AttrValue, Attributes, ExportFormat, GraphModel};
use serde::Serialize;

use crate::xml::escape_xml;

/// Write `graph` to `writer` in `format`.
pub fn write_graph<W: Write>(graph: &GraphModel, format: ExportFormat, writer: &mut W) -> anyhow::Result<()> {
    match format {
        ExportFormat::Json => write_node_link(graph, writer)?,
        ExportFormat::GraphMl => write_graphml(graph, writer)?,
        ExportFormat::AdjList => write_adjlist(graph, writer)?,
        ExportFormat::EdgeList => write_edgelist(graph, writer)?,
        ExportFormat::Gexf => write_gexf(graph, writer)?,
    }
    Ok(())
}

/// Render `graph` in `format` to a string.
pub fn export_string(graph: &GraphModel, format: ExportFormat) -> anyhow::Result<String> {
    let mut buf = Vec::new();
    write_graph(graph, format, &mut buf)?;
    Ok(String::from_utf8(buf)?)
}

// ---------------------------------------------------------------------------
// Node-link JSON
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct NodeLink<'a> {
    directed: bool,
    multigraph: bool,
    graph: GraphAttrs<'a>,
    nodes: Vec<LinkNode<'a>>,
    links: Vec<Link<'a>>,
}

#[derive(Serialize)]
struct GraphAttrs<'a> {
    mode: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    creator: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

#[derive(Serialize)]
struct LinkNode<'a> {
    id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<&'a str>,
    #[serde(flatten)]
    attributes: &'a Attributes,
}

#[derive(Serialize)]
struct Link<'a> {
    source: &'a str,
    target: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    weight: Option<f64>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    edge_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<&'a str>,
    #[serde(flatten)]
    attributes: &'a Attributes,
}

fn write_node_link<W: Write>(graph: &GraphModel, writer: &mut W) -> anyhow::Result<()> {
    let meta = graph.metadata();
    let doc = NodeLink {
        directed: graph.is_directed(),
        multigraph: has_parallel_edges(graph),
        graph: GraphAttrs {
            mode: &meta.mode,
            creator: meta.creator.as_deref(),
            description: meta.description.as_deref(),
        },
        nodes: graph
            .nodes()
            .iter()
            .map(|n| LinkNode {
                id: &n.id,
                label: n.label.as_deref(),
                attributes: &n.attributes,
            })
            .collect(),
        links: graph
            .edges()
            .iter()
            .map(|e| Link {
                source: &e.source,
                target: &e.target,
                id: e.id.as_deref(),
                weight: e.weight,
                edge_type: e.edge_type.as_deref(),
                label: e.label.as_deref(),
                attributes: &e.attributes,
            })
            .collect(),
    };
    serde_json::to_writer_pretty(&mut *writer, &doc)?;
    writeln!(writer)?;
    Ok(())
}

/// Whether two edges join the same endpoints (either orientation when undirected).
fn has_parallel_edges(graph: &GraphModel) -> bool {
    let mut seen: HashSet<(&str, &str)> = HashSet::with_capacity(graph.edge_count());
    graph.edges().iter().any(|e| {
        let (a, b) = (e.source.as_str(), e.target.as_str());
        let key = if !graph.is_directed() && b < a { (b, a) } else { (a, b) };
        !seen.insert(key)
    })
}

// ---------------------------------------------------------------------------
// Attribute columns shared by the XML writers
// ---------------------------------------------------------------------------

/// One attribute column: name and the type common to all its values.
struct Column {
    name: String,
    kind: &'static str,
}

/// Columns over `maps`, sorted by name. A key whose values disagree in type
/// is declared as a string.
fn columns<'a>(maps: impl Iterator<Item = &'a Attributes>) -> Vec<Column> {
    let mut kinds: BTreeMap<&'a str, &'static str> = BTreeMap::new();
    for attrs in maps {
        for (key, value) in attrs {
            kinds
                .entry(key.as_str())
                .and_modify(|kind| {
                    if *kind != value.type_name() {
                        *kind = "string";
                    }
                })
                .or_insert(value.type_name());
        }
    }
    kinds
        .into_iter()
        .map(|(name, kind)| Column {
            name: name.to_string(),
            kind,
        })
        .collect()
}

fn xml_value(value: &AttrValue) -> String {
    escape_xml(&value.xml_lexical())
}

// ---------------------------------------------------------------------------
// GraphML
// ---------------------------------------------------------------------------

fn write_graphml<W: Write>(graph: &GraphModel, writer: &mut W) -> std::io::Result<()> {
    writeln!(writer, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        writer,
        r#"<graphml xmlns="http://graphml.graphdrawing.org/xmlns" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="http://graphml.graphdrawing.org/xmlns http://graphml.graphdrawing.org/xmlns/1.0/graphml.xsd">"#
    )?;

    let has_label = graph.nodes().iter().any(|n| n.label.is_some());
    let node_cols = columns(graph.nodes().iter().map(|n| &n.attributes));
    let edge_cols = columns(graph.edges().iter().map(|e| &e.attributes));
    let edges = graph.edges();
    let edge_has = |field: &str| -> bool {
        match field {
            "id" => edges.iter().any(|e| e.id.is_some()),
            "weight" => edges.iter().any(|e| e.weight.is_some()),
            "type" => edges.iter().any(|e| e.edge_type.is_some()),
            _ => edges.iter().any(|e| e.label.is_some()),
        }
    };

    // Key ids: node columns first, then edge columns.
    let mut next_key = 0usize;
    let mut key = |writer: &mut W, domain: &str, name: &str, kind: &str| -> std::io::Result<String> {
        let id = format!("d{}", next_key);
        next_key += 1;
        writeln!(
            writer,
            r#"  <key id="{}" for="{}" attr.name="{}" attr.type="{}"/>"#,
            id,
            domain,
            escape_xml(name),
            kind
        )?;
        Ok(id)
    };

    let label_key = if has_label {
        Some(key(writer, "node", "label", "string")?)
    } else {
        None
    };
    let mut node_keys: BTreeMap<&str, String> = BTreeMap::new();
    for col in &node_cols {
        node_keys.insert(&col.name, key(writer, "node", &col.name, col.kind)?);
    }

    let mut promoted_keys: BTreeMap<&str, String> = BTreeMap::new();
    for (field, kind) in [("id", "string"), ("weight", "double"), ("type", "string"), ("label", "string")] {
        if edge_has(field) {
            promoted_keys.insert(field, key(writer, "edge", field, kind)?);
        }
    }
    let mut edge_keys: BTreeMap<&str, String> = BTreeMap::new();
    for col in &edge_cols {
        edge_keys.insert(&col.name, key(writer, "edge", &col.name, col.kind)?);
    }

    let edgedefault = if graph.is_directed() { "directed" } else { "undirected" };
    writeln!(writer, r#"  <graph edgedefault="{}">"#, edgedefault)?;

    for node in graph.nodes() {
        writeln!(writer, r#"    <node id="{}">"#, escape_xml(&node.id))?;
        if let (Some(k), Some(label)) = (&label_key, &node.label) {
            writeln!(writer, r#"      <data key="{}">{}</data>"#, k, escape_xml(label))?;
        }
        for (name, value) in &node.attributes {
            if let Some(k) = node_keys.get(name.as_str()) {
                writeln!(writer, r#"      <data key="{}">{}</data>"#, k, xml_value(value))?;
            }
        }
        writeln!(writer, "    </node>")?;
    }

    for edge in edges {
        writeln!(
            writer,
            r#"    <edge source="{}" target="{}">"#,
            escape_xml(&edge.source),
            escape_xml(&edge.target)
        )?;
        let promoted = [
            ("id", edge.id.clone()),
            ("weight", edge.weight.map(format_float)),
            ("type", edge.edge_type.clone()),
            ("label", edge.label.clone()),
        ];
        for (field, value) in promoted {
            if let (Some(k), Some(value)) = (promoted_keys.get(field), value) {
                writeln!(writer, r#"      <data key="{}">{}</data>"#, k, escape_xml(&value))?;
            }
        }
        for (name, value) in &edge.attributes {
            if let Some(k) = edge_keys.get(name.as_str()) {
                writeln!(writer, r#"      <data key="{}">{}</data>"#, k, xml_value(value))?;
            }
        }
        writeln!(writer, "    </edge>")?;
    }

    writeln!(writer, "  </graph>")?;
    writeln!(writer, "</graphml>")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Plain text
// ---------------------------------------------------------------------------

/// `node succ succ ...` per node in insertion order; successors are listed
/// once each. Undirected graphs list every neighbour.
fn write_adjlist<W: Write>(graph: &GraphModel, writer: &mut W) -> std::io::Result<()> {
    for node in graph.nodes() {
        write!(writer, "{}", node.id)?;
        let mut seen = HashSet::new();
        for next in graph.neighbors_out(&node.id) {
            if seen.insert(next) {
                write!(writer, " {}", next)?;
            }
        }
        writeln!(writer)?;
    }
    Ok(())
}

/// `source target [weight]` per edge; zero and missing weights are omitted.
fn write_edgelist<W: Write>(graph: &GraphModel, writer: &mut W) -> std::io::Result<()> {
    for edge in graph.edges() {
        match edge.weight {
            Some(w) if w != 0.0 => writeln!(writer, "{} {} {}", edge.source, edge.target, format_float(w))?,
            _ => writeln!(writer, "{} {}", edge.source, edge.target)?,
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// GEXF
// ---------------------------------------------------------------------------

fn write_attvalues<W: Write>(
    writer: &mut W,
    indent: &str,
    attributes: &Attributes,
    ids: &BTreeMap<&str, usize>,
) -> std::io::Result<()> {
    writeln!(writer, "{}<attvalues>", indent)?;
    for (name, value) in attributes {
        if let Some(id) = ids.get(name.as_str()) {
            writeln!(
                writer,
                r#"{}  <attvalue for="{}" value="{}"/>"#,
                indent,
                id,
                xml_value(value)
            )?;
        }
    }
    writeln!(writer, "{}</attvalues>", indent)
}

fn write_attribute_block<W: Write>(
    writer: &mut W,
    class: &str,
    cols: &[Column],
) -> std::io::Result<()> {
    if cols.is_empty() {
        return Ok(());
    }
    writeln!(writer, r#"    <attributes class="{}">"#, class)?;
    for (id, col) in cols.iter().enumerate() {
        writeln!(
            writer,
            r#"      <attribute id="{}" title="{}" type="{}"/>"#,
            id,
            escape_xml(&col.name),
            col.kind
        )?;
    }
    writeln!(writer, "    </attributes>")
}

fn write_gexf<W: Write>(graph: &GraphModel, writer: &mut W) -> std::io::Result<()> {
    let meta = graph.metadata();
    writeln!(writer, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(writer, r#"<gexf xmlns="http://gexf.net/1.3" version="1.3">"#)?;

    match &meta.last_modified {
        Some(date) => writeln!(writer, r#"  <meta lastmodifieddate="{}">"#, escape_xml(date))?,
        None => writeln!(writer, "  <meta>")?,
    }
    if let Some(creator) = &meta.creator {
        writeln!(writer, "    <creator>{}</creator>", escape_xml(creator))?;
    }
    if let Some(description) = &meta.description {
        writeln!(writer, "    <description>{}</description>", escape_xml(description))?;
    }
    writeln!(writer, "  </meta>")?;

    let edge_type = if graph.is_directed() { "directed" } else { "undirected" };
    writeln!(
        writer,
        r#"  <graph mode="{}" defaultedgetype="{}">"#,
        escape_xml(&meta.mode),
        edge_type
    )?;

    let node_cols = columns(graph.nodes().iter().map(|n| &n.attributes));
    let edge_cols = columns(graph.edges().iter().map(|e| &e.attributes));
    write_attribute_block(writer, "node", &node_cols)?;
    write_attribute_block(writer, "edge", &edge_cols)?;
    let node_ids: BTreeMap<&str, usize> = node_cols.iter().enumerate().map(|(i, c)| (c.name.as_str(), i)).collect();
    let edge_ids: BTreeMap<&str, usize> = edge_cols.iter().enumerate().map(|(i, c)| (c.name.as_str(), i)).collect();

    writeln!(writer, "    <nodes>")?;
    for node in graph.nodes() {
        write!(writer, r#"      <node id="{}""#, escape_xml(&node.id))?;
        if let Some(label) = &node.label {
            write!(writer, r#" label="{}""#, escape_xml(label))?;
        }
        if node.attributes.is_empty() {
            writeln!(writer, "/>")?;
        } else {
            writeln!(writer, ">")?;
            write_attvalues(writer, "        ", &node.attributes, &node_ids)?;
            writeln!(writer, "      </node>")?;
        }
    }
    writeln!(writer, "    </nodes>")?;

    writeln!(writer, "    <edges>")?;
    for (ix, edge) in graph.edges().iter().enumerate() {
        let id = edge.id.clone().unwrap_or_else(|| ix.to_string());
        write!(
            writer,
            r#"      <edge id="{}" source="{}" target="{}""#,
            escape_xml(&id),
            escape_xml(&edge.source),
            escape_xml(&edge.target)
        )?;
        if let Some(w) = edge.weight {
            write!(writer, r#" weight="{}""#, format_float(w))?;
        }
        if let Some(kind) = &edge.edge_type {
            write!(writer, r#" type="{}""#, escape_xml(kind))?;
        }
        if let Some(label) = &edge.label {
            write!(writer, r#" label="{}""#, escape_xml(label))?;
        }
        if edge.attributes.is_empty() {
            writeln!(writer, "/>")?;
        } else {
            writeln!(writer, ">")?;
            write_attvalues(writer, "        ", &edge.attributes, &edge_ids)?;
            writeln!(writer, "      </edge>")?;
        }
    }
    writeln!(writer, "    </edges>")?;

    writeln!(writer, "  </graph>")?;
    writeln!(writer, "</gexf>")?;
    Ok(())
}
