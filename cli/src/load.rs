//! GEXF reader: builds a `GraphModel` from a GEXF 1.x document.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use gexf_query_core::{
    parse_weight, AttrValue, EdgeRecord, GraphError, GraphMetadata, GraphModel, NodeRecord,
    RESERVED_NODE_FIELDS,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::xml::{Event, XmlReader};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Not a file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Read and parse the GEXF file at `path`.
pub fn load_file(path: &Path) -> Result<GraphModel, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(LoadError::NotAFile(path.to_path_buf()));
    }

    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let source_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());
    let graph = parse_gexf(&text, source_name)?;

    info!(
        path = %path.display(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        directed = graph.is_directed(),
        "graph loaded"
    );
    Ok(graph)
}

/// Declared attribute column from an `<attributes>` block.
#[derive(Debug, Clone)]
struct AttrDecl {
    title: String,
    kind: String,
    default: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Node,
    Edge,
}

/// What the next text run belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capture {
    Creator,
    Description,
    Default,
}

#[derive(Default)]
struct DocumentBuilder {
    metadata: GraphMetadata,
    saw_graph: bool,
    node_decls: HashMap<String, AttrDecl>,
    edge_decls: HashMap<String, AttrDecl>,
    /// Declaration order per class, for applying defaults deterministically.
    node_order: Vec<String>,
    edge_order: Vec<String>,
    current_class: Option<Class>,
    current_decl: Option<(Class, String)>,
    capture: Option<(Capture, String)>,
    /// Open `<node>` elements; GEXF hierarchies nest them.
    open_nodes: Vec<NodeRecord>,
    open_edge: Option<EdgeRecord>,
    nodes: Vec<NodeRecord>,
    edges: Vec<EdgeRecord>,
}

/// Parse GEXF text. `source_name` is remembered in the metadata for
/// describing derived graphs.
pub fn parse_gexf(text: &str, source_name: Option<String>) -> gexf_query_core::Result<GraphModel> {
    let mut reader = XmlReader::new(text);
    let mut builder = DocumentBuilder::default();
    let mut stack: Vec<String> = Vec::new();

    while let Some(event) = reader.next_event()? {
        match event {
            Event::Start { name, attrs, empty } => {
                if stack.is_empty() && name != "gexf" {
                    return Err(GraphError::MalformedInput(format!(
                        "root element is <{}>, expected <gexf>",
                        name
                    )));
                }
                builder.open(&name, &attrs, &stack)?;
                if empty {
                    builder.close(&name)?;
                } else {
                    stack.push(name);
                }
            }
            Event::End { name } => {
                match stack.pop() {
                    Some(open) if open == name => {}
                    Some(open) => {
                        return Err(GraphError::MalformedInput(format!(
                            "</{}> closes <{}>",
                            name, open
                        )))
                    }
                    None => {
                        return Err(GraphError::MalformedInput(format!(
                            "unexpected </{}>",
                            name
                        )))
                    }
                }
                builder.close(&name)?;
            }
            Event::Text(text) => {
                if let Some((_, buf)) = builder.capture.as_mut() {
                    buf.push_str(&text);
                }
            }
        }
    }

    if let Some(open) = stack.last() {
        return Err(GraphError::MalformedInput(format!(
            "document ends inside <{}>",
            open
        )));
    }
    if !builder.saw_graph {
        return Err(GraphError::MalformedInput("missing <graph> element".into()));
    }

    builder.metadata.source_name = source_name;
    builder.finish()
}

impl DocumentBuilder {
    fn open(&mut self, name: &str, attrs: &[(String, String)], stack: &[String]) -> gexf_query_core::Result<()> {
        let parent = stack.last().map(String::as_str);
        match name {
            "gexf" => {
                self.metadata.version = Event::attr(attrs, "version").map(str::to_string);
            }
            "meta" => {
                self.metadata.last_modified =
                    Event::attr(attrs, "lastmodifieddate").map(str::to_string);
            }
            "creator" if parent == Some("meta") => {
                self.capture = Some((Capture::Creator, String::new()));
            }
            "description" if parent == Some("meta") => {
                self.capture = Some((Capture::Description, String::new()));
            }
            "graph" => {
                self.saw_graph = true;
                if let Some(mode) = Event::attr(attrs, "mode") {
                    self.metadata.mode = mode.to_string();
                }
                if let Some(kind) = Event::attr(attrs, "defaultedgetype") {
                    self.metadata.default_edge_type = kind.to_string();
                }
            }
            "attributes" => {
                self.current_class = Some(match Event::attr(attrs, "class") {
                    Some("edge") => Class::Edge,
                    _ => Class::Node,
                });
            }
            "attribute" => {
                let class = self.current_class.unwrap_or(Class::Node);
                let id = Event::attr(attrs, "id")
                    .ok_or_else(|| GraphError::MalformedInput("<attribute> without id".into()))?
                    .to_string();
                let decl = AttrDecl {
                    title: Event::attr(attrs, "title").unwrap_or(id.as_str()).to_string(),
                    kind: Event::attr(attrs, "type").unwrap_or("string").to_lowercase(),
                    default: None,
                };
                let (decls, order) = self.decls_mut(class);
                if decls.insert(id.clone(), decl).is_none() {
                    order.push(id.clone());
                }
                self.current_decl = Some((class, id));
            }
            "default" if parent == Some("attribute") => {
                self.capture = Some((Capture::Default, String::new()));
            }
            "node" => {
                let id = Event::attr(attrs, "id")
                    .ok_or_else(|| GraphError::MalformedInput("<node> without id".into()))?;
                let mut node = NodeRecord::new(id);
                node.label = Event::attr(attrs, "label").map(str::to_string);
                self.open_nodes.push(node);
            }
            "edge" => {
                let edge = self.start_edge(attrs)?;
                self.open_edge = Some(edge);
            }
            "attvalue" => self.attvalue(attrs, stack)?,
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, name: &str) -> gexf_query_core::Result<()> {
        match name {
            "creator" | "description" | "default" => {
                if let Some((capture, text)) = self.capture.take() {
                    let text = text.trim().to_string();
                    match capture {
                        Capture::Creator => self.metadata.creator = Some(text),
                        Capture::Description => self.metadata.description = Some(text),
                        Capture::Default => {
                            if let Some((class, id)) = self.current_decl.clone() {
                                if let Some(decl) = self.decls_mut(class).0.get_mut(&id) {
                                    decl.default = Some(text);
                                }
                            }
                        }
                    }
                }
            }
            "attributes" => self.current_class = None,
            "attribute" => self.current_decl = None,
            "node" => {
                if let Some(node) = self.open_nodes.pop() {
                    self.nodes.push(node);
                }
            }
            "edge" => {
                if let Some(edge) = self.open_edge.take() {
                    self.edges.push(edge);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn decls_mut(&mut self, class: Class) -> (&mut HashMap<String, AttrDecl>, &mut Vec<String>) {
        match class {
            Class::Node => (&mut self.node_decls, &mut self.node_order),
            Class::Edge => (&mut self.edge_decls, &mut self.edge_order),
        }
    }

    fn start_edge(&self, attrs: &[(String, String)]) -> gexf_query_core::Result<EdgeRecord> {
        let source = Event::attr(attrs, "source")
            .ok_or_else(|| GraphError::MalformedInput("<edge> without source".into()))?;
        let target = Event::attr(attrs, "target")
            .ok_or_else(|| GraphError::MalformedInput("<edge> without target".into()))?;

        let mut edge = EdgeRecord::new(source, target);
        edge.id = Event::attr(attrs, "id").map(str::to_string);
        edge.label = Event::attr(attrs, "label").map(str::to_string);
        if let Some(weight) = Event::attr(attrs, "weight") {
            edge.weight = Some(parse_weight(weight)?);
        }

        if let Some(kind) = Event::attr(attrs, "type") {
            check_edge_kind(self.directed(), kind)?;
            edge.edge_type = Some(kind.to_string());
        }
        Ok(edge)
    }

    fn directed(&self) -> bool {
        self.metadata.default_edge_type == "directed"
    }

    fn attvalue(&mut self, attrs: &[(String, String)], stack: &[String]) -> gexf_query_core::Result<()> {
        let owner = stack
            .iter()
            .rev()
            .find_map(|name| match name.as_str() {
                "node" => Some(Class::Node),
                "edge" => Some(Class::Edge),
                _ => None,
            });
        let Some(owner) = owner else {
            return Ok(());
        };

        // GEXF 1.0 keyed values by `id`; later versions use `for`.
        let key = Event::attr(attrs, "for")
            .or_else(|| Event::attr(attrs, "id"))
            .ok_or_else(|| GraphError::MalformedInput("<attvalue> without 'for'".into()))?;
        let raw = Event::attr(attrs, "value").unwrap_or("");

        let decls = match owner {
            Class::Node => &self.node_decls,
            Class::Edge => &self.edge_decls,
        };
        let (title, value) = match decls.get(key) {
            Some(decl) => (decl.title.clone(), typed_value(&decl.kind, raw)),
            None => (key.to_string(), AttrValue::Str(raw.to_string())),
        };

        let directed = self.directed();
        match owner {
            Class::Node => {
                if let Some(node) = self.open_nodes.last_mut() {
                    assign_node(node, title, value);
                }
            }
            Class::Edge => {
                if let Some(edge) = self.open_edge.as_mut() {
                    assign_edge(edge, title, value, directed)?;
                }
            }
        }
        Ok(())
    }

    fn finish(mut self) -> gexf_query_core::Result<GraphModel> {
        let directed = self.directed();

        let node_defaults = declared_defaults(&self.node_decls, &self.node_order);
        for node in &mut self.nodes {
            for (title, value) in &node_defaults {
                if !node.attributes.contains_key(*title) {
                    assign_node(node, title.to_string(), value.clone());
                }
            }
        }
        let edge_defaults = declared_defaults(&self.edge_decls, &self.edge_order);
        for edge in &mut self.edges {
            for (title, value) in &edge_defaults {
                if !edge.attributes.contains_key(*title) {
                    assign_edge(edge, title.to_string(), value.clone(), directed)?;
                }
            }
        }

        debug!(
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            node_columns = self.node_order.len(),
            edge_columns = self.edge_order.len(),
            "gexf document parsed"
        );
        GraphModel::with_metadata(directed, self.nodes, self.edges, self.metadata)
    }
}

/// Declared defaults in declaration order, typed per their column.
fn declared_defaults<'a>(decls: &'a HashMap<String, AttrDecl>, order: &[String]) -> Vec<(&'a str, AttrValue)> {
    order
        .iter()
        .filter_map(|id| decls.get(id))
        .filter_map(|decl| {
            decl.default
                .as_deref()
                .map(|raw| (decl.title.as_str(), typed_value(&decl.kind, raw)))
        })
        .collect()
}

/// Store a node value. Columns titled `id` or `label` are dropped: both come
/// from the `<node>` element itself.
fn assign_node(node: &mut NodeRecord, title: String, value: AttrValue) {
    if RESERVED_NODE_FIELDS.contains(&title.as_str()) {
        return;
    }
    node.attributes.insert(title, value);
}

/// Store an edge value. Columns titled `id`, `weight`, `type` or `label`
/// fill the promoted field unless the `<edge>` element already set it.
fn assign_edge(edge: &mut EdgeRecord, title: String, value: AttrValue, directed: bool) -> gexf_query_core::Result<()> {
    match title.as_str() {
        "id" => {
            edge.id.get_or_insert_with(|| value.canonical());
        }
        "label" => {
            edge.label.get_or_insert_with(|| value.canonical());
        }
        "type" => {
            if edge.edge_type.is_none() {
                let kind = value.canonical();
                check_edge_kind(directed, &kind)?;
                edge.edge_type = Some(kind);
            }
        }
        "weight" => {
            if edge.weight.is_none() {
                edge.weight = Some(match value {
                    AttrValue::Float(f) => f,
                    AttrValue::Int(i) => i as f64,
                    other => parse_weight(&other.canonical())?,
                });
            }
        }
        _ => {
            edge.attributes.insert(title, value);
        }
    }
    Ok(())
}

fn check_edge_kind(directed: bool, kind: &str) -> gexf_query_core::Result<()> {
    if directed && kind == "undirected" {
        return Err(GraphError::MalformedInput(
            "undirected edge found in directed graph".into(),
        ));
    }
    if !directed && kind == "directed" {
        return Err(GraphError::MalformedInput(
            "directed edge found in undirected graph".into(),
        ));
    }
    Ok(())
}

/// Convert raw attribute text per its declared type. Text that does not
/// parse as the declared type is kept as a string.
fn typed_value(kind: &str, raw: &str) -> AttrValue {
    let trimmed = raw.trim();
    match kind {
        "integer" | "long" | "int" | "short" | "byte" => trimmed
            .parse::<i64>()
            .map(AttrValue::Int)
            .unwrap_or_else(|_| AttrValue::Str(raw.to_string())),
        "float" | "double" => trimmed
            .parse::<f64>()
            .map(AttrValue::Float)
            .unwrap_or_else(|_| AttrValue::Str(raw.to_string())),
        "boolean" => match trimmed {
            "true" | "True" | "1" => AttrValue::Bool(true),
            "false" | "False" | "0" => AttrValue::Bool(false),
            _ => AttrValue::Str(raw.to_string()),
        },
        _ => AttrValue::Str(raw.to_string()),
    }
}
