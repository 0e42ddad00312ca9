use clap::ValueEnum;
use gexf_query_core::{CentralityKind, ComponentKind, ExportFormat, Reach, TraversalDirection};

/// Neighbour direction for directed graphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DirectionArg {
    /// Predecessors.
    In,
    /// Successors.
    Out,
    /// Both.
    All,
}

impl From<DirectionArg> for TraversalDirection {
    fn from(d: DirectionArg) -> Self {
        match d {
            DirectionArg::In => TraversalDirection::Incoming,
            DirectionArg::Out => TraversalDirection::Outgoing,
            DirectionArg::All => TraversalDirection::Both,
        }
    }
}

impl DirectionArg {
    pub fn as_str(self) -> &'static str {
        match self {
            DirectionArg::In => "in",
            DirectionArg::Out => "out",
            DirectionArg::All => "all",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReachArg {
    /// Descendants.
    Forward,
    /// Ancestors.
    Backward,
    Both,
}

impl From<ReachArg> for Reach {
    fn from(r: ReachArg) -> Self {
        match r {
            ReachArg::Forward => Reach::Forward,
            ReachArg::Backward => Reach::Backward,
            ReachArg::Both => Reach::Both,
        }
    }
}

impl ReachArg {
    pub fn as_str(self) -> &'static str {
        match self {
            ReachArg::Forward => "forward",
            ReachArg::Backward => "backward",
            ReachArg::Both => "both",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ComponentArg {
    Connected,
    Strongly,
    Weakly,
}

impl From<ComponentArg> for ComponentKind {
    fn from(c: ComponentArg) -> Self {
        match c {
            ComponentArg::Connected => ComponentKind::Connected,
            ComponentArg::Strongly => ComponentKind::Strongly,
            ComponentArg::Weakly => ComponentKind::Weakly,
        }
    }
}

/// Clap value parser for `--type` on `centrality`.
pub fn parse_centrality(s: &str) -> Result<CentralityKind, String> {
    s.parse::<CentralityKind>().map_err(|e| e.to_string())
}

/// Clap value parser for `--format` on `export`.
pub fn parse_format(s: &str) -> Result<ExportFormat, String> {
    s.parse::<ExportFormat>().map_err(|e| e.to_string())
}

/// Parse a `key=value` attribute filter. Both sides are trimmed; the value
/// may itself contain `=`.
pub fn parse_attr_filter(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) => Ok((key.trim().to_string(), value.trim().to_string())),
        None => Err(format!("Invalid format '{}'. Expected key=value format.", s)),
    }
}

/// Split a comma-separated id list, dropping empty entries.
pub fn split_ids(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

/// A depth flag of 0 means "no limit".
pub fn depth_limit<T: Default + PartialEq>(value: Option<T>) -> Option<T> {
    value.filter(|v| *v != T::default())
}
