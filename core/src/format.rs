use std::fmt;
use std::str::FromStr;

use crate::error::GraphError;

/// Serialisation targets a loaded graph can be written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    /// Node-link JSON.
    Json,
    GraphMl,
    /// One line per node: the node followed by its successors.
    AdjList,
    /// One line per edge: `source target [weight]`.
    EdgeList,
    Gexf,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 5] = [
        ExportFormat::Json,
        ExportFormat::GraphMl,
        ExportFormat::AdjList,
        ExportFormat::EdgeList,
        ExportFormat::Gexf,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::GraphMl => "graphml",
            ExportFormat::AdjList => "adjlist",
            ExportFormat::EdgeList => "edgelist",
            ExportFormat::Gexf => "gexf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExportFormat::ALL
            .into_iter()
            .find(|format| format.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| GraphError::UnknownFormat(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_formats() {
        for format in ExportFormat::ALL {
            assert_eq!(format.as_str().parse::<ExportFormat>().unwrap(), format);
        }
        assert_eq!("GraphML".parse::<ExportFormat>().unwrap(), ExportFormat::GraphMl);
    }

    #[test]
    fn test_unknown_format() {
        let err = "dot".parse::<ExportFormat>().unwrap_err();
        assert_eq!(err, GraphError::UnknownFormat("dot".into()));
    }
}
