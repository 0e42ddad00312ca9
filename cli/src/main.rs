//! gfx - query and analyse GEXF graph files from the command line.
//!
//! Every command loads one file, runs a single engine operation over it and
//! prints either a table or JSON on stdout. Diagnostics go to stderr.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use gexf_query_core::{CentralityKind, EdgeFilter, ExportFormat, GraphModel, NodeFilter};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod analysis;
mod export;
mod load;
mod neighborhood;
mod output;
mod path;
mod settings;
mod status;
mod subgraph;
mod util;
mod xml;

use settings::AnalysisSettings;
use util::{depth_limit, parse_attr_filter, parse_centrality, parse_format, split_ids, ComponentArg, DirectionArg, ReachArg};

/// Query and analyse GEXF graph files.
#[derive(Parser)]
#[command(name = "gfx")]
#[command(author, version)]
#[command(propagate_version = true)]
#[command(after_help = "Examples:
  gfx info network.gexf
  gfx nodes network.gexf --attr type=server
  gfx path network.gexf lb1 db1 --weighted
  gfx centrality network.gexf --type pagerank --top 5")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all logging except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Print results as JSON instead of tables
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show document metadata (creator, description, dates, counts)
    Meta {
        file: PathBuf,
    },

    /// Summarise the graph and its attribute keys
    Info {
        file: PathBuf,
    },

    /// List nodes, optionally filtered
    Nodes {
        file: PathBuf,

        /// Attribute filter as key=value (repeatable, AND-combined)
        #[arg(long = "attr", value_parser = parse_attr_filter)]
        attrs: Vec<(String, String)>,

        /// Label pattern with * ? [...] wildcards
        #[arg(long)]
        label: Option<String>,

        /// Hide the attributes column
        #[arg(long)]
        no_attrs: bool,
    },

    /// List edges, optionally filtered
    Edges {
        file: PathBuf,

        /// Attribute filter as key=value (repeatable, AND-combined)
        #[arg(long = "attr", value_parser = parse_attr_filter)]
        attrs: Vec<(String, String)>,

        /// Only edges leaving this node
        #[arg(long)]
        source: Option<String>,

        /// Only edges entering this node
        #[arg(long)]
        target: Option<String>,

        /// Only edges of this type
        #[arg(long = "type")]
        edge_type: Option<String>,

        /// Hide the attributes column
        #[arg(long)]
        no_attrs: bool,
    },

    /// Nodes within a number of hops of a node
    Neighbors {
        file: PathBuf,
        node_id: String,

        #[arg(long, value_enum, default_value = "all")]
        direction: DirectionArg,

        #[arg(long, default_value_t = 1)]
        depth: u32,
    },

    /// Shortest path between two nodes
    Path {
        file: PathBuf,
        source: String,
        target: String,

        /// Use edge weights as costs
        #[arg(long)]
        weighted: bool,
    },

    /// Every simple path between two nodes
    AllPaths {
        file: PathBuf,
        source: String,
        target: String,

        /// Maximum edges per path (0 = unlimited)
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// Whether any path leads from one node to another
    HasPath {
        file: PathBuf,
        source: String,
        target: String,
    },

    /// Every node reachable from a node
    Reachable {
        file: PathBuf,
        node_id: String,

        #[arg(long, value_enum, default_value = "forward")]
        direction: ReachArg,

        /// Maximum hops (0 = unlimited)
        #[arg(long)]
        max_depth: Option<u32>,
    },

    /// Nodes adjacent to both of two nodes
    CommonNeighbors {
        file: PathBuf,
        node1: String,
        node2: String,
    },

    /// Whole-graph statistics
    Stats {
        file: PathBuf,
    },

    /// Rank nodes by a centrality measure
    Centrality {
        file: PathBuf,

        /// degree, betweenness, closeness, pagerank or eigenvector
        #[arg(long = "type", value_parser = parse_centrality, default_value = "degree")]
        kind: CentralityKind,

        /// Number of top nodes to display
        #[arg(long, default_value_t = 10)]
        top: usize,

        #[command(flatten)]
        settings: AnalysisSettings,
    },

    /// Connected component analysis
    Components {
        file: PathBuf,

        #[arg(long = "type", value_enum, default_value = "connected")]
        kind: ComponentArg,

        /// List the members of each component
        #[arg(long)]
        list: bool,
    },

    /// Node degree information
    Degree {
        file: PathBuf,

        /// Show a single node
        #[arg(long)]
        node: Option<String>,

        /// Number of top nodes to display
        #[arg(long, default_value_t = 10)]
        top: usize,
    },

    /// Extract the neighbourhood graph around a node
    Ego {
        file: PathBuf,
        node_id: String,

        #[arg(long, default_value_t = 1)]
        radius: u32,

        /// Save the extracted graph as GEXF
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Extract the subgraph induced by a set of nodes
    Subgraph {
        file: PathBuf,

        /// Comma-separated node ids
        #[arg(long, required = true)]
        nodes: String,

        /// Save the extracted graph as GEXF
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Convert the graph to another format
    Export {
        file: PathBuf,

        /// json, graphml, adjlist, edgelist or gexf
        #[arg(short, long, value_parser = parse_format, default_value = "json")]
        format: ExportFormat,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Commands {
    fn file(&self) -> &Path {
        match self {
            Commands::Meta { file }
            | Commands::Info { file }
            | Commands::Nodes { file, .. }
            | Commands::Edges { file, .. }
            | Commands::Neighbors { file, .. }
            | Commands::Path { file, .. }
            | Commands::AllPaths { file, .. }
            | Commands::HasPath { file, .. }
            | Commands::Reachable { file, .. }
            | Commands::CommonNeighbors { file, .. }
            | Commands::Stats { file }
            | Commands::Centrality { file, .. }
            | Commands::Components { file, .. }
            | Commands::Degree { file, .. }
            | Commands::Ego { file, .. }
            | Commands::Subgraph { file, .. }
            | Commands::Export { file, .. } => file.as_path(),
        }
    }
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}

fn dispatch(graph: &GraphModel, command: Commands, json: bool) -> anyhow::Result<String> {
    match command {
        Commands::Meta { .. } => status::meta(graph, json),
        Commands::Info { .. } => status::info(graph, json),
        Commands::Nodes { attrs, label, no_attrs, .. } => {
            let filter = NodeFilter { label_pattern: label, attrs };
            status::nodes(graph, &filter, !no_attrs, json)
        }
        Commands::Edges { attrs, source, target, edge_type, no_attrs, .. } => {
            let filter = EdgeFilter { attrs, source, target, edge_type };
            status::edges(graph, &filter, !no_attrs, json)
        }
        Commands::Neighbors { node_id, direction, depth, .. } => {
            neighborhood::neighbors(graph, &node_id, direction, depth, json)
        }
        Commands::Path { source, target, weighted, .. } => {
            path::shortest(graph, &source, &target, weighted, json)
        }
        Commands::AllPaths { source, target, max_depth, .. } => {
            path::all(graph, &source, &target, depth_limit(max_depth), json)
        }
        Commands::HasPath { source, target, .. } => path::exists(graph, &source, &target, json),
        Commands::Reachable { node_id, direction, max_depth, .. } => {
            neighborhood::reachable(graph, &node_id, direction, depth_limit(max_depth), json)
        }
        Commands::CommonNeighbors { node1, node2, .. } => {
            neighborhood::common_neighbors(graph, &node1, &node2, json)
        }
        Commands::Stats { .. } => analysis::stats(graph, json),
        Commands::Centrality { kind, top, settings, .. } => {
            let options = settings.options()?;
            analysis::centrality(graph, kind, &options, top, json)
        }
        Commands::Components { kind, list, .. } => analysis::components(graph, kind, list, json),
        Commands::Degree { node, top, .. } => analysis::degree(graph, node.as_deref(), top, json),
        Commands::Ego { node_id, radius, output, .. } => {
            subgraph::ego(graph, &node_id, radius, output.as_deref(), json)
        }
        Commands::Subgraph { nodes, output, .. } => {
            subgraph::subgraph(graph, &split_ids(&nodes), output.as_deref(), json)
        }
        Commands::Export { format, output, .. } => subgraph::export(graph, format, output.as_deref()),
    }
}

fn run(cli: Cli) -> anyhow::Result<String> {
    let graph = load::load_file(cli.command.file())?;
    dispatch(&graph, cli.command, cli.json)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    match run(cli) {
        Ok(text) => {
            if text.ends_with('\n') {
                print!("{}", text);
            } else {
                println!("{}", text);
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::parse_from(["gfx", "neighbors", "g.gexf", "lb1"]);
        match cli.command {
            Commands::Neighbors { direction, depth, .. } => {
                assert_eq!(direction, DirectionArg::All);
                assert_eq!(depth, 1);
            }
            _ => panic!("wrong subcommand"),
        }
        assert!(!cli.json);
    }

    #[test]
    fn test_parse_repeated_attr_filters_and_global_json() {
        let cli = Cli::parse_from([
            "gfx", "nodes", "g.gexf", "--attr", "type=server", "--attr", "cores=8", "--json",
        ]);
        assert!(cli.json);
        match cli.command {
            Commands::Nodes { attrs, .. } => assert_eq!(attrs.len(), 2),
            _ => panic!("wrong subcommand"),
        }
    }

    #[test]
    fn test_parse_rejects_bad_selectors() {
        assert!(Cli::try_parse_from(["gfx", "centrality", "g.gexf", "--type", "katz"]).is_err());
        assert!(Cli::try_parse_from(["gfx", "export", "g.gexf", "--format", "dot"]).is_err());
        assert!(Cli::try_parse_from(["gfx", "nodes", "g.gexf", "--attr", "novalue"]).is_err());
        assert!(Cli::try_parse_from(["gfx", "subgraph", "g.gexf"]).is_err());
    }

    #[test]
    fn test_run_reports_missing_file() {
        let cli = Cli::parse_from(["gfx", "info", "/nonexistent/graph.gexf"]);
        let err = run(cli).unwrap_err();
        assert_eq!(err.to_string(), "File not found: /nonexistent/graph.gexf");
    }

    #[test]
    fn test_run_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("infra.gexf");
        std::fs::write(&file, load::fixtures::INFRA).unwrap();
        let file = file.to_string_lossy().to_string();

        let cli = Cli::parse_from(["gfx", "has-path", file.as_str(), "lb1", "cache1"]);
        assert_eq!(run(cli).unwrap(), "Yes - a path exists from lb1 to cache1");

        let cli = Cli::parse_from(["gfx", "all-paths", file.as_str(), "lb1", "db1", "--max-depth", "0", "--json"]);
        let doc: serde_json::Value = serde_json::from_str(&run(cli).unwrap()).unwrap();
        assert_eq!(doc.as_array().unwrap().len(), 2);

        let cli = Cli::parse_from(["gfx", "centrality", file.as_str(), "--type", "pagerank", "--damping", "1.5"]);
        assert!(run(cli).unwrap_err().to_string().contains("damping"));
    }
}
