//! `stats`, `centrality`, `components` and `degree`.

use anyhow::Result;
use gexf_query_core::{CentralityKind, CentralityOptions, DegreeInfo, GraphModel};
use serde::Serialize;
use tracing::info;

use crate::output;
use crate::util::ComponentArg;

pub fn stats(graph: &GraphModel, json: bool) -> Result<String> {
    let stats = gexf_query_core::stats(graph);
    if json {
        output::json(&stats)
    } else {
        Ok(output::stats_table(&stats))
    }
}

pub fn centrality(
    graph: &GraphModel,
    kind: CentralityKind,
    options: &CentralityOptions,
    top_n: usize,
    json: bool,
) -> Result<String> {
    info!(kind = kind.as_str(), nodes = graph.node_count(), "computing centrality");
    let result = gexf_query_core::centrality(graph, kind, options);
    if json {
        output::json(&result)
    } else {
        Ok(output::centrality_table(&result, top_n))
    }
}

pub fn components(graph: &GraphModel, kind: ComponentArg, show_members: bool, json: bool) -> Result<String> {
    let result = gexf_query_core::components(graph, kind.into());
    if json {
        output::json(&result)
    } else {
        Ok(output::components_table(&result, show_members))
    }
}

#[derive(Serialize)]
struct DegreeReport<'a> {
    degrees: &'a [DegreeInfo],
}

/// Without `node`, the JSON form carries every node and `top_n` only limits the table.
pub fn degree(graph: &GraphModel, node: Option<&str>, top_n: usize, json: bool) -> Result<String> {
    if let Some(id) = node {
        let info = gexf_query_core::degree_of(graph, id)?;
        return if json {
            output::json(&info)
        } else {
            Ok(output::degree_single(&info))
        };
    }

    let report = gexf_query_core::degree_report(graph, 0);
    if json {
        output::json(&DegreeReport { degrees: &report })
    } else {
        Ok(output::degree_table(&report, top_n))
    }
}
