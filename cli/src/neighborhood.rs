//! `neighbors`, `reachable` and `common-neighbors`.

use anyhow::Result;
use gexf_query_core::GraphModel;

use crate::output;
use crate::util::{DirectionArg, ReachArg};

pub fn neighbors(
    graph: &GraphModel,
    id: &str,
    direction: DirectionArg,
    depth: u32,
    json: bool,
) -> Result<String> {
    let found = gexf_query_core::neighbors(graph, id, direction.into(), depth)?;
    if json {
        return output::json(&found);
    }
    if found.is_empty() {
        return Ok(format!("No neighbors found for node {}.", id));
    }
    Ok(format!(
        "Neighbors of {} (depth={}, direction={})\n\n{}",
        id,
        depth,
        direction.as_str(),
        output::nodes_table(&found, true)
    ))
}

pub fn reachable(
    graph: &GraphModel,
    id: &str,
    reach: ReachArg,
    max_depth: Option<u32>,
    json: bool,
) -> Result<String> {
    let found = gexf_query_core::reachable(graph, id, reach.into(), max_depth)?;
    if json {
        return output::json(&found);
    }
    if found.is_empty() {
        return Ok(format!("No nodes reachable from {}.", id));
    }
    Ok(format!(
        "Nodes reachable from {} (direction={})\n\n{}",
        id,
        reach.as_str(),
        output::nodes_table(&found, true)
    ))
}

pub fn common_neighbors(graph: &GraphModel, a: &str, b: &str, json: bool) -> Result<String> {
    let common = gexf_query_core::common_neighbors(graph, a, b)?;
    if json {
        return output::json(&common);
    }
    if common.is_empty() {
        return Ok(format!("No common neighbors found between {} and {}.", a, b));
    }
    Ok(format!(
        "Common neighbors of {} and {}\n\n{}",
        a,
        b,
        output::nodes_table(&common, true)
    ))
}
