//! `path`, `all-paths` and `has-path`.

use anyhow::Result;
use gexf_query_core::GraphModel;
use serde::Serialize;

use crate::output;

pub fn shortest(graph: &GraphModel, source: &str, target: &str, weighted: bool, json: bool) -> Result<String> {
    let result = gexf_query_core::shortest_path(graph, source, target, weighted)?;
    if json {
        output::json(&result)
    } else {
        Ok(output::path_text(result.as_ref()))
    }
}

pub fn all(
    graph: &GraphModel,
    source: &str,
    target: &str,
    max_depth: Option<usize>,
    json: bool,
) -> Result<String> {
    let paths = gexf_query_core::all_paths(graph, source, target, max_depth)?;
    if json {
        output::json(&paths)
    } else {
        Ok(output::paths_text(&paths))
    }
}

#[derive(Serialize)]
struct Reachability<'a> {
    source: &'a str,
    target: &'a str,
    exists: bool,
}

/// Never fails: unknown ids simply have no path.
pub fn exists(graph: &GraphModel, source: &str, target: &str, json: bool) -> Result<String> {
    let exists = gexf_query_core::has_path(graph, source, target);
    if json {
        return output::json(&Reachability { source, target, exists });
    }
    Ok(if exists {
        format!("Yes - a path exists from {} to {}", source, target)
    } else {
        format!("No - no path exists from {} to {}", source, target)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::{fixtures::INFRA, parse_gexf};

    #[test]
    fn test_shortest_json_null_weight_when_unweighted() {
        let g = parse_gexf(INFRA, None).unwrap();
        let out = shortest(&g, "lb1", "db1", false, true).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(doc["length"], 2);
        assert!(doc.as_object().unwrap().contains_key("total_weight"));
        assert!(doc["total_weight"].is_null());
    }

    #[test]
    fn test_no_path_is_null() {
        let g = parse_gexf(INFRA, None).unwrap();
        assert_eq!(shortest(&g, "db1", "lb1", false, true).unwrap(), "null");
        assert_eq!(
            shortest(&g, "db1", "lb1", false, false).unwrap(),
            "No path found between the nodes."
        );
    }

    #[test]
    fn test_all_paths_depth_bound() {
        let g = parse_gexf(INFRA, None).unwrap();
        let out = all(&g, "lb1", "cache1", Some(1), true).unwrap();
        assert_eq!(out, "[]");
        let out = all(&g, "lb1", "cache1", None, false).unwrap();
        assert!(out.starts_with("Found 2 path(s)"));
    }

    #[test]
    fn test_has_path_tolerates_unknown_ids() {
        let g = parse_gexf(INFRA, None).unwrap();
        assert_eq!(
            exists(&g, "lb1", "db1", false).unwrap(),
            "Yes - a path exists from lb1 to db1"
        );
        assert_eq!(
            exists(&g, "ghost", "db1", false).unwrap(),
            "No - no path exists from ghost to db1"
        );
        let doc: serde_json::Value =
            serde_json::from_str(&exists(&g, "db1", "lb1", true).unwrap()).unwrap();
        assert_eq!(doc["exists"], false);
    }
}
