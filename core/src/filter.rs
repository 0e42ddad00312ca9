//! Attribute, label and endpoint predicates for node/edge listings.
//!
//! All active criteria are AND-combined. A criterion against a missing label
//! or attribute never matches, even when the wanted value is empty.

use crate::attr::format_float;
use crate::graph::{EdgeRecord, GraphModel, NodeRecord};

/// Node listing criteria.
#[derive(Debug, Clone, Default)]
pub struct NodeFilter {
    /// Shell-style pattern over the label (`*`, `?`, `[...]`).
    pub label_pattern: Option<String>,
    /// `(key, value)` equality tests against canonical attribute strings.
    pub attrs: Vec<(String, String)>,
}

/// Edge listing criteria.
#[derive(Debug, Clone, Default)]
pub struct EdgeFilter {
    pub attrs: Vec<(String, String)>,
    pub source: Option<String>,
    pub target: Option<String>,
    pub edge_type: Option<String>,
}

impl NodeFilter {
    pub fn matches(&self, node: &NodeRecord) -> bool {
        if let Some(pattern) = active(&self.label_pattern) {
            // An empty label counts as no label.
            match node.label.as_deref().filter(|l| !l.is_empty()) {
                Some(label) if wildcard_match(pattern, label) => {}
                _ => return false,
            }
        }

        self.attrs.iter().all(|(key, value)| {
            node.attributes
                .get(key)
                .is_some_and(|v| v.canonical() == *value)
        })
    }
}

impl EdgeFilter {
    pub fn matches(&self, edge: &EdgeRecord) -> bool {
        if active(&self.source).is_some_and(|s| edge.source != s) {
            return false;
        }
        if active(&self.target).is_some_and(|t| edge.target != t) {
            return false;
        }
        if let Some(wanted) = active(&self.edge_type) {
            if edge.edge_type.as_deref() != Some(wanted) {
                return false;
            }
        }

        self.attrs.iter().all(|(key, value)| match edge.attributes.get(key) {
            Some(v) => v.canonical() == *value,
            None => promoted_value(edge, key).is_some_and(|v| v == *value),
        })
    }
}

/// Canonical text of a promoted edge field, if `key` names one that is set.
fn promoted_value(edge: &EdgeRecord, key: &str) -> Option<String> {
    match key {
        "id" => edge.id.clone(),
        "weight" => edge.weight.map(format_float),
        "type" => edge.edge_type.clone(),
        "label" => edge.label.clone(),
        _ => None,
    }
}

impl GraphModel {
    /// Nodes passing `filter`, in insertion order.
    pub fn nodes_matching<'a>(&'a self, filter: &'a NodeFilter) -> impl Iterator<Item = &'a NodeRecord> + 'a {
        self.nodes().iter().filter(move |n| filter.matches(n))
    }

    /// Edges passing `filter`, in insertion order.
    pub fn edges_matching<'a>(&'a self, filter: &'a EdgeFilter) -> impl Iterator<Item = &'a EdgeRecord> + 'a {
        self.edges().iter().filter(move |e| filter.matches(e))
    }
}

/// An empty criterion is treated as absent.
fn active(criterion: &Option<String>) -> Option<&str> {
    criterion.as_deref().filter(|s| !s.is_empty())
}

/// fnmatch-style matching: `*` any run, `?` one character, `[abc]`/`[a-z]`/`[!x]` classes.
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();

    let (mut pi, mut ti) = (0usize, 0usize);
    // Backtrack point: pattern position after the last `*` and the text position it covers up to.
    let mut star: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() {
            match p[pi] {
                '*' => {
                    star = Some((pi + 1, ti));
                    pi += 1;
                    continue;
                }
                '?' => {
                    pi += 1;
                    ti += 1;
                    continue;
                }
                '[' => {
                    if let Some((matched, next)) = match_class(&p, pi, t[ti]) {
                        if matched {
                            pi = next;
                            ti += 1;
                            continue;
                        }
                    } else if t[ti] == '[' {
                        // Unterminated class: literal bracket.
                        pi += 1;
                        ti += 1;
                        continue;
                    }
                }
                c if c == t[ti] => {
                    pi += 1;
                    ti += 1;
                    continue;
                }
                _ => {}
            }
        }

        match star {
            Some((sp, st)) => {
                pi = sp;
                ti = st + 1;
                star = Some((sp, st + 1));
            }
            None => return false,
        }
    }

    p[pi..].iter().all(|&c| c == '*')
}

/// Evaluate the class starting at `p[start] == '['` against `c`.
/// Returns `(matched, index after ']')`, or None if the class is unterminated.
fn match_class(p: &[char], start: usize, c: char) -> Option<(bool, usize)> {
    let mut i = start + 1;
    let negate = i < p.len() && p[i] == '!';
    if negate {
        i += 1;
    }

    let mut matched = false;
    let mut first = true;
    while i < p.len() {
        if p[i] == ']' && !first {
            return Some((matched != negate, i + 1));
        }
        first = false;
        if i + 2 < p.len() && p[i + 1] == '-' && p[i + 2] != ']' {
            if p[i] <= c && c <= p[i + 2] {
                matched = true;
            }
            i += 3;
        } else {
            if p[i] == c {
                matched = true;
            }
            i += 1;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::AttrValue;

    fn server() -> NodeRecord {
        NodeRecord::new("server1")
            .with_label("Server 1")
            .with_attr("type", "server")
            .with_attr("cores", AttrValue::Int(8))
            .with_attr("load", AttrValue::Float(1.0))
    }

    #[test]
    fn test_wildcards() {
        assert!(wildcard_match("Server*", "Server 1"));
        assert!(wildcard_match("*1", "Server 1"));
        assert!(wildcard_match("S?rver ?", "Server 1"));
        assert!(wildcard_match("*", ""));
        assert!(!wildcard_match("?", ""));
        assert!(!wildcard_match("Server", "Server 1"));
        assert!(wildcard_match("a*b*c", "aXXbYYc"));
        assert!(!wildcard_match("a*b*c", "aXXbYY"));
        assert!(wildcard_match("db[0-9]", "db7"));
        assert!(!wildcard_match("db[!0-9]", "db7"));
        assert!(wildcard_match("[sS]erver*", "server2"));
    }

    #[test]
    fn test_node_label_filter() {
        let f = NodeFilter {
            label_pattern: Some("Server*".into()),
            ..Default::default()
        };
        assert!(f.matches(&server()));
        assert!(!f.matches(&NodeRecord::new("unlabelled")));
    }

    #[test]
    fn test_node_attr_filters_and_combined() {
        let f = NodeFilter {
            label_pattern: None,
            attrs: vec![("type".into(), "server".into()), ("cores".into(), "8".into())],
        };
        assert!(f.matches(&server()));

        let wrong = NodeFilter {
            label_pattern: None,
            attrs: vec![("type".into(), "server".into()), ("cores".into(), "4".into())],
        };
        assert!(!wrong.matches(&server()));
    }

    #[test]
    fn test_missing_key_never_matches_even_empty_value() {
        let f = NodeFilter {
            label_pattern: None,
            attrs: vec![("zone".into(), String::new())],
        };
        assert!(!f.matches(&server()));
    }

    #[test]
    fn test_numeric_canonical_comparison() {
        let float_one = NodeFilter {
            label_pattern: None,
            attrs: vec![("load".into(), "1.0".into())],
        };
        assert!(float_one.matches(&server()));

        let int_one = NodeFilter {
            label_pattern: None,
            attrs: vec![("load".into(), "1".into())],
        };
        assert!(!int_one.matches(&server()));
    }

    #[test]
    fn test_edge_endpoint_and_type_filters() {
        let edge = EdgeRecord::new("lb1", "server1").with_type("directed");
        let f = EdgeFilter {
            source: Some("lb1".into()),
            edge_type: Some("directed".into()),
            ..Default::default()
        };
        assert!(f.matches(&edge));

        let other = EdgeFilter {
            target: Some("server2".into()),
            ..Default::default()
        };
        assert!(!other.matches(&edge));

        let empty = EdgeFilter {
            source: Some(String::new()),
            ..Default::default()
        };
        assert!(empty.matches(&edge));
    }

    #[test]
    fn test_edge_weight_fallback() {
        let edge = EdgeRecord::new("a", "b").with_weight(1.0);
        let f = EdgeFilter {
            attrs: vec![("weight".into(), "1.0".into())],
            ..Default::default()
        };
        assert!(f.matches(&edge));

        let unweighted = EdgeRecord::new("a", "b");
        assert!(!f.matches(&unweighted));

    }

    #[test]
    fn test_promoted_edge_fields_filterable() {
        let edge = EdgeRecord::new("a", "b")
            .with_id("e7")
            .with_type("directed")
            .with_label("uplink");
        for (key, value) in [("id", "e7"), ("type", "directed"), ("label", "uplink")] {
            let f = EdgeFilter {
                attrs: vec![(key.into(), value.into())],
                ..Default::default()
            };
            assert!(f.matches(&edge), "{}={}", key, value);
        }
        let f = EdgeFilter {
            attrs: vec![("label".into(), "downlink".into())],
            ..Default::default()
        };
        assert!(!f.matches(&edge));
    }

    #[test]
    fn test_small_weight_matches_exponent_form() {
        let edge = EdgeRecord::new("a", "b").with_weight(0.00001);
        let f = EdgeFilter {
            attrs: vec![("weight".into(), "1e-05".into())],
            ..Default::default()
        };
        assert!(f.matches(&edge));
    }

    #[test]
    fn test_empty_label_never_matches() {
        let f = NodeFilter {
            label_pattern: Some("*".into()),
            attrs: vec![],
        };
        assert!(!f.matches(&NodeRecord::new("a").with_label("")));
        assert!(!f.matches(&NodeRecord::new("b")));
        assert!(f.matches(&NodeRecord::new("c").with_label("C")));
    }

    #[test]
    fn test_listing_preserves_order() {
        let g = GraphModel::new(
            false,
            vec![
                server(),
                NodeRecord::new("db1").with_attr("type", "database"),
                NodeRecord::new("server2").with_label("Server 2").with_attr("type", "server"),
            ],
            vec![],
        )
        .unwrap();
        let f = NodeFilter {
            label_pattern: None,
            attrs: vec![("type".into(), "server".into())],
        };
        let ids: Vec<&str> = g.nodes_matching(&f).map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["server1", "server2"]);
    }
}
