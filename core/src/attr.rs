use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Attribute map attached to nodes and edges. Keys are unique.
pub type Attributes = BTreeMap<String, AttrValue>;

/// A typed attribute value.
///
/// Filters and text exports compare values through [`AttrValue::canonical`], so
/// `Float(1.0)` and `Str("1.0")` are equal for filtering while `Int(1)` and
/// `Float(1.0)` are not.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl AttrValue {
    /// Canonical string form used for comparison and display. Booleans
    /// render as `True`/`False`.
    pub fn canonical(&self) -> String {
        match self {
            AttrValue::Str(s) => s.clone(),
            AttrValue::Int(i) => i.to_string(),
            AttrValue::Float(f) => format_float(*f),
            AttrValue::Bool(true) => "True".to_string(),
            AttrValue::Bool(false) => "False".to_string(),
        }
    }

    /// Lexical form for XML attribute data, where booleans are lowercase.
    pub fn xml_lexical(&self) -> String {
        match self {
            AttrValue::Bool(b) => b.to_string(),
            other => other.canonical(),
        }
    }

    /// Type name as declared in GEXF/GraphML attribute tables.
    pub fn type_name(&self) -> &'static str {
        match self {
            AttrValue::Str(_) => "string",
            AttrValue::Int(_) => "long",
            AttrValue::Float(_) => "double",
            AttrValue::Bool(_) => "boolean",
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Str(s)
    }
}

impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        AttrValue::Int(i)
    }
}

impl From<f64> for AttrValue {
    fn from(f: f64) -> Self {
        AttrValue::Float(f)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

/// Shortest round-trip decimal. Integral values keep a trailing `.0`;
/// decimal exponents below -4 or from 16 up switch to `1e+16` style with a
/// signed, two-digit-minimum exponent.
pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let sci = format!("{:e}", f);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };
    if (-4..16).contains(&exp) {
        let fixed = format!("{}", f);
        if fixed.contains('.') {
            fixed
        } else {
            format!("{}.0", fixed)
        }
    } else {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exp.unsigned_abs())
    }
}
