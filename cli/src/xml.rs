//! Minimal XML pull reader for GEXF documents.
//!
//! Yields element starts (with attributes), element ends and text. The XML
//! declaration, processing instructions, comments and DOCTYPE are skipped.
//! Element names are reduced to their local part, so `<viz:color>` reads as
//! `color` and namespaced GEXF documents match the same names as bare ones.

use gexf_query_core::{GraphError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Start {
        name: String,
        attrs: Vec<(String, String)>,
        /// `<x/>`: no matching `End` follows.
        empty: bool,
    },
    End {
        name: String,
    },
    Text(String),
}

impl Event {
    pub fn attr<'a>(attrs: &'a [(String, String)], key: &str) -> Option<&'a str> {
        attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

pub struct XmlReader<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> XmlReader<'a> {
    pub fn new(src: &'a str) -> Self {
        // A UTF-8 byte order mark is not part of the document.
        let src = src.strip_prefix('\u{feff}').unwrap_or(src);
        Self { src, pos: 0 }
    }

    /// Next event, or `None` at end of input.
    pub fn next_event(&mut self) -> Result<Option<Event>> {
        loop {
            let rest = &self.src[self.pos..];
            if rest.is_empty() {
                return Ok(None);
            }

            if !rest.starts_with('<') {
                let end = rest.find('<').unwrap_or(rest.len());
                let text = unescape_xml(&rest[..end]).map_err(|e| self.error(&e))?;
                self.pos += end;
                return Ok(Some(Event::Text(text)));
            }

            if rest.starts_with("<?") {
                self.skip_past("?>")?;
            } else if rest.starts_with("<!--") {
                self.skip_past("-->")?;
            } else if let Some(body) = rest.strip_prefix("<![CDATA[") {
                let end = body
                    .find("]]>")
                    .ok_or_else(|| self.error("unterminated CDATA section"))?;
                let text = body[..end].to_string();
                self.pos += "<![CDATA[".len() + end + "]]>".len();
                return Ok(Some(Event::Text(text)));
            } else if rest.starts_with("<!") {
                self.skip_declaration()?;
            } else if let Some(body) = rest.strip_prefix("</") {
                let end = body
                    .find('>')
                    .ok_or_else(|| self.error("unterminated closing tag"))?;
                let name = local_name(body[..end].trim()).to_string();
                self.pos += 2 + end + 1;
                return Ok(Some(Event::End { name }));
            } else {
                return self.start_tag().map(Some);
            }
        }
    }

    fn skip_past(&mut self, terminator: &str) -> Result<()> {
        let rest = &self.src[self.pos..];
        let end = rest
            .find(terminator)
            .ok_or_else(|| self.error(&format!("missing '{}'", terminator)))?;
        self.pos += end + terminator.len();
        Ok(())
    }

    /// Skips `<!DOCTYPE ...>` and similar, including a bracketed internal
    /// subset whose markup may hold quoted `>` or nested comments.
    fn skip_declaration(&mut self) -> Result<()> {
        let rest = &self.src[self.pos..];
        let mut quote: Option<char> = None;
        let mut depth = 0usize;
        let mut resume = 2;
        for (i, c) in rest.char_indices() {
            if i < resume {
                continue;
            }
            match (quote, c) {
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '"') | (None, '\'') => quote = Some(c),
                (None, '<') if depth > 0 && rest[i..].starts_with("<!--") => {
                    let end = rest[i..]
                        .find("-->")
                        .ok_or_else(|| self.error("unterminated comment in declaration"))?;
                    resume = i + end + "-->".len();
                }
                (None, '[') => depth += 1,
                (None, ']') => depth = depth.saturating_sub(1),
                (None, '>') if depth == 0 => {
                    self.pos += i + 1;
                    return Ok(());
                }
                (None, _) => {}
            }
        }
        Err(self.error("unterminated declaration"))
    }

    fn start_tag(&mut self) -> Result<Event> {
        let rest = &self.src[self.pos..];

        // Find the closing '>' outside quoted attribute values.
        let mut quote: Option<char> = None;
        let mut close = None;
        for (i, c) in rest.char_indices().skip(1) {
            match (quote, c) {
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '"') | (None, '\'') => quote = Some(c),
                (None, '>') => {
                    close = Some(i);
                    break;
                }
                (None, _) => {}
            }
        }
        let close = close.ok_or_else(|| self.error("unterminated start tag"))?;

        let mut inner = &rest[1..close];
        let empty = inner.ends_with('/');
        if empty {
            inner = &inner[..inner.len() - 1];
        }

        let name_end = inner
            .find(|c: char| c.is_whitespace())
            .unwrap_or(inner.len());
        let name = local_name(&inner[..name_end]);
        if name.is_empty() {
            return Err(self.error("element without a name"));
        }
        let attrs = parse_attributes(&inner[name_end..]).map_err(|e| self.error(&e))?;

        let event = Event::Start {
            name: name.to_string(),
            attrs,
            empty,
        };
        self.pos += close + 1;
        Ok(event)
    }

    fn error(&self, msg: &str) -> GraphError {
        let line = self.src[..self.pos].matches('\n').count() + 1;
        GraphError::MalformedInput(format!("Invalid XML at line {}: {}", line, msg))
    }
}

fn local_name(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

fn parse_attributes(mut s: &str) -> std::result::Result<Vec<(String, String)>, String> {
    let mut attrs = Vec::new();
    loop {
        s = s.trim_start();
        if s.is_empty() {
            return Ok(attrs);
        }

        let eq = s
            .find('=')
            .ok_or_else(|| format!("attribute without value near '{}'", truncate(s)))?;
        let key = s[..eq].trim();
        if key.is_empty() || key.contains(char::is_whitespace) {
            return Err(format!("bad attribute name near '{}'", truncate(s)));
        }

        let after = s[eq + 1..].trim_start();
        let quote = after
            .chars()
            .next()
            .filter(|&c| c == '"' || c == '\'')
            .ok_or_else(|| format!("unquoted value for attribute '{}'", key))?;
        let body = &after[1..];
        let end = body
            .find(quote)
            .ok_or_else(|| format!("unterminated value for attribute '{}'", key))?;

        attrs.push((key.to_string(), unescape_xml(&body[..end])?));
        s = &body[end + 1..];
    }
}

fn truncate(s: &str) -> &str {
    match s.char_indices().nth(20) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

/// Resolve the predefined entities and numeric character references.
pub fn unescape_xml(s: &str) -> std::result::Result<String, String> {
    if !s.contains('&') {
        return Ok(s.to_string());
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        let semi = tail
            .find(';')
            .ok_or_else(|| format!("unterminated entity in '{}'", truncate(rest)))?;
        let entity = &tail[..semi];
        let resolved = match entity {
            "amp" => '&',
            "lt" => '<',
            "gt" => '>',
            "quot" => '"',
            "apos" => '\'',
            _ => {
                let code = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
                    u32::from_str_radix(hex, 16).ok()
                } else if let Some(dec) = entity.strip_prefix('#') {
                    dec.parse::<u32>().ok()
                } else {
                    None
                };
                code.and_then(char::from_u32)
                    .ok_or_else(|| format!("unknown entity '&{};'", entity))?
            }
        };
        out.push(resolved);
        rest = &tail[semi + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
