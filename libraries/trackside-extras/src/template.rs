//! Destination path templates
//!
//! Templates use `$name` / `${name}` placeholders plus `%func{...}` calls
//! that delegate to host-provided string transforms. `$$` renders a literal
//! dollar sign.
//!
//! # Available Placeholders
//!
//! | Placeholder | Value |
//! |-------------|-------|
//! | `$artist` | Track artist |
//! | `$albumartist` | Album artist |
//! | `$album` | Album title |
//! | `$albumpath` | Destination album directory (may contain separators) |
//! | `$filename` | Extra file's basename without extension |
//!
//! Unknown placeholders render as the empty string; a missing value must
//! never abort a batch, an odd path is preferable to a crash.

use crate::{ExtrasError, Result};
use std::collections::HashMap;

/// Host-provided string transform usable inside templates
pub type TemplateFn = Box<dyn Fn(&str) -> String + Send + Sync>;

/// Named string-transform functions injected by the host.
///
/// The engine never hardcodes transforms; `%upper{...}` and friends only
/// exist if the host registers them.
#[derive(Default)]
pub struct FunctionTable {
    functions: HashMap<String, TemplateFn>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transform under a name, replacing any previous entry
    pub fn register<F>(&mut self, name: impl Into<String>, function: F)
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Box::new(function));
    }

    pub fn get(&self, name: &str) -> Option<&TemplateFn> {
        self.functions.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl std::fmt::Debug for FunctionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionTable")
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Values a template renders against
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    pub artist: String,
    pub album_artist: String,
    pub album: String,
    pub album_path: String,
    pub filename: String,
}

impl TemplateContext {
    fn get(&self, key: &str) -> Option<&str> {
        match key {
            "artist" => Some(&self.artist),
            "albumartist" => Some(&self.album_artist),
            "album" => Some(&self.album),
            "albumpath" => Some(&self.album_path),
            "filename" => Some(&self.filename),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Literal(String),
    Placeholder(String),
    Call { name: String, arg: Vec<Node> },
}

/// A pre-parsed destination path template
#[derive(Debug, Clone)]
pub struct PathTemplate {
    raw: String,
    nodes: Vec<Node>,
}

impl PathTemplate {
    /// Parse a template string.
    ///
    /// Syntax errors (unterminated `${...}` or `%func{...}`) are
    /// configuration mistakes and propagate to the caller.
    pub fn parse(raw: &str) -> Result<Self> {
        let nodes = parse_nodes(raw).map_err(|reason| ExtrasError::Template {
            template: raw.to_string(),
            reason,
        })?;

        Ok(Self {
            raw: raw.to_string(),
            nodes,
        })
    }

    /// Get the original template string
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Render the template against a context.
    ///
    /// Unknown placeholders render as empty strings; unknown function names
    /// pass their rendered argument through unchanged.
    pub fn render(&self, context: &TemplateContext, functions: &FunctionTable) -> String {
        render_nodes(&self.nodes, context, functions)
    }
}

fn render_nodes(nodes: &[Node], context: &TemplateContext, functions: &FunctionTable) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            Node::Literal(text) => out.push_str(text),
            Node::Placeholder(key) => out.push_str(context.get(key).unwrap_or("")),
            Node::Call { name, arg } => {
                let rendered = render_nodes(arg, context, functions);
                match functions.get(name) {
                    Some(function) => out.push_str(&function(&rendered)),
                    None => out.push_str(&rendered),
                }
            }
        }
    }
    out
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn ident_len(s: &str) -> usize {
    s.find(|c: char| !is_ident_char(c)).unwrap_or(s.len())
}

fn parse_nodes(input: &str) -> std::result::Result<Vec<Node>, String> {
    let mut nodes = Vec::new();
    let mut literal = String::new();
    let mut pos = 0;

    while let Some(c) = input[pos..].chars().next() {
        match c {
            '$' => {
                let rest = &input[pos + 1..];
                if rest.starts_with('$') {
                    literal.push('$');
                    pos += 2;
                } else if let Some(inner) = rest.strip_prefix('{') {
                    let Some(end) = inner.find('}') else {
                        return Err("unterminated '${' placeholder".to_string());
                    };
                    flush_literal(&mut nodes, &mut literal);
                    nodes.push(Node::Placeholder(inner[..end].to_string()));
                    pos += 2 + end + 1;
                } else {
                    let len = ident_len(rest);
                    if len == 0 {
                        literal.push('$');
                        pos += 1;
                    } else {
                        flush_literal(&mut nodes, &mut literal);
                        nodes.push(Node::Placeholder(rest[..len].to_string()));
                        pos += 1 + len;
                    }
                }
            }
            '%' => {
                let rest = &input[pos + 1..];
                let name_len = ident_len(rest);

                // A bare '%' or '%name' without braces is literal text
                if name_len == 0 || !rest[name_len..].starts_with('{') {
                    literal.push('%');
                    literal.push_str(&rest[..name_len]);
                    pos += 1 + name_len;
                    continue;
                }

                let name = &rest[..name_len];
                let arg_input = &rest[name_len + 1..];
                let mut depth = 1usize;
                let mut arg_end = None;
                for (idx, inner) in arg_input.char_indices() {
                    match inner {
                        '{' => depth += 1,
                        '}' => {
                            depth -= 1;
                            if depth == 0 {
                                arg_end = Some(idx);
                                break;
                            }
                        }
                        _ => {}
                    }
                }
                let Some(arg_end) = arg_end else {
                    return Err(format!("unterminated '%{name}{{' call"));
                };

                flush_literal(&mut nodes, &mut literal);
                nodes.push(Node::Call {
                    name: name.to_string(),
                    arg: parse_nodes(&arg_input[..arg_end])?,
                });
                pos += 1 + name_len + 1 + arg_end + 1;
            }
            other => {
                literal.push(other);
                pos += other.len_utf8();
            }
        }
    }

    flush_literal(&mut nodes, &mut literal);
    Ok(nodes)
}

fn flush_literal(nodes: &mut Vec<Node>, literal: &mut String) {
    if !literal.is_empty() {
        nodes.push(Node::Literal(std::mem::take(literal)));
    }
}
