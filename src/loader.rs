//! Extraction of the diagram configuration from a host document.
//!
//! The document is expected to contain a `cytoscape({ ... })` call. The
//! object literal is cut out by a string- and comment-aware scanner, split
//! into its top-level fields, and only `elements`, `style` and `layout` are
//! parsed (as JSON5). Other fields such as `container` are skipped without
//! being interpreted.

use crate::error::LoadError;
use crate::{Edge, ElementsWire, Node, StyleRule};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// Layout directive of a diagram; only its name matters to the editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub name: String,

    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl Layout {
    /// Fixed layout: nodes stay exactly where their positions say
    pub fn preset() -> Self {
        Self {
            name: "preset".to_string(),
            options: Map::new(),
        }
    }

    pub fn is_preset(&self) -> bool {
        self.name == "preset"
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::preset()
    }
}

/// Everything a document declares about a diagram
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramSource {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub style: Vec<StyleRule>,
    pub layout: Layout,
}

fn constructor_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"cytoscape\s*\(\s*\{").expect("constructor pattern is valid"))
}

/// Parse a host document into a diagram source
pub fn parse_document(text: &str) -> Result<DiagramSource, LoadError> {
    let literal = extract_config_literal(text)?;
    let fields = split_fields(literal)?;

    let field = |name: &'static str| {
        fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| *value)
    };

    let elements: ElementsWire = parse_field("elements", field("elements"))?;
    let style: Vec<StyleRule> = parse_field("style", field("style"))?;
    let layout = match field("layout") {
        Some(value) => parse_field("layout", Some(value))?,
        None => Layout::default(),
    };

    let (nodes, edges) = elements
        .into_parts()
        .map_err(|message| LoadError::InvalidField {
            field: "elements",
            message,
        })?;

    Ok(DiagramSource {
        nodes,
        edges,
        style,
        layout,
    })
}

fn parse_field<T: DeserializeOwned>(name: &'static str, value: Option<&str>) -> Result<T, LoadError> {
    let value = value.ok_or(LoadError::MissingField(name))?;
    json5::from_str(value).map_err(|err| LoadError::InvalidField {
        field: name,
        message: err.to_string(),
    })
}

/// The `{ ... }` literal passed to the first constructor call, braces included
pub fn extract_config_literal(text: &str) -> Result<&str, LoadError> {
    let found = constructor_pattern()
        .find(text)
        .ok_or(LoadError::ConfigNotFound)?;
    let open = found.end() - 1;

    let mut scanner = Scanner::new(text, open);
    scanner
        .skip_balanced()
        .ok_or(LoadError::UnbalancedConfig { offset: open })?;
    Ok(&text[open..scanner.pos])
}

/// Split an object literal into `(key, raw value text)` pairs
fn split_fields(literal: &str) -> Result<Vec<(String, &str)>, LoadError> {
    let inner_end = literal.len() - 1;
    let mut scanner = Scanner::new(literal, 1);
    let mut fields = Vec::new();

    loop {
        scanner.skip_trivia();
        if scanner.pos >= inner_end {
            break;
        }

        let key = scanner.read_key().ok_or_else(|| LoadError::MalformedConfig {
            offset: scanner.pos,
            message: "expected a field name".to_string(),
        })?;

        scanner.skip_trivia();
        if scanner.peek() != Some(b':') {
            return Err(LoadError::MalformedConfig {
                offset: scanner.pos,
                message: format!("expected `:` after `{}`", key),
            });
        }
        scanner.pos += 1;
        scanner.skip_trivia();

        let start = scanner.pos;
        scanner.skip_value(inner_end);
        let value = literal[start..scanner.pos].trim_end();
        if value.is_empty() {
            return Err(LoadError::MalformedConfig {
                offset: start,
                message: format!("`{}` has no value", key),
            });
        }
        fields.push((key, value));

        if scanner.peek() == Some(b',') {
            scanner.pos += 1;
        }
    }

    Ok(fields)
}

/// Byte cursor over JavaScript-ish source.
///
/// Only ASCII delimiters are inspected, so every position it stops at is a
/// valid `str` boundary.
struct Scanner<'a> {
    bytes: &'a [u8],
    text: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str, pos: usize) -> Self {
        Self {
            bytes: text.as_bytes(),
            text,
            pos,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    /// Skip whitespace and comments
    fn skip_trivia(&mut self) {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(b), _) if b.is_ascii_whitespace() => self.pos += 1,
                (Some(b'/'), Some(b'/')) => {
                    while let Some(b) = self.peek() {
                        if b == b'\n' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                (Some(b'/'), Some(b'*')) => {
                    self.pos += 2;
                    while self.pos < self.bytes.len()
                        && !(self.peek() == Some(b'*') && self.peek_at(1) == Some(b'/'))
                    {
                        self.pos += 1;
                    }
                    self.pos = (self.pos + 2).min(self.bytes.len());
                }
                _ => return,
            }
        }
    }

    /// Skip a quoted string starting at the cursor
    fn skip_string(&mut self) -> Option<()> {
        let quote = self.peek()?;
        self.pos += 1;
        while let Some(b) = self.peek() {
            self.pos += 1;
            if b == b'\\' {
                self.pos += 1;
            } else if b == quote {
                return Some(());
            }
        }
        None
    }

    /// Skip from an opening bracket to just past its matching close
    fn skip_balanced(&mut self) -> Option<()> {
        let mut depth = 0usize;
        while let Some(b) = self.peek() {
            match b {
                b'"' | b'\'' | b'`' => {
                    self.skip_string()?;
                    continue;
                }
                b'/' if matches!(self.peek_at(1), Some(b'/') | Some(b'*')) => {
                    self.skip_trivia();
                    continue;
                }
                b'{' | b'[' | b'(' => depth += 1,
                b'}' | b']' | b')' => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        self.pos += 1;
                        return Some(());
                    }
                }
                _ => {}
            }
            self.pos += 1;
        }
        None
    }

    /// Skip a field value up to the next top-level `,` or `end`
    fn skip_value(&mut self, end: usize) {
        while self.pos < end {
            match self.bytes[self.pos] {
                b',' => return,
                b'"' | b'\'' | b'`' => {
                    if self.skip_string().is_none() {
                        self.pos = end;
                    }
                }
                b'{' | b'[' | b'(' => {
                    if self.skip_balanced().is_none() {
                        self.pos = end;
                    }
                }
                b'/' if matches!(self.peek_at(1), Some(b'/') | Some(b'*')) => self.skip_trivia(),
                _ => self.pos += 1,
            }
        }
        self.pos = self.pos.min(end);
    }

    /// Bare identifier or quoted field name
    fn read_key(&mut self) -> Option<String> {
        match self.peek()? {
            b'"' | b'\'' => {
                let start = self.pos + 1;
                self.skip_string()?;
                Some(self.text[start..self.pos - 1].to_string())
            }
            b if b.is_ascii_alphabetic() || b == b'_' || b == b'$' => {
                let start = self.pos;
                while let Some(b) = self.peek() {
                    if b.is_ascii_alphanumeric() || b == b'_' || b == b'$' {
                        self.pos += 1;
                    } else {
                        break;
                    }
                }
                Some(self.text[start..self.pos].to_string())
            }
            _ => None,
        }
    }
}
