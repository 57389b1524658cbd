//! JSON with whole-line `//` comments.

use std::fmt::Write as _;

use mnemos_core::{ConfigError, ConfigResult, Document, Node};
use serde_json::Value;

use crate::{comment_line, DocumentCodec};

const INDENT: &str = "  ";

/// JSON codec.
///
/// Comments are written as `//` lines above each entry. On decode, any line
/// whose first non-blank characters are `//` is dropped before parsing;
/// trailing comments after a value are not supported.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl DocumentCodec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode(&self, doc: &Document) -> ConfigResult<String> {
        let mut out = String::new();
        write_document(&mut out, doc, 0)?;
        out.push('\n');
        Ok(out)
    }

    fn decode(&self, text: &str) -> ConfigResult<Document> {
        let stripped: String = text
            .lines()
            .filter(|line| !line.trim_start().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");
        if stripped.trim().is_empty() {
            return Err(ConfigError::decode("document is empty"));
        }
        let value: Value =
            serde_json::from_str(&stripped).map_err(|e| ConfigError::decode(e.to_string()))?;
        Document::from_value(value)
    }
}

fn write_document(out: &mut String, doc: &Document, depth: usize) -> ConfigResult<()> {
    if doc.is_empty() {
        out.push_str("{}");
        return Ok(());
    }

    let inner = INDENT.repeat(depth + 1);
    out.push_str("{\n");
    let last = doc.entries().len() - 1;
    for (index, entry) in doc.entries().iter().enumerate() {
        for comment in entry.comments() {
            let _ = writeln!(out, "{inner}{}", comment_line("//", comment));
        }
        let key = serde_json::to_string(&entry.name).map_err(|e| ConfigError::encode(e.to_string()))?;
        let _ = write!(out, "{inner}{key}: ");
        match &entry.node {
            Node::Section(section) => write_document(out, section, depth + 1)?,
            Node::Value(value) => write_value(out, value, &inner)?,
        }
        if index != last {
            out.push(',');
        }
        out.push('\n');
    }
    out.push_str(&INDENT.repeat(depth));
    out.push('}');
    Ok(())
}

fn write_value(out: &mut String, value: &Value, indent: &str) -> ConfigResult<()> {
    let pretty =
        serde_json::to_string_pretty(value).map_err(|e| ConfigError::encode(e.to_string()))?;
    let mut lines = pretty.lines();
    if let Some(first) = lines.next() {
        out.push_str(first);
    }
    for line in lines {
        let _ = write!(out, "\n{indent}{line}");
    }
    Ok(())
}
