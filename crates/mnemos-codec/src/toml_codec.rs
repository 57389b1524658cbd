//! TOML with `#` comments.

use std::fmt::Write as _;

use mnemos_core::{ConfigError, ConfigResult, Document, Entry, Node};
use serde_json::{Map, Number, Value};

use crate::{comment_line, DocumentCodec};

/// TOML codec.
///
/// Leaf entries of a section are written before its sub-tables, so entry
/// order is not preserved across a round trip. TOML has no null, so null
/// values are omitted on encode.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlCodec;

impl DocumentCodec for TomlCodec {
    fn name(&self) -> &'static str {
        "toml"
    }

    fn encode(&self, doc: &Document) -> ConfigResult<String> {
        let mut out = String::new();
        write_table(&mut out, doc, &[])?;
        Ok(out)
    }

    fn decode(&self, text: &str) -> ConfigResult<Document> {
        let table: toml::Table =
            toml::from_str(text).map_err(|e| ConfigError::decode(e.to_string()))?;
        Document::from_value(table_to_json(table))
    }
}

fn write_table(out: &mut String, doc: &Document, path: &[&str]) -> ConfigResult<()> {
    for entry in doc.entries() {
        let Node::Value(value) = &entry.node else {
            continue;
        };
        let Some(value) = json_to_toml(value, &entry.name)? else {
            continue;
        };
        write_comments(out, entry);
        let _ = writeln!(out, "{} = {value}", key(&entry.name));
    }

    for entry in doc.entries() {
        let Node::Section(section) = &entry.node else {
            continue;
        };
        let mut child: Vec<&str> = path.to_vec();
        child.push(&entry.name);

        if !out.is_empty() {
            out.push('\n');
        }
        write_comments(out, entry);
        let header: Vec<String> = child.iter().map(|part| key(part)).collect();
        let _ = writeln!(out, "[{}]", header.join("."));
        write_table(out, section, &child)?;
    }
    Ok(())
}

fn write_comments(out: &mut String, entry: &Entry) {
    for comment in entry.comments() {
        let _ = writeln!(out, "{}", comment_line("#", comment));
    }
}

fn key(name: &str) -> String {
    let bare = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if bare {
        name.to_string()
    } else {
        toml::Value::String(name.to_string()).to_string()
    }
}

fn json_to_toml(value: &Value, member: &str) -> ConfigResult<Option<toml::Value>> {
    let converted = match value {
        Value::Null => return Ok(None),
        Value::Bool(b) => toml::Value::Boolean(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                toml::Value::Integer(i)
            } else if n.is_u64() {
                return Err(ConfigError::encode(format!(
                    "member '{member}': {n} exceeds the TOML integer range"
                )));
            } else {
                toml::Value::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => toml::Value::String(s.clone()),
        Value::Array(items) => {
            let mut converted = Vec::with_capacity(items.len());
            for item in items {
                converted.extend(json_to_toml(item, member)?);
            }
            toml::Value::Array(converted)
        }
        Value::Object(map) => {
            let mut table = toml::Table::new();
            for (name, item) in map {
                if let Some(item) = json_to_toml(item, member)? {
                    table.insert(name.clone(), item);
                }
            }
            toml::Value::Table(table)
        }
    };
    Ok(Some(converted))
}

fn table_to_json(table: toml::Table) -> Value {
    let map: Map<String, Value> = table
        .into_iter()
        .map(|(name, value)| (name, toml_to_json(value)))
        .collect();
    Value::Object(map)
}

fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => table_to_json(table),
    }
}
