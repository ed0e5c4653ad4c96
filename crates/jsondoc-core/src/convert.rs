//! Lossless-where-possible conversions between [`Node`] and
//! [`serde_json::Value`], so documents can cross into the serde ecosystem
//! and back.
//!
//! Mapping rules: integers in `i64` range stay integers; a `u64` beyond
//! `i64::MAX` becomes `Float`; non-finite floats (unreachable from parsing,
//! constructible by hand) degrade to null on the way out, matching what
//! `serde_json` itself can represent.

use serde_json::Value;

use crate::document::Document;
use crate::node::{Map, Node};

impl From<&Value> for Node {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Node::Null,
            Value::Bool(b) => Node::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Node::Int(i),
                None => Node::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Node::Str(s.clone()),
            Value::Array(items) => Node::Array(items.iter().map(Node::from).collect()),
            Value::Object(fields) => {
                let mut map = Map::with_capacity(fields.len());
                for (key, value) in fields {
                    map.insert(key.clone(), Node::from(value));
                }
                Node::Object(map)
            }
        }
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        Node::from(&value)
    }
}

impl From<&Node> for Value {
    fn from(node: &Node) -> Self {
        match node {
            Node::Null => Value::Null,
            Node::Bool(b) => Value::Bool(*b),
            Node::Int(i) => Value::Number((*i).into()),
            Node::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Node::Str(s) => Value::String(s.clone()),
            Node::Array(items) => Value::Array(items.iter().map(Value::from).collect()),
            Node::Object(fields) => {
                let mut map = serde_json::Map::with_capacity(fields.len());
                for (key, value) in fields {
                    map.insert(key.clone(), Value::from(value));
                }
                Value::Object(map)
            }
        }
    }
}

impl From<Node> for Value {
    fn from(node: Node) -> Self {
        Value::from(&node)
    }
}

impl Document {
    /// Build a document from a serde value.
    pub fn from_value(value: &Value) -> Document {
        Document::from_node(Node::from(value))
    }

    /// Convert the whole tree into a serde value.
    pub fn to_value(&self) -> Value {
        Value::from(self.root())
    }
}
