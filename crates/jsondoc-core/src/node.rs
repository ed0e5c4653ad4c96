//! The value tree: a seven-variant tagged union for JSON data.
//!
//! Objects preserve insertion order via [`indexmap::IndexMap`] (a vector of
//! pairs with a companion hash index), so a parsed document serializes its
//! keys back in source order and repeated `set` calls keep first-introduction
//! order.

use indexmap::IndexMap;

/// Ordered string-keyed mapping used for the object variant.
pub type Map = IndexMap<String, Node>;

/// One JSON value.
///
/// `Int` and `Float` are distinct variants: a parsed number without fraction
/// or exponent that fits `i64` is `Int`, everything else is `Float`. `Null`
/// is a first-class value, distinct from an absent path.
#[derive(Debug, Clone)]
pub enum Node {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Array(Vec<Node>),
    Object(Map),
}

impl Node {
    /// The JSON Schema type name of this variant.
    ///
    /// `Int` reports `"integer"`, `Float` reports `"number"` even when its
    /// value happens to be integral.
    pub fn type_name(&self) -> &'static str {
        match self {
            Node::Null => "null",
            Node::Bool(_) => "boolean",
            Node::Int(_) => "integer",
            Node::Float(_) => "number",
            Node::Str(_) => "string",
            Node::Array(_) => "array",
            Node::Object(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Node::Bool(_))
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Node::Int(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Node::Float(_))
    }

    /// True for either numeric variant.
    pub fn is_number(&self) -> bool {
        matches!(self, Node::Int(_) | Node::Float(_))
    }

    pub fn is_str(&self) -> bool {
        matches!(self, Node::Str(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Node::Array(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Node::Object(_))
    }

    /// A scalar is anything that cannot hold children.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Node::Array(_) | Node::Object(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Node::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The exact integer value; `Float` does not coerce here.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Node::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value as a double; `Int` widens.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Node::Int(i) => Some(*i as f64),
            Node::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Node>> {
        match self {
            Node::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Node::Object(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Map> {
        match self {
            Node::Object(m) => Some(m),
            _ => None,
        }
    }

    /// Borrow this node as an array, replacing it with an empty array first
    /// if it is any other variant. Used by write-mode path resolution.
    pub(crate) fn coerce_array(&mut self) -> &mut Vec<Node> {
        if !self.is_array() {
            *self = Node::Array(Vec::new());
        }
        match self {
            Node::Array(a) => a,
            // The line above just made it an array.
            _ => unreachable!(),
        }
    }

    /// Borrow this node as an object, replacing it with an empty object
    /// first if it is any other variant.
    pub(crate) fn coerce_object(&mut self) -> &mut Map {
        if !self.is_object() {
            *self = Node::Object(Map::new());
        }
        match self {
            Node::Object(m) => m,
            _ => unreachable!(),
        }
    }
}

/// Structural equality.
///
/// Object comparison ignores key order; `Int` and `Float` compare by
/// mathematical value (so `enum`, `const` and `uniqueItems` treat `1` and
/// `1.0` as the same JSON value).
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Node::Null, Node::Null) => true,
            (Node::Bool(a), Node::Bool(b)) => a == b,
            (Node::Int(a), Node::Int(b)) => a == b,
            (Node::Float(a), Node::Float(b)) => a == b,
            (Node::Int(i), Node::Float(f)) | (Node::Float(f), Node::Int(i)) => *i as f64 == *f,
            (Node::Str(a), Node::Str(b)) => a == b,
            (Node::Array(a), Node::Array(b)) => a == b,
            (Node::Object(a), Node::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl Default for Node {
    /// An empty object, matching what a fresh [`crate::Document`] holds.
    fn default() -> Self {
        Node::Object(Map::new())
    }
}

// ---------------------------------------------------------------------------
// Into-tree conversions
// ---------------------------------------------------------------------------

impl From<bool> for Node {
    fn from(b: bool) -> Self {
        Node::Bool(b)
    }
}

impl From<i64> for Node {
    fn from(i: i64) -> Self {
        Node::Int(i)
    }
}

impl From<i32> for Node {
    fn from(i: i32) -> Self {
        Node::Int(i64::from(i))
    }
}

impl From<u32> for Node {
    fn from(i: u32) -> Self {
        Node::Int(i64::from(i))
    }
}

impl From<f64> for Node {
    fn from(f: f64) -> Self {
        Node::Float(f)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::Str(s.to_string())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::Str(s)
    }
}

impl From<Vec<Node>> for Node {
    fn from(items: Vec<Node>) -> Self {
        Node::Array(items)
    }
}

impl From<Map> for Node {
    fn from(fields: Map) -> Self {
        Node::Object(fields)
    }
}

impl From<()> for Node {
    fn from(_: ()) -> Self {
        Node::Null
    }
}

// ---------------------------------------------------------------------------
// Out-of-tree conversions
// ---------------------------------------------------------------------------

/// Typed extraction from a [`Node`], used by [`crate::Document::get`] and
/// [`crate::Document::is`].
///
/// `from_node` applies the permitted numeric coercions (Int widens to f64,
/// an integral Float narrows to i64); `variant_matches` is strict and checks
/// the variant tag only.
pub trait FromNode: Sized {
    fn from_node(node: &Node) -> Option<Self>;

    fn variant_matches(node: &Node) -> bool;
}

impl FromNode for bool {
    fn from_node(node: &Node) -> Option<Self> {
        node.as_bool()
    }

    fn variant_matches(node: &Node) -> bool {
        node.is_bool()
    }
}

impl FromNode for i64 {
    fn from_node(node: &Node) -> Option<Self> {
        match node {
            Node::Int(i) => Some(*i),
            // Int↔Float coercion is permitted on read; bool/string are not.
            Node::Float(f) if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 => {
                Some(*f as i64)
            }
            _ => None,
        }
    }

    fn variant_matches(node: &Node) -> bool {
        node.is_int()
    }
}

impl FromNode for f64 {
    fn from_node(node: &Node) -> Option<Self> {
        node.as_f64()
    }

    fn variant_matches(node: &Node) -> bool {
        node.is_float()
    }
}

impl FromNode for String {
    fn from_node(node: &Node) -> Option<Self> {
        node.as_str().map(str::to_string)
    }

    fn variant_matches(node: &Node) -> bool {
        node.is_str()
    }
}

impl FromNode for Node {
    fn from_node(node: &Node) -> Option<Self> {
        Some(node.clone())
    }

    fn variant_matches(_: &Node) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        assert_eq!(Node::Null.type_name(), "null");
        assert_eq!(Node::Bool(true).type_name(), "boolean");
        assert_eq!(Node::Int(1).type_name(), "integer");
        assert_eq!(Node::Float(1.0).type_name(), "number");
        assert_eq!(Node::Str("x".into()).type_name(), "string");
        assert_eq!(Node::Array(vec![]).type_name(), "array");
        assert_eq!(Node::Object(Map::new()).type_name(), "object");
    }

    #[test]
    fn test_numeric_cross_variant_equality() {
        assert_eq!(Node::Int(3), Node::Float(3.0));
        assert_ne!(Node::Int(3), Node::Float(3.5));
        assert_ne!(Node::Int(1), Node::Bool(true));
    }

    #[test]
    fn test_object_equality_ignores_key_order() {
        let mut a = Map::new();
        a.insert("x".to_string(), Node::Int(1));
        a.insert("y".to_string(), Node::Int(2));

        let mut b = Map::new();
        b.insert("y".to_string(), Node::Int(2));
        b.insert("x".to_string(), Node::Int(1));

        assert_eq!(Node::Object(a), Node::Object(b));
    }

    #[test]
    fn test_from_node_coercions() {
        assert_eq!(i64::from_node(&Node::Float(4.0)), Some(4));
        assert_eq!(i64::from_node(&Node::Float(4.5)), None);
        assert_eq!(f64::from_node(&Node::Int(4)), Some(4.0));
        // String→number and Int→bool are not permitted.
        assert_eq!(i64::from_node(&Node::Str("4".into())), None);
        assert_eq!(bool::from_node(&Node::Int(1)), None);
    }

    #[test]
    fn test_variant_matches_is_strict() {
        assert!(i64::variant_matches(&Node::Int(1)));
        assert!(!i64::variant_matches(&Node::Float(1.0)));
        assert!(f64::variant_matches(&Node::Float(1.0)));
        assert!(!f64::variant_matches(&Node::Int(1)));
    }

    #[test]
    fn test_coerce_replaces_scalars() {
        let mut n = Node::Str("old".into());
        n.coerce_array().push(Node::Int(1));
        assert_eq!(n, Node::Array(vec![Node::Int(1)]));

        let mut n = Node::Int(9);
        n.coerce_object().insert("k".to_string(), Node::Null);
        assert!(n.is_object());
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut m = Map::new();
        m.insert("b".to_string(), Node::Int(1));
        m.insert("a".to_string(), Node::Int(2));
        m.insert("b".to_string(), Node::Int(3));
        let keys: Vec<&str> = m.keys().map(String::as_str).collect();
        // Re-inserting an existing key keeps its original position.
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(m["b"], Node::Int(3));
    }
}
