//! The user-facing façade: one owned tree, every operation addressed by a
//! path string in either syntax.
//!
//! Reads are quiet: an absent path, a wrong-variant node or a malformed
//! path all come back as `None` (use [`Document::is`] / [`Document::contains`]
//! or [`crate::Path::parse`] to disambiguate). Writes materialise whatever
//! intermediate containers the path needs and only fail on a malformed path
//! expression.

use crate::emitter::{emit, EmitterOptions};
use crate::error::{EmitterError, ParseError, PathError};
use crate::node::{FromNode, Node};
use crate::parser;
use crate::path::{self, Path};
use crate::views::{ArrayView, ObjectView, PathView, PathViewOptions};

/// A JSON document: one root [`Node`] plus path-addressed operations.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    root: Node,
}

impl Document {
    /// An empty document (root is an empty object).
    pub fn new() -> Self {
        Document::default()
    }

    /// Wrap an existing tree.
    pub fn from_node(root: Node) -> Self {
        Document { root }
    }

    /// Parse a JSON text into a document.
    pub fn from_string(text: &str) -> Result<Self, ParseError> {
        parser::parse(text).map(Document::from_node)
    }

    /// Parse JSON bytes (tolerating a leading UTF-8 BOM) into a document.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ParseError> {
        parser::parse_bytes(bytes).map(Document::from_node)
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Node {
        &mut self.root
    }

    pub fn into_root(self) -> Node {
        self.root
    }

    // -- reads --------------------------------------------------------------

    /// The value at `path`, converted to `T`.
    ///
    /// `None` when the path is absent, malformed, or the node is of an
    /// incompatible variant. Int and Float coerce into each other; nothing
    /// else does.
    pub fn get<T: FromNode>(&self, path: &str) -> Option<T> {
        T::from_node(self.get_node(path)?)
    }

    /// Borrow the node at `path`.
    pub fn get_node(&self, path: &str) -> Option<&Node> {
        let path = Path::parse(path).ok()?;
        path::resolve(&self.root, &path)
    }

    /// True when some node exists at `path`, including an explicit null.
    pub fn contains(&self, path: &str) -> bool {
        self.get_node(path).is_some()
    }

    /// True when the node exists and is the Null variant.
    pub fn is_null(&self, path: &str) -> bool {
        self.get_node(path).is_some_and(Node::is_null)
    }

    /// True when the node exists and is exactly `T`'s variant (no numeric
    /// coercion, unlike [`Document::get`]).
    pub fn is<T: FromNode>(&self, path: &str) -> bool {
        self.get_node(path).is_some_and(|n| T::variant_matches(n))
    }

    pub fn is_object(&self, path: &str) -> bool {
        self.get_node(path).is_some_and(Node::is_object)
    }

    pub fn is_array(&self, path: &str) -> bool {
        self.get_node(path).is_some_and(Node::is_array)
    }

    // -- writes -------------------------------------------------------------

    /// Put `value` at `path`, replacing whatever was there and creating
    /// intermediate containers as needed. The empty path replaces the root.
    pub fn set<T: Into<Node>>(&mut self, path: &str, value: T) -> Result<(), PathError> {
        let path = Path::parse(path)?;
        *path::resolve_or_create(&mut self.root, &path) = value.into();
        Ok(())
    }

    /// `set` with the Null variant.
    pub fn set_null(&mut self, path: &str) -> Result<(), PathError> {
        self.set(path, ())
    }

    /// Graft another document's tree at `path`.
    pub fn set_document(&mut self, path: &str, value: Document) -> Result<(), PathError> {
        self.set(path, value.root)
    }

    /// Append to the array at `path`, materialising the array first when the
    /// path is absent or holds a non-array.
    pub fn push<T: Into<Node>>(&mut self, path: &str, value: T) -> Result<(), PathError> {
        let path = Path::parse(path)?;
        let slot = path::resolve_or_create(&mut self.root, &path);
        slot.coerce_array().push(value.into());
        Ok(())
    }

    /// Remove the node at `path`: object keys are dropped, array elements
    /// shift down. Returns whether anything was removed; an absent path is
    /// a quiet no-op.
    pub fn remove(&mut self, path: &str) -> Result<bool, PathError> {
        let path = Path::parse(path)?;
        Ok(path::remove(&mut self.root, &path))
    }

    // -- serialization ------------------------------------------------------

    /// Render the document; `indent == 0` is minified.
    pub fn to_string_indent(&self, indent: usize) -> Result<String, EmitterError> {
        self.to_string_with(&EmitterOptions {
            indent,
            ..EmitterOptions::default()
        })
    }

    /// Render with full control over the emitter options.
    pub fn to_string_with(&self, options: &EmitterOptions) -> Result<String, EmitterError> {
        emit(&self.root, options)
    }

    // -- views --------------------------------------------------------------

    /// Iterate the fields of the object at `path` in insertion order.
    /// `None` when the path is absent or not an object.
    pub fn object_view(&self, path: &str) -> Option<ObjectView<'_>> {
        self.get_node(path)?.as_object().map(ObjectView::new)
    }

    /// Iterate the elements of the array at `path` in index order.
    pub fn array_view(&self, path: &str) -> Option<ArrayView<'_>> {
        self.get_node(path)?.as_array().map(|items| ArrayView::new(items))
    }

    /// Depth-first pre-order walk over every path in the document. The root
    /// itself is not yielded.
    pub fn path_view(&self, options: PathViewOptions) -> PathView<'_> {
        PathView::new(&self.root, options)
    }
}

impl FromNode for Document {
    fn from_node(node: &Node) -> Option<Self> {
        Some(Document::from_node_ref(node))
    }

    fn variant_matches(_: &Node) -> bool {
        true
    }
}

impl Document {
    fn from_node_ref(node: &Node) -> Document {
        Document {
            root: node.clone(),
        }
    }
}

impl From<Node> for Document {
    fn from(root: Node) -> Self {
        Document { root }
    }
}
