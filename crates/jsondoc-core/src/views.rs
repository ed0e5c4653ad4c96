//! Lazy iteration over documents: object fields, array elements, and the
//! recursive path view.
//!
//! Views borrow the tree they walk; none of them own nodes. That borrow is
//! also the concurrency story: a document cannot be mutated while one of
//! its views is alive.

use serde::{Deserialize, Serialize};

use crate::node::{Map, Node};
use crate::path::{Path, Segment};

// ---------------------------------------------------------------------------
// Object / array views
// ---------------------------------------------------------------------------

/// Fields of one object in insertion order.
pub struct ObjectView<'a> {
    iter: indexmap::map::Iter<'a, String, Node>,
}

impl<'a> ObjectView<'a> {
    pub(crate) fn new(fields: &'a Map) -> Self {
        ObjectView {
            iter: fields.iter(),
        }
    }
}

impl<'a> Iterator for ObjectView<'a> {
    type Item = (&'a str, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|(k, v)| (k.as_str(), v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl ExactSizeIterator for ObjectView<'_> {}

/// Elements of one array in index order.
pub struct ArrayView<'a> {
    iter: std::slice::Iter<'a, Node>,
}

impl<'a> ArrayView<'a> {
    pub(crate) fn new(items: &'a [Node]) -> Self {
        ArrayView { iter: items.iter() }
    }
}

impl<'a> Iterator for ArrayView<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl ExactSizeIterator for ArrayView<'_> {}

// ---------------------------------------------------------------------------
// Path view
// ---------------------------------------------------------------------------

/// Textual format for paths yielded by [`PathView`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PathFormat {
    /// RFC 6901, e.g. `/orders/0/id`.
    #[default]
    Pointer,
    /// Dot/bracket, e.g. `orders[0].id`.
    DotBracket,
}

/// Options for [`crate::Document::path_view`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PathViewOptions {
    pub format: PathFormat,
}

/// One step of the walk.
#[derive(Debug, Clone, PartialEq)]
pub struct PathEntry<'a> {
    /// Path of this node in the configured format.
    pub path: String,
    /// Number of segments in the path; the root's children are depth 1.
    pub depth: usize,
    /// True for the five childless variants (scalars and null).
    pub is_leaf: bool,
    /// The node itself.
    pub value: &'a Node,
}

enum Children<'a> {
    Object(indexmap::map::Iter<'a, String, Node>),
    Array(std::iter::Enumerate<std::slice::Iter<'a, Node>>),
}

impl<'a> Children<'a> {
    fn of(node: &'a Node) -> Option<Self> {
        match node {
            Node::Object(fields) => Some(Children::Object(fields.iter())),
            Node::Array(items) => Some(Children::Array(items.iter().enumerate())),
            _ => None,
        }
    }

    fn next_child(&mut self) -> Option<(Segment, &'a Node)> {
        match self {
            Children::Object(iter) => iter.next().map(|(k, v)| (Segment::new(k.clone()), v)),
            Children::Array(iter) => {
                iter.next().map(|(i, v)| (Segment::new(i.to_string()), v))
            }
        }
    }
}

/// Depth-first pre-order walk over every addressable node, root excluded.
///
/// The walk holds an explicit stack of child iterators plus the current
/// segment prefix, so arbitrarily deep trees iterate without recursion.
pub struct PathView<'a> {
    stack: Vec<Children<'a>>,
    prefix: Vec<Segment>,
    format: PathFormat,
}

impl<'a> PathView<'a> {
    pub(crate) fn new(root: &'a Node, options: PathViewOptions) -> Self {
        PathView {
            stack: Children::of(root).into_iter().collect(),
            prefix: Vec::new(),
            format: options.format,
        }
    }

    fn render(&self, child: &Segment) -> String {
        let mut segments = Vec::with_capacity(self.prefix.len() + 1);
        segments.extend(self.prefix.iter().cloned());
        segments.push(child.clone());
        let path = Path::from_segments(segments);
        match self.format {
            PathFormat::Pointer => path.to_pointer(),
            PathFormat::DotBracket => path.to_dot(),
        }
    }
}

impl<'a> Iterator for PathView<'a> {
    type Item = PathEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let level = self.stack.last_mut()?;
            match level.next_child() {
                Some((segment, node)) => {
                    let path = self.render(&segment);
                    let depth = self.prefix.len() + 1;
                    let is_leaf = node.is_scalar();
                    if !is_leaf {
                        // Scalars never descend; containers do, even when
                        // empty (their child iterator just ends at once).
                        if let Some(children) = Children::of(node) {
                            self.stack.push(children);
                            self.prefix.push(segment);
                        }
                    }
                    return Some(PathEntry {
                        path,
                        depth,
                        is_leaf,
                        value: node,
                    });
                }
                None => {
                    self.stack.pop();
                    self.prefix.pop();
                }
            }
        }
    }
}
