//! Path expressions and the tree walker behind every path-addressed
//! operation.
//!
//! Two surface syntaxes normalise to the same internal segment list:
//!
//! - **Pointer** (RFC 6901): `/a/b/0`, with `~0` → `~` and `~1` → `/`
//!   escapes. The empty string is the root.
//! - **Dot/bracket**: `a.b[0]` or `a.b.0`. The empty string is the root.
//!
//! A segment is just decoded text; whether it addresses an array position or
//! an object key is decided against the tree at walk time. The resolver here
//! is the single source of truth for those semantics: reads fail quietly,
//! writes auto-materialise intermediate containers.

use std::borrow::Cow;

use crate::error::PathError;
use crate::node::Node;

// ---------------------------------------------------------------------------
// Segments
// ---------------------------------------------------------------------------

/// One decoded path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment(String);

impl Segment {
    pub fn new(text: impl Into<String>) -> Self {
        Segment(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `Some(i)` when this segment is a well-formed array index: decimal
    /// digits only, no leading zero except the single digit `0`.
    pub fn array_index(&self) -> Option<usize> {
        let s = self.0.as_str();
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if s.len() > 1 && s.starts_with('0') {
            return None;
        }
        s.parse().ok()
    }
}

/// A normalised path: a sequence of segments, root when empty.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    /// The root path.
    pub fn root() -> Self {
        Path::default()
    }

    /// Parse either surface syntax: a leading `/` selects pointer syntax,
    /// anything else (including the empty string) is dot/bracket.
    pub fn parse(text: &str) -> Result<Self, PathError> {
        if text.is_empty() {
            Ok(Path::root())
        } else if text.starts_with('/') {
            Self::parse_pointer(text)
        } else {
            Self::parse_dot(text)
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub(crate) fn from_segments(segments: Vec<Segment>) -> Self {
        Path { segments }
    }

    // -- pointer syntax -----------------------------------------------------

    fn parse_pointer(text: &str) -> Result<Self, PathError> {
        let mut segments = Vec::new();
        // Skip the leading '/'; every further '/' starts a new segment.
        let mut offset = 1;
        for raw in text[1..].split('/') {
            if raw.is_empty() {
                return Err(PathError::EmptySegment(offset));
            }
            segments.push(Segment(decode_pointer_segment(raw, offset)?));
            offset += raw.len() + 1;
        }
        Ok(Path { segments })
    }

    // -- dot/bracket syntax -------------------------------------------------

    fn parse_dot(text: &str) -> Result<Self, PathError> {
        let bytes = text.as_bytes();
        let mut segments = Vec::new();
        let mut pos = 0;
        // True when a separator was just consumed and a key must follow.
        let mut expect_segment = true;

        while pos < bytes.len() {
            match bytes[pos] {
                b'.' => {
                    if expect_segment {
                        return Err(PathError::EmptySegment(pos));
                    }
                    expect_segment = true;
                    pos += 1;
                }
                b'[' => {
                    let close = match text[pos + 1..].find(']') {
                        Some(rel) => pos + 1 + rel,
                        None => return Err(PathError::UnterminatedBracket(pos)),
                    };
                    let inner = Segment(text[pos + 1..close].to_string());
                    if inner.array_index().is_none() {
                        return Err(PathError::BadIndex(pos + 1));
                    }
                    segments.push(inner);
                    expect_segment = false;
                    pos = close + 1;
                    // Only a separator or another bracket may follow `]`.
                    if pos < bytes.len() && bytes[pos] != b'.' && bytes[pos] != b'[' {
                        return Err(PathError::BadIndex(pos));
                    }
                }
                _ => {
                    let start = pos;
                    while pos < bytes.len() && bytes[pos] != b'.' && bytes[pos] != b'[' {
                        pos += 1;
                    }
                    segments.push(Segment(text[start..pos].to_string()));
                    expect_segment = false;
                }
            }
        }
        if expect_segment {
            // Trailing '.' (a lone "." is also this case).
            return Err(PathError::EmptySegment(text.len()));
        }
        Ok(Path { segments })
    }

    // -- rendering ----------------------------------------------------------

    /// RFC 6901 text for this path; the root renders as the empty string.
    pub fn to_pointer(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            out.push('/');
            out.push_str(&encode_pointer_segment(segment.as_str()));
        }
        out
    }

    /// Dot/bracket text for this path; index segments render as `[i]`.
    pub fn to_dot(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment.array_index() {
                Some(i) => {
                    out.push('[');
                    out.push_str(&i.to_string());
                    out.push(']');
                }
                None => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(segment.as_str());
                }
            }
        }
        out
    }
}

/// Decode `~1` → `/` and `~0` → `~`; any other `~` use is an error.
fn decode_pointer_segment(raw: &str, base_offset: usize) -> Result<String, PathError> {
    if !raw.contains('~') {
        return Ok(raw.to_string());
    }
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.char_indices();
    while let Some((i, c)) = chars.next() {
        if c != '~' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some((_, '0')) => out.push('~'),
            Some((_, '1')) => out.push('/'),
            _ => return Err(PathError::BadEscape(base_offset + i)),
        }
    }
    Ok(out)
}

/// Escape `~` → `~0` and `/` → `~1`, borrowing when nothing needs escaping.
pub(crate) fn encode_pointer_segment(segment: &str) -> Cow<'_, str> {
    if segment.contains(['~', '/']) {
        Cow::Owned(segment.replace('~', "~0").replace('/', "~1"))
    } else {
        Cow::Borrowed(segment)
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Read-mode walk. Any segment that cannot be followed makes the whole
/// lookup absent.
pub(crate) fn resolve<'a>(root: &'a Node, path: &Path) -> Option<&'a Node> {
    let mut current = root;
    for segment in path.segments() {
        current = match current {
            Node::Object(fields) => fields.get(segment.as_str())?,
            Node::Array(items) => items.get(segment.array_index()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Mutable read-mode walk; same failure semantics as [`resolve`].
pub(crate) fn resolve_mut<'a>(root: &'a mut Node, path: &Path) -> Option<&'a mut Node> {
    let mut current = root;
    for segment in path.segments() {
        current = match current {
            Node::Object(fields) => fields.get_mut(segment.as_str())?,
            Node::Array(items) => {
                let index = segment.array_index()?;
                items.get_mut(index)?
            }
            _ => return None,
        };
    }
    Some(current)
}

/// Write-mode walk: create or coerce intermediate containers so the target
/// slot exists, and return it.
///
/// An index-shaped segment materialises an array (padding missing positions
/// with `Null`) unless the existing parent is an object, in which case the
/// digits are just a key. Any other segment materialises an object. A
/// scalar in the way is replaced by the required container.
pub(crate) fn resolve_or_create<'a>(root: &'a mut Node, path: &Path) -> &'a mut Node {
    let mut current = root;
    for segment in path.segments() {
        let index = match current {
            Node::Object(_) => None,
            _ => segment.array_index(),
        };
        current = match index {
            Some(i) => {
                let items = current.coerce_array();
                if items.len() <= i {
                    items.resize(i + 1, Node::Null);
                }
                &mut items[i]
            }
            None => {
                let fields = current.coerce_object();
                fields
                    .entry(segment.as_str().to_string())
                    .or_insert(Node::Null)
            }
        };
    }
    current
}

/// Detach the node at `path`. Returns false when the path is absent (or is
/// the root, which cannot be removed from its own tree).
pub(crate) fn remove(root: &mut Node, path: &Path) -> bool {
    let (last, parent_segments) = match path.segments().split_last() {
        Some(split) => split,
        None => return false,
    };
    let parent_path = Path::from_segments(parent_segments.to_vec());
    let parent = match resolve_mut(root, &parent_path) {
        Some(node) => node,
        None => return false,
    };
    match parent {
        Node::Object(fields) => fields.shift_remove(last.as_str()).is_some(),
        Node::Array(items) => match last.array_index() {
            Some(i) if i < items.len() => {
                items.remove(i);
                true
            }
            _ => false,
        },
        _ => false,
    }
}
