//! Streaming JSON emitter with a stack-validated state machine.
//!
//! The [`Emitter`] writes tokens into a growing buffer while tracking where
//! it is: at the root, inside an object awaiting a key, awaiting a value, or
//! inside an array. Every public operation is a deterministic transition;
//! illegal transitions return [`EmitterError`] instead of producing broken
//! output.
//!
//! Whole subtrees are written through the same machine, so
//! [`emit`] is just "open, write node, finish".

use serde::{Deserialize, Serialize};

use crate::error::EmitterError;
use crate::node::Node;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Output shape knobs. There are deliberately no others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct EmitterOptions {
    /// Spaces per nesting level; `0` means minified single-line output.
    pub indent: usize,
    /// Sort object keys lexicographically when writing whole subtrees.
    /// Streamed `key()` calls are the caller's responsibility.
    pub sort_keys: bool,
    /// Escape every non-ASCII scalar as `\uXXXX` (surrogate pairs outside
    /// the BMP).
    pub ascii_only: bool,
}

impl Default for EmitterOptions {
    fn default() -> Self {
        EmitterOptions {
            indent: 0,
            sort_keys: false,
            ascii_only: false,
        }
    }
}

/// Render a whole tree with the given options.
pub fn emit(node: &Node, options: &EmitterOptions) -> Result<String, EmitterError> {
    let mut emitter = Emitter::with_options(options.clone());
    emitter.node(node)?;
    emitter.finish()
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

enum Frame {
    Object { need_key: bool, count: usize },
    Array { count: usize },
}

/// Streaming writer. See the module docs for the state model.
pub struct Emitter {
    out: String,
    options: EmitterOptions,
    frames: Vec<Frame>,
    root_done: bool,
}

impl Default for Emitter {
    fn default() -> Self {
        Emitter::new()
    }
}

impl Emitter {
    /// A minified emitter with default options.
    pub fn new() -> Self {
        Emitter::with_options(EmitterOptions::default())
    }

    pub fn with_options(options: EmitterOptions) -> Self {
        Emitter {
            out: String::new(),
            options,
            frames: Vec::new(),
            root_done: false,
        }
    }

    /// Human-readable name of the current state, used in misuse errors.
    fn state_name(&self) -> &'static str {
        if self.root_done && self.frames.is_empty() {
            return "closed";
        }
        match self.frames.last() {
            None => "root",
            Some(Frame::Object { need_key: true, .. }) => "object-key",
            Some(Frame::Object { need_key: false, .. }) => "object-value",
            Some(Frame::Array { .. }) => "array",
        }
    }

    /// Begin `{`. Legal anywhere a value is legal.
    pub fn begin_object(&mut self) -> Result<(), EmitterError> {
        self.value_prelude("object")?;
        self.out.push('{');
        self.frames.push(Frame::Object {
            need_key: true,
            count: 0,
        });
        Ok(())
    }

    /// Close the innermost object.
    pub fn end_object(&mut self) -> Result<(), EmitterError> {
        match self.frames.pop() {
            Some(Frame::Object {
                need_key: true,
                count,
            }) => {
                if count > 0 {
                    let depth = self.frames.len();
                    self.newline_indent(depth);
                }
                self.out.push('}');
                self.value_done();
                Ok(())
            }
            other => {
                if let Some(frame) = other {
                    self.frames.push(frame);
                }
                Err(EmitterError::NotInObject {
                    state: self.state_name(),
                })
            }
        }
    }

    /// Begin `[`. Legal anywhere a value is legal.
    pub fn begin_array(&mut self) -> Result<(), EmitterError> {
        self.value_prelude("array")?;
        self.out.push('[');
        self.frames.push(Frame::Array { count: 0 });
        Ok(())
    }

    /// Close the innermost array.
    pub fn end_array(&mut self) -> Result<(), EmitterError> {
        match self.frames.pop() {
            Some(Frame::Array { count }) => {
                if count > 0 {
                    let depth = self.frames.len();
                    self.newline_indent(depth);
                }
                self.out.push(']');
                self.value_done();
                Ok(())
            }
            other => {
                if let Some(frame) = other {
                    self.frames.push(frame);
                }
                Err(EmitterError::NotInArray {
                    state: self.state_name(),
                })
            }
        }
    }

    /// Write an object key. Legal only directly inside an object, before
    /// its value.
    pub fn key(&mut self, key: &str) -> Result<(), EmitterError> {
        let state = self.state_name();
        let count = match self.frames.last_mut() {
            Some(Frame::Object { need_key, count }) if *need_key => {
                *need_key = false;
                *count
            }
            _ => return Err(EmitterError::KeyMisplaced { state }),
        };
        if count > 0 {
            self.out.push(',');
        }
        let depth = self.frames.len();
        self.newline_indent(depth);
        escape_str_into(&mut self.out, key, self.options.ascii_only);
        self.out.push(':');
        if self.options.indent > 0 {
            self.out.push(' ');
        }
        Ok(())
    }

    /// Write a primitive or a whole subtree at the current value position.
    pub fn value<T: Into<Node>>(&mut self, value: T) -> Result<(), EmitterError> {
        let node = value.into();
        self.node(&node)
    }

    /// `key` + `value` in one call.
    pub fn entry<T: Into<Node>>(&mut self, key: &str, value: T) -> Result<(), EmitterError> {
        self.key(key)?;
        self.value(value)
    }

    /// Write a whole [`Node`] by reference at the current value position.
    pub fn node(&mut self, node: &Node) -> Result<(), EmitterError> {
        self.value_prelude(node.type_name())?;
        let depth = self.frames.len();
        self.write_node(node, depth)?;
        self.value_done();
        Ok(())
    }

    /// Finalise: the stack must be empty and the root value written.
    pub fn finish(self) -> Result<String, EmitterError> {
        if self.frames.is_empty() && self.root_done {
            Ok(self.out)
        } else {
            Err(EmitterError::Incomplete {
                state: self.state_name(),
            })
        }
    }

    // -- transitions --------------------------------------------------------

    /// Separator/indent before a value, and the legality check for writing
    /// one in the current state.
    fn value_prelude(&mut self, incoming: &'static str) -> Result<(), EmitterError> {
        let needs_comma = match self.frames.last() {
            None => {
                return if self.root_done {
                    Err(EmitterError::RootDone)
                } else {
                    Ok(())
                };
            }
            Some(Frame::Object { need_key, .. }) => {
                if *need_key {
                    return Err(EmitterError::KeyExpected { got: incoming });
                }
                // The key already wrote the separator and indent.
                return Ok(());
            }
            Some(Frame::Array { count }) => *count > 0,
        };
        if needs_comma {
            self.out.push(',');
        }
        let depth = self.frames.len();
        self.newline_indent(depth);
        Ok(())
    }

    /// Bookkeeping after a value (scalar or closed container) is complete.
    fn value_done(&mut self) {
        match self.frames.last_mut() {
            None => self.root_done = true,
            Some(Frame::Object { need_key, count }) => {
                *need_key = true;
                *count += 1;
            }
            Some(Frame::Array { count }) => *count += 1,
        }
    }

    fn newline_indent(&mut self, depth: usize) {
        if self.options.indent > 0 {
            self.out.push('\n');
            for _ in 0..depth * self.options.indent {
                self.out.push(' ');
            }
        }
    }

    // -- tree rendering -----------------------------------------------------

    fn write_node(&mut self, node: &Node, depth: usize) -> Result<(), EmitterError> {
        match node {
            Node::Null => self.out.push_str("null"),
            Node::Bool(true) => self.out.push_str("true"),
            Node::Bool(false) => self.out.push_str("false"),
            Node::Int(i) => self.out.push_str(&i.to_string()),
            Node::Float(f) => write_f64_into(&mut self.out, *f)?,
            Node::Str(s) => escape_str_into(&mut self.out, s, self.options.ascii_only),
            Node::Array(items) => {
                self.out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.out.push(',');
                    }
                    self.child_indent(depth + 1);
                    self.write_node(item, depth + 1)?;
                }
                if !items.is_empty() {
                    self.child_indent(depth);
                }
                self.out.push(']');
            }
            Node::Object(fields) => {
                self.out.push('{');
                let mut keys: Vec<&str> = fields.keys().map(String::as_str).collect();
                if self.options.sort_keys {
                    keys.sort_unstable();
                }
                for (i, key) in keys.iter().enumerate() {
                    if i > 0 {
                        self.out.push(',');
                    }
                    self.child_indent(depth + 1);
                    escape_str_into(&mut self.out, key, self.options.ascii_only);
                    self.out.push(':');
                    if self.options.indent > 0 {
                        self.out.push(' ');
                    }
                    self.write_node(&fields[*key], depth + 1)?;
                }
                if !fields.is_empty() {
                    self.child_indent(depth);
                }
                self.out.push('}');
            }
        }
        Ok(())
    }

    fn child_indent(&mut self, depth: usize) {
        self.newline_indent(depth);
    }
}

// ---------------------------------------------------------------------------
// Scalar rendering
// ---------------------------------------------------------------------------

/// Shortest round-trip rendering of a double, with a `.0` forced onto
/// integral values so the text re-parses as Float, never Int.
fn write_f64_into(out: &mut String, f: f64) -> Result<(), EmitterError> {
    if !f.is_finite() {
        return Err(EmitterError::NonFiniteNumber);
    }
    let rendered = format!("{f}");
    let needs_marker = !rendered.contains(['.', 'e', 'E']);
    out.push_str(&rendered);
    if needs_marker {
        out.push_str(".0");
    }
    Ok(())
}

/// Quote and escape a string scalar.
fn escape_str_into(out: &mut String, s: &str, ascii_only: bool) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{0008}' => out.push_str("\\b"),
            '\u{000C}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                push_u16_escape(out, c as u16);
            }
            c if ascii_only && !c.is_ascii() => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    push_u16_escape(out, *unit);
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

fn push_u16_escape(out: &mut String, unit: u16) {
    out.push_str("\\u");
    for shift in [12u32, 8, 4, 0] {
        let digit = (unit >> shift) & 0xF;
        let c = char::from_digit(u32::from(digit), 16).unwrap_or('0');
        out.push(c);
    }
}
