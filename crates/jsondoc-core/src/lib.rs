//! # jsondoc-core
//!
//! A JSON data-handling core built around four pieces:
//!
//! - **[`Document`]** — an in-memory JSON tree with path-addressed reads and
//!   writes. Every operation accepts both RFC 6901 pointers (`/a/b/0`) and
//!   dot/bracket notation (`a.b[0]`); writes auto-materialise intermediate
//!   containers.
//! - **[`Emitter`]** — a streaming, stack-validated JSON writer, also the
//!   engine behind [`Document::to_string_indent`].
//! - **[`SchemaValidator`]** — JSON Schema 2020-12 validation (a practical
//!   subset) with structured per-keyword error records and intra-document
//!   `$ref` resolution.
//! - **[`SchemaInferencer`]** — synthesises a schema from sample documents
//!   by unifying observed structure, with optional format and constraint
//!   detection.
//!
//! ```
//! use jsondoc_core::Document;
//!
//! let mut doc = Document::new();
//! doc.set("/users/0/name", "Ada").unwrap();
//! doc.set("users[0].admin", true).unwrap();
//!
//! assert_eq!(doc.get::<String>("/users/0/name").as_deref(), Some("Ada"));
//! assert_eq!(
//!     doc.to_string_indent(0).unwrap(),
//!     r#"{"users":[{"name":"Ada","admin":true}]}"#
//! );
//! ```
//!
//! Parsing is strict RFC 8259; output is UTF-8 with LF line endings when
//! indented. [`Node`] trees convert losslessly to and from
//! `serde_json::Value` for interop with the serde ecosystem.

pub mod document;
pub mod emitter;
pub mod error;
pub mod formats;
pub mod infer;
pub mod node;
pub mod parser;
pub mod path;
pub mod validator;
pub mod views;

mod convert;

pub use document::Document;
pub use emitter::{emit, Emitter, EmitterOptions};
pub use error::{
    EmitterError, ParseError, ParseErrorKind, PathError, SchemaLoadError,
};
pub use infer::{InferencerOptions, SchemaInferencer};
pub use node::{FromNode, Map, Node};
pub use parser::{parse, parse_bytes};
pub use path::{Path, Segment};
pub use validator::{
    Annotation, SchemaValidator, ValidationError, ValidationResult, ValidatorOptions,
};
pub use views::{ArrayView, ObjectView, PathEntry, PathFormat, PathView, PathViewOptions};
