//! Error types for parsing, path handling, emission and schema loading.
//!
//! Read-side absence is deliberately **not** an error: `Document::get` and
//! friends return `Option` and stay quiet when a well-formed path points at
//! nothing or at the wrong variant. The types here cover the cases that are
//! genuinely malformed input or API misuse.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Parse errors
// ---------------------------------------------------------------------------

/// Why the parser rejected the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseErrorKind {
    /// A token that no JSON production allows at this position.
    UnexpectedToken,
    /// Input ended in the middle of a value.
    UnexpectedEof,
    /// A string literal ran off the end of the input.
    UnterminatedString,
    /// A `\` escape the grammar does not define, or a bad `\uXXXX` sequence.
    InvalidEscape,
    /// A high surrogate without its low half (or vice versa).
    LoneSurrogate,
    /// A number token that does not match the RFC 8259 grammar.
    InvalidNumber,
    /// A number whose magnitude exceeds what a double can hold.
    NumberOutOfRange,
    /// Input bytes that are not valid UTF-8.
    InvalidUtf8,
    /// Nesting deeper than [`crate::parser::MAX_DEPTH`].
    DepthExceeded,
    /// A complete value followed by something other than whitespace.
    TrailingData,
    /// A raw control character inside a string literal.
    ControlCharacter,
}

impl ParseErrorKind {
    fn message(self) -> &'static str {
        match self {
            ParseErrorKind::UnexpectedToken => "unexpected token",
            ParseErrorKind::UnexpectedEof => "unexpected end of input",
            ParseErrorKind::UnterminatedString => "unterminated string",
            ParseErrorKind::InvalidEscape => "invalid escape",
            ParseErrorKind::LoneSurrogate => "lone surrogate",
            ParseErrorKind::InvalidNumber => "invalid number",
            ParseErrorKind::NumberOutOfRange => "number out of range",
            ParseErrorKind::InvalidUtf8 => "invalid utf-8",
            ParseErrorKind::DepthExceeded => "depth exceeded",
            ParseErrorKind::TrailingData => "trailing data after value",
            ParseErrorKind::ControlCharacter => "raw control character in string",
        }
    }
}

/// A parse failure with the byte offset it was detected at.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} at byte {offset}", kind.message())]
pub struct ParseError {
    /// Byte offset into the input where the problem was detected.
    pub offset: usize,
    /// What went wrong.
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub(crate) fn new(offset: usize, kind: ParseErrorKind) -> Self {
        ParseError { offset, kind }
    }
}

// ---------------------------------------------------------------------------
// Path errors
// ---------------------------------------------------------------------------

/// A malformed path expression.
///
/// Distinct from absence: a well-formed path that points at nothing is not
/// an error, it is `None` at the read site.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum PathError {
    /// `~` in pointer syntax followed by anything but `0` or `1`.
    #[error("bad escape in pointer segment at offset {0}")]
    BadEscape(usize),

    /// Two separators in a row, or a trailing separator.
    #[error("empty path segment at offset {0}")]
    EmptySegment(usize),

    /// A `[...]` bracket whose content is not a valid array index.
    #[error("malformed bracket index at offset {0}")]
    BadIndex(usize),

    /// A `[` with no closing `]`.
    #[error("unterminated bracket at offset {0}")]
    UnterminatedBracket(usize),
}

// ---------------------------------------------------------------------------
// Emitter errors
// ---------------------------------------------------------------------------

/// Emitter API misuse, or a value JSON cannot represent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum EmitterError {
    /// A value was written where an object key is required.
    #[error("object key expected, got {got}")]
    KeyExpected { got: &'static str },

    /// `key` was called outside an object, or twice in a row.
    #[error("key() is only legal directly inside an object, state is {state}")]
    KeyMisplaced { state: &'static str },

    /// `end_object` called while not inside an object (or with a pending key).
    #[error("end_object() called in state {state}")]
    NotInObject { state: &'static str },

    /// `end_array` called while not inside an array.
    #[error("end_array() called in state {state}")]
    NotInArray { state: &'static str },

    /// Any write after the root value was completed.
    #[error("root value already complete")]
    RootDone,

    /// `finish` called with unclosed containers or no root value.
    #[error("finish() called with an incomplete document, state is {state}")]
    Incomplete { state: &'static str },

    /// NaN or an infinity; JSON has no representation for them.
    #[error("non-finite number cannot be emitted")]
    NonFiniteNumber,
}

// ---------------------------------------------------------------------------
// Schema load errors
// ---------------------------------------------------------------------------

/// A defect found while loading a schema, before any instance is seen.
///
/// External `$ref` targets are deliberately *not* load errors: a schema may
/// carry one without ever exercising it, so they surface as validation
/// records instead (keyword `unsupportedRef`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum SchemaLoadError {
    /// Schema root is neither an object nor a boolean.
    #[error("schema root must be an object or a boolean")]
    BadRoot,

    /// An internal `$ref` whose target does not exist in the document.
    #[error("unresolvable $ref {reference:?} at {schema_path}")]
    UnresolvableRef {
        schema_path: String,
        reference: String,
    },

    /// A `$ref` value that is not even a well-formed pointer or URI.
    #[error("malformed $ref {reference:?} at {schema_path}")]
    MalformedRef {
        schema_path: String,
        reference: String,
    },

    /// A `pattern` that the regex engine rejects.
    #[error("unparseable pattern at {schema_path}: {detail}")]
    BadPattern { schema_path: String, detail: String },

    /// A `type` value outside the seven known names.
    #[error("unknown type {value:?} at {schema_path}")]
    UnknownType { schema_path: String, value: String },

    /// A keyword operand of the wrong shape (non-numeric bound,
    /// non-positive `multipleOf`, `required` entry that is not a string...).
    #[error("bad operand for {keyword:?} at {schema_path}: {detail}")]
    BadKeyword {
        schema_path: String,
        keyword: String,
        detail: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display_includes_offset_and_reason() {
        let err = ParseError::new(17, ParseErrorKind::UnterminatedString);
        assert_eq!(err.to_string(), "unterminated string at byte 17");
    }

    #[test]
    fn test_path_error_display() {
        assert_eq!(
            PathError::EmptySegment(3).to_string(),
            "empty path segment at offset 3"
        );
    }

    #[test]
    fn test_schema_load_error_display() {
        let err = SchemaLoadError::UnresolvableRef {
            schema_path: "/properties/a".to_string(),
            reference: "#/$defs/Missing".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "unresolvable $ref \"#/$defs/Missing\" at /properties/a"
        );
    }
}
