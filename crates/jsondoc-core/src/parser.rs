//! Strict RFC 8259 parser: UTF-8 text in, [`Node`] tree out.
//!
//! Nothing beyond the grammar is accepted: no comments, no trailing commas,
//! no unquoted keys, whitespace is space/tab/LF/CR only. Failures carry the
//! byte offset where the problem was detected.
//!
//! Numbers without fraction or exponent that fit `i64` become [`Node::Int`];
//! every other number becomes [`Node::Float`]. Duplicate object keys keep
//! the first key's position and the last occurrence's value.

use crate::error::{ParseError, ParseErrorKind};
use crate::node::{Map, Node};

/// Maximum container nesting. Exceeding it is a parse error, not a stack
/// overflow.
pub const MAX_DEPTH: usize = 512;

/// Parse a complete JSON text.
pub fn parse(text: &str) -> Result<Node, ParseError> {
    let mut parser = Parser {
        input: text,
        bytes: text.as_bytes(),
        pos: 0,
    };
    parser.skip_ws();
    let value = parser.parse_value(0)?;
    parser.skip_ws();
    if parser.pos != parser.bytes.len() {
        return Err(ParseError::new(parser.pos, ParseErrorKind::TrailingData));
    }
    Ok(value)
}

/// Parse raw bytes, tolerating (and skipping) a single leading UTF-8 BOM.
pub fn parse_bytes(bytes: &[u8]) -> Result<Node, ParseError> {
    let body = bytes.strip_prefix(b"\xef\xbb\xbf").unwrap_or(bytes);
    let text = std::str::from_utf8(body)
        .map_err(|e| ParseError::new(e.valid_up_to(), ParseErrorKind::InvalidUtf8))?;
    parse(text)
}

struct Parser<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn skip_ws(&mut self) {
        while let Some(&b) = self.bytes.get(self.pos) {
            match b {
                b' ' | b'\t' | b'\n' | b'\r' => self.pos += 1,
                _ => break,
            }
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn err(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(self.pos, kind)
    }

    fn parse_value(&mut self, depth: usize) -> Result<Node, ParseError> {
        if depth > MAX_DEPTH {
            return Err(self.err(ParseErrorKind::DepthExceeded));
        }
        match self.peek() {
            None => Err(self.err(ParseErrorKind::UnexpectedEof)),
            Some(b'{') => self.parse_object(depth),
            Some(b'[') => self.parse_array(depth),
            Some(b'"') => self.parse_string().map(Node::Str),
            Some(b't') => self.parse_literal("true", Node::Bool(true)),
            Some(b'f') => self.parse_literal("false", Node::Bool(false)),
            Some(b'n') => self.parse_literal("null", Node::Null),
            Some(b'-') | Some(b'0'..=b'9') => self.parse_number(),
            Some(_) => Err(self.err(ParseErrorKind::UnexpectedToken)),
        }
    }

    fn parse_literal(&mut self, literal: &'static str, value: Node) -> Result<Node, ParseError> {
        if self.input[self.pos..].starts_with(literal) {
            self.pos += literal.len();
            Ok(value)
        } else {
            Err(self.err(ParseErrorKind::UnexpectedToken))
        }
    }

    fn parse_object(&mut self, depth: usize) -> Result<Node, ParseError> {
        self.pos += 1; // consume '{'
        let mut fields = Map::new();
        self.skip_ws();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            return Ok(Node::Object(fields));
        }
        loop {
            self.skip_ws();
            if self.peek() != Some(b'"') {
                return Err(self.err(match self.peek() {
                    None => ParseErrorKind::UnexpectedEof,
                    Some(_) => ParseErrorKind::UnexpectedToken,
                }));
            }
            let key = self.parse_string()?;
            self.skip_ws();
            match self.peek() {
                Some(b':') => self.pos += 1,
                None => return Err(self.err(ParseErrorKind::UnexpectedEof)),
                Some(_) => return Err(self.err(ParseErrorKind::UnexpectedToken)),
            }
            self.skip_ws();
            let value = self.parse_value(depth + 1)?;
            if fields.insert(key.clone(), value).is_some() {
                tracing::warn!(key = %key, "duplicate object key, last occurrence wins");
            }
            self.skip_ws();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b'}') => {
                    self.pos += 1;
                    return Ok(Node::Object(fields));
                }
                None => return Err(self.err(ParseErrorKind::UnexpectedEof)),
                Some(_) => return Err(self.err(ParseErrorKind::UnexpectedToken)),
            }
        }
    }

    fn parse_array(&mut self, depth: usize) -> Result<Node, ParseError> {
        self.pos += 1; // consume '['
        let mut items = Vec::new();
        self.skip_ws();
        if self.peek() == Some(b']') {
            self.pos += 1;
            return Ok(Node::Array(items));
        }
        loop {
            self.skip_ws();
            items.push(self.parse_value(depth + 1)?);
            self.skip_ws();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b']') => {
                    self.pos += 1;
                    return Ok(Node::Array(items));
                }
                None => return Err(self.err(ParseErrorKind::UnexpectedEof)),
                Some(_) => return Err(self.err(ParseErrorKind::UnexpectedToken)),
            }
        }
    }

    fn parse_string(&mut self) -> Result<String, ParseError> {
        let open = self.pos;
        self.pos += 1; // consume '"'
        let mut out = String::new();
        let mut chunk_start = self.pos;
        loop {
            match self.peek() {
                None => return Err(ParseError::new(open, ParseErrorKind::UnterminatedString)),
                Some(b'"') => {
                    out.push_str(&self.input[chunk_start..self.pos]);
                    self.pos += 1;
                    return Ok(out);
                }
                Some(b'\\') => {
                    out.push_str(&self.input[chunk_start..self.pos]);
                    self.pos += 1;
                    self.parse_escape(&mut out)?;
                    chunk_start = self.pos;
                }
                Some(b) if b < 0x20 => {
                    return Err(self.err(ParseErrorKind::ControlCharacter));
                }
                Some(_) => {
                    // Any other byte is part of a valid UTF-8 sequence; copy
                    // it through untouched when the chunk is flushed.
                    self.pos += 1;
                }
            }
        }
    }

    fn parse_escape(&mut self, out: &mut String) -> Result<(), ParseError> {
        let escape_pos = self.pos - 1;
        let b = match self.peek() {
            None => return Err(self.err(ParseErrorKind::UnexpectedEof)),
            Some(b) => b,
        };
        self.pos += 1;
        match b {
            b'"' => out.push('"'),
            b'\\' => out.push('\\'),
            b'/' => out.push('/'),
            b'b' => out.push('\u{0008}'),
            b'f' => out.push('\u{000C}'),
            b'n' => out.push('\n'),
            b'r' => out.push('\r'),
            b't' => out.push('\t'),
            b'u' => {
                let unit = self.parse_hex4()?;
                if (0xDC00..=0xDFFF).contains(&unit) {
                    return Err(ParseError::new(escape_pos, ParseErrorKind::LoneSurrogate));
                }
                if (0xD800..=0xDBFF).contains(&unit) {
                    // High surrogate: the low half must follow immediately.
                    if self.peek() != Some(b'\\') || self.bytes.get(self.pos + 1) != Some(&b'u') {
                        return Err(ParseError::new(escape_pos, ParseErrorKind::LoneSurrogate));
                    }
                    self.pos += 2;
                    let low = self.parse_hex4()?;
                    if !(0xDC00..=0xDFFF).contains(&low) {
                        return Err(ParseError::new(escape_pos, ParseErrorKind::LoneSurrogate));
                    }
                    let combined =
                        0x10000 + ((u32::from(unit) - 0xD800) << 10) + (u32::from(low) - 0xDC00);
                    match char::from_u32(combined) {
                        Some(c) => out.push(c),
                        None => {
                            return Err(ParseError::new(escape_pos, ParseErrorKind::InvalidEscape))
                        }
                    }
                } else {
                    match char::from_u32(u32::from(unit)) {
                        Some(c) => out.push(c),
                        None => {
                            return Err(ParseError::new(escape_pos, ParseErrorKind::InvalidEscape))
                        }
                    }
                }
            }
            _ => return Err(ParseError::new(escape_pos, ParseErrorKind::InvalidEscape)),
        }
        Ok(())
    }

    fn parse_hex4(&mut self) -> Result<u16, ParseError> {
        let mut unit: u16 = 0;
        for _ in 0..4 {
            let b = match self.peek() {
                None => return Err(self.err(ParseErrorKind::UnexpectedEof)),
                Some(b) => b,
            };
            let digit = match b {
                b'0'..=b'9' => b - b'0',
                b'a'..=b'f' => b - b'a' + 10,
                b'A'..=b'F' => b - b'A' + 10,
                _ => return Err(self.err(ParseErrorKind::InvalidEscape)),
            };
            unit = (unit << 4) | u16::from(digit);
            self.pos += 1;
        }
        Ok(unit)
    }

    fn parse_number(&mut self) -> Result<Node, ParseError> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }

        // Integer part: "0" or a nonzero digit followed by digits.
        match self.peek() {
            Some(b'0') => self.pos += 1,
            Some(b'1'..=b'9') => {
                while matches!(self.peek(), Some(b'0'..=b'9')) {
                    self.pos += 1;
                }
            }
            _ => return Err(self.err(ParseErrorKind::InvalidNumber)),
        }

        let mut is_float = false;

        if self.peek() == Some(b'.') {
            is_float = true;
            self.pos += 1;
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                return Err(self.err(ParseErrorKind::InvalidNumber));
            }
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.pos += 1;
            }
        }

        if matches!(self.peek(), Some(b'e') | Some(b'E')) {
            is_float = true;
            self.pos += 1;
            if matches!(self.peek(), Some(b'+') | Some(b'-')) {
                self.pos += 1;
            }
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                return Err(self.err(ParseErrorKind::InvalidNumber));
            }
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.pos += 1;
            }
        }

        let token = &self.input[start..self.pos];

        if !is_float {
            // Plain integer literal; fall through to Float only when it
            // exceeds the i64 range.
            if let Ok(i) = token.parse::<i64>() {
                return Ok(Node::Int(i));
            }
        }

        match token.parse::<f64>() {
            Ok(f) if f.is_finite() => Ok(Node::Float(f)),
            Ok(_) => Err(ParseError::new(start, ParseErrorKind::NumberOutOfRange)),
            Err(_) => Err(ParseError::new(start, ParseErrorKind::InvalidNumber)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scalars() {
        assert_eq!(parse("null").unwrap(), Node::Null);
        assert_eq!(parse("true").unwrap(), Node::Bool(true));
        assert_eq!(parse("false").unwrap(), Node::Bool(false));
        assert_eq!(parse("42").unwrap(), Node::Int(42));
        assert_eq!(parse("-7").unwrap(), Node::Int(-7));
        assert_eq!(parse("3.5").unwrap(), Node::Float(3.5));
        assert_eq!(parse("\"hi\"").unwrap(), Node::Str("hi".into()));
    }

    #[test]
    fn test_int_float_classification() {
        // No fraction/exponent and fits i64 → Int.
        assert_eq!(
            parse("9223372036854775807").unwrap(),
            Node::Int(i64::MAX)
        );
        assert_eq!(
            parse("-9223372036854775808").unwrap(),
            Node::Int(i64::MIN)
        );
        // One past i64::MAX → Float.
        assert!(parse("9223372036854775808").unwrap().is_float());
        // Exponent forces Float even for integral values.
        assert!(parse("1e2").unwrap().is_float());
        assert!(parse("1.0").unwrap().is_float());
    }

    #[test]
    fn test_number_grammar_rejections() {
        for bad in ["01", "-", "1.", ".5", "1e", "1e+", "+1", "0x10", "1."] {
            let err = parse(bad).unwrap_err();
            assert!(
                matches!(
                    err.kind,
                    ParseErrorKind::InvalidNumber | ParseErrorKind::UnexpectedToken
                        | ParseErrorKind::TrailingData
                ),
                "{bad:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_number_out_of_range() {
        let err = parse("1e999").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::NumberOutOfRange);
    }

    #[test]
    fn test_nested_structure() {
        let node = parse(r#"{"a":{"b":[10,20,30]},"c":null}"#).unwrap();
        let obj = node.as_object().unwrap();
        let b = obj["a"].as_object().unwrap()["b"].as_array().unwrap();
        assert_eq!(b[1], Node::Int(20));
        assert!(obj["c"].is_null());
    }

    #[test]
    fn test_key_order_matches_source() {
        let node = parse(r#"{"z":1,"a":2,"m":3}"#).unwrap();
        let keys: Vec<&str> = node.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_duplicate_keys_last_wins_first_position() {
        let node = parse(r#"{"a":1,"b":2,"a":3}"#).unwrap();
        let obj = node.as_object().unwrap();
        assert_eq!(obj["a"], Node::Int(3));
        let keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_string_escapes() {
        let node = parse(r#""a\"b\\c\/d\b\f\n\r\t""#).unwrap();
        assert_eq!(
            node,
            Node::Str("a\"b\\c/d\u{8}\u{c}\n\r\t".into())
        );
    }

    #[test]
    fn test_unicode_escapes_and_surrogate_pairs() {
        assert_eq!(parse(r#""é""#).unwrap(), Node::Str("é".into()));
        // U+1F600 encodes as the surrogate pair D83D DE00.
        assert_eq!(
            parse(r#""😀""#).unwrap(),
            Node::Str("\u{1F600}".into())
        );
        // Unescaped non-ASCII passes straight through.
        assert_eq!(
            parse("\"héllo \u{1F600}\"").unwrap(),
            Node::Str("héllo \u{1F600}".into())
        );
    }

    #[test]
    fn test_lone_surrogates_rejected() {
        assert_eq!(
            parse(r#""\ud83d""#).unwrap_err().kind,
            ParseErrorKind::LoneSurrogate
        );
        assert_eq!(
            parse(r#""\ude00""#).unwrap_err().kind,
            ParseErrorKind::LoneSurrogate
        );
        assert_eq!(
            parse(r#""\ud83dx""#).unwrap_err().kind,
            ParseErrorKind::LoneSurrogate
        );
    }

    #[test]
    fn test_strictness() {
        // Trailing comma.
        assert!(parse("[1,2,]").is_err());
        assert!(parse(r#"{"a":1,}"#).is_err());
        // Comments.
        assert!(parse("// c\n1").is_err());
        assert!(parse("[1 /* c */]").is_err());
        // Non-string key.
        assert!(parse("{1:2}").is_err());
        // Single quotes.
        assert!(parse("'a'").is_err());
    }

    #[test]
    fn test_trailing_data() {
        let err = parse("1 2").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::TrailingData);
        assert_eq!(err.offset, 2);
        // Whitespace after the value is fine.
        assert!(parse("1  \r\n\t").is_ok());
    }

    #[test]
    fn test_raw_control_character_rejected() {
        let err = parse("\"a\u{0001}b\"").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::ControlCharacter);
    }

    #[test]
    fn test_depth_limit() {
        let deep_ok = format!("{}1{}", "[".repeat(MAX_DEPTH), "]".repeat(MAX_DEPTH));
        assert!(parse(&deep_ok).is_ok());

        let too_deep = format!(
            "{}1{}",
            "[".repeat(MAX_DEPTH + 1),
            "]".repeat(MAX_DEPTH + 1)
        );
        assert_eq!(
            parse(&too_deep).unwrap_err().kind,
            ParseErrorKind::DepthExceeded
        );
    }

    #[test]
    fn test_bom_tolerated_in_byte_entry_point() {
        let bytes = b"\xef\xbb\xbf{\"a\":1}";
        assert!(parse_bytes(bytes).is_ok());
        // A BOM is not whitespace for the str entry point.
        assert!(parse("\u{feff}1").is_err());
    }

    #[test]
    fn test_invalid_utf8_bytes() {
        let err = parse_bytes(b"\"\xff\"").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidUtf8);
    }

    #[test]
    fn test_error_offsets() {
        let err = parse(r#"{"a": }"#).unwrap_err();
        assert_eq!(err.offset, 6);
        let err = parse("").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedEof);
    }
}
