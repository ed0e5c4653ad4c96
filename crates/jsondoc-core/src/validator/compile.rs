//! Schema load phase: structural checks, `$ref` target resolution and
//! regex pre-compilation.
//!
//! Everything that can be rejected before seeing an instance is rejected
//! here, so `validate` never meets a malformed keyword. External `$ref`
//! targets are the deliberate exception: a schema may carry one without
//! ever exercising it, so they only surface during evaluation.

use std::collections::HashMap;

use regex::Regex;
use url::Url;

use crate::error::SchemaLoadError;
use crate::node::Node;
use crate::path::{encode_pointer_segment, Path};

/// The seven names the `type` keyword accepts.
const TYPE_NAMES: &[&str] = &[
    "null", "boolean", "integer", "number", "string", "array", "object",
];

/// A loaded, evaluation-ready schema.
#[derive(Debug)]
pub(super) struct CompiledSchema {
    pub root: Node,
    /// Compiled `pattern` regexes, keyed by the pattern text itself so a
    /// repeated pattern compiles once.
    pub patterns: HashMap<String, Regex>,
    /// Base URI from the root `$id`, used to classify relative `$ref`s.
    pub base_uri: Option<Url>,
}

/// Where a `$ref` points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum RefTarget {
    /// Internal: a pointer path into this same schema document.
    Internal(Path),
    /// External absolute URI; reported during evaluation, never followed.
    External(String),
}

/// Classify a `$ref` string against the schema's base URI.
///
/// `#` and `#/...` are internal pointers. Anything else joins against the
/// root `$id` (when present) and comes out external.
pub(super) fn classify_ref(
    reference: &str,
    base_uri: Option<&Url>,
    schema_path: &str,
) -> Result<RefTarget, SchemaLoadError> {
    if reference == "#" {
        return Ok(RefTarget::Internal(Path::root()));
    }
    if let Some(pointer) = reference.strip_prefix('#') {
        if pointer.starts_with('/') {
            let path =
                Path::parse(pointer).map_err(|_| SchemaLoadError::MalformedRef {
                    schema_path: schema_path.to_string(),
                    reference: reference.to_string(),
                })?;
            return Ok(RefTarget::Internal(path));
        }
        // `#anchor` fragments are not part of the supported subset; treat
        // them as malformed rather than silently external.
        return Err(SchemaLoadError::MalformedRef {
            schema_path: schema_path.to_string(),
            reference: reference.to_string(),
        });
    }
    let resolved = match base_uri {
        Some(base) => base
            .join(reference)
            .map(|url| url.to_string())
            .unwrap_or_else(|_| reference.to_string()),
        None => reference.to_string(),
    };
    Ok(RefTarget::External(resolved))
}

/// Walk the whole schema, checking keyword shapes, resolving internal
/// `$ref` targets and compiling every `pattern`.
pub(super) fn compile(root: &Node) -> Result<CompiledSchema, SchemaLoadError> {
    match root {
        Node::Bool(_) => {
            return Ok(CompiledSchema {
                root: root.clone(),
                patterns: HashMap::new(),
                base_uri: None,
            })
        }
        Node::Object(_) => {}
        _ => return Err(SchemaLoadError::BadRoot),
    }

    let base_uri = match root.as_object().and_then(|fields| fields.get("$id")) {
        Some(Node::Str(id)) => Url::parse(id).ok(),
        Some(_) => {
            return Err(SchemaLoadError::BadKeyword {
                schema_path: String::new(),
                keyword: "$id".to_string(),
                detail: "must be a string".to_string(),
            })
        }
        None => None,
    };

    let mut patterns = HashMap::new();
    check_subschema(root, root, "", base_uri.as_ref(), &mut patterns)?;
    tracing::debug!(patterns = patterns.len(), "schema compiled");

    Ok(CompiledSchema {
        root: root.clone(),
        patterns,
        base_uri,
    })
}

fn join(schema_path: &str, key: &str) -> String {
    format!("{schema_path}/{}", encode_pointer_segment(key))
}

/// Recursive structural check of one subschema position.
fn check_subschema(
    root: &Node,
    schema: &Node,
    schema_path: &str,
    base_uri: Option<&Url>,
    patterns: &mut HashMap<String, Regex>,
) -> Result<(), SchemaLoadError> {
    let fields = match schema {
        Node::Bool(_) => return Ok(()),
        Node::Object(fields) => fields,
        _ => {
            return Err(SchemaLoadError::BadKeyword {
                schema_path: schema_path.to_string(),
                keyword: "schema".to_string(),
                detail: format!("expected an object or boolean, got {}", schema.type_name()),
            })
        }
    };

    for (key, value) in fields {
        match key.as_str() {
            "$ref" => {
                let reference = expect_str(value, schema_path, "$ref")?;
                let ref_path = join(schema_path, "$ref");
                if let RefTarget::Internal(path) =
                    classify_ref(reference, base_uri, &ref_path)?
                {
                    if crate::path::resolve(root, &path).is_none() {
                        return Err(SchemaLoadError::UnresolvableRef {
                            schema_path: ref_path,
                            reference: reference.to_string(),
                        });
                    }
                }
            }
            "type" => check_type_keyword(value, schema_path)?,
            "pattern" => {
                let pattern = expect_str(value, schema_path, "pattern")?;
                if !patterns.contains_key(pattern) {
                    let compiled = Regex::new(pattern).map_err(|e| {
                        SchemaLoadError::BadPattern {
                            schema_path: join(schema_path, "pattern"),
                            detail: e.to_string(),
                        }
                    })?;
                    patterns.insert(pattern.to_string(), compiled);
                }
            }
            "minimum" | "maximum" | "exclusiveMinimum" | "exclusiveMaximum" => {
                if !value.is_number() {
                    return Err(bad_keyword(schema_path, key, "must be a number"));
                }
            }
            "multipleOf" => {
                let positive = value.as_f64().map(|f| f > 0.0).unwrap_or(false);
                if !positive {
                    return Err(bad_keyword(schema_path, key, "must be a positive number"));
                }
            }
            "minLength" | "maxLength" | "minItems" | "maxItems" | "minProperties"
            | "maxProperties" => {
                // An integral Float (2.0) is accepted, like 2020-12 does.
                let valid = crate::node::FromNode::from_node(value)
                    .map(|i: i64| i >= 0)
                    .unwrap_or(false);
                if !valid {
                    return Err(bad_keyword(schema_path, key, "must be a non-negative integer"));
                }
            }
            "required" => {
                let items = match value.as_array() {
                    Some(items) => items,
                    None => return Err(bad_keyword(schema_path, key, "must be an array")),
                };
                if !items.iter().all(Node::is_str) {
                    return Err(bad_keyword(schema_path, key, "entries must be strings"));
                }
            }
            "enum" => {
                if !value.is_array() {
                    return Err(bad_keyword(schema_path, key, "must be an array"));
                }
            }
            "uniqueItems" => {
                if !value.is_bool() {
                    return Err(bad_keyword(schema_path, key, "must be a boolean"));
                }
            }
            "format" => {
                expect_str(value, schema_path, "format")?;
            }
            "properties" | "$defs" => {
                let children = match value.as_object() {
                    Some(children) => children,
                    None => return Err(bad_keyword(schema_path, key, "must be an object")),
                };
                let base = join(schema_path, key);
                for (name, child) in children {
                    check_subschema(root, child, &join(&base, name), base_uri, patterns)?;
                }
            }
            "items" | "additionalProperties" | "not" => {
                check_subschema(root, value, &join(schema_path, key), base_uri, patterns)?;
            }
            "allOf" | "anyOf" | "oneOf" => {
                let branches = match value.as_array() {
                    Some(branches) => branches,
                    None => return Err(bad_keyword(schema_path, key, "must be an array")),
                };
                let base = join(schema_path, key);
                for (i, branch) in branches.iter().enumerate() {
                    check_subschema(root, branch, &join(&base, &i.to_string()), base_uri, patterns)?;
                }
            }
            // Metadata and anything unrecognised pass through untouched;
            // 2020-12 treats unknown keywords as annotations.
            _ => {}
        }
    }
    Ok(())
}

fn check_type_keyword(value: &Node, schema_path: &str) -> Result<(), SchemaLoadError> {
    let check_one = |node: &Node| -> Result<(), SchemaLoadError> {
        let name = node.as_str().unwrap_or_default();
        if node.is_str() && TYPE_NAMES.contains(&name) {
            Ok(())
        } else {
            Err(SchemaLoadError::UnknownType {
                schema_path: join(schema_path, "type"),
                value: match node.as_str() {
                    Some(s) => s.to_string(),
                    None => node.type_name().to_string(),
                },
            })
        }
    };
    match value {
        Node::Array(names) => names.iter().try_for_each(check_one),
        other => check_one(other),
    }
}

fn expect_str<'a>(
    value: &'a Node,
    schema_path: &str,
    keyword: &'static str,
) -> Result<&'a str, SchemaLoadError> {
    value
        .as_str()
        .ok_or_else(|| bad_keyword(schema_path, keyword, "must be a string"))
}

fn bad_keyword(schema_path: &str, keyword: &str, detail: &str) -> SchemaLoadError {
    SchemaLoadError::BadKeyword {
        schema_path: schema_path.to_string(),
        keyword: keyword.to_string(),
        detail: detail.to_string(),
    }
}
