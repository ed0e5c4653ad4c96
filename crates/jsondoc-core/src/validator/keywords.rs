//! Keyword evaluation: one recursive pass over (subschema, instance) pairs.
//!
//! Keywords are evaluated independently and their error records
//! concatenated; evaluation never aborts early. Applicator keywords that
//! need to observe a branch outcome (`anyOf`, `oneOf`, `not`) evaluate the
//! branch in place and split the freshly appended records back off.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use regex::Regex;

use crate::formats;
use crate::node::Node;
use crate::path::encode_pointer_segment;
use crate::validator::compile::{classify_ref, CompiledSchema, RefTarget};
use crate::validator::{Annotation, ValidationError, ValidatorOptions};

pub(super) struct EvalContext<'a> {
    pub root: &'a Node,
    pub patterns: &'a HashMap<String, Regex>,
    pub base_uri: Option<&'a url::Url>,
    pub options: &'a ValidatorOptions,
    pub errors: Vec<ValidationError>,
    pub annotations: Vec<Annotation>,
    /// `(schema_path, instance_path)` pairs currently on the `$ref` stack;
    /// revisiting one short-circuits as success.
    pub active_refs: HashSet<(String, String)>,
}

impl<'a> EvalContext<'a> {
    pub fn new(compiled: &'a CompiledSchema, options: &'a ValidatorOptions) -> Self {
        EvalContext {
            root: &compiled.root,
            patterns: &compiled.patterns,
            base_uri: compiled.base_uri.as_ref(),
            options,
            errors: Vec::new(),
            annotations: Vec::new(),
            active_refs: HashSet::new(),
        }
    }

    fn error(&mut self, instance_path: &str, schema_path: String, keyword: &str, message: String) {
        self.errors.push(ValidationError {
            instance_path: instance_path.to_string(),
            schema_path,
            keyword: keyword.to_string(),
            message,
        });
    }
}

fn join(schema_path: &str, key: &str) -> String {
    format!("{schema_path}/{}", encode_pointer_segment(key))
}

fn join_index(path: &str, index: usize) -> String {
    format!("{path}/{index}")
}

/// Evaluate one subschema against one instance location.
pub(super) fn eval(
    ctx: &mut EvalContext<'_>,
    schema: &Node,
    schema_path: &str,
    instance: &Node,
    instance_path: &str,
) {
    let fields = match schema {
        Node::Bool(true) => return,
        Node::Bool(false) => {
            ctx.error(
                instance_path,
                schema_path.to_string(),
                "schema",
                "false schema rejects every instance".to_string(),
            );
            return;
        }
        Node::Object(fields) => fields,
        // Load rejects anything else; nothing to do if it slips through.
        _ => return,
    };

    if let Some(reference) = fields.get("$ref").and_then(Node::as_str) {
        eval_ref(ctx, reference, schema_path, instance, instance_path);
    }

    if let Some(type_spec) = fields.get("type") {
        eval_type(ctx, type_spec, schema_path, instance, instance_path);
    }

    if let Some(Node::Array(allowed)) = fields.get("enum") {
        if !allowed.iter().any(|candidate| candidate == instance) {
            ctx.error(
                instance_path,
                join(schema_path, "enum"),
                "enum",
                "value is not one of the enumerated values".to_string(),
            );
        }
    }

    if let Some(expected) = fields.get("const") {
        if expected != instance {
            ctx.error(
                instance_path,
                join(schema_path, "const"),
                "const",
                "value does not equal the const value".to_string(),
            );
        }
    }

    match instance {
        Node::Str(s) => eval_string_keywords(ctx, fields, schema_path, s, instance_path),
        Node::Int(_) | Node::Float(_) => {
            eval_number_keywords(ctx, fields, schema_path, instance, instance_path)
        }
        Node::Array(items) => eval_array_keywords(ctx, fields, schema_path, items, instance_path),
        Node::Object(_) => eval_object_keywords(ctx, fields, schema_path, instance, instance_path),
        _ => {}
    }

    eval_combinators(ctx, fields, schema_path, instance, instance_path);
}

// ---------------------------------------------------------------------------
// $ref
// ---------------------------------------------------------------------------

fn eval_ref(
    ctx: &mut EvalContext<'_>,
    reference: &str,
    schema_path: &str,
    instance: &Node,
    instance_path: &str,
) {
    let ref_path = join(schema_path, "$ref");
    let target = match classify_ref(reference, ctx.base_uri, &ref_path) {
        Ok(target) => target,
        // Load already rejected malformed refs; treat a stray one as
        // unsupported rather than panicking.
        Err(_) => RefTarget::External(reference.to_string()),
    };
    match target {
        RefTarget::External(uri) => {
            ctx.error(
                instance_path,
                ref_path,
                "unsupportedRef",
                format!("external $ref {uri:?} is not resolved by this validator"),
            );
        }
        RefTarget::Internal(path) => {
            let target_schema = match crate::path::resolve(ctx.root, &path) {
                Some(node) => node,
                None => {
                    ctx.error(
                        instance_path,
                        ref_path,
                        "$ref",
                        format!("unresolvable $ref {reference:?}"),
                    );
                    return;
                }
            };
            let target_path = path.to_pointer();
            let key = (target_path.clone(), instance_path.to_string());
            if !ctx.active_refs.insert(key.clone()) {
                // Cycle: this exact (schema, instance) pair is already being
                // evaluated above us; succeed to terminate.
                tracing::debug!(schema = %target_path, instance = %instance_path, "ref cycle");
                return;
            }
            eval(ctx, target_schema, &target_path, instance, instance_path);
            ctx.active_refs.remove(&key);
        }
    }
}

// ---------------------------------------------------------------------------
// type / per-variant keywords
// ---------------------------------------------------------------------------

fn type_matches(name: &str, instance: &Node) -> bool {
    match name {
        "integer" => instance.is_int(),
        "number" => instance.is_number(),
        other => other == instance.type_name(),
    }
}

fn eval_type(
    ctx: &mut EvalContext<'_>,
    type_spec: &Node,
    schema_path: &str,
    instance: &Node,
    instance_path: &str,
) {
    let matched = match type_spec {
        Node::Str(name) => type_matches(name, instance),
        Node::Array(names) => names
            .iter()
            .filter_map(Node::as_str)
            .any(|name| type_matches(name, instance)),
        _ => true,
    };
    if !matched {
        let expected = match type_spec {
            Node::Str(name) => name.clone(),
            Node::Array(names) => names
                .iter()
                .filter_map(Node::as_str)
                .collect::<Vec<_>>()
                .join(" or "),
            _ => String::new(),
        };
        ctx.error(
            instance_path,
            join(schema_path, "type"),
            "type",
            format!("expected {expected}, got {}", instance.type_name()),
        );
    }
}

fn eval_string_keywords(
    ctx: &mut EvalContext<'_>,
    fields: &crate::node::Map,
    schema_path: &str,
    value: &str,
    instance_path: &str,
) {
    // Lengths count Unicode scalar values, not bytes.
    let length = value.chars().count();

    if let Some(min) = fields.get("minLength").and_then(Node::as_f64) {
        if (length as f64) < min {
            ctx.error(
                instance_path,
                join(schema_path, "minLength"),
                "minLength",
                format!("string has {length} characters, minimum is {min}"),
            );
        }
    }
    if let Some(max) = fields.get("maxLength").and_then(Node::as_f64) {
        if (length as f64) > max {
            ctx.error(
                instance_path,
                join(schema_path, "maxLength"),
                "maxLength",
                format!("string has {length} characters, maximum is {max}"),
            );
        }
    }

    if let Some(pattern) = fields.get("pattern").and_then(Node::as_str) {
        match ctx.patterns.get(pattern) {
            Some(regex) => {
                if !regex.is_match(value) {
                    ctx.error(
                        instance_path,
                        join(schema_path, "pattern"),
                        "pattern",
                        format!("string does not match pattern {pattern:?}"),
                    );
                }
            }
            None => {
                tracing::warn!(pattern, "pattern missing from compiled cache");
            }
        }
    }

    if let Some(format) = fields.get("format").and_then(Node::as_str) {
        let format_path = join(schema_path, "format");
        if !ctx.options.check_formats {
            ctx.annotations.push(Annotation {
                instance_path: instance_path.to_string(),
                schema_path: format_path,
                keyword: "format".to_string(),
                detail: format!("format {format:?} not evaluated (checking disabled)"),
            });
        } else {
            match formats::check(format, value) {
                Some(true) => {}
                Some(false) => {
                    ctx.error(
                        instance_path,
                        format_path,
                        "format",
                        format!("string is not a valid {format}"),
                    );
                }
                None => {
                    ctx.annotations.push(Annotation {
                        instance_path: instance_path.to_string(),
                        schema_path: format_path,
                        keyword: "format".to_string(),
                        detail: format!("unknown format {format:?}"),
                    });
                }
            }
        }
    }
}

fn num_cmp(instance: &Node, bound: &Node) -> Option<Ordering> {
    match (instance, bound) {
        (Node::Int(a), Node::Int(b)) => Some(a.cmp(b)),
        _ => instance.as_f64()?.partial_cmp(&bound.as_f64()?),
    }
}

fn eval_number_keywords(
    ctx: &mut EvalContext<'_>,
    fields: &crate::node::Map,
    schema_path: &str,
    instance: &Node,
    instance_path: &str,
) {
    let checks: [(&str, fn(Ordering) -> bool, &str); 4] = [
        ("minimum", |o| o == Ordering::Less, "less than the minimum"),
        (
            "exclusiveMinimum",
            |o| o != Ordering::Greater,
            "not greater than the exclusive minimum",
        ),
        ("maximum", |o| o == Ordering::Greater, "greater than the maximum"),
        (
            "exclusiveMaximum",
            |o| o != Ordering::Less,
            "not less than the exclusive maximum",
        ),
    ];
    for (keyword, violates, description) in checks {
        if let Some(bound) = fields.get(keyword) {
            if let Some(ordering) = num_cmp(instance, bound) {
                if violates(ordering) {
                    ctx.error(
                        instance_path,
                        join(schema_path, keyword),
                        keyword,
                        format!("value is {description}"),
                    );
                }
            }
        }
    }

    if let Some(divisor) = fields.get("multipleOf") {
        let multiple = match (instance, divisor) {
            // Exact arithmetic when both sides are integers.
            (Node::Int(value), Node::Int(step)) if *step != 0 => value % step == 0,
            _ => match (instance.as_f64(), divisor.as_f64()) {
                (Some(value), Some(step)) if step != 0.0 => (value / step).fract() == 0.0,
                _ => true,
            },
        };
        if !multiple {
            ctx.error(
                instance_path,
                join(schema_path, "multipleOf"),
                "multipleOf",
                "value is not a multiple of the divisor".to_string(),
            );
        }
    }
}

fn eval_array_keywords(
    ctx: &mut EvalContext<'_>,
    fields: &crate::node::Map,
    schema_path: &str,
    items: &[Node],
    instance_path: &str,
) {
    if let Some(item_schema) = fields.get("items") {
        let item_schema_path = join(schema_path, "items");
        for (i, item) in items.iter().enumerate() {
            eval(
                ctx,
                item_schema,
                &item_schema_path,
                item,
                &join_index(instance_path, i),
            );
        }
    }

    if let Some(min) = fields.get("minItems").and_then(Node::as_f64) {
        if (items.len() as f64) < min {
            ctx.error(
                instance_path,
                join(schema_path, "minItems"),
                "minItems",
                format!("array has {} items, minimum is {min}", items.len()),
            );
        }
    }
    if let Some(max) = fields.get("maxItems").and_then(Node::as_f64) {
        if (items.len() as f64) > max {
            ctx.error(
                instance_path,
                join(schema_path, "maxItems"),
                "maxItems",
                format!("array has {} items, maximum is {max}", items.len()),
            );
        }
    }

    if fields.get("uniqueItems").and_then(Node::as_bool) == Some(true) {
        'outer: for i in 0..items.len() {
            for j in (i + 1)..items.len() {
                if items[i] == items[j] {
                    ctx.error(
                        instance_path,
                        join(schema_path, "uniqueItems"),
                        "uniqueItems",
                        format!("items {i} and {j} are equal"),
                    );
                    break 'outer;
                }
            }
        }
    }
}

fn eval_object_keywords(
    ctx: &mut EvalContext<'_>,
    fields: &crate::node::Map,
    schema_path: &str,
    instance: &Node,
    instance_path: &str,
) {
    let object = match instance.as_object() {
        Some(object) => object,
        None => return,
    };

    let property_schemas = fields.get("properties").and_then(Node::as_object);

    if let Some(schemas) = property_schemas {
        let properties_path = join(schema_path, "properties");
        for (key, subschema) in schemas {
            if let Some(child) = object.get(key) {
                eval(
                    ctx,
                    subschema,
                    &join(&properties_path, key),
                    child,
                    &join(instance_path, key),
                );
            }
        }
    }

    if let Some(Node::Array(required)) = fields.get("required") {
        for key in required.iter().filter_map(Node::as_str) {
            // Presence is what counts; an explicit null satisfies required.
            if !object.contains_key(key) {
                ctx.error(
                    instance_path,
                    join(schema_path, "required"),
                    "required",
                    format!("missing required property {key:?}"),
                );
            }
        }
    }

    if let Some(additional) = fields.get("additionalProperties") {
        let additional_path = join(schema_path, "additionalProperties");
        for (key, child) in object {
            let declared = property_schemas
                .map(|schemas| schemas.contains_key(key))
                .unwrap_or(false);
            if declared {
                continue;
            }
            match additional {
                Node::Bool(false) => {
                    ctx.error(
                        &join(instance_path, key),
                        additional_path.clone(),
                        "additionalProperties",
                        format!("property {key:?} is not allowed"),
                    );
                }
                Node::Bool(true) => {}
                subschema => {
                    eval(
                        ctx,
                        subschema,
                        &additional_path,
                        child,
                        &join(instance_path, key),
                    );
                }
            }
        }
    }

    if let Some(min) = fields.get("minProperties").and_then(Node::as_f64) {
        if (object.len() as f64) < min {
            ctx.error(
                instance_path,
                join(schema_path, "minProperties"),
                "minProperties",
                format!("object has {} properties, minimum is {min}", object.len()),
            );
        }
    }
    if let Some(max) = fields.get("maxProperties").and_then(Node::as_f64) {
        if (object.len() as f64) > max {
            ctx.error(
                instance_path,
                join(schema_path, "maxProperties"),
                "maxProperties",
                format!("object has {} properties, maximum is {max}", object.len()),
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Combinators
// ---------------------------------------------------------------------------

/// Evaluate a branch and carve its records back out of the context, so the
/// caller decides whether they are reported.
fn eval_branch(
    ctx: &mut EvalContext<'_>,
    schema: &Node,
    schema_path: &str,
    instance: &Node,
    instance_path: &str,
) -> (Vec<ValidationError>, Vec<Annotation>) {
    let errors_before = ctx.errors.len();
    let annotations_before = ctx.annotations.len();
    eval(ctx, schema, schema_path, instance, instance_path);
    (
        ctx.errors.split_off(errors_before),
        ctx.annotations.split_off(annotations_before),
    )
}

fn eval_combinators(
    ctx: &mut EvalContext<'_>,
    fields: &crate::node::Map,
    schema_path: &str,
    instance: &Node,
    instance_path: &str,
) {
    if let Some(Node::Array(branches)) = fields.get("allOf") {
        let all_of_path = join(schema_path, "allOf");
        for (i, branch) in branches.iter().enumerate() {
            // Branch errors are real errors; no suppression for allOf.
            eval(
                ctx,
                branch,
                &join_index(&all_of_path, i),
                instance,
                instance_path,
            );
        }
    }

    if let Some(Node::Array(branches)) = fields.get("anyOf") {
        let any_of_path = join(schema_path, "anyOf");
        let mut failed: Vec<ValidationError> = Vec::new();
        let mut matched = false;
        for (i, branch) in branches.iter().enumerate() {
            let (errors, annotations) = eval_branch(
                ctx,
                branch,
                &join_index(&any_of_path, i),
                instance,
                instance_path,
            );
            if errors.is_empty() {
                matched = true;
                ctx.annotations.extend(annotations);
                break;
            }
            failed.extend(errors);
        }
        if !matched {
            ctx.errors.extend(failed);
            ctx.error(
                instance_path,
                any_of_path,
                "anyOf",
                "no subschema matched".to_string(),
            );
        }
    }

    if let Some(Node::Array(branches)) = fields.get("oneOf") {
        let one_of_path = join(schema_path, "oneOf");
        let mut failed: Vec<ValidationError> = Vec::new();
        let mut matches = 0usize;
        for (i, branch) in branches.iter().enumerate() {
            let (errors, _) = eval_branch(
                ctx,
                branch,
                &join_index(&one_of_path, i),
                instance,
                instance_path,
            );
            if errors.is_empty() {
                matches += 1;
            } else {
                failed.extend(errors);
            }
        }
        if matches != 1 {
            if matches == 0 {
                ctx.errors.extend(failed);
            }
            ctx.error(
                instance_path,
                one_of_path,
                "oneOf",
                format!("expected exactly one subschema to match, {matches} matched"),
            );
        }
    }

    if let Some(negated) = fields.get("not") {
        let not_path = join(schema_path, "not");
        let (errors, _) = eval_branch(ctx, negated, &not_path, instance, instance_path);
        if errors.is_empty() {
            ctx.error(
                instance_path,
                not_path,
                "not",
                "instance matches the negated subschema".to_string(),
            );
        }
    }
}
