//! Schema inference: synthesise a JSON Schema 2020-12 document from one or
//! more sample documents.
//!
//! Inference is unification over the samples observed at each position:
//! observed variants become `type`, object keys union into `properties`
//! (required iff present in every sample), array elements unify into one
//! `items` subschema. Format and bound inference are opt-in.
//!
//! The produced schema always accepts every sample it was inferred from;
//! the test suite feeds the result back through the validator to hold that
//! line.

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::formats;
use crate::node::{Map, Node};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Inference configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct InferencerOptions {
    /// Detect string formats (uuid, email, date-time, ...) and emit
    /// `format` when every non-empty sample string agrees on one.
    pub infer_formats: bool,
    /// Emit tightest-bound constraints: `minimum`/`maximum`,
    /// `minLength`/`maxLength`, `minItems`/`maxItems`,
    /// `minProperties`/`maxProperties`.
    pub infer_constraints: bool,
    /// Root `title` keyword.
    pub title: Option<String>,
    /// Root `description` keyword.
    pub description: Option<String>,
    /// Root `$id` keyword.
    pub id: Option<String>,
}

const SCHEMA_URI: &str = "https://json-schema.org/draft/2020-12/schema";

// ---------------------------------------------------------------------------
// Inferencer
// ---------------------------------------------------------------------------

/// Unification-based schema synthesiser.
#[derive(Debug, Clone, Default)]
pub struct SchemaInferencer {
    options: InferencerOptions,
}

impl SchemaInferencer {
    pub fn new() -> Self {
        SchemaInferencer::default()
    }

    pub fn with_options(options: InferencerOptions) -> Self {
        SchemaInferencer { options }
    }

    /// Infer a schema from a single sample.
    pub fn infer(&self, sample: &Document) -> Document {
        self.assemble(self.unify(&[sample.root()]))
    }

    /// Infer a schema accepting every sample. `None` for an empty slice
    /// (there is nothing to generalise from).
    pub fn infer_samples(&self, samples: &[Document]) -> Option<Document> {
        if samples.is_empty() {
            return None;
        }
        tracing::debug!(samples = samples.len(), "inferring schema");
        let roots: Vec<&Node> = samples.iter().map(Document::root).collect();
        Some(self.assemble(self.unify(&roots)))
    }

    /// Wrap the unified body with the metadata keywords.
    fn assemble(&self, body: Map) -> Document {
        let mut root = Map::new();
        root.insert("$schema".to_string(), Node::Str(SCHEMA_URI.to_string()));
        if let Some(id) = &self.options.id {
            root.insert("$id".to_string(), Node::Str(id.clone()));
        }
        if let Some(title) = &self.options.title {
            root.insert("title".to_string(), Node::Str(title.clone()));
        }
        if let Some(description) = &self.options.description {
            root.insert("description".to_string(), Node::Str(description.clone()));
        }
        for (key, value) in body {
            root.insert(key, value);
        }
        Document::from_node(Node::Object(root))
    }

    // -- unification --------------------------------------------------------

    /// Unify the samples observed at one position into a schema object.
    fn unify(&self, samples: &[&Node]) -> Map {
        let mut schema = Map::new();

        // 1. Observed variants, in observation order.
        let mut type_names: Vec<&'static str> = Vec::new();
        for sample in samples {
            let name = sample.type_name();
            if !type_names.contains(&name) {
                type_names.push(name);
            }
        }
        match type_names.as_slice() {
            [] => {}
            [single] => {
                schema.insert("type".to_string(), Node::Str(single.to_string()));
            }
            many => {
                let names = many
                    .iter()
                    .map(|name| Node::Str(name.to_string()))
                    .collect();
                schema.insert("type".to_string(), Node::Array(names));
            }
        }

        // 2. String format detection.
        if self.options.infer_formats {
            if let Some(format) = detect_common_format(samples) {
                schema.insert("format".to_string(), Node::Str(format.to_string()));
            }
        }

        // 3. Constraints on scalars.
        if self.options.infer_constraints {
            self.infer_number_bounds(samples, &mut schema);
            self.infer_string_bounds(samples, &mut schema);
        }

        // 4. Objects: union of keys, required = intersection.
        let objects: Vec<&Map> = samples.iter().filter_map(|s| s.as_object()).collect();
        if !objects.is_empty() {
            let mut properties = Map::new();
            let mut key_order: Vec<&String> = Vec::new();
            for object in &objects {
                for key in object.keys() {
                    if !key_order.contains(&key) {
                        key_order.push(key);
                    }
                }
            }
            for key in &key_order {
                let present: Vec<&Node> = objects
                    .iter()
                    .filter_map(|object| object.get(key.as_str()))
                    .collect();
                properties.insert(key.to_string(), Node::Object(self.unify(&present)));
            }
            let required: Vec<Node> = key_order
                .iter()
                .filter(|key| objects.iter().all(|object| object.contains_key(key.as_str())))
                .map(|key| Node::Str(key.to_string()))
                .collect();

            schema.insert("properties".to_string(), Node::Object(properties));
            if !required.is_empty() {
                schema.insert("required".to_string(), Node::Array(required));
            }
            if self.options.infer_constraints {
                if let Some((min, max)) = min_max(objects.iter().map(|object| object.len())) {
                    schema.insert("minProperties".to_string(), Node::Int(min as i64));
                    schema.insert("maxProperties".to_string(), Node::Int(max as i64));
                }
            }
        }

        // 5. Arrays: one items subschema unifying every element.
        let arrays: Vec<&Vec<Node>> = samples.iter().filter_map(|s| s.as_array()).collect();
        if !arrays.is_empty() {
            let elements: Vec<&Node> = arrays.iter().flat_map(|items| items.iter()).collect();
            if !elements.is_empty() {
                schema.insert("items".to_string(), Node::Object(self.unify(&elements)));
            }
            if self.options.infer_constraints {
                if let Some((min, max)) = min_max(arrays.iter().map(|items| items.len())) {
                    schema.insert("minItems".to_string(), Node::Int(min as i64));
                    schema.insert("maxItems".to_string(), Node::Int(max as i64));
                }
            }
        }

        schema
    }

    fn infer_number_bounds(&self, samples: &[&Node], schema: &mut Map) {
        let numbers: Vec<&Node> = samples.iter().copied().filter(|s| s.is_number()).collect();
        if numbers.is_empty() {
            return;
        }
        let all_int = numbers.iter().all(|n| n.is_int());
        if all_int {
            if let Some((min, max)) = min_max(numbers.iter().filter_map(|n| n.as_i64())) {
                schema.insert("minimum".to_string(), Node::Int(min));
                schema.insert("maximum".to_string(), Node::Int(max));
            }
        } else {
            let values: Vec<f64> = numbers.iter().filter_map(|n| n.as_f64()).collect();
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            schema.insert("minimum".to_string(), Node::Float(min));
            schema.insert("maximum".to_string(), Node::Float(max));
        }
    }

    fn infer_string_bounds(&self, samples: &[&Node], schema: &mut Map) {
        let lengths: Vec<usize> = samples
            .iter()
            .filter_map(|s| s.as_str())
            .map(|s| s.chars().count())
            .collect();
        if let Some((min, max)) = min_max(lengths.into_iter()) {
            schema.insert("minLength".to_string(), Node::Int(min as i64));
            schema.insert("maxLength".to_string(), Node::Int(max as i64));
        }
    }
}

/// The first format in detection order that every non-empty string sample
/// matches, when there is at least one non-empty string.
fn detect_common_format(samples: &[&Node]) -> Option<&'static str> {
    let strings: Vec<&str> = samples
        .iter()
        .filter_map(|s| s.as_str())
        .filter(|s| !s.is_empty())
        .collect();
    if strings.is_empty() {
        return None;
    }
    formats::DETECTION_ORDER.iter().copied().find(|format| {
        strings
            .iter()
            .all(|value| formats::check(format, value) == Some(true))
    })
}

fn min_max<I: Iterator<Item = T>, T: Ord + Copy>(mut values: I) -> Option<(T, T)> {
    let first = values.next()?;
    Some(values.fold((first, first), |(min, max), v| (min.min(v), max.max(v))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> Document {
        Document::from_string(text).unwrap()
    }

    fn infer_default(text: &str) -> Document {
        SchemaInferencer::new().infer(&doc(text))
    }

    #[test]
    fn test_scalar_types() {
        assert_eq!(
            infer_default("\"hello\"").get::<String>("/type").as_deref(),
            Some("string")
        );
        assert_eq!(
            infer_default("42").get::<String>("/type").as_deref(),
            Some("integer")
        );
        assert_eq!(
            infer_default("3.14").get::<String>("/type").as_deref(),
            Some("number")
        );
        assert_eq!(
            infer_default("true").get::<String>("/type").as_deref(),
            Some("boolean")
        );
        assert_eq!(
            infer_default("null").get::<String>("/type").as_deref(),
            Some("null")
        );
        assert_eq!(
            infer_default("[1,2]").get::<String>("/type").as_deref(),
            Some("array")
        );
        assert_eq!(
            infer_default("{}").get::<String>("/type").as_deref(),
            Some("object")
        );
    }

    #[test]
    fn test_schema_uri_always_present() {
        let schema = infer_default("1");
        assert_eq!(
            schema.get::<String>("/$schema").as_deref(),
            Some(SCHEMA_URI)
        );
    }

    #[test]
    fn test_metadata_keywords() {
        let inferencer = SchemaInferencer::with_options(InferencerOptions {
            title: Some("User".to_string()),
            description: Some("A user record".to_string()),
            id: Some("https://example.com/user.json".to_string()),
            ..InferencerOptions::default()
        });
        let schema = inferencer.infer(&doc(r#"{"a":1}"#));
        assert_eq!(schema.get::<String>("/title").as_deref(), Some("User"));
        assert_eq!(
            schema.get::<String>("/description").as_deref(),
            Some("A user record")
        );
        assert_eq!(
            schema.get::<String>("/$id").as_deref(),
            Some("https://example.com/user.json")
        );
    }

    #[test]
    fn test_object_properties_and_required() {
        let schema = infer_default(r#"{"name":"Alice","age":30}"#);
        assert_eq!(
            schema.get::<String>("/properties/name/type").as_deref(),
            Some("string")
        );
        assert_eq!(
            schema.get::<String>("/properties/age/type").as_deref(),
            Some("integer")
        );
        // Single sample: every key is required, in property order.
        assert_eq!(
            schema.get_node("/required"),
            Some(&Node::Array(vec![
                Node::Str("name".into()),
                Node::Str("age".into())
            ]))
        );
    }

    #[test]
    fn test_required_is_intersection_across_samples() {
        let samples = [doc(r#"{"name":"A","age":1}"#), doc(r#"{"name":"B"}"#)];
        let schema = SchemaInferencer::new().infer_samples(&samples).unwrap();
        assert_eq!(
            schema.get::<String>("/properties/name/type").as_deref(),
            Some("string")
        );
        assert_eq!(
            schema.get::<String>("/properties/age/type").as_deref(),
            Some("integer")
        );
        assert_eq!(
            schema.get_node("/required"),
            Some(&Node::Array(vec![Node::Str("name".into())]))
        );
    }

    #[test]
    fn test_property_order_follows_first_sample() {
        let samples = [
            doc(r#"{"b":1,"a":2}"#),
            doc(r#"{"c":3,"a":4}"#),
        ];
        let schema = SchemaInferencer::new().infer_samples(&samples).unwrap();
        let keys: Vec<String> = schema
            .object_view("/properties")
            .unwrap()
            .map(|(k, _)| k.to_string())
            .collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_mixed_types_become_a_type_array() {
        let samples = [doc("1"), doc("\"one\"")];
        let schema = SchemaInferencer::new().infer_samples(&samples).unwrap();
        assert_eq!(
            schema.get_node("/type"),
            Some(&Node::Array(vec![
                Node::Str("integer".into()),
                Node::Str("string".into())
            ]))
        );
    }

    #[test]
    fn test_array_items_unify_all_elements() {
        let schema = infer_default(r#"[1, 2.5, 3]"#);
        assert_eq!(
            schema.get_node("/items/type"),
            Some(&Node::Array(vec![
                Node::Str("integer".into()),
                Node::Str("number".into())
            ]))
        );
        // Empty arrays get no items keyword.
        let schema = infer_default("[]");
        assert!(!schema.contains("/items"));
    }

    #[test]
    fn test_format_inference() {
        let inferencer = SchemaInferencer::with_options(InferencerOptions {
            infer_formats: true,
            ..InferencerOptions::default()
        });
        let schema = inferencer.infer(&doc(
            r#"{"email":"a@b.co","id":"550e8400-e29b-41d4-a716-446655440000"}"#,
        ));
        assert_eq!(
            schema.get::<String>("/properties/email/format").as_deref(),
            Some("email")
        );
        assert_eq!(
            schema.get::<String>("/properties/id/format").as_deref(),
            Some("uuid")
        );
        // Plain strings get no format.
        let schema = inferencer.infer(&doc(r#"{"note":"just words, honestly"}"#));
        assert!(!schema.contains("/properties/note/format"));
    }

    #[test]
    fn test_format_requires_agreement() {
        let inferencer = SchemaInferencer::with_options(InferencerOptions {
            infer_formats: true,
            ..InferencerOptions::default()
        });
        let samples = [doc(r#""a@b.co""#), doc(r#""not an email!?""#)];
        let schema = inferencer.infer_samples(&samples).unwrap();
        assert!(!schema.contains("/format"));
    }

    #[test]
    fn test_constraint_inference() {
        let inferencer = SchemaInferencer::with_options(InferencerOptions {
            infer_constraints: true,
            ..InferencerOptions::default()
        });
        let samples = [
            doc(r#"{"n":3,"s":"abc","xs":[1,2]}"#),
            doc(r#"{"n":10,"s":"a","xs":[1,2,3,4]}"#),
        ];
        let schema = inferencer.infer_samples(&samples).unwrap();
        assert_eq!(schema.get::<i64>("/properties/n/minimum"), Some(3));
        assert_eq!(schema.get::<i64>("/properties/n/maximum"), Some(10));
        assert_eq!(schema.get::<i64>("/properties/s/minLength"), Some(1));
        assert_eq!(schema.get::<i64>("/properties/s/maxLength"), Some(3));
        assert_eq!(schema.get::<i64>("/properties/xs/minItems"), Some(2));
        assert_eq!(schema.get::<i64>("/properties/xs/maxItems"), Some(4));
        assert_eq!(schema.get::<i64>("/minProperties"), Some(3));
        assert_eq!(schema.get::<i64>("/maxProperties"), Some(3));
    }

    #[test]
    fn test_float_bounds_when_types_mix() {
        let inferencer = SchemaInferencer::with_options(InferencerOptions {
            infer_constraints: true,
            ..InferencerOptions::default()
        });
        let samples = [doc("1"), doc("2.5")];
        let schema = inferencer.infer_samples(&samples).unwrap();
        assert!(schema.is::<f64>("/minimum"));
        assert_eq!(schema.get::<f64>("/minimum"), Some(1.0));
        assert_eq!(schema.get::<f64>("/maximum"), Some(2.5));
    }

    #[test]
    fn test_empty_sample_set() {
        assert!(SchemaInferencer::new().infer_samples(&[]).is_none());
    }

    #[test]
    fn test_nested_objects_recurse() {
        let schema = infer_default(r#"{"user":{"name":"Ada","tags":["x"]}}"#);
        assert_eq!(
            schema
                .get::<String>("/properties/user/properties/name/type")
                .as_deref(),
            Some("string")
        );
        assert_eq!(
            schema
                .get::<String>("/properties/user/properties/tags/items/type")
                .as_deref(),
            Some("string")
        );
    }
}
