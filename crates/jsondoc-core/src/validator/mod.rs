//! JSON Schema 2020-12 validation (the subset in this crate's vocabulary).
//!
//! A [`SchemaValidator`] is loaded once with a schema document and then
//! validates any number of instances; `validate` is `&self` and allocates
//! only the result. Load-time defects (bad `$ref` targets, unparseable
//! patterns, malformed keyword operands) surface as [`SchemaLoadError`]
//! before any instance is seen. Validation itself never fails as control
//! flow: every violated keyword becomes one [`ValidationError`] record in
//! the result.

mod compile;
mod keywords;

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::{ParseError, SchemaLoadError};

use compile::CompiledSchema;
use keywords::EvalContext;

// ---------------------------------------------------------------------------
// Options and result types
// ---------------------------------------------------------------------------

/// Validator configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ValidatorOptions {
    /// Evaluate the `format` keyword against the built-in format table.
    /// Off by default; when off, `format` only produces annotations.
    pub check_formats: bool,
}

/// One failed keyword invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    /// Pointer-syntax location in the instance document.
    pub instance_path: String,
    /// Pointer-syntax location in the schema document.
    pub schema_path: String,
    /// The keyword that failed (`"unsupportedRef"` for external `$ref`s).
    pub keyword: String,
    /// Human-readable explanation.
    pub message: String,
}

/// Non-error observations (unknown formats, disabled format checks).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub instance_path: String,
    pub schema_path: String,
    pub keyword: String,
    pub detail: String,
}

/// Outcome of validating one instance.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationResult {
    errors: Vec<ValidationError>,
    annotations: Vec<Annotation>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// One line per error, for logs and CLI-style reporting.
    pub fn error_summary(&self) -> String {
        let mut out = String::new();
        for error in &self.errors {
            let at = if error.instance_path.is_empty() {
                "/"
            } else {
                error.instance_path.as_str()
            };
            let rule = if error.schema_path.is_empty() {
                "/"
            } else {
                error.schema_path.as_str()
            };
            out.push_str(&format!(
                "{at}: {} [{} at {rule}]\n",
                error.message, error.keyword
            ));
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Validator
// ---------------------------------------------------------------------------

/// A reusable validator: load once, validate many.
#[derive(Debug, Default)]
pub struct SchemaValidator {
    options: ValidatorOptions,
    compiled: Option<CompiledSchema>,
    last_error: Option<SchemaLoadError>,
}

impl SchemaValidator {
    pub fn new() -> Self {
        SchemaValidator::default()
    }

    pub fn with_options(options: ValidatorOptions) -> Self {
        SchemaValidator {
            options,
            ..SchemaValidator::default()
        }
    }

    /// Load and compile a schema document. On failure the validator keeps no
    /// schema and remembers the error for [`SchemaValidator::last_load_error`].
    pub fn load(&mut self, schema: &Document) -> Result<(), SchemaLoadError> {
        match compile::compile(schema.root()) {
            Ok(compiled) => {
                self.compiled = Some(compiled);
                self.last_error = None;
                Ok(())
            }
            Err(error) => {
                self.compiled = None;
                self.last_error = Some(error.clone());
                Err(error)
            }
        }
    }

    /// Parse a schema text and load it.
    pub fn load_str(&mut self, text: &str) -> Result<(), SchemaLoadError> {
        let doc = Document::from_string(text).map_err(|e| {
            let error = SchemaLoadError::from(e);
            self.compiled = None;
            self.last_error = Some(error.clone());
            error
        })?;
        self.load(&doc)
    }

    /// Whether a schema is currently loaded and ready.
    pub fn has_schema(&self) -> bool {
        self.compiled.is_some()
    }

    /// The defect from the most recent failed load, if any.
    pub fn last_load_error(&self) -> Option<&SchemaLoadError> {
        self.last_error.as_ref()
    }

    /// Validate one instance against the loaded schema.
    ///
    /// Without a loaded schema the result carries a single `schema` error.
    pub fn validate(&self, instance: &Document) -> ValidationResult {
        let compiled = match &self.compiled {
            Some(compiled) => compiled,
            None => {
                return ValidationResult {
                    errors: vec![ValidationError {
                        instance_path: String::new(),
                        schema_path: String::new(),
                        keyword: "schema".to_string(),
                        message: "no schema loaded".to_string(),
                    }],
                    annotations: Vec::new(),
                }
            }
        };
        let mut ctx = EvalContext::new(compiled, &self.options);
        keywords::eval(&mut ctx, &compiled.root, "", instance.root(), "");
        tracing::debug!(errors = ctx.errors.len(), "instance validated");
        ValidationResult {
            errors: ctx.errors,
            annotations: ctx.annotations,
        }
    }
}

impl From<ParseError> for SchemaLoadError {
    fn from(error: ParseError) -> Self {
        SchemaLoadError::BadKeyword {
            schema_path: String::new(),
            keyword: "schema".to_string(),
            detail: format!("schema text does not parse: {error}"),
        }
    }
}
