//! Backward-compatibility checks for the window wire record
//!
//! Consumers written against the legacy record read nine fields by name and type.
//! Newer fields may be appended; removing or retyping a legacy field breaks them.

use crate::models::Window;
use crate::Result;
use serde_json::{Map, Value};
use std::fmt;

/// JSON value shapes the legacy consumers rely on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
    Unsigned,
    Boolean,
}

impl FieldType {
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::Unsigned => value.is_u64(),
            FieldType::Boolean => value.is_boolean(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::String => "string",
            FieldType::Integer => "int",
            FieldType::Unsigned => "uint",
            FieldType::Boolean => "bool",
        };
        f.write_str(name)
    }
}

/// Field names and types of the original window record, in wire order
pub const LEGACY_WINDOW_FIELDS: &[(&str, FieldType)] = &[
    ("handle", FieldType::String),
    ("title", FieldType::String),
    ("x", FieldType::Integer),
    ("y", FieldType::Integer),
    ("width", FieldType::Unsigned),
    ("height", FieldType::Unsigned),
    ("isVisible", FieldType::Boolean),
    ("processId", FieldType::Unsigned),
    ("ownerName", FieldType::String),
];

/// Outcome of checking one or more records
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompatibilityReport {
    pub records_checked: usize,
    pub missing_fields: Vec<String>,
    pub retyped_fields: Vec<String>,
    pub added_fields: Vec<String>,
    pub errors: Vec<String>,
}

impl CompatibilityReport {
    pub fn is_compatible(&self) -> bool {
        self.errors.is_empty()
    }

    fn merge(&mut self, other: CompatibilityReport) {
        self.records_checked += other.records_checked;
        self.errors.extend(other.errors);
        for field in other.missing_fields {
            push_unique(&mut self.missing_fields, field);
        }
        for field in other.retyped_fields {
            push_unique(&mut self.retyped_fields, field);
        }
        for field in other.added_fields {
            push_unique(&mut self.added_fields, field);
        }
    }
}

impl fmt::Display for CompatibilityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Compatibility report")?;
        writeln!(f, "  Records checked: {}", self.records_checked)?;
        writeln!(
            f,
            "  Status: {}",
            if self.is_compatible() {
                "COMPATIBLE"
            } else {
                "INCOMPATIBLE"
            }
        )?;
        if !self.added_fields.is_empty() {
            writeln!(f, "  Added fields: {}", self.added_fields.join(", "))?;
        }
        for error in &self.errors {
            writeln!(f, "  Error: {}", error)?;
        }
        Ok(())
    }
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}

/// Checks serialized records against [`LEGACY_WINDOW_FIELDS`]
#[derive(Debug, Default, Clone, Copy)]
pub struct CompatibilityValidator;

impl CompatibilityValidator {
    pub fn new() -> Self {
        Self
    }

    /// Check a single serialized window record
    pub fn validate_record(&self, record: &Value) -> CompatibilityReport {
        let mut report = CompatibilityReport {
            records_checked: 1,
            ..CompatibilityReport::default()
        };

        let Some(object) = record.as_object() else {
            report.errors.push("record is not a JSON object".to_string());
            return report;
        };

        for (name, expected) in LEGACY_WINDOW_FIELDS {
            match object.get(*name) {
                None => {
                    report.missing_fields.push(name.to_string());
                    report
                        .errors
                        .push(format!("missing legacy field '{}'", name));
                }
                Some(value) if !expected.accepts(value) => {
                    report.retyped_fields.push(name.to_string());
                    report.errors.push(format!(
                        "legacy field '{}' should be {} but found {}",
                        name,
                        expected,
                        json_type_name(value)
                    ));
                }
                Some(_) => {}
            }
        }

        report.added_fields = added_fields(object);
        report
    }

    /// Serialize `window` and check the result
    pub fn validate_window(&self, window: &Window) -> Result<CompatibilityReport> {
        Ok(self.validate_record(&window.to_wire()?))
    }

    /// Check every record in the `windows` array of a search result document
    pub fn validate_result_document(&self, document: &Value) -> CompatibilityReport {
        match document.get("windows").and_then(Value::as_array) {
            Some(records) => records.iter().fold(
                CompatibilityReport::default(),
                |mut report, record| {
                    report.merge(self.validate_record(record));
                    report
                },
            ),
            None => CompatibilityReport {
                errors: vec!["document has no 'windows' array".to_string()],
                ..CompatibilityReport::default()
            },
        }
    }

    /// Parse raw JSON text and check it as a single record or a result document
    pub fn validate_json(&self, text: &str) -> Result<CompatibilityReport> {
        let value: Value = serde_json::from_str(text)?;
        if value.get("windows").is_some() {
            Ok(self.validate_result_document(&value))
        } else {
            Ok(self.validate_record(&value))
        }
    }
}

fn added_fields(object: &Map<String, Value>) -> Vec<String> {
    object
        .keys()
        .filter(|key| !LEGACY_WINDOW_FIELDS.iter().any(|(name, _)| name == key))
        .cloned()
        .collect()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_u64() => "uint",
        Value::Number(n) if n.is_i64() => "int",
        Value::Number(_) => "float",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
