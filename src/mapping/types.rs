//! Mapping model types
//!
//! Declarative field-mapping definitions for YAML parsing: positional
//! mapping documents, enhanced source→target documents, and canonical
//! target definitions.

use crate::error::{Error, Result};
use crate::format::{PadSide, PictureFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Whether a `format` string is a picture (as opposed to a date pattern or
/// other external format hint)
fn is_picture_format(format: &str) -> bool {
    matches!(format.trim_start().chars().next(), Some('9' | '+' | '-'))
}

// ============================================================================
// Transformation Type
// ============================================================================

/// The kind of rule producing a field's value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformationType {
    /// A fixed literal value
    Constant,
    /// Direct copy of one source field
    Source,
    /// Sum or concatenation of several source fields
    Composite,
    /// Condition chain selecting a branch value
    Conditional,
    /// Anything unrecognized; resolves to the mapping's default value
    #[serde(other)]
    Unknown,
}

/// Composite combination function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositeTransform {
    /// Numeric sum of the source fields (non-numeric treated as 0)
    Sum,
    /// String concatenation of the source fields
    Concat,
    /// Anything unrecognized; resolves to the mapping's default value
    #[serde(other)]
    Unknown,
}

// ============================================================================
// Condition
// ============================================================================

/// One branch of a conditional mapping, evaluated top-down.
///
/// `else_if_exprs` chains further conditions recursively; the first true
/// `if` expression wins, `else_expr` is the fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Boolean expression, e.g. `STATUS = 'A'`
    pub if_expr: String,
    /// Branch value when the expression is true (literal or `$field`)
    pub then: String,
    /// Fallback branch value when nothing matches
    #[serde(default)]
    pub else_expr: Option<String>,
    /// Ordered chain of else-if conditions
    #[serde(default)]
    pub else_if_exprs: Vec<Condition>,
}

// ============================================================================
// Field Mapping (positional rule path)
// ============================================================================

/// One output field's production rule in a positional mapping document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMapping {
    /// Output field name
    pub target_field: String,
    /// 1-based output position, unique per transaction type
    pub target_position: u32,
    /// Output width; `<= 0` means no padding/truncation
    #[serde(default)]
    pub length: i64,
    /// Which side receives pad characters
    #[serde(default)]
    pub pad: PadSide,
    /// Pad character (default space)
    #[serde(default = "default_pad_char")]
    pub pad_char: char,
    /// Rule kind; `None` resolves to the default value
    #[serde(default)]
    pub transformation_type: Option<TransformationType>,
    /// Constant payload
    #[serde(default)]
    pub value: Option<String>,
    /// Source payload: input field to copy
    #[serde(default)]
    pub source_field: Option<String>,
    /// Fallback when the rule produces nothing
    #[serde(default)]
    pub default_value: Option<String>,
    /// Composite payload: input fields to combine
    #[serde(default)]
    pub sources: Vec<String>,
    /// Composite combination function
    #[serde(default)]
    pub transform: Option<CompositeTransform>,
    /// Composite concat delimiter (default empty)
    #[serde(default)]
    pub delimiter: Option<String>,
    /// Conditional payload: ordered condition chain
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Optional picture format, e.g. `+9(12)V9(6)`
    #[serde(default)]
    pub format: Option<String>,
}

pub(crate) fn default_pad_char() -> char {
    ' '
}

impl FieldMapping {
    /// Create a constant mapping (used for synthesized blanks and tests)
    pub fn constant(
        target_field: impl Into<String>,
        target_position: u32,
        value: impl Into<String>,
        length: i64,
    ) -> Self {
        Self {
            target_field: target_field.into(),
            target_position,
            length,
            pad: PadSide::default(),
            pad_char: default_pad_char(),
            transformation_type: Some(TransformationType::Constant),
            value: Some(value.into()),
            source_field: None,
            default_value: None,
            sources: Vec::new(),
            transform: None,
            delimiter: None,
            conditions: Vec::new(),
            format: None,
        }
    }

    /// The fallback value for this mapping, empty when unset
    pub fn fallback(&self) -> &str {
        self.default_value.as_deref().unwrap_or("")
    }
}

// ============================================================================
// Mapping Document
// ============================================================================

/// A positional mapping document: all field rules for one
/// (file type, transaction type) pair
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingDocument {
    /// Logical file type this document produces
    pub file_type: String,
    /// Transaction type this document applies to
    #[serde(default = "default_transaction_type")]
    pub transaction_type: String,
    /// Field rules keyed by name; output order is `target_position`, not map order
    pub fields: HashMap<String, FieldMapping>,
}

pub(crate) fn default_transaction_type() -> String {
    "default".to_string()
}

impl MappingDocument {
    /// Field rules sorted by target position ascending
    pub fn ordered_fields(&self) -> Vec<(&str, &FieldMapping)> {
        let mut fields: Vec<(&str, &FieldMapping)> = self
            .fields
            .iter()
            .map(|(name, mapping)| (name.as_str(), mapping))
            .collect();
        fields.sort_by_key(|(_, mapping)| mapping.target_position);
        fields
    }

    /// Validate document invariants: non-empty fields, positions >= 1 and
    /// unique within the document
    pub fn validate(&self, template: &str) -> Result<()> {
        if self.fields.is_empty() {
            return Err(Error::invalid_mapping(template, "no fields defined"));
        }

        let mut seen: HashMap<u32, &str> = HashMap::new();
        for (name, mapping) in &self.fields {
            if mapping.target_position == 0 {
                return Err(Error::invalid_mapping(
                    template,
                    format!("field '{name}' has targetPosition 0; positions are 1-based"),
                ));
            }
            if let Some(previous) = seen.insert(mapping.target_position, name) {
                return Err(Error::invalid_mapping(
                    template,
                    format!(
                        "duplicate targetPosition {} for fields '{previous}' and '{name}'",
                        mapping.target_position
                    ),
                ));
            }
            if let Some(format) = mapping.format.as_deref().filter(|f| is_picture_format(f)) {
                PictureFormat::parse(format).map_err(|e| {
                    Error::invalid_mapping(template, format!("field '{name}': {e}"))
                })?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// Enhanced Field Mapping (source→target rule path)
// ============================================================================

/// One output field's production rule in a source→target document.
///
/// Positions and padding live on the shared [`TargetDefinition`]; conditions
/// use the extended boolean grammar.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedFieldMapping {
    /// Rule kind; `None` resolves to the default value
    #[serde(default)]
    pub transformation_type: Option<TransformationType>,
    /// Constant payload
    #[serde(default)]
    pub value: Option<String>,
    /// Source payload
    #[serde(default)]
    pub source_field: Option<String>,
    /// Fallback value
    #[serde(default)]
    pub default_value: Option<String>,
    /// Composite payload
    #[serde(default)]
    pub sources: Vec<String>,
    /// Composite combination function
    #[serde(default)]
    pub transform: Option<CompositeTransform>,
    /// Composite concat delimiter
    #[serde(default)]
    pub delimiter: Option<String>,
    /// Conditions in the extended boolean grammar
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Optional picture format
    #[serde(default)]
    pub format: Option<String>,
}

impl EnhancedFieldMapping {
    /// A constant rule emitting `value`
    pub fn constant(value: impl Into<String>) -> Self {
        Self {
            transformation_type: Some(TransformationType::Constant),
            value: Some(value.into()),
            ..Default::default()
        }
    }

    /// The fallback value for this mapping, empty when unset
    pub fn fallback(&self) -> &str {
        self.default_value.as_deref().unwrap_or("")
    }
}

// ============================================================================
// Source → Target Mapping
// ============================================================================

/// Per (source system, target) mapping overrides, resolved by precedence:
/// transaction-specific → general group → defaults → synthesized blank
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceTargetMapping {
    /// Source system this document belongs to
    pub source_system: String,
    /// Target schema name
    pub target_name: String,
    /// Unconditional per-field overrides
    #[serde(default)]
    pub defaults: HashMap<String, EnhancedFieldMapping>,
    /// Rules by logical group, e.g. "default"
    #[serde(default)]
    pub mappings: HashMap<String, HashMap<String, EnhancedFieldMapping>>,
    /// Rules by concrete transaction type
    #[serde(default)]
    pub transaction_mappings: HashMap<String, HashMap<String, EnhancedFieldMapping>>,
}

impl SourceTargetMapping {
    /// Resolve the rule for one target field under a transaction type.
    ///
    /// Falls through transaction-specific → "default" group → defaults →
    /// synthesized blank constant, so every target field gets a rule.
    pub fn resolve_field(&self, field: &str, transaction_type: &str) -> EnhancedFieldMapping {
        if let Some(mapping) = self
            .transaction_mappings
            .get(transaction_type)
            .and_then(|group| group.get(field))
        {
            return mapping.clone();
        }
        if let Some(mapping) = self
            .mappings
            .get("default")
            .and_then(|group| group.get(field))
        {
            return mapping.clone();
        }
        if let Some(mapping) = self.defaults.get(field) {
            return mapping.clone();
        }
        EnhancedFieldMapping::constant("")
    }
}

// ============================================================================
// Target Definition
// ============================================================================

/// Padding configuration for a target field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaddingConfig {
    /// Which side receives pad characters
    #[serde(default)]
    pub side: PadSide,
    /// Pad character
    #[serde(default = "default_pad_char")]
    pub character: char,
}

impl Default for PaddingConfig {
    fn default() -> Self {
        Self {
            side: PadSide::default(),
            character: default_pad_char(),
        }
    }
}

/// One field of a canonical target schema
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetField {
    /// Field name
    pub name: String,
    /// 1-based position; positions form a dense 1..N sequence
    pub position: u32,
    /// Output width in characters
    pub length: i64,
    /// Logical data type (string, number, date)
    #[serde(default = "default_data_type")]
    pub data_type: String,
    /// Optional picture or date format
    #[serde(default)]
    pub format: Option<String>,
    /// Padding configuration
    #[serde(default)]
    pub padding: PaddingConfig,
    /// Default value when no rule produces one
    #[serde(default)]
    pub default_value: Option<String>,
    /// Free-form validation hint (consumed by external validators)
    #[serde(default)]
    pub validation: Option<String>,
}

fn default_data_type() -> String {
    "string".to_string()
}

/// A canonical output schema shared across source systems
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetDefinition {
    /// Target schema name
    pub target_name: String,
    /// Logical file type
    pub file_type: String,
    /// Total record length in characters
    #[serde(default)]
    pub record_length: i64,
    /// Ordered field list
    pub fields: Vec<TargetField>,
}

impl TargetDefinition {
    /// Validate schema invariants: non-empty, `position >= 1`, `length >= 1`,
    /// dense 1..N positions
    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(Error::config(format!(
                "target definition '{}' has no fields",
                self.target_name
            )));
        }

        let mut positions: Vec<u32> = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            if field.position < 1 {
                return Err(Error::config(format!(
                    "target field '{}' has position {}; positions are 1-based",
                    field.name, field.position
                )));
            }
            if field.length < 1 {
                return Err(Error::config(format!(
                    "target field '{}' has length {}; lengths must be >= 1",
                    field.name, field.length
                )));
            }
            if let Some(format) = field.format.as_deref().filter(|f| is_picture_format(f)) {
                PictureFormat::parse(format).map_err(|e| {
                    Error::config(format!("target field '{}': {e}", field.name))
                })?;
            }
            positions.push(field.position);
        }

        positions.sort_unstable();
        for (i, position) in positions.iter().enumerate() {
            if *position != (i as u32) + 1 {
                return Err(Error::config(format!(
                    "target definition '{}' positions are not a dense 1..{} sequence",
                    self.target_name,
                    self.fields.len()
                )));
            }
        }
        Ok(())
    }

    /// Fields sorted by position ascending
    pub fn ordered_fields(&self) -> Vec<&TargetField> {
        let mut fields: Vec<&TargetField> = self.fields.iter().collect();
        fields.sort_by_key(|f| f.position);
        fields
    }
}
