//! Transformation engine
//!
//! Resolves one output field's value from one input record given a mapping
//! rule, then pads/truncates to the field width. Two call paths share the
//! value-resolution core: positional [`FieldMapping`] rules (simple
//! expression grammar) and [`EnhancedFieldMapping`] rules (extended
//! grammar) driven by a shared target definition.

mod eval;

pub use eval::{ConditionEvaluator, ExtendedEvaluator, SimpleEvaluator};

use crate::error::Result;
use crate::format::{format_picture, pad_value, PictureFormat};
use crate::mapping::{
    CompositeTransform, Condition, EnhancedFieldMapping, FieldMapping, TargetField,
    TransformationType,
};
use crate::types::{field_to_string, lookup_field, Record};

/// The transformation engine.
///
/// Stateless; one instance can serve any number of partitions concurrently.
#[derive(Debug, Default)]
pub struct TransformEngine {
    simple: SimpleEvaluator,
    extended: ExtendedEvaluator,
}

impl TransformEngine {
    /// Create a new engine
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Positional rule path
    // ========================================================================

    /// Produce the output value for one positional field rule.
    ///
    /// The raw value is resolved by transformation type, then padded or
    /// truncated to `mapping.length` (no-op when `length <= 0`).
    pub fn transform_field(&self, record: &Record, mapping: &FieldMapping) -> Result<String> {
        let raw = match mapping.transformation_type {
            Some(TransformationType::Constant) => {
                mapping.value.clone().unwrap_or_else(|| mapping.fallback().to_string())
            }
            Some(TransformationType::Source) => self.resolve_source(
                record,
                mapping.source_field.as_deref(),
                mapping.fallback(),
            ),
            Some(TransformationType::Composite) => self.resolve_composite(
                record,
                &mapping.sources,
                mapping.transform,
                mapping.delimiter.as_deref(),
                mapping.fallback(),
            ),
            Some(TransformationType::Conditional) => self.resolve_conditional(
                record,
                &mapping.conditions,
                &self.simple,
                mapping.fallback(),
            ),
            Some(TransformationType::Unknown) | None => mapping.fallback().to_string(),
        };

        let formatted = self.apply_picture(&raw, mapping.format.as_deref());
        Ok(pad_value(
            &formatted,
            mapping.length,
            mapping.pad,
            mapping.pad_char,
        ))
    }

    // ========================================================================
    // Enhanced rule path
    // ========================================================================

    /// Produce the output value for one enhanced rule against its target
    /// field. Conditions use the extended grammar; width and padding come
    /// from the target definition.
    pub fn transform_enhanced(
        &self,
        record: &Record,
        mapping: &EnhancedFieldMapping,
        target: &TargetField,
    ) -> Result<String> {
        let fallback = mapping
            .default_value
            .as_deref()
            .or(target.default_value.as_deref())
            .unwrap_or("");

        let raw = match mapping.transformation_type {
            Some(TransformationType::Constant) => {
                mapping.value.clone().unwrap_or_else(|| fallback.to_string())
            }
            Some(TransformationType::Source) => {
                self.resolve_source(record, mapping.source_field.as_deref(), fallback)
            }
            Some(TransformationType::Composite) => self.resolve_composite(
                record,
                &mapping.sources,
                mapping.transform,
                mapping.delimiter.as_deref(),
                fallback,
            ),
            Some(TransformationType::Conditional) => {
                self.resolve_conditional(record, &mapping.conditions, &self.extended, fallback)
            }
            Some(TransformationType::Unknown) | None => fallback.to_string(),
        };

        let picture = mapping.format.as_deref().or(target.format.as_deref());
        let formatted = self.apply_picture(&raw, picture);
        Ok(pad_value(
            &formatted,
            target.length,
            target.padding.side,
            target.padding.character,
        ))
    }

    // ========================================================================
    // Value resolution
    // ========================================================================

    /// Direct source lookup: exact key first, case-insensitive fallback,
    /// then the default value.
    fn resolve_source(&self, record: &Record, source_field: Option<&str>, fallback: &str) -> String {
        source_field
            .and_then(|field| lookup_field(record, field))
            .map(field_to_string)
            .unwrap_or_else(|| fallback.to_string())
    }

    /// Composite resolution: numeric sum or delimited concatenation.
    fn resolve_composite(
        &self,
        record: &Record,
        sources: &[String],
        transform: Option<CompositeTransform>,
        delimiter: Option<&str>,
        fallback: &str,
    ) -> String {
        match transform {
            Some(CompositeTransform::Sum) => {
                // Non-numeric or missing source fields count as zero, by the
                // row-level resilience policy.
                let sum: f64 = sources
                    .iter()
                    .map(|field| {
                        lookup_field(record, field)
                            .map(|v| field_to_string(v).trim().parse::<f64>().unwrap_or(0.0))
                            .unwrap_or(0.0)
                    })
                    .sum();
                format!("{sum:?}")
            }
            Some(CompositeTransform::Concat) => {
                let values: Vec<String> = sources
                    .iter()
                    .map(|field| {
                        lookup_field(record, field)
                            .map(field_to_string)
                            .unwrap_or_default()
                    })
                    .collect();
                values.join(delimiter.unwrap_or(""))
            }
            Some(CompositeTransform::Unknown) | None => fallback.to_string(),
        }
    }

    /// Walk a condition chain top-down; the first true expression selects
    /// its branch. Expression parse failures degrade to false here, so one
    /// malformed condition never poisons the whole record.
    fn resolve_conditional(
        &self,
        record: &Record,
        conditions: &[Condition],
        evaluator: &dyn ConditionEvaluator,
        fallback: &str,
    ) -> String {
        for condition in conditions {
            if let Some(branch) = self.eval_condition(record, condition, evaluator) {
                return self.resolve_branch(record, &branch);
            }
        }
        fallback.to_string()
    }

    /// Evaluate one condition (with its else-if chain), returning the raw
    /// winning branch value.
    fn eval_condition(
        &self,
        record: &Record,
        condition: &Condition,
        evaluator: &dyn ConditionEvaluator,
    ) -> Option<String> {
        let matched = evaluator
            .evaluate(&condition.if_expr, record)
            .unwrap_or_else(|e| {
                tracing::debug!(expr = %condition.if_expr, error = %e, "condition degraded to false");
                false
            });
        if matched {
            return Some(condition.then.clone());
        }

        for else_if in &condition.else_if_exprs {
            if let Some(branch) = self.eval_condition(record, else_if, evaluator) {
                return Some(branch);
            }
        }

        condition.else_expr.clone()
    }

    /// Resolve a then/else branch value.
    ///
    /// `$field` is an explicit record reference. A bare string keeps the
    /// compatibility behavior: record lookup by exact name first, literal
    /// fallback.
    fn resolve_branch(&self, record: &Record, branch: &str) -> String {
        if let Some(field) = branch.strip_prefix('$') {
            return lookup_field(record, field)
                .map(field_to_string)
                .unwrap_or_default();
        }
        match record.get(branch) {
            Some(value) => field_to_string(value),
            None => branch.to_string(),
        }
    }

    /// Apply a picture format when the mapping declares one that parses.
    fn apply_picture(&self, value: &str, picture: Option<&str>) -> String {
        match picture.and_then(|p| PictureFormat::parse(p).ok()) {
            Some(pic) => format_picture(value, &pic),
            None => value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests;
