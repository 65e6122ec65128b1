//! Per-partition record processor
//!
//! Drives the transformation engine over one input record. Two modes match
//! the two mapping rule paths: positional documents carry their own field
//! order and widths; source→target documents resolve per-field overrides
//! against a shared target definition. Any per-field failure fails the
//! whole record; retry/skip classification happens at the coordinator, not
//! here.

use crate::error::{Error, Result};
use crate::mapping::{MappingDocument, SourceTargetMapping, TargetDefinition};
use crate::transform::TransformEngine;
use crate::types::{OrderedRecord, Record};
use std::sync::Arc;

enum Mode {
    Positional {
        document: Arc<MappingDocument>,
    },
    SourceTarget {
        mapping: Arc<SourceTargetMapping>,
        definition: Arc<TargetDefinition>,
        transaction_type: String,
    },
}

/// Transforms input records into ordered output records
pub struct RecordProcessor {
    engine: TransformEngine,
    mode: Mode,
}

impl RecordProcessor {
    /// Create a processor bound to one positional mapping document
    pub fn new(document: Arc<MappingDocument>) -> Self {
        Self {
            engine: TransformEngine::new(),
            mode: Mode::Positional { document },
        }
    }

    /// Create a processor resolving source→target overrides against a
    /// shared target definition
    pub fn for_target(
        mapping: Arc<SourceTargetMapping>,
        definition: Arc<TargetDefinition>,
        transaction_type: impl Into<String>,
    ) -> Self {
        Self {
            engine: TransformEngine::new(),
            mode: Mode::SourceTarget {
                mapping,
                definition,
                transaction_type: transaction_type.into(),
            },
        }
    }

    /// Transform one record, producing fields in target-position order.
    ///
    /// No partial record is ever emitted; the first field failure aborts
    /// the record.
    pub fn process(&self, record: &Record) -> Result<OrderedRecord> {
        match &self.mode {
            Mode::Positional { document } => self.process_positional(record, document),
            Mode::SourceTarget {
                mapping,
                definition,
                transaction_type,
            } => self.process_source_target(record, mapping, definition, transaction_type),
        }
    }

    fn process_positional(
        &self,
        record: &Record,
        document: &MappingDocument,
    ) -> Result<OrderedRecord> {
        let fields = document.ordered_fields();
        let mut output = OrderedRecord::with_capacity(fields.len());

        for (name, mapping) in fields {
            let value = self
                .engine
                .transform_field(record, mapping)
                .map_err(|e| Error::transform(name, e.to_string()))?;
            let target = if mapping.target_field.is_empty() {
                name
            } else {
                mapping.target_field.as_str()
            };
            output.insert(target, value);
        }
        Ok(output)
    }

    fn process_source_target(
        &self,
        record: &Record,
        mapping: &SourceTargetMapping,
        definition: &TargetDefinition,
        transaction_type: &str,
    ) -> Result<OrderedRecord> {
        let fields = definition.ordered_fields();
        let mut output = OrderedRecord::with_capacity(fields.len());

        for field in fields {
            // Fields with no configured rule resolve to a synthesized blank,
            // so the output always covers the full target schema.
            let rule = mapping.resolve_field(&field.name, transaction_type);
            let value = self
                .engine
                .transform_enhanced(record, &rule, field)
                .map_err(|e| Error::transform(&field.name, e.to_string()))?;
            output.insert(field.name.as_str(), value);
        }
        Ok(output)
    }
}
