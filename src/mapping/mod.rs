//! Declarative mapping model
//!
//! Data types for field mappings, conditions, source→target overrides, and
//! canonical target definitions, plus the YAML loaders and the shared
//! mapping-document cache.

mod loader;
mod types;

pub use loader::{
    load_mapping_document, load_mapping_document_from_str, load_source_mapping,
    load_source_mapping_from_str, load_target_definition, load_target_definition_from_str,
    MappingCache,
};
pub use types::{
    CompositeTransform, Condition, EnhancedFieldMapping, FieldMapping, MappingDocument,
    PaddingConfig, SourceTargetMapping, TargetDefinition, TargetField, TransformationType,
};
