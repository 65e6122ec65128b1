//! Mapping document loaders and cache
//!
//! YAML parsing plus validation for the three document kinds, and a
//! concurrent memoizing cache shared by all partitions.

use crate::error::{Error, Result};
use crate::mapping::types::{MappingDocument, SourceTargetMapping, TargetDefinition};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

// ============================================================================
// Loaders
// ============================================================================

/// Load a positional mapping document from a YAML file
pub fn load_mapping_document(path: impl AsRef<Path>) -> Result<MappingDocument> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::MappingNotFound {
                template: path.display().to_string(),
            }
        } else {
            Error::config(format!(
                "Failed to read mapping document '{}': {e}",
                path.display()
            ))
        }
    })?;
    load_mapping_document_from_str(&content, &path.display().to_string())
}

/// Load a positional mapping document from a YAML string
pub fn load_mapping_document_from_str(yaml: &str, template: &str) -> Result<MappingDocument> {
    let doc: MappingDocument = serde_yaml::from_str(yaml)
        .map_err(|e| Error::invalid_mapping(template, format!("YAML parse failed: {e}")))?;
    doc.validate(template)?;
    Ok(doc)
}

/// Load a source→target mapping document from a YAML file
pub fn load_source_mapping(path: impl AsRef<Path>) -> Result<SourceTargetMapping> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::config(format!(
            "Failed to read source mapping '{}': {e}",
            path.display()
        ))
    })?;
    load_source_mapping_from_str(&content)
}

/// Load a source→target mapping document from a YAML string
pub fn load_source_mapping_from_str(yaml: &str) -> Result<SourceTargetMapping> {
    let doc: SourceTargetMapping = serde_yaml::from_str(yaml)?;
    if doc.source_system.is_empty() {
        return Err(Error::config("source mapping sourceSystem cannot be empty"));
    }
    if doc.target_name.is_empty() {
        return Err(Error::config("source mapping targetName cannot be empty"));
    }
    Ok(doc)
}

/// Load and validate a target definition from a YAML file
pub fn load_target_definition(path: impl AsRef<Path>) -> Result<TargetDefinition> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::config(format!(
            "Failed to read target definition '{}': {e}",
            path.display()
        ))
    })?;
    load_target_definition_from_str(&content)
}

/// Load and validate a target definition from a YAML string
pub fn load_target_definition_from_str(yaml: &str) -> Result<TargetDefinition> {
    let def: TargetDefinition = serde_yaml::from_str(yaml)?;
    def.validate()?;
    Ok(def)
}

// ============================================================================
// Mapping Cache
// ============================================================================

/// Concurrent memoizing cache for mapping documents.
///
/// Read-mostly: loads happen on first access per key with compute-if-absent
/// semantics, so a race between partitions produces a redundant load of the
/// same document, never a corrupt entry. Injected via `Arc` wherever mapping
/// resolution is needed.
#[derive(Debug)]
pub struct MappingCache {
    /// Root directory template paths are resolved against
    root: PathBuf,
    /// Positional documents keyed by (template, transaction type)
    documents: RwLock<HashMap<(String, String), Arc<MappingDocument>>>,
    /// Source→target documents keyed by (source system, target name)
    source_mappings: RwLock<HashMap<(String, String), Arc<SourceTargetMapping>>>,
    /// Target definitions keyed by target name
    target_definitions: RwLock<HashMap<String, Arc<TargetDefinition>>>,
}

impl MappingCache {
    /// Create a cache resolving templates against `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            documents: RwLock::new(HashMap::new()),
            source_mappings: RwLock::new(HashMap::new()),
            target_definitions: RwLock::new(HashMap::new()),
        }
    }

    /// Get (or load) the mapping document for a (template, transaction type)
    /// key. The document's own transaction type must agree with the key.
    pub fn document(&self, template: &str, transaction_type: &str) -> Result<Arc<MappingDocument>> {
        let key = (template.to_string(), transaction_type.to_string());

        if let Some(doc) = self.documents.read().expect("cache lock poisoned").get(&key) {
            return Ok(Arc::clone(doc));
        }

        let doc = Arc::new(load_mapping_document(self.root.join(template))?);
        if doc.transaction_type != transaction_type {
            return Err(Error::invalid_mapping(
                template,
                format!(
                    "document declares transactionType '{}' but partition requires '{}'",
                    doc.transaction_type, transaction_type
                ),
            ));
        }

        tracing::debug!(template, transaction_type, "loaded mapping document");
        let mut guard = self.documents.write().expect("cache lock poisoned");
        Ok(Arc::clone(guard.entry(key).or_insert(doc)))
    }

    /// Get (or load) the source→target mapping for a
    /// (source system, target name) key, from
    /// `{root}/{sourceSystem}/{targetName}.yml`
    pub fn source_mapping(
        &self,
        source_system: &str,
        target_name: &str,
    ) -> Result<Arc<SourceTargetMapping>> {
        let key = (source_system.to_string(), target_name.to_string());

        if let Some(doc) = self
            .source_mappings
            .read()
            .expect("cache lock poisoned")
            .get(&key)
        {
            return Ok(Arc::clone(doc));
        }

        let path = self
            .root
            .join(source_system)
            .join(format!("{target_name}.yml"));
        let doc = Arc::new(load_source_mapping(path)?);

        tracing::debug!(source_system, target_name, "loaded source mapping");
        let mut guard = self.source_mappings.write().expect("cache lock poisoned");
        Ok(Arc::clone(guard.entry(key).or_insert(doc)))
    }

    /// Get (or load) a target definition by name, from
    /// `{root}/targets/{targetName}.yml`
    pub fn target_definition(&self, target_name: &str) -> Result<Arc<TargetDefinition>> {
        if let Some(def) = self
            .target_definitions
            .read()
            .expect("cache lock poisoned")
            .get(target_name)
        {
            return Ok(Arc::clone(def));
        }

        let path = self.root.join("targets").join(format!("{target_name}.yml"));
        let def = Arc::new(load_target_definition(path)?);

        tracing::debug!(target_name, "loaded target definition");
        let mut guard = self.target_definitions.write().expect("cache lock poisoned");
        Ok(Arc::clone(
            guard.entry(target_name.to_string()).or_insert(def),
        ))
    }

    /// Number of cached positional documents (diagnostics)
    pub fn documents_cached(&self) -> usize {
        self.documents.read().expect("cache lock poisoned").len()
    }
}
