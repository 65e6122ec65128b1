use super::*;
use pretty_assertions::assert_eq;

struct ProbeAdapter {
    name: &'static str,
    token: &'static str,
    priority: i32,
}

impl SourceAdapter for ProbeAdapter {
    fn name(&self) -> &'static str {
        self.name
    }

    fn supports(&self, format: &str) -> bool {
        format.eq_ignore_ascii_case(self.token)
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn validate(&self, _config: &FileConfig) -> Result<()> {
        Ok(())
    }

    fn create_reader(&self, _config: &FileConfig) -> Result<Box<dyn RecordReader>> {
        Err(Error::source_open("probe adapter has no reader"))
    }
}

fn config_with(params: &[(&str, &str)]) -> FileConfig {
    FileConfig {
        params: params
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect(),
        ..FileConfig::default()
    }
}

#[test]
fn test_higher_priority_wins_format_token() {
    let mut registry = AdapterRegistry::new();
    registry.register(Arc::new(ProbeAdapter {
        name: "low",
        token: "rest",
        priority: 25,
    }));
    registry.register(Arc::new(ProbeAdapter {
        name: "high",
        token: "rest",
        priority: 50,
    }));

    assert_eq!(registry.get_adapter("rest").unwrap().name(), "high");
    // Registration order must not matter.
    let mut reversed = AdapterRegistry::new();
    reversed.register(Arc::new(ProbeAdapter {
        name: "high",
        token: "rest",
        priority: 50,
    }));
    reversed.register(Arc::new(ProbeAdapter {
        name: "low",
        token: "rest",
        priority: 25,
    }));
    assert_eq!(reversed.get_adapter("rest").unwrap().name(), "high");
}

#[test]
fn test_lookup_is_case_insensitive() {
    let registry = AdapterRegistry::with_builtin_adapters();
    assert_eq!(registry.get_adapter("REST").unwrap().name(), "rest");
    assert_eq!(registry.get_adapter("Jdbc").unwrap().name(), "sql");
}

#[test]
fn test_unknown_format_lists_supported() {
    let registry = AdapterRegistry::with_builtin_adapters();
    let err = registry.get_adapter("kafka").map(|_| ()).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("kafka"));
    for expected in ["csv", "rest", "jdbc", "excel", "fixed"] {
        assert!(message.contains(expected), "missing '{expected}' in: {message}");
    }
}

#[test]
fn test_builtin_coverage_of_catalog() {
    let registry = AdapterRegistry::with_builtin_adapters();
    let supported = registry.supported_formats();
    assert_eq!(
        supported,
        vec![
            "api", "csv", "database", "delimited", "excel", "fixed", "http", "https", "jdbc",
            "rest", "sql"
        ]
    );
    // Catalog tokens with no built-in stay unresolvable.
    assert!(registry.get_adapter("s3").is_err());
    assert!(registry.get_adapter("xml").is_err());
}

#[test]
fn test_create_reader_wraps_validation_failure() {
    let registry = AdapterRegistry::with_builtin_adapters();
    // REST without endpoint fails adapter validation with format context.
    let config = config_with(&[("format", "rest"), ("baseUrl", "http://api.example.com")]);
    let err = registry.create_reader(&config).map(|_| ()).unwrap_err();
    match err {
        Error::AdapterValidation { format, source } => {
            assert_eq!(format, "rest");
            assert!(matches!(*source, Error::MissingParameter { .. }));
        }
        other => panic!("expected AdapterValidation, got {other}"),
    }
}

#[test]
fn test_create_reader_requires_format_param() {
    let registry = AdapterRegistry::with_builtin_adapters();
    let err = registry
        .create_reader(&FileConfig::default())
        .map(|_| ())
        .unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
}
