// API error path tests
// These test error handling, conversions, and edge cases in the API layer

use compiler_options::error::{AggregationError, OptionsError, RegistryError};
use compiler_options::{aggregate, analyze, load_registry, Aggregator, OptionRegistry};
use miette::Diagnostic;

#[test]
fn test_api_analyze_parse_error() {
    let source = "BOOLEAN opt1 compiler\n";
    let result = analyze(source, "test.options");
    assert!(result.is_err());
    if let Err(OptionsError::Aggregation(AggregationError::TooFewParts { .. })) = result {
        // Success
    } else {
        panic!("Expected too few parts error");
    }
}

#[test]
fn test_api_analyze_modification_error() {
    let source = "DEFAULT opt1 false\n";
    let result = analyze(source, "test.options");
    if let Err(OptionsError::Aggregation(AggregationError::MissingOption { modification, name })) =
        result
    {
        assert_eq!(modification, "DEFAULT");
        assert_eq!(name, "opt1");
    } else {
        panic!("Expected missing option error");
    }
}

#[test]
fn test_api_empty_source() {
    let result = analyze("", "test.options");
    assert!(result.is_ok());
    assert_eq!(result.unwrap().options().count(), 0);
}

#[test]
fn test_api_comments_only() {
    let result = analyze("*** nothing here\n\n*** or here\n", "test.options");
    assert!(result.is_ok());
}

#[test]
fn test_api_empty_module_list() {
    let result = aggregate("");
    assert!(result.is_ok());
    assert_eq!(result.unwrap().options().count(), 0);
}

#[test]
fn test_api_missing_modules_are_skipped() {
    let result = load_registry("\"/definitely/not/here\"");
    assert!(result.is_ok());
    assert!(result.unwrap().is_empty());
}

#[test]
fn test_api_diagnostic_points_at_token() {
    let source = "BOOLEAN opt1 compiler everyone true\n\n\"\"\n";
    let err = analyze(source, "flags.options").expect_err("Should have errored");
    assert_eq!(err.to_string(), "Unknown category everyone in flags.options");
    assert_eq!(
        err.code().map(|c| c.to_string()).as_deref(),
        Some("aggregator::unknown_category")
    );
    let label = err
        .labels()
        .and_then(|mut labels| labels.next())
        .expect("Expected a label");
    assert_eq!(label.offset(), 22);
    assert_eq!(label.len(), 8);
    assert!(err.source_code().is_some());
}

#[test]
fn test_api_bad_default_literal_fails_population() {
    let aggregator = analyze("INTEGER n compiler user many\n\n\"N\"\n", "test.options").unwrap();
    let mut registry = OptionRegistry::new();
    let result = aggregator.populate(&mut registry);
    if let Err(OptionsError::Registry(RegistryError::InvalidDefaultLiteral { literal, kind })) =
        result
    {
        assert_eq!(literal, "many");
        assert_eq!(kind, "integer");
    } else {
        panic!("Expected invalid default literal error");
    }
}

#[test]
fn test_api_population_rejects_existing_keys() {
    let aggregator = analyze("BOOLEAN a compiler user true\n\n\"A\"\n", "test.options").unwrap();
    let mut registry = OptionRegistry::new();
    aggregator.populate(&mut registry).unwrap();
    let result = aggregator.populate(&mut registry);
    match result {
        Err(e @ OptionsError::Registry(RegistryError::DuplicateOption { .. })) => {
            assert_eq!(e.to_string(), "The option a already exists.")
        }
        other => panic!("Expected duplicate option error, got {:?}", other),
    }
}

#[test]
fn test_api_unreadable_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut aggregator = Aggregator::new();
    let result = aggregator.parse_file(&dir.path().join("absent.options"));
    if let Err(AggregationError::Io { path, .. }) = result {
        assert!(path.ends_with("absent.options"));
    } else {
        panic!("Expected io error");
    }
}

#[test]
fn test_api_to_json_and_yaml() {
    let aggregator = analyze("REAL tol compiler user 1e-6\n\n\"Tol\"\n", "test.options").unwrap();
    let json = aggregator.to_json();
    assert!(json.is_ok());
    assert!(json.unwrap().contains("\"tol\""));
    let yaml = aggregator.to_yaml();
    assert!(yaml.is_ok());
    assert!(yaml.unwrap().contains("name: tol"));
}
