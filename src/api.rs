use crate::aggregator::Aggregator;
use crate::error::OptionsError;
use crate::registry::OptionRegistry;

/// Analyzes a single option file given as text: parses it and applies its
/// modifications.
///
/// # Arguments
///
/// * `source` - The option file contents.
/// * `file_name` - The name of the file being analyzed (used for error reporting).
///
/// # Errors
///
/// Returns an `OptionsError` if parsing or a modification fails.
pub fn analyze(source: &str, file_name: &str) -> Result<Aggregator, OptionsError> {
    let mut aggregator = Aggregator::new();
    aggregator.parse_source(file_name, source)?;
    aggregator.modify()?;
    Ok(aggregator)
}

/// Aggregates every `*.options` file of the listed modules.
///
/// `modules` is a comma separated list of optionally quoted directories, e.g.
/// `"Compiler/src","Runtime/src"`.
///
/// # Errors
///
/// Returns an `OptionsError` on the first unreadable file, parse error or
/// failed modification.
pub fn aggregate(modules: &str) -> Result<Aggregator, OptionsError> {
    Ok(Aggregator::from_modules(modules)?)
}

/// Aggregates the listed modules and registers the result in a new registry.
///
/// # Errors
///
/// Returns an `OptionsError` if aggregation fails or a declaration cannot be
/// turned into a run-time option.
pub fn load_registry(modules: &str) -> Result<OptionRegistry, OptionsError> {
    let mut registry = OptionRegistry::new();
    aggregate(modules)?.populate(&mut registry)?;
    Ok(registry)
}

/// Like [`load_registry`], but the registry reads test defaults for options
/// without an explicit value.
///
/// # Errors
///
/// See [`load_registry`].
pub fn load_test_registry(modules: &str) -> Result<OptionRegistry, OptionsError> {
    let mut registry = OptionRegistry::new_test();
    aggregate(modules)?.populate(&mut registry)?;
    Ok(registry)
}
