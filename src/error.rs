use crate::value::OptionKind;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum OptionsError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Aggregation(#[from] AggregationError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Export(#[from] ExportError),
}

/// Build-time failures. Any of these aborts code generation.
#[derive(Error, Debug, Diagnostic)]
pub enum AggregationError {
    #[error("Too many parts on the line! {file}\n{line}")]
    #[diagnostic(
        code(aggregator::too_many_parts),
        help("A declaration header has at most 7 space separated parts: KIND name type category default [testDefault | min max].")
    )]
    TooManyParts {
        file: String,
        line: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("this line")]
        span: SourceSpan,
    },

    #[error("Too few parts on the line! {file}\n{line}")]
    #[diagnostic(
        code(aggregator::too_few_parts),
        help("A declaration header needs at least KIND name type category default.")
    )]
    TooFewParts {
        file: String,
        line: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("this line")]
        span: SourceSpan,
    },

    #[error("Unknown option kind {found} in {file}")]
    #[diagnostic(
        code(aggregator::unknown_kind),
        help("Expected one of BOOLEAN, INTEGER, REAL or STRING.")
    )]
    UnknownKind {
        file: String,
        found: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("unrecognized kind")]
        span: SourceSpan,
    },

    #[error("Unknown option type {found} in {file}")]
    #[diagnostic(
        code(aggregator::unknown_option_type),
        help("Expected `compiler` or `runtime`.")
    )]
    UnknownOptionType {
        file: String,
        found: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("unrecognized option type")]
        span: SourceSpan,
    },

    #[error("Unknown category {found} in {file}")]
    #[diagnostic(
        code(aggregator::unknown_category),
        help("Expected one of common, user, uncommon, experimental, debug, internal or deprecated.")
    )]
    UnknownCategory {
        file: String,
        found: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("unrecognized category")]
        span: SourceSpan,
    },

    #[error("Missing description for option {name} in {file}")]
    #[diagnostic(
        code(aggregator::missing_description),
        help("Every declaration must be followed by a quoted description block.")
    )]
    MissingDescription { file: String, name: String },

    #[error("Malformed description for option {name} in {file}: {description}")]
    #[diagnostic(
        code(aggregator::malformed_description),
        help("The description block must start and end with a double quote.")
    )]
    MalformedDescription {
        file: String,
        name: String,
        description: String,
    },

    #[error("Found duplicated option declaration for {name}. Old declaration from {old_file}. New declaration from {new_file}")]
    #[diagnostic(code(aggregator::duplicate_declaration))]
    DuplicateDeclaration {
        name: String,
        old_file: String,
        new_file: String,
    },

    #[error("Missing option for modification {modification} {name}")]
    #[diagnostic(code(aggregator::missing_option))]
    MissingOption { modification: String, name: String },

    #[error("Option already modified {name}")]
    #[diagnostic(
        code(aggregator::already_modified),
        help("An option may be modified at most once across all option files.")
    )]
    AlreadyModified { name: String },

    #[error("Cannot invert {name} from removed option {source_name}")]
    #[diagnostic(code(aggregator::invert_from_removed))]
    InvertFromRemoved { name: String, source_name: String },

    #[error("Cannot invert {name}: option {other} is of {kind} type, expecting boolean")]
    #[diagnostic(code(aggregator::invert_non_boolean))]
    InvertNonBoolean {
        name: String,
        other: String,
        kind: OptionKind,
    },

    #[error("Failed to read {path}")]
    #[diagnostic(code(aggregator::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Run-time failures scoped to a single registry call. The registry is left
/// unchanged when one of these is returned.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum RegistryError {
    #[error("{message}")]
    #[diagnostic(code(registry::unknown_option))]
    UnknownOption { key: String, message: String },

    #[error("Option: {key} is not of {expected} type")]
    #[diagnostic(code(registry::wrong_kind))]
    WrongKind { key: String, expected: String },

    #[error("Invalid value \"{value}\" for option \"{key}\"{detail}")]
    #[diagnostic(code(registry::invalid_value))]
    InvalidValue {
        key: String,
        value: String,
        detail: String,
    },

    #[error("The option {key} already exists.")]
    #[diagnostic(
        code(registry::duplicate_option),
        help("Option keys are unique within a registry.")
    )]
    DuplicateOption { key: String },

    #[error("Default for option {key} yields {found} values, expecting {expected}")]
    #[diagnostic(code(registry::default_kind_mismatch))]
    DefaultKindMismatch {
        key: String,
        expected: String,
        found: String,
    },

    #[error("Circular default for option {key}: {cycle}")]
    #[diagnostic(
        code(registry::circular_default),
        help("A default copies or inverts another option that eventually refers back to it.")
    )]
    CircularDefault { key: String, cycle: String },

    #[error("Cannot interpret default literal {literal} as a {kind} value")]
    #[diagnostic(code(registry::invalid_default_literal))]
    InvalidDefaultLiteral { literal: String, kind: String },
}

#[derive(Error, Debug, Diagnostic)]
pub enum ExportError {
    #[error("Failed to write export")]
    #[diagnostic(code(export::io))]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Registry(#[from] RegistryError),

    #[error("Failed to serialize options to JSON")]
    #[diagnostic(code(export::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to serialize options to YAML")]
    #[diagnostic(code(export::yaml))]
    Yaml(#[from] serde_yaml::Error),
}
