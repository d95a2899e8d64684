pub mod aggregator;
pub mod api;
pub mod ast;
pub mod default;
pub mod error;
pub mod export;
pub mod lexer;
pub mod option;
pub mod parser;
pub mod registry;
pub mod utils;
pub mod value;

pub use crate::aggregator::Aggregator;
pub use crate::api::{aggregate, analyze, load_registry, load_test_registry};
pub use crate::ast::{Declaration, Modification, ModificationKind, OptionSet};
pub use crate::default::DefaultExpr;
pub use crate::error::{AggregationError, ExportError, OptionsError, RegistryError};
pub use crate::option::{CompilerOption, Constraint};
pub use crate::registry::{OptionRegistry, RegistryMode};
pub use crate::value::{Category, OptionKind, OptionType, OptionValue, TypedValue};
