use serde::Serialize;
use std::fmt::{self, Display};
use std::str::FromStr;

/// The four value kinds an option can hold. Fixed when the option is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    Boolean,
    Integer,
    Real,
    String,
}

impl OptionKind {
    /// The lowercase type string used in exports and error messages.
    #[must_use]
    pub fn type_name(self) -> &'static str {
        match self {
            OptionKind::Boolean => "boolean",
            OptionKind::Integer => "integer",
            OptionKind::Real => "real",
            OptionKind::String => "string",
        }
    }

    /// The capitalized form used in generated `add<Kind>Option` calls.
    #[must_use]
    pub fn capitalized(self) -> &'static str {
        match self {
            OptionKind::Boolean => "Boolean",
            OptionKind::Integer => "Integer",
            OptionKind::Real => "Real",
            OptionKind::String => "String",
        }
    }
}

impl Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.capitalized())
    }
}

impl FromStr for OptionKind {
    type Err = String;

    /// Case-insensitive: `BOOLEAN`, `boolean` and `Boolean` are all accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "boolean" => Ok(OptionKind::Boolean),
            "integer" => Ok(OptionKind::Integer),
            "real" => Ok(OptionKind::Real),
            "string" => Ok(OptionKind::String),
            _ => Err(s.to_string()),
        }
    }
}

/// Which subsystem consumes an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Compiler,
    Runtime,
}

impl Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::Compiler => f.write_str("compiler"),
            OptionType::Runtime => f.write_str("runtime"),
        }
    }
}

impl FromStr for OptionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compiler" => Ok(OptionType::Compiler),
            "runtime" => Ok(OptionType::Runtime),
            _ => Err(s.to_string()),
        }
    }
}

/// Audience classification. Declaration order is significant: exports show
/// every option whose category is less than or equal to a requested maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Common,
    User,
    Uncommon,
    Experimental,
    Debug,
    Internal,
    Deprecated,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Common,
        Category::User,
        Category::Uncommon,
        Category::Experimental,
        Category::Debug,
        Category::Internal,
        Category::Deprecated,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Common => "common",
            Category::User => "user",
            Category::Uncommon => "uncommon",
            Category::Experimental => "experimental",
            Category::Debug => "debug",
            Category::Internal => "internal",
            Category::Deprecated => "deprecated",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// A typed option value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OptionValue {
    Boolean(bool),
    Integer(i64),
    Real(f64),
    String(String),
}

impl OptionValue {
    #[must_use]
    pub fn kind(&self) -> OptionKind {
        match self {
            OptionValue::Boolean(_) => OptionKind::Boolean,
            OptionValue::Integer(_) => OptionKind::Integer,
            OptionValue::Real(_) => OptionKind::Real,
            OptionValue::String(_) => OptionKind::String,
        }
    }
}

impl Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Boolean(b) => write!(f, "{b}"),
            OptionValue::Integer(i) => write!(f, "{i}"),
            OptionValue::Real(r) => write!(f, "{r:?}"),
            OptionValue::String(s) => f.write_str(s),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Boolean(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Integer(value)
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        OptionValue::Real(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::String(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::String(value)
    }
}

/// Rust types that can be read out of an option of a fixed kind.
pub trait TypedValue: Sized {
    const KIND: OptionKind;

    fn from_value(value: OptionValue) -> Option<Self>;
}

impl TypedValue for bool {
    const KIND: OptionKind = OptionKind::Boolean;

    fn from_value(value: OptionValue) -> Option<Self> {
        match value {
            OptionValue::Boolean(b) => Some(b),
            _ => None,
        }
    }
}

impl TypedValue for i64 {
    const KIND: OptionKind = OptionKind::Integer;

    fn from_value(value: OptionValue) -> Option<Self> {
        match value {
            OptionValue::Integer(i) => Some(i),
            _ => None,
        }
    }
}

impl TypedValue for f64 {
    const KIND: OptionKind = OptionKind::Real;

    fn from_value(value: OptionValue) -> Option<Self> {
        match value {
            OptionValue::Real(r) => Some(r),
            _ => None,
        }
    }
}

impl TypedValue for String {
    const KIND: OptionKind = OptionKind::String;

    fn from_value(value: OptionValue) -> Option<Self> {
        match value {
            OptionValue::String(s) => Some(s),
            _ => None,
        }
    }
}
