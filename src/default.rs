use crate::error::RegistryError;
use crate::registry::OptionRegistry;
use crate::utils::{quote, unquote};
use crate::value::{OptionKind, OptionValue};
use std::fmt::{self, Display};

const NEW_PREFIX: &str = "options.new ";
const INVERT_BOOLEAN: &str = "DefaultInvertBoolean";

/// A deferred computation yielding an option's value when nothing explicit was
/// set. Evaluated every time the option is read, never cached, so a change to a
/// referenced option is immediately visible through its dependents.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultExpr {
    /// A fixed value.
    Literal(OptionValue),
    /// The current value of another option of the given kind, looked up in the
    /// registry doing the evaluation.
    CopyOf { kind: OptionKind, key: String },
    /// Boolean negation of another default.
    InvertOf(Box<DefaultExpr>),
}

impl DefaultExpr {
    pub fn copy_of(kind: OptionKind, key: impl Into<String>) -> Self {
        DefaultExpr::CopyOf {
            kind,
            key: key.into(),
        }
    }

    pub fn invert(inner: DefaultExpr) -> Self {
        DefaultExpr::InvertOf(Box::new(inner))
    }

    /// `InvertOf(CopyOf(key))`, the form produced by an `INVERT` modification.
    pub fn invert_of_key(key: impl Into<String>) -> Self {
        Self::invert(Self::copy_of(OptionKind::Boolean, key))
    }

    /// The kind of value this expression yields.
    #[must_use]
    pub fn kind(&self) -> OptionKind {
        match self {
            DefaultExpr::Literal(value) => value.kind(),
            DefaultExpr::CopyOf { kind, .. } => *kind,
            DefaultExpr::InvertOf(_) => OptionKind::Boolean,
        }
    }

    /// Checks that the expression is well-formed: inversions must wrap boolean
    /// expressions all the way down.
    pub(crate) fn is_well_kinded(&self) -> bool {
        match self {
            DefaultExpr::InvertOf(inner) => {
                inner.kind() == OptionKind::Boolean && inner.is_well_kinded()
            }
            _ => true,
        }
    }

    /// Evaluates the expression against `registry`. `stack` holds the keys whose
    /// values are currently being computed and is used to detect cycles.
    pub(crate) fn evaluate(
        &self,
        registry: &OptionRegistry,
        stack: &mut Vec<String>,
    ) -> Result<OptionValue, RegistryError> {
        match self {
            DefaultExpr::Literal(value) => Ok(value.clone()),
            DefaultExpr::CopyOf { kind, key } => registry.resolve_value(key, *kind, stack),
            DefaultExpr::InvertOf(inner) => match inner.evaluate(registry, stack)? {
                OptionValue::Boolean(b) => Ok(OptionValue::Boolean(!b)),
                other => Err(RegistryError::DefaultKindMismatch {
                    key: stack.last().cloned().unwrap_or_default(),
                    expected: OptionKind::Boolean.type_name().to_string(),
                    found: other.kind().type_name().to_string(),
                }),
            },
        }
    }

    /// Interprets the textual default used in option files and generated
    /// population code.
    ///
    /// Understands plain literals of `kind`, quoted strings,
    /// `options.new DefaultInvertBoolean("key")` (also wrapping another
    /// `options.new` expression) and `options.new DefaultCopy<Kind>("key")`.
    pub fn parse_literal(kind: OptionKind, text: &str) -> Result<Self, RegistryError> {
        let text = text.trim();
        let invalid = || RegistryError::InvalidDefaultLiteral {
            literal: text.to_string(),
            kind: kind.type_name().to_string(),
        };

        if let Some(expr) = text.strip_prefix(NEW_PREFIX) {
            let (class, arg) = expr
                .strip_suffix(')')
                .and_then(|e| e.split_once('('))
                .ok_or_else(invalid)?;
            let arg = arg.trim();

            if class == INVERT_BOOLEAN {
                if kind != OptionKind::Boolean {
                    return Err(invalid());
                }
                let inner = if arg.starts_with(NEW_PREFIX) {
                    Self::parse_literal(OptionKind::Boolean, arg)?
                } else {
                    Self::copy_of(OptionKind::Boolean, unquote(arg).ok_or_else(invalid)?)
                };
                return Ok(Self::invert(inner));
            }

            let copied = class
                .strip_prefix("DefaultCopy")
                .and_then(|k| k.parse::<OptionKind>().ok())
                .filter(|k| *k == kind)
                .ok_or_else(invalid)?;
            return Ok(Self::copy_of(copied, unquote(arg).ok_or_else(invalid)?));
        }

        let value = match kind {
            OptionKind::Boolean => match text {
                "true" => OptionValue::Boolean(true),
                "false" => OptionValue::Boolean(false),
                _ => return Err(invalid()),
            },
            OptionKind::Integer => OptionValue::Integer(text.parse().map_err(|_| invalid())?),
            OptionKind::Real => OptionValue::Real(text.parse().map_err(|_| invalid())?),
            OptionKind::String => OptionValue::String(unquote(text).ok_or_else(invalid)?),
        };
        Ok(DefaultExpr::Literal(value))
    }
}

impl Display for DefaultExpr {
    /// Renders the expression in the same textual form `parse_literal` reads.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultExpr::Literal(OptionValue::String(s)) => f.write_str(&quote(s)),
            DefaultExpr::Literal(value) => write!(f, "{value}"),
            DefaultExpr::CopyOf { kind, key } => {
                write!(f, "{NEW_PREFIX}DefaultCopy{kind}({})", quote(key))
            }
            DefaultExpr::InvertOf(inner) => match inner.as_ref() {
                DefaultExpr::CopyOf { key, .. } => {
                    write!(f, "{NEW_PREFIX}{INVERT_BOOLEAN}({})", quote(key))
                }
                other => write!(f, "{NEW_PREFIX}{INVERT_BOOLEAN}({other})"),
            },
        }
    }
}

impl From<bool> for DefaultExpr {
    fn from(value: bool) -> Self {
        DefaultExpr::Literal(OptionValue::Boolean(value))
    }
}

impl From<i64> for DefaultExpr {
    fn from(value: i64) -> Self {
        DefaultExpr::Literal(OptionValue::Integer(value))
    }
}

impl From<f64> for DefaultExpr {
    fn from(value: f64) -> Self {
        DefaultExpr::Literal(OptionValue::Real(value))
    }
}

impl From<&str> for DefaultExpr {
    fn from(value: &str) -> Self {
        DefaultExpr::Literal(OptionValue::String(value.to_string()))
    }
}

impl From<String> for DefaultExpr {
    fn from(value: String) -> Self {
        DefaultExpr::Literal(OptionValue::String(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_literals() {
        assert_eq!(
            DefaultExpr::parse_literal(OptionKind::Boolean, "true").unwrap(),
            DefaultExpr::from(true)
        );
        assert_eq!(
            DefaultExpr::parse_literal(OptionKind::Integer, "-12").unwrap(),
            DefaultExpr::from(-12i64)
        );
        assert_eq!(
            DefaultExpr::parse_literal(OptionKind::Real, "1e-6").unwrap(),
            DefaultExpr::from(1e-6)
        );
        assert_eq!(
            DefaultExpr::parse_literal(OptionKind::String, r#""all""#).unwrap(),
            DefaultExpr::from("all")
        );
    }

    #[test]
    fn test_parse_rejects_mismatched_literal() {
        assert!(DefaultExpr::parse_literal(OptionKind::Boolean, "yes").is_err());
        assert!(DefaultExpr::parse_literal(OptionKind::Integer, "1.5").is_err());
        assert!(DefaultExpr::parse_literal(OptionKind::String, "unquoted").is_err());
    }

    #[test]
    fn test_parse_invert_expression() {
        let expr = DefaultExpr::parse_literal(
            OptionKind::Boolean,
            r#"options.new DefaultInvertBoolean("other")"#,
        )
        .unwrap();
        assert_eq!(expr, DefaultExpr::invert_of_key("other"));
        assert_eq!(
            expr.to_string(),
            r#"options.new DefaultInvertBoolean("other")"#
        );
    }

    #[test]
    fn test_parse_nested_invert_and_copy() {
        let text = r#"options.new DefaultInvertBoolean(options.new DefaultInvertBoolean("b"))"#;
        let expr = DefaultExpr::parse_literal(OptionKind::Boolean, text).unwrap();
        assert_eq!(
            expr,
            DefaultExpr::invert(DefaultExpr::invert_of_key("b"))
        );
        assert_eq!(expr.to_string(), text);

        let copy =
            DefaultExpr::parse_literal(OptionKind::Real, r#"options.new DefaultCopyReal("tol")"#)
                .unwrap();
        assert_eq!(copy, DefaultExpr::copy_of(OptionKind::Real, "tol"));
        assert!(DefaultExpr::parse_literal(
            OptionKind::Integer,
            r#"options.new DefaultCopyReal("tol")"#
        )
        .is_err());
    }

    #[test]
    fn test_invert_must_wrap_booleans() {
        assert!(DefaultExpr::invert_of_key("a").is_well_kinded());
        assert!(!DefaultExpr::invert(DefaultExpr::from(3i64)).is_well_kinded());
    }
}
