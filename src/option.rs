use crate::default::DefaultExpr;
use crate::error::RegistryError;
use crate::registry::OptionRegistry;
use crate::utils::{quote, real_for_doc};
use crate::value::{Category, OptionKind, OptionType, OptionValue};
use std::cmp::Ordering;

/// Kind-specific data of an option: numeric bounds or the allowed string set.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    Boolean,
    Integer { min: i64, max: i64 },
    Real { min: f64, max: f64 },
    /// An empty set means any string is accepted.
    String { allowed: Vec<String> },
}

impl Constraint {
    pub fn integer() -> Self {
        Constraint::Integer {
            min: i64::MIN,
            max: i64::MAX,
        }
    }

    pub fn real() -> Self {
        Constraint::Real {
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        }
    }

    pub fn string() -> Self {
        Constraint::String {
            allowed: Vec::new(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> OptionKind {
        match self {
            Constraint::Boolean => OptionKind::Boolean,
            Constraint::Integer { .. } => OptionKind::Integer,
            Constraint::Real { .. } => OptionKind::Real,
            Constraint::String { .. } => OptionKind::String,
        }
    }

    /// Human readable bounds suffix for error messages, e.g. `, min: 0, max: 10`.
    /// Unconstrained ends are omitted.
    fn bounds_detail(&self) -> String {
        match self {
            Constraint::Integer { min, max } => {
                let mut s = String::new();
                if *min != i64::MIN {
                    s.push_str(&format!(", min: {min}"));
                }
                if *max != i64::MAX {
                    s.push_str(&format!(", max: {max}"));
                }
                s
            }
            Constraint::Real { min, max } => {
                let mut s = String::new();
                if min.is_finite() {
                    s.push_str(&format!(", min: {min:?}"));
                }
                if max.is_finite() {
                    s.push_str(&format!(", max: {max:?}"));
                }
                s
            }
            Constraint::String { allowed } if !allowed.is_empty() => {
                format!(", allowed values: {}", allowed.join(", "))
            }
            _ => String::new(),
        }
    }
}

/// A named, typed, bounded configuration value.
///
/// The kind, key, type, category and description never change after
/// creation. Reads fall back to the default expression until a value is set.
#[derive(Debug, Clone)]
pub struct CompilerOption {
    key: String,
    option_type: OptionType,
    category: Category,
    description: String,
    default: DefaultExpr,
    test_default: DefaultExpr,
    constraint: Constraint,
    value: Option<OptionValue>,
}

impl CompilerOption {
    pub fn new(
        key: impl Into<String>,
        option_type: OptionType,
        category: Category,
        description: impl Into<String>,
        default: DefaultExpr,
        test_default: DefaultExpr,
        constraint: Constraint,
    ) -> Result<Self, RegistryError> {
        let option = CompilerOption {
            key: key.into(),
            option_type,
            category,
            description: description.into(),
            default,
            test_default,
            constraint,
            value: None,
        };
        option.check_default(&option.default)?;
        option.check_default(&option.test_default)?;
        Ok(option)
    }

    fn check_default(&self, default: &DefaultExpr) -> Result<(), RegistryError> {
        if default.kind() != self.kind() || !default.is_well_kinded() {
            return Err(RegistryError::DefaultKindMismatch {
                key: self.key.clone(),
                expected: self.kind().type_name().to_string(),
                found: default.kind().type_name().to_string(),
            });
        }
        Ok(())
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn kind(&self) -> OptionKind {
        self.constraint.kind()
    }

    /// `boolean`, `integer`, `real` or `string`.
    pub fn type_name(&self) -> &'static str {
        self.kind().type_name()
    }

    pub fn option_type(&self) -> OptionType {
        self.option_type
    }

    pub fn is_type(&self, option_type: OptionType) -> bool {
        self.option_type == option_type
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn default(&self) -> &DefaultExpr {
        &self.default
    }

    pub fn test_default(&self) -> &DefaultExpr {
        &self.test_default
    }

    pub fn constraint(&self) -> &Constraint {
        &self.constraint
    }

    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    /// The explicitly assigned value, if any.
    pub fn explicit_value(&self) -> Option<&OptionValue> {
        self.value.as_ref()
    }

    /// Ordering used by exports and suggestions: category first, then key.
    pub fn export_order(&self, other: &Self) -> Ordering {
        self.category
            .cmp(&other.category)
            .then_with(|| self.key.cmp(&other.key))
    }

    /// The current value, falling back to the default expression evaluated
    /// against `registry`.
    pub fn value(&self, registry: &OptionRegistry) -> Result<OptionValue, RegistryError> {
        self.current_value(registry, false, &mut vec![self.key.clone()])
    }

    /// Like [`CompilerOption::value`] but falls back to the test default.
    pub fn test_value(&self, registry: &OptionRegistry) -> Result<OptionValue, RegistryError> {
        self.current_value(registry, true, &mut vec![self.key.clone()])
    }

    /// Evaluates only the default expression, ignoring any explicit value.
    pub fn default_value(&self, registry: &OptionRegistry) -> Result<OptionValue, RegistryError> {
        self.default.evaluate(registry, &mut vec![self.key.clone()])
    }

    pub(crate) fn current_value(
        &self,
        registry: &OptionRegistry,
        test: bool,
        stack: &mut Vec<String>,
    ) -> Result<OptionValue, RegistryError> {
        match &self.value {
            Some(value) => Ok(value.clone()),
            None if test => self.test_default.evaluate(registry, stack),
            None => self.default.evaluate(registry, stack),
        }
    }

    fn invalid_value(&self, value: impl ToString, detail: String) -> RegistryError {
        RegistryError::InvalidValue {
            key: self.key.clone(),
            value: value.to_string(),
            detail,
        }
    }

    /// Error for a request that treats this option as `requested`.
    fn wrong_kind(&self, requested: OptionKind) -> RegistryError {
        RegistryError::WrongKind {
            key: self.key.clone(),
            expected: requested.type_name().to_string(),
        }
    }

    /// Validates and assigns an explicit value.
    pub fn set_value(&mut self, value: impl Into<OptionValue>) -> Result<(), RegistryError> {
        let value = value.into();
        match (&self.constraint, &value) {
            (Constraint::Boolean, OptionValue::Boolean(_)) => {}
            (Constraint::Integer { min, max }, OptionValue::Integer(v)) => {
                if v < min || v > max {
                    return Err(self.invalid_value(v, self.constraint.bounds_detail()));
                }
            }
            (Constraint::Real { min, max }, OptionValue::Real(v)) => {
                if v.is_nan() || v < min || v > max {
                    return Err(self.invalid_value(format!("{v:?}"), self.constraint.bounds_detail()));
                }
            }
            (Constraint::String { allowed }, OptionValue::String(v)) => {
                if !allowed.is_empty() && !allowed.contains(v) {
                    return Err(self.invalid_value(v, self.constraint.bounds_detail()));
                }
            }
            _ => return Err(self.wrong_kind(value.kind())),
        }
        log::trace!("Setting option {} to {}", self.key, value);
        self.value = Some(value);
        Ok(())
    }

    /// Parses `text` according to the option's kind and assigns it.
    ///
    /// Booleans accept `true`/`yes`/`on` and `false`/`no`/`off`.
    pub fn set_value_str(&mut self, text: &str) -> Result<(), RegistryError> {
        match self.kind() {
            OptionKind::Boolean => match text {
                "true" | "yes" | "on" => self.set_value(true),
                "false" | "no" | "off" => self.set_value(false),
                _ => Err(self.invalid_value(text, ", expecting boolean value.".to_string())),
            },
            OptionKind::Integer => match text.trim().parse::<i64>() {
                Ok(v) => self.set_value(v),
                Err(_) => Err(self.invalid_value(
                    text,
                    format!(", expecting integer value{}", self.constraint.bounds_detail()),
                )),
            },
            OptionKind::Real => match text.trim().parse::<f64>() {
                Ok(v) => self.set_value(v),
                Err(_) => Err(self.invalid_value(
                    text,
                    format!(", expecting real value{}", self.constraint.bounds_detail()),
                )),
            },
            OptionKind::String => self.set_value(text),
        }
    }

    /// Replaces the default expression. The test default is left alone.
    pub fn set_default(&mut self, default: DefaultExpr) -> Result<(), RegistryError> {
        self.check_default(&default)?;
        self.default = default;
        Ok(())
    }

    pub fn min(&self) -> Option<OptionValue> {
        match self.constraint {
            Constraint::Integer { min, .. } => Some(OptionValue::Integer(min)),
            Constraint::Real { min, .. } => Some(OptionValue::Real(min)),
            _ => None,
        }
    }

    pub fn max(&self) -> Option<OptionValue> {
        match self.constraint {
            Constraint::Integer { max, .. } => Some(OptionValue::Integer(max)),
            Constraint::Real { max, .. } => Some(OptionValue::Real(max)),
            _ => None,
        }
    }

    /// Lowers the minimum. A value above the current minimum is ignored.
    pub fn expand_min(&mut self, value: impl Into<OptionValue>) -> Result<(), RegistryError> {
        let value = value.into();
        match (&mut self.constraint, &value) {
            (Constraint::Integer { min, .. }, OptionValue::Integer(v)) => *min = (*min).min(*v),
            (Constraint::Real { min, .. }, OptionValue::Real(v)) => {
                if *v < *min {
                    *min = *v;
                }
            }
            _ => return Err(self.wrong_kind(value.kind())),
        }
        Ok(())
    }

    /// Raises the maximum. A value below the current maximum is ignored.
    pub fn expand_max(&mut self, value: impl Into<OptionValue>) -> Result<(), RegistryError> {
        let value = value.into();
        match (&mut self.constraint, &value) {
            (Constraint::Integer { max, .. }, OptionValue::Integer(v)) => *max = (*max).max(*v),
            (Constraint::Real { max, .. }, OptionValue::Real(v)) => {
                if *v > *max {
                    *max = *v;
                }
            }
            _ => return Err(self.wrong_kind(value.kind())),
        }
        Ok(())
    }

    /// True iff numeric bounds differ from the unconstrained defaults.
    pub fn is_limited(&self) -> bool {
        match self.constraint {
            Constraint::Integer { min, max } => min != i64::MIN || max != i64::MAX,
            Constraint::Real { min, max } => min.is_finite() || max.is_finite(),
            _ => false,
        }
    }

    pub fn allowed(&self) -> &[String] {
        match &self.constraint {
            Constraint::String { allowed } => allowed,
            _ => &[],
        }
    }

    /// Appends to the allowed string set. Values already present are ignored.
    pub fn add_allowed(&mut self, value: impl Into<String>) -> Result<(), RegistryError> {
        let value = value.into();
        match &mut self.constraint {
            Constraint::String { allowed } => {
                if !allowed.contains(&value) {
                    allowed.push(value);
                }
                Ok(())
            }
            _ => Err(self.wrong_kind(OptionKind::String)),
        }
    }

    /// Copies this option into `target` under `key`. The option is created
    /// there if missing; an explicit value is carried over, a default never is.
    pub fn copy_to(&self, target: &mut OptionRegistry, key: &str) -> Result<(), RegistryError> {
        if !target.has_option(key) {
            let mut created = self.clone();
            created.key = key.to_string();
            created.value = None;
            target.insert_option(created)?;
        }
        if let Some(value) = &self.value {
            target.find_option_mut(key, self.kind())?.set_value(value.clone())?;
        }
        Ok(())
    }

    /// The default value as shown in documentation exports.
    pub fn default_for_doc(&self, registry: &OptionRegistry) -> Result<String, RegistryError> {
        Ok(match self.default_value(registry)? {
            OptionValue::Real(r) => real_for_doc(r),
            OptionValue::String(s) => quote(&s),
            other => other.to_string(),
        })
    }
}
