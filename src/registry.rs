use crate::default::DefaultExpr;
use crate::error::RegistryError;
use crate::option::{CompilerOption, Constraint};
use crate::utils::split_parts;
use crate::value::{Category, OptionKind, OptionType, OptionValue, TypedValue};
use indexmap::IndexMap;
use std::ops::RangeInclusive;

/// Whether unset options read their normal default or their test default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegistryMode {
    #[default]
    Normal,
    Test,
}

/// The keyed collection of options for one compilation.
///
/// The registry starts empty; options are created with the `add_*_option`
/// methods (usually by a generated population routine or by
/// [`crate::aggregator::Aggregator::populate`]) and then queried and mutated by
/// key. Keys are unique and kept in insertion order; every key listing is
/// returned sorted.
///
/// A registry is not meant to be shared between threads. Hand each consumer
/// its own [`OptionRegistry::copy`].
#[derive(Debug, Clone, Default)]
pub struct OptionRegistry {
    options: IndexMap<String, CompilerOption>,
    mode: RegistryMode,
}

impl OptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry whose typed getters fall back to test defaults.
    pub fn new_test() -> Self {
        OptionRegistry {
            options: IndexMap::new(),
            mode: RegistryMode::Test,
        }
    }

    pub fn mode(&self) -> RegistryMode {
        self.mode
    }

    pub fn is_test(&self) -> bool {
        self.mode == RegistryMode::Test
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// A new registry of the same mode holding the same options and settings.
    /// Equivalent to [`OptionRegistry::copy_all_options`] into an empty registry.
    #[must_use]
    pub fn copy(&self) -> Self {
        log::debug!("Copying option registry with {} options", self.options.len());
        self.clone()
    }

    pub fn has_option(&self, key: &str) -> bool {
        self.options.contains_key(key)
    }

    pub fn option(&self, key: &str) -> Option<&CompilerOption> {
        self.options.get(key)
    }

    /// Options in insertion order.
    pub fn options(&self) -> impl Iterator<Item = &CompilerOption> {
        self.options.values()
    }

    /// Options sorted by category, then key.
    pub fn sorted_options(&self) -> Vec<&CompilerOption> {
        let mut options: Vec<&CompilerOption> = self.options.values().collect();
        options.sort_by(|a, b| a.export_order(b));
        options
    }

    // === Creation ===

    pub(crate) fn insert_option(&mut self, option: CompilerOption) -> Result<(), RegistryError> {
        if self.options.contains_key(option.key()) {
            return Err(RegistryError::DuplicateOption {
                key: option.key().to_string(),
            });
        }
        self.options.insert(option.key().to_string(), option);
        Ok(())
    }

    /// Adds a fully built option. Fails if the key is already present.
    pub fn add_option(&mut self, option: CompilerOption) -> Result<(), RegistryError> {
        self.insert_option(option)
    }

    #[allow(clippy::too_many_arguments)]
    fn add_with(
        &mut self,
        key: &str,
        option_type: OptionType,
        category: Category,
        default: DefaultExpr,
        test_default: DefaultExpr,
        description: &str,
        constraint: Constraint,
    ) -> Result<(), RegistryError> {
        if self.has_option(key) {
            return Err(RegistryError::DuplicateOption {
                key: key.to_string(),
            });
        }
        let option = CompilerOption::new(
            key,
            option_type,
            category,
            description,
            default,
            test_default,
            constraint,
        )?;
        self.insert_option(option)
    }

    pub fn add_boolean_option(
        &mut self,
        key: &str,
        option_type: OptionType,
        category: Category,
        default: impl Into<DefaultExpr>,
        test_default: impl Into<DefaultExpr>,
        description: &str,
    ) -> Result<(), RegistryError> {
        self.add_with(
            key,
            option_type,
            category,
            default.into(),
            test_default.into(),
            description,
            Constraint::Boolean,
        )
    }

    pub fn add_integer_option(
        &mut self,
        key: &str,
        option_type: OptionType,
        category: Category,
        default: impl Into<DefaultExpr>,
        test_default: impl Into<DefaultExpr>,
        description: &str,
    ) -> Result<(), RegistryError> {
        self.add_with(
            key,
            option_type,
            category,
            default.into(),
            test_default.into(),
            description,
            Constraint::integer(),
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_bounded_integer_option(
        &mut self,
        key: &str,
        option_type: OptionType,
        category: Category,
        default: impl Into<DefaultExpr>,
        test_default: impl Into<DefaultExpr>,
        description: &str,
        bounds: RangeInclusive<i64>,
    ) -> Result<(), RegistryError> {
        self.add_with(
            key,
            option_type,
            category,
            default.into(),
            test_default.into(),
            description,
            Constraint::Integer {
                min: *bounds.start(),
                max: *bounds.end(),
            },
        )
    }

    pub fn add_real_option(
        &mut self,
        key: &str,
        option_type: OptionType,
        category: Category,
        default: impl Into<DefaultExpr>,
        test_default: impl Into<DefaultExpr>,
        description: &str,
    ) -> Result<(), RegistryError> {
        self.add_with(
            key,
            option_type,
            category,
            default.into(),
            test_default.into(),
            description,
            Constraint::real(),
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_bounded_real_option(
        &mut self,
        key: &str,
        option_type: OptionType,
        category: Category,
        default: impl Into<DefaultExpr>,
        test_default: impl Into<DefaultExpr>,
        description: &str,
        bounds: RangeInclusive<f64>,
    ) -> Result<(), RegistryError> {
        self.add_with(
            key,
            option_type,
            category,
            default.into(),
            test_default.into(),
            description,
            Constraint::Real {
                min: *bounds.start(),
                max: *bounds.end(),
            },
        )
    }

    pub fn add_string_option(
        &mut self,
        key: &str,
        option_type: OptionType,
        category: Category,
        default: impl Into<DefaultExpr>,
        test_default: impl Into<DefaultExpr>,
        description: &str,
    ) -> Result<(), RegistryError> {
        self.add_with(
            key,
            option_type,
            category,
            default.into(),
            test_default.into(),
            description,
            Constraint::string(),
        )
    }

    /// A string option that only accepts the values in `allowed` when set.
    #[allow(clippy::too_many_arguments)]
    pub fn add_string_option_with_allowed<I, S>(
        &mut self,
        key: &str,
        option_type: OptionType,
        category: Category,
        default: impl Into<DefaultExpr>,
        test_default: impl Into<DefaultExpr>,
        description: &str,
        allowed: I,
    ) -> Result<(), RegistryError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut values: Vec<String> = Vec::new();
        for value in allowed {
            let value = value.into();
            if !values.contains(&value) {
                values.push(value);
            }
        }
        self.add_with(
            key,
            option_type,
            category,
            default.into(),
            test_default.into(),
            description,
            Constraint::String { allowed: values },
        )
    }

    // === Lookup ===

    fn unknown(&self, key: &str) -> RegistryError {
        RegistryError::UnknownOption {
            key: key.to_string(),
            message: self.unknown_option_message(key),
        }
    }

    /// Looks up an option of any kind.
    pub fn find_option(&self, key: &str) -> Result<&CompilerOption, RegistryError> {
        self.options.get(key).ok_or_else(|| self.unknown(key))
    }

    /// Looks up an option and checks that it is of `kind`.
    pub fn find_typed_option(
        &self,
        key: &str,
        kind: OptionKind,
    ) -> Result<&CompilerOption, RegistryError> {
        let option = self.find_option(key)?;
        if option.kind() != kind {
            return Err(RegistryError::WrongKind {
                key: key.to_string(),
                expected: kind.type_name().to_string(),
            });
        }
        Ok(option)
    }

    fn option_mut(&mut self, key: &str) -> Result<&mut CompilerOption, RegistryError> {
        if !self.options.contains_key(key) {
            return Err(self.unknown(key));
        }
        self.options
            .get_mut(key)
            .ok_or_else(|| RegistryError::UnknownOption {
                key: key.to_string(),
                message: format!("Unknown option \"{key}\""),
            })
    }

    pub(crate) fn find_option_mut(
        &mut self,
        key: &str,
        kind: OptionKind,
    ) -> Result<&mut CompilerOption, RegistryError> {
        self.find_typed_option(key, kind)?;
        self.option_mut(key)
    }

    /// Current value of `key` as a `kind` value. `stack` holds the keys being
    /// evaluated further up and is used to report circular defaults.
    pub(crate) fn resolve_value(
        &self,
        key: &str,
        kind: OptionKind,
        stack: &mut Vec<String>,
    ) -> Result<OptionValue, RegistryError> {
        let option = self.find_typed_option(key, kind)?;
        if stack.iter().any(|k| k == key) {
            let mut cycle = stack.clone();
            cycle.push(key.to_string());
            return Err(RegistryError::CircularDefault {
                key: cycle[0].clone(),
                cycle: cycle.join(" -> "),
            });
        }
        stack.push(key.to_string());
        let value = option.current_value(self, self.is_test(), stack);
        stack.pop();
        value
    }

    fn get_typed<T: TypedValue>(&self, key: &str) -> Result<T, RegistryError> {
        let value = self.resolve_value(key, T::KIND, &mut Vec::new())?;
        let found = value.kind();
        T::from_value(value).ok_or_else(|| RegistryError::DefaultKindMismatch {
            key: key.to_string(),
            expected: T::KIND.type_name().to_string(),
            found: found.type_name().to_string(),
        })
    }

    fn get_typed_default<T: TypedValue>(&self, key: &str) -> Result<T, RegistryError> {
        let option = self.find_typed_option(key, T::KIND)?;
        let value = option.default_value(self)?;
        let found = value.kind();
        T::from_value(value).ok_or_else(|| RegistryError::DefaultKindMismatch {
            key: key.to_string(),
            expected: T::KIND.type_name().to_string(),
            found: found.type_name().to_string(),
        })
    }

    // === Generic access ===

    /// Sets any option from its string representation.
    pub fn set_option(&mut self, key: &str, value: &str) -> Result<(), RegistryError> {
        self.option_mut(key)?.set_value_str(value)
    }

    /// Current value of any option, whatever its kind.
    pub fn value(&self, key: &str) -> Result<OptionValue, RegistryError> {
        let kind = self.find_option(key)?.kind();
        self.resolve_value(key, kind, &mut Vec::new())
    }

    pub fn is_limited(&self, key: &str) -> Result<bool, RegistryError> {
        Ok(self.find_option(key)?.is_limited())
    }

    pub fn description(&self, key: &str) -> Result<&str, RegistryError> {
        Ok(self.find_option(key)?.description())
    }

    pub fn option_type(&self, key: &str) -> Result<OptionType, RegistryError> {
        Ok(self.find_option(key)?.option_type())
    }

    pub fn category(&self, key: &str) -> Result<Category, RegistryError> {
        Ok(self.find_option(key)?.category())
    }

    // === Boolean options ===

    pub fn get_boolean_option(&self, key: &str) -> Result<bool, RegistryError> {
        self.get_typed(key)
    }

    pub fn set_boolean_option(&mut self, key: &str, value: bool) -> Result<(), RegistryError> {
        self.find_option_mut(key, OptionKind::Boolean)?.set_value(value)
    }

    pub fn get_boolean_option_default(&self, key: &str) -> Result<bool, RegistryError> {
        self.get_typed_default(key)
    }

    pub fn set_boolean_option_default(
        &mut self,
        key: &str,
        default: impl Into<DefaultExpr>,
    ) -> Result<(), RegistryError> {
        self.find_option_mut(key, OptionKind::Boolean)?.set_default(default.into())
    }

    pub fn is_boolean_option(&self, key: &str) -> bool {
        self.option(key).is_some_and(|o| o.kind() == OptionKind::Boolean)
    }

    // === Integer options ===

    pub fn get_integer_option(&self, key: &str) -> Result<i64, RegistryError> {
        self.get_typed(key)
    }

    pub fn set_integer_option(&mut self, key: &str, value: i64) -> Result<(), RegistryError> {
        self.find_option_mut(key, OptionKind::Integer)?.set_value(value)
    }

    pub fn get_integer_option_default(&self, key: &str) -> Result<i64, RegistryError> {
        self.get_typed_default(key)
    }

    pub fn set_integer_option_default(
        &mut self,
        key: &str,
        default: impl Into<DefaultExpr>,
    ) -> Result<(), RegistryError> {
        self.find_option_mut(key, OptionKind::Integer)?.set_default(default.into())
    }

    pub fn expand_integer_option_min(&mut self, key: &str, value: i64) -> Result<(), RegistryError> {
        self.find_option_mut(key, OptionKind::Integer)?.expand_min(value)
    }

    pub fn expand_integer_option_max(&mut self, key: &str, value: i64) -> Result<(), RegistryError> {
        self.find_option_mut(key, OptionKind::Integer)?.expand_max(value)
    }

    pub fn get_integer_option_min(&self, key: &str) -> Result<i64, RegistryError> {
        match self.find_typed_option(key, OptionKind::Integer)?.constraint() {
            Constraint::Integer { min, .. } => Ok(*min),
            _ => Ok(i64::MIN),
        }
    }

    pub fn get_integer_option_max(&self, key: &str) -> Result<i64, RegistryError> {
        match self.find_typed_option(key, OptionKind::Integer)?.constraint() {
            Constraint::Integer { max, .. } => Ok(*max),
            _ => Ok(i64::MAX),
        }
    }

    pub fn is_integer_option(&self, key: &str) -> bool {
        self.option(key).is_some_and(|o| o.kind() == OptionKind::Integer)
    }

    // === Real options ===

    pub fn get_real_option(&self, key: &str) -> Result<f64, RegistryError> {
        self.get_typed(key)
    }

    pub fn set_real_option(&mut self, key: &str, value: f64) -> Result<(), RegistryError> {
        self.find_option_mut(key, OptionKind::Real)?.set_value(value)
    }

    pub fn get_real_option_default(&self, key: &str) -> Result<f64, RegistryError> {
        self.get_typed_default(key)
    }

    pub fn set_real_option_default(
        &mut self,
        key: &str,
        default: impl Into<DefaultExpr>,
    ) -> Result<(), RegistryError> {
        self.find_option_mut(key, OptionKind::Real)?.set_default(default.into())
    }

    pub fn expand_real_option_min(&mut self, key: &str, value: f64) -> Result<(), RegistryError> {
        self.find_option_mut(key, OptionKind::Real)?.expand_min(value)
    }

    pub fn expand_real_option_max(&mut self, key: &str, value: f64) -> Result<(), RegistryError> {
        self.find_option_mut(key, OptionKind::Real)?.expand_max(value)
    }

    pub fn get_real_option_min(&self, key: &str) -> Result<f64, RegistryError> {
        match self.find_typed_option(key, OptionKind::Real)?.constraint() {
            Constraint::Real { min, .. } => Ok(*min),
            _ => Ok(f64::NEG_INFINITY),
        }
    }

    pub fn get_real_option_max(&self, key: &str) -> Result<f64, RegistryError> {
        match self.find_typed_option(key, OptionKind::Real)?.constraint() {
            Constraint::Real { max, .. } => Ok(*max),
            _ => Ok(f64::INFINITY),
        }
    }

    pub fn is_real_option(&self, key: &str) -> bool {
        self.option(key).is_some_and(|o| o.kind() == OptionKind::Real)
    }

    // === String options ===

    pub fn get_string_option(&self, key: &str) -> Result<String, RegistryError> {
        self.get_typed(key)
    }

    pub fn set_string_option(&mut self, key: &str, value: &str) -> Result<(), RegistryError> {
        self.find_option_mut(key, OptionKind::String)?.set_value(value)
    }

    pub fn get_string_option_default(&self, key: &str) -> Result<String, RegistryError> {
        self.get_typed_default(key)
    }

    pub fn set_string_option_default(
        &mut self,
        key: &str,
        default: impl Into<DefaultExpr>,
    ) -> Result<(), RegistryError> {
        self.find_option_mut(key, OptionKind::String)?.set_default(default.into())
    }

    pub fn string_option_allowed(&self, key: &str) -> Result<&[String], RegistryError> {
        Ok(self.find_typed_option(key, OptionKind::String)?.allowed())
    }

    pub fn add_string_option_allowed(&mut self, key: &str, value: &str) -> Result<(), RegistryError> {
        self.find_option_mut(key, OptionKind::String)?.add_allowed(value)
    }

    pub fn is_string_option(&self, key: &str) -> bool {
        self.option(key).is_some_and(|o| o.kind() == OptionKind::String)
    }

    // === Key listings ===

    pub fn option_keys(&self) -> Vec<String> {
        self.filtered_option_names(|_| true)
    }

    pub fn compiler_option_keys(&self) -> Vec<String> {
        self.type_option_keys(OptionType::Compiler)
    }

    pub fn runtime_option_keys(&self) -> Vec<String> {
        self.type_option_keys(OptionType::Runtime)
    }

    pub fn type_option_keys(&self, option_type: OptionType) -> Vec<String> {
        self.filtered_option_names(|o| o.is_type(option_type))
    }

    /// Keys of the options matching `filter`, sorted lexicographically.
    pub fn filtered_option_names<F>(&self, filter: F) -> Vec<String>
    where
        F: Fn(&CompilerOption) -> bool,
    {
        let mut keys: Vec<String> = self
            .options
            .values()
            .filter(|o| filter(o))
            .map(|o| o.key().to_string())
            .collect();
        keys.sort();
        keys
    }

    // === Copying ===

    /// Copies every option of `other` into this registry. Missing options are
    /// created with the same kind, bounds, defaults and description; explicitly
    /// set values are assigned, defaults are never turned into values.
    ///
    /// Either every option is copied or, on error, this registry is unchanged.
    pub fn copy_all_options(&mut self, other: &OptionRegistry) -> Result<(), RegistryError> {
        let mut staged = self.clone();
        for (key, option) in &other.options {
            option.copy_to(&mut staged, key)?;
        }
        log::debug!(
            "Copied {} options into registry ({} total)",
            other.options.len(),
            staged.options.len()
        );
        self.options = staged.options;
        Ok(())
    }

    // === Suggestions ===

    /// Message for an unrecognized key, suggesting the closest existing key.
    ///
    /// Each `_`-separated part of `key` is stripped of a common suffix
    /// (`ion`, `ing`, `s`, `e`). Every existing key scores minus its number of
    /// parts, plus `1000 + 10 * len` for each query part it contains; the best
    /// positive score wins, earlier keys in export order winning ties.
    pub fn unknown_option_message(&self, key: &str) -> String {
        let parts: Vec<&str> = split_parts(key, '_')
            .into_iter()
            .map(strip_common_suffix)
            .collect();

        let mut best: Option<&str> = None;
        let mut best_score: i64 = 0;
        for option in self.sorted_options() {
            let name = option.key();
            let mut score = -(split_parts(name, '_').len() as i64);
            for part in &parts {
                if name.contains(part) {
                    score += 1000 + part.len() as i64 * 10;
                }
            }
            if score > best_score {
                best = Some(name);
                best_score = score;
            }
        }

        match best {
            Some(best) => format!("Unknown option \"{key}\", did you mean \"{best}\"?"),
            None => format!("Unknown option \"{key}\""),
        }
    }
}

fn strip_common_suffix(part: &str) -> &str {
    ["ion", "ing", "s", "e"]
        .iter()
        .find_map(|suffix| part.strip_suffix(suffix))
        .unwrap_or(part)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> OptionRegistry {
        let mut reg = OptionRegistry::new();
        reg.add_boolean_option(
            "generate_ode",
            OptionType::Compiler,
            Category::User,
            true,
            true,
            "Generate ODE",
        )
        .unwrap();
        reg.add_bounded_integer_option(
            "log_level",
            OptionType::Runtime,
            Category::Common,
            3i64,
            3i64,
            "Log level",
            0..=7,
        )
        .unwrap();
        reg.add_string_option(
            "inline_functions",
            OptionType::Compiler,
            Category::Uncommon,
            "trivial",
            "trivial",
            "Inlining",
        )
        .unwrap();
        reg
    }

    #[test]
    fn test_strip_common_suffix() {
        assert_eq!(strip_common_suffix("compilation"), "compilat");
        assert_eq!(strip_common_suffix("functions"), "function");
        assert_eq!(strip_common_suffix("inlining"), "inlin");
        assert_eq!(strip_common_suffix("generate"), "generat");
        assert_eq!(strip_common_suffix("ode"), "od");
        assert_eq!(strip_common_suffix("log"), "log");
    }

    #[test]
    fn test_suggestion_for_close_key() {
        let reg = registry();
        assert_eq!(
            reg.unknown_option_message("generate_odes"),
            "Unknown option \"generate_odes\", did you mean \"generate_ode\"?"
        );
        assert_eq!(
            reg.unknown_option_message("function_inlining"),
            "Unknown option \"function_inlining\", did you mean \"inline_functions\"?"
        );
    }

    #[test]
    fn test_no_suggestion_without_match() {
        let reg = registry();
        assert_eq!(
            reg.unknown_option_message("xyz"),
            "Unknown option \"xyz\""
        );
    }

    #[test]
    fn test_keys_are_sorted() {
        let reg = registry();
        assert_eq!(
            reg.option_keys(),
            vec!["generate_ode", "inline_functions", "log_level"]
        );
        assert_eq!(reg.runtime_option_keys(), vec!["log_level"]);
        assert_eq!(
            reg.compiler_option_keys(),
            vec!["generate_ode", "inline_functions"]
        );
    }

    #[test]
    fn test_sorted_options_by_category_then_key() {
        let reg = registry();
        let keys: Vec<&str> = reg.sorted_options().iter().map(|o| o.key()).collect();
        assert_eq!(keys, vec!["log_level", "generate_ode", "inline_functions"]);
    }

    #[test]
    fn test_circular_default_is_reported() {
        let mut reg = OptionRegistry::new();
        reg.add_boolean_option(
            "a",
            OptionType::Compiler,
            Category::User,
            DefaultExpr::copy_of(OptionKind::Boolean, "b"),
            false,
            "",
        )
        .unwrap();
        reg.add_boolean_option(
            "b",
            OptionType::Compiler,
            Category::User,
            DefaultExpr::invert_of_key("a"),
            false,
            "",
        )
        .unwrap();
        let err = reg.get_boolean_option("a").unwrap_err();
        assert_eq!(
            err,
            RegistryError::CircularDefault {
                key: "a".to_string(),
                cycle: "a -> b -> a".to_string(),
            }
        );
        reg.set_boolean_option("a", true).unwrap();
        assert!(!reg.get_boolean_option("b").unwrap());
    }
}
