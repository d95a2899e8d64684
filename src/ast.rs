use crate::error::AggregationError;
use crate::value::{Category, OptionKind, OptionType};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt::{self, Display, Write};

/// A single option declaration as read from an option file.
///
/// Default values, arguments, possible values and the description are kept
/// verbatim as written; they are emitted unchanged into the population code.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct Declaration {
    pub source_file: String,
    pub kind: OptionKind,
    pub name: String,
    pub option_type: OptionType,
    pub category: Category,
    pub default_value: String,
    /// Starts out equal to `default_value`.
    pub test_default_value: String,
    /// Trailing header tokens (`min max` for numeric options).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub possible_values: Option<Vec<String>>,
    /// The quoted description block, lines joined without separators.
    pub description: String,
    #[serde(skip)]
    pub removed: bool,
    #[serde(skip)]
    pub modified: bool,
}

impl Declaration {
    /// The `options.add<Kind>Option(...)` call registering this option,
    /// indented and terminated for inclusion in the generated `addTo` body.
    #[must_use]
    pub fn population_call(&self) -> String {
        let mut call = format!(
            "        options.add{}Option(\"{}\", OptionType.{}, Category.{}, {}, {}, {}",
            self.kind.capitalized(),
            self.name,
            self.option_type,
            self.category,
            self.default_value,
            self.test_default_value,
            self.description
        );
        for arg in self.args.iter().flatten() {
            let _ = write!(call, ", {arg}");
        }
        if let Some(values) = &self.possible_values {
            call.push_str(", new String[] {");
            for value in values {
                let _ = write!(call, "{value}, ");
            }
            call.push('}');
        }
        call.push_str(");\n");
        call
    }
}

#[derive(Debug, PartialEq, Clone, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ModificationKind {
    /// `DEFAULT name value`
    Default { value: String },
    /// `REMOVE name`
    Remove,
    /// `INVERT name other`
    Invert { source: String },
}

impl ModificationKind {
    #[must_use]
    pub fn keyword(&self) -> &'static str {
        match self {
            ModificationKind::Default { .. } => "DEFAULT",
            ModificationKind::Remove => "REMOVE",
            ModificationKind::Invert { .. } => "INVERT",
        }
    }
}

impl Display for ModificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A change to an option declared elsewhere, applied after every file has
/// been read.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct Modification {
    pub source_file: String,
    pub name: String,
    #[serde(flatten)]
    pub kind: ModificationKind,
}

/// Everything read from a set of option files: declarations in first-seen
/// order, and modifications in the order they were encountered.
#[derive(Debug, Default, Clone)]
pub struct OptionSet {
    declarations: IndexMap<String, Declaration>,
    modifications: Vec<Modification>,
}

impl OptionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails if `name` has already been declared.
    pub fn check_undeclared(&self, name: &str, file: &str) -> Result<(), AggregationError> {
        match self.declarations.get(name) {
            Some(old) => Err(AggregationError::DuplicateDeclaration {
                name: name.to_string(),
                old_file: old.source_file.clone(),
                new_file: file.to_string(),
            }),
            None => Ok(()),
        }
    }

    pub fn add_declaration(&mut self, declaration: Declaration) -> Result<(), AggregationError> {
        self.check_undeclared(&declaration.name, &declaration.source_file)?;
        self.declarations
            .insert(declaration.name.clone(), declaration);
        Ok(())
    }

    pub fn add_modification(&mut self, modification: Modification) {
        self.modifications.push(modification);
    }

    #[must_use]
    pub fn declaration(&self, name: &str) -> Option<&Declaration> {
        self.declarations.get(name)
    }

    /// All declarations, including removed ones.
    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.values()
    }

    #[must_use]
    pub fn modifications(&self) -> &[Modification] {
        &self.modifications
    }

    pub(crate) fn parts_mut(
        &mut self,
    ) -> (&mut IndexMap<String, Declaration>, &[Modification]) {
        (&mut self.declarations, &self.modifications)
    }
}
