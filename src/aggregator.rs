use crate::ast::{Declaration, Modification, ModificationKind, OptionSet};
use crate::default::DefaultExpr;
use crate::error::{AggregationError, OptionsError, RegistryError};
use crate::option::{CompilerOption, Constraint};
use crate::parser::Parser;
use crate::registry::OptionRegistry;
use crate::utils::unquote;
use crate::value::OptionKind;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// File extension of option declaration files.
pub const OPTIONS_EXTENSION: &str = "options";
/// Name of the generated population class and its file.
pub const GENERATED_CLASS: &str = "OptionsAggregated";

const HEADER_IMPORTS: &str = "import java.util.LinkedHashMap;\n\
import java.util.Map;\n\
\n\
import org.jmodelica.common.options.Option;\n\
import org.jmodelica.common.options.OptionRegistry;\n\
import org.jmodelica.common.options.OptionRegistry.Category;\n\
import org.jmodelica.common.options.OptionRegistry.OptionType;\n\
\n";

/// Collects option declarations from a set of module directories, applies the
/// modifications found alongside them and produces population code.
#[derive(Debug, Default, Clone)]
pub struct Aggregator {
    options: OptionSet,
}

impl Aggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses every module in the comma separated `modules` list and applies
    /// the modifications.
    pub fn from_modules(modules: &str) -> Result<Self, AggregationError> {
        let mut aggregator = Self::new();
        aggregator.parse_files(modules)?;
        aggregator.modify()?;
        Ok(aggregator)
    }

    // === Parsing ===

    /// Parses option file text. `file` names the source in diagnostics and in
    /// duplicate declaration reports.
    pub fn parse_source(&mut self, file: &str, source: &str) -> Result<(), AggregationError> {
        Parser::new_with_name(source, file.to_string()).parse_into(&mut self.options)
    }

    pub fn parse_file(&mut self, path: &Path) -> Result<(), AggregationError> {
        let path = absolute(path)?;
        let display = path.display().to_string();
        let source = fs::read_to_string(&path).map_err(|source| AggregationError::Io {
            path: display.clone(),
            source,
        })?;
        log::debug!("Parsing option file {}", display);
        self.parse_source(&display, &source)
    }

    /// Parses every `*.options` file directly inside `dir`, in file name
    /// order. A directory that does not exist is skipped.
    pub fn parse_module(&mut self, dir: &Path) -> Result<(), AggregationError> {
        if !dir.exists() {
            log::warn!("Skipping missing module directory {}", dir.display());
            return Ok(());
        }
        let io_error = |source| AggregationError::Io {
            path: dir.display().to_string(),
            source,
        };
        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_error)? {
            let path = entry.map_err(io_error)?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == OPTIONS_EXTENSION) {
                files.push(path);
            }
        }
        files.sort();
        for file in files {
            self.parse_file(&file)?;
        }
        Ok(())
    }

    pub fn parse_modules<P: AsRef<Path>>(&mut self, modules: &[P]) -> Result<(), AggregationError> {
        for module in modules {
            self.parse_module(module.as_ref())?;
        }
        Ok(())
    }

    /// Parses a module list of the form `"dir1","dir2"`.
    pub fn parse_files(&mut self, modules: &str) -> Result<(), AggregationError> {
        self.parse_modules(&module_paths(modules))
    }

    // === Modification ===

    /// Applies all collected modifications in the order they were read.
    ///
    /// Each option may be modified once. An `INVERT` rewrites both defaults of
    /// its target to the negation of the source option, which must exist, be
    /// boolean and survive aggregation.
    pub fn modify(&mut self) -> Result<(), AggregationError> {
        let (declarations, modifications) = self.options.parts_mut();
        let mut inversions: Vec<&Modification> = Vec::new();

        for modification in modifications {
            let declaration = declarations.get_mut(&modification.name).ok_or_else(|| {
                AggregationError::MissingOption {
                    modification: modification.kind.keyword().to_string(),
                    name: modification.name.clone(),
                }
            })?;
            if declaration.modified {
                return Err(AggregationError::AlreadyModified {
                    name: modification.name.clone(),
                });
            }
            declaration.modified = true;

            match &modification.kind {
                ModificationKind::Default { value } => {
                    declaration.default_value = value.clone();
                }
                ModificationKind::Remove => declaration.removed = true,
                ModificationKind::Invert { source } => {
                    if declaration.kind != OptionKind::Boolean {
                        return Err(AggregationError::InvertNonBoolean {
                            name: declaration.name.clone(),
                            other: declaration.name.clone(),
                            kind: declaration.kind,
                        });
                    }
                    let inverted = DefaultExpr::invert_of_key(source.as_str()).to_string();
                    declaration.test_default_value = inverted.clone();
                    declaration.default_value = inverted;
                    inversions.push(modification);
                }
            }
            log::debug!(
                "Applied {} to {} from {}",
                modification.kind,
                modification.name,
                modification.source_file
            );
        }

        for inversion in inversions {
            let ModificationKind::Invert { source } = &inversion.kind else {
                continue;
            };
            match declarations.get(source) {
                None => {
                    return Err(AggregationError::MissingOption {
                        modification: inversion.kind.keyword().to_string(),
                        name: source.clone(),
                    })
                }
                Some(other) if other.removed => {
                    return Err(AggregationError::InvertFromRemoved {
                        name: inversion.name.clone(),
                        source_name: source.clone(),
                    })
                }
                Some(other) if other.kind != OptionKind::Boolean => {
                    return Err(AggregationError::InvertNonBoolean {
                        name: inversion.name.clone(),
                        other: source.clone(),
                        kind: other.kind,
                    })
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    // === Queries ===

    /// Surviving declarations in first-declared order.
    pub fn options(&self) -> impl Iterator<Item = &Declaration> {
        self.options.declarations().filter(|d| !d.removed)
    }

    #[must_use]
    pub fn declaration(&self, name: &str) -> Option<&Declaration> {
        self.options.declaration(name)
    }

    #[must_use]
    pub fn modifications(&self) -> &[Modification] {
        self.options.modifications()
    }

    #[must_use]
    pub fn option_set(&self) -> &OptionSet {
        &self.options
    }

    // === Generation ===

    pub fn generate_header<W: Write>(&self, out: &mut W, package: &str) -> io::Result<()> {
        write!(
            out,
            "package {package};\n{HEADER_IMPORTS}public class {GENERATED_CLASS} {{\n"
        )
    }

    pub fn generate_calls<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for declaration in self.options() {
            out.write_all(declaration.population_call().as_bytes())?;
        }
        Ok(())
    }

    /// Writes the complete population class.
    pub fn generate<W: Write>(&self, out: &mut W, package: &str) -> io::Result<()> {
        self.generate_header(out, package)?;
        out.write_all(b"    public static void addTo(OptionRegistry options) {\n")?;
        self.generate_calls(out)?;
        out.write_all(b"    }\n")?;
        out.write_all(b"}\n")
    }

    #[must_use]
    pub fn generate_string(&self, package: &str) -> String {
        let mut out = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.generate(&mut out, package);
        String::from_utf8_lossy(&out).into_owned()
    }

    /// Generates `OptionsAggregated.java` in `out_dir`. The file is written to
    /// a temporary file first and renamed into place, so an existing file is
    /// never left half written.
    pub fn write_generated(&self, out_dir: &Path, package: &str) -> Result<PathBuf, AggregationError> {
        let target = out_dir.join(format!("{GENERATED_CLASS}.java"));
        write_atomic(&target, |out| self.generate(out, package))?;
        Ok(target)
    }

    // === Serialization ===

    /// Surviving declarations as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let options: Vec<&Declaration> = self.options().collect();
        serde_json::to_string_pretty(&options)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        let options: Vec<&Declaration> = self.options().collect();
        serde_yaml::to_string(&options)
    }

    // === Registry population ===

    /// Registers every surviving declaration in `registry`, the run-time
    /// equivalent of executing the generated `addTo` method.
    pub fn populate(&self, registry: &mut OptionRegistry) -> Result<(), OptionsError> {
        for declaration in self.options() {
            registry.add_option(compile_declaration(declaration)?)?;
        }
        log::info!("Populated registry with {} options", registry.len());
        Ok(())
    }
}

/// Builds the run-time option for a declaration.
pub fn compile_declaration(declaration: &Declaration) -> Result<CompilerOption, RegistryError> {
    let kind = declaration.kind;
    let default = DefaultExpr::parse_literal(kind, &declaration.default_value)?;
    let test_default = DefaultExpr::parse_literal(kind, &declaration.test_default_value)?;
    let description =
        unquote(&declaration.description).unwrap_or_else(|| declaration.description.clone());
    let args = declaration.args.as_deref().unwrap_or_default();

    let constraint = match kind {
        OptionKind::Boolean => Constraint::Boolean,
        OptionKind::Integer => match args {
            [min, max, ..] => Constraint::Integer {
                min: parse_arg(kind, min)?,
                max: parse_arg(kind, max)?,
            },
            _ => Constraint::integer(),
        },
        OptionKind::Real => match args {
            [min, max, ..] => Constraint::Real {
                min: parse_arg(kind, min)?,
                max: parse_arg(kind, max)?,
            },
            _ => Constraint::real(),
        },
        OptionKind::String => Constraint::String {
            allowed: declaration
                .possible_values
                .iter()
                .flatten()
                .map(|v| unquote(v).unwrap_or_else(|| v.clone()))
                .collect(),
        },
    };

    CompilerOption::new(
        declaration.name.as_str(),
        declaration.option_type,
        declaration.category,
        description,
        default,
        test_default,
        constraint,
    )
}

fn parse_arg<T: std::str::FromStr>(kind: OptionKind, text: &str) -> Result<T, RegistryError> {
    text.parse().map_err(|_| RegistryError::InvalidDefaultLiteral {
        literal: text.to_string(),
        kind: kind.type_name().to_string(),
    })
}

/// Splits a module list such as `"a/src","b/src"` into paths. Surrounding
/// whitespace and quotes are dropped from each entry.
pub fn module_paths(modules: &str) -> Vec<PathBuf> {
    modules
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(|m| {
            let m = m.strip_prefix('"').unwrap_or(m);
            PathBuf::from(m.strip_suffix('"').unwrap_or(m))
        })
        .collect()
}

/// Writes `target` through a temporary file in the same directory.
pub fn write_atomic<F>(target: &Path, write: F) -> Result<(), AggregationError>
where
    F: FnOnce(&mut NamedTempFile) -> io::Result<()>,
{
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let io_error = |source| AggregationError::Io {
        path: target.display().to_string(),
        source,
    };
    let mut file = NamedTempFile::new_in(dir).map_err(io_error)?;
    write(&mut file).map_err(io_error)?;
    file.flush().map_err(io_error)?;
    file.persist(target).map_err(|e| io_error(e.error))?;
    log::info!("Generated {}", target.display());
    Ok(())
}

fn absolute(path: &Path) -> Result<PathBuf, AggregationError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|source| AggregationError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(cwd.join(path))
}
