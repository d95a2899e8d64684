use crate::ast::{Declaration, Modification, ModificationKind, OptionSet};
use crate::error::AggregationError;
use crate::lexer::{is_blank, Lexer, Line};
use crate::utils::split_parts;
use crate::value::{Category, OptionKind, OptionType};
use miette::{NamedSource, SourceSpan};
use std::sync::Arc;

const MAX_PARTS: usize = 7;
const MIN_PARTS: usize = 5;
/// Header length at which the sixth token is a test default rather than the
/// first argument.
const TEST_DEFAULT_PARTS: usize = 6;

/// Reads one option file into an [`OptionSet`].
///
///    File        ::= { Blank | Modification | Declaration }
///    Modification::= ("DEFAULT" name value | "REMOVE" name | "INVERT" name other)
///    Declaration ::= Header [ PossibleValues ] { Blank } Description
///    Header      ::= KIND name optionType category default [ testDefault | arg arg ]
///    Description ::= line { line }   (up to the next blank line)
#[derive(Debug)]
pub struct Parser<'a> {
    source: Arc<NamedSource<String>>,
    file: String,
    lexer: Lexer<'a>,
}

impl<'a> Parser<'a> {
    pub fn new(source_text: &'a str) -> Self {
        Self::new_with_name(source_text, "source.options".to_string())
    }

    pub fn new_with_name(source_text: &'a str, name: String) -> Self {
        Self {
            source: Arc::new(NamedSource::new(name.clone(), source_text.to_string())),
            file: name,
            lexer: Lexer::new(source_text),
        }
    }

    /// Parses the whole file, adding declarations and modifications to `set`.
    /// Stops at the first error.
    pub fn parse_into(&mut self, set: &mut OptionSet) -> Result<(), AggregationError> {
        while let Some(line) = self.lexer.next_line() {
            let parts = split_parts(line.text, ' ');
            if parts.len() > MAX_PARTS {
                return Err(self.too_many_parts(&line));
            }
            if let Some(modification) = self.parse_modification(&line, &parts)? {
                log::debug!(
                    "{} {} from {}",
                    modification.kind,
                    modification.name,
                    self.file
                );
                set.add_modification(modification);
                continue;
            }
            if parts.len() < MIN_PARTS {
                return Err(self.too_few_parts(&line));
            }
            let declaration = self.parse_declaration(&line, &parts, set)?;
            log::debug!("Declared {} {} in {}", declaration.kind, declaration.name, self.file);
            set.add_declaration(declaration)?;
        }
        Ok(())
    }

    /// Convenience wrapper returning a fresh set for a single file.
    pub fn parse(&mut self) -> Result<OptionSet, AggregationError> {
        let mut set = OptionSet::new();
        self.parse_into(&mut set)?;
        Ok(set)
    }

    fn parse_modification(
        &self,
        line: &Line<'_>,
        parts: &[&str],
    ) -> Result<Option<Modification>, AggregationError> {
        let arity = match parts.first().copied() {
            Some("DEFAULT") | Some("INVERT") => 3,
            Some("REMOVE") => 2,
            _ => return Ok(None),
        };
        if parts.len() < arity {
            return Err(self.too_few_parts(line));
        }
        let kind = match parts[0] {
            "DEFAULT" => ModificationKind::Default {
                value: parts[2].to_string(),
            },
            "REMOVE" => ModificationKind::Remove,
            _ => ModificationKind::Invert {
                source: parts[2].to_string(),
            },
        };
        Ok(Some(Modification {
            source_file: self.file.clone(),
            name: parts[1].to_string(),
            kind,
        }))
    }

    fn parse_declaration(
        &mut self,
        line: &Line<'_>,
        parts: &[&str],
        set: &OptionSet,
    ) -> Result<Declaration, AggregationError> {
        let kind: OptionKind = parts[0].parse().map_err(|_| AggregationError::UnknownKind {
            file: self.file.clone(),
            found: parts[0].to_string(),
            src: (*self.source).clone(),
            span: self.token_span(line, parts, 0),
        })?;
        let name = parts[1].to_string();
        let option_type: OptionType =
            parts[2]
                .parse()
                .map_err(|_| AggregationError::UnknownOptionType {
                    file: self.file.clone(),
                    found: parts[2].to_string(),
                    src: (*self.source).clone(),
                    span: self.token_span(line, parts, 2),
                })?;
        let category: Category = parts[3]
            .parse()
            .map_err(|_| AggregationError::UnknownCategory {
                file: self.file.clone(),
                found: parts[3].to_string(),
                src: (*self.source).clone(),
                span: self.token_span(line, parts, 3),
            })?;

        // Reported before the rest of the block so a repeated header at the end
        // of a file surfaces as a duplicate.
        set.check_undeclared(&name, &self.file)?;

        let default_value = parts[4].to_string();
        let mut test_default_value = default_value.clone();
        let mut args = None;
        if parts.len() > TEST_DEFAULT_PARTS {
            args = Some(parts[5..].iter().map(|p| p.to_string()).collect());
        } else if parts.len() == TEST_DEFAULT_PARTS {
            test_default_value = parts[5].to_string();
        }

        let possible_values = match self.lexer.read_line() {
            Some(next) if !next.is_blank() => Some(
                split_parts(next.text, ' ')
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            ),
            _ => None,
        };

        let description = self.parse_description(&name)?;

        Ok(Declaration {
            source_file: self.file.clone(),
            kind,
            name,
            option_type,
            category,
            default_value,
            test_default_value,
            args,
            possible_values,
            description,
            removed: false,
            modified: false,
        })
    }

    fn parse_description(&mut self, name: &str) -> Result<String, AggregationError> {
        let first = self
            .lexer
            .next_line()
            .ok_or_else(|| AggregationError::MissingDescription {
                file: self.file.clone(),
                name: name.to_string(),
            })?;
        let mut description = first.text.to_string();
        while let Some(line) = self.lexer.read_line() {
            if is_blank(line.text) {
                break;
            }
            description.push_str(line.text);
        }

        let quoted =
            description.len() >= 2 && description.starts_with('"') && description.ends_with('"');
        if !quoted {
            return Err(AggregationError::MalformedDescription {
                file: self.file.clone(),
                name: name.to_string(),
                description,
            });
        }
        Ok(description)
    }

    // === Helper Methods ===

    fn token_span(&self, line: &Line<'_>, parts: &[&str], index: usize) -> SourceSpan {
        let start: usize = parts[..index].iter().map(|p| p.len() + 1).sum();
        (line.offset + start, parts[index].len()).into()
    }

    fn too_many_parts(&self, line: &Line<'_>) -> AggregationError {
        AggregationError::TooManyParts {
            file: self.file.clone(),
            line: line.text.to_string(),
            src: (*self.source).clone(),
            span: line.span().into(),
        }
    }

    fn too_few_parts(&self, line: &Line<'_>) -> AggregationError {
        AggregationError::TooFewParts {
            file: self.file.clone(),
            line: line.text.to_string(),
            src: (*self.source).clone(),
            span: line.span().into(),
        }
    }
}
