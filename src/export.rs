//! Documentation and data exports of an [`OptionRegistry`].
//!
//! All exports list options ordered by category, then key, and include only
//! options whose category is at most the requested maximum.

use crate::error::{ExportError, RegistryError};
use crate::option::CompilerOption;
use crate::registry::OptionRegistry;
use crate::value::{Category, OptionKind, OptionType, OptionValue};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::Serialize;
use std::io::Write;

const DOCBOOK_TABLE_ID: &str = "models_tab_compiler_options";
const DOCBOOK_TABLE_TITLE: &str = "Compiler options";

struct ColumnSpec {
    title: &'static str,
    align: &'static str,
    name: &'static str,
    width: &'static str,
}

const DOCBOOK_COLUMNS: [ColumnSpec; 3] = [
    ColumnSpec {
        title: "Option",
        align: "left",
        name: "para",
        width: "2.2*",
    },
    ColumnSpec {
        title: "Option type / Default value",
        align: "left",
        name: "def",
        width: "1.2*",
    },
    ColumnSpec {
        title: "Description",
        align: "left",
        name: "descr",
        width: "3.6*",
    },
];

/// A serializable view of one option, used by the JSON and YAML exports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionSnapshot {
    pub key: String,
    pub kind: OptionKind,
    pub option_type: OptionType,
    pub category: Category,
    pub value: OptionValue,
    pub default: OptionValue,
    pub is_set: bool,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<OptionValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<OptionValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allowed: Vec<String>,
}

fn xml_error<E>(err: E) -> ExportError
where
    E: std::error::Error + Send + Sync + 'static,
{
    ExportError::Io(std::io::Error::other(err))
}

/// Thin wrapper over an indenting `quick_xml::Writer`.
struct XmlOut<W: Write> {
    writer: Writer<W>,
}

impl<W: Write> XmlOut<W> {
    fn new(out: W) -> Self {
        XmlOut {
            writer: Writer::new_with_indent(out, b' ', 4),
        }
    }

    fn open(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), ExportError> {
        let mut start = BytesStart::new(name);
        for attribute in attributes {
            start.push_attribute(*attribute);
        }
        self.writer
            .write_event(Event::Start(start))
            .map_err(xml_error)
    }

    fn close(&mut self, name: &str) -> Result<(), ExportError> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_error)
    }

    fn text(&mut self, text: &str) -> Result<(), ExportError> {
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_error)
    }

    fn empty(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), ExportError> {
        let mut start = BytesStart::new(name);
        for attribute in attributes {
            start.push_attribute(*attribute);
        }
        self.writer
            .write_event(Event::Empty(start))
            .map_err(xml_error)
    }

    /// `<name>text</name>` on a single line.
    fn element(&mut self, name: &str, text: &str) -> Result<(), ExportError> {
        self.open(name, &[])?;
        self.text(text)?;
        self.close(name)
    }

    fn finish(mut self) -> Result<(), ExportError> {
        self.writer.get_mut().write_all(b"\n")?;
        Ok(())
    }
}

impl OptionRegistry {
    fn exported_options(&self, max_category: Category) -> Vec<&CompilerOption> {
        self.sorted_options()
            .into_iter()
            .filter(|o| o.category() <= max_category)
            .collect()
    }

    /// Writes an `OptionsRegistry/Options/Option` XML document.
    pub fn export_xml<W: Write>(&self, out: W, max_category: Category) -> Result<(), ExportError> {
        let mut xml = XmlOut::new(out);
        xml.open("OptionsRegistry", &[])?;
        xml.open("Options", &[])?;
        for option in self.exported_options(max_category) {
            xml.open("Option", &[])?;
            xml.element("Key", option.key())?;
            xml.element("Type", option.type_name())?;
            xml.element("OptionType", &option.option_type().to_string())?;
            xml.element("Category", option.category().as_str())?;
            xml.element("DefaultValue", &option.default_value(self)?.to_string())?;
            if option.is_limited() {
                if let Some(min) = option.min() {
                    xml.element("Min", &min.to_string())?;
                }
                if let Some(max) = option.max() {
                    xml.element("Max", &max.to_string())?;
                }
            }
            if !option.allowed().is_empty() {
                xml.open("AllowedValues", &[])?;
                for value in option.allowed() {
                    xml.element("Value", value)?;
                }
                xml.close("AllowedValues")?;
            }
            xml.element("Description", option.description())?;
            xml.close("Option")?;
        }
        xml.close("Options")?;
        xml.close("OptionsRegistry")?;
        xml.finish()
    }

    /// Writes a plain text table: name and default value on one line, the
    /// description indented on the next.
    pub fn export_plain_text<W: Write>(
        &self,
        mut out: W,
        max_category: Category,
    ) -> Result<(), ExportError> {
        writeln!(out, "{:<30}  {:<15}\n    Description", "Name", "Default value")?;
        for option in self.exported_options(max_category) {
            writeln!(
                out,
                "{:<30}  {:<15}\n    {}",
                option.key(),
                option.default_for_doc(self)?,
                option.description()
            )?;
        }
        Ok(())
    }

    /// Writes a three column DocBook `<table>` (option, type and default,
    /// description).
    pub fn export_docbook<W: Write>(
        &self,
        out: W,
        max_category: Category,
    ) -> Result<(), ExportError> {
        let mut xml = XmlOut::new(out);
        xml.open("table", &[("xml:id", DOCBOOK_TABLE_ID)])?;
        xml.element("title", DOCBOOK_TABLE_TITLE)?;
        let cols = DOCBOOK_COLUMNS.len().to_string();
        xml.open("tgroup", &[("cols", cols.as_str())])?;
        for col in &DOCBOOK_COLUMNS {
            xml.empty(
                "colspec",
                &[
                    ("align", col.align),
                    ("colname", col.name),
                    ("colwidth", col.width),
                ],
            )?;
        }
        xml.open("thead", &[])?;
        xml.open("row", &[])?;
        for col in &DOCBOOK_COLUMNS {
            xml.open("entry", &[("align", "center")])?;
            xml.text(col.title)?;
            xml.close("entry")?;
        }
        xml.close("row")?;
        xml.close("thead")?;

        xml.open("tbody", &[])?;
        for option in self.exported_options(max_category) {
            xml.open("row", &[])?;

            xml.open("entry", &[])?;
            xml.element("literal", option.key())?;
            xml.close("entry")?;

            xml.open("entry", &[])?;
            xml.element("type", option.type_name())?;
            xml.text(" / ")?;
            xml.element("literal", &option.default_for_doc(self)?)?;
            xml.close("entry")?;

            xml.element("entry", option.description())?;
            xml.close("row")?;
        }
        xml.close("tbody")?;
        xml.close("tgroup")?;
        xml.close("table")?;
        xml.finish()
    }

    /// Serializable views of the exported options.
    pub fn snapshot(&self, max_category: Category) -> Result<Vec<OptionSnapshot>, RegistryError> {
        self.exported_options(max_category)
            .into_iter()
            .map(|option| {
                let limited = option.is_limited();
                Ok(OptionSnapshot {
                    key: option.key().to_string(),
                    kind: option.kind(),
                    option_type: option.option_type(),
                    category: option.category(),
                    value: self.value(option.key())?,
                    default: option.default_value(self)?,
                    is_set: option.is_set(),
                    description: option.description().to_string(),
                    min: option.min().filter(|_| limited),
                    max: option.max().filter(|_| limited),
                    allowed: option.allowed().to_vec(),
                })
            })
            .collect()
    }

    /// Serializes the registry into a pretty-printed JSON array.
    pub fn to_json(&self, max_category: Category) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(&self.snapshot(max_category)?)?)
    }

    /// Serializes the registry into a YAML sequence.
    pub fn to_yaml(&self, max_category: Category) -> Result<String, ExportError> {
        Ok(serde_yaml::to_string(&self.snapshot(max_category)?)?)
    }

    /// The XML export as a string.
    pub fn xml_string(&self, max_category: Category) -> Result<String, ExportError> {
        let mut buffer = Vec::new();
        self.export_xml(&mut buffer, max_category)?;
        String::from_utf8(buffer).map_err(xml_error)
    }

    /// The plain text export as a string.
    pub fn plain_text_string(&self, max_category: Category) -> Result<String, ExportError> {
        let mut buffer = Vec::new();
        self.export_plain_text(&mut buffer, max_category)?;
        String::from_utf8(buffer).map_err(xml_error)
    }

    /// The DocBook export as a string.
    pub fn docbook_string(&self, max_category: Category) -> Result<String, ExportError> {
        let mut buffer = Vec::new();
        self.export_docbook(&mut buffer, max_category)?;
        String::from_utf8(buffer).map_err(xml_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> OptionRegistry {
        let mut reg = OptionRegistry::new();
        reg.add_boolean_option(
            "enable_structural_diagnosis",
            OptionType::Compiler,
            Category::User,
            true,
            true,
            "Enable structural error diagnosis",
        )
        .unwrap();
        reg.add_bounded_real_option(
            "nle_solver_tol",
            OptionType::Runtime,
            Category::Common,
            1e-10,
            1e-10,
            "Tolerance for <nonlinear> solvers",
            0.0..=1.0,
        )
        .unwrap();
        reg.add_string_option_with_allowed(
            "inline_functions",
            OptionType::Compiler,
            Category::Debug,
            "trivial",
            "trivial",
            "Inlining mode",
            ["none", "trivial", "all"],
        )
        .unwrap();
        reg
    }

    #[test]
    fn test_xml_export_filters_by_category() {
        let xml = registry().xml_string(Category::User).unwrap();
        assert!(xml.starts_with("<OptionsRegistry>"));
        assert!(xml.contains("<Key>nle_solver_tol</Key>"));
        assert!(xml.contains("<Key>enable_structural_diagnosis</Key>"));
        assert!(!xml.contains("inline_functions"));
        assert!(xml.contains("&lt;nonlinear&gt;"));
        assert!(xml.contains("<Max>1.0</Max>"));
        let tol = xml.find("nle_solver_tol").unwrap();
        let diag = xml.find("enable_structural_diagnosis").unwrap();
        assert!(tol < diag, "common options come before user options");
    }

    #[test]
    fn test_xml_export_lists_allowed_values() {
        let xml = registry().xml_string(Category::Deprecated).unwrap();
        assert!(xml.contains("<Value>trivial</Value>"));
        assert!(xml.contains("<Value>none</Value>"));
    }

    #[test]
    fn test_plain_text_export() {
        let text = registry().plain_text_string(Category::Deprecated).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            format!("{:<30}  {:<15}", "Name", "Default value")
        );
        assert_eq!(lines.next().unwrap(), "    Description");
        assert_eq!(
            lines.next().unwrap(),
            format!("{:<30}  {:<15}", "nle_solver_tol", "1e-10")
        );
        assert_eq!(
            lines.next().unwrap(),
            "    Tolerance for <nonlinear> solvers"
        );
        assert!(text.contains(&format!("{:<30}  {:<15}", "inline_functions", "\"trivial\"")));
    }

    #[test]
    fn test_docbook_export() {
        let doc = registry().docbook_string(Category::Deprecated).unwrap();
        assert!(doc.starts_with("<table xml:id=\"models_tab_compiler_options\">"));
        assert!(doc.contains("<title>Compiler options</title>"));
        assert!(doc.contains("<tgroup cols=\"3\">"));
        assert!(doc.contains(
            "<colspec align=\"left\" colname=\"descr\" colwidth=\"3.6*\"/>"
        ));
        assert!(doc.contains("<literal>enable_structural_diagnosis</literal>"));
        assert!(doc.contains("<type>boolean</type> / <literal>true</literal>"));
    }

    #[test]
    fn test_json_snapshot() {
        let mut reg = registry();
        reg.set_real_option("nle_solver_tol", 0.5).unwrap();
        let json = reg.to_json(Category::Deprecated).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["key"], "nle_solver_tol");
        assert_eq!(value[0]["value"], 0.5);
        assert_eq!(value[0]["default"], 1e-10);
        assert_eq!(value[0]["is_set"], true);
        assert_eq!(value[0]["category"], "common");
        assert_eq!(value[2]["allowed"][2], "all");
        assert!(value[1].get("min").is_none());
    }

    #[test]
    fn test_yaml_snapshot() {
        let yaml = registry().to_yaml(Category::Common).unwrap();
        assert!(yaml.contains("key: nle_solver_tol"));
        assert!(yaml.contains("option_type: runtime"));
        assert!(!yaml.contains("inline_functions"));
    }
}
