use clap::{Parser, ValueEnum};
use compiler_options::aggregator::{write_atomic, GENERATED_CLASS};
use compiler_options::error::{ExportError, OptionsError};
use compiler_options::{Aggregator, Category, OptionRegistry};
use log::info;
use std::io::Write;
use std::path::PathBuf;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    /// Java population class `OptionsAggregated.java`
    Population,
    /// Surviving declarations as JSON
    Json,
    /// Surviving declarations as YAML
    Yaml,
    /// Registry XML export
    Xml,
    /// Registry plain text table
    Text,
    /// Registry DocBook table
    Docbook,
}

impl Format {
    fn file_name(self) -> String {
        match self {
            Format::Population => format!("{GENERATED_CLASS}.java"),
            Format::Json => "options.json".to_string(),
            Format::Yaml => "options.yaml".to_string(),
            Format::Xml => "options.xml".to_string(),
            Format::Text => "options.txt".to_string(),
            Format::Docbook => "options.docbook.xml".to_string(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "options-aggregator")]
#[command(about = "Aggregates compiler option declarations into population code")]
struct Cli {
    /// Directory receiving the generated file
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Package of the generated population class
    #[arg(long, default_value = "org.jmodelica.common.options")]
    package: String,

    /// Comma separated module directories, e.g. '"Compiler/src","Runtime/src"'
    #[arg(long)]
    modules: String,

    #[arg(long, value_enum, default_value_t = Format::Population)]
    format: Format,

    /// Most detailed category included in registry exports
    #[arg(long, default_value = "user")]
    max_category: Category,

    /// Only parse and apply modifications, write nothing
    #[arg(long)]
    check: bool,
}

fn main() -> miette::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    run(&cli)?;
    Ok(())
}

fn run(cli: &Cli) -> Result<(), OptionsError> {
    let aggregator = Aggregator::from_modules(&cli.modules)?;
    let count = aggregator.options().count();
    if cli.check {
        println!("{count} options OK");
        return Ok(());
    }

    let target = cli.out_dir.join(cli.format.file_name());
    let contents = render(&aggregator, cli)?;
    write_atomic(&target, |out| out.write_all(contents.as_bytes()))?;
    info!("Wrote {} options to {}", count, target.display());
    println!("Generated {}...", target.display());
    Ok(())
}

fn render(aggregator: &Aggregator, cli: &Cli) -> Result<String, OptionsError> {
    let registry = || -> Result<OptionRegistry, OptionsError> {
        let mut registry = OptionRegistry::new();
        aggregator.populate(&mut registry)?;
        Ok(registry)
    };
    let serialized = match cli.format {
        Format::Population => return Ok(aggregator.generate_string(&cli.package)),
        Format::Json => aggregator.to_json().map_err(ExportError::from)?,
        Format::Yaml => aggregator.to_yaml().map_err(ExportError::from)?,
        Format::Xml => registry()?.xml_string(cli.max_category)?,
        Format::Text => registry()?.plain_text_string(cli.max_category)?,
        Format::Docbook => registry()?.docbook_string(cli.max_category)?,
    };
    Ok(serialized)
}
