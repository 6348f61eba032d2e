use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use nyaa_core::sources::load_formula_files;
use nyaa_core::{
    AttributeSchema, AttributeTable, Diagnostic, EmitFormat, FunctionRegistry, SourceLocation,
    emit,
};

/// Compile Nyaa formulas into engine code.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "PATH",
        help = "Formula file, or a directory of *.nyaa files (reads stdin when omitted)"
    )]
    input: Option<PathBuf>,

    #[arg(short, long, value_name = "PATH", help = "Write here instead of stdout")]
    output: Option<PathBuf>,

    #[arg(
        long,
        value_name = "FORMAT",
        default_value = "code",
        help = "Output format: code, tree, tokens"
    )]
    emit: String,

    #[arg(
        long = "attr",
        value_name = "NAME=TYPE",
        help = "Declare an attribute type (boolean, integer, float, string)"
    )]
    attrs: Vec<String>,

    #[arg(long, help = "Start without the builtin functions")]
    no_builtins: bool,

    #[arg(short, long, help = "Report per-stage statistics on stderr")]
    verbose: bool,
}

/// A formula to compile and the name it is reported under.
struct Unit {
    name: String,
    source: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    execute(cli)
}

fn execute(cli: Cli) -> Result<()> {
    let format: EmitFormat = cli.emit.parse()?;

    let mut schema = AttributeTable::new();
    for entry in &cli.attrs {
        let (name, ty) = AttributeTable::parse_entry(entry)
            .map_err(|message| anyhow!("invalid --attr {entry}: {message}"))?;
        if let Some(previous) = schema.attribute_type(&name) {
            let warning = Diagnostic::warning(
                format!("attribute '{name}' redeclared; {ty} replaces {previous}"),
                SourceLocation::Synthetic,
            );
            eprintln!("{warning}");
        }
        schema.insert(name, ty);
    }
    let functions = if cli.no_builtins {
        FunctionRegistry::new()
    } else {
        FunctionRegistry::with_builtins()
    };

    let units = read_units(cli.input.as_deref())?;
    let many = units.len() > 1;
    let mut rendered = String::new();
    let mut failures = 0usize;

    for unit in &units {
        match emit(&unit.source, format, &schema, &functions) {
            Ok(emitted) => {
                if cli.verbose {
                    eprintln!("{}: {}", unit.name, emitted.stats);
                }
                if many {
                    rendered.push_str(&format!("== {} ==\n", unit.name));
                }
                rendered.push_str(&emitted.text);
            }
            Err(err) => {
                failures += 1;
                let diagnostic = Diagnostic::from_error(&err);
                eprintln!("{}: {}", unit.name, diagnostic.render(&unit.source));
            }
        }
    }

    match &cli.output {
        Some(path) => write_output(path, rendered.as_bytes())?,
        None => print!("{rendered}"),
    }

    if failures > 0 {
        return Err(anyhow!(
            "{failures} of {} formula(s) failed to compile",
            units.len()
        ));
    }
    Ok(())
}

fn read_units(input: Option<&Path>) -> Result<Vec<Unit>> {
    match input {
        Some(path) if path.is_dir() => {
            let files = load_formula_files(path)
                .with_context(|| format!("failed to load formulas from {}", path.display()))?;
            if files.is_empty() {
                return Err(anyhow!("no .nyaa files found in {}", path.display()));
            }
            Ok(files
                .into_iter()
                .map(|file| Unit {
                    name: file.path.display().to_string(),
                    source: file.contents,
                })
                .collect())
        }
        Some(path) => {
            let source = fs::read_to_string(path)
                .with_context(|| format!("failed to read input file {}", path.display()))?;
            Ok(vec![Unit {
                name: path.display().to_string(),
                source,
            }])
        }
        None => {
            let mut source = String::new();
            io::stdin()
                .read_to_string(&mut source)
                .context("failed to read formula from stdin")?;
            Ok(vec![Unit {
                name: "<stdin>".to_string(),
                source,
            }])
        }
    }
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {parent:?}"))?;
        }
    }
    fs::write(path, bytes)
        .with_context(|| format!("failed to write output file {}", path.display()))?;
    Ok(())
}
