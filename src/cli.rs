//! CLI: (schema | validate) for one GraphQL document.
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use serde_json::Value;

use crate::config::{ScalarBinding, ScalarBindings};
use crate::generator::{Dialect, Direction};
use crate::shape::{Generator, Shape};
use crate::validator::{Issues, Mode, Outcome};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// JSON Schemas and strict validation for the data a GraphQL operation or fragment returns
#[derive(Parser, Debug)]
#[command(name = "gql-osi", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// print the JSON Schema of the selected data
    Schema(SchemaOut),
    /// check JSON values against the selection
    Validate(ValidateOut),
}

#[derive(Args, Debug, Clone)]
struct ShapeSettings {
    /// GraphQL SDL file
    #[arg(long, short)]
    schema: PathBuf,

    /// document with exactly one operation (or only fragments, with --fragment)
    #[arg(long, short)]
    query: PathBuf,

    /// the document holds fragments instead of an operation
    #[arg(long, default_value_t = false)]
    fragment: bool,

    /// which fragment to use when the document has several
    #[arg(long, requires = "fragment")]
    fragment_name: Option<String>,

    /// bind a custom scalar to a codec: any, string, number, integer, boolean, object, date-time
    #[arg(long = "scalar", value_name = "NAME=KIND")]
    scalars: Vec<ScalarBinding>,

    /// JSON file of { "NAME": "KIND" } scalar bindings
    #[arg(long = "scalars", value_name = "FILE")]
    scalars_file: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// JSON Pointer to select a subnode in each document (e.g. /data)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document; every emitted value is checked
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct SchemaOut {
    #[command(flatten)]
    shape_settings: ShapeSettings,

    /// wire or internal representation of custom scalars
    #[arg(long, default_value = "wire")]
    direction: Direction,

    /// draft-07 or 2020-12
    #[arg(long, default_value = "2020-12")]
    dialect: Dialect,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct ValidateOut {
    #[command(flatten)]
    shape_settings: ShapeSettings,

    #[command(flatten)]
    input_settings: InputSettings,

    /// normalize (wire → wire), deserialize (wire → internal) or serialize (internal → wire)
    #[arg(long, default_value = "normalize")]
    mode: Mode,

    /// output .ndjson file of results (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

/// One value to check, labelled for reporting.
struct Sample {
    label: String,
    value: Value,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl ShapeSettings {
    fn generator(&self) -> Result<Generator> {
        let mut bindings = match self.scalars_file.as_ref() {
            Some(path) => ScalarBindings::load(path)?,
            None => ScalarBindings::default(),
        };
        for binding in &self.scalars {
            bindings.push(binding.clone());
        }
        tracing::debug!(scalars = bindings.len(), "scalar bindings");

        let sdl = std::fs::read_to_string(&self.schema)
            .with_context(|| format!("failed to read schema {}", self.schema.display()))?;
        Generator::new(sdl, bindings.into_codecs())
            .with_context(|| format!("failed to load schema {}", self.schema.display()))
    }

    fn shape<'g>(&self, generator: &'g Generator) -> Result<Shape<'g>> {
        let source = std::fs::read_to_string(&self.query)
            .with_context(|| format!("failed to read document {}", self.query.display()))?;
        let shape = if self.fragment {
            generator.fragment(&source, self.fragment_name.as_deref())
        } else {
            generator.operation(&source)
        };
        shape.with_context(|| format!("failed to load document {}", self.query.display()))
    }
}

impl InputSettings {
    fn load_samples(&self) -> Result<Vec<Sample>> {
        let source_paths = resolve_file_path_patterns(&self.input)?;
        let mut samples = Vec::new();
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file {source_path_str}"))?;
            let mut json_value = serde_json::from_str::<Value>(&source)
                .with_context(|| format!("failed to parse JSON source file {source_path_str}"))?;
            if let Some(pointer) = self.json_pointer.as_deref() {
                json_value = json_value.pointer(pointer).cloned().ok_or_else(|| {
                    anyhow!("JSON pointer {pointer} selects nothing in {source_path_str}")
                })?;
            }
            match self.jq_expr.as_ref() {
                None => samples.push(Sample { label: source_path_str, value: json_value }),
                Some(jq_expr) => {
                    let outputs = crate::jq_exec::run_jaq(jq_expr, &json_value).with_context(|| {
                        format!("failed to apply jq expression to source file {source_path_str}")
                    })?;
                    for (index, value) in outputs.into_iter().enumerate() {
                        samples.push(Sample { label: format!("{source_path_str}#{index}"), value });
                    }
                }
            }
        }
        Ok(samples)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<ExitCode> {
        match &self.cmd {
            Command::Schema(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(ExitCode::SUCCESS);
                }

                let generator = target.shape_settings.generator()?;
                let shape = target.shape_settings.shape(&generator)?;
                let schema = shape.json_schema(target.direction, target.dialect)?;
                let schema_src = serde_json::to_string_pretty(&schema)?;
                emit(target.out.as_deref(), &schema_src)?;
                Ok(ExitCode::SUCCESS)
            }
            Command::Validate(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(ExitCode::SUCCESS);
                }

                let generator = target.shape_settings.generator()?;
                let shape = target.shape_settings.shape(&generator)?;
                let validator = shape.validator()?;
                let samples = target.input_settings.load_samples()?;

                let results: Vec<(&str, Result<Value, Issues>)> = samples
                    .par_iter()
                    .map(|sample| (sample.label.as_str(), validator.validate(&sample.value, target.mode)))
                    .collect();

                let mut failed = 0usize;
                let mut lines = Vec::with_capacity(results.len());
                for (label, result) in results {
                    report(label, &result);
                    if result.is_err() {
                        failed += 1;
                    }
                    lines.push(serde_json::to_string(&Outcome::from(result))?);
                }
                let mut ndjson = lines.join("\n");
                ndjson.push('\n');
                emit(target.out.as_deref(), &ndjson)?;

                if failed > 0 {
                    eprintln!("{}", format!("{failed} of {} values rejected", lines.len()).red().bold());
                    Ok(ExitCode::FAILURE)
                } else {
                    Ok(ExitCode::SUCCESS)
                }
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn report(label: &str, result: &Result<Value, Issues>) {
    match result {
        Ok(_) => eprintln!("{} {label}", "✓".green()),
        Err(issues) => {
            eprintln!("{} {label}", "✗".red().bold());
            for issue in issues.iter() {
                let path = issue.path_string();
                let path = if path.is_empty() { "<root>".to_owned() } else { path };
                eprintln!("    {} {}", path.yellow(), issue.message);
            }
        }
    }
}

fn emit(out: Option<&Path>, text: &str) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, text).with_context(|| format!("failed to write {}", out.display()))
        }
        None => {
            print!("{text}");
            if !text.ends_with('\n') {
                println!();
            }
            Ok(())
        }
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'['))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern).with_context(|| format!("bad glob pattern {pattern}"))? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_validate_flags() {
        let cli = CommandLineInterface::try_parse_from([
            "gql-osi", "validate", "-s", "schema.graphql", "-q", "query.graphql",
            "--scalar", "DateTime=date-time", "--mode", "deserialize", "-i", "a.json", "b.json",
        ])
        .unwrap();
        let Command::Validate(target) = cli.cmd else { panic!("expected validate") };
        assert_eq!(target.mode, Mode::Deserialize);
        assert_eq!(target.input_settings.input, ["a.json", "b.json"]);
        assert_eq!(target.shape_settings.scalars.len(), 1);
    }

    #[test]
    fn rejects_unknown_dialects() {
        let err = CommandLineInterface::try_parse_from([
            "gql-osi", "schema", "-s", "s.graphql", "-q", "q.graphql", "--dialect", "draft-04",
        ])
        .unwrap_err();
        assert!(err.to_string().contains("draft-04"));
    }

    #[test]
    fn literal_paths_pass_through_and_empty_globs_fail() {
        let paths = resolve_file_path_patterns(["does/not/exist.json"]).unwrap();
        assert_eq!(paths, [PathBuf::from("does/not/exist.json")]);
        assert!(resolve_file_path_patterns(["/definitely/not/here/*.json"]).is_err());
    }
}
