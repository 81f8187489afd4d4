//! clrconv CLI - C# ⇄ VB.NET converter
//!
//! Reads `ParsedUnit` JSON produced by a front end and writes
//! `ConversionOutput` JSON for a printer.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use clrconv::config::ConversionOptions;
use clrconv::driver::{ConversionDriver, ConversionOutput, ParsedUnit};
use clrconv::symbols::{LibraryCatalog, LibraryDescription};
use clrconv::{Diagnostics, Language};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Target {
    /// C#
    Cs,
    /// VB.NET
    Vb,
}

impl From<Target> for Language {
    fn from(t: Target) -> Self {
        match t {
            Target::Cs => Language::CSharp,
            Target::Vb => Language::VBNet,
        }
    }
}

/// clrconv - type-directed C# ⇄ VB.NET converter
#[derive(Parser, Debug)]
#[command(name = "clrconv")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Convert parsed C# and VB.NET units into each other", long_about = None)]
struct Cli {
    /// Input ParsedUnit JSON files
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<PathBuf>,

    /// Target language (default: the other language of each input)
    #[arg(long, value_enum)]
    to: Option<Target>,

    /// Output file (single input only; default: <INPUT>.<lang>.json)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Extra library description JSON, added to the core catalog
    #[arg(long, value_name = "FILE")]
    library: Vec<PathBuf>,

    /// Conversion options JSON
    #[arg(long, value_name = "FILE")]
    options: Option<PathBuf>,

    /// Check only (don't write output)
    #[arg(short, long)]
    check: bool,

    /// Emit JSON diagnostics to stderr
    #[arg(long)]
    diag_json: bool,

    /// Show debug logging
    #[arg(short, long)]
    debug: bool,

    /// Worker threads for multiple inputs
    #[arg(short, long)]
    jobs: Option<usize>,
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("clrconv=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_catalog(paths: &[PathBuf]) -> Result<LibraryCatalog> {
    let mut descriptions = vec![LibraryDescription::core()?];
    for path in paths {
        let desc = LibraryDescription::load(path)
            .with_context(|| format!("reading library description {}", path.display()))?;
        descriptions.push(desc);
    }
    Ok(LibraryCatalog::from_descriptions(&descriptions)?)
}

fn output_path(input: &Path, target: Language) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "out".to_string());
    input.with_file_name(format!("{stem}.{}.json", target.short_name()))
}

fn report(diags: &Diagnostics, json: bool) {
    if diags.is_empty() {
        return;
    }
    print!("{}", diags.to_text());
    if json {
        eprintln!("{}", diags.to_json());
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    if cli.output.is_some() && cli.inputs.len() > 1 {
        anyhow::bail!("--output needs exactly one input");
    }
    if let Some(jobs) = cli.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .context("configuring worker threads")?;
    }

    let options = match &cli.options {
        Some(path) => ConversionOptions::load(path)
            .with_context(|| format!("reading options {}", path.display()))?,
        None => ConversionOptions::default(),
    };
    let library = Arc::new(load_catalog(&cli.library)?);
    debug!(inputs = cli.inputs.len(), "starting");

    let results: Vec<(PathBuf, Language, std::result::Result<ConversionOutput, Diagnostics>)> = cli
        .inputs
        .par_iter()
        .map(|path| {
            let parsed = match ParsedUnit::load(path) {
                Ok(p) => p,
                Err(err) => {
                    let fallback = cli.to.map(Language::from).unwrap_or(Language::CSharp);
                    let file = path.display().to_string();
                    return (
                        path.clone(),
                        fallback,
                        Err(clrconv::diagnostics::from_error(&err, Some(&file))),
                    );
                }
            };
            let target = cli
                .to
                .map(Language::from)
                .unwrap_or_else(|| parsed.language.counterpart());
            let result = ConversionDriver::new(Arc::clone(&library), options.clone()).run(&parsed, target);
            (path.clone(), target, result)
        })
        .collect();

    let mut failed = false;
    for (path, target, result) in results {
        match result {
            Ok(out) => {
                report(&out.diagnostics, cli.diag_json);
                failed |= out.diagnostics.has_errors();
                if cli.check {
                    continue;
                }
                let dest = cli.output.clone().unwrap_or_else(|| output_path(&path, target));
                std::fs::write(&dest, out.to_json()?)
                    .with_context(|| format!("writing {}", dest.display()))?;
                info!(input = %path.display(), output = %dest.display(), "written");
            }
            Err(diags) => {
                report(&diags, cli.diag_json);
                failed = true;
            }
        }
    }

    if failed {
        std::process::exit(1);
    }
    if cli.check {
        println!("Conversion successful");
    }
    Ok(())
}
