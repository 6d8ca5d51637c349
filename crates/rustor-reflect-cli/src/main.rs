//! rustor-reflect CLI - static reflection over PHP classes
//!
//! Prints what PHP's `ReflectionClass` would report for a class (parents,
//! interfaces, traits, members and constant values) without running any
//! PHP: sources are found through the configured locators and parsed.

mod output;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use rustor_reflect::{logging, ClassReflection, Reflector, ReflectorConfig};
use std::path::PathBuf;
use std::process::ExitCode;

use output::{ClassReport, OutputFormat, Reporter, SymbolEntry};

#[derive(Parser)]
#[command(name = "rustor-reflect")]
#[command(version)]
#[command(about = "Static reflection over PHP classes, interfaces and traits")]
#[command(author = "rustor contributors")]
struct Cli {
    /// Files or directories to scan for declarations (added to the config paths)
    paths: Vec<PathBuf>,

    /// Fully qualified class name to reflect (can be specified multiple times)
    #[arg(long, short = 'c', value_name = "FQN", required_unless_present = "list")]
    class: Vec<String>,

    /// Output format: text, json
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    format: String,

    /// Shorthand for --format json
    #[arg(long)]
    json: bool,

    /// Path to config file (default: auto-detect .rustor-reflect.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Ignore config files
    #[arg(long, conflicts_with = "config")]
    no_config: bool,

    /// Do not consult the builtin PHP classes
    #[arg(long)]
    no_builtins: bool,

    /// Write a debug log to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Show verbose output
    #[arg(long, short = 'v')]
    verbose: bool,

    /// List every class-like symbol found under the scanned paths
    #[arg(long)]
    list: bool,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red(), e);
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Determine output format
    let output_format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::from_str(&cli.format).ok_or_else(|| {
            anyhow::anyhow!(
                "Invalid output format '{}'. Valid options: text, json",
                cli.format
            )
        })?
    };
    let text = output_format == OutputFormat::Text;

    if let Some(log_file) = &cli.log_file {
        let path = logging::init_logger(Some(log_file))
            .with_context(|| format!("Failed to open log file {}", log_file.display()))?;
        if cli.verbose && text {
            println!("{}: {}", "Logging to".bold(), path.display());
        }
    }

    // Load config file
    let mut config = if cli.no_config {
        ReflectorConfig::default()
    } else if let Some(config_path) = &cli.config {
        let cfg = ReflectorConfig::load_path(config_path)?;
        if cli.verbose && text {
            println!("{}: {}", "Using config".bold(), config_path.display());
        }
        cfg
    } else {
        match ReflectorConfig::load()? {
            Some((cfg, path)) => {
                if cli.verbose && text {
                    println!("{}: {}", "Using config".bold(), path.display());
                }
                cfg
            }
            None => ReflectorConfig::default(),
        }
    };

    if cli.log_file.is_none() {
        if let Some(log_file) = config.log_file() {
            logging::init_logger(Some(&log_file))
                .with_context(|| format!("Failed to open log file {}", log_file.display()))?;
        }
    }

    if cli.no_builtins {
        config.locator.builtins = false;
    }

    // CLI paths are relative to the working directory, not the config file
    let cwd = std::env::current_dir()?;
    config
        .locator
        .paths
        .extend(cli.paths.iter().map(|p| cwd.join(p)));

    let reflector = config.build()?;
    if cli.verbose && text {
        println!(
            "{}: {}",
            "Locators".bold(),
            reflector.locator_names().join(", ")
        );
        println!();
    }

    let mut reporter = Reporter::new(output_format, cli.verbose);

    if cli.list {
        for name in reflector.symbols()? {
            let symbol = match reflector.reflect(&name) {
                Ok(symbol) => symbol,
                Err(e) => {
                    reporter.report_error(name.as_str(), &e);
                    continue;
                }
            };
            if symbol.is_internal() {
                continue;
            }
            reporter.report_symbol(SymbolEntry {
                name: symbol.name().to_string(),
                kind: symbol.kind(),
                file: symbol.file_name().map(|p| p.display().to_string()),
                line: symbol.start_line(),
            });
        }
    }

    for class in &cli.class {
        match ClassReflection::for_name(class, &reflector) {
            Ok(reflection) => reporter.report_class(ClassReport::build(&reflection)),
            Err(e) => reporter.report_error(class, &e),
        }
    }

    let failed = reporter.has_errors();
    reporter.finish()?;

    Ok(if failed {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}
