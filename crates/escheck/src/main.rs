//! escheck - Check JavaScript reference documentation against the ECMAScript
//! specification
//!
//! `escheck scrape` extracts a catalog of every specified global object from
//! the specification's HTML source; `escheck check` runs the enabled rules
//! over a documentation checkout and reports pages that disagree with the
//! catalog or with the page-type conventions.

use escheck::adjust::apply_documentation_conventions;
use escheck::context::RunContext;
use escheck::load_config;
use escheck::output::{GroupBy, OutputFormat, render_report};
use escheck::rules;
use escheck_core::{Catalog, HtmlDocument, SpecSource, extract_catalog};
use eyre::{Result, WrapErr};
use figue as args;
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// CLI arguments
#[derive(Debug, facet::Facet)]
struct Args {
    /// Subcommand to run
    #[facet(args::subcommand)]
    command: Option<Command>,
}

/// Subcommands
#[derive(Debug, facet::Facet)]
#[repr(u8)]
enum Command {
    /// Extract the catalog of global objects from the specification HTML
    Scrape {
        /// The specification source (spec.html)
        #[facet(args::positional)]
        spec: PathBuf,

        /// Output file for the catalog (default: stdout)
        #[facet(args::named, args::short = 'o', default)]
        output: Option<PathBuf>,

        /// Also write the clause tree to this file
        #[facet(args::named, default)]
        toc: Option<PathBuf>,
    },

    /// Check documentation pages against the catalog
    Check {
        /// Root of the content checkout (contains files/en-us)
        #[facet(args::positional)]
        content: PathBuf,

        /// Path to config file (default: config.yml)
        #[facet(args::named, args::short = 'c', default)]
        config: Option<PathBuf>,

        /// Catalog produced by `escheck scrape` (default: data.json)
        #[facet(args::named, default)]
        catalog: Option<PathBuf>,

        /// Output format: text, stderr, json, html
        #[facet(args::named, args::short = 'f', default)]
        format: Option<String>,

        /// Group reports by: file, rule
        #[facet(args::named, default)]
        by: Option<String>,

        /// Directory for json and html reports (default: generated)
        #[facet(args::named, default)]
        out_dir: Option<PathBuf>,

        /// Exit 1 when any issue was reported
        #[facet(args::named, default)]
        check: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Args = figue::from_std_args()
        .into_result()
        .map(|output| output.value)
        .wrap_err("Failed to parse command line arguments")?;

    match args.command {
        Some(Command::Scrape { spec, output, toc }) => run_scrape_command(&spec, output, toc),
        Some(Command::Check {
            content,
            config,
            catalog,
            format,
            by,
            out_dir,
            check,
        }) => run_check_command(CheckOptions {
            content,
            config,
            catalog,
            format,
            by,
            out_dir,
            check,
        }),
        None => eyre::bail!(
            "No command specified. Usage: escheck scrape <spec.html> | escheck check <content-root>"
        ),
    }
}

fn run_scrape_command(spec: &Path, output: Option<PathBuf>, toc: Option<PathBuf>) -> Result<()> {
    eprintln!("{} Parsing {}...", "->".blue().bold(), spec.display());

    let html = std::fs::read_to_string(spec)
        .wrap_err_with(|| format!("Failed to read {}", spec.display()))?;
    let document = HtmlDocument::parse(&html)
        .wrap_err_with(|| format!("Failed to parse {}", spec.display()))?;

    let catalog = extract_catalog(&document)
        .wrap_err_with(|| format!("Failed to extract catalog from {}", spec.display()))?;
    eprintln!(
        "   Found {} global entities",
        catalog.len().to_string().green()
    );

    let json = catalog.to_json()?;
    match output {
        Some(path) => write_versioned(&path, &json)?,
        None => println!("{}", json),
    }

    if let Some(path) = toc {
        let json = serde_json::to_string_pretty(&document.sections())
            .wrap_err("Failed to serialize clause tree to JSON")?;
        write_versioned(&path, &json)?;
    }

    Ok(())
}

/// Write `contents` to `path`, keeping a differing previous version as
/// `*.bak.json`.
fn write_versioned(path: &Path, contents: &str) -> Result<()> {
    let contents = format!("{}\n", contents);
    if path.exists() {
        let previous = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
        if previous == contents {
            eprintln!("{} No change", "OK".green().bold());
            return Ok(());
        }
        let backup = path.with_extension("bak.json");
        std::fs::rename(path, &backup)
            .wrap_err_with(|| format!("Failed to back up {}", path.display()))?;
        eprintln!(
            "   Previous version moved to {}",
            backup.display().to_string().yellow()
        );
    }

    std::fs::write(path, contents)
        .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
    eprintln!(
        "{} Wrote {}",
        "OK".green().bold(),
        path.display()
    );
    Ok(())
}

struct CheckOptions {
    content: PathBuf,
    config: Option<PathBuf>,
    catalog: Option<PathBuf>,
    format: Option<String>,
    by: Option<String>,
    out_dir: Option<PathBuf>,
    check: bool,
}

fn run_check_command(options: CheckOptions) -> Result<()> {
    let format = match options.format.as_deref() {
        Some(s) => OutputFormat::from_str(s).ok_or_else(|| {
            eyre::eyre!("Unknown format '{}'. Valid formats: text, stderr, json, html", s)
        })?,
        None => OutputFormat::default(),
    };
    let by = match options.by.as_deref() {
        Some(s) => GroupBy::from_str(s)
            .ok_or_else(|| eyre::eyre!("Unknown grouping '{}'. Valid groupings: file, rule", s))?,
        None => GroupBy::default(),
    };

    let config_path = options.config.unwrap_or_else(|| PathBuf::from("config.yml"));
    let config = load_config(&config_path)?;
    let rules = rules::enabled(&config);
    if rules.is_empty() {
        tracing::warn!("No rules are enabled in {}", config_path.display());
    }

    let catalog_path = options.catalog.unwrap_or_else(|| PathBuf::from("data.json"));
    eprintln!(
        "{} Loading catalog from {}...",
        "->".blue().bold(),
        catalog_path.display()
    );
    let mut catalog = Catalog::load(&catalog_path)?;
    let adjusted = apply_documentation_conventions(&mut catalog)?;
    eprintln!(
        "   Loaded {} global entities ({} parameter adjustments)",
        catalog.len().to_string().green(),
        adjusted
    );

    eprintln!(
        "{} Loading pages under {}...",
        "->".blue().bold(),
        options.content.display()
    );
    let run = RunContext::load(&options.content, catalog, &config.exclude_set()?)?;
    eprintln!("   Found {} pages", run.documents().len().to_string().green());

    eprintln!("{} Running {} rules...", "->".blue().bold(), rules.len());
    let reports = rules::run(&run, &rules);
    tracing::info!("Cached {} page descriptions", run.descriptions().len());

    let rendered = render_report(&reports, format, by);
    match format.file_name() {
        Some(name) => {
            let out_dir = options.out_dir.unwrap_or_else(|| PathBuf::from("generated"));
            std::fs::create_dir_all(&out_dir)
                .wrap_err_with(|| format!("Failed to create {}", out_dir.display()))?;
            let path = out_dir.join(name);
            std::fs::write(&path, rendered)
                .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
            eprintln!("{} Wrote report to {}", "OK".green().bold(), path.display());
        }
        None if format == OutputFormat::Stderr => eprint!("{}", rendered),
        None => print!("{}", rendered),
    }

    if options.check && !reports.is_empty() {
        eprintln!(
            "{} {} files have issues",
            "!".red().bold(),
            reports.len().to_string().red()
        );
        std::process::exit(1);
    }

    Ok(())
}
