//! Lowercheck - Builtin Lowering Verifier
//!
//! CLI entry point. Exit status: 0 when every case passes, 1 when any case
//! fails, 2 on configuration or other fatal errors.

use anyhow::{Context, Result};
use clap::Parser;
use lowercheck::{
    parse_features, summarize, Catalog, CatalogSource, Driver, EngineKind, FeatureSet,
    LowercheckConfig, LoweringAdapter, ReportFormat, VerifyError, EXIT_CONFIG, EXIT_FAILED,
    EXIT_PASSED,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "lowercheck")]
#[command(version)]
#[command(about = "Verify that vector builtins lower to the expected target operations", long_about = None)]
struct Cli {
    /// Enabled target features, comma-separated (empty string for none)
    #[arg(long, value_name = "LIST")]
    features: Option<String>,

    /// Catalog file, or `embedded` for the built-in FMA4 table
    #[arg(long, value_name = "PATH")]
    catalog: Option<String>,

    /// Config file (default: lowercheck.toml in this or a parent directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Lowering engine
    #[arg(long, value_enum)]
    engine: Option<EngineKind>,

    /// Report format
    #[arg(long, value_enum)]
    format: Option<ReportFormat>,

    /// Print the loaded catalog and exit
    #[arg(long)]
    list: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    match cmd_verify(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("error: {:#}", err);
            let code = err
                .downcast_ref::<VerifyError>()
                .map_or(EXIT_CONFIG, VerifyError::exit_code);
            ExitCode::from(code)
        }
    }
}

fn cmd_verify(cli: &Cli) -> Result<u8> {
    let config = match &cli.config {
        Some(path) => LowercheckConfig::load(path)
            .map_err(VerifyError::from)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => LowercheckConfig::load_from_cwd()
            .map_err(VerifyError::from)
            .context("Failed to load lowercheck.toml")?,
    };

    let features: FeatureSet = match &cli.features {
        Some(list) => parse_features(list),
        None => parse_features(&config.target.features.join(",")),
    };

    let source = cli
        .catalog
        .as_deref()
        .map(CatalogSource::from_arg)
        .unwrap_or_else(|| config.catalog_source());
    let catalog = Catalog::load(&source, &config.target.default_feature)
        .map_err(VerifyError::from)
        .with_context(|| format!("Failed to load catalog {}", source))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if cli.list {
        out.write_all(catalog.render().as_bytes())?;
        return Ok(EXIT_PASSED);
    }

    let kind = cli.engine.unwrap_or(config.engine.kind);
    let engine = config.engine.build(kind).map_err(VerifyError::from)?;
    let adapter = LoweringAdapter::new(engine);
    let engine_name = adapter.engine_name().to_string();

    let verbose = cli.verbose || config.report.verbose;
    let format = cli.format.unwrap_or(config.report.format);
    let mut driver = Driver::new(&catalog, adapter, features.clone())
        .with_prefix(config.target.prefix.clone())
        .verbose(verbose && format == ReportFormat::Text);

    let (results, summary) = match format {
        ReportFormat::Text => {
            let results = driver.run(&mut out)?;
            let summary = summarize(&results);
            writeln!(out, "{}", summary)?;
            (results, summary)
        }
        ReportFormat::Json => {
            let results = driver.run(&mut io::sink())?;
            let summary = summarize(&results);
            let cases: Vec<serde_json::Value> = results
                .iter()
                .map(|r| -> Result<serde_json::Value, serde_json::Error> {
                    let mut value = serde_json::to_value(r)?;
                    if !r.passed {
                        value["message"] = r.failure_line(driver.prefix()).into();
                    }
                    Ok(value)
                })
                .collect::<Result<_, _>>()?;
            let report = serde_json::json!({
                "catalog": source.to_string(),
                "engine": engine_name,
                "features": features,
                "summary": summary,
                "results": cases,
            });
            serde_json::to_writer_pretty(&mut out, &report)?;
            writeln!(out)?;
            (results, summary)
        }
    };
    out.flush()?;

    log::debug!("{} results reported", results.len());
    Ok(if summary.is_success() {
        EXIT_PASSED
    } else {
        EXIT_FAILED
    })
}
