//! relq CLI - Translate query models to parameterized SQL
//!
//! Usage:
//!   relq translate --query <query.json> [--catalog <catalog.json>] [--dialect <dialect>]
//!   relq check-catalog <catalog.json>
//!
//! Examples:
//!   relq translate --query cooks.json --catalog kitchen.toml --dialect postgres
//!   relq translate --query cooks.json --format json
//!   relq check-catalog kitchen.toml

use clap::{Parser, Subcommand, ValueEnum};
use relq::config::Settings;
use relq::metadata::StaticMappingResolver;
use relq::query::QueryModel;
use relq::sql::{Dialect, PagingStrategy};
use relq::translation::SqlQueryTranslator;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "relq")]
#[command(about = "relq - Translate structured object queries into parameterized SQL")]
#[command(version)]
struct Cli {
    /// Config file (defaults to $RELQ_CONFIG, ./relq.toml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a JSON query model to SQL
    Translate {
        /// Path to the query model (.json)
        #[arg(short, long)]
        query: PathBuf,

        /// Mapping catalog (.json or .toml); falls back to the configured catalog
        #[arg(short, long)]
        catalog: Option<PathBuf>,

        /// SQL dialect to generate (overrides the config file)
        #[arg(short, long)]
        dialect: Option<DialectArg>,

        /// Paging strategy (overrides the dialect default)
        #[arg(short, long)]
        paging: Option<PagingArg>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Check a mapping catalog for dangling keys and relations
    CheckCatalog {
        /// Path to the catalog (.json or .toml)
        file: PathBuf,
    },
}

#[derive(Clone, ValueEnum)]
enum DialectArg {
    Tsql,
    Postgres,
    Duckdb,
    Mysql,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Tsql => Dialect::TSql,
            DialectArg::Postgres => Dialect::Postgres,
            DialectArg::Duckdb => Dialect::DuckDb,
            DialectArg::Mysql => Dialect::MySql,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum PagingArg {
    LimitOffset,
    OffsetFetch,
}

impl From<PagingArg> for PagingStrategy {
    fn from(arg: PagingArg) -> Self {
        match arg {
            PagingArg::LimitOffset => PagingStrategy::LimitOffset,
            PagingArg::OffsetFetch => PagingStrategy::OffsetFetch,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// SQL followed by one comment line per parameter
    Text,
    /// The command as JSON
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    let settings = match settings {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_logging(&settings);

    match cli.command {
        Commands::Translate {
            query,
            catalog,
            dialect,
            paging,
            format,
        } => cmd_translate(&settings, query, catalog, dialect, paging, format),
        Commands::CheckCatalog { file } => cmd_check_catalog(&file),
    }
}

/// Log to stderr, filtered by `RELQ_LOG` or the configured filter.
fn init_logging(settings: &Settings) {
    let filter = EnvFilter::try_from_env("RELQ_LOG")
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_translate(
    settings: &Settings,
    query: PathBuf,
    catalog: Option<PathBuf>,
    dialect: Option<DialectArg>,
    paging: Option<PagingArg>,
    format: OutputFormat,
) -> ExitCode {
    let source = match fs::read_to_string(&query) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", query.display(), e);
            return ExitCode::FAILURE;
        }
    };
    let model: QueryModel = match serde_json::from_str(&source) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Invalid query model '{}': {}", query.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let catalog = match catalog {
        Some(path) => path,
        None => match settings.catalog_path() {
            Ok(Some(path)) => path,
            Ok(None) => {
                eprintln!("No catalog given and none configured");
                return ExitCode::FAILURE;
            }
            Err(e) => {
                eprintln!("Configuration error: {}", e);
                return ExitCode::FAILURE;
            }
        },
    };
    let resolver = match StaticMappingResolver::from_file(&catalog) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error loading catalog '{}': {}", catalog.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let mut options = settings.translation_options();
    if let Some(dialect) = dialect {
        options = options.with_dialect(dialect.into());
    }
    if let Some(paging) = paging {
        options = options.with_paging(paging.into());
    }

    let translator = SqlQueryTranslator::new(resolver).with_options(options);
    match translator.translate(&model) {
        Ok(command) => {
            match format {
                OutputFormat::Text => println!("{}", command),
                OutputFormat::Json => match serde_json::to_string_pretty(&command) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("Error serializing command: {}", e);
                        return ExitCode::FAILURE;
                    }
                },
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Translation error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_check_catalog(file: &Path) -> ExitCode {
    let resolver = match StaticMappingResolver::from_file(file) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error loading catalog '{}': {}", file.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let problems = resolver.catalog().validate();
    if problems.is_empty() {
        println!(
            "{}: {} entities, no problems found",
            file.display(),
            resolver.catalog().entities.len()
        );
        return ExitCode::SUCCESS;
    }

    eprintln!("{}:", file.display());
    for problem in &problems {
        eprintln!("  - {}", problem);
    }
    ExitCode::FAILURE
}
