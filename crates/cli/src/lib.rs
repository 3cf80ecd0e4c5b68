mod cache;
mod discover;
mod generate;
mod view;

pub use cache::CacheCommands;
pub use generate::GenerateCommands;

use clap::{Parser, Subcommand};
use markscope_api::{ApiError, DomainId};
use markscope_core::{DiscoveryConfig, Environment, ScanReport};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

#[derive(Parser)]
#[command(
    name = "markscope",
    version,
    about = "Marker-driven class discovery for PHP applications",
    long_about = "Markscope finds console commands, event listeners and subscribers, policies, \
                  domain entities and UI components by the attributes they carry. Results are \
                  read from cache artifacts when present, and discovered live from the Composer \
                  class map or the source tree otherwise."
)]
pub struct Cli {
    /// Project root. Defaults to the current directory.
    #[arg(long, global = true, value_name = "PROJECT_PATH")]
    pub base: Option<PathBuf>,

    /// Config file. Defaults to markscope.toml under the project root.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Override the configured environment (local, testing, staging, production)
    #[arg(long, global = true, value_name = "ENV")]
    pub env: Option<Environment>,

    /// Exit non-zero when introspection or marker failures were recorded
    #[arg(long, global = true)]
    pub strict: bool,

    /// Also write logs to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run live discovery, ignoring cache artifacts
    #[command(
        long_about = "Scans the class map (and falls back to the source tree) for one domain or \
                      all of them. Nothing is written; use `cache build` to persist the result."
    )]
    Discover {
        #[arg(value_name = "DOMAIN", default_value = "all")]
        domain: DomainSelection,
        /// Print JSON instead of tables
        #[arg(long)]
        json: bool,
    },
    /// Resolve domains the way the application does at boot
    #[command(
        long_about = "Reads the cache artifact when present. Without one, live discovery only \
                      runs in the local environment; elsewhere the result is empty."
    )]
    Resolve {
        #[arg(value_name = "DOMAIN", default_value = "all")]
        domain: DomainSelection,
        #[arg(long)]
        json: bool,
    },
    /// Build, inspect or clear cache artifacts
    #[command(subcommand)]
    Cache(CacheCommands),
    /// List persistence models marked for read-model generation
    ReadModels {
        #[arg(long)]
        json: bool,
    },
    /// Print generated read-model sources
    #[command(subcommand)]
    Generate(GenerateCommands),
}

/// One domain, or every domain in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainSelection {
    All,
    One(DomainId),
}

impl DomainSelection {
    pub fn domains(&self) -> Vec<DomainId> {
        match self {
            DomainSelection::All => DomainId::ALL.to_vec(),
            DomainSelection::One(domain) => vec![*domain],
        }
    }
}

impl FromStr for DomainSelection {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(DomainSelection::All);
        }
        s.parse().map(DomainSelection::One)
    }
}

pub fn run() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let _guard = markscope_runtime::init_logging("cli", cli.verbose);
    Ok(if execute(cli)? { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Runs one command. Returns `false` when strict mode rejects the result.
pub fn execute(cli: Cli) -> anyhow::Result<bool> {
    let config = load_config(&cli)?;
    let strict = config.strict;
    let engine = markscope_runtime::build_default_engine(config);

    let report: ScanReport = match cli.command {
        Commands::Discover { domain, json } => discover::run(&engine, domain, true, json)?,
        Commands::Resolve { domain, json } => discover::run(&engine, domain, false, json)?,
        Commands::Cache(cmd) => cache::run(&engine, cmd)?,
        Commands::ReadModels { json } => generate::list(&engine, json)?,
        Commands::Generate(cmd) => generate::run(&engine, cmd)?,
    };

    if strict && report.has_errors() {
        eprintln!("{}", view::report_table(&report));
        return Ok(false);
    }
    Ok(true)
}

fn load_config(cli: &Cli) -> anyhow::Result<DiscoveryConfig> {
    let base = match &cli.base {
        Some(path) => path.clone(),
        None => std::env::current_dir()?,
    };
    let mut config = markscope_runtime::load_config(&base, cli.config.as_deref())?;
    if let Some(env) = cli.env {
        config = config.with_environment(env);
    }
    if cli.strict {
        config = config.with_strict(true);
    }
    Ok(config)
}
