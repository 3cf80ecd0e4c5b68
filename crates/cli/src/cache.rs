use crate::DomainSelection;
use crate::view;
use clap::Subcommand;
use markscope_api::{CacheStats, DomainId};
use markscope_core::{DiscoveryEngine, ScanReport};
use tabled::{Table, Tabled};
use tracing::info;

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Run live discovery and write the artifacts
    Build {
        #[arg(value_name = "DOMAIN", default_value = "all")]
        domain: DomainSelection,
    },
    /// List artifacts with their entry counts and content hashes
    Status,
    /// Delete artifacts
    Clear {
        #[arg(value_name = "DOMAIN", default_value = "all")]
        domain: DomainSelection,
    },
}

#[derive(Tabled)]
struct ArtifactRow {
    #[tabled(rename = "Domain")]
    domain: String,
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Entries")]
    entries: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Hash")]
    hash: String,
}

pub fn run(engine: &DiscoveryEngine, cmd: CacheCommands) -> anyhow::Result<ScanReport> {
    let mut report = ScanReport::new();
    match cmd {
        CacheCommands::Build { domain } => {
            for domain in domain.domains() {
                let (path, discovery) = engine.build_cache(domain)?;
                info!("Wrote {} entries for {} to {}", discovery.output.len(), domain, path.display());
                println!("{:<18} {:>5} entries  {}", domain.as_str(), discovery.output.len(), path.display());
                report.merge(discovery.report);
            }
        }
        CacheCommands::Status => status(engine)?,
        CacheCommands::Clear { domain } => {
            for domain in domain.domains() {
                let path = engine.cache().path(domain).display().to_string();
                if engine.cache().clear(domain)? {
                    println!("Cleared {} ({})", domain, path);
                } else {
                    println!("Nothing to clear for {}", domain);
                }
            }
        }
    }
    Ok(report)
}

fn status(engine: &DiscoveryEngine) -> anyhow::Result<()> {
    let cache = engine.cache();
    let summaries = DomainId::ALL
        .into_iter()
        .map(|domain| cache.inspect(domain))
        .collect::<markscope_core::Result<Vec<_>>>()?;

    let rows: Vec<ArtifactRow> = DomainId::ALL
        .into_iter()
        .zip(&summaries)
        .map(|(domain, summary)| match summary {
            Some(s) => ArtifactRow {
                domain: domain.to_string(),
                path: s.path.display().to_string(),
                entries: s.entry_count.to_string(),
                size: view::format_size(s.size_bytes),
                hash: s.hash.clone(),
            },
            None => ArtifactRow {
                domain: domain.to_string(),
                path: cache.path(domain).display().to_string(),
                entries: "-".to_string(),
                size: "-".to_string(),
                hash: "missing".to_string(),
            },
        })
        .collect();
    println!("{}", Table::new(rows));

    let stats = CacheStats::from_summaries(&summaries);
    println!("Present:       {}", stats.present);
    println!("Missing:       {}", stats.missing);
    println!("Total Entries: {}", stats.total_entries);
    Ok(())
}
