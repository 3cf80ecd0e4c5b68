use crate::DomainSelection;
use crate::view;
use markscope_api::DiscoveryResult;
use markscope_core::{DiscoveryEngine, ScanReport};
use std::collections::BTreeMap;
use tracing::info;

/// Prints one table (or one JSON object) per selected domain.
///
/// `live` skips cache artifacts and the environment gate.
pub fn run(
    engine: &DiscoveryEngine,
    selection: DomainSelection,
    live: bool,
    json: bool,
) -> anyhow::Result<ScanReport> {
    let mut report = ScanReport::new();
    let mut results: BTreeMap<&'static str, DiscoveryResult> = BTreeMap::new();

    for domain in selection.domains() {
        let discovery = if live {
            engine.discover_result(domain)
        } else {
            engine.resolve_result(domain)?
        };
        info!(
            "{}: {} entries via {} in {:?}",
            domain,
            discovery.output.len(),
            discovery.strategy,
            discovery.duration
        );

        if json {
            results.insert(domain.as_str(), discovery.output);
        } else {
            println!(
                "{} ({}, {} entries, {} ms)",
                domain,
                discovery.strategy,
                discovery.output.len(),
                discovery.duration.as_millis()
            );
            if !discovery.output.is_empty() {
                println!("{}", view::result_table(&discovery.output));
            }
            println!();
        }
        report.merge(discovery.report);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }
    Ok(report)
}
