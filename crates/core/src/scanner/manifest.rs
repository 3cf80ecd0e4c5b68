use super::ScanContext;
use crate::domain::{DiscoveryDomain, DiscoveryShape};
use crate::manifest::{Manifest, normalized_path};
use crate::report::{DiscoveryFailure, ScanReport};
use markscope_api::ClassName;
use std::path::Path;
use tracing::debug;

/// Manifest entries under `namespace_prefix` whose file path contains
/// `fragment`, in manifest order.
pub fn candidates<'m>(
    manifest: &'m Manifest,
    namespace_prefix: &'m str,
    fragment: &'m str,
) -> impl Iterator<Item = (&'m ClassName, &'m Path)> + 'm {
    manifest.iter().filter(move |(class, path)| {
        class.in_namespace(namespace_prefix) && normalized_path(path).contains(fragment)
    })
}

pub fn scan<D: DiscoveryDomain>(
    ctx: &ScanContext<'_>,
    manifest: &Manifest,
    report: &mut ScanReport,
) -> D::Output {
    let fragment = ctx.config.domains.fragment(D::ID);
    let mut output = D::Output::default();
    let mut inspected = 0usize;

    for (class, _) in candidates(manifest, &ctx.config.namespace_prefix, fragment) {
        inspected += 1;
        match ctx.introspector.reflect(class) {
            Ok(descriptor) => ctx.visit::<D>(&descriptor, &mut output, report),
            Err(err) => report.record(DiscoveryFailure::IntrospectionFailure, class.as_str(), err.to_string()),
        }
    }

    debug!(
        "Manifest scan for {}: {} candidates, {} entries",
        D::ID,
        inspected,
        output.entry_count()
    );
    output
}
