use super::{ReadModelConfig, ReadModelDescriptor};
use crate::catalog::{Placement, ReadModelMarker};
use crate::scanner::{ScanContext, StructuralIndex};
use crate::report::ScanReport;
use markscope_api::{ClassName, MarkerKind};
use std::collections::BTreeMap;
use tracing::{debug, trace};

const PERSISTENCE_MODEL: [&str; 3] = ["Application", "Persistence", "Model"];

/// Concrete persistence models (by supertype) carrying the read-model marker.
pub fn discover(
    ctx: &ScanContext<'_>,
    index: &StructuralIndex,
    report: &mut ScanReport,
) -> BTreeMap<ClassName, ReadModelDescriptor> {
    let base = &ctx.config.supertypes.persistence_model;
    let mut found = BTreeMap::new();

    for class in index.classes() {
        if !class.kind.is_concrete() {
            continue;
        }
        let class = ctx.canonical(class);
        if !ctx.catalog.has_marker(MarkerKind::ReadModel, &class.markers) {
            continue;
        }
        if !ctx.introspector.is_subclass_of(&class, base) {
            trace!("Skipping {}: not a {}", class.name, base);
            continue;
        }

        let markers = ctx.catalog.collect::<ReadModelMarker>(
            class.name.as_str(),
            &class.markers,
            Placement::Class,
            report,
        );
        for mut marker in markers {
            let read_model = marker
                .read_model
                .take()
                .unwrap_or_else(|| infer_read_model_class(&class.name, &ctx.config.bounded_context_root));
            debug!("{} reads into {}", class.name, read_model);
            found.insert(
                class.name.clone(),
                ReadModelDescriptor {
                    model: class.name.clone(),
                    read_model,
                    config: ReadModelConfig::from(marker),
                },
            );
        }
    }

    found
}

/// Conventional read-model class for a persistence model.
///
/// Inside a bounded context (`…\<root>\<Context>\…`) the read model is
/// `…\<root>\<Context>\Application\ReadModel\<Name>`. Elsewhere the last
/// `Application\Persistence\Model` run is rewritten to
/// `Application\ReadModel`; without one, `ReadModel` is appended to the
/// model's namespace.
pub fn infer_read_model_class(model: &ClassName, bounded_context_root: &str) -> ClassName {
    let segments: Vec<&str> = model.segments().collect();
    let name = model.short_name();
    let namespace = &segments[..segments.len() - 1];

    if let Some(root) = namespace.iter().position(|s| *s == bounded_context_root) {
        if root + 1 < namespace.len() {
            let context = &namespace[..=root + 1];
            return ClassName::from_segments(
                context
                    .iter()
                    .copied()
                    .chain(["Application", "ReadModel", name]),
            );
        }
    }

    let run = namespace
        .windows(PERSISTENCE_MODEL.len())
        .rposition(|window| window == PERSISTENCE_MODEL);
    if let Some(start) = run {
        return ClassName::from_segments(
            namespace[..start]
                .iter()
                .copied()
                .chain(["Application", "ReadModel"])
                .chain(namespace[start + PERSISTENCE_MODEL.len()..].iter().copied())
                .chain([name]),
        );
    }

    ClassName::from_segments(namespace.iter().copied().chain(["ReadModel", name]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn infer(model: &str) -> String {
        infer_read_model_class(&ClassName::new(model), "BoundedContexts").to_string()
    }

    #[test]
    fn test_bounded_context_inference() {
        assert_eq!(
            infer("App\\BoundedContexts\\Finance\\Application\\Persistence\\Model\\Invoice"),
            "App\\BoundedContexts\\Finance\\Application\\ReadModel\\Invoice"
        );
        assert_eq!(
            infer("App\\BoundedContexts\\Finance\\Infrastructure\\Model\\Invoice"),
            "App\\BoundedContexts\\Finance\\Application\\ReadModel\\Invoice"
        );
    }

    #[test]
    fn test_shared_kernel_inference() {
        assert_eq!(
            infer("Context\\Application\\Persistence\\Model\\Invoice"),
            "Context\\Application\\ReadModel\\Invoice"
        );
        assert_eq!(
            infer("App\\SharedKernel\\Application\\Persistence\\Model\\Billing\\Invoice"),
            "App\\SharedKernel\\Application\\ReadModel\\Billing\\Invoice"
        );
    }

    #[test]
    fn test_fallback_inference() {
        assert_eq!(infer("App\\Models\\Invoice"), "App\\Models\\ReadModel\\Invoice");
        assert_eq!(infer("Invoice"), "ReadModel\\Invoice");
        assert_eq!(infer("App\\BoundedContexts\\Invoice"), "App\\BoundedContexts\\ReadModel\\Invoice");
    }
}
