use super::DiscoveryDomain;
use crate::catalog::{MarkerCatalog, Placement, PolicyMarker};
use crate::report::ScanReport;
use markscope_api::{ClassDescriptor, ClassMap, DomainId, MarkerKind};

/// Policies: model -> policy class. A later policy for the same model wins.
pub struct Policies;

impl DiscoveryDomain for Policies {
    type Output = ClassMap;

    const ID: DomainId = DomainId::Policies;
    const MARKER: MarkerKind = MarkerKind::Policy;

    fn collect(
        class: &ClassDescriptor,
        catalog: &MarkerCatalog,
        output: &mut ClassMap,
        report: &mut ScanReport,
    ) {
        for marker in
            catalog.collect::<PolicyMarker>(class.name.as_str(), &class.markers, Placement::Class, report)
        {
            output.insert(marker.model, class.name.clone());
        }
    }
}
