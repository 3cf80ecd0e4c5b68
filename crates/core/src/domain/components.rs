use super::DiscoveryDomain;
use crate::catalog::{ComponentMarker, MarkerCatalog, Placement};
use crate::report::ScanReport;
use markscope_api::{AliasMap, ClassDescriptor, DomainId, MarkerKind};

/// UI components: alias -> component class.
pub struct Components;

impl DiscoveryDomain for Components {
    type Output = AliasMap;

    const ID: DomainId = DomainId::Components;
    const MARKER: MarkerKind = MarkerKind::Component;

    fn collect(
        class: &ClassDescriptor,
        catalog: &MarkerCatalog,
        output: &mut AliasMap,
        report: &mut ScanReport,
    ) {
        for marker in
            catalog.collect::<ComponentMarker>(class.name.as_str(), &class.markers, Placement::Class, report)
        {
            output.insert(marker.alias, class.name.clone());
        }
    }
}
