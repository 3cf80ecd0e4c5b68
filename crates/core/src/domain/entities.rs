use super::DiscoveryDomain;
use crate::catalog::{DomainEntityMarker, MarkerCatalog, Placement};
use crate::report::ScanReport;
use markscope_api::{ClassDescriptor, ClassMap, DomainId, MarkerKind};

/// Persistence model -> domain entity. The marked class is the model itself.
pub struct DomainEntities;

impl DiscoveryDomain for DomainEntities {
    type Output = ClassMap;

    const ID: DomainId = DomainId::DomainEntities;
    const MARKER: MarkerKind = MarkerKind::DomainEntity;

    fn collect(
        class: &ClassDescriptor,
        catalog: &MarkerCatalog,
        output: &mut ClassMap,
        report: &mut ScanReport,
    ) {
        for marker in catalog.collect::<DomainEntityMarker>(
            class.name.as_str(),
            &class.markers,
            Placement::Class,
            report,
        ) {
            output.insert(class.name.clone(), marker.entity);
        }
    }
}
