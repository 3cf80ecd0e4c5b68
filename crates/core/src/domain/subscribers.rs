use super::DiscoveryDomain;
use crate::catalog::{EventSubscriberMarker, MarkerCatalog, Placement};
use crate::report::ScanReport;
use markscope_api::{ClassDescriptor, ClassList, DomainId, MarkerKind};

pub struct EventSubscribers;

impl DiscoveryDomain for EventSubscribers {
    type Output = ClassList;

    const ID: DomainId = DomainId::EventSubscribers;
    const MARKER: MarkerKind = MarkerKind::EventSubscriber;

    fn collect(
        class: &ClassDescriptor,
        catalog: &MarkerCatalog,
        output: &mut ClassList,
        report: &mut ScanReport,
    ) {
        let markers = catalog.collect::<EventSubscriberMarker>(
            class.name.as_str(),
            &class.markers,
            Placement::Class,
            report,
        );
        if !markers.is_empty() {
            output.push(class.name.clone());
        }
    }
}
