use super::DiscoveryDomain;
use crate::catalog::{EventListenerMarker, MarkerCatalog, Placement};
use crate::report::ScanReport;
use markscope_api::{ClassDescriptor, DomainId, ListenerMap, ListenerSpec, MarkerKind};

/// Event listeners: event -> every class or `Class@method` listening to it.
pub struct EventListeners;

impl DiscoveryDomain for EventListeners {
    type Output = ListenerMap;

    const ID: DomainId = DomainId::EventListeners;
    const MARKER: MarkerKind = MarkerKind::EventListener;
    const INSPECTS_METHODS: bool = true;

    fn collect(
        class: &ClassDescriptor,
        catalog: &MarkerCatalog,
        output: &mut ListenerMap,
        report: &mut ScanReport,
    ) {
        let owner = class.name.as_str();
        for marker in catalog.collect::<EventListenerMarker>(owner, &class.markers, Placement::Class, report) {
            output
                .entry(marker.event)
                .or_default()
                .push(ListenerSpec::ClassOnly(class.name.clone()));
        }

        for method in class.public_methods() {
            let owner = format!("{}@{}", class.name, method.name);
            for marker in
                catalog.collect::<EventListenerMarker>(&owner, &method.markers, Placement::Method, report)
            {
                output
                    .entry(marker.event)
                    .or_default()
                    .push(ListenerSpec::ClassMethod {
                        class: class.name.clone(),
                        method: method.name.clone(),
                    });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DiscoveryShape;
    use markscope_api::{
        ClassKind, ClassName, MarkerInstance, MarkerValue, MethodDescriptor, Visibility,
    };

    #[test]
    fn test_class_and_method_forms_share_event() {
        let catalog = MarkerCatalog::default();
        let name = catalog.marker_name(MarkerKind::EventListener).clone();
        let on = |event: &str| MarkerInstance::new(name.clone()).arg(MarkerValue::ClassRef(ClassName::new(event)));

        let class = ClassDescriptor::new("App\\Listener\\Audit", ClassKind::Class)
            .with_marker(on("App\\Event\\Paid"))
            .with_marker(on("App\\Event\\Refunded"))
            .with_method(MethodDescriptor {
                name: "onPaid".into(),
                visibility: Visibility::Public,
                is_static: false,
                markers: vec![on("App\\Event\\Paid")],
            });

        let mut output = ListenerMap::new();
        let mut report = ScanReport::new();
        EventListeners::collect(&class, &catalog, &mut output, &mut report);
        output.normalize();

        let paid: Vec<String> = output[&ClassName::new("App\\Event\\Paid")]
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(paid, vec!["App\\Listener\\Audit", "App\\Listener\\Audit@onPaid"]);
        assert_eq!(output.len(), 2);
        assert!(report.is_empty());
    }
}
