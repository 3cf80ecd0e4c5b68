use super::DiscoveryDomain;
use crate::catalog::{ConsoleCommandMarker, MarkerCatalog, Placement};
use crate::config::DiscoveryConfig;
use crate::report::ScanReport;
use markscope_api::{ClassDescriptor, ClassList, ClassName, DomainId, MarkerKind};

/// Console commands: marked classes extending the console command base.
pub struct ConsoleCommands;

impl DiscoveryDomain for ConsoleCommands {
    type Output = ClassList;

    const ID: DomainId = DomainId::ConsoleCommands;
    const MARKER: MarkerKind = MarkerKind::ConsoleCommand;

    fn supertype(config: &DiscoveryConfig) -> Option<&ClassName> {
        Some(&config.supertypes.console_command)
    }

    fn collect(
        class: &ClassDescriptor,
        catalog: &MarkerCatalog,
        output: &mut ClassList,
        report: &mut ScanReport,
    ) {
        let markers = catalog.collect::<ConsoleCommandMarker>(
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
