mod common;

use common::*;
use markscope_api::{ClassDescriptor, ClassKind, ClassMap, ClassName, DomainId, MarkerInstance, MarkerValue};
use markscope_core::domain::{
    Components, ConsoleCommands, DomainEntities, EventListeners, EventSubscribers, Policies,
};
use markscope_core::{ClassTable, DiscoveryFailure, Environment, Strategy};
use std::fs;

fn names(classes: &[ClassName]) -> Vec<&str> {
    classes.iter().map(ClassName::as_str).collect()
}

#[test]
fn test_structural_scan_finds_every_domain() {
    let dir = project();
    let engine = engine(local_config(dir.path()));

    let commands = engine.resolve::<ConsoleCommands>();
    assert_eq!(commands.strategy, Strategy::Structural);
    assert_eq!(
        names(&commands.output),
        vec!["App\\Console\\Command\\ReportCommand", "App\\Console\\Command\\SyncCommand"]
    );
    assert_eq!(commands.report.count(DiscoveryFailure::MissingManifest), 1);
    assert_eq!(commands.report.count(DiscoveryFailure::MissingCache), 1);

    let subscribers = engine.resolve::<EventSubscribers>().output;
    assert_eq!(names(&subscribers), vec!["App\\Subscriber\\BillingSubscriber"]);

    let policies = engine.resolve::<Policies>().output;
    let rendered: Vec<(&str, &str)> = policies.iter().map(|(m, p)| (m.as_str(), p.as_str())).collect();
    assert_eq!(
        rendered,
        vec![
            ("App\\Model\\Invoice", "App\\Policy\\InvoicePolicy"),
            ("App\\Model\\User", "App\\Policy\\UserPolicy"),
        ]
    );

    let entities = engine.resolve::<DomainEntities>().output;
    assert_eq!(
        entities.get("App\\BoundedContexts\\Finance\\Application\\Persistence\\Model\\Invoice"),
        Some(&ClassName::new("App\\BoundedContexts\\Finance\\Domain\\Invoice"))
    );

    let components = engine.resolve::<Components>().output;
    assert_eq!(components.get("nav-bar"), Some(&ClassName::new("App\\Presentation\\Component\\Navigation")));
}

#[test]
fn test_listener_shape() {
    let dir = project();
    let engine = engine(local_config(dir.path()));
    let listeners = engine.resolve::<EventListeners>().output;

    let paid: Vec<String> = listeners[&ClassName::new("App\\Event\\InvoicePaid")]
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(
        paid,
        vec![
            "App\\Listener\\AuditListener",
            "App\\Listener\\AuditListener@onPaid",
            "App\\Listener\\MailListener",
        ]
    );

    let refunded: Vec<String> = listeners[&ClassName::new("App\\Event\\InvoiceRefunded")]
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(refunded, vec!["App\\Listener\\AuditListener@onPaid"]);
}

#[test]
fn test_failed_candidate_does_not_stop_the_scan() {
    let dir = project();
    write(dir.path(), "src/Policy/OrphanPolicy.php", MALFORMED_POLICY);
    let engine = engine(local_config(dir.path()));

    let policies = engine.discover::<Policies>();
    assert_eq!(policies.output.len(), 2);
    assert_eq!(policies.report.count(DiscoveryFailure::IntrospectionFailure), 1);
    assert_eq!(policies.report.count(DiscoveryFailure::MalformedMarkerInstance), 1);
    assert!(policies.report.has_errors());
    let broken = policies
        .report
        .errors()
        .find(|d| d.failure == DiscoveryFailure::IntrospectionFailure)
        .unwrap();
    assert!(broken.subject.ends_with("BrokenPolicy.php"));
}

#[test]
fn test_abstract_and_interface_targets_are_excluded() {
    let dir = project();
    let engine = engine(local_config(dir.path()));

    let commands = engine.discover::<ConsoleCommands>().output;
    assert!(!names(&commands).contains(&"App\\Console\\Command\\BaseCommand"));
    assert!(!names(&commands).contains(&"App\\Console\\Command\\Helper"));

    let policies = engine.discover::<Policies>().output;
    assert!(policies.values().all(|p| p.as_str() != "App\\Policy\\PolicyContract"));
}

#[test]
fn test_repeated_runs_are_byte_identical() {
    let dir = project();
    let engine = engine(local_config(dir.path()));

    let (path, first) = engine.build_cache(DomainId::EventListeners).unwrap();
    let first_bytes = fs::read(&path).unwrap();
    let (_, second) = engine.build_cache(DomainId::EventListeners).unwrap();
    let second_bytes = fs::read(&path).unwrap();

    assert_eq!(first.output, second.output);
    assert_eq!(first_bytes, second_bytes);

    let fresh = common::engine(local_config(dir.path()));
    assert_eq!(fresh.discover_result(DomainId::EventListeners).output, first.output);
}

#[test]
fn test_present_cache_wins() {
    let dir = project();
    write(
        dir.path(),
        "bootstrap/cache/policies.json",
        r#"{"App\\Model\\Other": "App\\Policy\\Cached"}"#,
    );
    write(dir.path(), "bootstrap/cache/console-commands.json", "[]");
    let engine = engine(local_config(dir.path()));

    let policies = engine.resolve::<Policies>();
    assert_eq!(policies.strategy, Strategy::Cache);
    let mut expected = ClassMap::new();
    expected.insert(ClassName::new("App\\Model\\Other"), ClassName::new("App\\Policy\\Cached"));
    assert_eq!(policies.output, expected);

    let commands = engine.resolve::<ConsoleCommands>();
    assert_eq!(commands.strategy, Strategy::Cache);
    assert!(commands.output.is_empty());
}

#[test]
fn test_cache_is_returned_verbatim() {
    let dir = project();
    write(
        dir.path(),
        "bootstrap/cache/event-subscribers.json",
        r#"["App\\Z", "App\\A", "App\\Z"]"#,
    );
    let engine = engine(local_config(dir.path()));

    let subscribers = engine.resolve::<EventSubscribers>().output;
    assert_eq!(names(&subscribers), vec!["App\\Z", "App\\A", "App\\Z"]);
}

#[test]
fn test_live_discovery_only_in_local_environment() {
    let dir = project();
    let config = local_config(dir.path()).with_environment(Environment::Production);
    let engine = engine(config);

    let commands = engine.resolve::<ConsoleCommands>();
    assert_eq!(commands.strategy, Strategy::None);
    assert!(commands.output.is_empty());
    assert_eq!(commands.report.count(DiscoveryFailure::MissingCache), 1);

    // the cache build step still runs live discovery
    assert_eq!(engine.discover::<ConsoleCommands>().output.len(), 2);
}

#[test]
fn test_malformed_cache_is_the_callers_problem() {
    let dir = project();
    write(dir.path(), "bootstrap/cache/components.json", "{\"nav\": ");
    let engine = engine(local_config(dir.path()));

    assert!(engine.try_resolve::<Components>().is_err());
    let fallback = engine.resolve::<Components>();
    assert!(fallback.output.is_empty());
    assert_eq!(fallback.strategy, Strategy::None);
}

#[test]
fn test_manifest_scan_runs_first() {
    let dir = project();
    let root = dir.path();
    write(
        root,
        "classmap.json",
        r#"{
            "App\\Console\\Command\\SyncCommand": "src/Console/Command/SyncCommand.php",
            "App\\Console\\Command\\ReportCommand": "src/Console/Command/ReportCommand.php",
            "App\\Policy\\InvoicePolicy": "src/Policy/InvoicePolicy.php",
            "App\\Policy\\GhostPolicy": "src/Policy/GhostPolicy.php",
            "Vendor\\Policy\\VendorPolicy": "vendor/acme/src/Policy/VendorPolicy.php"
        }"#,
    );
    let engine = engine(local_config(root).with_manifest_path("classmap.json"));

    let policies = engine.resolve::<Policies>();
    assert_eq!(policies.strategy, Strategy::Manifest);
    assert_eq!(policies.output.len(), 1);
    assert_eq!(policies.report.count(DiscoveryFailure::IntrospectionFailure), 1);
    assert_eq!(policies.report.count(DiscoveryFailure::MissingManifest), 0);

    // the base command is not in the manifest, so the report command's
    // ancestry cannot be established
    let commands = engine.resolve::<ConsoleCommands>();
    assert_eq!(commands.strategy, Strategy::Manifest);
    assert_eq!(names(&commands.output), vec!["App\\Console\\Command\\SyncCommand"]);
}

#[test]
fn test_manifest_without_candidates_falls_back() {
    let dir = project();
    write(
        dir.path(),
        "classmap.json",
        r#"{"Vendor\\Listener\\Thing": "vendor/acme/src/Listener/Thing.php"}"#,
    );
    let engine = engine(local_config(dir.path()).with_manifest_path("classmap.json"));

    let listeners = engine.resolve::<EventListeners>();
    assert_eq!(listeners.strategy, Strategy::Structural);
    assert_eq!(listeners.output.len(), 2);
}

#[test]
fn test_composer_classmap_manifest() {
    let dir = project();
    write(
        dir.path(),
        "vendor/composer/autoload_classmap.php",
        r#"<?php

// autoload_classmap.php @generated by Composer

$vendorDir = dirname(__DIR__);
$baseDir = dirname($vendorDir);

return array(
    'App\\Presentation\\Component\\Navigation' => $baseDir . '/src/Presentation/Component/Navigation.php',
    'Composer\\InstalledVersions' => $vendorDir . '/composer/InstalledVersions.php',
);
"#,
    );
    let engine = engine(local_config(dir.path()));

    assert_eq!(engine.manifest().map(|m| m.len()), Some(2));
    let components = engine.resolve::<Components>();
    assert_eq!(components.strategy, Strategy::Manifest);
    assert_eq!(components.output.len(), 1);
}

#[test]
fn test_registered_classes_are_discovered_without_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("src")).unwrap();
    let subscriber = ClassDescriptor::new("App\\Subscriber\\Registered", ClassKind::Class)
        .with_marker(MarkerInstance::new("Discovery\\Attribute\\Event\\AsEventSubscriber"));
    let component = ClassDescriptor::new("App\\Presentation\\Component\\Card", ClassKind::Class).with_marker(
        MarkerInstance::new("Discovery\\Attribute\\Component\\AsComponent")
            .arg(MarkerValue::Str("card".into())),
    );

    let engine = engine(local_config(dir.path())).with_table(ClassTable::from_iter([subscriber, component]));

    assert_eq!(
        names(&engine.resolve::<EventSubscribers>().output),
        vec!["App\\Subscriber\\Registered"]
    );
    assert!(engine.resolve::<Components>().output.contains_key("card"));
}

#[test]
fn test_msgpack_cache_round_trip_through_resolve() {
    let dir = project();
    let config = local_config(dir.path())
        .with_cache_path(DomainId::EventListeners, "bootstrap/cache/event-listeners.msgpack");
    let engine = engine(config);

    let (path, built) = engine.build_cache(DomainId::EventListeners).unwrap();
    assert!(path.ends_with("event-listeners.msgpack"));

    let resolved = engine.resolve_result(DomainId::EventListeners).unwrap();
    assert_eq!(resolved.strategy, Strategy::Cache);
    assert_eq!(resolved.output, built.output);

    let summary = engine.cache().inspect(DomainId::EventListeners).unwrap().unwrap();
    assert_eq!(summary.entry_count, 2);
}

#[test]
fn test_missing_source_root_yields_empty_results() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(local_config(dir.path()));

    let listeners = engine.resolve::<EventListeners>();
    assert!(listeners.output.is_empty());
    assert_eq!(listeners.strategy, Strategy::None);
    assert_eq!(listeners.report.count(DiscoveryFailure::ScannerUnavailable), 1);
}

const AUDIT_ATTRIBUTE: &str = r#"<?php
namespace App\Attribute;

use Discovery\Attribute\Event\AsEventListener;

#[\Attribute]
final class AsAuditListener extends AsEventListener
{
}
"#;

const REFUND_LISTENER: &str = r#"<?php
namespace App\Listener;

use App\Attribute\AsAuditListener;
use App\Event\InvoiceRefunded;

#[AsAuditListener(InvoiceRefunded::class)]
class RefundListener
{
    #[AsAuditListener(event: \App\Event\InvoicePaid::class)]
    public function onPaid(): void
    {
    }
}
"#;

#[test]
fn test_attribute_subclass_counts_as_its_marker() {
    let dir = project();
    write(dir.path(), "src/Attribute/AsAuditListener.php", AUDIT_ATTRIBUTE);
    write(dir.path(), "src/Listener/RefundListener.php", REFUND_LISTENER);
    let engine = engine(local_config(dir.path()));

    let listeners = engine.resolve::<EventListeners>().output;
    let refunded: Vec<String> = listeners[&ClassName::new("App\\Event\\InvoiceRefunded")]
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(
        refunded,
        vec!["App\\Listener\\AuditListener@onPaid", "App\\Listener\\RefundListener"]
    );
    let paid: Vec<String> = listeners[&ClassName::new("App\\Event\\InvoicePaid")]
        .iter()
        .map(ToString::to_string)
        .collect();
    assert!(paid.contains(&"App\\Listener\\RefundListener@onPaid".to_string()));

    // the attribute class itself is not a listener
    assert!(listeners.values().flatten().all(|l| l.class().as_str() != "App\\Attribute\\AsAuditListener"));
}
