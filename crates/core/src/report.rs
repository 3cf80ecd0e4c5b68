//! Failures swallowed during discovery.
//!
//! Discovery never returns an error to its caller. Everything that was
//! skipped along the way is recorded here instead, so a caller (or the CLI in
//! strict mode) can decide whether a best-effort result is good enough.

use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiscoveryFailure {
    /// One candidate could not be read; it was skipped.
    IntrospectionFailure,
    /// The class-map manifest is absent or unreadable.
    MissingManifest,
    /// No cache artifact for the domain.
    MissingCache,
    /// The source tree could not be walked at all.
    ScannerUnavailable,
    /// A marker's arguments did not fit its schema; that instance was skipped.
    MalformedMarkerInstance,
}

impl DiscoveryFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscoveryFailure::IntrospectionFailure => "introspection-failure",
            DiscoveryFailure::MissingManifest => "missing-manifest",
            DiscoveryFailure::MissingCache => "missing-cache",
            DiscoveryFailure::ScannerUnavailable => "scanner-unavailable",
            DiscoveryFailure::MalformedMarkerInstance => "malformed-marker-instance",
        }
    }

    /// Failures that point at a problem in the scanned code rather than a
    /// missing optional input.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            DiscoveryFailure::IntrospectionFailure | DiscoveryFailure::MalformedMarkerInstance
        )
    }
}

impl fmt::Display for DiscoveryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub failure: DiscoveryFailure,
    /// Class name or path the failure is about.
    pub subject: String,
    pub detail: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    diagnostics: Vec<Diagnostic>,
}

impl ScanReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        failure: DiscoveryFailure,
        subject: impl Into<String>,
        detail: impl Into<String>,
    ) {
        let diagnostic = Diagnostic {
            failure,
            subject: subject.into(),
            detail: detail.into(),
        };

        match failure {
            DiscoveryFailure::MalformedMarkerInstance | DiscoveryFailure::ScannerUnavailable => {
                warn!("{} {}: {}", failure, diagnostic.subject, diagnostic.detail)
            }
            _ => debug!("{} {}: {}", failure, diagnostic.subject, diagnostic.detail),
        }

        self.diagnostics.push(diagnostic);
    }

    pub fn merge(&mut self, other: ScanReport) {
        self.diagnostics.extend(other.diagnostics);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn count(&self, failure: DiscoveryFailure) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.failure == failure)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.failure.is_error())
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.failure.is_error())
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}
