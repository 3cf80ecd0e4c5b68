use markscope_api::DiscoveryResult;
use markscope_core::ScanReport;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Class")]
    value: String,
}

#[derive(Tabled)]
struct DiagnosticRow {
    #[tabled(rename = "Failure")]
    failure: String,
    #[tabled(rename = "Subject")]
    subject: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

pub fn result_table(result: &DiscoveryResult) -> Table {
    let rows = result.rows().into_iter().map(|(key, value)| EntryRow {
        key: key.unwrap_or_else(|| "-".to_string()),
        value,
    });
    Table::new(rows)
}

pub fn report_table(report: &ScanReport) -> Table {
    let rows = report.diagnostics().iter().map(|d| DiagnosticRow {
        failure: d.failure.to_string(),
        subject: d.subject.clone(),
        detail: d.detail.clone(),
    });
    Table::new(rows)
}

pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / 1024.0 / 1024.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
