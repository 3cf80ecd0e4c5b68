//! Reader for Composer's generated `autoload_classmap.php`.

use markscope_api::{ClassName, ManifestEntry};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

/// `'Class\\Name' => $baseDir . '/path.php'`
static ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"'((?:[^'\\]|\\.)*)'\s*=>\s*(?:(\$baseDir|\$vendorDir)\s*\.\s*)?'((?:[^'\\]|\\.)*)'"#,
    )
    .expect("class map pattern is valid")
});

/// Entries in file order. `$vendorDir` is the manifest's grandparent
/// directory and `$baseDir` the directory above that.
pub fn parse_classmap(source: &str, manifest_path: &Path) -> Vec<ManifestEntry> {
    let composer_dir = manifest_path.parent().unwrap_or_else(|| Path::new(""));
    let vendor_dir = composer_dir.parent().unwrap_or(composer_dir);
    let base_dir = vendor_dir.parent().unwrap_or(vendor_dir);

    ENTRY
        .captures_iter(source)
        .map(|caps| {
            let class = ClassName::new(unescape(&caps[1]));
            let file = unescape(&caps[3]);
            let file = file.trim_start_matches('/');
            let path = match caps.get(2).map(|m| m.as_str()) {
                Some("$vendorDir") => vendor_dir.join(file),
                Some(_) => base_dir.join(file),
                None => {
                    let raw = PathBuf::from(unescape(&caps[3]));
                    if raw.is_absolute() {
                        raw
                    } else {
                        composer_dir.join(raw)
                    }
                }
            };
            (class, path)
        })
        .collect()
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next @ ('\\' | '\'')) => out.push(next),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}
