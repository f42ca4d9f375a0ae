pub mod json_api;
pub mod simple_html;
pub mod version;

pub use version::Version;

use pep508_rs::PackageName;
use std::str::FromStr;
use tracing::debug;

pub const UNKNOWN_UPLOAD_TIME: &str = "-";

pub(crate) const PARSE_FAILURE: &str = "error while parsing version";

/// Normalize a distribution name the way PEP 503 indexes do: lowercase, with
/// every run of `-`, `_` and `.` collapsed into a single `-`.
pub fn canonicalize_name(name: &str) -> String {
    let name = name.trim();
    match PackageName::from_str(name) {
        Ok(normalized) => normalized.to_string(),
        Err(e) => {
            debug!("Normalizing non-standard package name: {}", e);
            collapse_separators(name)
        }
    }
}

// Names `PackageName` rejects (leading or trailing punctuation, other
// characters) still get the same separator folding.
fn collapse_separators(name: &str) -> String {
    let mut canonical = String::with_capacity(name.len());
    let mut pending_separator = false;

    for ch in name.chars() {
        if matches!(ch, '-' | '_' | '.') {
            pending_separator = true;
            continue;
        }
        if pending_separator {
            canonical.push('-');
        }
        pending_separator = false;
        canonical.extend(ch.to_lowercase());
    }

    if pending_separator {
        canonical.push('-');
    }

    canonical
}
