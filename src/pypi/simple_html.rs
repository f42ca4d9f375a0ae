use crate::error::{AscentError, Result};
use crate::pypi::version::{Version, parse_all};
use crate::pypi::{PARSE_FAILURE, UNKNOWN_UPLOAD_TIME};
use crate::resolver::{ResolvedVersionInfo, ResolverPolicy};
use regex::Regex;

/// Resolve the latest eligible release from a PEP 503 project page.
///
/// Versions are taken from anchor texts naming a wheel (`-py` tag) or an
/// sdist (`.tar`). The page carries no upload dates.
pub fn parse(
    body: &[u8],
    package_name: &str,
    current: &Version,
    policy: &ResolverPolicy,
) -> Result<ResolvedVersionInfo> {
    let candidates = listed_versions(body, package_name)?;
    let latest = select_latest(&candidates, current, policy)
        .ok_or_else(|| AscentError::VersionResolution(PARSE_FAILURE.to_string()))?;

    Ok(ResolvedVersionInfo::new(
        package_name,
        current.clone(),
        latest,
        UNKNOWN_UPLOAD_TIME,
    ))
}

/// Every parseable version named by the page, in page order.
fn listed_versions(body: &[u8], package_name: &str) -> Result<Vec<Version>> {
    let pattern = listing_pattern(package_name)?;
    let page = String::from_utf8_lossy(body);

    Ok(parse_all(
        pattern
            .captures_iter(&page)
            .filter_map(|cap| cap.get(1))
            .map(|m| m.as_str()),
    ))
}

fn listing_pattern(package_name: &str) -> Result<Regex> {
    let pattern = format!(
        r"(?i)<a.*>.*{}-([A-Za-z0-9._-]*)(?:-py|\.tar).*</a>",
        regex::escape(package_name.trim())
    );
    Regex::new(&pattern).map_err(|e| {
        AscentError::VersionResolution(format!(
            "Invalid listing pattern for '{}': {}",
            package_name, e
        ))
    })
}

/// A stable release is required. When the policy admits pre/post-releases,
/// the newest of those wins outright, even over a newer stable release.
fn select_latest(
    candidates: &[Version],
    current: &Version,
    policy: &ResolverPolicy,
) -> Option<Version> {
    let mut latest = candidates.iter().filter(|v| v.is_stable()).max()?;

    if policy.considers_prereleases(current) {
        if let Some(newest_unstable) = candidates.iter().filter(|v| !v.is_stable()).max() {
            latest = newest_unstable;
        }
    }

    Some(latest.clone())
}
