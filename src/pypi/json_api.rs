use crate::error::{AscentError, Result};
use crate::pypi::version::{Version, parse_all};
use crate::pypi::{PARSE_FAILURE, UNKNOWN_UPLOAD_TIME};
use crate::resolver::{ResolvedVersionInfo, ResolverPolicy};
use serde::Deserialize;
use std::collections::HashMap;

/// Body of `GET /pypi/<name>/json`
#[derive(Debug, Deserialize)]
struct JsonApiResponse {
    #[serde(default)]
    info: Option<PackageInfo>,
    #[serde(default)]
    releases: HashMap<String, Vec<ReleaseFile>>,
}

#[derive(Debug, Deserialize)]
struct PackageInfo {
    #[serde(default)]
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReleaseFile {
    #[serde(default)]
    upload_time: Option<String>,
}

impl JsonApiResponse {
    fn first_file(&self, version_key: &str) -> Option<&ReleaseFile> {
        self.releases.get(version_key).and_then(|files| files.first())
    }

    /// The index's own idea of the current release, for keys whose
    /// spelling differs from the normalized version.
    fn reported_release(&self) -> Option<(Version, &ReleaseFile)> {
        let reported = self.info.as_ref()?.version.as_deref()?;
        let version = Version::parse(reported).ok()?;
        let file = self
            .first_file(reported)
            .or_else(|| self.first_file(&version.to_string()))?;
        Some((version, file))
    }
}

/// Resolve the latest eligible release from a JSON API response.
pub fn parse(
    body: &[u8],
    package_name: &str,
    current: &Version,
    policy: &ResolverPolicy,
) -> Result<ResolvedVersionInfo> {
    let response: JsonApiResponse = serde_json::from_slice(body)?;

    let candidates = parse_all(response.releases.keys().map(String::as_str));
    let latest = select_latest(&candidates, current, policy)
        .ok_or_else(|| AscentError::VersionResolution(PARSE_FAILURE.to_string()))?;

    let (latest, file) = match response.first_file(&latest.to_string()) {
        Some(file) => (latest, file),
        None => response
            .reported_release()
            .ok_or_else(|| AscentError::VersionResolution(PARSE_FAILURE.to_string()))?,
    };

    let upload_time = file
        .upload_time
        .as_deref()
        .map(|time| time.replace('T', " "))
        .unwrap_or_else(|| UNKNOWN_UPLOAD_TIME.to_string());

    Ok(ResolvedVersionInfo::new(
        package_name,
        current.clone(),
        latest,
        upload_time,
    ))
}

/// Highest stable release, replaced by the highest pre/post-release when the
/// policy admits those and it is newer.
fn select_latest(
    candidates: &[Version],
    current: &Version,
    policy: &ResolverPolicy,
) -> Option<Version> {
    let (stable, unstable): (Vec<&Version>, Vec<&Version>) =
        candidates.iter().partition(|v| v.is_stable());

    let mut latest = stable.into_iter().max();

    if policy.considers_prereleases(current) {
        if let Some(newest_unstable) = unstable.into_iter().max() {
            if latest.is_none_or(|stable_max| newest_unstable > stable_max) {
                latest = Some(newest_unstable);
            }
        }
    }

    latest.cloned()
}
