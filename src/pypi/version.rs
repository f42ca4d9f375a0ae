use crate::error::{AscentError, Result};
use pep508_rs::pep440_rs::Version as Pep440Version;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A PEP 440 version as published on a package index.
///
/// Equality and ordering follow PEP 440 semantics (`1.0 == 1.0.0`), while
/// `original` keeps the spelling found in the requirement line or index.
#[derive(Debug, Clone)]
pub struct Version {
    pub original: String,
    pub parsed: Pep440Version,
}

impl Version {
    pub fn parse(version: &str) -> Result<Self> {
        let trimmed = version.trim();
        let parsed = Pep440Version::from_str(trimmed)
            .map_err(|e| AscentError::InvalidVersion(format!("'{}': {}", trimmed, e)))?;

        Ok(Self {
            original: trimmed.to_string(),
            parsed,
        })
    }

    /// Alpha, beta, release-candidate and development releases.
    pub fn is_prerelease(&self) -> bool {
        self.parsed.is_pre() || self.parsed.is_dev()
    }

    pub fn is_postrelease(&self) -> bool {
        self.parsed.is_post()
    }

    /// Neither a pre-release nor a post-release.
    pub fn is_stable(&self) -> bool {
        !self.is_prerelease() && !self.is_postrelease()
    }
}

impl fmt::Display for Version {
    /// Renders the normalized form, which is how indexes key their releases.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.parsed)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.parsed == other.parsed
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.parsed.cmp(&other.parsed)
    }
}

/// Parses every candidate, silently dropping the ones that are not valid
/// PEP 440 versions.
pub fn parse_all<'a, I>(candidates: I) -> Vec<Version>
where
    I: IntoIterator<Item = &'a str>,
{
    candidates
        .into_iter()
        .filter_map(|raw| Version::parse(raw).ok())
        .collect()
}
