use crate::error::{AscentError, Result};
use crate::pypi::{self, canonicalize_name};
use crate::pypi::version::Version;
use crate::resolver::{ResolvedVersionInfo, ResolverPolicy};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use std::time::Duration;
use url::Url;

pub mod client;
pub mod sources;

pub use client::HttpIndexClient;
pub use sources::IndexUrlChain;

pub const DEFAULT_INDEX_URL: &str = "https://pypi.python.org/pypi/";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

const PACKAGE_PLACEHOLDER: &str = "{package}";

/// Raw outcome of a GET against the index.
#[derive(Debug, Clone)]
pub struct IndexResponse {
    pub status_ok: bool,
    pub reason: String,
    pub body: Vec<u8>,
}

/// Transport used to talk to a package index.
///
/// Implementations return `Err(AscentError::Network)` for connection
/// failures and timeouts; HTTP error statuses are reported through
/// `IndexResponse::status_ok` instead.
pub trait IndexClient: Send + Sync {
    fn get(&self, url: &str, timeout: Duration) -> Result<IndexResponse>;
}

/// Response format served by the configured index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFormat {
    /// `/pypi/<name>/json` endpoints.
    JsonApi,
    /// PEP 503 `simple` listings with one anchor per distribution file.
    SimpleHtml,
}

impl IndexFormat {
    /// Parse an index response body for `package_name`.
    pub fn parse(
        &self,
        body: &[u8],
        package_name: &str,
        current: &Version,
        policy: &ResolverPolicy,
    ) -> Result<ResolvedVersionInfo> {
        match self {
            IndexFormat::JsonApi => pypi::json_api::parse(body, package_name, current, policy),
            IndexFormat::SimpleHtml => {
                pypi::simple_html::parse(body, package_name, current, policy)
            }
        }
    }
}

/// URL template plus the format it serves, derived once from an index URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEndpoint {
    template: String,
    format: IndexFormat,
}

impl IndexEndpoint {
    pub fn detect(index_url: &str) -> Result<Self> {
        let mut url = index_url.trim().to_string();
        if !url.ends_with('/') {
            url.push('/');
        }

        Self::validate(&url)?;

        if url.ends_with("/simple/") || url.ends_with("/+simple/") {
            return Ok(Self {
                template: format!("{url}{PACKAGE_PLACEHOLDER}/"),
                format: IndexFormat::SimpleHtml,
            });
        }

        let template = match url.split_once("/pypi/") {
            Some((base, _)) => format!("{base}/pypi/{PACKAGE_PLACEHOLDER}/json"),
            None => format!("{url}pypi/{PACKAGE_PLACEHOLDER}/json"),
        };

        Ok(Self {
            template,
            format: IndexFormat::JsonApi,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn format(&self) -> IndexFormat {
        self.format
    }

    /// Full request URL for a package.
    pub fn package_url(&self, package_name: &str) -> String {
        let name = match self.format {
            IndexFormat::SimpleHtml => canonicalize_name(package_name),
            IndexFormat::JsonApi => package_name.trim().to_string(),
        };
        let escaped = utf8_percent_encode(&name, PACKAGE_NAME_ESCAPES).to_string();
        self.template.replace(PACKAGE_PLACEHOLDER, &escaped)
    }

    fn validate(url: &str) -> Result<()> {
        let parsed = Url::parse(url)
            .map_err(|e| AscentError::UnsupportedIndex(format!("{url}: {e}")))?;

        match parsed.scheme() {
            "https" | "http" => Ok(()),
            scheme => Err(AscentError::UnsupportedIndex(format!(
                "{url}: scheme '{scheme}' is not supported"
            ))),
        }
    }
}

// Characters valid in distribution names stay readable in the URL.
const PACKAGE_NAME_ESCAPES: &percent_encoding::AsciiSet =
    &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');
