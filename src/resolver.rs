use crate::agents::PackageFilter;
use crate::error::{AscentError, Result};
use crate::index::{IndexClient, IndexEndpoint, REQUEST_TIMEOUT};
use crate::pypi::Version;
use crate::requirement::PackageReference;
use colored::Colorize;
use indexmap::IndexMap;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Which releases count as upgrade candidates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverPolicy {
    /// Offer pre-releases and post-releases even for stable pins.
    pub include_prerelease: bool,
    /// Treat `>=` lines as pins, not only `==`.
    pub check_greater_equal: bool,
}

impl ResolverPolicy {
    /// Pre/post-releases are eligible when asked for, or when the pin is one.
    pub fn considers_prereleases(&self, current: &Version) -> bool {
        self.include_prerelease || !current.is_stable()
    }
}

/// Outcome of a successful index lookup for one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersionInfo {
    name: String,
    current_version: Version,
    latest_version: Version,
    upgrade_available: bool,
    upload_time: String,
}

impl ResolvedVersionInfo {
    pub fn new(
        name: impl Into<String>,
        current_version: Version,
        latest_version: Version,
        upload_time: impl Into<String>,
    ) -> Self {
        let upgrade_available = latest_version > current_version;
        Self {
            name: name.into(),
            current_version,
            latest_version,
            upgrade_available,
            upload_time: upload_time.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn current_version(&self) -> &Version {
        &self.current_version
    }

    pub fn latest_version(&self) -> &Version {
        &self.latest_version
    }

    pub fn upgrade_available(&self) -> bool {
        self.upgrade_available
    }

    pub fn upload_time(&self) -> &str {
        &self.upload_time
    }
}

/// Looks up the newest eligible release of pinned packages on one index.
pub struct VersionResolver {
    client: Arc<dyn IndexClient>,
    endpoint: IndexEndpoint,
    policy: ResolverPolicy,
    timeout: Duration,
    interrupted: Arc<AtomicBool>,
}

impl VersionResolver {
    pub fn new(client: Arc<dyn IndexClient>, endpoint: IndexEndpoint, policy: ResolverPolicy) -> Self {
        Self {
            client,
            endpoint,
            policy,
            timeout: REQUEST_TIMEOUT,
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag checked between packages; setting it stops the batch.
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupted)
    }

    /// Resolve a single pinned package.
    pub fn resolve(&self, reference: &PackageReference) -> Result<ResolvedVersionInfo> {
        let current = Version::parse(reference.version())?;
        self.fetch(reference.name(), &current)
    }

    fn fetch(&self, package_name: &str, current: &Version) -> Result<ResolvedVersionInfo> {
        let url = self.endpoint.package_url(package_name);
        let response = self.client.get(&url, self.timeout)?;

        if !response.status_ok {
            return Err(AscentError::IndexStatus(response.reason));
        }

        self.endpoint
            .format()
            .parse(&response.body, package_name, current, &self.policy)
    }

    /// Resolve every pinned line in order, keyed by package name.
    ///
    /// Lines without a recognized pin and packages outside `filter` are
    /// skipped. A failure for one package is reported and the batch moves on;
    /// only an interruption or a non package-local error ends it early, and
    /// then nothing collected so far is returned.
    pub fn detect_available_upgrades<S: AsRef<str>>(
        &self,
        lines: &[S],
        filter: &PackageFilter,
    ) -> Result<IndexMap<String, ResolvedVersionInfo>> {
        let mut resolved = IndexMap::new();
        let total = lines.len();

        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  [{bar:40}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("=>-"),
        );

        for (index, line) in lines.iter().enumerate() {
            if self.interrupted.load(Ordering::SeqCst) {
                pb.finish_and_clear();
                return Err(AscentError::UserCancelled);
            }

            let line = line.as_ref();
            pb.inc(1);

            let Some(reference) = PackageReference::expand(line, self.policy.check_greater_equal)
            else {
                debug!("No pin in '{}', skipping", line);
                continue;
            };

            if !filter.matches(reference.name()) {
                debug!("{} not selected, skipping", reference.name());
                continue;
            }

            pb.set_message(format!("Checking {}", reference.name()));
            debug!(
                "Resolving {}{}{}",
                reference.name(),
                reference.operator(),
                reference.version()
            );

            match self.resolve(&reference) {
                Ok(info) => {
                    pb.suspend(|| print_status(index + 1, total, &info));
                    resolved.insert(info.name().to_string(), info);
                }
                Err(e) if e.is_package_local() => {
                    warn!("Skipping {}: {}", reference.name(), e);
                    pb.suspend(|| {
                        println!("{} {}", line.yellow(), e.to_string().red());
                    });
                }
                Err(e) => {
                    pb.finish_and_clear();
                    return Err(e);
                }
            }
        }

        pb.finish_and_clear();
        Ok(resolved)
    }
}

fn print_status(position: usize, total: usize, info: &ResolvedVersionInfo) {
    let prefix = format!("{}/{}: {} ...", position, total, info.name());
    if info.upgrade_available() {
        println!(
            "{} upgrade available: {} ==> {} (uploaded on {})",
            prefix,
            info.current_version().to_string().red(),
            info.latest_version().to_string().green().bold(),
            info.upload_time()
        );
    } else {
        println!(
            "{} {}",
            prefix,
            format!("up to date: {}", info.current_version()).dimmed()
        );
    }
}
