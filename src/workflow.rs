use crate::agents::{
    PackageDetector, PackageFilter, PackageSelector, PackageUpgrader, RequirementsDetector,
    UpgradeOptions, virtualenv,
};
use crate::cli::Cli;
use crate::error::Result;
use crate::index::{DEFAULT_INDEX_URL, HttpIndexClient, IndexEndpoint, IndexUrlChain};
use crate::interrupt::InterruptWatcher;
use crate::resolver::{ResolverPolicy, VersionResolver};
use colored::Colorize;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

/// Everything one run needs, taken from the command line.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub requirements: Vec<PathBuf>,
    pub packages: Vec<String>,
    pub policy: ResolverPolicy,
    pub upgrade: UpgradeOptions,
    pub skip_virtualenv_check: bool,
    pub use_default_index: bool,
}

impl From<&Cli> for RunOptions {
    fn from(cli: &Cli) -> Self {
        Self {
            requirements: cli.requirements.clone(),
            packages: cli.packages.clone(),
            policy: ResolverPolicy {
                include_prerelease: cli.prerelease,
                check_greater_equal: cli.check_greater_equal,
            },
            upgrade: UpgradeOptions {
                dry_run: cli.dry_run,
                skip_package_installation: cli.skip_package_installation,
            },
            skip_virtualenv_check: cli.skip_virtualenv_check,
            use_default_index: cli.use_default_index,
        }
    }
}

/// Execute the upgrade workflow
pub fn execute_upgrade(options: &RunOptions) -> Result<()> {
    virtualenv::check_for_virtualenv(
        options.skip_virtualenv_check,
        options.upgrade.skip_package_installation,
        virtualenv::is_virtualenv(),
    )?;

    // Step 1: Find requirements files
    let files = RequirementsDetector::new(PathBuf::new()).detect(&options.requirements)?;
    if files.is_empty() {
        println!(
            "{}",
            "No requirements files found in the current directory. Change directory to your \
             project or manually specify requirements files as arguments."
                .red()
        );
        return Ok(());
    }

    println!("{}", "Found valid requirements file(s):".green());
    for file in &files {
        println!("{}", file.display().to_string().yellow());
    }

    // Step 2: Collect requirement lines
    let lines = PackageDetector::detect_packages(&files)?;

    // Step 3: Ask the index for newer versions
    let endpoint = resolve_endpoint(options.use_default_index)?;
    let resolver = VersionResolver::new(
        Arc::new(HttpIndexClient::new()?),
        endpoint,
        options.policy,
    );
    let filter = PackageFilter::new(&options.packages);
    let watcher = InterruptWatcher::install(resolver.interrupt_handle());
    let resolved = resolver.detect_available_upgrades(&lines, &filter);
    watcher.finish();
    let resolved = resolved?;

    // Step 4: Choose what to upgrade
    let selector = PackageSelector::new(&resolved);
    if selector.is_empty() {
        println!("{}", "All packages are up-to-date.".green());
        return Ok(());
    }

    let selected = if filter.is_explicit() {
        selector.select_matching(&filter)
    } else {
        let stdin = io::stdin();
        selector.ask(&mut stdin.lock(), &mut io::stdout())?
    };

    if selected.is_empty() {
        println!("{}", "No packages matched the selection.".yellow());
        return Ok(());
    }

    // Step 5: Install and rewrite the pins
    let upgrader = PackageUpgrader::new(files, options.upgrade);
    let upgraded = upgrader.do_upgrade(&selected)?;

    let names: Vec<&str> = upgraded.iter().map(|p| p.name()).collect();
    println!(
        "{}",
        format!(
            "Successfully upgraded (and updated requirements) for the following packages: {}",
            names.join(",")
        )
        .green()
    );

    if options.upgrade.dry_run {
        println!(
            "{}",
            "Actually, no, because this was a simulation using --dry-run".magenta()
        );
    }

    Ok(())
}

/// Pick the index to query, announcing it when it does not come from the default.
fn resolve_endpoint(use_default_index: bool) -> Result<IndexEndpoint> {
    if use_default_index {
        return IndexEndpoint::detect(DEFAULT_INDEX_URL);
    }

    match IndexUrlChain::standard().resolve()? {
        Some((url, origin)) => {
            let endpoint = IndexEndpoint::detect(&url)?;
            println!(
                "Setting API url to {} as found in {}. Use --use-default-index to use PyPI default index",
                endpoint.template().yellow(),
                origin.yellow()
            );
            Ok(endpoint)
        }
        None => IndexEndpoint::detect(DEFAULT_INDEX_URL),
    }
}
