use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "pip-ascent",
    about = "Interactively upgrade packages pinned in requirements files and update the pins",
    long_about = "Interactively upgrades packages from requirements files and updates the pinned \
                  version in the requirement file(s).\nIf no requirements files are given, the \
                  command looks for them in the current directory.",
    version
)]
pub struct Cli {
    /// Requirements files to upgrade (autodetected when omitted)
    #[arg(value_name = "REQUIREMENTS_FILE")]
    pub requirements: Vec<PathBuf>,

    /// Include pre-release and post-release versions when looking for upgrades
    #[arg(long)]
    pub prerelease: bool,

    /// Pre-select packages to upgrade without prompting ("all", a name or a regex)
    #[arg(short = 'p', long = "package", value_name = "PACKAGE")]
    pub packages: Vec<String>,

    /// Simulate the upgrade without installing or rewriting anything
    #[arg(long)]
    pub dry_run: bool,

    /// Also check packages pinned with a minimum version (package>=version)
    #[arg(long)]
    pub check_greater_equal: bool,

    /// Allow installing packages outside a virtual environment
    #[arg(long)]
    pub skip_virtualenv_check: bool,

    /// Only update the requirements files, do not install anything
    #[arg(long)]
    pub skip_package_installation: bool,

    /// Ignore PIP_INDEX_URL and pip configuration files and query PyPI
    #[arg(long)]
    pub use_default_index: bool,

    /// Enable verbose output for debugging
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_files_and_repeated_packages() {
        let cli = Cli::parse_from([
            "pip-ascent",
            "requirements/dev.txt",
            "requirements/prod.txt",
            "-p",
            "django",
            "--package",
            "celery",
            "--dry-run",
            "--check-greater-equal",
        ]);

        assert_eq!(
            cli.requirements,
            vec![
                PathBuf::from("requirements/dev.txt"),
                PathBuf::from("requirements/prod.txt")
            ]
        );
        assert_eq!(cli.packages, vec!["django", "celery"]);
        assert!(cli.dry_run);
        assert!(cli.check_greater_equal);
        assert!(!cli.prerelease);
    }
}
