use crate::error::{AscentError, Result};
use crate::resolver::ResolvedVersionInfo;
use colored::Colorize;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::{info, warn};

/// Installs a pinned release into the active environment.
pub trait PackageInstaller {
    fn install(&self, name: &str, version: &str) -> Result<()>;
}

/// Runs `pip install <name>==<version>`.
pub struct PipInstaller {
    program: String,
}

impl PipInstaller {
    pub fn new() -> Self {
        Self {
            program: "pip".to_string(),
        }
    }

    fn ensure_success(output: &Output, requirement: &str) -> Result<()> {
        if output.status.success() {
            return Ok(());
        }

        Err(AscentError::Installation(format!(
            "pip install {} failed: {}",
            requirement,
            String::from_utf8_lossy(&output.stderr).trim()
        )))
    }
}

impl PackageInstaller for PipInstaller {
    fn install(&self, name: &str, version: &str) -> Result<()> {
        let requirement = format!("{name}=={version}");
        let output = Command::new(&self.program)
            .args(["install", &requirement])
            .output()
            .map_err(|e| {
                AscentError::Installation(format!("Failed to execute {}: {e}", self.program))
            })?;
        Self::ensure_success(&output, &requirement)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UpgradeOptions {
    /// Report what would change without installing or writing anything.
    pub dry_run: bool,
    /// Only rewrite requirements files.
    pub skip_package_installation: bool,
}

/// PackageUpgrader installs chosen upgrades and rewrites their pins
pub struct PackageUpgrader {
    requirements_files: Vec<PathBuf>,
    options: UpgradeOptions,
    installer: Box<dyn PackageInstaller>,
}

impl PackageUpgrader {
    pub fn new(requirements_files: Vec<PathBuf>, options: UpgradeOptions) -> Self {
        Self::with_installer(requirements_files, options, Box::new(PipInstaller::new()))
    }

    pub fn with_installer(
        requirements_files: Vec<PathBuf>,
        options: UpgradeOptions,
        installer: Box<dyn PackageInstaller>,
    ) -> Self {
        Self {
            requirements_files,
            options,
            installer,
        }
    }

    /// Apply every selected upgrade, returning the ones that succeeded.
    ///
    /// A failed installation skips that package's file updates and the
    /// remaining packages are still processed.
    pub fn do_upgrade(&self, selected: &[ResolvedVersionInfo]) -> Result<Vec<ResolvedVersionInfo>> {
        let mut upgraded = Vec::new();

        for package in selected {
            let latest = package.latest_version().original.as_str();

            if !self.options.dry_run && !self.options.skip_package_installation {
                println!(
                    "{} {}=={}",
                    "Installing".cyan(),
                    package.name(),
                    latest
                );
                if let Err(e) = self.installer.install(package.name(), latest) {
                    warn!("Installation of {} failed: {}", package.name(), e);
                    println!("{}", e.to_string().red());
                    continue;
                }
            }

            for file in &self.requirements_files {
                self.update_requirements_file(file, package)?;
            }

            upgraded.push(package.clone());
        }

        Ok(upgraded)
    }

    fn update_requirements_file(&self, path: &Path, package: &ResolvedVersionInfo) -> Result<()> {
        let content = fs::read_to_string(path)?;
        let rewrite = rewrite_pins(&content, package.name(), &package.latest_version().original)?;

        for line in &rewrite.skipped {
            warn!("{}: range pin '{}' left untouched", path.display(), line);
            println!(
                "   {} {} in {} (range pins are not rewritten)",
                "!".yellow(),
                line.yellow(),
                path.display()
            );
        }

        if rewrite.replaced == 0 {
            return Ok(());
        }

        info!(
            "{}: {} pin(s) of {} set to {}",
            path.display(),
            rewrite.replaced,
            package.name(),
            package.latest_version()
        );

        if !self.options.dry_run {
            fs::write(path, rewrite.content)?;
        }

        println!(
            "   {} {} in {}",
            "✓".green(),
            format!("{}=={}", package.name(), package.latest_version()).green(),
            path.display()
        );
        Ok(())
    }
}

/// Result of rewriting one requirements file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinRewrite {
    pub content: String,
    pub replaced: usize,
    /// Lines naming the package whose specifier is a range (`>=3.2,<4.0`);
    /// they are left untouched.
    pub skipped: Vec<String>,
}

/// Replace the pinned version of `package_name` on every matching line.
///
/// Names match case-insensitively with `-`, `_` and `.` interchangeable.
/// Operators, extras, markers and comments are left untouched.
pub fn rewrite_pins(content: &str, package_name: &str, new_version: &str) -> Result<PinRewrite> {
    let pattern = pin_pattern(package_name)?;
    let mut rewrite = PinRewrite {
        content: String::with_capacity(content.len()),
        replaced: 0,
        skipped: Vec::new(),
    };

    for line in content.split_inclusive('\n') {
        let Some(cap) = pattern.captures(line) else {
            rewrite.content.push_str(line);
            continue;
        };

        if cap.get(2).is_some() {
            rewrite.skipped.push(line.trim_end().to_string());
            rewrite.content.push_str(line);
            continue;
        }

        let end = cap.get(0).map_or(0, |m| m.end());
        rewrite.content.push_str(&cap[1]);
        rewrite.content.push_str(new_version);
        rewrite.content.push_str(&line[end..]);
        rewrite.replaced += 1;
    }

    Ok(rewrite)
}

fn pin_pattern(package_name: &str) -> Result<Regex> {
    let name = package_name
        .trim()
        .split(['-', '_', '.'])
        .filter(|part| !part.is_empty())
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("[-_.]+");

    let pattern = format!(r"(?i)^(\s*{name}\s*(?:\[[^\]]*\])?\s*(?:==|>=)\s*)[^\s;#,]+(\s*,)?");
    Regex::new(&pattern).map_err(|e| {
        AscentError::Installation(format!("Invalid pin pattern for '{}': {}", package_name, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pypi::Version;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::tempdir;

    #[derive(Clone, Default)]
    struct RecordingInstaller {
        calls: Rc<RefCell<Vec<String>>>,
        fail_for: Option<&'static str>,
    }

    impl PackageInstaller for RecordingInstaller {
        fn install(&self, name: &str, version: &str) -> Result<()> {
            self.calls.borrow_mut().push(format!("{name}=={version}"));
            if self.fail_for == Some(name) {
                return Err(AscentError::Installation(format!("{name} exploded")));
            }
            Ok(())
        }
    }

    fn info(name: &str, current: &str, latest: &str) -> ResolvedVersionInfo {
        ResolvedVersionInfo::new(
            name,
            Version::parse(current).unwrap(),
            Version::parse(latest).unwrap(),
            "-",
        )
    }

    #[test]
    fn rewrites_matching_pins_only() {
        let content = "\
Django==4.2.0  # LTS
django-filter==23.1
django[argon2] == 4.2.0 ; python_version >= \"3.8\"
djangorestframework==3.14.0
";
        let rewrite = rewrite_pins(content, "django", "5.0.1").unwrap();

        assert_eq!(rewrite.replaced, 2);
        assert!(rewrite.skipped.is_empty());
        assert_eq!(
            rewrite.content,
            "\
Django==5.0.1  # LTS
django-filter==23.1
django[argon2] == 5.0.1 ; python_version >= \"3.8\"
djangorestframework==3.14.0
"
        );
    }

    #[test]
    fn matches_names_across_separator_styles() {
        let rewrite =
            rewrite_pins("zope_interface>=5.0\nZope.Interface==5.0\n", "zope-interface", "6.1")
                .unwrap();
        assert_eq!(rewrite.replaced, 2);
        assert_eq!(rewrite.content, "zope_interface>=6.1\nZope.Interface==6.1\n");
    }

    #[test]
    fn range_specifiers_are_left_untouched() {
        let content = "django>=3.2,<4.0\ndjango >= 3.2 , < 4.0  # pinned range\nDjango==4.2.0\n";
        let rewrite = rewrite_pins(content, "django", "5.0.1").unwrap();

        assert_eq!(rewrite.replaced, 1);
        assert_eq!(
            rewrite.skipped,
            vec!["django>=3.2,<4.0", "django >= 3.2 , < 4.0  # pinned range"]
        );
        assert_eq!(
            rewrite.content,
            "django>=3.2,<4.0\ndjango >= 3.2 , < 4.0  # pinned range\nDjango==5.0.1\n"
        );
    }

    #[test]
    fn file_with_only_a_range_pin_is_not_written() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("constraints.txt");
        fs::write(&file, "django>=3.2,<4.0\n").unwrap();

        let upgrader = PackageUpgrader::with_installer(
            vec![file.clone()],
            UpgradeOptions::default(),
            Box::new(RecordingInstaller::default()),
        );
        upgrader.do_upgrade(&[info("django", "3.2", "5.0.1")]).unwrap();

        assert_eq!(fs::read_to_string(&file).unwrap(), "django>=3.2,<4.0\n");
    }

    #[test]
    fn keeps_file_without_trailing_newline_intact() {
        let rewrite = rewrite_pins("six==1.15.0", "six", "1.16.0").unwrap();
        assert_eq!(rewrite.content, "six==1.16.0");
    }

    #[test]
    fn installs_then_updates_every_file() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("base.txt");
        let dev = dir.path().join("dev.txt");
        fs::write(&base, "celery==5.3.0\nsix==1.16.0\n").unwrap();
        fs::write(&dev, "-r base.txt\ncelery==5.3.0\n").unwrap();

        let installer = RecordingInstaller::default();
        let upgrader = PackageUpgrader::with_installer(
            vec![base.clone(), dev.clone()],
            UpgradeOptions::default(),
            Box::new(installer.clone()),
        );

        let upgraded = upgrader.do_upgrade(&[info("celery", "5.3.0", "5.4.0")]).unwrap();

        assert_eq!(upgraded.len(), 1);
        assert_eq!(*installer.calls.borrow(), vec!["celery==5.4.0".to_string()]);
        assert_eq!(fs::read_to_string(&base).unwrap(), "celery==5.4.0\nsix==1.16.0\n");
        assert_eq!(fs::read_to_string(&dev).unwrap(), "-r base.txt\ncelery==5.4.0\n");
    }

    #[test]
    fn failed_install_leaves_pins_alone() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("requirements.txt");
        fs::write(&file, "celery==5.3.0\nattrs==23.1.0\n").unwrap();

        let installer = RecordingInstaller {
            fail_for: Some("celery"),
            ..RecordingInstaller::default()
        };
        let upgrader = PackageUpgrader::with_installer(
            vec![file.clone()],
            UpgradeOptions::default(),
            Box::new(installer),
        );

        let upgraded = upgrader
            .do_upgrade(&[info("celery", "5.3.0", "5.4.0"), info("attrs", "23.1.0", "24.2.0")])
            .unwrap();

        assert_eq!(upgraded.len(), 1);
        assert_eq!(upgraded[0].name(), "attrs");
        assert_eq!(fs::read_to_string(&file).unwrap(), "celery==5.3.0\nattrs==24.2.0\n");
    }

    #[test]
    fn dry_run_touches_nothing() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("requirements.txt");
        fs::write(&file, "celery==5.3.0\n").unwrap();

        let installer = RecordingInstaller::default();
        let upgrader = PackageUpgrader::with_installer(
            vec![file.clone()],
            UpgradeOptions {
                dry_run: true,
                ..UpgradeOptions::default()
            },
            Box::new(installer.clone()),
        );

        let upgraded = upgrader.do_upgrade(&[info("celery", "5.3.0", "5.4.0")]).unwrap();

        assert_eq!(upgraded.len(), 1);
        assert!(installer.calls.borrow().is_empty());
        assert_eq!(fs::read_to_string(&file).unwrap(), "celery==5.3.0\n");
    }

    #[test]
    fn skip_installation_still_rewrites() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("requirements.txt");
        fs::write(&file, "celery==5.3.0\n").unwrap();

        let installer = RecordingInstaller::default();
        let upgrader = PackageUpgrader::with_installer(
            vec![file.clone()],
            UpgradeOptions {
                skip_package_installation: true,
                ..UpgradeOptions::default()
            },
            Box::new(installer.clone()),
        );

        upgrader.do_upgrade(&[info("celery", "5.3.0", "5.4.0")]).unwrap();

        assert!(installer.calls.borrow().is_empty());
        assert_eq!(fs::read_to_string(&file).unwrap(), "celery==5.4.0\n");
    }
}
