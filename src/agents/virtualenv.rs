use crate::error::{AscentError, Result};
use colored::Colorize;

const VIRTUAL_ENV: &str = "VIRTUAL_ENV";

/// True inside an activated virtual environment.
pub fn is_virtualenv() -> bool {
    is_virtualenv_with(|name| std::env::var(name).ok())
}

fn is_virtualenv_with<F>(lookup: F) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    lookup(VIRTUAL_ENV).is_some_and(|v| !v.trim().is_empty())
}

/// Refuse to install into a system interpreter unless the user opted out.
pub fn check_for_virtualenv(
    skip_virtualenv_check: bool,
    skip_package_installation: bool,
    in_virtualenv: bool,
) -> Result<()> {
    if skip_virtualenv_check || skip_package_installation || in_virtualenv {
        return Ok(());
    }

    println!(
        "{}\n{}\nPlease {} or {} with one of the following options:\n{}\n{}",
        "It appears that you haven't activated a virtual environment.".red(),
        "Installing packages directly in the system is not recommended.".red(),
        "activate your project's virtual environment".magenta(),
        "rerun this command".magenta(),
        "--skip-virtualenv-check (install the packages anyway)".red(),
        "--skip-package-installation (don't install any packages, just update the requirements file(s))"
            .red()
    );

    Err(AscentError::VirtualenvMissing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_activated_environment() {
        assert!(is_virtualenv_with(|_| Some("/home/user/.venvs/app".to_string())));
        assert!(!is_virtualenv_with(|_| Some(String::new())));
        assert!(!is_virtualenv_with(|_| None));
    }

    #[test]
    fn outside_virtualenv_requires_opt_out() {
        assert!(matches!(
            check_for_virtualenv(false, false, false),
            Err(AscentError::VirtualenvMissing)
        ));
        assert!(check_for_virtualenv(true, false, false).is_ok());
        assert!(check_for_virtualenv(false, true, false).is_ok());
        assert!(check_for_virtualenv(false, false, true).is_ok());
    }
}
