use crate::error::Result;
use std::fs;
use std::path::Path;

/// Option lines that never name a package
const OPTION_PREFIXES: &[&str] = &[
    "-f",
    "--find-links",
    "-i",
    "--index-url",
    "--extra-index-url",
    "--no-index",
    "-r",
    "-Z",
    "--always-unzip",
];

/// PackageDetector collects requirement lines from requirements files
pub struct PackageDetector;

impl PackageDetector {
    /// Requirement lines of every file, in file order, without comments.
    pub fn detect_packages<P: AsRef<Path>>(requirements_files: &[P]) -> Result<Vec<String>> {
        let mut packages = Vec::new();
        for filename in requirements_files {
            let content = fs::read_to_string(filename)?;
            packages.extend(content.lines().filter_map(Self::process_line));
        }
        Ok(packages)
    }

    fn process_line(line: &str) -> Option<String> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        if OPTION_PREFIXES.iter().any(|prefix| line.starts_with(prefix)) {
            return None;
        }

        let line = match line.split_once('#') {
            Some((requirement, _comment)) => requirement.trim(),
            None => line,
        };

        Some(line.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn keeps_requirements_and_drops_noise() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("requirements.txt");
        fs::write(
            &path,
            "\
# web stack
--index-url https://pypi.example/simple/
-r base.txt
Django==4.2.0  # LTS

celery[redis]==5.3.0
-e git+https://github.com/example/project.git#egg=project
",
        )
        .unwrap();

        let packages = PackageDetector::detect_packages(&[&path]).unwrap();
        assert_eq!(
            packages,
            vec![
                "Django==4.2.0".to_string(),
                "celery[redis]==5.3.0".to_string(),
                "-e git+https://github.com/example/project.git".to_string(),
            ]
        );
    }

    #[test]
    fn concatenates_files_in_order() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("a.txt");
        let second = dir.path().join("b.txt");
        fs::write(&first, "six==1.16.0\n").unwrap();
        fs::write(&second, "attrs==23.1.0\n").unwrap();

        let packages = PackageDetector::detect_packages(&[&first, &second]).unwrap();
        assert_eq!(packages, vec!["six==1.16.0", "attrs==23.1.0"]);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.txt");
        assert!(PackageDetector::detect_packages(&[&missing]).is_err());
    }
}
