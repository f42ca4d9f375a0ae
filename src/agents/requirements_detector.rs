use crate::error::Result;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const AUTODETECT_FILES: &[&str] = &["requirements.txt", "requirements.pip"];
const AUTODETECT_DIR: &str = "requirements";

/// RequirementsDetector finds the requirements files to work on
pub struct RequirementsDetector {
    base_dir: PathBuf,
}

impl RequirementsDetector {
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    /// Explicit files when given, otherwise the conventional locations, plus
    /// every file they include through `-r`.
    pub fn detect(&self, explicit: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut filenames = if explicit.is_empty() {
            self.autodetect_files()?
        } else {
            self.explicit_files(explicit)
        };

        let mut index = 0;
        while index < filenames.len() {
            let included = Self::included_files(&filenames[index])?;
            for candidate in included {
                if !filenames.contains(&candidate) {
                    debug!("Following inclusion: {}", candidate.display());
                    filenames.push(candidate);
                }
            }
            index += 1;
        }

        Ok(filenames)
    }

    fn explicit_files(&self, explicit: &[PathBuf]) -> Vec<PathBuf> {
        let mut filenames = Vec::new();
        for argument in explicit {
            let path = self.base_dir.join(argument);
            if Self::is_valid_requirements_file(&path) {
                if !filenames.contains(&path) {
                    filenames.push(path);
                }
            } else {
                warn!("Invalid requirements file: {}", argument.display());
                println!(
                    "{} {}",
                    "Invalid requirements file:".red(),
                    argument.display()
                );
            }
        }
        filenames
    }

    fn autodetect_files(&self) -> Result<Vec<PathBuf>> {
        let mut filenames: Vec<PathBuf> = AUTODETECT_FILES
            .iter()
            .map(|name| self.base_dir.join(name))
            .filter(|path| Self::is_valid_requirements_file(path))
            .collect();

        let requirements_dir = self.base_dir.join(AUTODETECT_DIR);
        if requirements_dir.is_dir() {
            let mut nested: Vec<PathBuf> = fs::read_dir(&requirements_dir)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| Self::is_valid_requirements_file(path))
                .collect();
            nested.sort();
            filenames.extend(nested);
        }

        Ok(filenames)
    }

    /// Files referenced by `-r <file>` lines, relative to the including file.
    fn included_files(filename: &Path) -> Result<Vec<PathBuf>> {
        let content = fs::read_to_string(filename)?;
        let parent = filename.parent().unwrap_or_else(|| Path::new(""));

        Ok(content
            .lines()
            .filter_map(|line| {
                let line = line.trim();
                line.strip_prefix("-r ")
                    .or_else(|| line.strip_prefix("--requirement "))
                    .map(str::trim)
            })
            .filter(|included| !included.is_empty())
            .map(|included| parent.join(included))
            .filter(|path| Self::is_valid_requirements_file(path))
            .collect())
    }

    fn is_valid_requirements_file(path: &Path) -> bool {
        let name = path.to_string_lossy();
        (name.ends_with("txt") || name.ends_with("pip")) && path.is_file()
    }
}
