use crate::error::{AscentError, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const INDEX_URL_ENV: &str = "PIP_INDEX_URL";

const CONFIG_SECTION: &str = "global";
const CONFIG_KEY: &str = "index-url";

/// A place the index URL may be configured.
pub trait IndexUrlSource {
    /// Human readable origin, shown to the user when the source wins.
    fn describe(&self) -> String;

    fn index_url(&self) -> Result<Option<String>>;
}

/// Value of an environment variable, captured when the chain is built.
pub struct EnvVarSource {
    name: String,
    value: Option<String>,
}

impl EnvVarSource {
    pub fn new(name: impl Into<String>, value: Option<String>) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

impl IndexUrlSource for EnvVarSource {
    fn describe(&self) -> String {
        format!("{} environment variable", self.name)
    }

    fn index_url(&self) -> Result<Option<String>> {
        Ok(self
            .value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string))
    }
}

/// An INI style pip configuration file (`[global]` / `index-url`).
pub struct PipConfigFile {
    path: PathBuf,
}

impl PipConfigFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl IndexUrlSource for PipConfigFile {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn index_url(&self) -> Result<Option<String>> {
        if !self.path.is_file() {
            return Ok(None);
        }

        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Skipping unreadable pip config {}: {}", self.path.display(), e);
                return Ok(None);
            }
        };

        read_ini_value(&content, CONFIG_SECTION, CONFIG_KEY)
    }
}

/// Ranked index URL sources; the first one yielding a value wins.
pub struct IndexUrlChain {
    sources: Vec<Box<dyn IndexUrlSource>>,
}

impl IndexUrlChain {
    pub fn new(sources: Vec<Box<dyn IndexUrlSource>>) -> Self {
        Self { sources }
    }

    /// The chain pip itself consults, built from the current process environment.
    pub fn standard() -> Self {
        Self::from_environment(|name| std::env::var(name).ok(), dirs::home_dir())
    }

    /// Environment variable first, then user, virtualenv and site config files.
    pub fn from_environment<F>(lookup: F, home_dir: Option<PathBuf>) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut sources: Vec<Box<dyn IndexUrlSource>> = vec![Box::new(EnvVarSource::new(
            INDEX_URL_ENV,
            lookup(INDEX_URL_ENV),
        ))];

        for path in config_file_locations(&lookup, home_dir.as_deref()) {
            sources.push(Box::new(PipConfigFile::new(path)));
        }

        Self::new(sources)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns the configured URL together with a description of its source.
    pub fn resolve(&self) -> Result<Option<(String, String)>> {
        for source in &self.sources {
            if let Some(url) = source.index_url()? {
                debug!("Index URL {} found in {}", url, source.describe());
                return Ok(Some((url, source.describe())));
            }
        }
        Ok(None)
    }
}

fn config_file_locations<F>(lookup: &F, home_dir: Option<&Path>) -> Vec<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    let mut locations = Vec::new();

    if let Some(home) = home_dir {
        locations.push(home.join(".pip").join("pip.conf"));
        locations.push(home.join(".pip").join("pip.ini"));
        locations.push(home.join(".config").join("pip").join("pip.conf"));
        locations.push(home.join(".config").join("pip").join("pip.ini"));
    }

    if let Some(venv) = lookup("VIRTUAL_ENV").filter(|v| !v.is_empty()) {
        let venv = PathBuf::from(venv);
        locations.push(venv.join("pip.conf"));
        locations.push(venv.join("pip.ini"));
    }

    locations.extend(site_config_files(lookup));
    locations
}

fn site_config_files<F>(lookup: &F) -> Vec<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    if cfg!(target_os = "windows") {
        let program_data = lookup("PROGRAMDATA").unwrap_or_else(|| "C:\\ProgramData".to_string());
        return vec![PathBuf::from(program_data).join("pip").join("pip.ini")];
    }

    if cfg!(target_os = "macos") {
        return vec![PathBuf::from("/Library/Application Support/pip/pip.conf")];
    }

    let xdg_dirs = lookup("XDG_CONFIG_DIRS")
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "/etc/xdg".to_string());

    let mut files: Vec<PathBuf> = xdg_dirs
        .split(':')
        .filter(|dir| !dir.is_empty())
        .map(|dir| PathBuf::from(dir).join("pip").join("pip.conf"))
        .collect();
    files.push(PathBuf::from("/etc/pip.conf"));
    files
}

/// Look up `key` inside `[section]` of an INI document.
///
/// Keys are matched case-insensitively with `_` treated as `-`. Empty values
/// count as unset.
pub fn read_ini_value(content: &str, section: &str, key: &str) -> Result<Option<String>> {
    let section_regex = Regex::new(r"^\s*\[([^\]]+)\]\s*$")
        .map_err(|e| AscentError::Config(format!("Regex error: {}", e)))?;
    let entry_regex = Regex::new(r"^([^=:\s][^=:]*?)\s*[=:]\s*(.*?)\s*$")
        .map_err(|e| AscentError::Config(format!("Regex error: {}", e)))?;

    let wanted_key = normalize_key(key);
    let mut in_section = false;

    for line in content.lines() {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        if let Some(cap) = section_regex.captures(line) {
            in_section = cap[1].trim().eq_ignore_ascii_case(section);
            continue;
        }

        // Indented lines continue the previous value; index URLs never need them.
        if !in_section || line.starts_with(char::is_whitespace) {
            continue;
        }

        if let Some(cap) = entry_regex.captures(line) {
            if normalize_key(&cap[1]) == wanted_key {
                let value = cap[2].trim();
                return Ok((!value.is_empty()).then(|| value.to_string()));
            }
        }
    }

    Ok(None)
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace('_', "-")
}
