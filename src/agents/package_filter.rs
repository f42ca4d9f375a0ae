use regex::Regex;
use tracing::warn;

/// Packages named with `-p`, matched by exact (case-insensitive) name or by
/// regular expression against the lowercase name.
#[derive(Debug, Clone, Default)]
pub struct PackageFilter {
    select_all: bool,
    patterns: Vec<NamePattern>,
}

#[derive(Debug, Clone)]
struct NamePattern {
    name: String,
    regex: Option<Regex>,
}

impl PackageFilter {
    pub fn new<S: AsRef<str>>(values: &[S]) -> Self {
        let values: Vec<String> = values
            .iter()
            .map(|v| v.as_ref().trim().to_lowercase())
            .filter(|v| !v.is_empty())
            .collect();

        if values.len() == 1 && values[0] == "all" {
            return Self {
                select_all: true,
                patterns: Vec::new(),
            };
        }

        let patterns = values
            .into_iter()
            .map(|name| {
                let regex = Regex::new(&name)
                    .inspect_err(|e| warn!("Package filter '{}' is not a valid regex: {}", name, e))
                    .ok();
                NamePattern { name, regex }
            })
            .collect();

        Self {
            select_all: false,
            patterns,
        }
    }

    /// True when packages were named on the command line, so selection
    /// happens without prompting.
    pub fn is_explicit(&self) -> bool {
        self.select_all || !self.patterns.is_empty()
    }

    pub fn matches(&self, package_name: &str) -> bool {
        if !self.is_explicit() || self.select_all {
            return true;
        }

        let name = package_name.trim().to_lowercase();
        self.patterns.iter().any(|pattern| {
            pattern.name == name
                || pattern
                    .regex
                    .as_ref()
                    .is_some_and(|regex| regex.is_match(&name))
        })
    }
}
