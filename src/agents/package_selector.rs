use crate::agents::PackageFilter;
use crate::error::{AscentError, Result};
use crate::resolver::ResolvedVersionInfo;
use colored::Colorize;
use indexmap::IndexMap;
use std::collections::HashSet;
use std::io::{BufRead, Write};

const HEADERS: [&str; 5] = ["No.", "Package", "Current version", "Latest version", "Release date"];

/// Lets the user pick which available upgrades to apply.
///
/// Only packages with an upgrade are offered, numbered from 1 in resolution
/// order.
pub struct PackageSelector {
    candidates: IndexMap<usize, ResolvedVersionInfo>,
}

impl PackageSelector {
    pub fn new(resolved: &IndexMap<String, ResolvedVersionInfo>) -> Self {
        let candidates = resolved
            .values()
            .filter(|info| info.upgrade_available())
            .cloned()
            .enumerate()
            .map(|(i, info)| (i + 1, info))
            .collect();

        Self { candidates }
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Selection driven by `-p`; every matching candidate is taken.
    pub fn select_matching(&self, filter: &PackageFilter) -> Vec<ResolvedVersionInfo> {
        self.candidates
            .values()
            .filter(|info| filter.matches(info.name()))
            .cloned()
            .collect()
    }

    /// Show the candidate table on `output` and read one choice from `input`.
    pub fn ask<R: BufRead, W: Write>(
        &self,
        input: &mut R,
        output: &mut W,
    ) -> Result<Vec<ResolvedVersionInfo>> {
        writeln!(output)?;
        writeln!(output, "{}", "Available upgrades:".green())?;
        write!(output, "{}", self.render_table())?;
        writeln!(output)?;
        writeln!(
            output,
            "Please choose which packages should be upgraded. \
             Choices: \"all -1 -2 -3\", \"q\" (quit), \"x\" (exit) or \"1 2 3\""
        )?;
        write!(output, "{}", "Choice: ".bold())?;
        output.flush()?;

        let mut choice = String::new();
        input.read_line(&mut choice)?;
        self.parse_choice(&choice)
    }

    /// Interpret a typed choice.
    ///
    /// `all` optionally followed by negative numbers excludes those entries;
    /// otherwise the numbers given are selected. Unknown numbers are ignored.
    pub fn parse_choice(&self, choice: &str) -> Result<Vec<ResolvedVersionInfo>> {
        let choice = choice.trim();

        match choice {
            "" => return Err(AscentError::Selection("No choice selected.".to_string())),
            "q" => return Err(AscentError::Selection("Quit.".to_string())),
            "x" => return Err(AscentError::Selection("Exit.".to_string())),
            _ => {}
        }

        let indexes: Vec<usize> = if let Some(rest) = choice.strip_prefix("all") {
            let excluded = Self::parse_numbers(rest)?;
            let excluded: HashSet<i64> = excluded.into_iter().collect();
            self.candidates
                .keys()
                .copied()
                .filter(|i| !excluded.contains(&-(*i as i64)))
                .collect()
        } else {
            Self::parse_numbers(choice)?
                .into_iter()
                .filter_map(|n| usize::try_from(n).ok())
                .collect()
        };

        let selected: Vec<ResolvedVersionInfo> = indexes
            .iter()
            .filter_map(|i| self.candidates.get(i))
            .cloned()
            .collect();

        if selected.is_empty() {
            return Err(AscentError::Selection(
                "No valid choice selected.".to_string(),
            ));
        }

        Ok(selected)
    }

    fn parse_numbers(raw: &str) -> Result<Vec<i64>> {
        raw.split_whitespace()
            .map(|token| {
                token
                    .parse::<i64>()
                    .map_err(|_| AscentError::Selection("Invalid choice".to_string()))
            })
            .collect()
    }

    fn render_table(&self) -> String {
        let rows: Vec<[String; 5]> = self
            .candidates
            .iter()
            .map(|(i, info)| {
                [
                    i.to_string(),
                    info.name().to_string(),
                    info.current_version().to_string(),
                    info.latest_version().to_string(),
                    info.upload_time().to_string(),
                ]
            })
            .collect();

        let mut widths = HEADERS.map(str::len);
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let separator = {
            let mut line = String::from("+");
            for width in &widths {
                line.push_str(&"-".repeat(width + 2));
                line.push('+');
            }
            line
        };

        let mut table = String::new();
        table.push_str(&separator);
        table.push('\n');

        let header: Vec<String> = HEADERS
            .iter()
            .zip(&widths)
            .map(|(h, w)| format!("{:<w$}", h, w = w).blue().to_string())
            .collect();
        table.push_str(&format!("| {} |\n", header.join(" | ")));
        table.push_str(&separator);
        table.push('\n');

        for row in rows {
            let cells: Vec<String> = row
                .iter()
                .zip(&widths)
                .enumerate()
                .map(|(column, (cell, w))| {
                    let padded = format!("{:<w$}", cell, w = w);
                    match column {
                        0 | 1 => padded.green().to_string(),
                        _ => padded,
                    }
                })
                .collect();
            table.push_str(&format!("| {} |\n", cells.join(" | ")));
        }

        table.push_str(&separator);
        table.push('\n');
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pypi::Version;
    use std::io::Cursor;

    fn info(name: &str, current: &str, latest: &str) -> ResolvedVersionInfo {
        ResolvedVersionInfo::new(
            name,
            Version::parse(current).unwrap(),
            Version::parse(latest).unwrap(),
            "2024-01-01 00:00:00",
        )
    }

    fn selector() -> PackageSelector {
        let mut resolved = IndexMap::new();
        for item in [
            info("django", "4.2.0", "5.0.0"),
            info("six", "1.16.0", "1.16.0"),
            info("celery", "5.3.0", "5.4.0"),
            info("attrs", "23.1.0", "24.2.0"),
        ] {
            resolved.insert(item.name().to_string(), item);
        }
        PackageSelector::new(&resolved)
    }

    fn names(selected: &[ResolvedVersionInfo]) -> Vec<&str> {
        selected.iter().map(|i| i.name()).collect()
    }

    #[test]
    fn offers_only_upgradable_packages() {
        let selector = selector();
        let all = selector.parse_choice("all").unwrap();
        assert_eq!(names(&all), vec!["django", "celery", "attrs"]);
    }

    #[test]
    fn selects_listed_numbers() {
        let selected = selector().parse_choice("1 3").unwrap();
        assert_eq!(names(&selected), vec!["django", "attrs"]);
    }

    #[test]
    fn all_with_exclusions() {
        let selected = selector().parse_choice("all -2").unwrap();
        assert_eq!(names(&selected), vec!["django", "attrs"]);
    }

    #[test]
    fn quit_and_exit_cancel() {
        assert!(matches!(
            selector().parse_choice("q"),
            Err(AscentError::Selection(msg)) if msg == "Quit."
        ));
        assert!(matches!(
            selector().parse_choice("x\n"),
            Err(AscentError::Selection(msg)) if msg == "Exit."
        ));
    }

    #[test]
    fn empty_and_invalid_choices_are_rejected() {
        assert!(matches!(selector().parse_choice("  "), Err(AscentError::Selection(_))));
        assert!(matches!(selector().parse_choice("one"), Err(AscentError::Selection(_))));
        assert!(matches!(selector().parse_choice("9"), Err(AscentError::Selection(_))));
    }

    #[test]
    fn up_to_date_batch_has_no_candidates() {
        let mut resolved = IndexMap::new();
        resolved.insert("six".to_string(), info("six", "1.16.0", "1.16.0"));
        assert!(PackageSelector::new(&resolved).is_empty());
    }

    #[test]
    fn preselection_uses_filter() {
        let selected = selector().select_matching(&PackageFilter::new(&["^c"]));
        assert_eq!(names(&selected), vec!["celery"]);

        let everything = selector().select_matching(&PackageFilter::new(&["all"]));
        assert_eq!(everything.len(), 3);
    }

    #[test]
    fn ask_renders_table_and_reads_choice() {
        colored::control::set_override(false);
        let mut input = Cursor::new(b"2\n".to_vec());
        let mut output = Vec::new();

        let selected = selector().ask(&mut input, &mut output).unwrap();
        assert_eq!(names(&selected), vec!["celery"]);

        let rendered = String::from_utf8(output).unwrap();
        assert!(rendered.contains("| No. | Package | Current version | Latest version | Release date        |"));
        assert!(rendered.contains("| 2   | celery  | 5.3.0           | 5.4.0          | 2024-01-01 00:00:00 |"));
        assert!(!rendered.contains("six"));
    }
}
