//! Rule-based junk file classification.

use std::path::Path;
use std::sync::LazyLock;

use globset::{GlobBuilder, GlobMatcher};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use reclaim_core::{FileRecord, JunkCategory, JunkFileRecord, JunkRule, ScanProgress};

use crate::progress::emit;
use crate::rules::DEFAULT_RULES;

/// Progress is reported every this many files.
const PROGRESS_INTERVAL: usize = 1000;

static DEFAULT_CLASSIFIER: LazyLock<JunkClassifier> = LazyLock::new(JunkClassifier::new);

/// How a single rule tests a path.
#[derive(Debug, Clone)]
enum Matcher {
    Glob(GlobMatcher),
    Substring(String),
}

impl Matcher {
    fn compile(rule: &JunkRule) -> Self {
        if !rule.is_glob() {
            return Self::Substring(rule.pattern.to_string());
        }
        match GlobBuilder::new(&rule.pattern)
            .literal_separator(true)
            .build()
        {
            Ok(glob) => Self::Glob(glob.compile_matcher()),
            Err(err) => {
                warn!(pattern = %rule.pattern, error = %err, "invalid glob, matching as substring");
                Self::Substring(rule.pattern.to_string())
            }
        }
    }

    fn is_match(&self, path: &Path) -> bool {
        match self {
            Self::Glob(glob) => glob.is_match(path),
            Self::Substring(needle) => path.to_string_lossy().contains(needle.as_str()),
        }
    }
}

/// Classifies paths against an ordered rule table.
#[derive(Debug, Clone)]
pub struct JunkClassifier {
    rules: Vec<(JunkRule, Matcher)>,
}

impl JunkClassifier {
    /// Classifier over the built-in rule table.
    pub fn new() -> Self {
        Self::with_rules(DEFAULT_RULES.iter().cloned())
    }

    /// Classifier over a custom rule table. Order is significant.
    pub fn with_rules(rules: impl IntoIterator<Item = JunkRule>) -> Self {
        let rules = rules
            .into_iter()
            .map(|rule| {
                let matcher = Matcher::compile(&rule);
                (rule, matcher)
            })
            .collect();
        Self { rules }
    }

    /// The rules in evaluation order.
    pub fn rules(&self) -> impl Iterator<Item = &JunkRule> {
        self.rules.iter().map(|(rule, _)| rule)
    }

    /// First rule matching `path`, if any.
    pub fn match_rule(&self, path: &Path) -> Option<&JunkRule> {
        self.rules
            .iter()
            .find(|(_, matcher)| matcher.is_match(path))
            .map(|(rule, _)| rule)
    }

    /// Classify every record, returning junk files by descending weight.
    ///
    /// Files of equal weight keep their input order.
    pub fn find_junk_files<F>(&self, files: &[FileRecord], mut on_progress: F) -> Vec<JunkFileRecord>
    where
        F: FnMut(&ScanProgress),
    {
        let total = files.len() as u64;
        emit(
            &mut on_progress,
            ScanProgress::new(1, 1, 0, total, "Scanning for junk files..."),
        );

        let mut junk = Vec::new();
        for (i, file) in files.iter().enumerate() {
            if let Some(rule) = self.match_rule(&file.path) {
                junk.push(JunkFileRecord::new(file, rule));
            }

            let processed = i + 1;
            if processed % PROGRESS_INTERVAL == 0 {
                emit(
                    &mut on_progress,
                    ScanProgress::new(
                        1,
                        1,
                        processed as u64,
                        total,
                        format!("Scanning for junk: {processed}/{total}"),
                    ),
                );
            }
        }

        junk.sort_by(|a, b| b.weight.cmp(&a.weight));

        emit(
            &mut on_progress,
            ScanProgress::new(1, 1, total, total, format!("Found {} junk files", junk.len()))
                .completed(),
        );
        info!(files = total, junk = junk.len(), "junk classification done");

        junk
    }
}

impl Default for JunkClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// First built-in rule matching `path`, if any.
pub fn match_junk_rule(path: &Path) -> Option<&'static JunkRule> {
    DEFAULT_CLASSIFIER.match_rule(path)
}

/// Classify records against the built-in rules.
pub fn find_junk_files<F>(files: &[FileRecord], on_progress: F) -> Vec<JunkFileRecord>
where
    F: FnMut(&ScanProgress),
{
    DEFAULT_CLASSIFIER.find_junk_files(files, on_progress)
}

/// Junk files of one category with their combined size.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub files: Vec<JunkFileRecord>,
    pub total_size: u64,
}

/// Group junk files by category, in order of first appearance.
pub fn group_by_category(junk: &[JunkFileRecord]) -> IndexMap<JunkCategory, CategorySummary> {
    let mut groups: IndexMap<JunkCategory, CategorySummary> = IndexMap::new();
    for record in junk {
        let summary = groups.entry(record.category).or_default();
        summary.total_size += record.file.size;
        summary.files.push(record.clone());
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use reclaim_core::Timestamps;
    use std::time::UNIX_EPOCH;

    fn record(path: &str, size: u64) -> FileRecord {
        FileRecord::new(path, size, Timestamps::with_modified(UNIX_EPOCH))
    }

    fn category_of(path: &str) -> Option<JunkCategory> {
        match_junk_rule(Path::new(path)).map(|r| r.category)
    }

    #[test]
    fn test_default_rules_match() {
        assert_eq!(category_of("/app/data.cache"), Some(JunkCategory::Cache));
        assert_eq!(
            category_of("/Users/me/Library/Caches/com.app/blob"),
            Some(JunkCategory::Cache)
        );
        assert_eq!(category_of("/var/app/server.log"), Some(JunkCategory::Logs));
        assert_eq!(category_of("/var/app/server.log.1"), Some(JunkCategory::Logs));
        assert_eq!(category_of("/home/me/.notes.md.swp"), Some(JunkCategory::Temp));
        assert_eq!(category_of("/home/me/draft.txt~"), Some(JunkCategory::Temp));
        assert_eq!(
            category_of("/src/proj/__pycache__/mod.cpython-312.pyc"),
            Some(JunkCategory::Dev)
        );
        assert_eq!(
            category_of("/Users/me/Downloads/setup.exe"),
            Some(JunkCategory::Downloads)
        );
        assert_eq!(category_of("/home/me/notes.txt"), None);
    }

    #[test]
    fn test_single_star_does_not_cross_directories() {
        assert_eq!(category_of("/Users/me/Downloads/old/setup.exe"), None);
    }

    #[test]
    fn test_first_rule_wins() {
        // Both the .cache directory rule (10) and the *.log rule (8) match.
        let rule = match_junk_rule(Path::new("/home/me/.cache/app/run.log")).unwrap();
        assert_eq!(rule.description, "User cache directories");
        assert_eq!(rule.weight, 10);
    }

    #[test]
    fn test_substring_rules() {
        let classifier = JunkClassifier::with_rules([
            JunkRule::new("/.Trash/", JunkCategory::Other, "Trash", 3),
            JunkRule::new("**/*.tmp", JunkCategory::Temp, "Temp files", 9),
        ]);

        let rule = classifier.match_rule(Path::new("/home/me/.Trash/a.tmp")).unwrap();
        assert_eq!(rule.category, JunkCategory::Other);
        assert!(classifier.match_rule(Path::new("/home/me/Trash.txt")).is_none());
    }

    #[test]
    fn test_invalid_glob_falls_back_to_substring() {
        let classifier = JunkClassifier::with_rules([JunkRule::new(
            "[unclosed",
            JunkCategory::Other,
            "Broken",
            1,
        )]);
        assert!(classifier.match_rule(Path::new("/x/[unclosed/y")).is_some());
        assert!(classifier.match_rule(Path::new("/x/y")).is_none());
    }

    #[test]
    fn test_find_junk_files_sorted_by_weight() {
        let files = vec![
            record("/p/build/out.o", 10),
            record("/p/readme.md", 20),
            record("/p/.DS_Store", 30),
            record("/p/dist/app.js", 40),
        ];
        let mut reports = Vec::new();
        let junk = find_junk_files(&files, |p| reports.push(p.clone()));

        let paths: Vec<_> = junk.iter().map(|j| j.file.path.to_str().unwrap()).collect();
        assert_eq!(paths, vec!["/p/.DS_Store", "/p/build/out.o", "/p/dist/app.js"]);

        let last = reports.last().unwrap();
        assert!(last.complete);
        assert_eq!(last.message, "Found 3 junk files");
    }

    #[test]
    fn test_progress_cadence() {
        let files: Vec<_> = (0..2500).map(|i| record(&format!("/d/f{i}.txt"), 1)).collect();
        let mut reports = Vec::new();
        find_junk_files(&files, |p| reports.push(p.message.clone()));

        assert_eq!(reports.len(), 4);
        assert_eq!(reports[1], "Scanning for junk: 1000/2500");
        assert_eq!(reports[2], "Scanning for junk: 2000/2500");
    }

    #[test]
    fn test_group_by_category() {
        let files = vec![
            record("/p/a.tmp", 100),
            record("/p/b.log", 50),
            record("/p/c.tmp", 25),
        ];
        let groups = group_by_category(&find_junk_files(&files, |_| {}));

        let keys: Vec<_> = groups.keys().copied().collect();
        assert_eq!(keys, vec![JunkCategory::Temp, JunkCategory::Logs]);
        assert_eq!(groups[&JunkCategory::Temp].total_size, 125);
        assert_eq!(groups[&JunkCategory::Temp].files.len(), 2);
        assert_eq!(groups[&JunkCategory::Logs].total_size, 50);
    }
}
