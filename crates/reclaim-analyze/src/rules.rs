//! The built-in junk rule table.
//!
//! Rules are evaluated in declaration order and the first match wins, so
//! more specific patterns must come before broader ones.

use reclaim_core::{JunkCategory, JunkRule};

use JunkCategory::{Cache, Dev, Downloads, Logs, Temp};

/// Default prioritized junk rules.
pub static DEFAULT_RULES: &[JunkRule] = &[
    // System caches
    JunkRule::new("**/Library/Caches/**/*", Cache, "System and app caches", 10),
    JunkRule::new("**/.cache/**/*", Cache, "User cache directories", 10),
    JunkRule::new("**/Cache/**/*", Cache, "Application cache folders", 8),
    JunkRule::new("**/*.cache", Cache, "Cache files", 8),
    // Browser caches
    JunkRule::new("**/Google/Chrome/**/Cache/**/*", Cache, "Chrome browser cache", 10),
    JunkRule::new("**/Firefox/Profiles/**/cache2/**/*", Cache, "Firefox browser cache", 10),
    JunkRule::new("**/Safari/Databases/**/*", Cache, "Safari databases", 6),
    // Logs
    JunkRule::new("**/Library/Logs/**/*", Logs, "System and app logs", 8),
    JunkRule::new("**/*.log", Logs, "Log files", 8),
    JunkRule::new("**/*.log.*", Logs, "Rotated log files", 9),
    JunkRule::new("**/logs/**/*.log", Logs, "Log directories", 8),
    // Temp files
    JunkRule::new("**/tmp/**/*", Temp, "Temporary files", 9),
    JunkRule::new("**/*.tmp", Temp, "Temp files", 9),
    JunkRule::new("**/*.temp", Temp, "Temp files", 9),
    JunkRule::new("**/*~", Temp, "Backup files", 7),
    JunkRule::new("**/.*.swp", Temp, "Vim swap files", 8),
    JunkRule::new("**/.*.swo", Temp, "Vim swap files", 8),
    JunkRule::new("**/*.bak", Temp, "Backup files", 7),
    JunkRule::new("**/.DS_Store", Temp, "macOS metadata files", 10),
    JunkRule::new("**/Thumbs.db", Temp, "Windows thumbnail cache", 10),
    // Development artifacts
    JunkRule::new("**/node_modules/**/*", Dev, "Node.js dependencies", 5),
    JunkRule::new("**/.npm/**/*", Dev, "npm cache", 8),
    JunkRule::new("**/.yarn/cache/**/*", Dev, "Yarn cache", 8),
    JunkRule::new("**/DerivedData/**/*", Dev, "Xcode derived data", 9),
    JunkRule::new("**/build/**/*", Dev, "Build artifacts", 4),
    JunkRule::new("**/dist/**/*", Dev, "Distribution builds", 4),
    JunkRule::new("**/__pycache__/**/*", Dev, "Python bytecode cache", 9),
    JunkRule::new("**/*.pyc", Dev, "Python compiled files", 9),
    JunkRule::new("**/target/debug/**/*", Dev, "Rust debug builds", 7),
    JunkRule::new("**/target/release/**/*", Dev, "Rust release builds", 5),
    JunkRule::new("**/.gradle/**/*", Dev, "Gradle cache", 7),
    JunkRule::new("**/.m2/repository/**/*", Dev, "Maven repository cache", 6),
    JunkRule::new("**/Pods/**/*", Dev, "CocoaPods dependencies", 5),
    JunkRule::new("**/.cocoapods/**/*", Dev, "CocoaPods cache", 8),
    JunkRule::new("**/vendor/bundle/**/*", Dev, "Ruby bundler cache", 6),
    JunkRule::new("**/coverage/**/*", Dev, "Test coverage reports", 8),
    JunkRule::new("**/.jest/**/*", Dev, "Jest cache", 9),
    JunkRule::new("**/.next/**/*", Dev, "Next.js build cache", 7),
    JunkRule::new("**/.nuxt/**/*", Dev, "Nuxt.js build cache", 7),
    JunkRule::new("**/.turbo/**/*", Dev, "Turborepo cache", 8),
    // Old downloads
    JunkRule::new("**/Downloads/*.dmg", Downloads, "Disk image files", 8),
    JunkRule::new("**/Downloads/*.pkg", Downloads, "Package installers", 8),
    JunkRule::new("**/Downloads/*.zip", Downloads, "Zip archives in Downloads", 5),
    JunkRule::new("**/Downloads/*.tar.gz", Downloads, "Tar archives in Downloads", 6),
    JunkRule::new("**/Downloads/*.exe", Downloads, "Windows executables", 9),
    JunkRule::new("**/Downloads/*.msi", Downloads, "Windows installers", 9),
];

/// Default rules of one category, in declaration order.
pub fn rules_by_category(category: JunkCategory) -> impl Iterator<Item = &'static JunkRule> {
    DEFAULT_RULES.iter().filter(move |r| r.category == category)
}

/// Distinct categories used by the default rules, in declaration order.
pub fn categories() -> Vec<JunkCategory> {
    let mut seen = Vec::new();
    for rule in DEFAULT_RULES {
        if !seen.contains(&rule.category) {
            seen.push(rule.category);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_table_shape() {
        assert_eq!(DEFAULT_RULES.len(), 46);
        assert!(DEFAULT_RULES.iter().all(JunkRule::is_glob));
        assert!(DEFAULT_RULES.iter().all(|r| (1..=10).contains(&r.weight)));
    }

    #[test]
    fn test_categories_in_declaration_order() {
        assert_eq!(categories(), vec![Cache, Logs, Temp, Dev, Downloads]);
    }

    #[test]
    fn test_rules_by_category() {
        let downloads: Vec<_> = rules_by_category(Downloads).collect();
        assert_eq!(downloads.len(), 6);
        assert_eq!(downloads[0].pattern, "**/Downloads/*.dmg");
        assert_eq!(rules_by_category(JunkCategory::Other).count(), 0);
    }
}
