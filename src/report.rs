//! Text rendering of scan results.

use std::time::SystemTime;

use chrono::{DateTime, Local};

use reclaim_analyze::{LargeFileStats, format_age, group_by_category};
use reclaim_core::{DuplicateGroup, JunkFileRecord, LargeFileRecord, ScanResult, total_wasted};

const RULE_WIDTH: usize = 70;

fn header(title: &str) {
    println!();
    println!("{}", "─".repeat(RULE_WIDTH));
    println!(" {title}");
    println!("{}", "─".repeat(RULE_WIDTH));
    println!();
}

/// Overall scan summary.
pub fn print_summary(result: &ScanResult) {
    let scanned_at: DateTime<Local> = result.scanned_at.into();

    header("Scan Summary");
    for root in &result.roots {
        println!(" {}", root.display());
    }
    println!(
        " {} files in {} directories, {} total",
        result.files_scanned,
        result.dirs_scanned,
        format_size(result.total_size)
    );
    println!(
        " Scanned in {:.2}s at {}",
        result.scan_duration.as_secs_f64(),
        scanned_at.format("%Y-%m-%d %H:%M")
    );
    if result.unreadable_paths > 0 {
        println!(" {} path(s) could not be read", result.unreadable_paths);
    }
}

/// Duplicate groups, largest waste first.
pub fn print_duplicates(groups: &[DuplicateGroup], top_n: usize) {
    header("Duplicate Files");

    if groups.is_empty() {
        println!(" No duplicate files found.");
        return;
    }

    let files: usize = groups.iter().map(DuplicateGroup::count).sum();
    println!(" Found {} duplicate groups ({} files)", groups.len(), files);
    println!(" Total wasted space: {}", format_size(total_wasted(groups)));
    println!();

    let mut ranked: Vec<_> = groups.iter().collect();
    ranked.sort_by(|a, b| b.wasted_bytes().cmp(&a.wasted_bytes()));

    for (i, group) in ranked.iter().take(top_n).enumerate() {
        println!(
            " Group {} ({} files, {} each, {} wasted)",
            i + 1,
            group.count(),
            format_size(group.size),
            format_size(group.wasted_bytes())
        );
        for (j, file) in group.files.iter().enumerate() {
            let marker = if j == 0 { "keep" } else { "    " };
            println!("   {marker} {}", file.path.display());
        }
        println!();
    }
    more(ranked.len(), top_n);
}

/// Junk files grouped by category.
pub fn print_junk(junk: &[JunkFileRecord], top_n: usize) {
    header("Junk Files");

    if junk.is_empty() {
        println!(" No junk files found.");
        return;
    }

    let total: u64 = junk.iter().map(|j| j.file.size).sum();
    println!(" Found {} junk files ({})", junk.len(), format_size(total));
    println!();

    for (category, summary) in group_by_category(junk) {
        println!(
            " {:<10} {:>8} files {:>12}",
            category.to_string(),
            summary.files.len(),
            format_size(summary.total_size)
        );
    }
    println!();

    for record in junk.iter().take(top_n) {
        println!(
            "   [{:>2}] {:<40} {:>10}  {}",
            record.weight,
            truncate(&record.file.path.display().to_string(), 40),
            format_size(record.file.size),
            record.description
        );
    }
    more(junk.len(), top_n);
}

/// Large files with age advice.
pub fn print_large(large: &[LargeFileRecord], top_n: usize) {
    header("Large Files");

    if large.is_empty() {
        println!(" No large files found.");
        return;
    }

    let stats = LargeFileStats::from_records(large);
    println!(
        " Found {} large files ({})",
        stats.count,
        format_size(stats.total_size)
    );
    println!(
        " {} not accessed in 90+ days ({}), {} in 180+ days ({})",
        stats.old_count,
        format_size(stats.old_size),
        stats.very_old_count,
        format_size(stats.very_old_size)
    );
    println!();

    let now = SystemTime::now();
    for record in large.iter().take(top_n) {
        let age = now.duration_since(record.last_accessed).unwrap_or_default();
        println!(
            "   {:<40} {:>10}  {:>12} ago  {}",
            truncate(&record.file.path.display().to_string(), 40),
            format_size(record.file.size),
            format_age(age),
            record.suggestion.message().unwrap_or("")
        );
    }
    more(large.len(), top_n);
}

fn more(total: usize, shown: usize) {
    let remaining = total.saturating_sub(shown);
    if remaining > 0 {
        println!("   ... and {remaining} more");
    }
}

/// Format size in human-readable form.
pub fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Truncate a string to at most `max_len` characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let tail: String = s
            .chars()
            .rev()
            .take(max_len.saturating_sub(1))
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("…{tail}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_keeps_the_tail() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("/very/long/path/file.txt", 9), "…file.txt");
    }
}
