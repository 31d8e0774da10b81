//! Skip policy applied to directory entries before they are stat'ed.

/// Entry names that are never descended into or reported.
///
/// System trash and index folders, version-control metadata and package
/// manager caches.
pub const SKIP_NAMES: &[&str] = &[
    ".Trash",
    ".Spotlight-V100",
    ".fseventsd",
    ".DocumentRevisions-V100",
    ".TemporaryItems",
    ".DS_Store",
    "node_modules",
    ".git",
    ".svn",
    ".hg",
    ".npm",
    ".yarn",
];

/// Deep subtrees that are protected by the OS and fail with permission
/// errors when read. Matched anywhere in the full path.
pub const PROTECTED_SUBTREES: &[&str] = &[
    "/Library/Application Support/MobileSync",
    "/Library/Containers",
    "/Library/Group Containers",
];

/// Check if an entry should be skipped without touching the filesystem.
pub fn should_skip(name: &str, full_path: &str) -> bool {
    SKIP_NAMES.contains(&name)
        || PROTECTED_SUBTREES
            .iter()
            .any(|subtree| full_path.contains(subtree))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_by_name() {
        assert!(should_skip("node_modules", "/work/app/node_modules"));
        assert!(should_skip(".git", "/work/app/.git"));
        assert!(!should_skip("src", "/work/app/src"));
        // Only exact names are skipped.
        assert!(!should_skip("my_node_modules", "/work/my_node_modules"));
    }

    #[test]
    fn test_skip_protected_subtree() {
        assert!(should_skip(
            "com.apple.mail",
            "/Users/me/Library/Containers/com.apple.mail"
        ));
        assert!(should_skip(
            "Backup",
            "/Users/me/Library/Application Support/MobileSync/Backup"
        ));
        assert!(!should_skip("Caches", "/Users/me/Library/Caches"));
    }
}
