//! Analysis findings: duplicate groups, junk files and large files.

use std::borrow::Cow;
use std::path::PathBuf;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::record::{ContentHash, FileRecord};

/// One member of a duplicate group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateMember {
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
}

impl From<&FileRecord> for DuplicateMember {
    fn from(record: &FileRecord) -> Self {
        Self {
            path: record.path.clone(),
            size: record.size,
            modified: record.timestamps.modified,
        }
    }
}

/// A set of files proven byte-identical by full content hashing.
///
/// Always holds at least two members, ordered oldest modification first. The
/// first member is treated as the original.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Content hash shared by all files in this group.
    pub hash: ContentHash,

    /// Size of each file in bytes.
    pub size: u64,

    /// Members, sorted ascending by modification time.
    pub files: Vec<DuplicateMember>,
}

impl DuplicateGroup {
    /// Get the number of duplicate files.
    pub fn count(&self) -> usize {
        self.files.len()
    }

    /// The presumed original (earliest modified copy).
    pub fn original(&self) -> Option<&DuplicateMember> {
        self.files.first()
    }

    /// Every copy except the presumed original.
    pub fn redundant(&self) -> &[DuplicateMember] {
        self.files.get(1..).unwrap_or_default()
    }

    /// Wasted space: size * (count - 1).
    pub fn wasted_bytes(&self) -> u64 {
        self.size * self.files.len().saturating_sub(1) as u64
    }
}

/// Total reclaimable space across duplicate groups.
pub fn total_wasted(groups: &[DuplicateGroup]) -> u64 {
    groups.iter().map(DuplicateGroup::wasted_bytes).sum()
}

/// Kind of disposable file a junk rule describes.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum JunkCategory {
    Cache,
    Logs,
    Temp,
    Dev,
    Downloads,
    Other,
}

/// A declarative junk classification rule.
///
/// The pattern is a glob when it contains a wildcard character, otherwise it
/// is matched as a plain substring of the path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JunkRule {
    pub pattern: Cow<'static, str>,
    pub category: JunkCategory,
    pub description: Cow<'static, str>,
    /// Higher weight means the file is a stronger deletion candidate.
    pub weight: i32,
}

impl JunkRule {
    /// Characters that turn a pattern into a glob.
    pub const WILDCARDS: [char; 4] = ['*', '?', '[', '{'];

    /// Declare a rule from static strings.
    pub const fn new(
        pattern: &'static str,
        category: JunkCategory,
        description: &'static str,
        weight: i32,
    ) -> Self {
        Self {
            pattern: Cow::Borrowed(pattern),
            category,
            description: Cow::Borrowed(description),
            weight,
        }
    }

    /// Whether the pattern uses glob syntax.
    pub fn is_glob(&self) -> bool {
        self.pattern.contains(Self::WILDCARDS)
    }
}

/// A file classified as junk by the first matching rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JunkFileRecord {
    #[serde(flatten)]
    pub file: FileRecord,
    pub category: JunkCategory,
    pub description: Cow<'static, str>,
    pub weight: i32,
}

impl JunkFileRecord {
    /// Attach a rule's classification to a file record.
    pub fn new(file: &FileRecord, rule: &JunkRule) -> Self {
        Self {
            file: file.clone(),
            category: rule.category,
            description: rule.description.clone(),
            weight: rule.weight,
        }
    }
}

/// Age-based advice for a large file.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Suggestion {
    #[default]
    None,
    /// Not accessed for at least 90 days.
    Stale,
    /// Not accessed for at least 180 days.
    VeryStale,
}

impl Suggestion {
    /// Days without access before a file counts as stale.
    pub const STALE_DAYS: u64 = 90;
    /// Days without access before a file counts as very stale.
    pub const VERY_STALE_DAYS: u64 = 180;

    /// Classify an age in whole days.
    pub fn for_age(age_in_days: u64) -> Self {
        if age_in_days >= Self::VERY_STALE_DAYS {
            Self::VeryStale
        } else if age_in_days >= Self::STALE_DAYS {
            Self::Stale
        } else {
            Self::None
        }
    }

    /// Human-readable advice, if any.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Stale => Some("Not accessed recently"),
            Self::VeryStale => Some("Very old - consider deleting"),
        }
    }
}

/// A file at or above the large-file threshold, with age information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LargeFileRecord {
    #[serde(flatten)]
    pub file: FileRecord,
    /// Access time, or modification time when access time is unavailable.
    pub last_accessed: SystemTime,
    /// Whole days since `last_accessed`.
    pub age_in_days: u64,
    pub suggestion: Suggestion,
}
