use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How exported session files are distributed over output subdirectories
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupingStrategy {
    /// Every session under one fixed subdirectory
    Flat,
    /// One subdirectory per OpenCode project id
    Project,
    /// One subdirectory per hashed working directory
    #[default]
    Directory,
}

impl GroupingStrategy {
    pub const ALL: [GroupingStrategy; 3] = [
        GroupingStrategy::Flat,
        GroupingStrategy::Project,
        GroupingStrategy::Directory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GroupingStrategy::Flat => "flat",
            GroupingStrategy::Project => "project",
            GroupingStrategy::Directory => "directory",
        }
    }
}

impl fmt::Display for GroupingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "flat" => Ok(GroupingStrategy::Flat),
            "project" => Ok(GroupingStrategy::Project),
            "directory" | "dir" => Ok(GroupingStrategy::Directory),
            _ => Err(format!(
                "Unknown grouping strategy: {} (expected flat, project or directory)",
                s
            )),
        }
    }
}

/// Short hex digest identifying a working directory
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirectoryHash(String);

impl DirectoryHash {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DirectoryHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for DirectoryHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
