//! Home-directory layout on the Studio domain's shared file system.
//!
//! Every Studio user owns `<mount_root>/<uid>`, where `uid` is the POSIX id
//! SageMaker assigns to the profile on the domain's EFS volume.

use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_EFS_MOUNT_PATH: &str = "/mnt/efs";

const GIT_SUFFIX: &str = ".git";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StorageIdentity(u32);

impl StorageIdentity {
    pub fn new(uid: u32) -> Self {
        Self(uid)
    }

    pub fn uid(self) -> u32 {
        self.0
    }

    /// Parses the decimal uid string returned by the user-profile registry.
    pub fn parse(raw: &str) -> Result<Self, String> {
        raw.trim()
            .parse::<u32>()
            .map(Self)
            .map_err(|error| format!("invalid home storage uid '{raw}': {error}"))
    }
}

impl fmt::Display for StorageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub fn home_directory(mount_root: &Path, identity: StorageIdentity) -> PathBuf {
    mount_root.join(identity.to_string())
}

pub fn user_physical_id(identity: StorageIdentity) -> String {
    format!("user_{identity}")
}

/// Name of the folder a clone of `repository_url` lands in.
///
/// Takes the last path segment (HTTPS or scp-style URLs) and strips a
/// trailing `.git`, ignoring case.
pub fn repository_directory_name(repository_url: &str) -> Option<String> {
    let trimmed = repository_url.trim().trim_end_matches('/');
    let segment = trimmed
        .rsplit(['/', ':'])
        .next()
        .unwrap_or(trimmed);

    let name = if segment.len() >= GIT_SUFFIX.len()
        && segment.is_char_boundary(segment.len() - GIT_SUFFIX.len())
        && segment[segment.len() - GIT_SUFFIX.len()..].eq_ignore_ascii_case(GIT_SUFFIX)
    {
        &segment[..segment.len() - GIT_SUFFIX.len()]
    } else {
        segment
    };

    match name {
        "" | "." | ".." => None,
        value => Some(value.to_string()),
    }
}
