//! Track path checks made before anything is pushed to the engine

use onair_core::{Error, Result};
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

const READ: u32 = 0o4;
const SEARCH: u32 = 0o1;

/// The account whose permissions decide whether the engine can read a track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    name: String,
    uid: u32,
    gids: Vec<u32>,
}

impl Identity {
    /// The configured engine user, or whoever runs this process
    pub fn resolve(user: Option<&str>) -> Result<Self> {
        match user {
            Some(name) => Self::named(name),
            None => Ok(Self::current()),
        }
    }

    pub fn named(name: &str) -> Result<Self> {
        let user = users::get_user_by_name(name)
            .ok_or_else(|| Error::validation("engine user", name, "no such user"))?;
        Ok(Self::from_user(&user))
    }

    pub fn current() -> Self {
        let uid = users::get_current_uid();
        match users::get_user_by_uid(uid) {
            Some(user) => Self::from_user(&user),
            None => Self {
                name: uid.to_string(),
                uid,
                gids: vec![users::get_current_gid()],
            },
        }
    }

    fn from_user(user: &users::User) -> Self {
        let primary = user.primary_group_id();
        let mut gids: Vec<u32> = users::get_user_groups(user.name(), primary)
            .unwrap_or_default()
            .iter()
            .map(users::Group::gid)
            .collect();
        if !gids.contains(&primary) {
            gids.push(primary);
        }
        Self {
            name: user.name().to_string_lossy().into_owned(),
            uid: user.uid(),
            gids,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uid(&self) -> u32 {
        self.uid
    }

    /// Whether the owner/group/other bits grant `access` (an `rwx` triple
    /// value such as `0o4`) to this identity
    fn allows(&self, metadata: &std::fs::Metadata, access: u32) -> bool {
        if self.uid == 0 {
            return true;
        }
        let mode = metadata.mode();
        let shift = if metadata.uid() == self.uid {
            6
        } else if self.gids.contains(&metadata.gid()) {
            3
        } else {
            0
        };
        (mode >> shift) & access == access
    }
}

/// Check that `path` is absolute, a regular file, and readable by
/// `identity` through every directory on the way
pub fn validate_track(path: &Path, identity: &Identity) -> Result<PathBuf> {
    let shown = path.display().to_string();
    if !path.is_absolute() {
        return Err(Error::validation("track path", shown, "must be absolute"));
    }

    let metadata = std::fs::metadata(path)
        .map_err(|e| Error::validation("track path", shown.clone(), e.to_string()))?;
    if !metadata.is_file() {
        return Err(Error::validation("track path", shown, "not a regular file"));
    }
    if !identity.allows(&metadata, READ) {
        return Err(Error::validation(
            "track path",
            shown,
            format!("not readable by {}", identity.name()),
        ));
    }

    for dir in path.ancestors().skip(1) {
        let Ok(dir_meta) = std::fs::metadata(dir) else {
            continue;
        };
        if !identity.allows(&dir_meta, SEARCH) {
            return Err(Error::validation(
                "track path",
                shown,
                format!("{} is not searchable by {}", dir.display(), identity.name()),
            ));
        }
    }

    Ok(path.to_path_buf())
}
