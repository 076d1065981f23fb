//! Filesystem metadata queries: existence, stat-class information,
//! canonicalization, symlink targets, and the handful of per-process path
//! lookups (cwd, executable path, preference/temporary directories).
//!
//! Every syscall this module issues is named in the crate's syscall floor
//! (statx/realpath/readlink on POSIX; `GetFileInformationByHandleEx` et al.
//! on Windows) — there is no `std::fs` underneath, by the same "no library
//! indirection" rule the iterator and watcher follow.

#[cfg(target_os = "linux")]
mod posix;
#[cfg(windows)]
mod windows;

#[cfg(target_os = "linux")]
use posix as native;
#[cfg(windows)]
use windows as native;

use std::time::SystemTime;

use crate::error::Result;
use crate::path::{FsPath, FsPathBuf};

/// The type of a filesystem entry, as reported by a directory entry or a
/// stat-class call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    File,
    Directory,
    Symlink,
    Pipe,
    CharacterDevice,
    BlockDevice,
    Socket,
    Unknown,
}

bitflags::bitflags! {
    /// Selects which fields [`get_filesystem_info`] actually populates.
    /// Fields outside the mask are left at their `Default` (`None`), not
    /// "undefined" — there is no uninitialized-memory hazard here the way
    /// there is for the original's C union.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct QueryFlags: u32 {
        const TYPE         = 0b0000_0001;
        const PERMISSIONS  = 0b0000_0010;
        const ID           = 0b0000_0100;
        const FILE_TIMES   = 0b0000_1000;
        const SIZE         = 0b0001_0000;
        const ALL = Self::TYPE.bits() | Self::PERMISSIONS.bits() | Self::ID.bits()
            | Self::FILE_TIMES.bits() | Self::SIZE.bits();
    }
}

/// The `(inode, device-major, device-minor)` identity of a filesystem
/// entry, used by [`are_equivalent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FileId {
    pub inode: u64,
    pub device_major: u32,
    pub device_minor: u32,
}

/// The fields [`get_filesystem_info`] can populate, gated by a
/// [`QueryFlags`] mask.
#[derive(Debug, Clone, Default)]
pub struct FilesystemInfo {
    pub file_type: Option<FileType>,
    pub permissions: Option<u32>,
    pub id: Option<FileId>,
    pub size: Option<u64>,
    pub accessed: Option<SystemTime>,
    pub modified: Option<SystemTime>,
    pub created: Option<SystemTime>,
}

/// True iff `p` exists. `follow_symlinks` controls whether a dangling
/// symlink counts as existing (false) or not (true is the target's
/// existence).
///
/// ENOENT is not an error here — it is folded into `Ok(false)`. Any other
/// failure (permission denied, a non-directory component, ...) surfaces as
/// `Err`.
pub fn exists(p: &FsPath, follow_symlinks: bool) -> Result<bool> {
    native::exists(p, follow_symlinks)
}

/// Queries the fields selected by `mask`, following symlinks.
pub fn get_filesystem_info(p: &FsPath, mask: QueryFlags) -> Result<FilesystemInfo> {
    native::get_filesystem_info(p, mask)
}

/// The type of `p` itself, without following a trailing symlink. Used by
/// [`crate::mutation::remove`], which must dispatch on the link rather than
/// its target.
pub fn get_filesystem_type_no_follow(p: &FsPath) -> Result<FileType> {
    native::get_filesystem_type_no_follow(p)
}

pub fn get_filesystem_type(p: &FsPath) -> Result<FileType> {
    get_filesystem_info(p, QueryFlags::TYPE)?
        .file_type
        .ok_or_else(|| crate::error::FsError::new(crate::error::FsErrorKind::IoError).with_path(to_path_buf(p)))
}

pub fn get_permissions(p: &FsPath) -> Result<u32> {
    get_filesystem_info(p, QueryFlags::PERMISSIONS)?
        .permissions
        .ok_or_else(|| crate::error::FsError::new(crate::error::FsErrorKind::IoError).with_path(to_path_buf(p)))
}

pub fn get_size(p: &FsPath) -> Result<u64> {
    get_filesystem_info(p, QueryFlags::SIZE)?
        .size
        .ok_or_else(|| crate::error::FsError::new(crate::error::FsErrorKind::IoError).with_path(to_path_buf(p)))
}

/// True iff `a` and `b` name the same filesystem entry. Identical paths
/// (byte-for-byte, post construction) short-circuit without a syscall.
pub fn are_equivalent(a: &FsPath, b: &FsPath) -> Result<bool> {
    if a == b {
        return Ok(true);
    }
    let id_a = get_filesystem_info(a, QueryFlags::ID)?.id;
    let id_b = get_filesystem_info(b, QueryFlags::ID)?.id;
    Ok(matches!((id_a, id_b), (Some(x), Some(y)) if x == y))
}

/// Resolves symlinks, relative references, and adjacent separators.
/// Fails if any component does not exist. The result is absolute.
pub fn canonical_path(p: &FsPath) -> Result<FsPathBuf> {
    native::canonical_path(p)
}

/// Absolutizes and normalizes `p`, canonicalizes the longest existing
/// prefix, and appends the (merely normalized) remaining tail. Never fails
/// on a non-existent tail.
pub fn weakly_canonical_path(p: &FsPath) -> Result<FsPathBuf> {
    let cwd = get_cwd()?;
    let mut absolute = cwd;
    crate::path::append(&mut absolute, p);
    let normalized = crate::path::normalize(absolute.as_path());

    let (existing_prefix, tail) = longest_existing_path(normalized.as_path());
    if existing_prefix.is_empty() {
        return Ok(normalized);
    }
    let mut out = canonical_path(existing_prefix.as_path())?;
    if !tail.is_empty() {
        crate::path::append(&mut out, tail.as_path());
    }
    Ok(out)
}

/// Splits `p` (assumed normalized and absolute) into the longest prefix
/// that exists on disk and the remaining tail.
fn longest_existing_path(p: &FsPath) -> (FsPathBuf, FsPathBuf) {
    let segs = crate::path::segments(p);
    let mut prefix = FsPathBuf::new();
    let mut last_existing = FsPathBuf::new();
    let mut consumed = 0;
    for seg in &segs {
        crate::path::append(&mut prefix, seg);
        match exists(prefix.as_path(), true) {
            Ok(true) => {
                last_existing = prefix.clone();
                consumed += 1;
            }
            _ => break,
        }
    }
    let tail_segs = &segs[consumed.min(segs.len())..];
    let mut tail = FsPathBuf::new();
    for seg in tail_segs {
        crate::path::append(&mut tail, seg);
    }
    (last_existing, tail)
}

fn to_path_buf(p: &FsPath) -> std::path::PathBuf {
    FsPathBuf::from(p).into()
}

/// Reads the destination of the symlink at `p`.
pub fn get_symlink_target(p: &FsPath) -> Result<FsPathBuf> {
    native::get_symlink_target(p)
}

/// The process's current working directory.
///
/// Shared across the whole process: changing it with [`set_cwd`] affects
/// every thread, not just the caller.
pub fn get_cwd() -> Result<FsPathBuf> {
    native::get_cwd()
}

/// Sets the process's current working directory. See [`get_cwd`] for the
/// process-global caveat.
pub fn set_cwd(p: &FsPath) -> Result<()> {
    native::set_cwd(p)
}

/// The path to the running executable.
pub fn executable_path() -> Result<FsPathBuf> {
    native::executable_path()
}

/// A per-user, per-application directory suitable for persisted
/// preferences, creating the `org/app` subdirectory tree if it doesn't
/// already exist.
pub fn preference_path(org: &str, app: &str) -> Result<FsPathBuf> {
    native::preference_path(org, app)
}

/// A directory suitable for temporary files.
pub fn temporary_path() -> Result<FsPathBuf> {
    native::temporary_path()
}
