//! Filesystem mutations: creating, copying, linking, moving, and removing
//! files and directories.
//!
//! Single-entry primitives (`touch`, `copy_file`, `create_directory`,
//! `create_hard_link`, `create_symlink`, `move_path`, `remove_file`,
//! `remove_empty_directory`) are thin wrappers over the platform syscall
//! named in each doc comment. The directory-recursive operations
//! (`copy_directory`, `create_directories`, `remove_directory`, `remove`)
//! are expressed here once, on top of those primitives and [`crate::iter`],
//! so the recursion logic isn't duplicated per platform.

#[cfg(target_os = "linux")]
mod posix;
#[cfg(windows)]
mod windows;

#[cfg(target_os = "linux")]
use posix as native;
#[cfg(windows)]
use windows as native;

use tracing::instrument;

use crate::error::{FsError, FsErrorKind, Result};
use crate::iter::{IterateOptions, RecursiveDirIterator};
use crate::path::{FsPath, FsPathBuf};
use crate::query::{self, FileType};

/// What happened when [`create_directory`] was asked to create a directory
/// that turned out to already exist.
///
/// The original returns `true` but also records an `AlreadyExists`-class
/// error alongside it — a duality that only makes sense when the return
/// value and the error channel are separate. With one `Result` channel,
/// that duality becomes this variant instead of a bare `bool`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CreateDirectoryOutcome {
    Created,
    AlreadyExisted,
}

/// Behavior when [`copy_file`]'s destination already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CopyFileOption {
    /// Fail if the destination exists.
    FailIfExists,
    /// Always overwrite the destination. The default.
    #[default]
    OverwriteExisting,
    /// Overwrite only if the source is newer than the destination;
    /// otherwise succeed without copying.
    UpdateExisting,
    /// Succeed without copying if the destination exists.
    SkipExisting,
}

fn to_path_buf(p: &FsPath) -> std::path::PathBuf {
    FsPathBuf::from(p).into()
}

/// Opens-or-creates `p` with `perms`, then updates its access and
/// modification times to now.
pub fn touch(p: &FsPath, perms: u32) -> Result<()> {
    native::touch(p, perms)
}

/// Copies a single file. See [`CopyFileOption`] for destination-exists
/// behavior. Uses a zero-copy `sendfile` on POSIX when available, falling
/// back to a buffered copy loop.
pub fn copy_file(from: &FsPath, to: &FsPath, option: CopyFileOption) -> Result<()> {
    native::copy_file(from, to, option)
}

/// Recursively copies a directory tree. `max_depth`, if set, stops
/// descending once that many levels have been entered.
#[instrument(skip(option), level = "trace")]
pub fn copy_directory(
    from: &FsPath,
    to: &FsPath,
    max_depth: Option<usize>,
    option: CopyFileOption,
) -> Result<()> {
    let from_info = query::get_filesystem_info(from, query::QueryFlags::TYPE | query::QueryFlags::PERMISSIONS)?;
    if from_info.file_type != Some(FileType::Directory) {
        return Err(FsError::new(FsErrorKind::NotADirectory).with_path(to_path_buf(from)));
    }
    create_directory(to, from_info.permissions.unwrap_or(0o755))?;

    let options = IterateOptions::FULL_PATHS | IterateOptions::STOP_ON_ERROR;
    let walker = RecursiveDirIterator::new(from, options, max_depth)?;
    for entry in walker {
        let entry = entry?;
        let relative = match crate::path::relative_path(from, entry.path.as_path()) {
            crate::path::RelativePathResult::Relative(r) => r,
            crate::path::RelativePathResult::Unrelated => continue,
        };
        let mut dest = FsPathBuf::from(to);
        crate::path::append(&mut dest, relative.as_path());
        match entry.file_type {
            Some(FileType::Directory) => {
                let perms = query::get_permissions(entry.path.as_path()).unwrap_or(0o755);
                create_directory(dest.as_path(), perms)?;
            }
            _ => {
                copy_file(entry.path.as_path(), dest.as_path(), option)?;
            }
        }
    }
    Ok(())
}

/// Dispatches to [`copy_file`] or [`copy_directory`] by `from`'s type.
pub fn copy(from: &FsPath, to: &FsPath, max_depth: Option<usize>, option: CopyFileOption) -> Result<()> {
    match query::get_filesystem_type(from)? {
        FileType::Directory => copy_directory(from, to, max_depth, option),
        _ => copy_file(from, to, option),
    }
}

/// Creates exactly one directory (the parent must already exist).
pub fn create_directory(p: &FsPath, perms: u32) -> Result<CreateDirectoryOutcome> {
    native::create_directory(p, perms)
}

/// Creates every missing directory in `p`'s path, in order, starting from
/// the longest existing prefix.
pub fn create_directories(p: &FsPath, perms: u32) -> Result<()> {
    let segments = crate::path::segments(p);
    let mut built = FsPathBuf::new();
    for seg in segments {
        crate::path::append(&mut built, seg);
        create_directory(built.as_path(), perms)?;
    }
    Ok(())
}

/// Creates a hard link at `link` pointing to `target`.
pub fn create_hard_link(target: &FsPath, link: &FsPath) -> Result<()> {
    native::create_hard_link(target, link)
}

/// Creates a symbolic link at `link` pointing to `target`.
pub fn create_symlink(target: &FsPath, link: &FsPath) -> Result<()> {
    native::create_symlink(target, link)
}

/// Moves/renames `from` to `to`. Named `move_path`, not `move`, since
/// `move` is a reserved word.
pub fn move_path(from: &FsPath, to: &FsPath) -> Result<()> {
    native::move_path(from, to)
}

/// Removes a single file (or symlink, without following it).
pub fn remove_file(p: &FsPath) -> Result<()> {
    native::remove_file(p)
}

/// Removes a directory that must already be empty.
pub fn remove_empty_directory(p: &FsPath) -> Result<()> {
    native::remove_empty_directory(p)
}

/// Recursively removes a directory and everything in it, children first.
#[instrument(level = "trace")]
pub fn remove_directory(p: &FsPath) -> Result<()> {
    let options = IterateOptions::FULL_PATHS | IterateOptions::STOP_ON_ERROR | IterateOptions::CHILDREN_FIRST;
    let walker = RecursiveDirIterator::new(p, options, None)?;
    for entry in walker {
        let entry = entry?;
        match entry.file_type {
            Some(FileType::Directory) => remove_empty_directory(entry.path.as_path())?,
            _ => remove_file(entry.path.as_path())?,
        }
    }
    remove_empty_directory(p)
}

/// Removes `p`, dispatching by type. A missing `p` is success, not an
/// error.
#[instrument(level = "trace")]
pub fn remove(p: &FsPath) -> Result<()> {
    match query::get_filesystem_type_no_follow(p) {
        Ok(FileType::Directory) => remove_directory(p),
        Ok(_) => remove_file(p),
        Err(e) if e.kind == FsErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
