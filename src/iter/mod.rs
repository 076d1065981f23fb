//! Lazy directory traversal: non-recursive ([`DirIterator`]) and recursive
//! ([`RecursiveDirIterator`]), both pre-order and post-order.
//!
//! Built directly on `getdents64` (Linux) and `FindFirstFileEx` (Windows)
//! rather than a directory-reading crate, per the same syscall-floor rule
//! [`crate::watcher`] follows.

#[cfg(target_os = "linux")]
mod posix;
#[cfg(windows)]
mod windows;

mod recursive;

pub use recursive::RecursiveDirIterator;

use crate::error::Result;
use crate::path::{FsPath, FsPathBuf};
use crate::query::FileType;

bitflags::bitflags! {
    /// Flags fixed at construction time and held for the lifetime of an
    /// iterator.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct IterateOptions: u32 {
        /// Yield the full path (root + name) rather than just the entry name.
        const FULL_PATHS      = 0b0000_0001;
        /// Symlinks to directories are treated as directories for descent.
        const FOLLOW_SYMLINKS = 0b0000_0010;
        /// A non-ENOENT error aborts iteration instead of being swallowed.
        const STOP_ON_ERROR   = 0b0000_0100;
        /// Post-order: a directory is yielded after its children, not before.
        const CHILDREN_FIRST  = 0b0000_1000;
        /// Force a type lookup for entries where the platform doesn't hand
        /// it over for free.
        const QUERY_TYPE      = 0b0001_0000;
    }
}

/// One entry produced by [`DirIterator`] or [`RecursiveDirIterator`].
#[derive(Debug, Clone)]
pub struct DirEntry {
    /// The entry name, or the full path, depending on
    /// [`IterateOptions::FULL_PATHS`].
    pub path: FsPathBuf,
    /// Populated unconditionally on platforms where it's free (Linux,
    /// from `d_type`), or on request ([`IterateOptions::QUERY_TYPE`])
    /// elsewhere.
    pub file_type: Option<FileType>,
    /// Nesting depth under the iterator's root. Always 0 for
    /// [`DirIterator`].
    pub depth: usize,
}

#[cfg(target_os = "linux")]
pub use posix::DirIterator;
#[cfg(windows)]
pub use windows::DirIterator;

pub(crate) fn is_dot_or_dot_dot(name: &FsPath) -> bool {
    crate::path::is_dot(name) || crate::path::is_dot_dot(name)
}
