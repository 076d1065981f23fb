//! Cross-platform path handling, directory traversal, and filesystem change
//! watching, built directly on platform syscalls rather than a higher-level
//! abstraction.
//!
//! The crate is organized around the same three subsystems on every
//! platform:
//!
//! - [`path`] — an owning path buffer, pure parsing functions, and
//!   composition/normalization operators that agree with POSIX or Windows
//!   rules depending on target.
//! - [`iter`] — non-recursive and recursive directory iterators.
//! - [`watcher`] — an event-driven filesystem watcher.
//!
//! [`query`] and [`mutation`] provide the filesystem operations (stat, copy,
//! remove, ...) that the iterator and watcher are built on top of.

pub mod env;
pub mod error;
pub mod iter;
mod limits;
pub mod mutation;
pub mod path;
pub mod query;
pub mod watcher;

pub use error::{FsError, FsErrorKind};
pub use iter::{DirEntry, DirIterator, IterateOptions, RecursiveDirIterator};
pub use path::{FsPath, FsPathBuf};
pub use watcher::{EventKind, Watcher};
