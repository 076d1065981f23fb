//! The error type returned by every fallible operation in this crate.
//!
//! This replaces the out-parameter-plus-sentinel-return convention of the
//! original C++ implementation: the error sink *is* the `Err` variant.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Coarse classification of an [`FsError`], independent of platform.
///
/// Mirrors the taxonomy errno/`HRESULT` codes are bucketed into by every
/// caller that wants to branch on "why did this fail" rather than match on a
/// specific OS error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FsErrorKind {
    /// The source of an operation does not exist where one was required.
    NotFound,
    /// The target of an operation already exists where that is forbidden.
    AlreadyExists,
    /// A path named a directory where a non-directory was required.
    IsADirectory,
    /// A path named a non-directory where a directory was required.
    NotADirectory,
    /// The OS refused the operation based on credentials.
    AccessDenied,
    /// A directory-removing operation was refused because the directory has children.
    NotEmpty,
    /// A buffer ceiling was reached, or the input was otherwise malformed.
    InvalidArgument,
    /// Any other propagated OS failure.
    IoError,
}

impl fmt::Display for FsErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotFound => "not found",
            Self::AlreadyExists => "already exists",
            Self::IsADirectory => "is a directory",
            Self::NotADirectory => "not a directory",
            Self::AccessDenied => "access denied",
            Self::NotEmpty => "directory not empty",
            Self::InvalidArgument => "invalid argument",
            Self::IoError => "io error",
        };
        f.write_str(s)
    }
}

/// The error type returned by every fallible operation in this crate.
///
/// Carries the coarse [`FsErrorKind`], the originating [`io::Error`] when one
/// is available, and the path the operation was acting on, since almost
/// every real bug report about a filesystem crate turns on "which path
/// failed."
#[derive(Debug, thiserror::Error)]
pub struct FsError {
    pub kind: FsErrorKind,
    pub path: Option<PathBuf>,
    #[source]
    source: Option<io::Error>,
}

impl FsError {
    pub fn new(kind: FsErrorKind) -> Self {
        Self {
            kind,
            path: None,
            source: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_source(mut self, source: io::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Builds an [`FsError`] from an [`io::Error`], classifying it by
    /// [`io::Error::kind`] (and, on Unix, the raw errno when `io::ErrorKind`
    /// doesn't distinguish finely enough).
    pub fn from_io(err: io::Error, path: impl Into<PathBuf>) -> Self {
        let kind = classify_io_error(&err);
        Self {
            kind,
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// The raw OS error code, if one was captured.
    pub fn raw_os_error(&self) -> Option<i32> {
        self.source.as_ref().and_then(io::Error::raw_os_error)
    }
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.path, &self.source) {
            (Some(path), Some(source)) => {
                write!(f, "{}: {} ({})", path.display(), self.kind, source)
            }
            (Some(path), None) => write!(f, "{}: {}", path.display(), self.kind),
            (None, Some(source)) => write!(f, "{}: {}", self.kind, source),
            (None, None) => write!(f, "{}", self.kind),
        }
    }
}

fn classify_io_error(err: &io::Error) -> FsErrorKind {
    match err.kind() {
        io::ErrorKind::NotFound => FsErrorKind::NotFound,
        io::ErrorKind::AlreadyExists => FsErrorKind::AlreadyExists,
        io::ErrorKind::PermissionDenied => FsErrorKind::AccessDenied,
        io::ErrorKind::InvalidInput | io::ErrorKind::InvalidData => FsErrorKind::InvalidArgument,
        _ => classify_raw_os_error(err).unwrap_or(FsErrorKind::IoError),
    }
}

#[cfg(unix)]
fn classify_raw_os_error(err: &io::Error) -> Option<FsErrorKind> {
    match err.raw_os_error()? {
        libc::ENOTDIR => Some(FsErrorKind::NotADirectory),
        libc::EISDIR => Some(FsErrorKind::IsADirectory),
        libc::ENOTEMPTY => Some(FsErrorKind::NotEmpty),
        _ => None,
    }
}

#[cfg(windows)]
fn classify_raw_os_error(err: &io::Error) -> Option<FsErrorKind> {
    // ERROR_DIR_NOT_EMPTY
    const ERROR_DIR_NOT_EMPTY: i32 = 145;
    // ERROR_DIRECTORY: "The directory name is invalid" is also used by Windows to
    // report "this is not a directory" in several APIs.
    const ERROR_DIRECTORY: i32 = 267;
    match err.raw_os_error()? {
        ERROR_DIR_NOT_EMPTY => Some(FsErrorKind::NotEmpty),
        ERROR_DIRECTORY => Some(FsErrorKind::NotADirectory),
        _ => None,
    }
}

#[cfg(not(any(unix, windows)))]
fn classify_raw_os_error(_err: &io::Error) -> Option<FsErrorKind> {
    None
}

pub type Result<T> = std::result::Result<T, FsError>;
