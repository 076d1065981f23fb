//! [`FsPathBuf`]: an owning, growable path buffer over native [`PathChar`]s.

use std::borrow::Borrow;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use super::{FsPath, PathChar};

/// An owning path buffer, analogous to [`std::path::PathBuf`] but over the
/// crate's own [`FsPath`] slice type rather than `OsStr`.
///
/// Keeping this as a thin `Vec<PathChar>` wrapper (rather than reaching for
/// `std::path::PathBuf` directly) is what lets [`crate::path::posix`] and
/// [`crate::path::windows`] be exercised identically regardless of the host
/// the tests run on: `PathBuf`'s own parsing is pinned to the host platform.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FsPathBuf {
    inner: Vec<PathChar>,
}

impl FsPathBuf {
    pub fn new() -> Self {
        Self { inner: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Vec::with_capacity(capacity),
        }
    }

    pub fn as_path(&self) -> &FsPath {
        &self.inner
    }

    pub fn into_vec(self) -> Vec<PathChar> {
        self.inner
    }

    pub(crate) fn from_vec(inner: Vec<PathChar>) -> Self {
        Self { inner }
    }
}

impl Deref for FsPathBuf {
    type Target = FsPath;

    fn deref(&self) -> &FsPath {
        &self.inner
    }
}

impl DerefMut for FsPathBuf {
    fn deref_mut(&mut self) -> &mut FsPath {
        &mut self.inner
    }
}

impl Borrow<FsPath> for FsPathBuf {
    fn borrow(&self) -> &FsPath {
        &self.inner
    }
}

impl AsRef<FsPath> for FsPathBuf {
    fn as_ref(&self) -> &FsPath {
        &self.inner
    }
}

impl From<&FsPath> for FsPathBuf {
    fn from(p: &FsPath) -> Self {
        Self { inner: p.to_vec() }
    }
}

impl From<Vec<PathChar>> for FsPathBuf {
    fn from(inner: Vec<PathChar>) -> Self {
        Self { inner }
    }
}

impl fmt::Debug for FsPathBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&path_buf_from_native(&self.inner), f)
    }
}

#[cfg(unix)]
fn path_buf_from_native(chars: &[PathChar]) -> PathBuf {
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(OsStr::from_bytes(chars))
}

#[cfg(windows)]
fn path_buf_from_native(chars: &[PathChar]) -> PathBuf {
    use std::os::windows::ffi::OsStringExt;
    PathBuf::from(OsString::from_wide(chars))
}

#[cfg(unix)]
impl From<&OsStr> for FsPathBuf {
    fn from(s: &OsStr) -> Self {
        use std::os::unix::ffi::OsStrExt;
        Self {
            inner: s.as_bytes().to_vec(),
        }
    }
}

#[cfg(windows)]
impl From<&OsStr> for FsPathBuf {
    fn from(s: &OsStr) -> Self {
        use std::os::windows::ffi::OsStrExt;
        Self {
            inner: s.encode_wide().collect(),
        }
    }
}

impl From<OsString> for FsPathBuf {
    fn from(s: OsString) -> Self {
        FsPathBuf::from(s.as_os_str())
    }
}

impl From<&Path> for FsPathBuf {
    fn from(p: &Path) -> Self {
        FsPathBuf::from(p.as_os_str())
    }
}

impl From<PathBuf> for FsPathBuf {
    fn from(p: PathBuf) -> Self {
        FsPathBuf::from(p.as_os_str())
    }
}

impl From<&str> for FsPathBuf {
    fn from(s: &str) -> Self {
        FsPathBuf::from(OsStr::new(s))
    }
}

impl From<&FsPathBuf> for PathBuf {
    fn from(p: &FsPathBuf) -> Self {
        path_buf_from_native(&p.inner)
    }
}

impl From<FsPathBuf> for PathBuf {
    fn from(p: FsPathBuf) -> Self {
        path_buf_from_native(&p.inner)
    }
}

impl fmt::Display for FsPathBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", path_buf_from_native(&self.inner).display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_path_buf() {
        let original = PathBuf::from("some/sample/path");
        let fs_path = FsPathBuf::from(original.clone());
        let back: PathBuf = fs_path.into();
        assert_eq!(original, back);
    }

    #[test]
    fn deref_exposes_fs_path_operations() {
        let p = FsPathBuf::from("foo/bar");
        assert_eq!(super::super::filename(&p), super::super::filename(p.as_path()));
    }
}
