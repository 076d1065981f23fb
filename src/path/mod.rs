//! Path value type, parser, and composer.
//!
//! The parser and composer are implemented twice, once per platform
//! convention ([`posix`] and [`windows`]), and both modules are compiled
//! unconditionally: they are pure functions over character slices with no
//! syscalls, so there is no reason to hide either behind `#[cfg(target_os)]`.
//! That keeps the elaborate Windows root-parsing rules (see
//! [`windows::root`]) testable on any host, the same trick used by
//! cross-platform path crates that need to validate both conventions from a
//! single CI run.
//!
//! [`FsPath`] / [`FsPathBuf`] are the *native* path types: the character
//! width and the parsing convention they use are pinned to the compilation
//! target, matching the platform the syscalls in [`crate::query`],
//! [`crate::iter`], and [`crate::watcher`] actually run on.

mod composer;
pub mod posix;
pub mod windows;

pub use composer::RelativePathResult;

/// A platform path character: an 8-bit byte on POSIX, a UTF-16 code unit on
/// Windows. Path operations are code-unit based; no encoding is assumed on
/// POSIX, and surrogate pairs are only relevant at narrow/wide conversion
/// boundaries on Windows.
#[cfg(unix)]
pub type PathChar = u8;
#[cfg(windows)]
pub type PathChar = u16;

/// A borrowed, read-only view of a platform path. Plain slice type alias:
/// see the module docs for why this crate doesn't define a custom unsized
/// wrapper type the way `std::path::Path` does.
pub type FsPath = [PathChar];

/// The platform's default separator. `/` on POSIX, `\` on Windows.
#[cfg(unix)]
pub const SEPARATOR: PathChar = b'/';
#[cfg(windows)]
pub const SEPARATOR: PathChar = b'\\' as u16;

mod value;
pub use value::FsPathBuf;

#[cfg(unix)]
pub use posix as native;
#[cfg(windows)]
pub use windows as native;

/// Returns the slice after the last separator, or the whole path if there is
/// none. A trailing separator yields an empty slice, as does a root-only
/// path.
pub fn filename(p: &FsPath) -> &FsPath {
    native::filename(p)
}

/// Returns the slice before the last separator, handling the POSIX
/// single-root case and the Windows root-preservation case described in
/// [`windows::parent_path_segment`].
pub fn parent_path_segment(p: &FsPath) -> &FsPath {
    native::parent_path_segment(p)
}

/// Returns the file extension (including the leading dot), or an empty
/// slice if `p`'s filename is empty, `.`, or `..`. A leading-dot filename
/// with no other dot (`.bashrc`) is its own extension — a deliberate
/// departure from libraries that treat dotfiles as extension-less.
pub fn file_extension(p: &FsPath) -> &FsPath {
    native::file_extension(p)
}

/// Returns the root of `p` (the volume/anchor prefix), or an empty slice if
/// `p` is relative. See [`windows::root`] for the full Windows rule table.
pub fn root(p: &FsPath) -> &FsPath {
    native::root(p)
}

/// Splits `p` into its segments: the root (if any) as the first segment,
/// then each non-empty substring between separators.
pub fn segments(p: &FsPath) -> Vec<&FsPath> {
    native::segments(p)
}

/// True iff `filename(p)` is exactly `.`.
pub fn is_dot(p: &FsPath) -> bool {
    native::is_dot(p)
}

/// True iff `filename(p)` is exactly `..`.
pub fn is_dot_dot(p: &FsPath) -> bool {
    native::is_dot_dot(p)
}

/// True iff `root(p)` is non-empty.
pub fn is_absolute(p: &FsPath) -> bool {
    !root(p).is_empty()
}

/// Appends `s` to `out` in place, following the absolute-resets-target and
/// separator-discipline rules described in [`composer::append`].
pub fn append(out: &mut FsPathBuf, s: &FsPath) {
    composer::append(out, s)
}

/// Appends `s` to `out` with no separator logic.
pub fn concat(out: &mut FsPathBuf, s: &FsPath) {
    composer::concat(out, s)
}

/// Replaces the filename component of `out` with `name`.
pub fn replace_filename(out: &mut FsPathBuf, name: &FsPath) {
    composer::replace_filename(out, name)
}

/// Computes the path that, appended to `from`, reaches `to`.
pub fn relative_path(from: &FsPath, to: &FsPath) -> RelativePathResult {
    composer::relative_path(from, to)
}

/// Normalizes `p` per the portable algorithm in [`composer::normalize`].
pub fn normalize(p: &FsPath) -> FsPathBuf {
    composer::normalize(p)
}
