//! Path composition and normalization: `append`, `concat`,
//! `replace_filename`, `relative_path`, and `normalize`, all expressed over
//! the native [`FsPath`]/[`FsPathBuf`] pair so the same code runs against
//! either parsing convention depending on target.

use super::{native, FsPath, FsPathBuf, PathChar, SEPARATOR};

const DOT: PathChar = b'.' as PathChar;

/// The result of [`relative_path`]: either a path was found, possibly `.`
/// for identical inputs, or `from`/`to` don't share a root and no relative
/// path exists between them.
///
/// A dedicated enum in place of the original's "clear the output buffer and
/// return" convention, which left "computed the empty string" and "gave up"
/// indistinguishable at the call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelativePathResult {
    Unrelated,
    Relative(FsPathBuf),
}

/// Appends `s` to `out` following the absolute-resets-target and
/// separator-discipline rules.
pub fn append(out: &mut FsPathBuf, s: &FsPath) {
    if s.is_empty() {
        return;
    }
    if out.is_empty() || !native::root(s).is_empty() {
        *out = FsPathBuf::from(s);
        return;
    }
    let out_ends_sep = out.last().copied().is_some_and(native::is_sep);
    let s_starts_sep = s.first().copied().is_some_and(native::is_sep);
    let mut buf = out.as_path().to_vec();
    match (out_ends_sep, s_starts_sep) {
        (true, true) => buf.extend_from_slice(&s[1..]),
        (false, false) => {
            buf.push(SEPARATOR);
            buf.extend_from_slice(s);
        }
        _ => buf.extend_from_slice(s),
    }
    *out = FsPathBuf::from_vec(buf);
}

/// Appends `s` to `out` with no separator logic whatsoever.
pub fn concat(out: &mut FsPathBuf, s: &FsPath) {
    let mut buf = out.as_path().to_vec();
    buf.extend_from_slice(s);
    *out = FsPathBuf::from_vec(buf);
}

/// Replaces the filename component of `out` with `name`, preserving the
/// root when the path's parent is the root itself.
pub fn replace_filename(out: &mut FsPathBuf, name: &FsPath) {
    let parent = native::parent_path_segment(out).to_vec();
    let root = native::root(out).to_vec();
    let mut buf = if parent == root {
        root
    } else if !parent.is_empty() {
        let mut v = parent;
        v.push(SEPARATOR);
        v
    } else {
        Vec::new()
    };
    buf.extend_from_slice(name);
    *out = FsPathBuf::from_vec(buf);
}

fn non_root_segments(p: &FsPath) -> Vec<&FsPath> {
    let mut segs = native::segments(p);
    if !native::root(p).is_empty() {
        segs.remove(0);
    }
    segs
}

/// Computes the path that, appended to `from`, reaches `to`.
pub fn relative_path(from: &FsPath, to: &FsPath) -> RelativePathResult {
    if native::root(from) != native::root(to) {
        return RelativePathResult::Unrelated;
    }
    let from_segs = non_root_segments(from);
    let to_segs = non_root_segments(to);
    let shared = from_segs
        .iter()
        .zip(to_segs.iter())
        .take_while(|(a, b)| **a == **b)
        .count();

    let mut n: i64 = 0;
    for seg in &from_segs[shared..] {
        if native::is_dot_dot(seg) {
            n -= 1;
        } else if !native::is_dot(seg) {
            n += 1;
        }
    }
    if n < 0 {
        return RelativePathResult::Unrelated;
    }
    let to_tail = &to_segs[shared..];
    if n == 0 && to_tail.is_empty() {
        return RelativePathResult::Relative(FsPathBuf::from_vec(vec![DOT]));
    }

    let mut buf: Vec<PathChar> = Vec::new();
    for _ in 0..n {
        if !buf.is_empty() {
            buf.push(SEPARATOR);
        }
        buf.push(DOT);
        buf.push(DOT);
    }
    for seg in to_tail {
        if !buf.is_empty() {
            buf.push(SEPARATOR);
        }
        buf.extend_from_slice(seg);
    }
    RelativePathResult::Relative(FsPathBuf::from_vec(buf))
}

/// Normalizes `p`: collapses separator runs, drops `.` segments, resolves
/// `<dir>/..` pairs, and drops a leading `..` immediately after the root.
/// The empty path stays empty; anything else that normalizes down to
/// nothing becomes `.`.
pub fn normalize(p: &FsPath) -> FsPathBuf {
    if p.is_empty() {
        return FsPathBuf::new();
    }
    let root = native::root(p).to_vec();
    let segs = non_root_segments(p);
    let mut stack: Vec<&FsPath> = Vec::new();
    for seg in &segs {
        if seg.is_empty() || native::is_dot(seg) {
            continue;
        }
        if native::is_dot_dot(seg) {
            match stack.last() {
                Some(top) if !native::is_dot_dot(top) => {
                    stack.pop();
                }
                _ => {
                    if root.is_empty() {
                        stack.push(seg);
                    }
                }
            }
        } else {
            stack.push(seg);
        }
    }

    let mut buf = root;
    for seg in &stack {
        if !buf.is_empty() && !buf.last().copied().is_some_and(native::is_sep) {
            buf.push(SEPARATOR);
        }
        buf.extend_from_slice(seg);
    }
    if buf.is_empty() {
        buf.push(DOT);
    }
    FsPathBuf::from_vec(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_empty_s_is_noop() {
        let mut out = FsPathBuf::from("foo");
        append(&mut out, &[]);
        assert_eq!(out.as_path(), FsPathBuf::from("foo").as_path());
    }

    #[test]
    fn append_joins_with_separator() {
        let mut out = FsPathBuf::from("foo");
        append(&mut out, FsPathBuf::from("bar").as_path());
        assert_eq!(out, FsPathBuf::from("foo/bar"));
    }

    #[test]
    fn append_absolute_replaces_target() {
        let mut out = FsPathBuf::from("foo");
        #[cfg(unix)]
        append(&mut out, FsPathBuf::from("/bar").as_path());
        #[cfg(windows)]
        append(&mut out, FsPathBuf::from("C:\\bar").as_path());
        #[cfg(unix)]
        assert_eq!(out, FsPathBuf::from("/bar"));
        #[cfg(windows)]
        assert_eq!(out, FsPathBuf::from("C:\\bar"));
    }

    #[test]
    fn relative_path_identity_is_dot() {
        let p = FsPathBuf::from("foo/bar");
        assert_eq!(
            relative_path(p.as_path(), p.as_path()),
            RelativePathResult::Relative(FsPathBuf::from("."))
        );
    }

    #[test]
    fn relative_path_climbs_and_descends() {
        let from = FsPathBuf::from("a/b/c");
        let to = FsPathBuf::from("a/b/d/e");
        assert_eq!(
            relative_path(from.as_path(), to.as_path()),
            RelativePathResult::Relative(FsPathBuf::from("../d/e"))
        );
    }

    #[cfg(unix)]
    #[test]
    fn relative_path_unrelated_roots() {
        // POSIX has a single root, so simulate unrelated roots with one
        // relative and one absolute path instead.
        let from = FsPathBuf::from("/a/b");
        let to = FsPathBuf::from("c/d");
        assert_eq!(relative_path(from.as_path(), to.as_path()), RelativePathResult::Unrelated);
    }

    #[test]
    fn normalize_collapses_and_resolves() {
        assert_eq!(normalize(FsPathBuf::from("").as_path()), FsPathBuf::from(""));
        assert_eq!(normalize(FsPathBuf::from("...").as_path()), FsPathBuf::from("..."));
    }

    #[cfg(unix)]
    #[test]
    fn normalize_posix_examples() {
        assert_eq!(normalize(FsPathBuf::from("/a/////b").as_path()), FsPathBuf::from("/a/b"));
        assert_eq!(normalize(FsPathBuf::from("/abc/../def").as_path()), FsPathBuf::from("/def"));
        assert_eq!(normalize(FsPathBuf::from("/..").as_path()), FsPathBuf::from("/"));
        assert_eq!(normalize(FsPathBuf::from("../..").as_path()), FsPathBuf::from("../.."));
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = normalize(FsPathBuf::from("a/./b/../c").as_path());
        let twice = normalize(once.as_path());
        assert_eq!(once, twice);
    }
}
