//! POSIX path parsing rules: `/` is the only separator, the root is `/` or
//! nothing.

const SEP: u8 = b'/';
const DOT: u8 = b'.';

pub(crate) fn is_sep(c: u8) -> bool {
    c == SEP
}

/// The root of a POSIX path is `/` iff the path starts with `/`, else empty.
pub fn root(p: &[u8]) -> &[u8] {
    if p.first() == Some(&SEP) {
        &p[..1]
    } else {
        &p[..0]
    }
}

pub fn filename(p: &[u8]) -> &[u8] {
    match p.iter().rposition(|&c| is_sep(c)) {
        Some(idx) => &p[idx + 1..],
        None => p,
    }
}

pub fn parent_path_segment(p: &[u8]) -> &[u8] {
    match p.iter().rposition(|&c| is_sep(c)) {
        Some(0) => &p[..1],
        Some(idx) => &p[..idx],
        None => &p[..0],
    }
}

pub fn file_extension(p: &[u8]) -> &[u8] {
    let name = filename(p);
    if name.is_empty() || name == b"." || name == b".." {
        return &p[..0];
    }
    match name.iter().rposition(|&c| c == DOT) {
        Some(0) => name,
        Some(idx) => &name[idx..],
        None => &name[..0],
    }
}

pub fn segments(p: &[u8]) -> Vec<&[u8]> {
    let mut out = Vec::new();
    let r = root(p);
    let rest = &p[r.len()..];
    if !r.is_empty() {
        out.push(r);
    }
    for segment in rest.split(|&c| is_sep(c)) {
        if !segment.is_empty() {
            out.push(segment);
        }
    }
    out
}

pub fn is_dot(p: &[u8]) -> bool {
    filename(p) == b"."
}

pub fn is_dot_dot(p: &[u8]) -> bool {
    filename(p) == b".."
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(b"", b"")]
    #[case(b"/", b"/")]
    #[case(b"/foo", b"/")]
    #[case(b"foo", b"")]
    #[case(b"foo/bar", b"")]
    fn root_cases(#[case] input: &[u8], #[case] expected: &[u8]) {
        assert_eq!(root(input), expected);
    }

    #[rstest]
    #[case(b"/foo/bar", b"bar")]
    #[case(b"/foo/bar/", b"")]
    #[case(b"/", b"")]
    #[case(b".", b".")]
    #[case(b"..", b"..")]
    #[case(b"foo", b"foo")]
    fn filename_cases(#[case] input: &[u8], #[case] expected: &[u8]) {
        assert_eq!(filename(input), expected);
    }

    #[rstest]
    #[case(b"/foo/bar", b"/foo")]
    #[case(b"/foo", b"/")]
    #[case(b"/", b"/")]
    #[case(b"foo", b"")]
    #[case(b"foo/bar", b"foo")]
    fn parent_path_segment_cases(#[case] input: &[u8], #[case] expected: &[u8]) {
        assert_eq!(parent_path_segment(input), expected);
    }

    #[rstest]
    #[case(b"/foo.bar", b".bar")]
    #[case(b"/foo.bar.baz", b".baz")]
    #[case(b"/.bar", b".bar")]
    #[case(b"/foo", b"")]
    #[case(b"/.", b"")]
    #[case(b"/..", b"")]
    fn file_extension_cases(#[case] input: &[u8], #[case] expected: &[u8]) {
        assert_eq!(file_extension(input), expected);
    }

    #[test]
    fn segments_include_root_first() {
        assert_eq!(
            segments(b"/foo/bar"),
            vec![b"/".as_slice(), b"foo".as_slice(), b"bar".as_slice()]
        );
        assert_eq!(segments(b"foo/bar"), vec![b"foo".as_slice(), b"bar".as_slice()]);
        assert_eq!(segments(b"/foo/"), vec![b"/".as_slice(), b"foo".as_slice()]);
    }

    #[test]
    fn is_absolute_matches_root_nonempty() {
        assert!(root(b"foo").is_empty());
        assert!(!root(b"/foo").is_empty());
    }
}
