//! Windows path parsing rules: drive letters, UNC shares, and the
//! `\\.\`/`\\?\` device and verbatim namespaces.
//!
//! Both `/` and `\` are accepted as separators while parsing, but `\` is
//! always what gets embedded in any slice this module returns as a root
//! (the rule table in [`root`] is expressed in terms of whichever separator
//! the input actually used, per the specification this module implements).

const SEP_BACK: u16 = b'\\' as u16;
const SEP_FWD: u16 = b'/' as u16;
const DOT: u16 = b'.' as u16;
const COLON: u16 = b':' as u16;
const CLOSE_BRACE: u16 = b'}' as u16;

pub(crate) fn is_sep(c: u16) -> bool {
    c == SEP_BACK || c == SEP_FWD
}

fn is_ascii_alpha(c: u16) -> bool {
    (0x41..=0x5A).contains(&c) || (0x61..=0x7A).contains(&c)
}

fn ascii(c: u8) -> u16 {
    c as u16
}

/// Case-insensitive ASCII prefix match, used for the `UNC` and `Volume{`
/// markers in the device/verbatim namespaces, which Windows treats
/// case-insensitively.
fn starts_with_ascii_ci(s: &[u16], pat: &str) -> bool {
    let pat = pat.as_bytes();
    s.len() >= pat.len()
        && s.iter()
            .zip(pat.iter())
            .all(|(&c, &b)| c <= 0x7F && (c as u8).eq_ignore_ascii_case(&b))
}

/// Returns `&p[..prefix_len]`, extended by one character if `p[prefix_len]`
/// is a separator (a child segment follows the prefix).
fn root_with_optional_trailing_sep(p: &[u16], prefix_len: usize) -> &[u16] {
    if p.len() > prefix_len && is_sep(p[prefix_len]) {
        &p[..prefix_len + 1]
    } else {
        &p[..prefix_len]
    }
}

/// Parses `server[\share[\...]]` starting at `server_start`, covering both
/// a plain UNC root (`server_start == 2`, right after the leading `\\`) and
/// the `\\.\UNC\` device-namespace form (`server_start == 8`).
fn server_share_root(p: &[u16], server_start: usize) -> &[u16] {
    let rest = &p[server_start..];
    let server_len = rest.iter().position(|&c| is_sep(c)).unwrap_or(rest.len());
    if server_len == rest.len() {
        return &p[..server_start + server_len];
    }
    let after_server_start = server_start + server_len + 1;
    let after_server = &p[after_server_start..];
    if after_server.is_empty() {
        return &p[..server_start + server_len];
    }
    let share_len = after_server
        .iter()
        .position(|&c| is_sep(c))
        .unwrap_or(after_server.len());
    if share_len == after_server.len() {
        &p[..after_server_start + share_len]
    } else {
        &p[..after_server_start + share_len + 1]
    }
}

/// The root of a Windows path. See the module-level rule table this
/// implements (spec §4.1).
pub fn root(p: &[u16]) -> &[u16] {
    if p.is_empty() {
        return &p[..0];
    }
    if is_sep(p[0]) {
        if p.len() == 1 || !is_sep(p[1]) {
            // single separator, or single separator + name
            return &p[..1];
        }
        // `p[0]` and `p[1]` are both separators: UNC or device/verbatim namespace.
        if p.len() >= 4 && is_sep(p[3]) && (p[2] == ascii(b'.') || p[2] == ascii(b'?')) {
            let rest = &p[4..];
            if starts_with_ascii_ci(rest, "UNC") && rest.get(3).copied().is_some_and(is_sep) {
                return server_share_root(p, 4 + 4);
            }
            if rest.len() >= 2 && is_ascii_alpha(rest[0]) && rest[1] == COLON {
                return root_with_optional_trailing_sep(p, 6);
            }
            if starts_with_ascii_ci(rest, "Volume{") {
                if let Some(close) = rest.iter().position(|&c| c == CLOSE_BRACE) {
                    return root_with_optional_trailing_sep(p, 4 + close + 1);
                }
            }
        }
        return server_share_root(p, 2);
    }
    if p.len() >= 2 && is_ascii_alpha(p[0]) && p[1] == COLON {
        if p.len() >= 3 && is_sep(p[2]) {
            return &p[..3];
        }
        return &p[..2];
    }
    &p[..0]
}

pub fn filename(p: &[u16]) -> &[u16] {
    let rest = &p[root(p).len()..];
    match rest.iter().rposition(|&c| is_sep(c)) {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    }
}

pub fn parent_path_segment(p: &[u16]) -> &[u16] {
    let r = root(p);
    match p.iter().rposition(|&c| is_sep(c)) {
        Some(idx) if idx < r.len() => r,
        Some(idx) => {
            let candidate = &p[..idx];
            if candidate.len() <= r.len() {
                r
            } else {
                candidate
            }
        }
        None => &p[..0],
    }
}

pub fn file_extension(p: &[u16]) -> &[u16] {
    let name = filename(p);
    let dot = [DOT];
    let dotdot = [DOT, DOT];
    if name.is_empty() || name == dot || name == dotdot {
        return &p[..0];
    }
    match name.iter().rposition(|&c| c == DOT) {
        Some(0) => name,
        Some(idx) => &name[idx..],
        None => &name[..0],
    }
}

pub fn segments(p: &[u16]) -> Vec<&[u16]> {
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

pub fn is_dot(p: &[u16]) -> bool {
    filename(p) == [DOT]
}

pub fn is_dot_dot(p: &[u16]) -> bool {
    filename(p) == [DOT, DOT]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn w(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    #[rstest]
    #[case("", "")]
    #[case("/", "/")]
    #[case("\\", "\\")]
    #[case("C:", "C:")]
    #[case("C:\\", "C:\\")]
    #[case("C:/", "C:/")]
    #[case("C:\\foo", "C:\\")]
    #[case("\\foo", "\\")]
    #[case("\\\\server", "\\\\server")]
    #[case("\\\\server\\share", "\\\\server\\share")]
    #[case("\\\\server\\share\\foo", "\\\\server\\share\\")]
    #[case("\\\\.\\UNC\\server\\share", "\\\\.\\UNC\\server\\share")]
    #[case("\\\\.\\UNC\\server\\share\\foo", "\\\\.\\UNC\\server\\share\\")]
    #[case("\\\\.\\C:", "\\\\.\\C:")]
    #[case("\\\\?\\C:\\foo", "\\\\?\\C:\\")]
    #[case("\\\\.\\Volume{abc}", "\\\\.\\Volume{abc}")]
    #[case("\\\\.\\Volume{abc}\\foo", "\\\\.\\Volume{abc}\\")]
    fn root_cases(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(root(&w(input)), w(expected).as_slice());
    }

    #[rstest]
    #[case("C:\\foo\\bar", "bar")]
    #[case("C:\\foo\\bar\\", "")]
    #[case("C:\\", "")]
    #[case("C:foo", "foo")]
    #[case("foo\\bar", "bar")]
    #[case(".", ".")]
    #[case("..", "..")]
    fn filename_cases(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(filename(&w(input)), w(expected).as_slice());
    }

    #[rstest]
    #[case("C:\\foo\\bar", "C:\\foo")]
    #[case("C:\\foo", "C:\\")]
    #[case("C:\\", "C:\\")]
    #[case("foo\\bar", "foo")]
    #[case("foo", "")]
    #[case("\\\\server\\share\\foo", "\\\\server\\share\\")]
    fn parent_path_segment_cases(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(parent_path_segment(&w(input)), w(expected).as_slice());
    }

    #[rstest]
    #[case("C:\\foo.bar", ".bar")]
    #[case("C:\\.bar", ".bar")]
    #[case("C:\\foo", "")]
    fn file_extension_cases(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(file_extension(&w(input)), w(expected).as_slice());
    }

    #[test]
    fn segments_include_root_first() {
        let p = w("C:\\foo\\bar");
        let segs: Vec<Vec<u16>> = segments(&p).into_iter().map(|s| s.to_vec()).collect();
        assert_eq!(segs, vec![w("C:\\"), w("foo"), w("bar")]);
    }

    #[test]
    fn is_absolute_iff_root_nonempty() {
        assert!(root(&w("C:\\foo")).len() > 0);
        assert!(root(&w("foo")).is_empty());
    }
}
