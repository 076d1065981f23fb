use nativefs::path::{self, FsPathBuf, RelativePathResult};

#[cfg(unix)]
fn p(s: &str) -> FsPathBuf {
    FsPathBuf::from(s)
}

#[cfg(unix)]
#[test]
fn relative_path_then_append_then_normalize_recovers_the_destination() {
    let cases = [
        ("/a/b/c", "/a/b/d/e"),
        ("/a/b/c", "/a/x"),
        ("/a/b", "/a/b"),
        ("/a/b/c/d", "/a"),
    ];
    for (from, to) in cases {
        let from = p(from);
        let to = p(to);
        let relative = match path::relative_path(from.as_path(), to.as_path()) {
            RelativePathResult::Relative(r) => r,
            RelativePathResult::Unrelated => panic!("{from:?} and {to:?} share a root and must be related"),
        };
        let mut joined = from.clone();
        path::append(&mut joined, relative.as_path());
        let lhs = path::normalize(joined.as_path());
        let rhs = path::normalize(to.as_path());
        assert_eq!(
            std::path::PathBuf::from(&lhs),
            std::path::PathBuf::from(&rhs),
            "relative_path({from:?}, {to:?}) = {relative:?} did not round-trip"
        );
    }
}

#[cfg(unix)]
#[test]
fn relative_path_of_a_path_to_itself_is_dot() {
    let a = p("/a/b/c");
    match path::relative_path(a.as_path(), a.as_path()) {
        RelativePathResult::Relative(r) => {
            assert_eq!(std::path::PathBuf::from(&r), std::path::PathBuf::from("."));
        }
        RelativePathResult::Unrelated => panic!("a path is always related to itself"),
    }
}

#[cfg(unix)]
#[test]
fn append_of_empty_is_identity_and_absolute_resets_target() {
    let mut out = p("/a/b");
    path::append(&mut out, p("").as_path());
    assert_eq!(std::path::PathBuf::from(&out), std::path::PathBuf::from("/a/b"));

    let mut out = p("/a/b");
    path::append(&mut out, p("/c/d").as_path());
    assert_eq!(std::path::PathBuf::from(&out), std::path::PathBuf::from("/c/d"));
}

#[cfg(unix)]
#[test]
fn is_absolute_matches_nonempty_root() {
    assert!(path::is_absolute(p("/a/b").as_path()));
    assert!(!path::is_absolute(p("a/b").as_path()));
}

#[cfg(unix)]
#[test]
fn normalize_is_idempotent_across_a_variety_of_inputs() {
    for input in ["/a/////b", "/abc/../def", "a/./b/../c", "/", "."] {
        let once = path::normalize(p(input).as_path());
        let twice = path::normalize(once.as_path());
        assert_eq!(
            std::path::PathBuf::from(&once),
            std::path::PathBuf::from(&twice),
            "normalize({input:?}) is not idempotent"
        );
    }
}
