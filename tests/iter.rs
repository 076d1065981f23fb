use std::collections::HashSet;
use std::fs;

use nativefs::iter::{DirIterator, IterateOptions, RecursiveDirIterator};
use nativefs::path::FsPathBuf;
use nativefs::query::FileType;

fn fs_path(p: &std::path::Path) -> FsPathBuf {
    FsPathBuf::from(p)
}

#[test]
fn non_recursive_iteration_yields_exactly_the_children_once_each() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("a")).unwrap();
    fs::create_dir(dir.path().join("b")).unwrap();
    fs::write(dir.path().join("c.txt"), b"hi").unwrap();

    let root = fs_path(dir.path());
    let names: HashSet<String> = DirIterator::new(root.as_path(), IterateOptions::empty())
        .unwrap()
        .map(|e| {
            let entry = e.unwrap();
            std::path::PathBuf::from(&entry.path).to_string_lossy().into_owned()
        })
        .collect();

    assert_eq!(names, HashSet::from(["a".to_string(), "b".to_string(), "c.txt".to_string()]));
}

#[test]
fn non_recursive_iteration_skips_dot_and_dot_dot() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("only.txt"), b"x").unwrap();

    let root = fs_path(dir.path());
    let count = DirIterator::new(root.as_path(), IterateOptions::empty())
        .unwrap()
        .count();
    assert_eq!(count, 1);
}

#[test]
fn recursive_pre_order_yields_directory_before_its_descendants() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("sub").join("leaf.txt"), b"x").unwrap();

    let root = fs_path(dir.path());
    let options = IterateOptions::FULL_PATHS;
    let entries: Vec<_> = RecursiveDirIterator::new(root.as_path(), options, None)
        .unwrap()
        .map(|e| e.unwrap())
        .collect();

    let sub_pos = entries
        .iter()
        .position(|e| std::path::PathBuf::from(&e.path).ends_with("sub"))
        .expect("sub directory entry present");
    let leaf_pos = entries
        .iter()
        .position(|e| std::path::PathBuf::from(&e.path).ends_with("leaf.txt"))
        .expect("leaf file entry present");
    assert!(sub_pos < leaf_pos, "directory must be yielded before its descendant in pre-order");
}

#[test]
fn recursive_children_first_yields_entry_before_its_parent_directory() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("sub").join("leaf.txt"), b"x").unwrap();

    let root = fs_path(dir.path());
    let options = IterateOptions::FULL_PATHS | IterateOptions::CHILDREN_FIRST;
    let entries: Vec<_> = RecursiveDirIterator::new(root.as_path(), options, None)
        .unwrap()
        .map(|e| e.unwrap())
        .collect();

    let sub_pos = entries
        .iter()
        .position(|e| std::path::PathBuf::from(&e.path).ends_with("sub"))
        .expect("sub directory entry present");
    let leaf_pos = entries
        .iter()
        .position(|e| std::path::PathBuf::from(&e.path).ends_with("leaf.txt"))
        .expect("leaf file entry present");
    assert!(leaf_pos < sub_pos, "child must be yielded strictly before its parent in children-first order");
}

#[test]
fn recursive_iteration_without_full_paths_yields_bare_names() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("sub").join("leaf.txt"), b"x").unwrap();

    let root = fs_path(dir.path());
    let entries: Vec<_> = RecursiveDirIterator::new(root.as_path(), IterateOptions::empty(), None)
        .unwrap()
        .map(|e| e.unwrap())
        .collect();

    for entry in &entries {
        let rendered = std::path::PathBuf::from(&entry.path);
        assert_eq!(rendered.components().count(), 1, "entry {rendered:?} should be a bare name");
    }
}

#[test]
fn recursive_iteration_reports_directory_type() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();

    let root = fs_path(dir.path());
    let entries: Vec<_> = RecursiveDirIterator::new(root.as_path(), IterateOptions::FULL_PATHS, None)
        .unwrap()
        .map(|e| e.unwrap())
        .collect();

    let sub = entries
        .iter()
        .find(|e| std::path::PathBuf::from(&e.path).ends_with("sub"))
        .unwrap();
    assert_eq!(sub.file_type, Some(FileType::Directory));
}
