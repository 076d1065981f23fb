use std::fs;
use std::thread::sleep;
use std::time::Duration;

use nativefs::mutation::{self, CopyFileOption, CreateDirectoryOutcome};
use nativefs::path::FsPathBuf;
use nativefs::query;

fn fs_path(p: &std::path::Path) -> FsPathBuf {
    FsPathBuf::from(p)
}

#[test]
fn create_directory_reports_created_then_already_existed() {
    let dir = tempfile::tempdir().unwrap();
    let target = fs_path(&dir.path().join("fresh"));

    let first = mutation::create_directory(target.as_path(), 0o755).unwrap();
    assert_eq!(first, CreateDirectoryOutcome::Created);

    let second = mutation::create_directory(target.as_path(), 0o755).unwrap();
    assert_eq!(second, CreateDirectoryOutcome::AlreadyExisted);
}

#[test]
fn create_directories_builds_every_missing_segment() {
    let dir = tempfile::tempdir().unwrap();
    let target = fs_path(&dir.path().join("a").join("b").join("c"));

    mutation::create_directories(target.as_path(), 0o755).unwrap();

    assert!(dir.path().join("a").is_dir());
    assert!(dir.path().join("a").join("b").is_dir());
    assert!(dir.path().join("a").join("b").join("c").is_dir());
}

#[test]
fn copy_file_update_existing_only_copies_when_source_is_newer() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src.txt");
    let dst = dir.path().join("dst.txt");
    fs::write(&src, b"old").unwrap();
    fs::write(&dst, b"dest-original").unwrap();

    // Ensure dst is newer than src (mtimes at 1s granularity on some
    // filesystems), so UpdateExisting should be a no-op here.
    sleep(Duration::from_millis(1100));
    fs::write(&dst, b"dest-original").unwrap();

    let src_p = fs_path(&src);
    let dst_p = fs_path(&dst);
    mutation::copy_file(src_p.as_path(), dst_p.as_path(), CopyFileOption::UpdateExisting).unwrap();
    assert_eq!(fs::read(&dst).unwrap(), b"dest-original");

    // Touch src so it becomes newer, then retry.
    sleep(Duration::from_millis(1100));
    mutation::touch(src_p.as_path(), 0o644).unwrap();
    mutation::copy_file(src_p.as_path(), dst_p.as_path(), CopyFileOption::UpdateExisting).unwrap();
    assert_eq!(fs::read(&dst).unwrap(), b"old");
}

#[test]
fn copy_file_skip_existing_never_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src.txt");
    let dst = dir.path().join("dst.txt");
    fs::write(&src, b"new-content").unwrap();
    fs::write(&dst, b"untouched").unwrap();

    let src_p = fs_path(&src);
    let dst_p = fs_path(&dst);
    mutation::copy_file(src_p.as_path(), dst_p.as_path(), CopyFileOption::SkipExisting).unwrap();
    assert_eq!(fs::read(&dst).unwrap(), b"untouched");
}

#[test]
fn copy_directory_recreates_the_whole_tree() {
    let dir = tempfile::tempdir().unwrap();
    let from = dir.path().join("from");
    let to = dir.path().join("to");
    fs::create_dir(&from).unwrap();
    fs::create_dir(from.join("sub")).unwrap();
    fs::write(from.join("top.txt"), b"top").unwrap();
    fs::write(from.join("sub").join("nested.txt"), b"nested").unwrap();

    let from_p = fs_path(&from);
    let to_p = fs_path(&to);
    mutation::copy_directory(from_p.as_path(), to_p.as_path(), None, CopyFileOption::default()).unwrap();

    assert_eq!(fs::read(to.join("top.txt")).unwrap(), b"top");
    assert_eq!(fs::read(to.join("sub").join("nested.txt")).unwrap(), b"nested");
}

#[test]
fn move_path_renames_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let from = dir.path().join("a.txt");
    let to = dir.path().join("b.txt");
    fs::write(&from, b"payload").unwrap();

    let from_p = fs_path(&from);
    let to_p = fs_path(&to);
    mutation::move_path(from_p.as_path(), to_p.as_path()).unwrap();

    assert!(!from.exists());
    assert_eq!(fs::read(&to).unwrap(), b"payload");
}

#[test]
fn remove_on_a_directory_recurses_and_removes_everything() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("tree");
    fs::create_dir(&target).unwrap();
    fs::create_dir(target.join("sub")).unwrap();
    fs::write(target.join("sub").join("leaf.txt"), b"x").unwrap();

    let target_p = fs_path(&target);
    mutation::remove(target_p.as_path()).unwrap();
    assert!(!target.exists());
}

#[test]
fn remove_on_a_missing_path_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let missing = fs_path(&dir.path().join("does-not-exist"));
    mutation::remove(missing.as_path()).unwrap();
}

#[test]
fn remove_on_a_file_does_not_require_the_directory_path() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("solo.txt");
    fs::write(&file, b"x").unwrap();

    let file_p = fs_path(&file);
    mutation::remove(file_p.as_path()).unwrap();
    assert!(!file.exists());
    assert!(query::exists(fs_path(dir.path()).as_path(), true).unwrap());
}
