use std::ffi::CString;

use crate::error::{FsError, FsErrorKind, Result};
use crate::path::FsPath;
use crate::query;

use super::{CopyFileOption, CreateDirectoryOutcome};

fn to_cstring(p: &FsPath) -> Result<CString> {
    CString::new(p).map_err(|_| FsError::new(FsErrorKind::InvalidArgument))
}

fn last_os_error(p: &FsPath) -> FsError {
    FsError::from_io(std::io::Error::last_os_error(), crate::path::FsPathBuf::from(p))
}

/// Open-or-create with `perms`, then `futimens(None)` to bump both times to
/// now.
pub fn touch(p: &FsPath, perms: u32) -> Result<()> {
    let c_path = to_cstring(p)?;
    let fd = unsafe {
        libc::open(
            c_path.as_ptr(),
            libc::O_WRONLY | libc::O_CREAT | libc::O_CLOEXEC,
            perms as libc::mode_t,
        )
    };
    if fd < 0 {
        return Err(last_os_error(p));
    }
    let rc = unsafe { libc::futimens(fd, std::ptr::null()) };
    let result = if rc != 0 { Err(last_os_error(p)) } else { Ok(()) };
    unsafe {
        libc::close(fd);
    }
    result
}

fn open_read(p: &FsPath) -> Result<libc::c_int> {
    let c_path = to_cstring(p)?;
    let fd = unsafe { libc::open(c_path.as_ptr(), libc::O_RDONLY | libc::O_CLOEXEC) };
    if fd < 0 {
        return Err(last_os_error(p));
    }
    Ok(fd)
}

fn destination_open_flags(option: CopyFileOption) -> libc::c_int {
    match option {
        CopyFileOption::FailIfExists => libc::O_WRONLY | libc::O_CREAT | libc::O_EXCL | libc::O_CLOEXEC,
        _ => libc::O_WRONLY | libc::O_CREAT | libc::O_TRUNC | libc::O_CLOEXEC,
    }
}

/// Copies a single file. Tries a zero-copy `sendfile` sized by the queried
/// source size, falling back to a buffered read/write loop if `sendfile`
/// reports `EINVAL`/`ENOSYS` (cross-filesystem copies, pipes, etc.).
pub fn copy_file(from: &FsPath, to: &FsPath, option: CopyFileOption) -> Result<()> {
    match option {
        CopyFileOption::SkipExisting if query::exists(to, true)? => return Ok(()),
        CopyFileOption::UpdateExisting if query::exists(to, true)? => {
            let src_mtime = query::get_filesystem_info(from, query::QueryFlags::FILE_TIMES)?.modified;
            let dst_mtime = query::get_filesystem_info(to, query::QueryFlags::FILE_TIMES)?.modified;
            if src_mtime <= dst_mtime {
                return Ok(());
            }
        }
        _ => {}
    }

    let src_info = query::get_filesystem_info(from, query::QueryFlags::SIZE | query::QueryFlags::PERMISSIONS)?;
    let size = src_info.size.unwrap_or(0);
    let perms = src_info.permissions.unwrap_or(0o644);

    let src_fd = open_read(from)?;
    let c_to = to_cstring(to)?;
    let dst_fd = unsafe {
        libc::open(c_to.as_ptr(), destination_open_flags(option), perms as libc::mode_t)
    };
    if dst_fd < 0 {
        unsafe {
            libc::close(src_fd);
        }
        return Err(last_os_error(to));
    }

    let result = copy_via_sendfile_or_fallback(src_fd, dst_fd, size).map_err(|_| last_os_error(to));
    unsafe {
        libc::close(src_fd);
        libc::close(dst_fd);
    }
    result
}

fn copy_via_sendfile_or_fallback(src_fd: libc::c_int, dst_fd: libc::c_int, size: u64) -> std::result::Result<(), ()> {
    let mut remaining = size;
    while remaining > 0 {
        let chunk = remaining.min(1 << 30) as usize;
        let n = unsafe { libc::sendfile(dst_fd, src_fd, std::ptr::null_mut(), chunk) };
        if n < 0 {
            let errno = std::io::Error::last_os_error().raw_os_error();
            if errno == Some(libc::EINVAL) || errno == Some(libc::ENOSYS) {
                return copy_via_read_write(src_fd, dst_fd);
            }
            return Err(());
        }
        if n == 0 {
            break;
        }
        remaining = remaining.saturating_sub(n as u64);
    }
    Ok(())
}

fn copy_via_read_write(src_fd: libc::c_int, dst_fd: libc::c_int) -> std::result::Result<(), ()> {
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = unsafe { libc::read(src_fd, buf.as_mut_ptr() as *mut _, buf.len()) };
        if n < 0 {
            return Err(());
        }
        if n == 0 {
            return Ok(());
        }
        let mut written = 0usize;
        while written < n as usize {
            let w = unsafe {
                libc::write(
                    dst_fd,
                    buf[written..n as usize].as_ptr() as *const _,
                    n as usize - written,
                )
            };
            if w < 0 {
                return Err(());
            }
            written += w as usize;
        }
    }
}

pub fn create_directory(p: &FsPath, perms: u32) -> Result<CreateDirectoryOutcome> {
    let c_path = to_cstring(p)?;
    let rc = unsafe { libc::mkdir(c_path.as_ptr(), perms as libc::mode_t) };
    if rc == 0 {
        return Ok(CreateDirectoryOutcome::Created);
    }
    let err = std::io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::EEXIST) && query::get_filesystem_type(p)? == query::FileType::Directory {
        return Ok(CreateDirectoryOutcome::AlreadyExisted);
    }
    Err(FsError::from_io(err, crate::path::FsPathBuf::from(p)))
}

pub fn create_hard_link(target: &FsPath, link: &FsPath) -> Result<()> {
    let c_target = to_cstring(target)?;
    let c_link = to_cstring(link)?;
    let rc = unsafe { libc::link(c_target.as_ptr(), c_link.as_ptr()) };
    if rc != 0 {
        return Err(last_os_error(link));
    }
    Ok(())
}

pub fn create_symlink(target: &FsPath, link: &FsPath) -> Result<()> {
    let c_target = to_cstring(target)?;
    let c_link = to_cstring(link)?;
    let rc = unsafe { libc::symlink(c_target.as_ptr(), c_link.as_ptr()) };
    if rc != 0 {
        return Err(last_os_error(link));
    }
    Ok(())
}

pub fn move_path(from: &FsPath, to: &FsPath) -> Result<()> {
    let c_from = to_cstring(from)?;
    let c_to = to_cstring(to)?;
    let rc = unsafe { libc::rename(c_from.as_ptr(), c_to.as_ptr()) };
    if rc != 0 {
        return Err(last_os_error(from));
    }
    Ok(())
}

pub fn remove_file(p: &FsPath) -> Result<()> {
    let c_path = to_cstring(p)?;
    let rc = unsafe { libc::unlink(c_path.as_ptr()) };
    if rc != 0 {
        return Err(last_os_error(p));
    }
    Ok(())
}

pub fn remove_empty_directory(p: &FsPath) -> Result<()> {
    let c_path = to_cstring(p)?;
    let rc = unsafe { libc::rmdir(c_path.as_ptr()) };
    if rc != 0 {
        return Err(last_os_error(p));
    }
    Ok(())
}
