use std::ffi::CString;

use tracing::instrument;

use crate::error::{FsError, FsErrorKind, Result};
use crate::limits;
use crate::path::{FsPath, FsPathBuf};
use crate::query::FileType;

use super::{is_dot_or_dot_dot, DirEntry, IterateOptions};

fn to_cstring(p: &FsPath) -> Result<CString> {
    CString::new(p).map_err(|_| FsError::new(FsErrorKind::InvalidArgument))
}

fn file_type_from_d_type(d_type: u8) -> Option<FileType> {
    match d_type {
        libc::DT_REG => Some(FileType::File),
        libc::DT_DIR => Some(FileType::Directory),
        libc::DT_LNK => Some(FileType::Symlink),
        libc::DT_FIFO => Some(FileType::Pipe),
        libc::DT_CHR => Some(FileType::CharacterDevice),
        libc::DT_BLK => Some(FileType::BlockDevice),
        libc::DT_SOCK => Some(FileType::Socket),
        _ => None,
    }
}

/// A non-recursive, lazy directory stream backed by a raw `getdents64`
/// syscall. `libc` exposes the `linux_dirent64` layout but not a safe
/// wrapper around the syscall itself, so this goes through
/// `libc::syscall(libc::SYS_getdents64, ...)` directly.
pub struct DirIterator {
    fd: libc::c_int,
    root: FsPathBuf,
    options: IterateOptions,
    buf: Vec<u8>,
    filled: usize,
    consumed: usize,
    done: bool,
}

impl DirIterator {
    #[instrument(skip(options), level = "trace")]
    pub fn new(p: &FsPath, options: IterateOptions) -> Result<Self> {
        let c_path = to_cstring(p)?;
        let fd = unsafe {
            libc::open(
                c_path.as_ptr(),
                libc::O_RDONLY | libc::O_DIRECTORY | libc::O_CLOEXEC,
            )
        };
        if fd < 0 {
            return Err(FsError::from_io(
                std::io::Error::last_os_error(),
                FsPathBuf::from(p),
            ));
        }
        Ok(Self {
            fd,
            root: FsPathBuf::from(p),
            options,
            buf: vec![0u8; limits::DIRENT_STACK_BUFFER_SIZE],
            filled: 0,
            consumed: 0,
            done: false,
        })
    }

    #[instrument(skip_all, level = "trace")]
    fn refill(&mut self) -> Result<bool> {
        loop {
            let n = unsafe {
                libc::syscall(
                    libc::SYS_getdents64,
                    self.fd,
                    self.buf.as_mut_ptr(),
                    self.buf.len(),
                )
            };
            if n < 0 {
                let err = std::io::Error::last_os_error();
                if err.raw_os_error() == Some(libc::EINVAL)
                    && self.buf.len() < limits::DIRENT_ALLOC_MAX_SIZE
                {
                    let new_len = (self.buf.len() * limits::DIRENT_ALLOC_GROWTH_FACTOR)
                        .min(limits::DIRENT_ALLOC_MAX_SIZE);
                    tracing::debug!(old = self.buf.len(), new = new_len, "growing getdents64 buffer");
                    self.buf.resize(new_len, 0);
                    continue;
                }
                return Err(FsError::from_io(err, FsPathBuf::from(self.root.as_path())));
            }
            self.filled = n as usize;
            self.consumed = 0;
            return Ok(self.filled > 0);
        }
    }

    /// Layout of `struct linux_dirent64`: `d_ino(8) d_off(8) d_reclen(2)
    /// d_type(1) d_name(variable, NUL-terminated)`.
    fn next_raw(&mut self) -> Option<Result<(FsPathBuf, Option<FileType>)>> {
        loop {
            if self.consumed >= self.filled {
                match self.refill() {
                    Ok(true) => {}
                    Ok(false) => return None,
                    Err(e) => return Some(Err(e)),
                }
            }
            let base = self.consumed;
            let d_reclen = u16::from_ne_bytes([self.buf[base + 16], self.buf[base + 17]]) as usize;
            let d_type = self.buf[base + 18];
            let name_start = base + 19;
            let name_end = self.buf[name_start..base + d_reclen]
                .iter()
                .position(|&b| b == 0)
                .map(|off| name_start + off)
                .unwrap_or(base + d_reclen);
            let name = &self.buf[name_start..name_end];
            let result = if is_dot_or_dot_dot(name) {
                None
            } else {
                Some(Ok((FsPathBuf::from(name), file_type_from_d_type(d_type))))
            };
            self.consumed += d_reclen;
            if let Some(r) = result {
                return Some(r);
            }
        }
    }
}

impl Iterator for DirIterator {
    type Item = Result<DirEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_raw() {
            None => None,
            Some(Err(e)) => {
                if self.options.contains(IterateOptions::STOP_ON_ERROR) {
                    self.done = true;
                }
                Some(Err(e))
            }
            Some(Ok((name, mut file_type))) => {
                let mut full = self.root.clone();
                crate::path::append(&mut full, name.as_path());
                if file_type.is_none() && self.options.contains(IterateOptions::QUERY_TYPE) {
                    file_type = crate::query::get_filesystem_type(full.as_path()).ok();
                }
                let path = if self.options.contains(IterateOptions::FULL_PATHS) {
                    full
                } else {
                    name
                };
                Some(Ok(DirEntry {
                    path,
                    file_type,
                    depth: 0,
                }))
            }
        }
    }
}

impl Drop for DirIterator {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}
