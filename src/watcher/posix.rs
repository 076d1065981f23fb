use std::collections::HashMap;
use std::ffi::CString;
use std::mem::size_of;

use tracing::instrument;

use crate::error::{FsError, FsErrorKind, Result};
use crate::limits;
use crate::path::{FsPath, FsPathBuf};

use super::{Callback, EventKind};

fn to_cstring(p: &FsPath) -> Result<CString> {
    CString::new(p).map_err(|_| FsError::new(FsErrorKind::InvalidArgument))
}

fn event_kind_from_mask(mask: u32) -> EventKind {
    let mut kind = EventKind::empty();
    if mask & libc::IN_CREATE != 0 {
        kind |= EventKind::CREATED;
    }
    if mask & libc::IN_MODIFY != 0 {
        kind |= EventKind::MODIFIED;
    }
    if mask & (libc::IN_DELETE | libc::IN_DELETE_SELF) != 0 {
        kind |= EventKind::REMOVED;
    }
    if mask & libc::IN_MOVED_FROM != 0 {
        kind |= EventKind::MOVED_FROM;
    }
    if mask & libc::IN_MOVED_TO != 0 {
        kind |= EventKind::MOVED_TO;
    }
    kind
}

struct WatchedFileRecord {
    wd: libc::c_int,
}

struct WatchedDirectoryRecord {
    wd: libc::c_int,
    files: HashMap<Vec<u8>, WatchedFileRecord>,
}

/// A filesystem watcher backed directly by an `inotify` instance.
///
/// Holds one watch on each watched file's parent directory (`files_only`:
/// events for names outside the watched set are ignored) plus one
/// additional per-file watch, so renames/removals of the file itself are
/// observable even when nothing else in its directory changes.
pub struct Watcher {
    inotify_fd: libc::c_int,
    callback: Callback,
    directories: HashMap<FsPathBuf, WatchedDirectoryRecord>,
    dir_wd_index: HashMap<libc::c_int, FsPathBuf>,
    file_wd_index: HashMap<libc::c_int, FsPathBuf>,
    scratch: Vec<u8>,
}

impl Watcher {
    pub fn new(callback: impl FnMut(&FsPath, EventKind) + Send + 'static) -> Result<Self> {
        let fd = unsafe { libc::inotify_init1(libc::IN_NONBLOCK | libc::IN_CLOEXEC) };
        if fd < 0 {
            return Err(FsError::from_io(std::io::Error::last_os_error(), "inotify_init1"));
        }
        Ok(Self {
            inotify_fd: fd,
            callback: Box::new(callback),
            directories: HashMap::new(),
            dir_wd_index: HashMap::new(),
            file_wd_index: HashMap::new(),
            scratch: vec![0u8; limits::DIRENT_STACK_BUFFER_SIZE],
        })
    }

    /// Registers `p` for change notification. Duplicate registration of an
    /// already-watched path is a no-op.
    #[instrument(skip_all, level = "trace")]
    pub fn watch_file(&mut self, p: &FsPath) -> Result<()> {
        let canonical = crate::query::canonical_path(p).unwrap_or_else(|_| FsPathBuf::from(p));
        let parent = FsPathBuf::from(crate::path::parent_path_segment(canonical.as_path()));
        let name = crate::path::filename(canonical.as_path()).to_vec();

        if let Some(dir) = self.directories.get(&parent) {
            if dir.files.contains_key(&name) {
                return Ok(());
            }
        }

        if !self.directories.contains_key(&parent) {
            let c_parent = to_cstring(parent.as_path())?;
            let wd = unsafe {
                libc::inotify_add_watch(self.inotify_fd, c_parent.as_ptr(), libc::IN_ALL_EVENTS)
            };
            if wd < 0 {
                return Err(FsError::from_io(std::io::Error::last_os_error(), parent.clone()));
            }
            self.directories.insert(
                parent.clone(),
                WatchedDirectoryRecord {
                    wd,
                    files: HashMap::new(),
                },
            );
            self.dir_wd_index.insert(wd, parent.clone());
        }

        let c_file = to_cstring(canonical.as_path())?;
        let file_wd = unsafe {
            libc::inotify_add_watch(self.inotify_fd, c_file.as_ptr(), libc::IN_ALL_EVENTS)
        };
        if file_wd < 0 {
            return Err(FsError::from_io(std::io::Error::last_os_error(), canonical));
        }
        self.file_wd_index.insert(file_wd, canonical);

        let dir = self.directories.get_mut(&parent).expect("just inserted or present");
        dir.files.insert(name, WatchedFileRecord { wd: file_wd });
        Ok(())
    }

    /// Symmetric teardown of [`watch_file`]: drops the file record and, if
    /// its parent directory has no other watched files left, the parent
    /// record too.
    #[instrument(skip_all, level = "trace")]
    pub fn unwatch_file(&mut self, p: &FsPath) -> Result<()> {
        let canonical = crate::query::canonical_path(p).unwrap_or_else(|_| FsPathBuf::from(p));
        let parent = FsPathBuf::from(crate::path::parent_path_segment(canonical.as_path()));
        let name = crate::path::filename(canonical.as_path()).to_vec();

        if let Some(dir) = self.directories.get_mut(&parent) {
            if let Some(file) = dir.files.remove(&name) {
                unsafe {
                    libc::inotify_rm_watch(self.inotify_fd, file.wd);
                }
                self.file_wd_index.remove(&file.wd);
            }
            if dir.files.is_empty() {
                let wd = dir.wd;
                unsafe {
                    libc::inotify_rm_watch(self.inotify_fd, wd);
                }
                self.dir_wd_index.remove(&wd);
                self.directories.remove(&parent);
            }
        }
        Ok(())
    }

    /// Unwatches everything.
    pub fn unwatch_all(&mut self) {
        for (_, dir) in self.directories.drain() {
            for (_, file) in dir.files {
                unsafe {
                    libc::inotify_rm_watch(self.inotify_fd, file.wd);
                }
            }
            unsafe {
                libc::inotify_rm_watch(self.inotify_fd, dir.wd);
            }
        }
        self.dir_wd_index.clear();
        self.file_wd_index.clear();
    }

    /// True iff a `read` on the inotify fd would return data right now.
    pub fn has_events(&self) -> bool {
        let mut pfd = libc::pollfd {
            fd: self.inotify_fd,
            events: libc::POLLIN,
            revents: 0,
        };
        let rc = unsafe { libc::poll(&mut pfd, 1, 0) };
        rc > 0 && (pfd.revents & libc::POLLIN) != 0
    }

    /// Drains and dispatches whatever events are currently pending. Returns
    /// immediately if none are (the fd is non-blocking).
    #[instrument(skip_all, level = "trace")]
    pub fn process_events(&mut self) -> Result<()> {
        loop {
            let n = unsafe {
                libc::read(
                    self.inotify_fd,
                    self.scratch.as_mut_ptr() as *mut _,
                    self.scratch.len(),
                )
            };
            if n < 0 {
                let err = std::io::Error::last_os_error();
                let errno = err.raw_os_error();
                if errno == Some(libc::EAGAIN) || errno == Some(libc::EWOULDBLOCK) {
                    return Ok(());
                }
                if errno == Some(libc::EINVAL) && self.scratch.len() < limits::PATH_ALLOC_MAX_SIZE {
                    let new_len = (self.scratch.len() * limits::DIRENT_ALLOC_GROWTH_FACTOR)
                        .min(limits::PATH_ALLOC_MAX_SIZE);
                    tracing::debug!(old = self.scratch.len(), new = new_len, "growing inotify buffer");
                    self.scratch.resize(new_len, 0);
                    continue;
                }
                return Err(FsError::from_io(err, "inotify read"));
            }
            if n > 0 {
                self.dispatch(n as usize);
            }
            return Ok(());
        }
    }

    #[instrument(skip_all, level = "trace")]
    fn dispatch(&mut self, len: usize) {
        let event_size = size_of::<libc::inotify_event>();
        let mut offset = 0;
        while offset + event_size <= len {
            let event = unsafe {
                std::ptr::read_unaligned(self.scratch[offset..].as_ptr() as *const libc::inotify_event)
            };
            let name_start = offset + event_size;
            let name_end = name_start + event.len as usize;
            let raw_name = &self.scratch[name_start..name_end];
            let name = raw_name.split(|&b| b == 0).next().unwrap_or(&[]);
            offset = name_end;

            if event.mask & (libc::IN_IGNORED | libc::IN_Q_OVERFLOW | libc::IN_UNMOUNT) != 0 {
                tracing::trace!(mask = event.mask, "dropping housekeeping inotify event");
                continue;
            }

            let kind = event_kind_from_mask(event.mask);
            if kind.is_empty() {
                continue;
            }

            if let Some(parent) = self.dir_wd_index.get(&event.wd) {
                if name.is_empty() {
                    continue;
                }
                if let Some(dir) = self.directories.get(parent) {
                    if dir.files.contains_key(name) {
                        let mut full = parent.clone();
                        crate::path::append(&mut full, FsPathBuf::from(name).as_path());
                        (self.callback)(full.as_path(), kind);
                    }
                }
                continue;
            }
            if let Some(path) = self.file_wd_index.get(&event.wd) {
                (self.callback)(path.as_path(), kind);
            }
        }
    }
}

impl Drop for Watcher {
    /// Unwatches everything and releases the inotify fd, so a forgotten
    /// `destroy()` call can't leak kernel watch descriptors.
    fn drop(&mut self) {
        self.unwatch_all();
        unsafe {
            libc::close(self.inotify_fd);
        }
    }
}
