use std::collections::HashMap;
use std::os::windows::io::{AsRawHandle, FromRawHandle, OwnedHandle};

use tracing::instrument;
use windows_sys::Win32::Foundation::{GetLastError, HANDLE, INVALID_HANDLE_VALUE, WAIT_OBJECT_0};
use windows_sys::Win32::Storage::FileSystem::{
    CreateFileW, ReadDirectoryChangesW, FILE_ACTION_ADDED, FILE_ACTION_MODIFIED,
    FILE_ACTION_REMOVED, FILE_ACTION_RENAMED_NEW_NAME, FILE_ACTION_RENAMED_OLD_NAME,
    FILE_FLAG_BACKUP_SEMANTICS, FILE_FLAG_OVERLAPPED, FILE_LIST_DIRECTORY,
    FILE_NOTIFY_CHANGE_ATTRIBUTES, FILE_NOTIFY_CHANGE_CREATION, FILE_NOTIFY_CHANGE_DIR_NAME,
    FILE_NOTIFY_CHANGE_FILE_NAME, FILE_NOTIFY_CHANGE_LAST_ACCESS, FILE_NOTIFY_CHANGE_LAST_WRITE,
    FILE_NOTIFY_CHANGE_SIZE, FILE_SHARE_DELETE, FILE_SHARE_READ, FILE_SHARE_WRITE, OPEN_EXISTING,
};
use windows_sys::Win32::System::IO::{GetOverlappedResult, OVERLAPPED};
use windows_sys::Win32::System::Threading::{CreateEventW, ResetEvent, WaitForSingleObject};

use crate::error::{FsError, Result};
use crate::limits;
use crate::path::{FsPath, FsPathBuf};

use super::{Callback, EventKind};

const NOTIFY_MASK: u32 = FILE_NOTIFY_CHANGE_FILE_NAME
    | FILE_NOTIFY_CHANGE_DIR_NAME
    | FILE_NOTIFY_CHANGE_ATTRIBUTES
    | FILE_NOTIFY_CHANGE_SIZE
    | FILE_NOTIFY_CHANGE_LAST_WRITE
    | FILE_NOTIFY_CHANGE_LAST_ACCESS
    | FILE_NOTIFY_CHANGE_CREATION;

// Header layout of FILE_NOTIFY_INFORMATION: NextEntryOffset, Action, FileNameLength,
// each a u32, followed by the UTF-16 name. Parsed by hand rather than through the
// windows-sys struct to sidestep its trailing [u16; 1] tail field.
const NOTIFY_HEADER_SIZE: usize = 12;

fn to_wide_nul(p: &FsPath) -> Vec<u16> {
    let mut v: Vec<u16> = p.to_vec();
    v.push(0);
    v
}

fn last_error(p: &FsPath) -> FsError {
    let code = unsafe { GetLastError() };
    FsError::from_io(std::io::Error::from_raw_os_error(code as i32), FsPathBuf::from(p))
}

fn event_kind_from_action(action: u32) -> EventKind {
    match action {
        FILE_ACTION_ADDED => EventKind::CREATED,
        FILE_ACTION_REMOVED => EventKind::REMOVED,
        FILE_ACTION_MODIFIED => EventKind::MODIFIED,
        FILE_ACTION_RENAMED_OLD_NAME => EventKind::MOVED_FROM,
        FILE_ACTION_RENAMED_NEW_NAME => EventKind::MOVED_TO,
        _ => EventKind::empty(),
    }
}

fn name_key(name: &[u16]) -> Vec<u16> {
    name.iter()
        .map(|&c| if (b'A' as u16..=b'Z' as u16).contains(&c) { c + 32 } else { c })
        .collect()
}

fn read_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_ne_bytes(buf[at..at + 4].try_into().expect("4-byte slice"))
}

struct WatchedDirectoryRecord {
    dir_handle: OwnedHandle,
    event_handle: OwnedHandle,
    overlapped: Box<OVERLAPPED>,
    buffer: Vec<u8>,
    names: HashMap<Vec<u16>, FsPathBuf>,
}

impl WatchedDirectoryRecord {
    fn issue_read(&mut self) -> Result<()> {
        let mut unused: u32 = 0;
        let ok = unsafe {
            ReadDirectoryChangesW(
                self.dir_handle.as_raw_handle() as HANDLE,
                self.buffer.as_mut_ptr() as *mut _,
                self.buffer.len() as u32,
                0,
                NOTIFY_MASK,
                &mut unused,
                self.overlapped.as_mut() as *mut OVERLAPPED,
                None,
            )
        };
        if ok == 0 {
            return Err(FsError::from_io(std::io::Error::last_os_error(), "ReadDirectoryChangesW"));
        }
        Ok(())
    }
}

/// A filesystem watcher backed directly by `ReadDirectoryChangesW`.
///
/// Mirrors the posix implementation's shape: one overlapped read per watched
/// file's parent directory, filtered down to the watched names on delivery,
/// so unrelated sibling churn never reaches the callback.
pub struct Watcher {
    callback: Callback,
    directories: HashMap<FsPathBuf, WatchedDirectoryRecord>,
}

impl Watcher {
    pub fn new(callback: impl FnMut(&FsPath, EventKind) + Send + 'static) -> Result<Self> {
        Ok(Self {
            callback: Box::new(callback),
            directories: HashMap::new(),
        })
    }

    /// Registers `p` for change notification. Duplicate registration of an
    /// already-watched path is a no-op.
    #[instrument(skip_all, level = "trace")]
    pub fn watch_file(&mut self, p: &FsPath) -> Result<()> {
        let canonical = crate::query::canonical_path(p).unwrap_or_else(|_| FsPathBuf::from(p));
        let parent = FsPathBuf::from(crate::path::parent_path_segment(canonical.as_path()));
        let key = name_key(crate::path::filename(canonical.as_path()));

        if let Some(dir) = self.directories.get(&parent) {
            if dir.names.contains_key(&key) {
                return Ok(());
            }
        }

        if !self.directories.contains_key(&parent) {
            let wide = to_wide_nul(parent.as_path());
            let handle = unsafe {
                CreateFileW(
                    wide.as_ptr(),
                    FILE_LIST_DIRECTORY,
                    FILE_SHARE_READ | FILE_SHARE_WRITE | FILE_SHARE_DELETE,
                    std::ptr::null(),
                    OPEN_EXISTING,
                    FILE_FLAG_BACKUP_SEMANTICS | FILE_FLAG_OVERLAPPED,
                    0,
                )
            };
            if handle == INVALID_HANDLE_VALUE {
                return Err(last_error(parent.as_path()));
            }
            let dir_handle = unsafe { OwnedHandle::from_raw_handle(handle as _) };

            let event = unsafe { CreateEventW(std::ptr::null(), 0, 0, std::ptr::null()) };
            if event.is_null() {
                return Err(last_error(parent.as_path()));
            }
            let event_handle = unsafe { OwnedHandle::from_raw_handle(event as _) };

            let mut overlapped: Box<OVERLAPPED> = Box::new(unsafe { std::mem::zeroed() });
            overlapped.hEvent = event_handle.as_raw_handle() as HANDLE;

            let mut record = WatchedDirectoryRecord {
                dir_handle,
                event_handle,
                overlapped,
                buffer: vec![0u8; limits::DIRENT_STACK_BUFFER_SIZE],
                names: HashMap::new(),
            };
            record.issue_read()?;
            self.directories.insert(parent.clone(), record);
        }

        let dir = self.directories.get_mut(&parent).expect("just inserted or present");
        dir.names.insert(key, canonical);
        Ok(())
    }

    /// Symmetric teardown of [`watch_file`]: drops the file's name mapping
    /// and, if its parent directory has no other watched files left, the
    /// whole directory record (canceling the pending overlapped read on
    /// drop).
    #[instrument(skip_all, level = "trace")]
    pub fn unwatch_file(&mut self, p: &FsPath) -> Result<()> {
        let canonical = crate::query::canonical_path(p).unwrap_or_else(|_| FsPathBuf::from(p));
        let parent = FsPathBuf::from(crate::path::parent_path_segment(canonical.as_path()));
        let key = name_key(crate::path::filename(canonical.as_path()));

        if let Some(dir) = self.directories.get_mut(&parent) {
            dir.names.remove(&key);
            if dir.names.is_empty() {
                self.directories.remove(&parent);
            }
        }
        Ok(())
    }

    /// Unwatches everything.
    pub fn unwatch_all(&mut self) {
        self.directories.clear();
    }

    /// True iff any watched directory's overlapped read has completed.
    pub fn has_events(&self) -> bool {
        self.directories.values().any(|dir| unsafe {
            WaitForSingleObject(dir.event_handle.as_raw_handle() as HANDLE, 0) == WAIT_OBJECT_0
        })
    }

    /// Drains and dispatches whatever events are currently pending, re-issuing
    /// each directory's `ReadDirectoryChangesW` immediately after collecting
    /// its result to keep the lost-event window as small as possible.
    #[instrument(skip_all, level = "trace")]
    pub fn process_events(&mut self) -> Result<()> {
        let parents: Vec<FsPathBuf> = self.directories.keys().cloned().collect();
        for parent in parents {
            self.process_directory(&parent)?;
        }
        Ok(())
    }

    #[instrument(skip_all, level = "trace")]
    fn process_directory(&mut self, parent: &FsPathBuf) -> Result<()> {
        loop {
            let signaled = match self.directories.get(parent) {
                Some(dir) => unsafe {
                    WaitForSingleObject(dir.event_handle.as_raw_handle() as HANDLE, 0) == WAIT_OBJECT_0
                },
                None => return Ok(()),
            };
            if !signaled {
                return Ok(());
            }

            let bytes = {
                let dir = self.directories.get_mut(parent).expect("present");
                let mut bytes: u32 = 0;
                let ok = unsafe {
                    GetOverlappedResult(
                        dir.dir_handle.as_raw_handle() as HANDLE,
                        dir.overlapped.as_mut() as *mut OVERLAPPED,
                        &mut bytes,
                        0,
                    )
                };
                unsafe {
                    ResetEvent(dir.event_handle.as_raw_handle() as HANDLE);
                }
                if ok == 0 {
                    return Err(FsError::from_io(std::io::Error::last_os_error(), "GetOverlappedResult"));
                }
                if bytes == 0 && dir.buffer.len() < limits::PATH_ALLOC_MAX_SIZE {
                    let new_len = (dir.buffer.len() * limits::DIRENT_ALLOC_GROWTH_FACTOR)
                        .min(limits::PATH_ALLOC_MAX_SIZE);
                    tracing::debug!(old = dir.buffer.len(), new = new_len, "growing ReadDirectoryChangesW buffer");
                    dir.buffer.resize(new_len, 0);
                }
                bytes
            };

            if bytes > 0 {
                self.dispatch_directory(parent, bytes as usize);
            }

            let dir = self.directories.get_mut(parent).expect("present");
            dir.issue_read()?;
        }
    }

    #[instrument(skip_all, level = "trace")]
    fn dispatch_directory(&mut self, parent: &FsPathBuf, len: usize) {
        let dir = match self.directories.get(parent) {
            Some(d) => d,
            None => return,
        };
        let mut offset = 0usize;
        let mut hits: Vec<(FsPathBuf, EventKind)> = Vec::new();
        loop {
            if offset + NOTIFY_HEADER_SIZE > len {
                break;
            }
            let next_entry_offset = read_u32(&dir.buffer, offset) as usize;
            let action = read_u32(&dir.buffer, offset + 4);
            let name_len_bytes = read_u32(&dir.buffer, offset + 8) as usize;
            let name_start = offset + NOTIFY_HEADER_SIZE;
            let name_end = name_start + name_len_bytes;
            if name_end > dir.buffer.len() {
                break;
            }
            let name: Vec<u16> = dir.buffer[name_start..name_end]
                .chunks_exact(2)
                .map(|c| u16::from_ne_bytes([c[0], c[1]]))
                .collect();
            let kind = event_kind_from_action(action);
            if !kind.is_empty() {
                if let Some(canonical) = dir.names.get(&name_key(&name)) {
                    hits.push((canonical.clone(), kind));
                }
            }
            if next_entry_offset == 0 {
                break;
            }
            offset += next_entry_offset;
        }
        for (path, kind) in hits {
            (self.callback)(path.as_path(), kind);
        }
    }
}

impl Drop for Watcher {
    /// Drops every watched directory's overlapped read and closes its
    /// handles, so a forgotten `destroy()` call can't leak kernel objects.
    fn drop(&mut self) {
        self.unwatch_all();
    }
}
