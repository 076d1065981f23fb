use tracing::instrument;
use windows_sys::Win32::Foundation::{GetLastError, HANDLE, INVALID_HANDLE_VALUE};
use windows_sys::Win32::Storage::FileSystem::{
    FindClose, FindExInfoBasic, FindExSearchNameMatch, FindFirstFileExW, FindNextFileW,
    FILE_ATTRIBUTE_DIRECTORY, FILE_ATTRIBUTE_REPARSE_POINT, WIN32_FIND_DATAW,
};

use crate::error::{FsError, Result};
use crate::path::{FsPath, FsPathBuf};
use crate::query::FileType;

use super::{is_dot_or_dot_dot, DirEntry, IterateOptions};

/// A non-recursive directory stream backed by `FindFirstFileEx`/
/// `FindNextFile`. `FindExInfoBasic` skips the short (8.3) name Windows
/// would otherwise populate on every entry.
pub struct DirIterator {
    handle: HANDLE,
    root: FsPathBuf,
    options: IterateOptions,
    pending: Option<WIN32_FIND_DATAW>,
    done: bool,
}

impl DirIterator {
    #[instrument(skip(options), level = "trace")]
    pub fn new(p: &FsPath, options: IterateOptions) -> Result<Self> {
        let mut pattern: Vec<u16> = p.to_vec();
        pattern.extend_from_slice(&[b'\\' as u16, b'*' as u16, 0]);
        let mut find_data: WIN32_FIND_DATAW = unsafe { std::mem::zeroed() };
        let handle = unsafe {
            FindFirstFileExW(
                pattern.as_ptr(),
                FindExInfoBasic,
                &mut find_data as *mut _ as *mut _,
                FindExSearchNameMatch,
                std::ptr::null(),
                0,
            )
        };
        if handle == INVALID_HANDLE_VALUE {
            return Err(FsError::from_io(
                std::io::Error::from_raw_os_error(unsafe { GetLastError() } as i32),
                FsPathBuf::from(p),
            ));
        }
        Ok(Self {
            handle,
            root: FsPathBuf::from(p),
            options,
            pending: Some(find_data),
            done: false,
        })
    }

    fn name_of(data: &WIN32_FIND_DATAW) -> FsPathBuf {
        let len = data
            .cFileName
            .iter()
            .position(|&c| c == 0)
            .unwrap_or(data.cFileName.len());
        FsPathBuf::from(&data.cFileName[..len])
    }

    fn type_of(data: &WIN32_FIND_DATAW) -> FileType {
        if data.dwFileAttributes & FILE_ATTRIBUTE_REPARSE_POINT != 0 {
            FileType::Symlink
        } else if data.dwFileAttributes & FILE_ATTRIBUTE_DIRECTORY != 0 {
            FileType::Directory
        } else {
            FileType::File
        }
    }

    fn advance(&mut self) -> Option<WIN32_FIND_DATAW> {
        if let Some(d) = self.pending.take() {
            return Some(d);
        }
        if self.done {
            return None;
        }
        let mut find_data: WIN32_FIND_DATAW = unsafe { std::mem::zeroed() };
        let ok = unsafe { FindNextFileW(self.handle, &mut find_data) };
        if ok == 0 {
            self.done = true;
            return None;
        }
        Some(find_data)
    }
}

impl Iterator for DirIterator {
    type Item = Result<DirEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let data = self.advance()?;
            let name = Self::name_of(&data);
            if is_dot_or_dot_dot(name.as_path()) {
                continue;
            }
            let file_type = Some(Self::type_of(&data));
            let mut full = self.root.clone();
            crate::path::append(&mut full, name.as_path());
            let path = if self.options.contains(IterateOptions::FULL_PATHS) {
                full
            } else {
                name
            };
            return Some(Ok(DirEntry {
                path,
                file_type,
                depth: 0,
            }));
        }
    }
}

impl Drop for DirIterator {
    fn drop(&mut self) {
        unsafe {
            FindClose(self.handle);
        }
    }
}
