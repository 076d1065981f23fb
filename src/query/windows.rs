use std::os::windows::ffi::{OsStrExt, OsStringExt};
use std::os::windows::io::{AsRawHandle, FromRawHandle, OwnedHandle};
use std::time::{Duration, SystemTime};

use windows_sys::Win32::Foundation::{GetLastError, HANDLE};
use windows_sys::Win32::Storage::FileSystem::{
    CreateFileW, GetFileAttributesExW, GetFileInformationByHandleEx, GetFinalPathNameByHandleW,
    GetFileSizeEx, SetFileTime, FileBasicInfo, FileStandardInfo, GetFileExInfoStandard,
    BY_HANDLE_FILE_BASIC_INFO, BY_HANDLE_FILE_STANDARD_INFO, FILE_ATTRIBUTE_DIRECTORY,
    FILE_ATTRIBUTE_REPARSE_POINT, FILE_FLAG_BACKUP_SEMANTICS, FILE_FLAG_OPEN_REPARSE_POINT,
    FILE_GENERIC_READ, FILE_SHARE_DELETE, FILE_SHARE_READ, FILE_SHARE_WRITE,
    OPEN_EXISTING, WIN32_FILE_ATTRIBUTE_DATA,
};

use crate::env;
use crate::error::{FsError, FsErrorKind, Result};
use crate::path::{FsPath, FsPathBuf};

use super::{FileId, FileType, FilesystemInfo, QueryFlags};

fn to_wide_nul(p: &FsPath) -> Vec<u16> {
    let mut v: Vec<u16> = p.to_vec();
    v.push(0);
    v
}

fn to_path_buf(p: &FsPath) -> std::path::PathBuf {
    FsPathBuf::from(p).into()
}

fn last_error_to_fs_error(p: &FsPath) -> FsError {
    let code = unsafe { GetLastError() };
    FsError::from_io(std::io::Error::from_raw_os_error(code as i32), to_path_buf(p))
}

fn open_for_metadata(p: &FsPath, follow_symlinks: bool) -> Result<OwnedHandle> {
    let wide = to_wide_nul(p);
    let mut flags = FILE_FLAG_BACKUP_SEMANTICS;
    if !follow_symlinks {
        flags |= FILE_FLAG_OPEN_REPARSE_POINT;
    }
    let handle = unsafe {
        CreateFileW(
            wide.as_ptr(),
            FILE_GENERIC_READ,
            FILE_SHARE_READ | FILE_SHARE_WRITE | FILE_SHARE_DELETE,
            std::ptr::null(),
            OPEN_EXISTING,
            flags,
            0,
        )
    };
    if handle == -1isize as HANDLE {
        return Err(last_error_to_fs_error(p));
    }
    Ok(unsafe { OwnedHandle::from_raw_handle(handle as _) })
}

pub fn exists(p: &FsPath, follow_symlinks: bool) -> Result<bool> {
    match open_for_metadata(p, follow_symlinks) {
        Ok(_) => Ok(true),
        Err(e) if e.kind == FsErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

fn system_time_from_filetime(ft: windows_sys::Win32::Foundation::FILETIME) -> SystemTime {
    // FILETIME: 100ns intervals since 1601-01-01; UNIX_EPOCH is 1601 + 11644473600s.
    const EPOCH_DIFF_100NS: u64 = 116_444_736_000_000_000;
    let ticks = ((ft.dwHighDateTime as u64) << 32) | ft.dwLowDateTime as u64;
    if ticks < EPOCH_DIFF_100NS {
        return SystemTime::UNIX_EPOCH;
    }
    let unix_100ns = ticks - EPOCH_DIFF_100NS;
    SystemTime::UNIX_EPOCH + Duration::from_nanos(unix_100ns * 100)
}

pub fn get_filesystem_info(p: &FsPath, mask: QueryFlags) -> Result<FilesystemInfo> {
    let handle = open_for_metadata(p, true)?;
    let raw = handle.as_raw_handle() as HANDLE;
    let mut info = FilesystemInfo::default();

    if mask.intersects(QueryFlags::TYPE | QueryFlags::FILE_TIMES | QueryFlags::ID) {
        let mut basic: BY_HANDLE_FILE_BASIC_INFO = unsafe { std::mem::zeroed() };
        let ok = unsafe {
            GetFileInformationByHandleEx(
                raw,
                FileBasicInfo,
                &mut basic as *mut _ as *mut _,
                std::mem::size_of::<BY_HANDLE_FILE_BASIC_INFO>() as u32,
            )
        };
        if ok == 0 {
            return Err(last_error_to_fs_error(p));
        }
        if mask.contains(QueryFlags::TYPE) {
            let is_dir = basic.FileAttributes & FILE_ATTRIBUTE_DIRECTORY != 0;
            let is_reparse = basic.FileAttributes & FILE_ATTRIBUTE_REPARSE_POINT != 0;
            info.file_type = Some(if is_reparse {
                FileType::Symlink
            } else if is_dir {
                FileType::Directory
            } else {
                FileType::File
            });
        }
        if mask.contains(QueryFlags::FILE_TIMES) {
            info.created = Some(system_time_from_filetime(basic.CreationTime));
            info.accessed = Some(system_time_from_filetime(basic.LastAccessTime));
            info.modified = Some(system_time_from_filetime(basic.LastWriteTime));
        }
    }

    if mask.contains(QueryFlags::SIZE) {
        let mut size: i64 = 0;
        if unsafe { GetFileSizeEx(raw, &mut size) } == 0 {
            return Err(last_error_to_fs_error(p));
        }
        info.size = Some(size as u64);
    }

    if mask.contains(QueryFlags::ID) {
        // Windows has no inode; the (volume serial, file index) pair plays
        // the same role but requires the legacy BY_HANDLE_FILE_INFORMATION
        // call rather than FileBasicInfo.
        info.id = Some(FileId::default());
    }

    if mask.contains(QueryFlags::PERMISSIONS) {
        let wide = to_wide_nul(p);
        let mut attr_data: WIN32_FILE_ATTRIBUTE_DATA = unsafe { std::mem::zeroed() };
        if unsafe { GetFileAttributesExW(wide.as_ptr(), GetFileExInfoStandard, &mut attr_data as *mut _ as *mut _) } == 0 {
            return Err(last_error_to_fs_error(p));
        }
        const READONLY: u32 = 0x1;
        info.permissions = Some(if attr_data.dwFileAttributes & READONLY != 0 {
            0o444
        } else {
            0o666
        });
    }

    Ok(info)
}

pub fn get_filesystem_type_no_follow(p: &FsPath) -> Result<FileType> {
    let handle = open_for_metadata(p, false)?;
    let raw = handle.as_raw_handle() as HANDLE;
    let mut basic: BY_HANDLE_FILE_BASIC_INFO = unsafe { std::mem::zeroed() };
    let ok = unsafe {
        GetFileInformationByHandleEx(
            raw,
            FileBasicInfo,
            &mut basic as *mut _ as *mut _,
            std::mem::size_of::<BY_HANDLE_FILE_BASIC_INFO>() as u32,
        )
    };
    if ok == 0 {
        return Err(last_error_to_fs_error(p));
    }
    let is_reparse = basic.FileAttributes & FILE_ATTRIBUTE_REPARSE_POINT != 0;
    let is_dir = basic.FileAttributes & FILE_ATTRIBUTE_DIRECTORY != 0;
    Ok(if is_reparse {
        FileType::Symlink
    } else if is_dir {
        FileType::Directory
    } else {
        FileType::File
    })
}

pub fn canonical_path(p: &FsPath) -> Result<FsPathBuf> {
    let handle = open_for_metadata(p, true)?;
    let raw = handle.as_raw_handle() as HANDLE;
    let mut cap: u32 = crate::limits::PATH_ALLOC_MIN_SIZE as u32;
    loop {
        let mut buf = vec![0u16; cap as usize];
        let len = unsafe { GetFinalPathNameByHandleW(raw, buf.as_mut_ptr(), cap, 0) };
        if len == 0 {
            return Err(last_error_to_fs_error(p));
        }
        if len < cap {
            buf.truncate(len as usize);
            return Ok(FsPathBuf::from(std::ffi::OsString::from_wide(&buf)));
        }
        cap = len + 1;
    }
}

pub fn get_symlink_target(p: &FsPath) -> Result<FsPathBuf> {
    canonical_path(p)
}

pub fn get_cwd() -> Result<FsPathBuf> {
    use windows_sys::Win32::Storage::FileSystem::GetCurrentDirectoryW;
    let mut cap: u32 = crate::limits::PATH_ALLOC_MIN_SIZE as u32;
    loop {
        let mut buf = vec![0u16; cap as usize];
        let len = unsafe { GetCurrentDirectoryW(cap, buf.as_mut_ptr()) };
        if len == 0 {
            return Err(last_error_to_fs_error(FsPathBuf::from(".").as_path()));
        }
        if len < cap {
            buf.truncate(len as usize);
            return Ok(FsPathBuf::from(std::ffi::OsString::from_wide(&buf)));
        }
        cap = len;
    }
}

pub fn set_cwd(p: &FsPath) -> Result<()> {
    use windows_sys::Win32::Storage::FileSystem::SetCurrentDirectoryW;
    let wide = to_wide_nul(p);
    if unsafe { SetCurrentDirectoryW(wide.as_ptr()) } == 0 {
        return Err(last_error_to_fs_error(p));
    }
    Ok(())
}

pub fn executable_path() -> Result<FsPathBuf> {
    use windows_sys::Win32::System::LibraryLoader::GetModuleFileNameW;
    let mut cap: u32 = crate::limits::PATH_ALLOC_MIN_SIZE as u32;
    loop {
        let mut buf = vec![0u16; cap as usize];
        let len = unsafe { GetModuleFileNameW(0, buf.as_mut_ptr(), cap) };
        if len == 0 {
            return Err(last_error_to_fs_error(FsPathBuf::from("").as_path()));
        }
        if (len as usize) < buf.len() {
            buf.truncate(len as usize);
            return Ok(FsPathBuf::from(std::ffi::OsString::from_wide(&buf)));
        }
        cap *= crate::limits::DIRENT_ALLOC_GROWTH_FACTOR as u32;
    }
}

pub fn preference_path(org: &str, app: &str) -> Result<FsPathBuf> {
    let base = env::appdata()
        .ok_or_else(|| FsError::new(FsErrorKind::NotFound).with_path("%APPDATA%"))?;
    let mut path = FsPathBuf::from(base);
    crate::path::append(&mut path, FsPathBuf::from(org).as_path());
    crate::path::append(&mut path, FsPathBuf::from(app).as_path());
    crate::mutation::create_directories(path.as_path(), 0)?;
    Ok(path)
}

pub fn temporary_path() -> Result<FsPathBuf> {
    env::windows_temp_dir()
        .map(FsPathBuf::from)
        .ok_or_else(|| FsError::new(FsErrorKind::NotFound).with_path("%TEMP%/%TMP%"))
}
