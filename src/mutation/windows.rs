use std::os::windows::io::{AsRawHandle, FromRawHandle, OwnedHandle};

use windows_sys::Win32::Foundation::{GetLastError, ERROR_ALREADY_EXISTS, HANDLE, INVALID_HANDLE_VALUE};
use windows_sys::Win32::Storage::FileSystem::{
    CreateDirectoryW, CreateFileW, CreateHardLinkW, DeleteFileW, MoveFileExW, ReadFile,
    RemoveDirectoryW, SetFileTime, WriteFile, CREATE_ALWAYS, CREATE_NEW, FILE_GENERIC_READ,
    FILE_GENERIC_WRITE, FILE_SHARE_DELETE, FILE_SHARE_READ, FILE_SHARE_WRITE,
    MOVEFILE_REPLACE_EXISTING, OPEN_ALWAYS,
};
use windows_sys::Win32::System::SystemInformation::GetSystemTimeAsFileTime;

use crate::error::{FsError, Result};
use crate::path::{FsPath, FsPathBuf};
use crate::query;

use super::{CopyFileOption, CreateDirectoryOutcome};

fn to_wide_nul(p: &FsPath) -> Vec<u16> {
    let mut v: Vec<u16> = p.to_vec();
    v.push(0);
    v
}

fn last_error(p: &FsPath) -> FsError {
    let code = unsafe { GetLastError() };
    FsError::from_io(std::io::Error::from_raw_os_error(code as i32), FsPathBuf::from(p))
}

pub fn touch(p: &FsPath, _perms: u32) -> Result<()> {
    let wide = to_wide_nul(p);
    let handle = unsafe {
        CreateFileW(
            wide.as_ptr(),
            FILE_GENERIC_WRITE,
            FILE_SHARE_READ | FILE_SHARE_WRITE | FILE_SHARE_DELETE,
            std::ptr::null(),
            OPEN_ALWAYS,
            0,
            0,
        )
    };
    if handle == INVALID_HANDLE_VALUE {
        return Err(last_error(p));
    }
    let handle = unsafe { OwnedHandle::from_raw_handle(handle as _) };
    let mut now: windows_sys::Win32::Foundation::FILETIME = unsafe { std::mem::zeroed() };
    unsafe { GetSystemTimeAsFileTime(&mut now) };
    let raw = handle.as_raw_handle() as HANDLE;
    if unsafe { SetFileTime(raw, std::ptr::null(), &now, &now) } == 0 {
        return Err(last_error(p));
    }
    Ok(())
}

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

    let src_wide = to_wide_nul(from);
    let src_handle = unsafe {
        CreateFileW(
            src_wide.as_ptr(),
            FILE_GENERIC_READ,
            FILE_SHARE_READ,
            std::ptr::null(),
            windows_sys::Win32::Storage::FileSystem::OPEN_EXISTING,
            0,
            0,
        )
    };
    if src_handle == INVALID_HANDLE_VALUE {
        return Err(last_error(from));
    }
    let src_handle = unsafe { OwnedHandle::from_raw_handle(src_handle as _) };

    let dst_wide = to_wide_nul(to);
    let disposition = match option {
        CopyFileOption::FailIfExists => CREATE_NEW,
        _ => CREATE_ALWAYS,
    };
    let dst_handle = unsafe {
        CreateFileW(
            dst_wide.as_ptr(),
            FILE_GENERIC_WRITE,
            0,
            std::ptr::null(),
            disposition,
            0,
            0,
        )
    };
    if dst_handle == INVALID_HANDLE_VALUE {
        return Err(last_error(to));
    }
    let dst_handle = unsafe { OwnedHandle::from_raw_handle(dst_handle as _) };

    let src_raw = src_handle.as_raw_handle() as HANDLE;
    let dst_raw = dst_handle.as_raw_handle() as HANDLE;
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let mut read: u32 = 0;
        if unsafe {
            ReadFile(
                src_raw,
                buf.as_mut_ptr(),
                buf.len() as u32,
                &mut read,
                std::ptr::null_mut(),
            )
        } == 0
        {
            return Err(last_error(from));
        }
        if read == 0 {
            return Ok(());
        }
        let mut written: u32 = 0;
        if unsafe {
            WriteFile(
                dst_raw,
                buf.as_ptr(),
                read,
                &mut written,
                std::ptr::null_mut(),
            )
        } == 0
        {
            return Err(last_error(to));
        }
    }
}

pub fn create_directory(p: &FsPath, _perms: u32) -> Result<CreateDirectoryOutcome> {
    let wide = to_wide_nul(p);
    if unsafe { CreateDirectoryW(wide.as_ptr(), std::ptr::null()) } != 0 {
        return Ok(CreateDirectoryOutcome::Created);
    }
    let code = unsafe { GetLastError() };
    if code == ERROR_ALREADY_EXISTS && query::get_filesystem_type(p)? == query::FileType::Directory {
        return Ok(CreateDirectoryOutcome::AlreadyExisted);
    }
    Err(FsError::from_io(std::io::Error::from_raw_os_error(code as i32), FsPathBuf::from(p)))
}

pub fn create_hard_link(target: &FsPath, link: &FsPath) -> Result<()> {
    let target_wide = to_wide_nul(target);
    let link_wide = to_wide_nul(link);
    if unsafe { CreateHardLinkW(link_wide.as_ptr(), target_wide.as_ptr(), std::ptr::null()) } == 0 {
        return Err(last_error(link));
    }
    Ok(())
}

pub fn create_symlink(target: &FsPath, link: &FsPath) -> Result<()> {
    use windows_sys::Win32::Storage::FileSystem::{
        CreateSymbolicLinkW, SYMBOLIC_LINK_FLAG_DIRECTORY,
    };
    let target_wide = to_wide_nul(target);
    let link_wide = to_wide_nul(link);
    let flags = if query::get_filesystem_type(target).ok() == Some(query::FileType::Directory) {
        SYMBOLIC_LINK_FLAG_DIRECTORY
    } else {
        0
    };
    if unsafe { CreateSymbolicLinkW(link_wide.as_ptr(), target_wide.as_ptr(), flags) } == 0 {
        return Err(last_error(link));
    }
    Ok(())
}

pub fn move_path(from: &FsPath, to: &FsPath) -> Result<()> {
    let from_wide = to_wide_nul(from);
    let to_wide = to_wide_nul(to);
    if unsafe { MoveFileExW(from_wide.as_ptr(), to_wide.as_ptr(), MOVEFILE_REPLACE_EXISTING) } == 0 {
        return Err(last_error(from));
    }
    Ok(())
}

pub fn remove_file(p: &FsPath) -> Result<()> {
    let wide = to_wide_nul(p);
    if unsafe { DeleteFileW(wide.as_ptr()) } == 0 {
        return Err(last_error(p));
    }
    Ok(())
}

pub fn remove_empty_directory(p: &FsPath) -> Result<()> {
    let wide = to_wide_nul(p);
    if unsafe { RemoveDirectoryW(wide.as_ptr()) } == 0 {
        return Err(last_error(p));
    }
    Ok(())
}
