use std::ffi::CString;
use std::mem::MaybeUninit;
use std::os::unix::ffi::OsStrExt;
use std::time::{Duration, SystemTime};

use crate::env;
use crate::error::{FsError, FsErrorKind, Result};
use crate::path::{FsPath, FsPathBuf};

use super::{FileId, FileType, FilesystemInfo, QueryFlags};

fn to_cstring(p: &FsPath) -> Result<CString> {
    CString::new(p).map_err(|_| {
        FsError::new(FsErrorKind::InvalidArgument).with_path(to_path_buf(p))
    })
}

fn to_path_buf(p: &FsPath) -> std::path::PathBuf {
    FsPathBuf::from(p).into()
}

fn last_os_error(p: &FsPath) -> FsError {
    FsError::from_io(std::io::Error::last_os_error(), to_path_buf(p))
}

fn file_type_from_mode(mode: libc::mode_t) -> FileType {
    match mode & libc::S_IFMT {
        libc::S_IFREG => FileType::File,
        libc::S_IFDIR => FileType::Directory,
        libc::S_IFLNK => FileType::Symlink,
        libc::S_IFIFO => FileType::Pipe,
        libc::S_IFCHR => FileType::CharacterDevice,
        libc::S_IFBLK => FileType::BlockDevice,
        libc::S_IFSOCK => FileType::Socket,
        _ => FileType::Unknown,
    }
}

fn system_time_from_statx_ts(ts: libc::statx_timestamp) -> SystemTime {
    let base = SystemTime::UNIX_EPOCH;
    if ts.tv_sec >= 0 {
        base + Duration::new(ts.tv_sec as u64, ts.tv_nsec)
    } else {
        base - Duration::new((-ts.tv_sec) as u64, 0)
    }
}

/// Single `statx` call, following symlinks by default (matching
/// `get_filesystem_info`'s contract).
fn statx(p: &FsPath, mask: libc::c_uint, flags: libc::c_int) -> Result<libc::statx> {
    let c_path = to_cstring(p)?;
    let mut buf: MaybeUninit<libc::statx> = MaybeUninit::zeroed();
    let rc = unsafe {
        libc::statx(
            libc::AT_FDCWD,
            c_path.as_ptr(),
            flags,
            mask,
            buf.as_mut_ptr(),
        )
    };
    if rc != 0 {
        return Err(last_os_error(p));
    }
    Ok(unsafe { buf.assume_init() })
}

pub fn exists(p: &FsPath, follow_symlinks: bool) -> Result<bool> {
    let flags = if follow_symlinks {
        0
    } else {
        libc::AT_SYMLINK_NOFOLLOW
    };
    match statx(p, libc::STATX_TYPE, flags) {
        Ok(_) => Ok(true),
        Err(e) if e.kind == FsErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

pub fn get_filesystem_info(p: &FsPath, mask: QueryFlags) -> Result<FilesystemInfo> {
    let mut statx_mask = 0u32;
    if mask.contains(QueryFlags::TYPE) {
        statx_mask |= libc::STATX_TYPE;
    }
    if mask.contains(QueryFlags::PERMISSIONS) {
        statx_mask |= libc::STATX_MODE;
    }
    if mask.contains(QueryFlags::ID) {
        statx_mask |= libc::STATX_INO;
    }
    if mask.contains(QueryFlags::SIZE) {
        statx_mask |= libc::STATX_SIZE;
    }
    if mask.contains(QueryFlags::FILE_TIMES) {
        statx_mask |= libc::STATX_ATIME | libc::STATX_MTIME | libc::STATX_BTIME;
    }

    let st = statx(p, statx_mask, 0)?;
    let mut info = FilesystemInfo::default();
    if mask.contains(QueryFlags::TYPE) {
        info.file_type = Some(file_type_from_mode(st.stx_mode as libc::mode_t));
    }
    if mask.contains(QueryFlags::PERMISSIONS) {
        info.permissions = Some((st.stx_mode as u32) & 0o7777);
    }
    if mask.contains(QueryFlags::ID) {
        info.id = Some(FileId {
            inode: st.stx_ino,
            device_major: st.stx_dev_major,
            device_minor: st.stx_dev_minor,
        });
    }
    if mask.contains(QueryFlags::SIZE) {
        info.size = Some(st.stx_size);
    }
    if mask.contains(QueryFlags::FILE_TIMES) {
        info.accessed = Some(system_time_from_statx_ts(st.stx_atime));
        info.modified = Some(system_time_from_statx_ts(st.stx_mtime));
        if st.stx_mask & libc::STATX_BTIME != 0 {
            info.created = Some(system_time_from_statx_ts(st.stx_btime));
        }
    }
    Ok(info)
}

pub fn get_filesystem_type_no_follow(p: &FsPath) -> Result<FileType> {
    let st = statx(p, libc::STATX_TYPE, libc::AT_SYMLINK_NOFOLLOW)?;
    Ok(file_type_from_mode(st.stx_mode as libc::mode_t))
}

pub fn canonical_path(p: &FsPath) -> Result<FsPathBuf> {
    let c_path = to_cstring(p)?;
    let resolved = unsafe { libc::realpath(c_path.as_ptr(), std::ptr::null_mut()) };
    if resolved.is_null() {
        return Err(last_os_error(p));
    }
    let bytes = unsafe { std::ffi::CStr::from_ptr(resolved).to_bytes() }.to_vec();
    unsafe {
        libc::free(resolved as *mut libc::c_void);
    }
    Ok(FsPathBuf::from(std::ffi::OsStr::from_bytes(&bytes)))
}

pub fn get_symlink_target(p: &FsPath) -> Result<FsPathBuf> {
    let c_path = to_cstring(p)?;
    let mut cap: usize = crate::limits::PATH_ALLOC_MIN_SIZE;
    loop {
        let mut buf = vec![0u8; cap];
        let n = unsafe {
            libc::readlink(
                c_path.as_ptr(),
                buf.as_mut_ptr() as *mut libc::c_char,
                buf.len(),
            )
        };
        if n < 0 {
            return Err(last_os_error(p));
        }
        let n = n as usize;
        if n < cap {
            buf.truncate(n);
            return Ok(FsPathBuf::from(std::ffi::OsStr::from_bytes(&buf)));
        }
        if cap >= crate::limits::PATH_ALLOC_MAX_SIZE {
            return Err(FsError::new(FsErrorKind::InvalidArgument).with_path(to_path_buf(p)));
        }
        cap = (cap * crate::limits::DIRENT_ALLOC_GROWTH_FACTOR).min(crate::limits::PATH_ALLOC_MAX_SIZE);
    }
}

pub fn get_cwd() -> Result<FsPathBuf> {
    let mut cap: usize = crate::limits::PATH_ALLOC_MIN_SIZE;
    loop {
        let mut buf = vec![0u8; cap];
        let ptr = unsafe { libc::getcwd(buf.as_mut_ptr() as *mut libc::c_char, buf.len()) };
        if !ptr.is_null() {
            let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
            buf.truncate(len);
            return Ok(FsPathBuf::from(std::ffi::OsStr::from_bytes(&buf)));
        }
        let err = std::io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ERANGE) {
            return Err(FsError::from_io(err, "."));
        }
        cap *= crate::limits::DIRENT_ALLOC_GROWTH_FACTOR;
    }
}

pub fn set_cwd(p: &FsPath) -> Result<()> {
    let c_path = to_cstring(p)?;
    let rc = unsafe { libc::chdir(c_path.as_ptr()) };
    if rc != 0 {
        return Err(last_os_error(p));
    }
    Ok(())
}

pub fn executable_path() -> Result<FsPathBuf> {
    get_symlink_target(FsPathBuf::from("/proc/self/exe").as_path())
}

pub fn preference_path(org: &str, app: &str) -> Result<FsPathBuf> {
    let base = env::xdg_data_home()
        .ok_or_else(|| FsError::new(FsErrorKind::NotFound).with_path("$XDG_DATA_HOME/$HOME"))?;
    let mut path = FsPathBuf::from(base);
    crate::path::append(&mut path, FsPathBuf::from(org).as_path());
    crate::path::append(&mut path, FsPathBuf::from(app).as_path());
    crate::mutation::create_directories(path.as_path(), 0o755)?;
    Ok(path)
}

pub fn temporary_path() -> Result<FsPathBuf> {
    Ok(FsPathBuf::from(env::posix_temp_dir()))
}
