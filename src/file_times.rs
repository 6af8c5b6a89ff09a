use std::path::Path;

use filetime::FileTime;

use crate::error::Result;

/// Stamp `path` with the capture times recorded in its sidecar:
/// mtime = atime = `taken_epoch`, creation time = `created_epoch`.
/// Creation time is only settable through the Win32 API; other platforms
/// get mtime/atime only.
pub fn apply_times(path: &Path, created_epoch: i64, taken_epoch: i64) -> Result<()> {
    let taken = FileTime::from_unix_time(taken_epoch, 0);
    filetime::set_file_times(path, taken, taken)?;

    #[cfg(windows)]
    win::set_creation_time(path, FileTime::from_unix_time(created_epoch, 0))?;
    #[cfg(not(windows))]
    let _ = created_epoch;

    Ok(())
}

#[cfg(windows)]
mod win {
    use std::io;
    use std::os::windows::ffi::OsStrExt;
    use std::path::Path;

    use filetime::FileTime;
    use windows::core::PCWSTR;
    use windows::Win32::Foundation::{CloseHandle, FILETIME, HANDLE};
    use windows::Win32::Storage::FileSystem::{
        CreateFileW, SetFileTime, FILE_ATTRIBUTE_NORMAL, FILE_SHARE_READ, FILE_WRITE_ATTRIBUTES,
        OPEN_EXISTING,
    };

    /// Offset between the Windows epoch (1601-01-01) and the UNIX epoch,
    /// in 100ns ticks.
    const EPOCH_OFFSET_TICKS: i64 = 116_444_736_000_000_000;

    fn windows_ticks(ft: FileTime) -> u64 {
        (ft.unix_seconds() * 10_000_000 + i64::from(ft.nanoseconds()) / 100 + EPOCH_OFFSET_TICKS)
            as u64
    }

    pub fn set_creation_time(path: &Path, created: FileTime) -> io::Result<()> {
        let wide_path: Vec<u16> = path.as_os_str().encode_wide().chain(Some(0)).collect();

        unsafe {
            let handle = CreateFileW(
                PCWSTR(wide_path.as_ptr()),
                FILE_WRITE_ATTRIBUTES.0,
                FILE_SHARE_READ,
                None,
                OPEN_EXISTING,
                FILE_ATTRIBUTE_NORMAL,
                HANDLE(0),
            )
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

            let ticks = windows_ticks(created);
            let ft = FILETIME {
                dwLowDateTime: ticks as u32,
                dwHighDateTime: (ticks >> 32) as u32,
            };
            let result = SetFileTime(handle, Some(&ft), None, None)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e));
            let _ = CloseHandle(handle);
            result
        }
    }
}
