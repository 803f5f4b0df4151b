//! Atomic single-file copy.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use filetime::FileTime;

const TEMP_PREFIX: &str = ".stage-collect-";

/// Copy `src` to `dst` unless `dst` already exists.
///
/// Contents are written to a temporary file in the destination directory,
/// permissions and access/modification times are carried over, and the file
/// is then renamed into place without clobbering. An interrupted copy never
/// leaves a file under the final name.
///
/// Returns `Ok(false)` when `dst` already existed (including when it appeared
/// between the existence check and the rename).
pub fn copy_file_atomic(src: &Path, dst: &Path) -> io::Result<bool> {
    if dst.exists() {
        return Ok(false);
    }

    let dst_dir = dst.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("destination has no parent directory: {}", dst.display()),
        )
    })?;

    let meta = fs::metadata(src)?;
    let mut reader = File::open(src)?;
    let mut tmp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .tempfile_in(dst_dir)?;

    io::copy(&mut reader, tmp.as_file_mut())?;
    tmp.as_file().sync_all()?;

    let atime = FileTime::from_last_access_time(&meta);
    let mtime = FileTime::from_last_modification_time(&meta);
    filetime::set_file_handle_times(tmp.as_file(), Some(atime), Some(mtime))?;
    tmp.as_file().set_permissions(meta.permissions())?;

    match tmp.persist_noclobber(dst) {
        Ok(_) => Ok(true),
        Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(e.error),
    }
}
