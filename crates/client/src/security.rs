// Owner-only permissions for files that hold credentials or settings.

use std::fs;
use std::io;
use std::path::Path;

pub fn ensure_owner_only_file(path: &Path) -> io::Result<()> {
    set_mode_if_present(path, 0o600)
}

pub fn ensure_owner_only_dir(path: &Path) -> io::Result<()> {
    set_mode_if_present(path, 0o700)
}

/// Write `contents` to `path` through a sibling temp file and a rename, so a
/// reader never observes a half-written file.
pub fn write_private_file(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
            ensure_owner_only_dir(parent)?;
        }
    }

    let mut tmp_name = path.file_name().map(|name| name.to_os_string()).unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    fs::write(&tmp_path, contents)?;
    ensure_owner_only_file(&tmp_path)?;
    fs::rename(&tmp_path, path)
}

#[cfg(unix)]
fn set_mode_if_present(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    if !path.exists() {
        return Ok(());
    }
    let current = fs::metadata(path)?.permissions().mode() & 0o777;
    if current != mode {
        fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn set_mode_if_present(path: &Path, mode: u32) -> io::Result<()> {
    let _ = (path, mode);
    Ok(())
}
