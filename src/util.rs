use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Writes `content` to a hidden sibling of `path`, then renames it into place.
pub fn write_string_atomic(path: &Path, content: &str) -> io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let tmp = tmp_path_next_to(path);
    if let Err(e) = fs::write(&tmp, content.as_bytes()) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    fs::rename(&tmp, path)
}

pub fn tmp_path_next_to(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let file = path
        .file_name()
        .unwrap_or_else(|| std::ffi::OsStr::new("tmp"));
    parent.join(format!(
        ".{}.tmp.{}",
        file.to_string_lossy(),
        std::process::id()
    ))
}
