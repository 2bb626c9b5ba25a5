use crate::error::Result;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically write `data` to `path` using a tempfile in the same directory.
/// Prevents partial writes from corrupting state files.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Append text to a file, creating it and its parents if needed.
pub fn append_text(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut f = OpenOptions::new().create(true).append(true).open(path)?;
    f.write_all(text.as_bytes())?;
    Ok(())
}

/// Read a small file under a shared advisory lock. A missing file reads as
/// `None`.
pub fn locked_read(path: &Path) -> Result<Option<String>> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    file.lock_shared()?;
    let mut content = String::new();
    (&file).read_to_string(&mut content)?;
    file.unlock()?;
    Ok(Some(content))
}

/// Overwrite a small file under an exclusive advisory lock.
///
/// The file is truncated only after the lock is held, so a concurrent
/// `locked_read` never observes it empty.
pub fn locked_write(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    #[allow(clippy::suspicious_open_options)]
    let file = OpenOptions::new().write(true).create(true).open(path)?;
    file.lock_exclusive()?;
    file.set_len(0)?;
    (&file).write_all(content.as_bytes())?;
    (&file).flush()?;
    file.unlock()?;
    Ok(())
}
