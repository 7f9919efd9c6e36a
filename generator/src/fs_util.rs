use std::{fs, io::Write as _, path::Path};

/// Create `path` and all of its missing ancestors. No-op if it already exists.
pub fn ensure_dir(path: impl AsRef<Path>) -> std::io::Result<()> {
    let path = path.as_ref();

    if !path.try_exists()? {
        log::debug!("create dir: {}", path.display());
        fs::create_dir_all(path)?;
    }

    Ok(())
}

/// Create or truncate the file at `path` and write `content` into it.
///
/// The parent directory must already exist, see [`ensure_dir`].
pub fn write_text(content: &str, path: impl AsRef<Path>) -> std::io::Result<()> {
    let path = path.as_ref();

    log::info!("export to: {}", path.display());
    fs::OpenOptions::new()
        .write(true)
        .truncate(true)
        .create(true)
        .open(path)?
        .write_all(content.as_bytes())
}
