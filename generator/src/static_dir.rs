use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context as _;

use crate::fs_util;

/// What [`stage`] did with each top-level entry of the static dir.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub copied: Vec<OsString>,
    /// Entries left alone because the destination already had them.
    pub skipped: Vec<OsString>,
}

/// Copy every top-level entry of `src_dir` into `dst_dir`.
///
/// An entry that already exists in `dst_dir` is skipped with a warning, never merged
/// or overwritten.
pub fn stage(src_dir: impl AsRef<Path>, dst_dir: impl AsRef<Path>) -> anyhow::Result<StageReport> {
    let src_dir = src_dir.as_ref();
    let dst_dir = dst_dir.as_ref();

    let mut entries = fs::read_dir(src_dir)
        .with_context(|| format!("failed to read static dir: {}", src_dir.display()))?
        .map(|entry| entry.map(|e| e.file_name()))
        .collect::<Result<Vec<_>, _>>()?;
    entries.sort();

    fs_util::ensure_dir(dst_dir)?;

    let mut report = StageReport::default();

    for name in entries {
        let from_path = src_dir.join(&name);
        let to_path = dst_dir.join(&name);

        if to_path.try_exists()? {
            log::warn!("static path already exists: {}", to_path.display());
            report.skipped.push(name);
            continue;
        }

        log::debug!("copy static to build dir: {}", to_path.display());
        copy_recursive(&from_path, &to_path).with_context(|| {
            format!(
                "failed to copy {} to {}",
                from_path.display(),
                to_path.display()
            )
        })?;
        report.copied.push(name);
    }

    Ok(report)
}

fn copy_recursive(from_path: &Path, to_path: &Path) -> anyhow::Result<()> {
    if !from_path.is_dir() {
        fs::copy(from_path, to_path)?;
        return Ok(());
    }

    let walker = ignore::WalkBuilder::new(from_path)
        .standard_filters(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    for entry in walker {
        let entry = entry?;
        let rel_path = entry.path().strip_prefix(from_path)?;
        let dst_path: PathBuf = to_path.join(rel_path);

        if entry.file_type().is_some_and(|t| t.is_dir()) {
            fs::create_dir_all(&dst_path)?;
        } else {
            fs::copy(entry.path(), &dst_path)?;
        }
    }

    Ok(())
}
