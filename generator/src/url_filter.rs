use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use anyhow::{Context as _, anyhow};
use normalize_path::NormalizePath as _;
use tera::Value;

/// The `url` template filter.
///
/// `{{ "/css/site.css" | url }}` becomes `file:///<build root>/css/site.css`, so pages
/// opened straight from the build dir still find the other build outputs. Anything that
/// doesn't start with `/` is left as is.
#[derive(Debug, Clone)]
pub struct UrlFilter {
    build_root: PathBuf,
}

impl UrlFilter {
    /// `build_root` must be absolute.
    pub fn new(build_root: impl Into<PathBuf>) -> Self {
        Self {
            build_root: build_root.into(),
        }
    }
}

impl tera::Filter for UrlFilter {
    fn filter(&self, value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
        let raw = value.as_str().ok_or_else(|| {
            tera::Error::msg(format!("filter `url` expects a string, got: {value}"))
        })?;

        rewrite(raw, &self.build_root)
            .map(Value::String)
            .map_err(|e| tera::Error::msg(format!("{e:#}")))
    }
}

/// Rewrite a root-relative path into a `file://` url under `build_root`.
pub fn rewrite(raw: &str, build_root: &Path) -> anyhow::Result<String> {
    let path = raw.trim();

    if !path.starts_with('/') {
        return Ok(path.to_string());
    }

    let rel_path = Path::new(path.trim_start_matches('/'))
        .try_normalize()
        .with_context(|| format!("the path points outside the build dir: {path}"))?;

    let url = url::Url::from_file_path(build_root.join(rel_path))
        .map_err(|()| anyhow!("build root isn't absolute: {}", build_root.display()))?;

    Ok(url.to_string())
}
