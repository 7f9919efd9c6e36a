use std::{
    fs,
    path::{Component, Path, PathBuf},
};

use anyhow::{Context as _, bail};
use normalize_path::NormalizePath as _;
use serde::Deserialize;

use crate::renderer::TEMPLATE_EXTENSIONS;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_build_dir")]
    pub build_dir: PathBuf,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    #[serde(default = "default_templates_dir")]
    pub templates_dir: PathBuf,
    #[serde(default = "default_i18n_dir")]
    pub i18n_dir: PathBuf,
    /// Catalogs are read from `<i18n_dir>/<locale>/LC_MESSAGES/<i18n_domain>.mo`.
    #[serde(default = "default_i18n_domain")]
    pub i18n_domain: String,

    #[serde(default = "default_locale")]
    pub default_locale: String,
    #[serde(default = "default_locales")]
    pub locales: Vec<String>,

    /// Templates to render, in order. Each one is written to the same relative path
    /// under `build_dir`.
    #[serde(default = "default_pages")]
    pub pages: Vec<String>,

    /// Directory the relative paths above were resolved against.
    #[serde(skip)]
    pub source_dir: PathBuf,
}

pub const CONFIG_FILE: &str = "config.yaml";

const PAGES: [&str; 9] = [
    "index.html",
    "media-policy.html",
    "coc.html",
    "speaker-agreement.html",
    "cz/index.html",
    "cz/2017/index.html",
    "cz/2017/roadshow-bratislava.html",
    "cz/2017/roadshow-prague.html",
    "cz/2018/index.html",
];

impl Default for Config {
    fn default() -> Self {
        Self {
            build_dir: default_build_dir(),
            static_dir: default_static_dir(),
            templates_dir: default_templates_dir(),
            i18n_dir: default_i18n_dir(),
            i18n_domain: default_i18n_domain(),
            default_locale: default_locale(),
            locales: default_locales(),
            pages: default_pages(),
            source_dir: PathBuf::new(),
        }
    }
}

impl Config {
    /// Read the config, relative paths in it are relative to the config file.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();

        let file = fs::File::open(path)
            .with_context(|| format!("failed to open config: {}", path.display()))?;
        let config: Self = serde_yaml::from_reader(file)
            .with_context(|| format!("failed to parse config: {}", path.display()))?;

        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(config.relative_to(base_dir))
    }

    pub fn relative_to(mut self, base_dir: impl AsRef<Path>) -> Self {
        let base_dir = base_dir.as_ref();

        for dir in [
            &mut self.build_dir,
            &mut self.static_dir,
            &mut self.templates_dir,
            &mut self.i18n_dir,
        ] {
            *dir = base_dir.join(&*dir);
        }
        self.source_dir = base_dir.to_path_buf();

        self
    }

    /// Check that every page names an existing template inside `templates_dir`, and that
    /// cleaning `build_dir` can't take any of the sources with it.
    pub fn validate(&self) -> anyhow::Result<()> {
        let build_dir = absolute(&self.build_dir)?;
        for src_dir in [
            &self.source_dir,
            &self.static_dir,
            &self.templates_dir,
            &self.i18n_dir,
        ] {
            if absolute(src_dir)?.starts_with(&build_dir) {
                bail!(
                    "build dir {} would contain the sources in {}",
                    self.build_dir.display(),
                    src_dir.display()
                );
            }
        }

        for page in &self.pages {
            let is_plain_relative = !page.is_empty()
                && Path::new(page)
                    .components()
                    .all(|c| matches!(c, Component::Normal(_)));
            if !is_plain_relative {
                bail!("page must be a relative path inside the templates dir: {page:?}");
            }

            let is_template = Path::new(page)
                .extension()
                .and_then(|x| x.to_str())
                .is_some_and(|x| TEMPLATE_EXTENSIONS.contains(&x));
            if !is_template {
                bail!(
                    "page must have one of the template extensions {TEMPLATE_EXTENSIONS:?}: {page:?}"
                );
            }

            let template = self.templates_dir.join(page);
            if !template.is_file() {
                bail!("template not found: {}", template.display());
            }
        }

        Ok(())
    }
}

/// Absolute and without `.`/`..`, so paths can be compared component-wise.
fn absolute(path: &Path) -> anyhow::Result<PathBuf> {
    let path = if path.as_os_str().is_empty() {
        Path::new(".")
    } else {
        path
    };

    let abs = std::path::absolute(path)
        .with_context(|| format!("failed to get absolute path of: {}", path.display()))?;
    Ok(abs.normalize())
}

fn default_build_dir() -> PathBuf {
    "build".into()
}
fn default_static_dir() -> PathBuf {
    "static".into()
}
fn default_templates_dir() -> PathBuf {
    "templates".into()
}
fn default_i18n_dir() -> PathBuf {
    "i18n".into()
}
fn default_i18n_domain() -> String {
    "messages".into()
}
fn default_locale() -> String {
    "en_US".into()
}
fn default_locales() -> Vec<String> {
    ["en", "cs", "sk"].map(String::from).to_vec()
}
fn default_pages() -> Vec<String> {
    PAGES.map(String::from).to_vec()
}
