use std::{fs, path::PathBuf};

use anyhow::Context as _;

use crate::{
    config::Config,
    i18n::Translations,
    renderer::{RenderParams, Renderer},
    static_dir::{self, StageReport},
};

pub const DEFAULT_BRANCH: &str = "devel";

#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Build label handed to every template as `__branch`.
    pub branch: String,
    /// Remove the previous build dir first.
    pub clean: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            branch: DEFAULT_BRANCH.to_string(),
            clean: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub staged: StageReport,
    /// Every written page, in render order.
    pub pages: Vec<PathBuf>,
}

pub struct Generator {
    config: Config,
    options: BuildOptions,
    build_root: PathBuf,
    renderer: Renderer,
}

impl Generator {
    /// Check the config and load templates and catalogs. Nothing on disk is touched yet.
    pub fn new(config: Config, options: BuildOptions) -> anyhow::Result<Self> {
        config.validate().context("invalid config")?;

        let build_root = std::path::absolute(&config.build_dir).with_context(|| {
            format!(
                "failed to get absolute path of build dir: {}",
                config.build_dir.display()
            )
        })?;

        let translations = Translations::load(
            &config.i18n_dir,
            &config.i18n_domain,
            &config.locales,
            &config.default_locale,
        )?;

        log::info!("load templates from: {}", config.templates_dir.display());
        let renderer = Renderer::new(&config.templates_dir, &build_root, translations)?;

        Ok(Self {
            config,
            options,
            build_root,
            renderer,
        })
    }

    pub fn build(self) -> anyhow::Result<BuildReport> {
        if self.options.clean {
            self.clean()?;
        }

        log::info!("copy static dir: {}", self.config.static_dir.display());
        let staged = static_dir::stage(&self.config.static_dir, &self.build_root)?;

        let mut pages = Vec::with_capacity(self.config.pages.len());

        for template in &self.config.pages {
            let params = RenderParams {
                site: site_of(template),
                branch: &self.options.branch,
                template,
            };

            log::debug!("render: {template} (site: {:?})", params.site);
            let path = self
                .renderer
                .render_page(template, params, &self.build_root)?;
            pages.push(path);
        }

        log::info!(
            "built {} pages into {}",
            pages.len(),
            self.build_root.display()
        );

        Ok(BuildReport { staged, pages })
    }

    fn clean(&self) -> anyhow::Result<()> {
        if self.build_root.try_exists()? {
            log::debug!("clean up old build: {}", self.build_root.display());
            fs::remove_dir_all(&self.build_root).with_context(|| {
                format!("failed to remove build dir: {}", self.build_root.display())
            })?;
        }

        Ok(())
    }
}

/// `cz/2017/index.html` -> `cz`
/// `index.html` -> ``
pub fn site_of(template: &str) -> &str {
    template.split_once('/').map_or("", |(site, _)| site)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_segment() {
        assert_eq!(site_of("cz/2017/index.html"), "cz");
        assert_eq!(site_of("cz/index.html"), "cz");
        assert_eq!(site_of("index.html"), "");
        assert_eq!(site_of(""), "");
    }

    #[test]
    fn default_options() {
        let options = BuildOptions::default();
        assert_eq!(options.branch, "devel");
        assert!(!options.clean);
    }

    #[test]
    fn invalid_config_touches_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("templates")).unwrap();
        fs::create_dir_all(tmp.path().join("build")).unwrap();
        fs::write(tmp.path().join("build/old.html"), "old").unwrap();

        let config = Config::default().relative_to(tmp.path());
        let options = BuildOptions {
            clean: true,
            ..BuildOptions::default()
        };

        assert!(Generator::new(config, options).is_err());
        assert!(tmp.path().join("build/old.html").is_file());
    }
}
