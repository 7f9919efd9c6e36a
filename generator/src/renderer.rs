use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context as _, bail, ensure};
use tera::Tera;

use crate::{
    fs_util,
    i18n::{Gettext, Ngettext, Trans, Translations},
    url_filter::UrlFilter,
};

/// Variables every page template gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderParams<'a> {
    /// `__site`: first segment of the template path, empty for top-level pages.
    pub site: &'a str,
    /// `__branch`: the build label given on the command line.
    pub branch: &'a str,
    /// `__template`: the template path itself.
    pub template: &'a str,
}

impl RenderParams<'_> {
    fn to_context(self) -> tera::Context {
        let mut ctx = tera::Context::new();
        ctx.insert("__site", self.site);
        ctx.insert("__branch", self.branch);
        ctx.insert("__template", self.template);
        ctx
    }
}

/// Only files with these extensions under the templates dir are loaded as templates,
/// anything else (scripts, images) is left alone.
pub const TEMPLATE_EXTENSIONS: [&str; 4] = ["html", "htm", "xml", "txt"];

pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    /// Load every template under `templates_dir`, see [`TEMPLATE_EXTENSIONS`].
    ///
    /// `build_root` is what root-relative paths given to the `url` filter resolve against,
    /// it has to be absolute.
    pub fn new(
        templates_dir: impl AsRef<Path>,
        build_root: impl Into<PathBuf>,
        translations: Translations,
    ) -> anyhow::Result<Self> {
        let templates_dir = templates_dir.as_ref();

        let files = template_files(templates_dir)
            .with_context(|| format!("failed to list templates: {}", templates_dir.display()))?;

        let mut tera = Tera::default();
        tera.add_template_files(files)
            .with_context(|| format!("failed to load templates: {}", templates_dir.display()))?;

        let translations = Arc::new(translations);
        tera.set_escape_fn(escape_markup);
        tera.register_filter("url", UrlFilter::new(build_root));
        tera.register_filter("trans", Trans(translations.clone()));
        tera.register_function("gettext", Gettext(translations.clone()));
        tera.register_function("ngettext", Ngettext(translations));

        Ok(Self { tera })
    }

    pub fn has_template(&self, template: &str) -> bool {
        self.tera.get_template_names().any(|name| name == template)
    }

    pub fn render(&self, template: &str, params: RenderParams) -> anyhow::Result<String> {
        if !self.has_template(template) {
            bail!("template not found: {template}");
        }

        self.tera
            .render(template, &params.to_context())
            .with_context(|| format!("failed to render template: {template}"))
    }

    /// Render `template` into the same relative path under `out_root`.
    ///
    /// Nothing is written when rendering fails.
    pub fn render_page(
        &self,
        template: &str,
        params: RenderParams,
        out_root: impl AsRef<Path>,
    ) -> anyhow::Result<PathBuf> {
        let content = self.render(template, params)?;

        let dst_path = template
            .split('/')
            .fold(out_root.as_ref().to_path_buf(), |path, seg| path.join(seg));

        if let Some(parent) = dst_path.parent() {
            fs_util::ensure_dir(parent)?;
        }
        fs_util::write_text(&content, &dst_path)
            .with_context(|| format!("failed to write page: {}", dst_path.display()))?;

        ensure!(
            dst_path.try_exists()?,
            "page missing after write: {}",
            dst_path.display()
        );

        Ok(dst_path)
    }
}

/// `(path, name)` of every template, the name being the `/`-separated path relative to
/// `templates_dir`.
fn template_files(templates_dir: &Path) -> anyhow::Result<Vec<(PathBuf, Option<String>)>> {
    let walker = ignore::WalkBuilder::new(templates_dir)
        .standard_filters(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut files = Vec::new();

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }

        let path = entry.path();
        let is_template = path
            .extension()
            .and_then(|x| x.to_str())
            .is_some_and(|x| TEMPLATE_EXTENSIONS.contains(&x));
        if !is_template {
            log::debug!("not a template, skip: {}", path.display());
            continue;
        }

        let name = path
            .strip_prefix(templates_dir)?
            .iter()
            .map(|seg| seg.to_str().context("template path isn't valid utf-8"))
            .collect::<anyhow::Result<Vec<_>>>()?
            .join("/");

        log::debug!("load template: {name}");
        files.push((path.to_path_buf(), Some(name)));
    }

    Ok(files)
}

/// HTML escaping for autoescaped templates. Unlike tera's default it leaves `/` alone,
/// so urls stay readable.
fn escape_markup(input: &str) -> String {
    let mut output = String::with_capacity(input.len());

    for c in input.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&#34;"),
            '\'' => output.push_str("&#39;"),
            _ => output.push(c),
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    const PARAMS: RenderParams = RenderParams {
        site: "cz",
        branch: "devel",
        template: "cz/index.html",
    };

    fn setup(templates: &[(&str, &str)]) -> (tempfile::TempDir, Renderer) {
        let tmp = tempfile::tempdir().unwrap();
        let templates_dir = tmp.path().join("templates");

        for (name, content) in templates {
            let path = templates_dir.join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }

        let renderer =
            Renderer::new(&templates_dir, "/srv/build", Translations::default()).unwrap();
        (tmp, renderer)
    }

    #[test]
    fn params_and_url() {
        let (_tmp, renderer) = setup(&[(
            "cz/index.html",
            r#"{{ __site }}|{{ __branch }}|{{ __template }}|{{ "/css/a.css" | url }}"#,
        )]);

        let out = renderer.render("cz/index.html", PARAMS).unwrap();
        assert_eq!(out, "cz|devel|cz/index.html|file:///srv/build/css/a.css");
    }

    #[test]
    fn inheritance() {
        let (_tmp, renderer) = setup(&[
            (
                "_layouts/page.html",
                "<title>{% block title %}{% endblock %}</title>",
            ),
            (
                "cz/index.html",
                r#"{% extends "_layouts/page.html" %}{% block title %}DevConf.CZ {{ __branch }}{% endblock %}"#,
            ),
        ]);

        let out = renderer.render("cz/index.html", PARAMS).unwrap();
        assert_eq!(out, "<title>DevConf.CZ devel</title>");
    }

    #[test]
    fn autoescape() {
        let (_tmp, renderer) = setup(&[(
            "cz/index.html",
            r#"{% set link = "<a href='/x'>&</a>" %}{{ link }}"#,
        )]);

        let out = renderer.render("cz/index.html", PARAMS).unwrap();
        assert_eq!(out, "&lt;a href=&#39;/x&#39;&gt;&amp;&lt;/a&gt;");
    }

    #[test]
    fn other_files_are_not_templates() {
        let (_tmp, renderer) = setup(&[
            ("cz/index.html", "cz"),
            ("js/vue-snippet.js", "{{ item.name }"),
            ("robots.txt", "User-agent: {{ __site }}"),
        ]);

        assert!(renderer.has_template("cz/index.html"));
        assert!(renderer.has_template("robots.txt"));
        assert!(!renderer.has_template("js/vue-snippet.js"));
        assert!(renderer.render("js/vue-snippet.js", PARAMS).is_err());
    }

    #[test]
    fn render_page_writes_nested() {
        let (tmp, renderer) = setup(&[("cz/2017/index.html", "2017")]);
        let out_root = tmp.path().join("build");

        let path = renderer
            .render_page("cz/2017/index.html", PARAMS, &out_root)
            .unwrap();

        assert_eq!(path, out_root.join("cz").join("2017").join("index.html"));
        assert_eq!(fs::read_to_string(path).unwrap(), "2017");
    }

    #[test]
    fn missing_template_writes_nothing() {
        let (tmp, renderer) = setup(&[("index.html", "home")]);
        let out_root = tmp.path().join("build");

        let err = renderer
            .render_page("cz/index.html", PARAMS, &out_root)
            .unwrap_err();

        assert!(err.to_string().contains("template not found"));
        assert!(!out_root.join("cz/index.html").exists());
    }

    #[test]
    fn render_error_writes_nothing() {
        let (tmp, renderer) = setup(&[("cz/index.html", "{{ not_defined }}")]);
        let out_root = tmp.path().join("build");

        assert!(
            renderer
                .render_page("cz/index.html", PARAMS, &out_root)
                .is_err()
        );
        assert!(!out_root.join("cz/index.html").exists());
    }
}
