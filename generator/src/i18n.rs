//! Translation catalogs for templates.
//!
//! Catalogs are compiled gettext `.mo` files laid out the usual way,
//! `<i18n dir>/<locale>/LC_MESSAGES/<domain>.mo`:
//!
//! ```text
//! pybabel extract -F babel.cfg -o ./i18n/messages.pot ./
//! pybabel init -l cs_CZ -d ./i18n -i ./i18n/messages.pot
//! pybabel compile -f -d ./i18n
//! ```
//!
//! Templates look messages up with the `gettext`/`ngettext` functions or the `trans` filter:
//!
//! ```text
//! {{ gettext(msgid="How to get here?") }}
//! {{ ngettext(singular="{n} talk", plural="{n} talks", n=talks | length) }}
//! {{ "How to get here?" | trans(locale="cs") }}
//! ```
//!
//! A message missing from every catalog renders untranslated.

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::Path,
    sync::Arc,
};

use anyhow::Context as _;
use gettext::Catalog;
use tera::Value;

#[derive(Default)]
pub struct Translations {
    catalogs: BTreeMap<String, Catalog>,
    default_locale: String,
    active_locale: String,
}

impl Translations {
    /// Load the `domain` catalogs of `locales` from `dir`. Locales without a catalog are
    /// skipped.
    pub fn load(
        dir: impl AsRef<Path>,
        domain: &str,
        locales: &[String],
        default_locale: &str,
    ) -> anyhow::Result<Self> {
        let dir = dir.as_ref();

        let mut catalogs = BTreeMap::new();
        let mut active_locale = None;

        // the default locale is the fallback for every lookup, so it's loaded even
        // when it isn't listed
        let wanted = locales
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(default_locale));

        for locale in wanted {
            if catalogs.contains_key(locale) {
                continue;
            }

            let path = dir
                .join(locale)
                .join("LC_MESSAGES")
                .join(format!("{domain}.mo"));
            if !path.try_exists()? {
                log::debug!("no catalog for locale `{locale}`: {}", path.display());
                continue;
            }

            log::debug!("load catalog: {}", path.display());
            let file = fs::File::open(&path)
                .with_context(|| format!("failed to open catalog: {}", path.display()))?;
            let catalog = Catalog::parse(file)
                .with_context(|| format!("failed to parse catalog: {}", path.display()))?;

            if active_locale.is_none() && locales.iter().any(|l| l == locale) {
                active_locale = Some(locale.to_string());
            }
            catalogs.insert(locale.to_string(), catalog);
        }

        let active_locale = active_locale.unwrap_or_else(|| default_locale.to_string());
        log::debug!("active locale: {active_locale}");

        Ok(Self {
            catalogs,
            default_locale: default_locale.to_string(),
            active_locale,
        })
    }

    /// First configured locale that has a catalog, or the default locale.
    pub fn active_locale(&self) -> &str {
        &self.active_locale
    }

    pub fn translate<'a>(&'a self, locale: &str, key: &'a str) -> &'a str {
        self.fallback_chain(locale)
            .map(|catalog| catalog.gettext(key))
            .find(|&msg| msg != key)
            .unwrap_or(key)
    }

    pub fn translate_plural<'a>(
        &'a self,
        locale: &str,
        singular: &'a str,
        plural: &'a str,
        n: u64,
    ) -> &'a str {
        let untranslated = if n == 1 { singular } else { plural };

        self.fallback_chain(locale)
            .map(|catalog| catalog.ngettext(singular, plural, n))
            .find(|&msg| msg != untranslated)
            .unwrap_or(untranslated)
    }

    /// Catalogs of `locale` then of the default locale.
    fn fallback_chain<'a>(&'a self, locale: &str) -> impl Iterator<Item = &'a Catalog> {
        let locale = self.catalogs.get(locale);
        let default = self.catalogs.get(&self.default_locale);

        locale
            .into_iter()
            .chain(default.filter(|d| !locale.is_some_and(|l| std::ptr::eq(l, *d))))
    }

    fn locale_arg<'a>(&'a self, args: &'a HashMap<String, Value>) -> tera::Result<&'a str> {
        match args.get("locale") {
            Some(locale) => locale.as_str().ok_or_else(|| {
                tera::Error::msg(format!("`locale` must be a string, got: {locale}"))
            }),
            None => Ok(self.active_locale()),
        }
    }
}

fn str_arg<'a>(args: &'a HashMap<String, Value>, name: &str, callee: &str) -> tera::Result<&'a str> {
    args.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| tera::Error::msg(format!("`{callee}` needs a string `{name}`")))
}

/// The `gettext(msgid=..., locale=...)` template function.
pub struct Gettext(pub Arc<Translations>);

/// The `ngettext(singular=..., plural=..., n=..., locale=...)` template function.
pub struct Ngettext(pub Arc<Translations>);

/// The `trans(locale=...)` template filter.
pub struct Trans(pub Arc<Translations>);

impl tera::Function for Gettext {
    fn call(&self, args: &HashMap<String, Value>) -> tera::Result<Value> {
        let msgid = str_arg(args, "msgid", "gettext")?;
        let locale = self.0.locale_arg(args)?;

        Ok(Value::String(self.0.translate(locale, msgid).to_string()))
    }
}

impl tera::Function for Ngettext {
    fn call(&self, args: &HashMap<String, Value>) -> tera::Result<Value> {
        let singular = str_arg(args, "singular", "ngettext")?;
        let plural = str_arg(args, "plural", "ngettext")?;
        let n = args
            .get("n")
            .and_then(Value::as_u64)
            .ok_or_else(|| tera::Error::msg("`ngettext` needs a non-negative integer `n`"))?;
        let locale = self.0.locale_arg(args)?;

        let msg = self.0.translate_plural(locale, singular, plural, n);
        Ok(Value::String(msg.replace("{n}", &n.to_string())))
    }
}

impl tera::Filter for Trans {
    fn filter(&self, value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
        let msgid = value.as_str().ok_or_else(|| {
            tera::Error::msg(format!("filter `trans` expects a string, got: {value}"))
        })?;
        let locale = self.0.locale_arg(args)?;

        Ok(Value::String(self.0.translate(locale, msgid).to_string()))
    }
}
