//! Translation catalog
//!
//! String tables are Fluent resources compiled into the binary, one per
//! supported language. Keys are either a plain message id (`app-title`) or a
//! `group.item` pair, which addresses attribute `item` of message `group`:
//!
//! ```text
//! status =
//!     .loading = Loading weather…
//! ```
//!
//! makes `status.loading` resolve to "Loading weather…".

use crate::lang::Language;
use fluent::{FluentArgs, FluentBundle, FluentResource};
use std::collections::HashMap;
use thiserror::Error;

/// Localization error types
#[derive(Debug, Error)]
pub enum I18nError {
    /// A bundled resource failed to parse
    #[error("Failed to parse {language} resource: {details}")]
    Parse {
        /// Language of the broken resource
        language: Language,
        /// Parser messages
        details: String,
    },

    /// A resource could not be added to its bundle
    #[error("Failed to load {language} resource: {details}")]
    Bundle {
        /// Language of the rejected resource
        language: Language,
        /// Bundle messages
        details: String,
    },

    /// Persisting the language choice failed
    #[error("Storage error: {0}")]
    Storage(#[from] storage::KvError),
}

/// Result type for localization operations
pub type Result<T> = std::result::Result<T, I18nError>;

/// Fluent source for a language
pub fn bundled_source(language: Language) -> &'static str {
    match language {
        Language::ZhCn => include_str!("../locales/zh-CN.ftl"),
        Language::En => include_str!("../locales/en.ftl"),
        Language::Ja => include_str!("../locales/ja.ftl"),
        Language::Ko => include_str!("../locales/ko.ftl"),
        Language::Fr => include_str!("../locales/fr.ftl"),
        Language::De => include_str!("../locales/de.ftl"),
        Language::Es => include_str!("../locales/es.ftl"),
    }
}

/// Loaded string tables for every supported language
pub struct Catalog {
    bundles: HashMap<Language, FluentBundle<FluentResource>>,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("languages", &self.bundles.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Catalog {
    /// Load the string tables bundled with the application
    pub fn bundled() -> Result<Self> {
        let mut catalog = Self { bundles: HashMap::new() };
        for language in Language::ALL {
            catalog.add_source(language, bundled_source(language).to_string())?;
        }
        Ok(catalog)
    }

    /// Create a catalog from explicit sources (used for tests and overrides)
    pub fn from_sources<I>(sources: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Language, String)>,
    {
        let mut catalog = Self { bundles: HashMap::new() };
        for (language, source) in sources {
            catalog.add_source(language, source)?;
        }
        Ok(catalog)
    }

    fn add_source(&mut self, language: Language, source: String) -> Result<()> {
        let resource = FluentResource::try_new(source).map_err(|(_, errors)| I18nError::Parse {
            language,
            details: format!("{:?}", errors),
        })?;

        let bundle = self.bundles.entry(language).or_insert_with(|| {
            let mut bundle = FluentBundle::new(vec![language.langid()]);
            bundle.set_use_isolating(false);
            bundle
        });

        bundle.add_resource(resource).map_err(|errors| I18nError::Bundle {
            language,
            details: format!("{:?}", errors),
        })
    }

    /// Whether a language has any strings loaded
    pub fn has_language(&self, language: Language) -> bool {
        self.bundles.contains_key(&language)
    }

    /// Look up `key` in one language only
    pub fn lookup(
        &self,
        language: Language,
        key: &str,
        args: Option<&FluentArgs>,
    ) -> Option<String> {
        let bundle = self.bundles.get(&language)?;
        let (id, attribute) = split_key(key);
        let message = bundle.get_message(id)?;

        let pattern = match attribute {
            Some(name) => message.get_attribute(name)?.value(),
            None => message.value()?,
        };

        let mut errors = Vec::new();
        let value = bundle.format_pattern(pattern, args, &mut errors);
        if !errors.is_empty() {
            tracing::trace!(key, %language, ?errors, "formatting errors");
        }

        if value.is_empty() {
            None
        } else {
            Some(value.into_owned())
        }
    }

    /// Translate with fallback: `language`, then English, then the key itself
    pub fn translate(&self, language: Language, key: &str, args: Option<&FluentArgs>) -> String {
        if let Some(value) = self.lookup(language, key, args) {
            return value;
        }

        if language != Language::FALLBACK {
            if let Some(value) = self.lookup(Language::FALLBACK, key, args) {
                tracing::trace!(key, %language, "falling back to English");
                return value;
            }
        }

        tracing::trace!(key, %language, "missing translation");
        key.to_string()
    }
}

fn split_key(key: &str) -> (&str, Option<&str>) {
    match key.split_once('.') {
        Some((id, attribute)) => (id, Some(attribute)),
        None => (key, None),
    }
}
