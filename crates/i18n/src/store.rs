//! Current-language state
//!
//! [`LocalizationStore`] owns the active [`Language`], resolves it at startup
//! from preferences and the OS locale list, persists changes, and notifies
//! subscribers through a watch channel.

use crate::lang::{resolve_initial_language, Language};
use crate::translator::{Catalog, Result};
use fluent::FluentArgs;
use storage::PreferenceStore;
use tokio::sync::watch;

/// Localization state shared by the views
pub struct LocalizationStore {
    catalog: Catalog,
    prefs: PreferenceStore,
    language_tx: watch::Sender<Language>,
}

impl std::fmt::Debug for LocalizationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalizationStore")
            .field("language", &self.current_language())
            .field("catalog", &self.catalog)
            .finish()
    }
}

impl LocalizationStore {
    /// Create the store, resolving the initial language
    ///
    /// `os_locales` is a comma-separated locale list as reported by the OS
    /// (for example `zh-TW,en-US;q=0.8`). It may be empty.
    pub fn new(catalog: Catalog, prefs: PreferenceStore, os_locales: &str) -> Self {
        let persisted = prefs.language();
        let language = resolve_initial_language(persisted.as_deref(), os_locales);
        tracing::info!(%language, "localization initialized");

        let (language_tx, _) = watch::channel(language);
        Self { catalog, prefs, language_tx }
    }

    /// Create the store with the bundled string tables
    pub fn with_bundled(prefs: PreferenceStore, os_locales: &str) -> Result<Self> {
        Ok(Self::new(Catalog::bundled()?, prefs, os_locales))
    }

    /// Active language
    pub fn current_language(&self) -> Language {
        *self.language_tx.borrow()
    }

    /// Languages the user may pick from
    pub fn supported_languages(&self) -> &'static [Language] {
        &Language::ALL
    }

    /// Translate `key` in the active language
    ///
    /// Falls back to English, then to the key itself. Never returns an empty
    /// string for a known key.
    pub fn translate(&self, key: &str) -> String {
        self.catalog.translate(self.current_language(), key, None)
    }

    /// Translate `key` with interpolation arguments
    pub fn translate_with(&self, key: &str, args: &FluentArgs) -> String {
        self.catalog.translate(self.current_language(), key, Some(args))
    }

    /// Switch the active language
    ///
    /// Unsupported codes leave everything untouched and return `Ok(false)`.
    /// A supported code is persisted and subscribers are notified; picking the
    /// already-active language still persists it but sends no notification.
    pub fn change_language(&self, code: &str) -> Result<bool> {
        let Some(language) = Language::from_code(code) else {
            tracing::warn!(code, "ignoring unsupported language");
            return Ok(false);
        };

        self.prefs.set_language(language.code())?;

        let changed = self.language_tx.send_if_modified(|current| {
            if *current == language {
                false
            } else {
                *current = language;
                true
            }
        });

        if changed {
            tracing::info!(%language, "language changed");
        }

        Ok(true)
    }

    /// Subscribe to language changes
    pub fn subscribe(&self) -> watch::Receiver<Language> {
        self.language_tx.subscribe()
    }

    /// String tables backing this store
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}
