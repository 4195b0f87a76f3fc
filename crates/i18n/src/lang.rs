//! Supported languages and initial language resolution

use serde::{Deserialize, Serialize};
use unic_langid::LanguageIdentifier;

/// Interface languages shipped with the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Language {
    /// Simplified Chinese
    #[serde(rename = "zh-CN")]
    ZhCn,
    /// English (fallback language)
    #[default]
    #[serde(rename = "en")]
    En,
    /// Japanese
    #[serde(rename = "ja")]
    Ja,
    /// Korean
    #[serde(rename = "ko")]
    Ko,
    /// French
    #[serde(rename = "fr")]
    Fr,
    /// German
    #[serde(rename = "de")]
    De,
    /// Spanish
    #[serde(rename = "es")]
    Es,
}

impl Language {
    /// Every supported language, in picker order
    pub const ALL: [Language; 7] = [
        Language::ZhCn,
        Language::En,
        Language::Ja,
        Language::Ko,
        Language::Fr,
        Language::De,
        Language::Es,
    ];

    /// Fallback language used when a string is missing
    pub const FALLBACK: Language = Language::En;

    /// BCP 47 code
    pub fn code(&self) -> &'static str {
        match self {
            Language::ZhCn => "zh-CN",
            Language::En => "en",
            Language::Ja => "ja",
            Language::Ko => "ko",
            Language::Fr => "fr",
            Language::De => "de",
            Language::Es => "es",
        }
    }

    /// Primary language subtag
    pub fn primary(&self) -> &'static str {
        match self {
            Language::ZhCn => "zh",
            other => other.code(),
        }
    }

    /// Name of the language in itself
    pub fn native_name(&self) -> &'static str {
        match self {
            Language::ZhCn => "简体中文",
            Language::En => "English",
            Language::Ja => "日本語",
            Language::Ko => "한국어",
            Language::Fr => "Français",
            Language::De => "Deutsch",
            Language::Es => "Español",
        }
    }

    /// Parsed language identifier
    pub fn langid(&self) -> LanguageIdentifier {
        self.code().parse().unwrap_or_default()
    }

    /// Look up a supported language by its exact code
    ///
    /// Matching ignores case and accepts `_` as a separator, so `zh_cn` finds
    /// [`Language::ZhCn`]. Codes outside the supported set return `None`.
    pub fn from_code(code: &str) -> Option<Self> {
        let normalized = code.trim().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|lang| lang.code().eq_ignore_ascii_case(&normalized))
    }

    fn matches_exact(&self, locale: &LanguageIdentifier) -> bool {
        self.code().eq_ignore_ascii_case(&locale.to_string())
    }

    fn matches_primary(&self, locale: &LanguageIdentifier) -> bool {
        self.primary().eq_ignore_ascii_case(locale.language.as_str())
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::from_code(s).ok_or_else(|| format!("Unsupported language: {}", s))
    }
}

/// Parse an OS/browser locale list such as `fr-CA,fr;q=0.9,en;q=0.8`
///
/// Entries that are not valid language tags are skipped.
pub fn parse_os_locales(locales: &str) -> Vec<LanguageIdentifier> {
    fluent_langneg::accepted_languages::parse(&locales.replace('_', "-"))
}

/// Match OS locales against the supported set
///
/// Every locale is first tried for an exact match; only then are primary
/// language subtags compared (so `zh-TW` resolves to `zh-CN`).
pub fn match_os_locales(locales: &[LanguageIdentifier]) -> Option<Language> {
    let exact = locales
        .iter()
        .find_map(|locale| Language::ALL.into_iter().find(|l| l.matches_exact(locale)));

    exact.or_else(|| {
        locales
            .iter()
            .find_map(|locale| Language::ALL.into_iter().find(|l| l.matches_primary(locale)))
    })
}

/// Resolve the language to use at startup
///
/// Order: persisted choice, exact OS locale match, OS primary-language match,
/// then English. A persisted code that is no longer supported is skipped.
pub fn resolve_initial_language(persisted: Option<&str>, os_locales: &str) -> Language {
    if let Some(language) = persisted.and_then(Language::from_code) {
        tracing::debug!(%language, "using persisted language");
        return language;
    }

    if let Some(code) = persisted {
        tracing::warn!(code, "ignoring unsupported persisted language");
    }

    let locales = parse_os_locales(os_locales);
    match match_os_locales(&locales) {
        Some(language) => {
            tracing::debug!(%language, os_locales, "matched OS locale");
            language
        }
        None => Language::FALLBACK,
    }
}
