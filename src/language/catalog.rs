//! Language Catalog
//!
//! The normalized language taxonomy and the mapping tables from every
//! detector's native codes onto it.
//!
//! A normalized tag is *valid* when it names a catalog entry. `auto` and the
//! empty string are never valid.

use whatlang::Lang;

use crate::constants::language::{CHINESE_SIMPLIFIED, CHINESE_TRADITIONAL, ENGLISH};
use crate::types::DetectionSourceKind;

/// One language known to the system
#[derive(Debug, Clone, Copy)]
pub struct LanguageInfo {
    /// Normalized tag
    pub id: &'static str,
    /// English display name
    pub name: &'static str,
    /// Statistical scorer language
    pub whatlang: Option<Lang>,
    /// Tencent code
    pub tencent: Option<&'static str>,
    /// Baidu code
    pub baidu: Option<&'static str>,
    /// Apple NaturalLanguage (BCP-47) code
    pub apple: Option<&'static str>,
}

const fn lang(
    id: &'static str,
    name: &'static str,
    whatlang: Option<Lang>,
    tencent: Option<&'static str>,
    baidu: Option<&'static str>,
    apple: Option<&'static str>,
) -> LanguageInfo {
    LanguageInfo {
        id,
        name,
        whatlang,
        tencent,
        baidu,
        apple,
    }
}

pub static LANGUAGES: &[LanguageInfo] = &[
    lang(CHINESE_SIMPLIFIED, "Chinese-Simplified", Some(Lang::Cmn), Some("zh"), Some("zh"), Some("zh-Hans")),
    lang(CHINESE_TRADITIONAL, "Chinese-Traditional", None, Some("zh-TW"), Some("cht"), Some("zh-Hant")),
    lang(ENGLISH, "English", Some(Lang::Eng), Some("en"), Some("en"), Some("en")),
    lang("ja", "Japanese", Some(Lang::Jpn), Some("ja"), Some("jp"), Some("ja")),
    lang("ko", "Korean", Some(Lang::Kor), Some("ko"), Some("kor"), Some("ko")),
    lang("fr", "French", Some(Lang::Fra), Some("fr"), Some("fra"), Some("fr")),
    lang("es", "Spanish", Some(Lang::Spa), Some("es"), Some("spa"), Some("es")),
    lang("it", "Italian", Some(Lang::Ita), Some("it"), Some("it"), Some("it")),
    lang("de", "German", Some(Lang::Deu), Some("de"), Some("de"), Some("de")),
    lang("pt", "Portuguese", Some(Lang::Por), Some("pt"), Some("pt"), Some("pt")),
    lang("ru", "Russian", Some(Lang::Rus), Some("ru"), Some("ru"), Some("ru")),
    lang("ar", "Arabic", Some(Lang::Ara), Some("ar"), Some("ara"), Some("ar")),
    lang("sv", "Swedish", Some(Lang::Swe), None, Some("swe"), Some("sv")),
    lang("ro", "Romanian", Some(Lang::Ron), None, Some("rom"), Some("ro")),
    lang("th", "Thai", Some(Lang::Tha), Some("th"), Some("th"), Some("th")),
    lang("sk", "Slovak", Some(Lang::Slk), None, Some("slo"), Some("sk")),
    lang("nl", "Dutch", Some(Lang::Nld), None, Some("nl"), Some("nl")),
    lang("hu", "Hungarian", Some(Lang::Hun), None, Some("hu"), Some("hu")),
    lang("el", "Greek", Some(Lang::Ell), None, Some("el"), Some("el")),
    lang("da", "Danish", Some(Lang::Dan), None, Some("dan"), Some("da")),
    lang("fi", "Finnish", Some(Lang::Fin), None, Some("fin"), Some("fi")),
    lang("pl", "Polish", Some(Lang::Pol), None, Some("pl"), Some("pl")),
    lang("cs", "Czech", Some(Lang::Ces), None, Some("cs"), Some("cs")),
    lang("tr", "Turkish", Some(Lang::Tur), Some("tr"), None, Some("tr")),
    lang("uk", "Ukrainian", Some(Lang::Ukr), None, None, Some("uk")),
    lang("bg", "Bulgarian", Some(Lang::Bul), None, Some("bul"), Some("bg")),
    lang("id", "Indonesian", Some(Lang::Ind), Some("id"), None, Some("id")),
    lang("vi", "Vietnamese", Some(Lang::Vie), Some("vi"), Some("vie"), Some("vi")),
    lang("fa", "Persian", Some(Lang::Pes), None, None, Some("fa")),
    lang("hi", "Hindi", Some(Lang::Hin), Some("hi"), None, Some("hi")),
    lang("he", "Hebrew", Some(Lang::Heb), None, None, Some("he")),
];

/// Look up a catalog entry by normalized tag
pub fn get(id: &str) -> Option<&'static LanguageInfo> {
    LANGUAGES.iter().find(|info| info.id == id)
}

/// Whether `id` is a structurally valid normalized tag
pub fn is_valid_language_id(id: &str) -> bool {
    get(id).is_some()
}

/// Display name for a normalized tag
pub fn language_name(id: &str) -> &'static str {
    get(id).map(|info| info.name).unwrap_or("Unknown")
}

/// Normalized tag for a statistical scorer language
pub fn from_whatlang(lang: Lang) -> Option<&'static str> {
    LANGUAGES
        .iter()
        .find(|info| info.whatlang == Some(lang))
        .map(|info| info.id)
}

/// Normalize a provider-native code. Returns `None` when unmapped.
pub fn normalize(source: DetectionSourceKind, code: &str) -> Option<&'static str> {
    let code = code.trim();
    if code.is_empty() {
        return None;
    }
    LANGUAGES
        .iter()
        .find(|info| {
            let native = match source {
                DetectionSourceKind::Tencent => info.tencent,
                DetectionSourceKind::Baidu => info.baidu,
                DetectionSourceKind::Apple => info.apple,
                DetectionSourceKind::Simple | DetectionSourceKind::Statistical => Some(info.id),
            };
            native.is_some_and(|native| native.eq_ignore_ascii_case(code))
        })
        .map(|info| info.id)
}
