use anyhow::{Result, anyhow};
use isolang::Language;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Language utilities for target-language handling
///
/// Target languages are accepted as ISO 639-1 (2-letter) or ISO 639-2
/// (3-letter, /T or /B) codes and normalized to the 2-letter form the
/// translation providers expect.

/// ISO 639-2/B codes that differ from their /T counterpart
const BIBLIOGRAPHIC_CODES: [(&str, &str); 18] = [
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

/// Target languages offered in the language menu
const MENU_LANGUAGES: [&str; 8] = ["en", "es", "fr", "de", "hi", "zh", "ar", "ja"];

/// Voice locales whose provider-side name does not follow `{lang}-US`
static VOICE_LOCALE_OVERRIDES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("zh", "cmn-CN"),
        ("hi", "hi-IN"),
        ("ar", "ar-XA"),
        ("ja", "ja-JP"),
        ("fr", "fr-FR"),
        ("de", "de-DE"),
        ("es", "es-ES"),
        ("ta", "ta-IN"),
        ("kn", "kn-IN"),
    ])
});

/// Target language entry for display
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct LanguageOption {
    pub code: &'static str,
    pub name: String,
}

fn part2t_from_bibliographic(code: &str) -> Option<&'static str> {
    BIBLIOGRAPHIC_CODES
        .iter()
        .find(|(b, _)| *b == code)
        .map(|(_, t)| *t)
}

fn lookup(code: &str) -> Option<Language> {
    let normalized = code.trim().to_lowercase();
    match normalized.len() {
        2 => Language::from_639_1(&normalized),
        3 => {
            let part2t = part2t_from_bibliographic(&normalized).unwrap_or(&normalized);
            Language::from_639_3(part2t)
        }
        _ => None,
    }
}

/// Validate a target language and normalize it to ISO 639-1 when possible
///
/// Languages without a 2-letter code keep their ISO 639-2/T code.
pub fn normalize_target_language(code: &str) -> Result<String> {
    let lang = lookup(code).ok_or_else(|| anyhow!("Invalid language code: {}", code))?;

    Ok(match lang.to_639_1() {
        Some(part1) => part1.to_string(),
        None => lang.to_639_3().to_string(),
    })
}

/// Check if a language code is a valid ISO 639-1 or ISO 639-2 code
pub fn is_valid_language_code(code: &str) -> bool {
    lookup(code).is_some()
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let lang = lookup(code).ok_or_else(|| anyhow!("Failed to get language from code: {}", code))?;
    Ok(lang.to_name().to_string())
}

/// Voice locale for speech synthesis
///
/// Unknown languages fall back to `{lang}-US` rather than failing.
pub fn voice_locale(language: &str) -> String {
    let lang = language.trim().to_lowercase();
    match VOICE_LOCALE_OVERRIDES.get(lang.as_str()) {
        Some(locale) => (*locale).to_string(),
        None => format!("{}-US", lang),
    }
}

/// Languages offered in the target-language menu
pub fn supported_languages() -> Vec<LanguageOption> {
    MENU_LANGUAGES
        .iter()
        .map(|code| LanguageOption {
            code,
            name: get_language_name(code).unwrap_or_else(|_| code.to_string()),
        })
        .collect()
}
