//! Name normalization
//!
//! Provides normalization modes for preprocessing names before
//! comparison.

use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Normalization mode for name preprocessing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMode {
    /// Leave the text untouched
    None,
    /// Trim, collapse inner whitespace, lowercase
    #[default]
    Name,
    /// `Name`, then strip diacritics ("Chloë" == "chloe")
    NameAscii,
}

/// Trim, collapse runs of whitespace to one space, lowercase.
#[must_use]
pub fn normalize_name(s: &str) -> String {
    s.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// NFKD decompose and drop combining marks.
#[must_use]
pub fn remove_diacritics(s: &str) -> String {
    s.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Normalize a string according to the specified mode
#[must_use]
pub fn normalize_string(s: &str, mode: NormalizationMode) -> String {
    match mode {
        NormalizationMode::None => s.to_string(),
        NormalizationMode::Name => normalize_name(s),
        NormalizationMode::NameAscii => remove_diacritics(&normalize_name(s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Jane   DOE "), "jane doe");
        assert_eq!(normalize_name("   "), "");
    }

    #[test]
    fn test_remove_diacritics() {
        assert_eq!(remove_diacritics("Chloë Zoë"), "Chloe Zoe");
        assert_eq!(remove_diacritics("plain"), "plain");
    }

    #[test]
    fn test_modes() {
        assert_eq!(normalize_string(" Renée ", NormalizationMode::None), " Renée ");
        assert_eq!(normalize_string(" Renée ", NormalizationMode::Name), "renée");
        assert_eq!(normalize_string(" Renée ", NormalizationMode::NameAscii), "renee");
    }

    #[test]
    fn test_mode_serde() {
        let mode: NormalizationMode = serde_json::from_str("\"name_ascii\"").unwrap();
        assert_eq!(mode, NormalizationMode::NameAscii);
        assert_eq!(NormalizationMode::default(), NormalizationMode::Name);
    }
}
