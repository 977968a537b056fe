//! Target languages and their number verbalizers.

use std::fmt;
use std::str::FromStr;

use super::english::English;
use super::vietnamese::Vietnamese;

/// Spoken-word rendering of numbers for one language.
///
/// The normalizer only decides *which* tokens are numbers and how they are
/// grouped; everything language-specific goes through this trait.
pub trait Verbalizer: Send + Sync {
    /// Spell out a cardinal number
    fn cardinal(&self, n: u64) -> String;

    /// Word for a single decimal digit (0-9)
    fn digit(&self, d: u32) -> &'static str;

    /// Word spoken for the decimal separator
    fn decimal_point(&self) -> &'static str;

    /// Spell out a day/month/year date, keeping that order
    fn date(&self, day: u64, month: u64, year: u64) -> String;

    /// Spoken form of a currency marker such as `VNĐ` or `$`
    fn currency_word(&self, marker: &str) -> String;
}

/// Languages the normalizer can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    Vietnamese,
    English,
}

impl Language {
    /// Parse a language tag such as `vi`, `vi-VN` or `en_us`
    pub fn from_tag(tag: &str) -> Option<Self> {
        let primary = tag.trim().split(['-', '_']).next()?.to_lowercase();
        match primary.as_str() {
            "vi" | "vie" => Some(Self::Vietnamese),
            "en" | "eng" => Some(Self::English),
            _ => None,
        }
    }

    /// Canonical tag for this language
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Vietnamese => "vi-vn",
            Self::English => "en-us",
        }
    }

    pub fn verbalizer(&self) -> &'static dyn Verbalizer {
        match self {
            Self::Vietnamese => &Vietnamese,
            Self::English => &English,
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| format!("Unsupported language tag: {}", s))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tag() {
        assert_eq!(Language::from_tag("vi-vn"), Some(Language::Vietnamese));
        assert_eq!(Language::from_tag("vi_VN"), Some(Language::Vietnamese));
        assert_eq!(Language::from_tag("VI"), Some(Language::Vietnamese));
        assert_eq!(Language::from_tag("en-GB"), Some(Language::English));
        assert_eq!(Language::from_tag("fr-fr"), None);
        assert_eq!(Language::from_tag(""), None);
    }

    #[test]
    fn test_from_str_error_message() {
        let err = "ja-jp".parse::<Language>().unwrap_err();
        assert!(err.contains("ja-jp"));
    }

    #[test]
    fn test_display_uses_canonical_tag() {
        assert_eq!(Language::Vietnamese.to_string(), "vi-vn");
        assert_eq!(Language::default(), Language::Vietnamese);
    }
}
