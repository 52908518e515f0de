//! Supported conversation languages.

use serde::{Deserialize, Serialize};

/// A conversation language.
///
/// Tags are the bare ISO 639-1 codes; regional suffixes such as `hi-IN` are
/// accepted when parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    #[default]
    Hi,
    Gu,
}

impl Language {
    /// Every supported language.
    pub const ALL: [Language; 3] = [Language::En, Language::Hi, Language::Gu];

    /// Used when a caller supplies a tag we do not support.
    pub const FALLBACK: Language = Language::En;

    pub fn tag(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Hi => "hi",
            Self::Gu => "gu",
        }
    }

    /// Regional locale passed to speech engines.
    pub fn locale(&self) -> &'static str {
        match self {
            Self::En => "en-IN",
            Self::Hi => "hi-IN",
            Self::Gu => "gu-IN",
        }
    }

    /// Parse a language tag (`hi`, `hi-IN`, `HI_in`).
    pub fn from_tag(tag: &str) -> Option<Self> {
        let primary = tag
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match primary.as_str() {
            "en" => Some(Self::En),
            "hi" => Some(Self::Hi),
            "gu" => Some(Self::Gu),
            _ => None,
        }
    }

    /// Parse a tag, substituting [`Language::FALLBACK`] for unsupported ones.
    pub fn from_tag_or_fallback(tag: &str) -> Self {
        Self::from_tag(tag).unwrap_or(Self::FALLBACK)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}
