//! Language and internationalization types

use serde::{Deserialize, Serialize};

/// Language of user-facing messages
///
/// Korean is the default: the service targets Korean users and every
/// provider template falls back to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "en")]
    English,
    #[default]
    #[serde(rename = "ko")]
    Korean,
}

impl Language {
    /// Pick the preferred supported language from an Accept-Language header
    ///
    /// Example header: `"ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7"`
    pub fn from_accept_language(header: &str) -> Self {
        let mut preferred = None;
        let mut best_quality = 0.0_f32;

        for entry in header.split(',') {
            let mut parts = entry.trim().split(';');
            let tag = parts.next().unwrap_or_default().trim().to_lowercase();
            let quality = parts
                .find_map(|param| param.trim().strip_prefix("q="))
                .and_then(|q| q.parse::<f32>().ok())
                .unwrap_or(1.0);

            let language = if tag.starts_with("ko") {
                Some(Language::Korean)
            } else if tag.starts_with("en") {
                Some(Language::English)
            } else {
                None
            };

            if let Some(language) = language {
                if quality > best_quality {
                    preferred = Some(language);
                    best_quality = quality;
                }
            }
        }

        preferred.unwrap_or_default()
    }

    /// Get language code (ISO 639-1)
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Korean => "ko",
        }
    }

    /// Get locale code
    pub fn locale(&self) -> &'static str {
        match self {
            Language::English => "en-US",
            Language::Korean => "ko-KR",
        }
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
        match s.to_lowercase().as_str() {
            "en" | "eng" | "english" => Ok(Language::English),
            "ko" | "kor" | "korean" | "한국어" => Ok(Language::Korean),
            _ => Err(format!("Unsupported language: {}", s)),
        }
    }
}
