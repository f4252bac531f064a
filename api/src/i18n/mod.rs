//! Localized API messages
//!
//! Messages are loaded from `i18n/messages.toml` when the file exists next to
//! the working directory, otherwise from the copy embedded at compile time.

use actix_web::http::header;
use actix_web::HttpRequest;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub use af_shared::Language;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub en: String,
    pub ko: String,
    pub code: String,
    pub http_status: u16,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Messages {
    #[serde(default)]
    pub verification: HashMap<String, Message>,
    #[serde(default)]
    pub validation: HashMap<String, Message>,
    #[serde(default)]
    pub delivery: HashMap<String, Message>,
    #[serde(default)]
    pub dev: HashMap<String, Message>,
    #[serde(default)]
    pub general: HashMap<String, Message>,
}

const EMBEDDED: &str = include_str!("../../i18n/messages.toml");

pub static MESSAGES: Lazy<Messages> = Lazy::new(|| match load_messages() {
    Ok(messages) => messages,
    Err(e) => {
        tracing::error!(error = %e, "Failed to load i18n messages");
        Messages::default()
    }
});

fn load_messages() -> Result<Messages, Box<dyn std::error::Error>> {
    let override_path = Path::new("i18n/messages.toml");
    let content = if override_path.exists() {
        fs::read_to_string(override_path)?
    } else {
        EMBEDDED.to_string()
    };
    Ok(toml::from_str(&content)?)
}

/// Preferred language from the `Accept-Language` header, Korean when absent
pub fn language_of(req: &HttpRequest) -> Language {
    req.headers()
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|value| value.to_str().ok())
        .map(Language::from_accept_language)
        .unwrap_or_default()
}

/// `(code, text, http_status)` for a message key
pub fn get_message(category: &str, key: &str, lang: Language) -> Option<(String, String, u16)> {
    let messages = &*MESSAGES;

    let category_map = match category {
        "verification" => &messages.verification,
        "validation" => &messages.validation,
        "delivery" => &messages.delivery,
        "dev" => &messages.dev,
        "general" => &messages.general,
        _ => return None,
    };

    category_map.get(key).map(|msg| {
        let text = match lang {
            Language::English => msg.en.clone(),
            Language::Korean => msg.ko.clone(),
        };
        (msg.code.clone(), text, msg.http_status)
    })
}

pub fn format_message(template: &str, params: &[(&str, String)]) -> String {
    let mut result = template.to_string();
    for (key, value) in params {
        let placeholder = format!("{{{}}}", key);
        result = result.replace(&placeholder, value);
    }
    result
}

/// Localized text for a message, or the key itself when it is missing
pub fn text(category: &str, key: &str, lang: Language, params: &[(&str, String)]) -> String {
    match get_message(category, key, lang) {
        Some((_, template, _)) => format_message(&template, params),
        None => key.to_string(),
    }
}
