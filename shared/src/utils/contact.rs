//! Contact address utilities
//!
//! Codes are keyed by the normalized contact, so the same mailbox or handset
//! always maps to one record regardless of how the user typed it.

use once_cell::sync::Lazy;
use regex::Regex;

// Pragmatic address check; providers do the authoritative validation
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("email regex is valid")
});

// Korean mobile numbers: 010 / 011 / 016 / 017 / 018 / 019
static KOREAN_MOBILE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^01[016789]\d{7,8}$").expect("korean mobile regex is valid"));

// International phone number (E.164)
static INTERNATIONAL_PHONE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+[1-9]\d{7,14}$").expect("e164 regex is valid"));

/// Trim and lowercase an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Digits of a phone number, keeping a leading '+'
fn strip_formatting(phone: &str) -> String {
    let trimmed = phone.trim();
    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
    if trimmed.starts_with('+') {
        format!("+{}", digits)
    } else {
        digits
    }
}

/// Canonical form of a phone number, used as the record key.
///
/// Formatting characters are removed and Korean mobiles written with the
/// `+82` prefix are rewritten to the domestic form, so
/// `+82 10-1234-5678` and `010-1234-5678` both become `01012345678`.
pub fn normalize_phone_number(phone: &str) -> String {
    let stripped = strip_formatting(phone);
    if let Some(national) = stripped.strip_prefix("+82") {
        let domestic = format!("0{}", national.trim_start_matches('0'));
        if KOREAN_MOBILE_REGEX.is_match(&domestic) {
            return domestic;
        }
    }
    stripped
}

/// Check if an email address is valid
pub fn is_valid_email(email: &str) -> bool {
    let normalized = normalize_email(email);
    normalized.len() <= 254 && EMAIL_REGEX.is_match(&normalized)
}

/// Check if a phone number is a Korean mobile number (e.g. 010-1234-5678)
pub fn is_valid_korean_mobile(phone: &str) -> bool {
    KOREAN_MOBILE_REGEX.is_match(&strip_formatting(phone))
}

/// Check if a phone number is in international E.164 format
pub fn is_valid_international_phone(phone: &str) -> bool {
    INTERNATIONAL_PHONE_REGEX.is_match(&strip_formatting(phone))
}

/// Check if a phone number is valid (Korean mobile or international)
pub fn is_valid_phone(phone: &str) -> bool {
    is_valid_korean_mobile(phone) || is_valid_international_phone(phone)
}

/// Mask a phone number for logs (e.g. 010****5678)
pub fn mask_phone_number(phone: &str) -> String {
    let normalized = normalize_phone_number(phone);
    if normalized.len() >= 7 {
        format!(
            "{}****{}",
            &normalized[0..3],
            &normalized[normalized.len() - 4..]
        )
    } else {
        "****".to_string()
    }
}

/// Mask an email address for logs (e.g. jo***@example.com)
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() => {
            let visible: String = local.chars().take(2).collect();
            format!("{}***@{}", visible, domain)
        }
        _ => "***".to_string(),
    }
}

/// Mask either kind of contact
pub fn mask_contact(contact: &str) -> String {
    if contact.contains('@') {
        mask_email(contact)
    } else {
        mask_phone_number(contact)
    }
}
