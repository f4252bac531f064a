use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use af_core::domain::Purpose;

fn validate_purpose(purpose: &str) -> Result<(), ValidationError> {
    purpose
        .parse::<Purpose>()
        .map(|_| ())
        .map_err(|_| ValidationError::new("invalid_purpose"))
}

fn validate_code(code: &str) -> Result<(), ValidationError> {
    if code.trim().chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_code"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendEmailCodeRequest {
    #[validate(length(min = 3, max = 254))]
    pub email: String,

    /// `reset_password`, `find_id` or `email_verify`
    #[validate(custom(function = "validate_purpose"))]
    pub purpose: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyEmailCodeRequest {
    #[validate(length(min = 3, max = 254))]
    pub email: String,

    /// 6-digit verification code
    #[validate(length(equal = 6), custom(function = "validate_code"))]
    pub code: String,

    #[validate(custom(function = "validate_purpose"))]
    pub purpose: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendSmsCodeRequest {
    /// Domestic (`010-1234-5678`) or E.164 (`+821012345678`) form
    #[validate(length(min = 9, max = 20))]
    pub phone: String,

    #[validate(custom(function = "validate_purpose"))]
    pub purpose: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifySmsCodeRequest {
    #[validate(length(min = 9, max = 20))]
    pub phone: String,

    #[validate(length(equal = 6), custom(function = "validate_code"))]
    pub code: String,

    #[validate(custom(function = "validate_purpose"))]
    pub purpose: String,
}

/// Query of `GET /api/auth/dev-get-code`; one of `email` or `phone` is required
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevCodeQuery {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub purpose: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendCodeResponse {
    pub success: bool,
    pub message: String,
    /// Seconds until the code expires
    pub expires_in: u64,
    /// Seconds until another code may be requested
    pub resend_after: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedData {
    /// Masked contact
    pub contact: String,
    pub purpose: Purpose,
    pub verified_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyCodeResponse {
    pub verified: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<VerifiedData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevCodeResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
    /// Seconds until the code expires
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_left: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_request_validation() {
        let valid = SendEmailCodeRequest {
            email: "coach@amusefit.co.kr".into(),
            purpose: "email_verify".into(),
        };
        assert!(valid.validate().is_ok());

        let bad_purpose = SendEmailCodeRequest {
            purpose: "login".into(),
            ..valid
        };
        let errors = bad_purpose.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("purpose"));
    }

    #[test]
    fn test_code_must_be_six_digits() {
        let request = |code: &str| VerifySmsCodeRequest {
            phone: "01012345678".into(),
            code: code.into(),
            purpose: "find_id".into(),
        };
        assert!(request("042917").validate().is_ok());
        assert!(request("04291").validate().is_err());
        assert!(request("04291a").validate().is_err());
    }

    #[test]
    fn test_verify_response_omits_missing_data() {
        let response = VerifyCodeResponse {
            verified: false,
            message: "no".into(),
            data: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("data").is_none());
        assert_eq!(json["verified"], false);
    }
}
