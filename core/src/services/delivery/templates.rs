//! Verification message templates

use std::time::Duration;

use af_shared::Language;

use crate::domain::entities::verification_code::{Channel, Purpose};

use super::provider::RenderedMessage;

/// Renders the subject and bodies of verification messages
#[derive(Debug, Clone)]
pub struct MessageTemplates {
    app_name: String,
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self::new("AmuseFit")
    }
}

impl MessageTemplates {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }

    pub fn render(
        &self,
        code: &str,
        purpose: Purpose,
        channel: Channel,
        ttl: Duration,
        language: Language,
    ) -> RenderedMessage {
        let minutes = ttl.as_secs().div_ceil(60).max(1);
        let subject = format!("[{}] {}", self.app_name, purpose_title(purpose, language));

        let text = match channel {
            Channel::Sms => self.sms_text(code, minutes, language),
            Channel::Email => self.email_text(code, purpose, minutes, language),
        };

        RenderedMessage {
            html: self.email_html(code, purpose, minutes, language),
            subject,
            text,
        }
    }

    fn sms_text(&self, code: &str, minutes: u64, language: Language) -> String {
        match language {
            Language::Korean => format!(
                "[{}] 인증번호 [{}]를 입력해주세요. ({}분 내 유효)",
                self.app_name, code, minutes
            ),
            Language::English => format!(
                "[{}] Your verification code is {}. It expires in {} minutes.",
                self.app_name, code, minutes
            ),
        }
    }

    fn email_text(&self, code: &str, purpose: Purpose, minutes: u64, language: Language) -> String {
        match language {
            Language::Korean => format!(
                "안녕하세요, {app}입니다.\n\n{action} 인증번호는 {code} 입니다.\n이 인증번호는 {minutes}분 동안 유효합니다.\n\n본인이 요청하지 않았다면 이 메일을 무시해주세요.",
                app = self.app_name,
                action = purpose_title(purpose, language),
                code = code,
                minutes = minutes,
            ),
            Language::English => format!(
                "Hello from {app}.\n\nYour {action} code is {code}.\nIt is valid for {minutes} minutes.\n\nIf you did not request this, you can ignore this email.",
                app = self.app_name,
                action = purpose_title(purpose, language).to_lowercase(),
                code = code,
                minutes = minutes,
            ),
        }
    }

    fn email_html(&self, code: &str, purpose: Purpose, minutes: u64, language: Language) -> String {
        let (validity, ignore) = match language {
            Language::Korean => (
                format!("이 인증번호는 {}분 동안 유효합니다.", minutes),
                "본인이 요청하지 않았다면 이 메일을 무시해주세요.",
            ),
            Language::English => (
                format!("This code is valid for {} minutes.", minutes),
                "If you did not request this, you can ignore this email.",
            ),
        };

        format!(
            r#"<!DOCTYPE html>
<html lang="{lang}">
<body style="font-family: sans-serif; color: #222;">
  <h2>{app}</h2>
  <p>{title}</p>
  <p style="font-size: 32px; font-weight: bold; letter-spacing: 6px;">{code}</p>
  <p>{validity}</p>
  <p style="color: #888; font-size: 12px;">{ignore}</p>
</body>
</html>"#,
            lang = language.code(),
            app = self.app_name,
            title = purpose_title(purpose, language),
            code = code,
            validity = validity,
            ignore = ignore,
        )
    }
}

fn purpose_title(purpose: Purpose, language: Language) -> &'static str {
    match (purpose, language) {
        (Purpose::ResetPassword, Language::Korean) => "비밀번호 재설정 인증번호",
        (Purpose::FindId, Language::Korean) => "아이디 찾기 인증번호",
        (Purpose::EmailVerify, Language::Korean) => "이메일 인증번호",
        (Purpose::ResetPassword, Language::English) => "Password reset code",
        (Purpose::FindId, Language::English) => "Account ID recovery code",
        (Purpose::EmailVerify, Language::English) => "Email verification code",
    }
}
