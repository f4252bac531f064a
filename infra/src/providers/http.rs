//! Shared reqwest plumbing for the HTTP providers

use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;

use af_core::errors::ProviderError;

use crate::InfrastructureError;

/// Hard ceiling for a single request; the dispatcher usually cuts in first
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Client shared by every HTTP provider
pub(crate) fn build_client() -> Result<Client, InfrastructureError> {
    Ok(Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .user_agent(concat!("amusefit-verification/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Client for adapters constructed outside the registry
pub(crate) fn default_client() -> Client {
    build_client().unwrap_or_default()
}

/// Read the body, failing on non-2xx statuses
pub(crate) async fn read_success(provider: &str, response: Response) -> Result<String, ProviderError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::transport(provider, e))?;

    if !status.is_success() {
        return Err(ProviderError::http(provider, status.as_u16(), &body));
    }
    Ok(body)
}

pub(crate) fn parse_json(provider: &str, body: &str) -> Result<Value, ProviderError> {
    serde_json::from_str(body).map_err(|e| ProviderError::malformed(provider, e))
}

/// String or number at `pointer`, rendered as a string
pub(crate) fn id_at(provider: &str, value: &Value, pointer: &str) -> Result<String, ProviderError> {
    match value.pointer(pointer) {
        Some(Value::String(id)) if !id.is_empty() => Ok(id.clone()),
        Some(Value::Number(id)) => Ok(id.to_string()),
        _ => Err(ProviderError::malformed(provider, format!("missing {}", pointer))),
    }
}

pub(crate) fn trim_base(base_url: impl Into<String>) -> String {
    base_url.into().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_at_accepts_strings_and_numbers() {
        let value = json!({ "id": "abc", "nested": { "n": 42 }, "empty": "" });
        assert_eq!(id_at("p", &value, "/id").unwrap(), "abc");
        assert_eq!(id_at("p", &value, "/nested/n").unwrap(), "42");
        assert!(matches!(
            id_at("p", &value, "/empty"),
            Err(ProviderError::MalformedResponse { .. })
        ));
        assert!(id_at("p", &value, "/missing").is_err());
    }

    #[test]
    fn test_parse_json_rejects_garbage() {
        assert!(matches!(
            parse_json("brevo", "<html>"),
            Err(ProviderError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_trim_base() {
        assert_eq!(trim_base("http://localhost:9/"), "http://localhost:9");
    }
}
