//! OpenAI-compatible chat completions oracle
//!
//! Sends one request per column with a fixed instruction describing the five
//! sensitivity categories and asks for a JSON object in return.

use super::ClassificationOracle;
use crate::anonymization::models::ColumnProfile;
use crate::config::{OracleConfig, SecretString};
use crate::domain::{OracleError, Result, SheetguardError};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::time::Duration;

const INSTRUCTION: &str = r#"You are a data-sensitivity classification system for Brazilian datasets subject to the LGPD.
You receive the name of a spreadsheet column and a few example values. Classify the column into exactly one category:

1) "identifier": directly identifies a person, e.g. full name, CPF, CNPJ, RG, phone number, e-mail.
2) "quasi_identifier": identifies a person when combined with other fields, e.g. CEP, street address, birth date or other personal dates.
3) "financial": monetary amounts, e.g. salário, renda, saldo, valor.
4) "demographic": personal magnitudes, e.g. idade, número de filhos.
5) "non_sensitive": anything else.

Answer with a single JSON object and nothing else:
{"category": "...", "sensitive": true or false, "rationale": "one short sentence"}"#;

/// Oracle backed by an OpenAI-compatible `/v1/chat/completions` endpoint
pub struct OpenAiOracle {
    base_url: String,
    model: String,
    api_key: SecretString,
    client: Client,
}

impl OpenAiOracle {
    /// Create a new oracle from configuration
    ///
    /// # Errors
    ///
    /// Returns [`SheetguardError::Configuration`] when no API key is configured or the
    /// HTTP client cannot be built.
    pub fn new(config: &OracleConfig) -> Result<Self> {
        if !config.has_api_key() {
            return Err(SheetguardError::Configuration(
                "oracle.api_key is required for the openai backend \
                 (set SHEETGUARD_ORACLE_API_KEY or OPENAI_API_KEY)"
                    .to_string(),
            ));
        }
        let api_key = config.api_key.clone().ok_or_else(|| {
            SheetguardError::Configuration("oracle.api_key is missing".to_string())
        })?;

        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.timeout_seconds.min(30)))
            .build()
            .map_err(|e| {
                SheetguardError::Configuration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            client,
        })
    }

    fn user_prompt(profile: &ColumnProfile) -> String {
        let examples = serde_json::to_string(&profile.sample).unwrap_or_else(|_| "[]".into());
        format!(
            "COLUMN NAME: \"{}\"\nINFERRED KIND: {}\nEXAMPLES: {}",
            profile.name, profile.kind, examples
        )
    }

    fn map_send_error(err: reqwest::Error) -> OracleError {
        if err.is_timeout() {
            OracleError::Timeout(err.to_string())
        } else {
            OracleError::ConnectionFailed(err.to_string())
        }
    }

    fn map_status(status: StatusCode, body: String) -> OracleError {
        if status == StatusCode::TOO_MANY_REQUESTS {
            OracleError::RateLimited(body)
        } else if status.is_server_error() {
            OracleError::ServerError {
                status: status.as_u16(),
                message: body,
            }
        } else {
            OracleError::ClientError {
                status: status.as_u16(),
                message: body,
            }
        }
    }
}

#[async_trait]
impl ClassificationOracle for OpenAiOracle {
    fn name(&self) -> &str {
        "openai"
    }

    async fn classify(&self, profile: &ColumnProfile) -> std::result::Result<String, OracleError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let request = serde_json::json!({
            "model": self.model,
            "temperature": 0.0,
            "max_tokens": 300,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": INSTRUCTION },
                { "role": "user", "content": Self::user_prompt(profile) },
            ],
        });

        tracing::debug!(
            column = %profile.name,
            model = %self.model,
            sample_len = profile.sample.len(),
            "Sending classification request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret().as_ref())
            .json(&request)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::map_status(status, body));
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| OracleError::InvalidResponse(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| OracleError::InvalidResponse("response has no content".to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;
    use crate::domain::ScalarKind;

    fn profile() -> ColumnProfile {
        ColumnProfile {
            name: "CPF".to_string(),
            kind: ScalarKind::Text,
            sample: vec!["123.456.789-09".to_string()],
            non_null: 1,
        }
    }

    #[test]
    fn test_new_requires_api_key() {
        let config = OracleConfig::default();
        assert!(OpenAiOracle::new(&config).is_err());

        let config = OracleConfig {
            api_key: Some(secret_string("sk-test".to_string())),
            ..OracleConfig::default()
        };
        assert!(OpenAiOracle::new(&config).is_ok());
    }

    #[test]
    fn test_user_prompt_contains_name_and_examples() {
        let prompt = OpenAiOracle::user_prompt(&profile());
        assert!(prompt.contains("\"CPF\""));
        assert!(prompt.contains("123.456.789-09"));
        assert!(prompt.contains("text"));
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            OpenAiOracle::map_status(StatusCode::TOO_MANY_REQUESTS, String::new()),
            OracleError::RateLimited(_)
        ));
        assert!(matches!(
            OpenAiOracle::map_status(StatusCode::BAD_GATEWAY, String::new()),
            OracleError::ServerError { status: 502, .. }
        ));
        assert!(matches!(
            OpenAiOracle::map_status(StatusCode::UNAUTHORIZED, String::new()),
            OracleError::ClientError { status: 401, .. }
        ));
    }
}
