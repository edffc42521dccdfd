// Outbound message providers. One capability interface covers both channels;
// each backend is a variant picked from configuration at startup. An
// unconfigured backend reports NotConfigured instead of erroring.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use thiserror::Error;

use crate::config::{EmailConfig, SmsConfig, SmsProviderKind};

#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

#[derive(Debug, Clone)]
pub struct SmsMessage {
    /// E.164 recipient, e.g. `+919828012345`.
    pub to: String,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct ProviderReceipt {
    pub message_id: Option<String>,
}

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{0} provider is not configured")]
    NotConfigured(&'static str),

    #[error("network error: {0}")]
    Network(String),

    #[error("provider API error ({status}): {message}")]
    Api { status: u16, message: String },
}

#[async_trait]
pub trait NotificationProvider: Send + Sync {
    async fn send_email(&self, message: &EmailMessage) -> Result<ProviderReceipt, ProviderError>;
    async fn send_sms(&self, message: &SmsMessage) -> Result<ProviderReceipt, ProviderError>;
}

pub fn email_provider(config: &EmailConfig) -> Arc<dyn NotificationProvider> {
    match config.brevo_api_key {
        Some(_) => Arc::new(BrevoProvider {
            client: reqwest::Client::new(),
            api_base: config.brevo_api_base.clone(),
            api_key: config.brevo_api_key.clone(),
            sender_name: config.sender_name.clone(),
            sender_email: config.sender_email.clone(),
            sms_sender: String::new(),
        }),
        None => {
            tracing::warn!("BREVO_API_KEY not set, email channel disabled");
            Arc::new(DisabledProvider)
        }
    }
}

pub fn sms_provider(config: &SmsConfig) -> Arc<dyn NotificationProvider> {
    match config.provider {
        SmsProviderKind::Brevo => Arc::new(BrevoProvider {
            client: reqwest::Client::new(),
            api_base: config.brevo_api_base.clone(),
            api_key: config.brevo_api_key.clone(),
            sender_name: String::new(),
            sender_email: String::new(),
            sms_sender: config.sender.clone(),
        }),
        SmsProviderKind::Msg91 => Arc::new(Msg91Provider {
            client: reqwest::Client::new(),
            api_base: config.msg91_api_base.clone(),
            auth_key: config.msg91_auth_key.clone(),
            sender: config.sender.clone(),
        }),
        SmsProviderKind::Disabled => Arc::new(DisabledProvider),
    }
}

// Brevo transactional REST API, both channels.
pub struct BrevoProvider {
    client: reqwest::Client,
    api_base: String,
    api_key: Option<String>,
    sender_name: String,
    sender_email: String,
    sms_sender: String,
}

#[async_trait]
impl NotificationProvider for BrevoProvider {
    async fn send_email(&self, message: &EmailMessage) -> Result<ProviderReceipt, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::NotConfigured("email"))?;

        let payload = json!({
            "sender": { "name": self.sender_name, "email": self.sender_email },
            "to": [{ "email": message.to }],
            "subject": message.subject,
            "htmlContent": message.html_body,
            "textContent": message.text_body,
        });

        let response = self
            .client
            .post(format!("{}/smtp/email", self.api_base))
            .header("api-key", api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        receipt_from_response(response).await
    }

    async fn send_sms(&self, message: &SmsMessage) -> Result<ProviderReceipt, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::NotConfigured("SMS"))?;

        let payload = json!({
            "sender": self.sms_sender,
            "recipient": message.to,
            "content": message.body,
        });

        let response = self
            .client
            .post(format!("{}/transactionalSMS/sms", self.api_base))
            .header("api-key", api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        receipt_from_response(response).await
    }
}

// Legacy MSG91 gateway, SMS only.
pub struct Msg91Provider {
    client: reqwest::Client,
    api_base: String,
    auth_key: Option<String>,
    sender: String,
}

#[async_trait]
impl NotificationProvider for Msg91Provider {
    async fn send_email(&self, _message: &EmailMessage) -> Result<ProviderReceipt, ProviderError> {
        Err(ProviderError::NotConfigured("email"))
    }

    async fn send_sms(&self, message: &SmsMessage) -> Result<ProviderReceipt, ProviderError> {
        let auth_key = self
            .auth_key
            .as_deref()
            .ok_or(ProviderError::NotConfigured("SMS"))?;

        // MSG91 wants bare digits with the country prefix, no plus sign.
        let to: String = message.to.chars().filter(char::is_ascii_digit).collect();
        let payload = json!({
            "sender": self.sender,
            "route": "4",
            "country": "91",
            "sms": [{ "message": message.body, "to": [to] }],
        });

        let response = self
            .client
            .post(format!("{}/api/v2/sendsms", self.api_base))
            .header("authkey", auth_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        receipt_from_response(response).await
    }
}

// Stand-in for a channel with no backend selected.
pub struct DisabledProvider;

#[async_trait]
impl NotificationProvider for DisabledProvider {
    async fn send_email(&self, _message: &EmailMessage) -> Result<ProviderReceipt, ProviderError> {
        Err(ProviderError::NotConfigured("email"))
    }

    async fn send_sms(&self, _message: &SmsMessage) -> Result<ProviderReceipt, ProviderError> {
        Err(ProviderError::NotConfigured("SMS"))
    }
}

async fn receipt_from_response(
    response: reqwest::Response,
) -> Result<ProviderReceipt, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(ProviderError::Api {
            status: status.as_u16(),
            message,
        });
    }

    // Brevo returns {"messageId": "..."} for email and a numeric id for SMS;
    // MSG91 returns its own envelope. Take whatever id field is present.
    let body: serde_json::Value = response
        .json()
        .await
        .map_err(|e| ProviderError::Network(e.to_string()))?;
    let message_id = body
        .get("messageId")
        .or_else(|| body.get("reference"))
        .or_else(|| body.get("message"))
        .map(|v| match v {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        });

    Ok(ProviderReceipt { message_id })
}
