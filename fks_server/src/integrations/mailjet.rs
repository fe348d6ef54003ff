//! Receipt delivery through Mailjet's v3.1 send API.
use std::{env, time::Duration};

use fks_common::Secret;
use fks_engine::{
    order_objects::Receipt,
    traits::{NotificationError, NotificationSink},
};
use html_escape::encode_text;
use log::*;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

pub const DEFAULT_MAILJET_API_URL: &str = "https://api.mailjet.com/v3.1";
const DEFAULT_SENDER_NAME: &str = "Fukusuke Sushi";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct MailjetConfig {
    pub api_url: String,
    pub api_key: String,
    pub api_secret: Secret<String>,
    pub sender_email: String,
    pub sender_name: String,
    pub timeout: Duration,
}

impl MailjetConfig {
    /// Returns `None` unless both the API key and secret are set.
    pub fn try_from_env() -> Option<Self> {
        let api_key = env::var("FKS_MAILJET_API_KEY").ok().filter(|s| !s.trim().is_empty())?;
        let api_secret = env::var("FKS_MAILJET_API_SECRET").ok().filter(|s| !s.trim().is_empty())?;
        let sender_email = env::var("FKS_MAILJET_SENDER_EMAIL").unwrap_or_else(|_| {
            warn!("🪛️ FKS_MAILJET_SENDER_EMAIL is not set. Mailjet will refuse to send receipts without a sender.");
            String::default()
        });
        let sender_name = env::var("FKS_MAILJET_SENDER_NAME").unwrap_or_else(|_| DEFAULT_SENDER_NAME.to_string());
        let timeout = env::var("FKS_MAILJET_TIMEOUT_SECS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for FKS_MAILJET_TIMEOUT_SECS. {e}"))
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);
        Some(Self {
            api_url: DEFAULT_MAILJET_API_URL.to_string(),
            api_key,
            api_secret: Secret::new(api_secret),
            sender_email,
            sender_name,
            timeout,
        })
    }
}

#[derive(Deserialize)]
struct SendResponse {
    #[serde(rename = "Messages", default)]
    messages: Vec<MessageResult>,
}

#[derive(Deserialize)]
struct MessageResult {
    #[serde(rename = "Status")]
    status: String,
    #[serde(rename = "Errors", default)]
    errors: Vec<Value>,
}

#[derive(Clone)]
pub struct MailjetNotifier {
    config: MailjetConfig,
    client: Client,
}

impl MailjetNotifier {
    pub fn new(config: MailjetConfig) -> Result<Self, NotificationError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| NotificationError::NotConfigured(format!("Could not build the Mailjet client. {e}")))?;
        Ok(Self { config, client })
    }

    pub fn sender_email(&self) -> &str {
        &self.config.sender_email
    }

    fn message_for(&self, receipt: &Receipt) -> Value {
        let name = if receipt.contact.name.trim().is_empty() { "Cliente" } else { receipt.contact.name.as_str() };
        json!({
            "Messages": [{
                "From": { "Email": self.config.sender_email, "Name": self.config.sender_name },
                "To": [{ "Email": receipt.contact.email, "Name": name }],
                "Subject": format!("Comprobante de compra - Ticket #{}", receipt.ticket_id),
                "HTMLPart": receipt_html(receipt),
            }]
        })
    }
}

impl NotificationSink for MailjetNotifier {
    async fn send_receipt(&self, receipt: &Receipt) -> Result<(), NotificationError> {
        if self.config.sender_email.is_empty() {
            return Err(NotificationError::NotConfigured("No sender address".to_string()));
        }
        let url = format!("{}/send", self.config.api_url);
        trace!("📧️ Sending receipt for {} via Mailjet", receipt.ticket_id);
        let response = self
            .client
            .post(url)
            .basic_auth(&self.config.api_key, Some(self.config.api_secret.reveal()))
            .json(&self.message_for(receipt))
            .send()
            .await
            .map_err(|e| NotificationError::DeliveryFailed(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::DeliveryFailed(format!("Mailjet returned {status}. {body}")));
        }
        let result = response
            .json::<SendResponse>()
            .await
            .map_err(|e| NotificationError::DeliveryFailed(format!("Unexpected Mailjet response. {e}")))?;
        match result.messages.iter().find(|m| m.status != "success") {
            Some(m) => Err(NotificationError::DeliveryFailed(format!("Mailjet status {}: {:?}", m.status, m.errors))),
            None => Ok(()),
        }
    }
}

/// Buyer-supplied text (names, email, phone, item names) is HTML-escaped.
fn receipt_html(receipt: &Receipt) -> String {
    let items = receipt
        .items
        .iter()
        .map(|i| {
            format!(
                "<li>{} - {} x {} = <strong>{}</strong></li>",
                encode_text(&i.name),
                i.quantity,
                i.unit_price,
                i.subtotal
            )
        })
        .collect::<String>();
    let phone = encode_text(receipt.contact.phone.as_deref().unwrap_or("-"));
    format!(
        "<div style=\"font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;\">\
         <h2>Comprobante de Pago - Fukusuke Sushi</h2>\
         <p><strong>Ticket:</strong> {}</p>\
         <p><strong>Fecha:</strong> {}</p>\
         <p><strong>Nombre:</strong> {}</p>\
         <p><strong>Email:</strong> {}</p>\
         <p><strong>Teléfono:</strong> {phone}</p>\
         <h3>Productos:</h3><ul>{items}</ul>\
         <p style=\"font-size: 18px; font-weight: bold;\">Total pagado: {}</p>\
         </div>",
        receipt.ticket_id,
        receipt.paid_at.format("%d-%m-%Y %H:%M"),
        encode_text(&receipt.contact.name),
        encode_text(&receipt.contact.email),
        receipt.total,
    )
}
