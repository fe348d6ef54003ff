use std::{env, time::Duration};

use fks_common::{Secret, CLP_CURRENCY_CODE};
use log::*;

const DEFAULT_FLOW_API_URL: &str = "https://sandbox.flow.cl/api";
const DEFAULT_SUBJECT: &str = "Pedido en Fukusuke Sushi";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct FlowConfig {
    /// Base URL of the Flow REST API, without a trailing slash. Production is `https://www.flow.cl/api`.
    pub api_url: String,
    pub api_key: String,
    pub secret_key: Secret<String>,
    /// Where Flow posts server-to-server payment confirmations (the webhook).
    pub confirmation_url: String,
    /// Where Flow sends the buyer's browser once the payment page is done.
    pub return_url: String,
    /// The subject line shown to the buyer on the payment page.
    pub subject: String,
    pub currency: String,
    /// Upper bound for every request made to Flow.
    pub timeout: Duration,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_FLOW_API_URL.to_string(),
            api_key: String::default(),
            secret_key: Secret::default(),
            confirmation_url: "http://localhost:8360/flow/confirmation".to_string(),
            return_url: "http://localhost:8360/flow/return".to_string(),
            subject: DEFAULT_SUBJECT.to_string(),
            currency: CLP_CURRENCY_CODE.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl FlowConfig {
    pub fn new_from_env_or_default() -> Self {
        let defaults = Self::default();
        let api_url = env::var("FKS_FLOW_API_URL").unwrap_or_else(|_| {
            warn!("🪛️ FKS_FLOW_API_URL not set, using the Flow sandbox ({DEFAULT_FLOW_API_URL})");
            defaults.api_url.clone()
        });
        let api_key = env::var("FKS_FLOW_API_KEY").unwrap_or_else(|_| {
            error!("🪛️ FKS_FLOW_API_KEY is not set. Payments will be rejected by Flow.");
            String::default()
        });
        let secret_key = Secret::new(env::var("FKS_FLOW_SECRET_KEY").unwrap_or_else(|_| {
            error!("🪛️ FKS_FLOW_SECRET_KEY is not set. Payments will be rejected by Flow.");
            String::default()
        }));
        let confirmation_url = env::var("FKS_FLOW_CONFIRMATION_URL").unwrap_or_else(|_| {
            warn!("🪛️ FKS_FLOW_CONFIRMATION_URL not set, using {}", defaults.confirmation_url);
            defaults.confirmation_url.clone()
        });
        let return_url = env::var("FKS_FLOW_RETURN_URL").unwrap_or_else(|_| {
            warn!("🪛️ FKS_FLOW_RETURN_URL not set, using {}", defaults.return_url);
            defaults.return_url.clone()
        });
        let subject = env::var("FKS_FLOW_SUBJECT").unwrap_or(defaults.subject);
        let timeout = env::var("FKS_FLOW_TIMEOUT_SECS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for FKS_FLOW_TIMEOUT_SECS. {e}"))
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
            secret_key,
            confirmation_url,
            return_url,
            subject,
            currency: defaults.currency,
            timeout,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_url)
    }
}
