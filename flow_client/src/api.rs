use std::sync::Arc;

use log::*;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize};

use crate::{
    config::FlowConfig,
    data_objects::{NewPaymentRequest, PaymentCreated, PaymentStatusResponse},
    signature::{sign_params, SIGNATURE_PARAM},
    FlowApiError,
};

#[derive(Clone)]
pub struct FlowApi {
    config: FlowConfig,
    client: Arc<Client>,
}

/// Flow reports request errors as `{ "code": 1620, "message": "..." }`
#[derive(Deserialize)]
struct FlowErrorBody {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

impl FlowApi {
    pub fn new(config: FlowConfig) -> Result<Self, FlowApiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FlowApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    /// Opens a payment session at Flow for the given order reference.
    pub async fn create_payment(&self, request: &NewPaymentRequest) -> Result<PaymentCreated, FlowApiError> {
        if !request.amount.is_positive() {
            return Err(FlowApiError::InvalidRequest(format!("amount must be positive, not {}", request.amount)));
        }
        let params = self.signed_params(vec![
            ("apiKey", self.config.api_key.clone()),
            ("commerceOrder", request.commerce_order.clone()),
            ("subject", self.config.subject.clone()),
            ("currency", self.config.currency.clone()),
            ("amount", request.amount.value().to_string()),
            ("email", request.email.clone()),
            ("urlConfirmation", self.config.confirmation_url.clone()),
            ("urlReturn", self.config.return_url.clone()),
        ]);
        let url = self.config.url("/payment/create");
        debug!("🌊️ Creating Flow payment for {} ({})", request.commerce_order, request.amount);
        let response = self.client.post(url).form(&params).send().await?;
        let created = parse_response::<PaymentCreated>(response).await?;
        if created.token.trim().is_empty() || created.url.trim().is_empty() {
            return Err(FlowApiError::JsonError("payment/create returned an empty url or token".to_string()));
        }
        info!("🌊️ Flow payment created for {}. Token: {}", request.commerce_order, created.token);
        Ok(created)
    }

    /// Asks Flow for the authoritative status of the payment session identified by `token`.
    pub async fn get_payment_status(&self, token: &str) -> Result<PaymentStatusResponse, FlowApiError> {
        let params = self.signed_params(vec![("apiKey", self.config.api_key.clone()), ("token", token.to_string())]);
        let url = self.config.url("/payment/getStatus");
        trace!("🌊️ Querying Flow payment status for {token}");
        let response = self.client.get(url).query(&params).send().await?;
        let status = parse_response::<PaymentStatusResponse>(response).await?;
        // Surface unknown codes here rather than letting them travel further
        let flow_status = status.status()?;
        debug!("🌊️ Flow reports {flow_status} for {token} ({})", status.commerce_order);
        Ok(status)
    }

    fn signed_params(&self, mut params: Vec<(&'static str, String)>) -> Vec<(&'static str, String)> {
        let signature = sign_params(&params, self.config.secret_key.reveal());
        params.push((SIGNATURE_PARAM, signature));
        params
    }
}

async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, FlowApiError> {
    let status = response.status();
    if status.is_success() {
        trace!("🌊️ Flow query successful. {status}");
        response.json::<T>().await.map_err(|e| FlowApiError::JsonError(e.to_string()))
    } else {
        let body = response.text().await?;
        let message = match serde_json::from_str::<FlowErrorBody>(&body) {
            Ok(FlowErrorBody { code: Some(code), message: Some(msg) }) => format!("[{code}] {msg}"),
            Ok(FlowErrorBody { message: Some(msg), .. }) => msg,
            _ => body,
        };
        warn!("🌊️ Flow query failed. {status}. {message}");
        Err(FlowApiError::QueryError { status: status.as_u16(), message })
    }
}
