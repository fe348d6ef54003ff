use fks_common::{PaymentOutcome, Pesos};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{GatewayToken, TicketId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntentRequest {
    pub ticket_id: TicketId,
    pub amount: Pesos,
    pub email: String,
}

/// A remote payment session. The buyer completes the payment at `redirect_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub redirect_url: String,
    pub token: GatewayToken,
}

/// The gateway's authoritative view of a payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayPaymentStatus {
    pub outcome: PaymentOutcome,
    /// The merchant reference the payment was opened with. This is the order's ticket id.
    pub order_reference: String,
    /// The amount the gateway charged, if it reported one.
    pub amount: Option<Pesos>,
}

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("The payment gateway is unavailable. {0}")]
    Unavailable(String),
    #[error("The payment gateway refused the request. {0}")]
    Refused(String),
    #[error("The payment gateway sent an invalid response. {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// Whether the same call may succeed if repeated later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::InvalidResponse(_))
    }
}

/// The remote payment service that the lifecycle service opens payment sessions with, and asks for payment status.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    async fn create_payment_intent(&self, request: &PaymentIntentRequest) -> Result<PaymentIntent, GatewayError>;

    async fn payment_status(&self, token: &GatewayToken) -> Result<GatewayPaymentStatus, GatewayError>;
}
