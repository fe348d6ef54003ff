use std::fmt::Display;

use fks_common::{PaymentOutcome, Pesos};
use serde::{Deserialize, Serialize};

use crate::FlowApiError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPaymentRequest {
    /// The merchant's own reference for the payment. The storefront uses the order's ticket id.
    pub commerce_order: String,
    pub amount: Pesos,
    pub email: String,
}

impl NewPaymentRequest {
    pub fn new<S: Into<String>>(commerce_order: S, amount: Pesos, email: S) -> Self {
        Self { commerce_order: commerce_order.into(), amount, email: email.into() }
    }
}

/// The response to `payment/create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCreated {
    pub url: String,
    pub token: String,
    #[serde(default)]
    pub flow_order: Option<i64>,
}

impl PaymentCreated {
    /// The address the buyer's browser must be sent to in order to pay.
    pub fn redirect_url(&self) -> String {
        format!("{}?token={}", self.url, self.token)
    }
}

/// The response to `payment/getStatus`. Only the fields the storefront relies on are modelled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusResponse {
    #[serde(default)]
    pub flow_order: Option<i64>,
    pub commerce_order: String,
    pub status: i64,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub payer: Option<String>,
}

impl PaymentStatusResponse {
    pub fn status(&self) -> Result<FlowPaymentStatus, FlowApiError> {
        FlowPaymentStatus::from_code(self.status)
    }

    pub fn outcome(&self) -> Result<PaymentOutcome, FlowApiError> {
        self.status().map(PaymentOutcome::from)
    }

    /// The amount Flow reports, if it is present and a whole number of pesos.
    pub fn amount(&self) -> Option<Pesos> {
        self.amount.and_then(|a| Pesos::try_from(a).ok())
    }
}

/// Flow's payment status codes, as documented for `payment/getStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowPaymentStatus {
    /// 1: the payment has not been completed yet.
    Pending,
    /// 2: the payment was made.
    Paid,
    /// 3: the payment was rejected.
    Rejected,
    /// 4: the payment was cancelled.
    Cancelled,
}

impl FlowPaymentStatus {
    /// The only place in the code base where Flow's numeric status codes are interpreted.
    pub fn from_code(code: i64) -> Result<Self, FlowApiError> {
        match code {
            1 => Ok(Self::Pending),
            2 => Ok(Self::Paid),
            3 => Ok(Self::Rejected),
            4 => Ok(Self::Cancelled),
            c => Err(FlowApiError::UnknownStatus(c)),
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            Self::Pending => 1,
            Self::Paid => 2,
            Self::Rejected => 3,
            Self::Cancelled => 4,
        }
    }
}

impl Display for FlowPaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Paid => write!(f, "Paid"),
            Self::Rejected => write!(f, "Rejected"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl From<FlowPaymentStatus> for PaymentOutcome {
    fn from(status: FlowPaymentStatus) -> Self {
        match status {
            FlowPaymentStatus::Paid => Self::Successful,
            FlowPaymentStatus::Rejected | FlowPaymentStatus::Cancelled => Self::Rejected,
            FlowPaymentStatus::Pending => Self::Pending,
        }
    }
}
