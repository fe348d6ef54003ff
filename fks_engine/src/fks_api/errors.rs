use thiserror::Error;

use crate::traits::{GatewayError, PaymentGatewayError};

/// Errors surfaced by the order lifecycle and dispatch APIs.
#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    /// Bad caller input. Never retried automatically.
    #[error("Invalid request. {0}")]
    Validation(String),
    /// Well-formed input that refers to nothing we know about.
    #[error("Not found. {0}")]
    NotFound(String),
    /// A concurrency or id-generation clash, or an operation the order's current state does not allow.
    #[error("Conflict. {0}")]
    Conflict(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Gateway(#[from] GatewayError),
    #[error("Database error. {0}")]
    Database(String),
}

impl OrderFlowError {
    /// A short, stable code suitable for query strings and logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Forbidden(_) => "forbidden",
            Self::Gateway(_) => "gateway",
            Self::Database(_) => "internal",
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Gateway(e) => e.is_retryable(),
            Self::Database(_) => true,
            _ => false,
        }
    }
}

impl From<PaymentGatewayError> for OrderFlowError {
    fn from(e: PaymentGatewayError) -> Self {
        use PaymentGatewayError::*;
        match e {
            DatabaseError(s) => Self::Database(s),
            OrderIdNotFound(_) | OrderNotFound(_) | FulfillmentNotFound(_) => Self::NotFound(e.to_string()),
            TicketIdCollision(_) |
            TokenConflict { .. } |
            TokenAlreadyInUse(_) |
            DuplicateFulfillment(_) |
            FulfillmentAlreadyClaimed(_) |
            FulfillmentNotAssigned(_) => Self::Conflict(e.to_string()),
            FulfillmentNotAssignedTo { .. } => Self::Forbidden(e.to_string()),
        }
    }
}
