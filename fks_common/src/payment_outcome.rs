use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// The gateway-independent view of a payment result that order reconciliation acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOutcome {
    Successful,
    Rejected,
    /// Still in progress, or indeterminate. Ask again later.
    Pending,
}

impl Display for PaymentOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Successful => write!(f, "Successful"),
            Self::Rejected => write!(f, "Rejected"),
            Self::Pending => write!(f, "Pending"),
        }
    }
}
