mod helpers;
mod payment_outcome;
mod pesos;

pub mod op;
mod secret;

pub use helpers::{env_flag, parse_boolean_flag};
pub use payment_outcome::PaymentOutcome;
pub use pesos::{Pesos, PesosConversionError, CLP_CURRENCY_CODE};
pub use secret::Secret;
