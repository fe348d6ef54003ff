//! Mapping reconciliation results onto the landing pages the buyer's browser is sent to.
use fks_engine::{db_types::OrderStatusType, order_objects::ReconcileOutcome, OrderFlowError};
use log::*;
use reqwest::Url;

use crate::config::LandingPages;

/// The landing page for a reconciliation result, with `token` (and `error`, on failure) appended as query parameters.
pub fn return_redirect_target(
    pages: &LandingPages,
    token: Option<&str>,
    result: &Result<ReconcileOutcome, OrderFlowError>,
) -> String {
    let Some(token) = token else {
        return landing_url(&pages.error_url, &[("error", "validation")]);
    };
    match result {
        Ok(outcome) => match outcome.status() {
            OrderStatusType::Paid => landing_url(&pages.success_url, &[("token", token)]),
            OrderStatusType::Pending | OrderStatusType::AwaitingConfirmation => {
                landing_url(&pages.pending_url, &[("token", token)])
            },
            OrderStatusType::Rejected => landing_url(&pages.error_url, &[("token", token), ("error", "rejected")]),
        },
        Err(e) => landing_url(&pages.error_url, &[("token", token), ("error", e.code())]),
    }
}

/// Appends the query parameters to `base`. If `base` is not a valid URL it is returned as is.
pub fn landing_url(base: &str, params: &[(&str, &str)]) -> String {
    match Url::parse_with_params(base, params) {
        Ok(url) => url.to_string(),
        Err(e) => {
            warn!("💻️ Landing page {base} is not a valid URL. {e}");
            base.to_string()
        },
    }
}
