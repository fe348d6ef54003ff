use flow_client::{FlowApi, FlowApiError, NewPaymentRequest};
use log::*;

use crate::{
    db_types::GatewayToken,
    traits::{GatewayError, GatewayPaymentStatus, PaymentGateway, PaymentIntent, PaymentIntentRequest},
};

impl From<FlowApiError> for GatewayError {
    fn from(e: FlowApiError) -> Self {
        match e {
            FlowApiError::Timeout(_) | FlowApiError::Transport(_) => GatewayError::Unavailable(e.to_string()),
            FlowApiError::QueryError { status, .. } if status >= 500 => GatewayError::Unavailable(e.to_string()),
            FlowApiError::JsonError(_) | FlowApiError::UnknownStatus(_) => GatewayError::InvalidResponse(e.to_string()),
            FlowApiError::QueryError { .. } | FlowApiError::Initialization(_) | FlowApiError::InvalidRequest(_) => {
                GatewayError::Refused(e.to_string())
            },
        }
    }
}

impl PaymentGateway for FlowApi {
    async fn create_payment_intent(&self, request: &PaymentIntentRequest) -> Result<PaymentIntent, GatewayError> {
        let payment = NewPaymentRequest::new(request.ticket_id.as_str(), request.amount, request.email.as_str());
        let created = self.create_payment(&payment).await?;
        let token = created
            .token
            .parse::<GatewayToken>()
            .map_err(|e| GatewayError::InvalidResponse(format!("Flow returned an unusable token. {e}")))?;
        trace!("🌊️ Flow payment {:?} created for {}", created.flow_order, request.ticket_id);
        Ok(PaymentIntent { redirect_url: created.redirect_url(), token })
    }

    async fn payment_status(&self, token: &GatewayToken) -> Result<GatewayPaymentStatus, GatewayError> {
        let response = self.get_payment_status(token.as_str()).await?;
        let outcome = response.outcome()?;
        Ok(GatewayPaymentStatus { outcome, order_reference: response.commerce_order.clone(), amount: response.amount() })
    }
}
