use fks_engine::{
    db_types::GatewayToken,
    traits::{GatewayError, GatewayPaymentStatus, PaymentGateway, PaymentIntent, PaymentIntentRequest},
};
use mockall::mock;

mock! {
    pub FlowGateway {}
    impl PaymentGateway for FlowGateway {
        async fn create_payment_intent(&self, request: &PaymentIntentRequest) -> Result<PaymentIntent, GatewayError>;
        async fn payment_status(&self, token: &GatewayToken) -> Result<GatewayPaymentStatus, GatewayError>;
    }
}
