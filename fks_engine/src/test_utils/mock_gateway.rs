use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
    time::Duration,
};

use fks_common::{PaymentOutcome, Pesos};

use crate::{
    db_types::GatewayToken,
    traits::{GatewayError, GatewayPaymentStatus, PaymentGateway, PaymentIntent, PaymentIntentRequest},
};

#[derive(Debug, Default)]
struct GatewayState {
    next_tokens: VecDeque<String>,
    /// token -> (merchant reference, amount)
    sessions: HashMap<String, (String, Pesos)>,
    outcomes: HashMap<String, PaymentOutcome>,
    create_failure: Option<GatewayError>,
    status_failure: Option<GatewayError>,
    status_delay: Option<Duration>,
    intents_created: usize,
    status_calls: usize,
}

/// An in-memory stand-in for the payment gateway.
///
/// Tokens are handed out from a queue (`queue_token`), or generated. The verdict for each token is set with
/// `set_outcome`; tokens without one report `Pending`.
#[derive(Debug, Clone, Default)]
pub struct MockGateway {
    state: Arc<Mutex<GatewayState>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut GatewayState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut state)
    }

    /// The next payment session will be issued this token.
    pub fn queue_token(&self, token: &str) -> &Self {
        self.with_state(|s| s.next_tokens.push_back(token.to_string()));
        self
    }

    pub fn set_outcome(&self, token: &str, outcome: PaymentOutcome) -> &Self {
        self.with_state(|s| s.outcomes.insert(token.to_string(), outcome));
        self
    }

    /// Overrides the merchant reference and amount reported for `token`.
    pub fn set_session(&self, token: &str, reference: &str, amount: Pesos) -> &Self {
        self.with_state(|s| s.sessions.insert(token.to_string(), (reference.to_string(), amount)));
        self
    }

    pub fn fail_create_with(&self, error: Option<GatewayError>) -> &Self {
        self.with_state(|s| s.create_failure = error);
        self
    }

    pub fn fail_status_with(&self, error: Option<GatewayError>) -> &Self {
        self.with_state(|s| s.status_failure = error);
        self
    }

    /// Every status query sleeps this long before answering. Widens race windows in concurrency tests.
    pub fn delay_status(&self, delay: Duration) -> &Self {
        self.with_state(|s| s.status_delay = Some(delay));
        self
    }

    pub fn intents_created(&self) -> usize {
        self.with_state(|s| s.intents_created)
    }

    pub fn status_calls(&self) -> usize {
        self.with_state(|s| s.status_calls)
    }
}

impl PaymentGateway for MockGateway {
    async fn create_payment_intent(&self, request: &PaymentIntentRequest) -> Result<PaymentIntent, GatewayError> {
        let token = self.with_state(|s| {
            if let Some(e) = s.create_failure.clone() {
                return Err(e);
            }
            s.intents_created += 1;
            let token = s.next_tokens.pop_front().unwrap_or_else(|| format!("tok-{}", rand::random::<u32>()));
            s.sessions
                .entry(token.clone())
                .or_insert_with(|| (request.ticket_id.to_string(), request.amount));
            Ok(token)
        })?;
        let token = token.parse::<GatewayToken>().map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        Ok(PaymentIntent { redirect_url: format!("https://gateway.test/pay?token={token}"), token })
    }

    async fn payment_status(&self, token: &GatewayToken) -> Result<GatewayPaymentStatus, GatewayError> {
        let delay = self.with_state(|s| {
            s.status_calls += 1;
            s.status_delay
        });
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.with_state(|s| {
            if let Some(e) = s.status_failure.clone() {
                return Err(e);
            }
            let outcome = s.outcomes.get(token.as_str()).copied().unwrap_or(PaymentOutcome::Pending);
            let (order_reference, amount) = s
                .sessions
                .get(token.as_str())
                .cloned()
                .ok_or_else(|| GatewayError::Refused(format!("Unknown token {token}")))?;
            Ok(GatewayPaymentStatus { outcome, order_reference, amount: Some(amount) })
        })
    }
}
