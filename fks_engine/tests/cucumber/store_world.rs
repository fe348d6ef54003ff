use std::collections::HashMap;

use cucumber::World;
use fks_engine::{
    db_types::TicketId,
    events::EventProducers,
    test_utils::{prepare_env::fresh_database, MockGateway},
    OrderFlowApi,
    OrderFlowError,
    PaymentGatewayDatabase,
    SqliteDatabase,
};
use log::*;

#[derive(Default, Debug, World)]
pub struct StoreWorld {
    pub system: Option<StoreSystem>,
}

#[derive(Debug)]
pub struct StoreSystem {
    pub db_path: String,
    pub api: OrderFlowApi<SqliteDatabase, MockGateway>,
    pub gateway: MockGateway,
    /// Feature files name orders by alias, since ticket ids are generated.
    pub tickets: HashMap<String, TicketId>,
    pub last_error: Option<OrderFlowError>,
}

impl StoreWorld {
    pub fn system(&mut self) -> &mut StoreSystem {
        self.system.as_mut().expect("Store system not initialised")
    }

    pub fn api(&self) -> &OrderFlowApi<SqliteDatabase, MockGateway> {
        &self.system.as_ref().expect("Store system not initialised").api
    }

    pub fn ticket(&self, alias: &str) -> TicketId {
        let system = self.system.as_ref().expect("Store system not initialised");
        system.tickets.get(alias).cloned().unwrap_or_else(|| panic!("No order has the alias {alias}"))
    }
}

impl StoreSystem {
    pub async fn new() -> Self {
        let db = fresh_database(1).await;
        let db_path = db.url().to_string();
        debug!("Created database: {db_path}");
        let gateway = MockGateway::new();
        let api = OrderFlowApi::new(db, gateway.clone(), EventProducers::default());
        Self { db_path, api, gateway, tickets: HashMap::new(), last_error: None }
    }
}
