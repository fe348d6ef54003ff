use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use fks_engine::{
    events::EventProducers,
    traits::{PaymentGateway, PaymentGatewayDatabase},
    DispatchApi,
    OrderFlowApi,
    SqliteDatabase,
};
use flow_client::FlowApi;
use log::*;

use crate::{
    auth::TokenVerifier,
    config::ServerConfig,
    errors::ServerError,
    integrations::receipts::create_receipt_event_handlers,
    routes::{
        health,
        BeginPaymentRoute,
        ClaimFulfillmentRoute,
        CompleteFulfillmentRoute,
        CreateCustomerOrderRoute,
        CreateGuestOrderRoute,
        FlowConfirmationRoute,
        FlowReturnLinkRoute,
        FlowReturnRoute,
        FulfillmentsRoute,
        MyDeliveriesRoute,
        OrderByTokenRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.run_migrations {
        db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Could not run migrations. {e}")))?;
        info!("🚀️ Database migrations are up to date");
    }
    let gateway = FlowApi::new(config.flow.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = create_receipt_event_handlers(config.mailjet.clone());
    let producers = handlers.producers();
    let _tasks = handlers.start_handlers();
    let srv = create_server_instance(config, db, gateway, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance<B, G>(
    config: ServerConfig,
    db: B,
    gateway: G,
    producers: EventProducers,
) -> Result<Server, ServerError>
where
    B: PaymentGatewayDatabase + Send + 'static,
    G: PaymentGateway + Clone + Send + 'static,
{
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), gateway.clone(), producers.clone());
        let dispatch_api = DispatchApi::new(db.clone());
        let verifier = TokenVerifier::new(&config.auth);
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("fks::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(dispatch_api))
            .app_data(web::Data::new(verifier))
            .app_data(web::Data::new(config.landing_pages.clone()))
            .configure(configure_routes::<B, G>)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Registers every route. The API state (`OrderFlowApi<B, G>`, `DispatchApi<B>`, `TokenVerifier` and
/// `LandingPages`) must already be registered as app data.
pub fn configure_routes<B, G>(cfg: &mut web::ServiceConfig)
where
    B: PaymentGatewayDatabase + 'static,
    G: PaymentGateway + 'static,
{
    let api_scope = web::scope("/api")
        .service(CreateCustomerOrderRoute::<B, G>::new())
        .service(CreateGuestOrderRoute::<B, G>::new())
        .service(OrderByTokenRoute::<B, G>::new())
        .service(BeginPaymentRoute::<B, G>::new())
        .service(FulfillmentsRoute::<B>::new())
        .service(MyDeliveriesRoute::<B>::new())
        .service(ClaimFulfillmentRoute::<B>::new())
        .service(CompleteFulfillmentRoute::<B>::new());
    let flow_scope = web::scope("/flow")
        .service(FlowConfirmationRoute::<B, G>::new())
        .service(FlowReturnRoute::<B, G>::new())
        .service(FlowReturnLinkRoute::<B, G>::new());
    cfg.service(health).service(flow_scope).service(api_scope);
}
