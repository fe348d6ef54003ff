//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests:
//! ```nocompile
//!     fn my_handler() -> impl Responder {
//!         std::thread::sleep(Duration::from_secs(5)); // <-- Bad practice! Will cause the current worker thread to
//! hang!
//!     }
//! ```
//! For this reason, any long, non-cpu-bound operation (e.g. I/O, database operations, gateway calls) should be
//! expressed as futures or asynchronous functions. Async handlers get executed concurrently by worker threads and
//! thus don’t block execution.
use actix_web::{get, http::header, web, HttpResponse, Responder};
use fks_engine::{
    db_types::Role,
    order_objects::{Buyer, CheckoutRequest, PaymentRequest},
    traits::{Pagination, PaymentGateway, PaymentGatewayDatabase},
    DispatchApi,
    OrderFlowApi,
    OrderFlowError,
};
use log::*;

use crate::{
    auth::CallerIdentity,
    config::LandingPages,
    data_objects::{ConfirmationAck, TokenParams},
    errors::ServerError,
    helpers::return_redirect_target,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where requires [$($roles:expr),*])  => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds)++ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Checkout  ----------------------------------------------------
route!(create_customer_order => Post "/orders" impl PaymentGatewayDatabase, PaymentGateway);
/// Checkout for signed-in customers.
///
/// The caller must present a bearer token. The new order is linked to the caller's user id.
pub async fn create_customer_order<B, G>(
    caller: CallerIdentity,
    body: web::Json<CheckoutRequest>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentGatewayDatabase,
    G: PaymentGateway,
{
    debug!("💻️ POST checkout for user {}", caller.user_id);
    let result = api.create_order(body.into_inner(), Buyer::Customer(caller.user_id)).await?;
    Ok(HttpResponse::Created().json(result))
}

route!(create_guest_order => Post "/orders/public" impl PaymentGatewayDatabase, PaymentGateway);
/// Checkout without an account. The order has no customer id.
pub async fn create_guest_order<B, G>(
    body: web::Json<CheckoutRequest>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentGatewayDatabase,
    G: PaymentGateway,
{
    debug!("💻️ POST guest checkout");
    let result = api.create_order(body.into_inner(), Buyer::Guest).await?;
    Ok(HttpResponse::Created().json(result))
}

route!(order_by_token => Get "/orders/by-token/{token}" impl PaymentGatewayDatabase, PaymentGateway);
/// The order (with its line items) behind a gateway token. The landing pages use this to render the receipt.
pub async fn order_by_token<B, G>(
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentGatewayDatabase,
    G: PaymentGateway,
{
    let token = path.into_inner();
    trace!("💻️ GET order for token {token}");
    let order = api.order_by_token(&token).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(begin_payment => Post "/payments" impl PaymentGatewayDatabase, PaymentGateway);
/// Opens a payment session for an order. Expects `{"ticket_id": "...", "amount": <integer>}` and returns the URL the
/// buyer should be sent to, along with the session token.
pub async fn begin_payment<B, G>(
    body: web::Json<PaymentRequest>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentGatewayDatabase,
    G: PaymentGateway,
{
    let request = body.into_inner();
    debug!("💻️ POST begin payment for {}", request.ticket_id);
    let intent = api.begin_payment(request).await?;
    Ok(HttpResponse::Ok().json(intent))
}

//----------------------------------------------   Flow callbacks  ----------------------------------------------------
route!(flow_confirmation => Post "/confirmation" impl PaymentGatewayDatabase, PaymentGateway);
/// Flow's server-to-server confirmation webhook.
///
/// Flow retries this call until it gets a success response, so it is always acknowledged with a 200. Reconciliation
/// failures are logged for follow-up instead.
pub async fn flow_confirmation<B, G>(
    form: Option<web::Form<TokenParams>>,
    query: Option<web::Query<TokenParams>>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> HttpResponse
where
    B: PaymentGatewayDatabase,
    G: PaymentGateway,
{
    let token = TokenParams::first_token(&[form.as_deref(), query.as_deref()]);
    match token {
        None => warn!("💻️ Flow confirmation arrived without a token. Ignoring it."),
        Some(token) => match api.reconcile(&token).await {
            Ok(outcome) => info!(
                "💻️ Flow confirmation for {token} processed. Order {} is {}",
                outcome.order.ticket_id,
                outcome.status()
            ),
            Err(e) if e.is_retryable() => {
                warn!("💻️ Flow confirmation for {token} could not be processed yet. Flow may retry it. {e}")
            },
            Err(e) => error!("💻️ Flow confirmation for {token} failed. {e}"),
        },
    }
    HttpResponse::Ok().json(ConfirmationAck::received())
}

route!(flow_return => Post "/return" impl PaymentGatewayDatabase, PaymentGateway);
/// Where Flow posts the buyer's browser once the payment flow is over.
///
/// The payment is reconciled and the browser is redirected to the matching landing page. This handler never fails;
/// errors become an `error` query parameter on the error landing page.
pub async fn flow_return<B, G>(
    form: Option<web::Form<TokenParams>>,
    query: Option<web::Query<TokenParams>>,
    pages: web::Data<LandingPages>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> HttpResponse
where
    B: PaymentGatewayDatabase,
    G: PaymentGateway,
{
    let token = TokenParams::first_token(&[form.as_deref(), query.as_deref()]);
    return_redirect(token, pages.as_ref(), api.as_ref()).await
}

route!(flow_return_link => Get "/return" impl PaymentGatewayDatabase, PaymentGateway);
/// The `GET` variant of [`flow_return`], for gateways and bookmarks that send the token in the query string.
pub async fn flow_return_link<B, G>(
    query: Option<web::Query<TokenParams>>,
    pages: web::Data<LandingPages>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> HttpResponse
where
    B: PaymentGatewayDatabase,
    G: PaymentGateway,
{
    let token = TokenParams::first_token(&[query.as_deref()]);
    return_redirect(token, pages.as_ref(), api.as_ref()).await
}

async fn return_redirect<B, G>(token: Option<String>, pages: &LandingPages, api: &OrderFlowApi<B, G>) -> HttpResponse
where
    B: PaymentGatewayDatabase,
    G: PaymentGateway,
{
    let result = match token.as_deref() {
        Some(token) => api.reconcile(token).await,
        None => Err(OrderFlowError::Validation("The return callback carried no token".to_string())),
    };
    if let Err(e) = &result {
        warn!("💻️ Payment return for token {} failed. {e}", token.as_deref().unwrap_or("<none>"));
    }
    let target = return_redirect_target(pages, token.as_deref(), &result);
    debug!("💻️ Redirecting buyer to {target}");
    HttpResponse::SeeOther().insert_header((header::LOCATION, target)).finish()
}

//----------------------------------------------   Dispatch  ----------------------------------------------------
route!(fulfillments => Get "/dispatch" impl PaymentGatewayDatabase where requires [Role::Admin, Role::Dispatcher]);
/// A page of fulfillment records, newest first. Use `?page=` and `?limit=` to page through them.
pub async fn fulfillments<B: PaymentGatewayDatabase>(
    query: web::Query<Pagination>,
    api: web::Data<DispatchApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let page = query.into_inner();
    trace!("💻️ GET fulfillments page {} ({} per page)", page.page, page.limit);
    let result = api.fulfillments(page).await?;
    Ok(HttpResponse::Ok().json(result))
}

route!(my_deliveries => Get "/dispatch/mine" impl PaymentGatewayDatabase where requires [Role::Admin, Role::Dispatcher]);
/// The deliveries the caller has claimed.
pub async fn my_deliveries<B: PaymentGatewayDatabase>(
    caller: CallerIdentity,
    api: web::Data<DispatchApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET deliveries for handler {}", caller.user_id);
    let result = api.fulfillments_for_handler(caller.user_id).await?;
    Ok(HttpResponse::Ok().json(result))
}

route!(claim_fulfillment => Post "/dispatch/{id}/claim" impl PaymentGatewayDatabase where requires [Role::Admin, Role::Dispatcher]);
/// Assigns a pending fulfillment record to the caller. Fails with a 409 if someone else got there first.
pub async fn claim_fulfillment<B: PaymentGatewayDatabase>(
    caller: CallerIdentity,
    path: web::Path<i64>,
    api: web::Data<DispatchApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ POST claim fulfillment {id} for handler {}", caller.user_id);
    let result = api.claim(id, &caller.as_handler()).await?;
    Ok(HttpResponse::Ok().json(result))
}

route!(complete_fulfillment => Post "/dispatch/{id}/complete" impl PaymentGatewayDatabase where requires [Role::Admin, Role::Dispatcher]);
/// Marks a delivery as done. Only the handler who claimed it can complete it.
pub async fn complete_fulfillment<B: PaymentGatewayDatabase>(
    caller: CallerIdentity,
    path: web::Path<i64>,
    api: web::Data<DispatchApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ POST complete fulfillment {id} for handler {}", caller.user_id);
    let result = api.complete(id, caller.user_id).await?;
    Ok(HttpResponse::Ok().json(result))
}
