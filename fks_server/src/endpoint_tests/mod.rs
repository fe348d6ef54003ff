mod helpers;
mod mocks;

mod checkout;
mod dispatch;
mod flow_callbacks;
mod payments;
