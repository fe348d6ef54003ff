use std::{future::Future, pin::Pin, sync::Arc};

use futures_util::future::join_all;
use tokio::task::JoinHandle;

use crate::events::{EventHandler, EventProducer, Handler, OrderAnnulledEvent, OrderPaidEvent};

/// Cloneable publishers, one per subscribed handler. The lifecycle service holds a copy.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_paid_producer: Vec<EventProducer<OrderPaidEvent>>,
    pub order_annulled_producer: Vec<EventProducer<OrderAnnulledEvent>>,
}

pub struct EventHandlers {
    pub on_order_paid: Option<EventHandler<OrderPaidEvent>>,
    pub on_order_annulled: Option<EventHandler<OrderAnnulledEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_paid = hooks.on_order_paid.map(|f| EventHandler::new(buffer_size, f));
        let on_order_annulled = hooks.on_order_annulled.map(|f| EventHandler::new(buffer_size, f));
        Self { on_order_paid, on_order_annulled }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_paid {
            result.order_paid_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_annulled {
            result.order_annulled_producer.push(handler.subscribe());
        }
        result
    }

    /// Spawns every configured handler onto the runtime. Each one runs until all of its producers are dropped.
    pub fn start_handlers(self) -> Vec<JoinHandle<()>> {
        let mut tasks = Vec::new();
        if let Some(handler) = self.on_order_paid {
            tasks.push(tokio::spawn(handler.start_handler()));
        }
        if let Some(handler) = self.on_order_annulled {
            tasks.push(tokio::spawn(handler.start_handler()));
        }
        tasks
    }

    /// Runs every configured handler to completion on the current task.
    pub async fn run_to_completion(self) {
        let mut jobs: Vec<Pin<Box<dyn Future<Output = ()> + Send>>> = Vec::new();
        if let Some(handler) = self.on_order_paid {
            jobs.push(Box::pin(handler.start_handler()));
        }
        if let Some(handler) = self.on_order_annulled {
            jobs.push(Box::pin(handler.start_handler()));
        }
        join_all(jobs).await;
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_paid: Option<Handler<OrderPaidEvent>>,
    pub on_order_annulled: Option<Handler<OrderAnnulledEvent>>,
}

impl EventHooks {
    pub fn on_order_paid<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderPaidEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_paid = Some(Arc::new(f));
        self
    }

    pub fn on_order_annulled<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderAnnulledEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_annulled = Some(Arc::new(f));
        self
    }
}
