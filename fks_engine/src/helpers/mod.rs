mod ticket;

pub use ticket::{new_ticket_id, TicketGenerator, TICKET_PREFIX};
