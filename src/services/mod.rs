#[cfg(test)]
pub mod fake;
pub mod ticket_backend;

pub use ticket_backend::TicketBackend;
