pub mod config;
pub mod ticket;
