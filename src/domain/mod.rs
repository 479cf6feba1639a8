pub mod attachment;
pub mod form;
pub mod ticket;
pub mod user;
