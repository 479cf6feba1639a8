pub mod attachments;
pub mod http;
