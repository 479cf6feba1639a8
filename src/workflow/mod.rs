pub mod page;
pub mod search;
pub mod sync;
