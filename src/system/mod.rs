pub mod collector;
pub mod snapshot;
pub mod source;
pub mod table;
pub mod tracker;
