pub mod breaker;
pub mod client;
pub mod structs;
