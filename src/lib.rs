pub mod config;
pub mod controller;
pub mod error;
pub mod payment_processors;
pub mod queue;
pub mod service;
pub mod store;
pub mod structs;
pub mod worker;
