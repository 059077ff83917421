pub mod app_context;
pub mod config;
pub mod reqwest_transport;
pub mod request;
pub mod scheduler;
