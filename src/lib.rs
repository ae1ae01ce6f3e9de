pub mod config;
pub mod constants;
pub mod poller;
pub mod transport;
