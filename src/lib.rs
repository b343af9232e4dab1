pub mod common;
pub mod config;
pub mod extractor;
pub mod protocol;
pub mod server;
pub mod session;
pub mod transport;
