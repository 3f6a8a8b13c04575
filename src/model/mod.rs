//! The wire protocol: client request grammar and fixed server reply text.

pub mod client;
pub mod server;
