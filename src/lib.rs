//! Multiplayer minesweeper: a single shared board served to any number of
//! concurrent clients over a line-oriented text protocol.

pub mod data;
pub mod error;
pub mod logic;
pub mod model;
pub mod server;
