pub mod adapter;
pub mod buffers;
pub mod config;
pub mod connection;
pub mod diagnostics;
pub mod error;
pub mod md4;
pub mod message;
mod seqnum;

pub use connection::{Connection, Engine, Event};
