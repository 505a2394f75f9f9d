mod engine;
mod state;

pub use engine::{Engine, Event};
pub use state::Connection;
