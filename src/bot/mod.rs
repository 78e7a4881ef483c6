//! Chat front end: menu dialogue, handler and update loop.

pub mod dialogue;
pub mod handler;
pub mod messages;
pub mod runner;

pub use dialogue::{parse_input, transition, Action, Command, DialogueState, Input, Transition};
pub use handler::{BotHandler, Reply};
pub use runner::UpdateRunner;
