//! Text composition handlers.

mod compose_text;

pub use compose_text::{ComposeTextCommand, ComposeTextHandler};
