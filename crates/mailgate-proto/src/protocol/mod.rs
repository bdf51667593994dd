//! Protocol stage machine.
//!
//! A session moves through three stages. Which verbs are legal in which
//! stage, and where a successful command leads, is described by a single
//! table in [`transition`].

mod state;
pub mod transition;
mod verb;

pub use state::Stage;
pub use transition::{Next, lookup};
pub use verb::Verb;
