//! Mailbox data types shared by the handlers and the store.

mod flag;
mod message;

pub use flag::Flag;
pub use message::{Message, MessageId, Uid};
