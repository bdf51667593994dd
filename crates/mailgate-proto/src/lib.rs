//! # mailgate-proto
//!
//! Per-connection protocol engine for the mailgate mailbox server.
//!
//! ## Features
//!
//! - **Frame transport**: 4-byte big-endian length-prefixed frames
//! - **Secure channel**: per-session cipher negotiation (plaintext, AES or
//!   3DES in ECB/CBC) over an X25519 handshake
//! - **Stage machine**: Unauthenticated, Selected and Active stages with a
//!   declarative per-stage allow-list
//! - **Command handlers**: AUTH, LOGIN, CREATE, TOKEN, SELECT, FETCH, SEARCH,
//!   CHANGE, EXPUNGE, LOGOUT, NOOP, HELP, QUIT
//! - **Store abstraction**: [`MailStore`] trait with an in-memory
//!   implementation for tests and embedding
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use mailgate_proto::{Config, MemoryStore, Server};
//!
//! #[tokio::main]
//! async fn main() -> mailgate_proto::Result<()> {
//!     let config = Config::builder().domain("example.org").build();
//!     let server = Server::bind(config, Arc::new(MemoryStore::new())).await?;
//!     server.run_until(tokio::signal::ctrl_c()).await
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`connection`]: framing, configuration and the secure channel
//! - [`protocol`]: stages, verbs and the transition table
//! - [`command`]: argument grammars for FETCH and SEARCH
//! - [`handler`]: the verb handlers and their registry
//! - [`store`]: the persistence abstraction
//! - [`session`]: the per-connection read/dispatch/write loop

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod handler;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod session;
pub mod store;
pub mod types;

pub use connection::{BoxedStream, CipherMode, Config, ConfigBuilder, FramedStream, SecureChannel};
pub use error::{Error, Result};
pub use handler::{CommandHandler, Context, Handlers, Outcome, Rejection, RejectionKind};
pub use protocol::{Next, Stage, Verb};
pub use registry::{SessionGuard, SessionInfo, SessionRegistry};
pub use server::Server;
pub use session::Session;
pub use store::{MailStore, MemoryStore, NewMessage, StoreError, StoreResult};
pub use types::{Flag, Message, MessageId, Uid};
