//! Connection layer.
//!
//! This module provides the transport underneath a session:
//! - Configuration (bind address, domain, limits, idle timeout)
//! - Type-erased byte stream
//! - Length-prefixed framing
//! - Secure channel with cipher negotiation

mod channel;
mod config;
mod framed;
mod stream;

pub use channel::{CipherContext, CipherMode, SecureChannel};
pub use config::{
    Config, ConfigBuilder, DEFAULT_BIND, DEFAULT_DOMAIN, DEFAULT_IDLE_TIMEOUT, DEFAULT_MAX_FRAME_SIZE,
    DEFAULT_MAX_LINE_LENGTH,
};
pub use framed::FramedStream;
pub use stream::{BoxedStream, Stream};
