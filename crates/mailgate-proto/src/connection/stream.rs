//! Stream abstraction.

use tokio::io::{AsyncRead, AsyncWrite};

/// Byte stream a session can run over.
///
/// Blanket-implemented for TCP sockets, duplex pipes and test mocks.
pub trait Stream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T> Stream for T where T: AsyncRead + AsyncWrite + Unpin + Send {}

/// Boxed stream used once a connection is handed to a session.
pub type BoxedStream = Box<dyn Stream>;
