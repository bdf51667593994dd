//! Server configuration types.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

/// Default listen address.
pub const DEFAULT_BIND: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 1430));

/// Default mail domain announced in greetings.
pub const DEFAULT_DOMAIN: &str = "derby.ac.uk";

/// Default idle timeout (10 minutes).
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(600);

/// Default maximum command line length in characters.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 512;

/// Default maximum frame payload.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 1024 * 1024; // 1 MB

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Listen address.
    pub bind: SocketAddr,
    /// Mail domain used in greetings and for new mailboxes.
    pub domain: String,
    /// How long a read may block before the session is closed.
    pub idle_timeout: Duration,
    /// Longest accepted command line, in characters.
    pub max_line_length: usize,
    /// Largest accepted frame payload, in bytes.
    pub max_frame_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        ConfigBuilder::new().build()
    }
}

impl Config {
    /// Creates a configuration builder.
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Builder for server configuration.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    bind: SocketAddr,
    domain: String,
    idle_timeout: Duration,
    max_line_length: usize,
    max_frame_size: usize,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bind: DEFAULT_BIND,
            domain: DEFAULT_DOMAIN.to_string(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Sets the listen address.
    #[must_use]
    pub const fn bind(mut self, bind: SocketAddr) -> Self {
        self.bind = bind;
        self
    }

    /// Sets the mail domain.
    #[must_use]
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Sets the idle timeout.
    #[must_use]
    pub const fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Sets the maximum command line length.
    #[must_use]
    pub const fn max_line_length(mut self, len: usize) -> Self {
        self.max_line_length = len;
        self
    }

    /// Sets the maximum frame payload size.
    #[must_use]
    pub const fn max_frame_size(mut self, len: usize) -> Self {
        self.max_frame_size = len;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> Config {
        Config {
            bind: self.bind,
            domain: self.domain,
            idle_timeout: self.idle_timeout,
            max_line_length: self.max_line_length,
            max_frame_size: self.max_frame_size,
        }
    }
}
