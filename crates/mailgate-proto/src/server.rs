//! TCP listener.
//!
//! Accepts connections and runs each [`Session`] on its own task. The
//! listener stops when the shutdown future resolves and logs every session
//! still registered at that point.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tracing::{Instrument, error, info, info_span, warn};

use crate::Result;
use crate::connection::Config;
use crate::handler::Handlers;
use crate::registry::SessionRegistry;
use crate::session::Session;
use crate::store::MailStore;

/// A bound mailgate server.
pub struct Server {
    listener: TcpListener,
    config: Arc<Config>,
    store: Arc<dyn MailStore>,
    handlers: Arc<Handlers>,
    registry: SessionRegistry,
}

impl Server {
    /// Binds to `config.bind` with the standard handlers.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn bind(config: Config, store: Arc<dyn MailStore>) -> Result<Self> {
        Self::bind_with(config, store, Handlers::standard()).await
    }

    /// Binds to `config.bind` with a custom handler registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn bind_with(
        config: Config,
        store: Arc<dyn MailStore>,
        handlers: Handlers,
    ) -> Result<Self> {
        let listener = TcpListener::bind(config.bind).await?;
        info!(addr = %listener.local_addr()?, domain = %config.domain, "listening");
        Ok(Self {
            listener,
            config: Arc::new(config),
            store,
            handlers: Arc::new(handlers),
            registry: SessionRegistry::new(),
        })
    }

    /// Returns the bound address.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket address cannot be read.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Returns a handle to the live-session registry.
    #[must_use]
    pub fn registry(&self) -> SessionRegistry {
        self.registry.clone()
    }

    /// Accepts connections until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Accept failures are logged and do not stop the loop; this currently
    /// always returns `Ok`.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => self.spawn(stream, peer),
                    Err(err) => warn!(error = %err, "accept failed"),
                },
            }
        }

        let live = self.registry.snapshot();
        info!(live = live.len(), "shutting down");
        for session in live {
            info!(
                session = %session.id,
                peer = %session.peer,
                since = %session.connected_at,
                "session still open at shutdown"
            );
        }
        Ok(())
    }

    fn spawn(&self, stream: TcpStream, peer: SocketAddr) {
        if let Err(err) = stream.set_nodelay(true) {
            warn!(%peer, error = %err, "failed to set TCP_NODELAY");
        }

        let session = Session::new(
            stream,
            Arc::clone(&self.store),
            Arc::clone(&self.handlers),
            Arc::clone(&self.config),
        );
        let guard = self.registry.register(session.id(), peer.to_string());
        let span = info_span!("session", %peer, id = %session.id());

        tokio::spawn(
            async move {
                let _guard = guard;
                info!("connection accepted");
                match session.run().await {
                    Ok(()) => info!("connection closed"),
                    Err(err) if err.is_disconnect() => info!("peer disconnected"),
                    Err(err) if err.is_timeout() => warn!(error = %err, "idle timeout"),
                    Err(err) => error!(error = %err, "session failed"),
                }
            }
            .instrument(span),
        );
    }
}
