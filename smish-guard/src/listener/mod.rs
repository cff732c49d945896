//! Network intake
//!
//! - [`MessageListener`]: TCP listener, one message per connection
//! - [`session`]: per-connection frame reading
//! - [`envelope`]: wire format
//! - [`client`]: sender side of the wire format
//!
//! Connection tasks never touch the pipeline: decoded messages go onto a
//! bounded channel drained by the runtime.

pub mod client;
pub mod envelope;
pub mod session;

pub use client::MessageClient;
pub use envelope::Envelope;
pub use session::ListenerSession;

use crate::config::ListenerConfig;
use crate::error::{GuardError, Result};
use crate::message::Message;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

enum State {
    Stopped,
    Listening {
        local_addr: SocketAddr,
        shutdown: CancellationToken,
        accept_loop: JoinHandle<()>,
    },
}

/// Listener lifecycle: `Stopped → Listening → Stopped`
pub struct MessageListener {
    config: ListenerConfig,
    inbound: mpsc::Sender<Message>,
    state: State,
}

impl MessageListener {
    pub fn new(config: ListenerConfig, inbound: mpsc::Sender<Message>) -> Self {
        Self {
            config,
            inbound,
            state: State::Stopped,
        }
    }

    pub fn is_listening(&self) -> bool {
        matches!(self.state, State::Listening { .. })
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        match &self.state {
            State::Listening { local_addr, .. } => Some(*local_addr),
            State::Stopped => None,
        }
    }

    /// Bind and start accepting connections
    ///
    /// Starting an already listening instance binds nothing and returns the
    /// current address.
    pub async fn start(&mut self) -> Result<SocketAddr> {
        if let State::Listening { local_addr, .. } = &self.state {
            warn!("Listener already running on {}", local_addr);
            return Ok(*local_addr);
        }

        let listener = TcpListener::bind(&self.config.listen_addr)
            .await
            .map_err(|source| GuardError::Bind {
                addr: self.config.listen_addr.clone(),
                source,
            })?;
        let local_addr = listener.local_addr()?;

        let shutdown = CancellationToken::new();
        let accept_loop = tokio::spawn(accept_loop(
            listener,
            self.inbound.clone(),
            self.config.clone(),
            shutdown.clone(),
        ));

        self.state = State::Listening {
            local_addr,
            shutdown,
            accept_loop,
        };

        info!("Listening for network messages on {}", local_addr);
        Ok(local_addr)
    }

    /// Stop accepting and release the port; safe to call when stopped
    ///
    /// Open connections are closed without delivering their message.
    pub async fn stop(&mut self) {
        match std::mem::replace(&mut self.state, State::Stopped) {
            State::Stopped => debug!("Listener already stopped"),
            State::Listening {
                local_addr,
                shutdown,
                accept_loop,
            } => {
                shutdown.cancel();
                if let Err(e) = accept_loop.await {
                    error!("Accept loop task failed: {}", e);
                }
                info!("Listener on {} stopped", local_addr);
            }
        }
    }
}

impl Drop for MessageListener {
    fn drop(&mut self) {
        if let State::Listening { shutdown, .. } = &self.state {
            shutdown.cancel();
        }
    }
}

async fn accept_loop(
    listener: TcpListener,
    inbound: mpsc::Sender<Message>,
    config: ListenerConfig,
    shutdown: CancellationToken,
) {
    let read_timeout = Duration::from_secs(config.read_timeout_secs);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((socket, addr)) => {
                    debug!("New connection from {}", addr);

                    let session = ListenerSession::new(addr, config.max_payload_size, read_timeout);
                    let inbound = inbound.clone();
                    let shutdown = shutdown.child_token();

                    tokio::spawn(async move {
                        let delivery = async {
                            let message = session.handle(socket).await?;
                            inbound
                                .send(message)
                                .await
                                .map_err(|_| GuardError::RuntimeClosed)
                        };

                        tokio::select! {
                            _ = shutdown.cancelled() => debug!("Connection from {} closed by shutdown", addr),
                            result = delivery => match result {
                                Ok(()) => debug!("Message from {} queued", addr),
                                Err(GuardError::RuntimeClosed) => {
                                    warn!("Pipeline closed, dropping message from {}", addr)
                                }
                                Err(e) => warn!("Dropped payload from {}: {}", addr, e),
                            },
                        }
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            },
        }
    }

    debug!("Accept loop exited");
}
