//! Pipeline runtime
//!
//! The runtime task is the only place the pipeline runs. It drains two
//! channels:
//!
//! ```text
//! ┌────────────────┐ commands  ┌─────────┐  events   ┌──────────────┐
//! │ RuntimeHandle  │ ────────► │ Runtime │ ────────► │ presentation │
//! └────────────────┘           │         │           └──────────────┘
//! ┌────────────────┐ messages  │         │
//! │ MessageListener│ ────────► │         │
//! └────────────────┘ (bounded) └─────────┘
//! ```
//!
//! Verification never blocks the loop: a parked message waits in the gate
//! while other commands and network messages keep being processed.

use crate::classifier::Classifier;
use crate::config::Config;
use crate::error::{GuardError, Result};
use crate::listener::MessageListener;
use crate::message::Message;
use crate::pipeline::{Outcome, Pipeline};
use crate::store::{LogEntry, LogStore};
use crate::verification::{Decision, PendingVerification, Ticket};
use std::net::SocketAddr;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Capacity of the command channel
const COMMAND_QUEUE_CAPACITY: usize = 32;

/// Notifications for the presentation layer
#[derive(Debug, Clone)]
pub enum Event {
    /// An entry was added to the log
    Logged(LogEntry),
    /// A message waits for an operator decision
    VerificationRequested(PendingVerification),
    /// An entry was deleted from the log
    Removed(LogEntry),
    /// User-facing notice that is not recorded in the log
    Notice(String),
}

pub type EventReceiver = mpsc::UnboundedReceiver<Event>;

enum Command {
    Submit {
        message: Message,
        reply: oneshot::Sender<Result<Outcome>>,
    },
    Resolve {
        ticket: Ticket,
        decision: Decision,
        reply: oneshot::Sender<Result<LogEntry>>,
    },
    Remove {
        id: Uuid,
        reply: oneshot::Sender<Option<LogEntry>>,
    },
    StartNetwork {
        reply: oneshot::Sender<Result<SocketAddr>>,
    },
    StopNetwork {
        reply: oneshot::Sender<()>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Cloneable entry point into the runtime
#[derive(Clone)]
pub struct RuntimeHandle {
    commands: mpsc::Sender<Command>,
    store: LogStore,
}

impl RuntimeHandle {
    /// Shared log, for snapshots and export
    pub fn store(&self) -> &LogStore {
        &self.store
    }

    /// Classify a message from the operator (typed or OCR text)
    pub async fn submit(&self, message: Message) -> Result<Outcome> {
        self.request(|reply| Command::Submit { message, reply }).await?
    }

    /// Answer a pending verification
    pub async fn resolve(&self, ticket: Ticket, decision: Decision) -> Result<LogEntry> {
        self.request(|reply| Command::Resolve {
            ticket,
            decision,
            reply,
        })
        .await?
    }

    /// Delete a log entry
    pub async fn remove(&self, id: Uuid) -> Result<Option<LogEntry>> {
        self.request(|reply| Command::Remove { id, reply }).await
    }

    /// Start the network listener, returning its bound address
    pub async fn start_network(&self) -> Result<SocketAddr> {
        self.request(|reply| Command::StartNetwork { reply }).await?
    }

    pub async fn stop_network(&self) -> Result<()> {
        self.request(|reply| Command::StopNetwork { reply }).await
    }

    /// Stop the listener and end the runtime loop
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|reply| Command::Shutdown { reply }).await
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(command(tx))
            .await
            .map_err(|_| GuardError::RuntimeClosed)?;
        rx.await.map_err(|_| GuardError::RuntimeClosed)
    }
}

/// Owner of the pipeline and the listener
pub struct Runtime {
    pipeline: Pipeline,
    listener: MessageListener,
    commands: mpsc::Receiver<Command>,
    inbound: mpsc::Receiver<Message>,
    events: mpsc::UnboundedSender<Event>,
}

impl Runtime {
    pub fn new(config: &Config, classifier: Classifier, store: LogStore) -> (Self, RuntimeHandle, EventReceiver) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let (inbound_tx, inbound_rx) = mpsc::channel(config.listener.queue_capacity.max(1));
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let runtime = Self {
            pipeline: Pipeline::new(classifier, store.clone()),
            listener: MessageListener::new(config.listener.clone(), inbound_tx),
            commands: command_rx,
            inbound: inbound_rx,
            events: event_tx,
        };

        let handle = RuntimeHandle {
            commands: command_tx,
            store,
        };

        (runtime, handle, event_rx)
    }

    /// Create and spawn a runtime on the current tokio runtime
    pub fn spawn(
        config: &Config,
        classifier: Classifier,
        store: LogStore,
    ) -> (JoinHandle<()>, RuntimeHandle, EventReceiver) {
        let (runtime, handle, events) = Self::new(config, classifier, store);
        (tokio::spawn(runtime.run()), handle, events)
    }

    pub async fn run(mut self) {
        info!("Pipeline runtime started");

        if !self.pipeline.classifier().is_available() {
            self.emit(Event::Notice(GuardError::ModelUnavailable.to_string()));
        }

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown { reply }) => {
                        self.listener.stop().await;
                        let _ = reply.send(());
                        break;
                    }
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
                Some(message) = self.inbound.recv() => {
                    if let Err(e) = self.process(message).await {
                        debug!("Network message rejected: {}", e);
                    }
                }
            }
        }

        self.listener.stop().await;
        info!("Pipeline runtime stopped");
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Submit { message, reply } => {
                let result = self.process(message).await;
                let _ = reply.send(result);
            }
            Command::Resolve {
                ticket,
                decision,
                reply,
            } => {
                let result = self.pipeline.resolve(ticket, decision).await;
                if let Ok(entry) = &result {
                    self.emit(Event::Logged(entry.clone()));
                }
                let _ = reply.send(result);
            }
            Command::Remove { id, reply } => {
                let removed = self.pipeline.store().remove(id).await;
                if let Some(entry) = &removed {
                    debug!("Removed log entry {}", entry.id);
                    self.emit(Event::Removed(entry.clone()));
                }
                let _ = reply.send(removed);
            }
            Command::StartNetwork { reply } => {
                let result = self.start_network().await;
                let _ = reply.send(result);
            }
            Command::StopNetwork { reply } => {
                if self.listener.is_listening() {
                    self.listener.stop().await;
                    let entry = self.pipeline.record_notice("Network server stopped.").await;
                    self.emit(Event::Logged(entry));
                }
                let _ = reply.send(());
            }
            Command::Shutdown { reply } => {
                // handled by the run loop
                let _ = reply.send(());
            }
        }
    }

    async fn start_network(&mut self) -> Result<SocketAddr> {
        if let Some(addr) = self.listener.local_addr() {
            return Ok(addr);
        }

        match self.listener.start().await {
            Ok(addr) => {
                let entry = self
                    .pipeline
                    .record_notice(format!("Network server listening on port {}.", addr.port()))
                    .await;
                self.emit(Event::Logged(entry));
                Ok(addr)
            }
            Err(e) => {
                warn!("Network listener failed to start: {}", e);
                self.emit(Event::Notice(e.to_string()));
                Err(e)
            }
        }
    }

    async fn process(&mut self, message: Message) -> Result<Outcome> {
        let result = self.pipeline.submit(message).await;

        match &result {
            Ok(Outcome::Logged(entry)) => self.emit(Event::Logged(entry.clone())),
            Ok(Outcome::PendingVerification(pending)) => {
                self.emit(Event::VerificationRequested(pending.clone()))
            }
            Err(GuardError::ModelUnavailable) => {
                self.emit(Event::Notice(GuardError::ModelUnavailable.to_string()))
            }
            Err(_) => {}
        }

        result
    }

    fn emit(&self, event: Event) {
        if self.events.send(event).is_err() {
            debug!("No event subscriber");
        }
    }
}
