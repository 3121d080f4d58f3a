//! Single-actor session wrapper
//!
//! A [`PluginSession`] moves a [`VideoroomPlugin`] into its own tokio task and
//! feeds it through a bounded channel, so commands, negotiation completions
//! and gateway events of one session are processed one at a time in arrival
//! order. Every input carries a reply channel; the caller gets the plugin's
//! result, including media engine failures.

use crate::bundle::Context;
use crate::command::Command;
use crate::error::{Error, Result};
use crate::event::JanusEvent;
use crate::plugin::VideoroomPlugin;
use crate::types::{CorrelationId, HandleId};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{Instrument, info, info_span, warn};

/// Default capacity of the session input channel
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

type Reply = oneshot::Sender<Result<()>>;

enum SessionInput {
    Command {
        command: Command,
        context: Context,
        reply: Reply,
    },
    Offer {
        token: CorrelationId,
        sdp: String,
        reply: Reply,
    },
    Answer {
        token: CorrelationId,
        sdp: String,
        reply: Reply,
    },
    Event {
        event: Arc<JanusEvent>,
        context: Context,
        reply: Reply,
    },
    Detach {
        handle: HandleId,
        reply: Reply,
    },
    Shutdown,
}

/// Cloneable handle to a running plugin actor
#[derive(Clone)]
pub struct PluginSession {
    tx: mpsc::Sender<SessionInput>,
    publisher: HandleId,
}

impl PluginSession {
    /// Spawn the actor loop for `plugin`
    pub fn spawn(plugin: VideoroomPlugin, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let publisher = plugin.publisher();
        let span = info_span!("plugin_session", publisher = %publisher);
        tokio::spawn(run(plugin, rx).instrument(span));
        info!(handle = %publisher, "Plugin session started");
        Self { tx, publisher }
    }

    #[must_use]
    pub const fn publisher(&self) -> HandleId {
        self.publisher
    }

    pub async fn command(&self, command: Command, context: Context) -> Result<()> {
        self.request(|reply| SessionInput::Command {
            command,
            context,
            reply,
        })
        .await
    }

    /// Deliver the SDP of an offer started with `token`
    pub async fn on_offer(&self, token: CorrelationId, sdp: impl Into<String>) -> Result<()> {
        let sdp = sdp.into();
        self.request(|reply| SessionInput::Offer { token, sdp, reply })
            .await
    }

    /// Deliver the SDP of an answer started with `token`
    pub async fn on_answer(&self, token: CorrelationId, sdp: impl Into<String>) -> Result<()> {
        let sdp = sdp.into();
        self.request(|reply| SessionInput::Answer { token, sdp, reply })
            .await
    }

    pub async fn on_event(&self, event: Arc<JanusEvent>, context: Context) -> Result<()> {
        self.request(|reply| SessionInput::Event {
            event,
            context,
            reply,
        })
        .await
    }

    pub async fn detach(&self, handle: HandleId) -> Result<()> {
        self.request(|reply| SessionInput::Detach { handle, reply })
            .await
    }

    /// Stop the actor after the inputs already queued
    pub async fn shutdown(&self) -> Result<()> {
        self.tx
            .send(SessionInput::Shutdown)
            .await
            .map_err(|_| Error::SessionClosed)
    }

    /// Inputs the session queues before callers wait
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn request(&self, input: impl FnOnce(Reply) -> SessionInput) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(input(reply))
            .await
            .map_err(|_| Error::SessionClosed)?;
        rx.await.map_err(|_| Error::SessionClosed)?
    }
}

async fn run(mut plugin: VideoroomPlugin, mut rx: mpsc::Receiver<SessionInput>) {
    while let Some(input) = rx.recv().await {
        let (result, reply) = match input {
            SessionInput::Command {
                command,
                context,
                reply,
            } => (plugin.command(command, context).await, reply),
            SessionInput::Offer { token, sdp, reply } => (plugin.on_offer(token, sdp).await, reply),
            SessionInput::Answer { token, sdp, reply } => {
                (plugin.on_answer(token, sdp).await, reply)
            }
            SessionInput::Event {
                event,
                context,
                reply,
            } => (plugin.on_event(event, context).await, reply),
            SessionInput::Detach { handle, reply } => (plugin.detach(handle), reply),
            SessionInput::Shutdown => break,
        };

        if let Err(e) = &result {
            warn!(handle = %plugin.publisher(), error = %e, "Plugin input failed");
        }
        // The caller may have stopped waiting
        let _ = reply.send(result);
    }

    info!(handle = %plugin.publisher(), "Plugin session stopped");
}
