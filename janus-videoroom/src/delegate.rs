//! Outbound capabilities the adapter relies on

use crate::bundle::Context;
use crate::command::Command;
use crate::error::Result;
use crate::event::JanusEvent;
use crate::message::PluginMessage;
use async_trait::async_trait;
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

/// Receives everything the plugin produces for the application
#[cfg_attr(test, automock)]
pub trait PluginDelegate: Send + Sync {
    /// A message is ready to be sent on the handle named by the context
    fn on_command_result(&self, message: PluginMessage, context: Context);

    /// An event the plugin does not act on, forwarded as received
    fn on_plugin_event(&self, event: Arc<JanusEvent>, context: Context);
}

/// The Janus session owning the plugin handles
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Protocol: Send + Sync {
    /// Run a session-level command such as ATTACH
    async fn dispatch(&self, command: Command, context: Context) -> Result<()>;
}
