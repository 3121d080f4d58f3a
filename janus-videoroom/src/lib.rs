//! Janus videoroom signaling adapter
//!
//! Bridges application commands ("join this room", "publish", "subscribe to
//! feed X") to the Janus videoroom plugin protocol and drives the offer/answer
//! exchange of every peer connection owned by one Janus session: a single
//! publisher and any number of subscribers.
//!
//! ## Architecture
//!
//! - **`message`**: pure translation of a command and its context into a request body
//! - **`Bundle`**: typed request context threaded through every operation
//! - **`PeerRegistry`**: one media engine peer per Janus handle
//! - **`EventKind`**: closed classification of inbound gateway events
//! - **`VideoroomPlugin`**: the orchestrator, owning the registry and pending operations
//! - **`PluginSession`**: actor wrapper processing one input at a time
//!
//! ## Usage
//!
//! ```rust,ignore
//! use janus_videoroom::{Bundle, Command, VideoroomConfig, VideoroomPluginFactory};
//!
//! let config = VideoroomConfig::init(Some("videoroom.toml"))?;
//! let factory = VideoroomPluginFactory::new(delegate, peer_factory).with_config(config);
//! let session = factory.spawn(publisher_handle, owner);
//!
//! let context = Bundle::new().with_int("room", 1234).into_context();
//! session.command(Command::Join, context).await?;
//! session.command(Command::Publish, Bundle::new().into_context()).await?;
//! ```

mod bundle;
mod command;
mod config;
mod constraints;
mod delegate;
mod error;
mod event;
pub mod logging;
pub mod message;
mod peer;
mod plugin;
mod registry;
mod session;
mod types;

pub use bundle::{Bundle, Context, FieldValue};
pub use command::{Command, JanusPlugins};
pub use config::{LogFormat, LoggingConfig, VideoroomConfig};
pub use constraints::{Constraints, ConstraintsBuilder};
pub use delegate::{PluginDelegate, Protocol};
pub use error::{Error, PeerError, Result};
pub use event::{CORRELATION_FIELD, EventKind, HANDLE_FIELD, JanusEvent};
pub use message::{JoinRequest, PluginMessage, VideoroomRequest};
pub use peer::{Peer, PeerFactory};
pub use plugin::{PublisherState, SubscriberState, VideoroomPlugin, VideoroomPluginFactory};
pub use registry::PeerRegistry;
pub use session::{DEFAULT_CHANNEL_CAPACITY, PluginSession};
pub use types::{CorrelationId, HandleId, Jsep, SdpType};
