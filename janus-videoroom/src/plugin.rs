//! Videoroom plugin adapter
//!
//! This module handles:
//! - Translating application commands into videoroom requests
//! - Driving the publisher offer/answer exchange
//! - Allocating subscriber peers from attach replies and answering their offers
//! - Forwarding every event it does not recognise to the delegate untouched
//!
//! All entry points take `&mut self`; one plugin instance processes one input
//! at a time. Use [`crate::PluginSession`] to share it between tasks.

use crate::bundle::{Bundle, Context};
use crate::command::{Command, JanusPlugins};
use crate::config::VideoroomConfig;
use crate::constraints::Constraints;
use crate::delegate::{PluginDelegate, Protocol};
use crate::error::{Error, PeerError, Result};
use crate::event::{CORRELATION_FIELD, EventKind, HANDLE_FIELD, JanusEvent};
use crate::message::{self, PluginMessage, VideoroomRequest};
use crate::peer::{Peer, PeerFactory};
use crate::registry::PeerRegistry;
use crate::session::PluginSession;
use crate::types::{CorrelationGenerator, CorrelationId, HandleId, Jsep, SdpType};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Publisher negotiation progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublisherState {
    Idle,
    OfferRequested,
    OfferSent,
    Active,
}

/// Subscriber negotiation progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberState {
    Attached,
    RemoteSet,
    AnswerSent,
    Active,
}

/// Continuation of an offer or answer the media engine is producing
#[derive(Debug, Clone)]
enum PendingOperation {
    /// Body already validated when PUBLISH was accepted
    PublishOffer {
        body: VideoroomRequest,
        context: Context,
    },
    /// `previous` is restored if the answer cannot be applied
    SubscriberAnswer {
        handle: HandleId,
        previous: SubscriberState,
        context: Context,
    },
}

impl PendingOperation {
    const fn describe(&self) -> &'static str {
        match self {
            Self::PublishOffer { .. } => "publisher offer",
            Self::SubscriberAnswer { .. } => "subscriber answer",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum SdpSide {
    Local,
    Remote,
}

struct Subscription {
    context: Context,
    state: SubscriberState,
}

/// Publisher offer: send what the context asks for (all by default), receive nothing
fn publish_constraints(context: &Bundle) -> Result<Constraints> {
    Ok(Constraints::builder()
        .receive_audio(false)
        .receive_video(false)
        .audio(context.optional_bool("audio")?.unwrap_or(true))
        .video(context.optional_bool("video")?.unwrap_or(true))
        .datachannel(context.optional_bool("datachannel")?.unwrap_or(true))
        .build())
}

/// Subscriber answer: receive audio and video, keep the data channel
fn subscribe_constraints() -> Constraints {
    Constraints::builder()
        .none()
        .datachannel(true)
        .receive_audio(true)
        .receive_video(true)
        .build()
}

const fn peer_failure(handle: HandleId, source: PeerError) -> Error {
    Error::Peer { handle, source }
}

fn context_int(field: &str, value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| Error::invalid(field, "integer"))
}

/// Adapter between the application and one videoroom publisher handle
pub struct VideoroomPlugin {
    publisher: HandleId,
    publisher_state: PublisherState,
    plugin_name: String,
    delegate: Arc<dyn PluginDelegate>,
    owner: Arc<dyn Protocol>,
    registry: PeerRegistry,
    correlations: CorrelationGenerator,
    /// Subscribes waiting for their attach reply, keyed by the id sent with ATTACH
    pending_attaches: HashMap<CorrelationId, Context>,
    pending: HashMap<CorrelationId, PendingOperation>,
    subscribers: HashMap<HandleId, Subscription>,
}

impl VideoroomPlugin {
    pub fn new(
        publisher: HandleId,
        delegate: Arc<dyn PluginDelegate>,
        peer_factory: Arc<dyn PeerFactory>,
        owner: Arc<dyn Protocol>,
    ) -> Self {
        Self {
            publisher,
            publisher_state: PublisherState::Idle,
            plugin_name: JanusPlugins::VIDEOROOM.to_string(),
            delegate,
            registry: PeerRegistry::new(peer_factory, Arc::clone(&owner)),
            owner,
            correlations: CorrelationGenerator::default(),
            pending_attaches: HashMap::new(),
            pending: HashMap::new(),
            subscribers: HashMap::new(),
        }
    }

    /// Plugin package named in the ATTACH requests issued for subscribers
    #[must_use]
    pub fn with_plugin_name(mut self, name: impl Into<String>) -> Self {
        self.plugin_name = name.into();
        self
    }

    #[must_use]
    pub const fn publisher(&self) -> HandleId {
        self.publisher
    }

    #[must_use]
    pub const fn publisher_state(&self) -> PublisherState {
        self.publisher_state
    }

    #[must_use]
    pub fn subscriber_state(&self, handle: HandleId) -> Option<SubscriberState> {
        self.subscribers.get(&handle).map(|s| s.state)
    }

    #[must_use]
    pub fn peer_count(&self) -> usize {
        self.registry.len()
    }

    /// Offers, answers and attaches still waiting for a completion
    #[must_use]
    pub fn pending_operations(&self) -> usize {
        self.pending.len() + self.pending_attaches.len()
    }

    /// Handle an application command
    pub async fn command(&mut self, command: Command, context: Context) -> Result<()> {
        match command {
            Command::List | Command::ListParticipants | Command::Join | Command::Leave => {
                let message = message::build_message(command, &context)?;
                self.delegate.on_command_result(message, context);
                Ok(())
            }
            Command::Unpublish => {
                let message = message::build_message(command, &context)?;
                self.publisher_state = PublisherState::Idle;
                self.delegate.on_command_result(message, context);
                Ok(())
            }
            Command::Publish => self.publish(context).await,
            Command::Subscribe => self.subscribe(context).await,
            Command::Attach | Command::Start => Err(Error::UnsupportedCommand(command)),
        }
    }

    async fn publish(&mut self, context: Context) -> Result<()> {
        if matches!(
            self.publisher_state,
            PublisherState::OfferRequested | PublisherState::OfferSent
        ) {
            return Err(Error::OutOfSequence(format!(
                "publish while publisher is {:?}",
                self.publisher_state
            )));
        }

        let body = message::build(Command::Publish, &context)?;
        let constraints = publish_constraints(&context)?;
        let token = self.correlations.next_id();
        let peer = self.registry.get_or_create(self.publisher);

        self.pending
            .insert(token, PendingOperation::PublishOffer { body, context });
        if let Err(source) = peer.create_offer(constraints, token).await {
            self.pending.remove(&token);
            return Err(peer_failure(self.publisher, source));
        }

        self.publisher_state = PublisherState::OfferRequested;
        info!(handle = %self.publisher, correlation = %token, "Publisher offer requested");
        Ok(())
    }

    async fn subscribe(&mut self, context: Context) -> Result<()> {
        let token = self.correlations.next_id();
        let mut attach = Bundle::new()
            .with_string("plugin", self.plugin_name.clone())
            .with_int(CORRELATION_FIELD, context_int(CORRELATION_FIELD, token.as_u64())?);
        for key in ["feed", "room"] {
            if let Some(value) = context.get(key) {
                attach.set(key, value.clone());
            }
        }

        self.pending_attaches.insert(token, context);
        if let Err(e) = self.owner.dispatch(Command::Attach, attach.into_context()).await {
            self.pending_attaches.remove(&token);
            return Err(e);
        }

        info!(correlation = %token, "Subscriber attach requested");
        Ok(())
    }

    /// The media engine produced the publisher offer requested under `token`
    pub async fn on_offer(&mut self, token: CorrelationId, sdp: String) -> Result<()> {
        let (body, context) = match self.take_pending(token)? {
            PendingOperation::PublishOffer { body, context } => (body, context),
            other => return Err(self.restore_pending(token, other, "publisher offer")),
        };

        if let Err(e) = self
            .set_description(self.publisher, SdpSide::Local, SdpType::Offer, sdp.clone())
            .await
        {
            self.publisher_state = PublisherState::Idle;
            return Err(e);
        }

        self.publisher_state = PublisherState::OfferSent;
        info!(handle = %self.publisher, "Publisher offer sent");
        self.delegate
            .on_command_result(PluginMessage::new(body).with_jsep(Jsep::offer(sdp)), context);
        Ok(())
    }

    /// The media engine produced the subscriber answer requested under `token`
    pub async fn on_answer(&mut self, token: CorrelationId, sdp: String) -> Result<()> {
        let (handle, previous, context) = match self.take_pending(token)? {
            PendingOperation::SubscriberAnswer {
                handle,
                previous,
                context,
            } => (handle, previous, context),
            other => return Err(self.restore_pending(token, other, "subscriber answer")),
        };

        if let Err(e) = self
            .set_description(handle, SdpSide::Local, SdpType::Answer, sdp.clone())
            .await
        {
            self.set_subscriber_state(handle, previous);
            return Err(e);
        }

        self.set_subscriber_state(handle, SubscriberState::AnswerSent);
        info!(handle = %handle, "Subscriber answer sent");
        self.delegate
            .on_command_result(
                PluginMessage::new(VideoroomRequest::Start).with_jsep(Jsep::answer(sdp)),
                context,
            );
        Ok(())
    }

    /// Handle an event the gateway delivered for one of this session's handles
    pub async fn on_event(&mut self, event: Arc<JanusEvent>, context: Context) -> Result<()> {
        match EventKind::classify(&event, &context) {
            EventKind::AttachSuccess {
                handle,
                correlation,
            } => self.on_attached(handle, correlation),
            EventKind::PublisherConfigured { sdp } => self.on_configured(sdp.to_string()).await,
            EventKind::SubscriberOffer { sdp } => {
                self.on_subscriber_offer(event.sender, sdp.to_string())
                    .await
            }
            EventKind::Unhandled => {
                self.observe_started(&event);
                self.observe_stray_attach(&event, &context);
                debug!(sender = %event.sender, "Forwarding unhandled event");
                self.delegate.on_plugin_event(Arc::clone(&event), context);
                Ok(())
            }
        }
    }

    fn on_attached(&mut self, handle: HandleId, correlation: Option<CorrelationId>) -> Result<()> {
        let token = correlation.ok_or_else(|| {
            Error::UnknownCorrelation("attach reply carries a malformed correlation id".to_string())
        })?;
        let requested = self
            .pending_attaches
            .remove(&token)
            .ok_or_else(|| Error::unknown_token(token))?;
        if self.registry.contains(handle) {
            return Err(Error::OutOfSequence(format!(
                "handle {handle} already has a peer"
            )));
        }

        let context = requested
            .as_ref()
            .clone()
            .with_int(HANDLE_FIELD, context_int(HANDLE_FIELD, handle.as_u64())?)
            .into_context();
        let body = message::build(Command::Subscribe, &context)?;

        self.registry.get_or_create(handle);
        self.subscribers.insert(
            handle,
            Subscription {
                context: Arc::clone(&context),
                state: SubscriberState::Attached,
            },
        );
        info!(handle = %handle, correlation = %token, "Subscriber attached");
        self.delegate
            .on_command_result(PluginMessage::new(body), context);
        Ok(())
    }

    async fn on_configured(&mut self, sdp: String) -> Result<()> {
        if !matches!(
            self.publisher_state,
            PublisherState::OfferRequested | PublisherState::OfferSent
        ) {
            return Err(Error::OutOfSequence(format!(
                "configured answer while publisher is {:?}",
                self.publisher_state
            )));
        }

        if let Err(e) = self
            .set_description(self.publisher, SdpSide::Remote, SdpType::Answer, sdp)
            .await
        {
            self.publisher_state = PublisherState::Idle;
            return Err(e);
        }

        self.publisher_state = PublisherState::Active;
        info!(handle = %self.publisher, "Publisher active");
        Ok(())
    }

    async fn on_subscriber_offer(&mut self, handle: HandleId, sdp: String) -> Result<()> {
        let Some(subscription) = self.subscribers.get(&handle) else {
            return Err(Error::UnknownHandle(handle));
        };
        if !matches!(
            subscription.state,
            SubscriberState::Attached | SubscriberState::Active
        ) {
            return Err(Error::OutOfSequence(format!(
                "offer for subscriber {handle} while {:?}",
                subscription.state
            )));
        }
        let previous = subscription.state;
        let context = Arc::clone(&subscription.context);
        let peer = self.peer(handle)?;

        self.set_description(handle, SdpSide::Remote, SdpType::Offer, sdp)
            .await?;
        self.set_subscriber_state(handle, SubscriberState::RemoteSet);

        let token = self.correlations.next_id();
        self.pending.insert(
            token,
            PendingOperation::SubscriberAnswer {
                handle,
                previous,
                context,
            },
        );
        if let Err(source) = peer.create_answer(subscribe_constraints(), token).await {
            self.pending.remove(&token);
            self.set_subscriber_state(handle, previous);
            return Err(peer_failure(handle, source));
        }

        info!(handle = %handle, correlation = %token, "Subscriber answer requested");
        Ok(())
    }

    /// A `started` event confirms a subscriber's answer; it is still forwarded
    fn observe_started(&mut self, event: &JanusEvent) {
        if event.data.get("started").is_none() {
            return;
        }
        if let Some(subscription) = self.subscribers.get_mut(&event.sender) {
            if subscription.state == SubscriberState::AnswerSent {
                subscription.state = SubscriberState::Active;
                info!(handle = %event.sender, "Subscriber active");
            }
        }
    }

    /// An attach reply for this plugin that no SUBSCRIBE asked for
    fn observe_stray_attach(&self, event: &JanusEvent, context: &Bundle) {
        if event.attached_handle().is_some()
            && context.get_string("plugin") == Some(self.plugin_name.as_str())
        {
            warn!(
                handle = %event.sender,
                plugin = %self.plugin_name,
                "Attach reply without correlation, forwarding"
            );
        }
    }

    /// Drop a subscriber's peer and everything still pending for it
    pub fn detach(&mut self, handle: HandleId) -> Result<()> {
        if self.subscribers.remove(&handle).is_none() {
            return Err(Error::UnknownHandle(handle));
        }
        self.registry.remove(handle);
        self.pending.retain(|_, op| {
            !matches!(op, PendingOperation::SubscriberAnswer { handle: h, .. } if *h == handle)
        });
        info!(handle = %handle, "Subscriber detached");
        Ok(())
    }

    fn set_subscriber_state(&mut self, handle: HandleId, state: SubscriberState) {
        if let Some(subscription) = self.subscribers.get_mut(&handle) {
            subscription.state = state;
        }
    }

    fn peer(&self, handle: HandleId) -> Result<Arc<dyn Peer>> {
        self.registry
            .get(handle)
            .ok_or(Error::UnknownHandle(handle))
    }

    async fn set_description(
        &self,
        handle: HandleId,
        side: SdpSide,
        sdp_type: SdpType,
        sdp: String,
    ) -> Result<()> {
        let peer = self.peer(handle)?;
        let applied = match side {
            SdpSide::Local => peer.set_local_description(sdp_type, sdp).await,
            SdpSide::Remote => peer.set_remote_description(sdp_type, sdp).await,
        };
        applied.map_err(|source| peer_failure(handle, source))
    }

    fn take_pending(&mut self, token: CorrelationId) -> Result<PendingOperation> {
        self.pending
            .remove(&token)
            .ok_or_else(|| Error::unknown_token(token))
    }

    fn restore_pending(
        &mut self,
        token: CorrelationId,
        operation: PendingOperation,
        expected: &str,
    ) -> Error {
        let err = Error::OutOfSequence(format!(
            "{token} is a {} completion, not a {expected}",
            operation.describe()
        ));
        self.pending.insert(token, operation);
        err
    }
}

/// Creates one [`VideoroomPlugin`] per publisher handle
pub struct VideoroomPluginFactory {
    delegate: Arc<dyn PluginDelegate>,
    peer_factory: Arc<dyn PeerFactory>,
    config: VideoroomConfig,
}

impl VideoroomPluginFactory {
    pub fn new(delegate: Arc<dyn PluginDelegate>, peer_factory: Arc<dyn PeerFactory>) -> Self {
        Self {
            delegate,
            peer_factory,
            config: VideoroomConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: VideoroomConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn config(&self) -> &VideoroomConfig {
        &self.config
    }

    pub fn create(&self, publisher: HandleId, owner: Arc<dyn Protocol>) -> VideoroomPlugin {
        debug!(handle = %publisher, plugin = %self.config.plugin, "Creating videoroom plugin");
        VideoroomPlugin::new(
            publisher,
            Arc::clone(&self.delegate),
            Arc::clone(&self.peer_factory),
            owner,
        )
        .with_plugin_name(self.config.plugin.clone())
    }

    /// Create the plugin for `publisher` and run it behind a session sized
    /// by the configured channel capacity
    pub fn spawn(&self, publisher: HandleId, owner: Arc<dyn Protocol>) -> PluginSession {
        PluginSession::spawn(self.create(publisher, owner), self.config.channel_capacity)
    }
}
