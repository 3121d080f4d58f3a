//! Inbound gateway events and their classification
//!
//! The gateway gives no explicit request/response pairing, so an event is
//! recognised from its shape: whether it carries a jsep, the jsep type, and
//! the keys present in the plugin data. Classification happens once, into
//! [`EventKind`], before any adapter state is touched.

use crate::bundle::Bundle;
use crate::types::{CorrelationId, HandleId, Jsep, SdpType};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Context key holding the correlation id of an outstanding attach
pub const CORRELATION_FIELD: &str = "correlation";

/// Context key of the handle assigned to a new subscriber
pub const HANDLE_FIELD: &str = "handleId";

/// An event received from the gateway for one handle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JanusEvent {
    pub sender: HandleId,
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsep: Option<Jsep>,
}

impl JanusEvent {
    pub fn new(sender: impl Into<HandleId>, data: Value) -> Self {
        Self {
            sender: sender.into(),
            data,
            jsep: None,
        }
    }

    #[must_use]
    pub fn with_jsep(mut self, jsep: Jsep) -> Self {
        self.jsep = Some(jsep);
        self
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    /// Handle id carried by a `{"janus": "success", "data": {"id": N}}` reply
    pub(crate) fn attached_handle(&self) -> Option<HandleId> {
        if self.str_field("janus") != Some("success") {
            return None;
        }
        self.data
            .get("data")
            .and_then(|d| d.get("id"))
            .and_then(Value::as_u64)
            .map(HandleId::new)
    }
}

/// What an inbound event means to the adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind<'a> {
    /// Attach reply for a subscribe this adapter started
    AttachSuccess {
        handle: HandleId,
        correlation: Option<CorrelationId>,
    },
    /// `configured` acknowledgment answering the publisher's offer
    PublisherConfigured { sdp: &'a str },
    /// `attached` event offering a subscriber stream
    SubscriberOffer { sdp: &'a str },
    Unhandled,
}

impl<'a> EventKind<'a> {
    /// Classify `event`, delivered together with `context`.
    ///
    /// An attach reply only counts as ours when the context carries the
    /// correlation field that SUBSCRIBE put into the attach request. The id
    /// may still be malformed or unknown; the adapter rejects it then.
    #[must_use]
    pub fn classify(event: &'a JanusEvent, context: &Bundle) -> Self {
        let videoroom = event.str_field("videoroom");
        let jsep = event.jsep.as_ref().map(|j| (j.sdp_type, j.sdp.as_str()));

        match (jsep, videoroom) {
            (Some((SdpType::Answer, sdp)), Some("event")) if event.data.get("configured").is_some() => {
                Self::PublisherConfigured { sdp }
            }
            (Some((SdpType::Offer, sdp)), Some("attached")) => Self::SubscriberOffer { sdp },
            (None, _) => match event.attached_handle() {
                Some(handle) if context.contains(CORRELATION_FIELD) => Self::AttachSuccess {
                    handle,
                    correlation: context
                        .get_int(CORRELATION_FIELD)
                        .and_then(|id| u64::try_from(id).ok())
                        .map(CorrelationId::new),
                },
                _ => Self::Unhandled,
            },
            _ => Self::Unhandled,
        }
    }
}
