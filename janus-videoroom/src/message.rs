//! Videoroom protocol messages
//!
//! Translates a [`Command`] plus its request context into the body the
//! videoroom plugin expects. Optional fields missing from the context are
//! left out of the body entirely.

use crate::bundle::{Bundle, FieldValue};
use crate::command::Command;
use crate::error::{Error, Result};
use crate::types::Jsep;
use serde::Serialize;
use tracing::debug;

/// Body of a videoroom request, tagged by `request`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "request", rename_all = "lowercase")]
pub enum VideoroomRequest {
    List,
    ListParticipants {
        room: FieldValue,
    },
    Join(JoinRequest),
    Publish {
        audio: bool,
        video: bool,
        data: bool,
    },
    Start,
    Leave,
    Unpublish,
}

/// `join` body, tagged by participant type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "ptype", rename_all = "lowercase")]
pub enum JoinRequest {
    Publisher {
        room: FieldValue,
        #[serde(skip_serializing_if = "Option::is_none")]
        display: Option<FieldValue>,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<FieldValue>,
        #[serde(skip_serializing_if = "Option::is_none")]
        token: Option<FieldValue>,
    },
    Subscriber {
        room: FieldValue,
        feed: FieldValue,
        offer_audio: bool,
        offer_video: bool,
        offer_data: bool,
    },
}

impl JoinRequest {
    /// Subscriber join for `feed` in `room`, offering every media kind
    #[must_use]
    pub const fn subscriber(room: FieldValue, feed: FieldValue) -> Self {
        Self::Subscriber {
            room,
            feed,
            offer_audio: true,
            offer_video: true,
            offer_data: true,
        }
    }
}

/// A message ready to be sent to the plugin handle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginMessage {
    pub body: VideoroomRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jsep: Option<Jsep>,
}

impl PluginMessage {
    #[must_use]
    pub const fn new(body: VideoroomRequest) -> Self {
        Self { body, jsep: None }
    }

    #[must_use]
    pub fn with_jsep(mut self, jsep: Jsep) -> Self {
        self.jsep = Some(jsep);
        self
    }

    /// Wire representation (`{"body": {...}, "jsep": {...}}`)
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

/// Build the request body for `command` from `context`.
///
/// Does not touch `context`. `Subscribe` yields the subscriber `join` body,
/// so the caller must already know the `feed` and `room` to subscribe to.
pub fn build(command: Command, context: &Bundle) -> Result<VideoroomRequest> {
    let body = match command {
        Command::List => VideoroomRequest::List,
        Command::ListParticipants => VideoroomRequest::ListParticipants {
            room: context.require("room")?.clone(),
        },
        Command::Join => VideoroomRequest::Join(JoinRequest::Publisher {
            room: context.require("room")?.clone(),
            display: context.get("display").cloned(),
            id: context.get("id").cloned(),
            token: context.get("token").cloned(),
        }),
        Command::Publish => VideoroomRequest::Publish {
            audio: context.optional_bool("audio")?.unwrap_or(true),
            video: context.optional_bool("video")?.unwrap_or(true),
            data: context.optional_bool("data")?.unwrap_or(true),
        },
        Command::Subscribe => VideoroomRequest::Join(JoinRequest::subscriber(
            context.require("room")?.clone(),
            context.require("feed")?.clone(),
        )),
        Command::Start => VideoroomRequest::Start,
        Command::Leave => VideoroomRequest::Leave,
        Command::Unpublish => VideoroomRequest::Unpublish,
        Command::Attach => return Err(Error::UnsupportedCommand(command)),
    };

    debug!(command = %command, "Built videoroom request");
    Ok(body)
}

/// Build a complete message with no negotiation payload
pub fn build_message(command: Command, context: &Bundle) -> Result<PluginMessage> {
    build(command, context).map(PluginMessage::new)
}
