//! Media negotiation endpoints
//!
//! A [`Peer`] wraps one peer connection of the media engine. Offer and answer
//! creation only start the work: the engine reports the produced SDP later
//! through [`crate::PluginSession::on_offer`] / [`crate::PluginSession::on_answer`]
//! with the same [`CorrelationId`] it was given.

use crate::constraints::Constraints;
use crate::delegate::Protocol;
use crate::error::PeerError;
use crate::types::{CorrelationId, HandleId, SdpType};
use async_trait::async_trait;
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Peer: Send + Sync {
    /// Start creating an offer; the SDP arrives later tagged with `token`
    async fn create_offer(
        &self,
        constraints: Constraints,
        token: CorrelationId,
    ) -> Result<(), PeerError>;

    /// Start creating an answer; the SDP arrives later tagged with `token`
    async fn create_answer(
        &self,
        constraints: Constraints,
        token: CorrelationId,
    ) -> Result<(), PeerError>;

    async fn set_local_description(&self, sdp_type: SdpType, sdp: String) -> Result<(), PeerError>;

    async fn set_remote_description(&self, sdp_type: SdpType, sdp: String)
    -> Result<(), PeerError>;
}

/// Creates the peer bound to a handle of the owning session
#[cfg_attr(test, automock)]
pub trait PeerFactory: Send + Sync {
    fn create(&self, handle: HandleId, owner: Arc<dyn Protocol>) -> Arc<dyn Peer>;
}
