//! Peer registry: one live peer per handle

use crate::delegate::Protocol;
use crate::peer::{Peer, PeerFactory};
use crate::types::HandleId;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Owns the peers of a session.
///
/// Mutated only by the session actor, so a plain map is enough.
pub struct PeerRegistry {
    factory: Arc<dyn PeerFactory>,
    owner: Arc<dyn Protocol>,
    peers: HashMap<HandleId, Arc<dyn Peer>>,
}

impl PeerRegistry {
    pub fn new(factory: Arc<dyn PeerFactory>, owner: Arc<dyn Protocol>) -> Self {
        Self {
            factory,
            owner,
            peers: HashMap::new(),
        }
    }

    /// Existing peer for `handle`, or a new one from the factory
    pub fn get_or_create(&mut self, handle: HandleId) -> Arc<dyn Peer> {
        let peer = self.peers.entry(handle).or_insert_with(|| {
            debug!(handle = %handle, "Creating peer");
            self.factory.create(handle, Arc::clone(&self.owner))
        });
        Arc::clone(peer)
    }

    #[must_use]
    pub fn get(&self, handle: HandleId) -> Option<Arc<dyn Peer>> {
        self.peers.get(&handle).cloned()
    }

    pub fn remove(&mut self, handle: HandleId) -> Option<Arc<dyn Peer>> {
        self.peers.remove(&handle)
    }

    #[must_use]
    pub fn contains(&self, handle: HandleId) -> bool {
        self.peers.contains_key(&handle)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delegate::MockProtocol;
    use crate::peer::{MockPeer, MockPeerFactory};

    #[test]
    fn test_one_peer_per_handle() {
        let mut factory = MockPeerFactory::new();
        factory
            .expect_create()
            .withf(|handle, _| *handle == HandleId::new(7))
            .times(1)
            .returning(|_, _| Arc::new(MockPeer::new()) as Arc<dyn Peer>);

        let mut registry = PeerRegistry::new(Arc::new(factory), Arc::new(MockProtocol::new()));
        let first = registry.get_or_create(HandleId::new(7));
        let second = registry.get_or_create(HandleId::new(7));

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut factory = MockPeerFactory::new();
        factory
            .expect_create()
            .returning(|_, _| Arc::new(MockPeer::new()) as Arc<dyn Peer>);

        let mut registry = PeerRegistry::new(Arc::new(factory), Arc::new(MockProtocol::new()));
        registry.get_or_create(HandleId::new(1));
        assert!(registry.contains(HandleId::new(1)));
        assert!(registry.remove(HandleId::new(1)).is_some());
        assert!(registry.get(HandleId::new(1)).is_none());
        assert!(registry.is_empty());
    }
}
