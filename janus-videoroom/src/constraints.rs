//! Negotiation constraints passed to a peer when creating an offer or answer

use serde::{Deserialize, Serialize};

/// Which media kinds a peer sends and receives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Constraints {
    pub audio: bool,
    pub video: bool,
    pub datachannel: bool,
    pub receive_audio: bool,
    pub receive_video: bool,
}

impl Constraints {
    #[must_use]
    pub const fn builder() -> ConstraintsBuilder {
        ConstraintsBuilder::new()
    }

    /// Whether the constraints request any media at all
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        !(self.audio || self.video || self.datachannel || self.receive_audio || self.receive_video)
    }
}

/// Declarative builder; starts with everything enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstraintsBuilder {
    constraints: Constraints,
}

impl ConstraintsBuilder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            constraints: Constraints {
                audio: true,
                video: true,
                datachannel: true,
                receive_audio: true,
                receive_video: true,
            },
        }
    }

    /// Disable every flag
    #[must_use]
    pub const fn none(mut self) -> Self {
        self.constraints = Constraints {
            audio: false,
            video: false,
            datachannel: false,
            receive_audio: false,
            receive_video: false,
        };
        self
    }

    #[must_use]
    pub const fn audio(mut self, enabled: bool) -> Self {
        self.constraints.audio = enabled;
        self
    }

    #[must_use]
    pub const fn video(mut self, enabled: bool) -> Self {
        self.constraints.video = enabled;
        self
    }

    #[must_use]
    pub const fn datachannel(mut self, enabled: bool) -> Self {
        self.constraints.datachannel = enabled;
        self
    }

    #[must_use]
    pub const fn receive_audio(mut self, enabled: bool) -> Self {
        self.constraints.receive_audio = enabled;
        self
    }

    #[must_use]
    pub const fn receive_video(mut self, enabled: bool) -> Self {
        self.constraints.receive_video = enabled;
        self
    }

    #[must_use]
    pub const fn build(self) -> Constraints {
        self.constraints
    }
}

impl Default for ConstraintsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
