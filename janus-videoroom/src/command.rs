use serde::{Deserialize, Serialize};
use std::fmt;

/// Janus plugin package names
pub struct JanusPlugins;

impl JanusPlugins {
    pub const VIDEOROOM: &'static str = "janus.plugin.videoroom";
}

/// Application-level intents understood by the adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    List,
    ListParticipants,
    Join,
    Publish,
    Subscribe,
    /// Transport-level handle allocation; never handled by the plugin itself
    Attach,
    /// Negotiation completion sent after a subscriber answer
    Start,
    Leave,
    Unpublish,
}

impl Command {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::ListParticipants => "listparticipants",
            Self::Join => "join",
            Self::Publish => "publish",
            Self::Subscribe => "subscribe",
            Self::Attach => "attach",
            Self::Start => "start",
            Self::Leave => "leave",
            Self::Unpublish => "unpublish",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
