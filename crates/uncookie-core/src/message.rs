use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Messages for the host's messaging bus, in the wire shape the background
/// context expects (`{"action": "updateCounter", "count": 3}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Message {
    /// Aggregate effect of one interpretation pass.
    UpdateCounter { count: u64 },
    /// A wildcard cookie clear ran; the privileged context may clear the rest.
    ClearAllCookies,
    ResetCounter,
}

/// Fire-and-forget sink for [`Message`]s.
pub trait Messenger {
    fn send(&self, message: Message);
}

impl Messenger for mpsc::UnboundedSender<Message> {
    fn send(&self, message: Message) {
        if mpsc::UnboundedSender::send(self, message).is_err() {
            tracing::debug!("message receiver dropped");
        }
    }
}
