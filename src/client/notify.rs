// ABOUTME: Notifier that forwards completion signals onto a tokio mpsc channel
// ABOUTME: Lets callers await send outcomes instead of registering platform callbacks

use crate::client::error::MmsErrorKind;
use crate::client::traits::Notifier;
use crate::client::types::CompletionToken;
use tokio::sync::mpsc;
use tracing::debug;

/// Outcome of one asynchronous send
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionEvent {
    Sent(CompletionToken),
    Delivered(CompletionToken),
    Failed {
        kind: MmsErrorKind,
        token: CompletionToken,
    },
}

impl CompletionEvent {
    pub fn token(&self) -> &CompletionToken {
        match self {
            CompletionEvent::Sent(token) | CompletionEvent::Delivered(token) => token,
            CompletionEvent::Failed { token, .. } => token,
        }
    }
}

/// Sends every completion signal as a `CompletionEvent`
///
/// Events are dropped once the receiver is gone.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<CompletionEvent>,
}

impl ChannelNotifier {
    /// Create a notifier and the receiver its events arrive on
    pub fn new() -> (Self, mpsc::UnboundedReceiver<CompletionEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    fn publish(&self, event: CompletionEvent) {
        if self.sender.send(event).is_err() {
            debug!("Completion receiver dropped, discarding event");
        }
    }
}

impl Notifier for ChannelNotifier {
    fn on_sent(&self, token: &CompletionToken) {
        self.publish(CompletionEvent::Sent(token.clone()));
    }

    fn on_delivered(&self, token: &CompletionToken) {
        self.publish(CompletionEvent::Delivered(token.clone()));
    }

    fn on_error(&self, kind: MmsErrorKind, token: &CompletionToken) {
        self.publish(CompletionEvent::Failed {
            kind,
            token: token.clone(),
        });
    }
}
