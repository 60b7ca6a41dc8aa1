// ABOUTME: Message dispatch module routing outgoing messages to SMS or MMS through collaborator traits
// ABOUTME: Exports the router, its settings, the collaborator traits, error types and supporting types

//! Message Dispatch Module
//!
//! This module turns an [`OutgoingMessage`] into platform sends:
//!
//! * **Routing** - Media, a subject, group sends and long texts go as MMS, everything else as SMS
//! * **Native async traits** - The transport and MMS network use async fn in traits (no async_trait dependency)
//! * **Pluggable collaborators** - Store, address book and notifier are trait objects
//! * **Two MMS strategies** - Direct POST over a leased network, or staging for the system service
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use send_message::client::{OutgoingMessage, Settings, TransactionRouter};
//!
//! let router = TransactionRouter::new(transport, network, store, address_book, notifier);
//!
//! let message = OutgoingMessage::builder()
//!     .text("Hello!")
//!     .addresses(["5550101", "5550102"])
//!     .build()?;
//!
//! // Two recipients with group mode on: one MMS to both
//! router.dispatch(&message, &Settings::default()).await?;
//!
//! // Group mode off: a group placeholder SMS, then one SMS per recipient
//! router.dispatch(&message, &Settings::default().with_group(false)).await?;
//! ```
//!
//! ## Completion
//!
//! Sends report their outcome later through the [`Notifier`], keyed by the
//! [`CompletionToken`] handed to the transport. [`ChannelNotifier`] turns
//! those callbacks into a stream of [`CompletionEvent`]s:
//!
//! ```rust
//! use send_message::client::{ChannelNotifier, CompletionEvent, CompletionToken, Notifier};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let (notifier, mut events) = ChannelNotifier::new();
//! notifier.on_sent(&CompletionToken::sms_sent(12, None));
//!
//! let event = events.recv().await;
//! assert!(matches!(event, Some(CompletionEvent::Sent(token)) if token.id == 12));
//! # }
//! ```

pub mod error;
pub mod mms;
pub mod notify;
pub mod router;
pub mod settings;
pub mod store;
pub mod traits;
pub mod types;

// Re-export the main types for easy access
pub use error::{
    MmsErrorKind, PersistenceError, PersistenceResult, SendError, SendResult, TransportError,
};
pub use mms::{DirectSender, MmsRequest, NetworkLease, SystemSender, DEFAULT_MMS_TOKEN};
pub use notify::{ChannelNotifier, CompletionEvent};
pub use router::TransactionRouter;
pub use settings::{MmsStrategy, Settings, DEFAULT_FILE_PROVIDER_AUTHORITY, DEFAULT_MAX_MESSAGE_SIZE};
pub use store::{FallbackStore, LegacyStore};
pub use traits::{AddressBook, MessageStore, MmsNetwork, Notifier, Transport};
pub use types::{
    Attachment, CompletionToken, ConfigOverrides, FieldValue, Fields, MessageBox, OutgoingMessage,
    OutgoingMessageBuilder, PersistOptions, RecordUri, StagedPdu, Table, ThreadId, TokenKind,
};
