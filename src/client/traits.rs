// ABOUTME: Collaborator traits the router drives: transport, MMS network, store, address book, notifier
// ABOUTME: Transport and network use native async functions; store-side traits are sync and object safe

use crate::client::error::{MmsErrorKind, PersistenceResult, TransportError};
use crate::client::types::{
    CompletionToken, ConfigOverrides, Fields, MessageBox, PersistOptions, RecordUri, StagedPdu,
    Table, ThreadId,
};
use crate::datatypes::SendRequest;
use crate::segment::SegmentCapacity;
use bytes::Bytes;
use std::collections::BTreeSet;

/// The device's SMS/MMS transport
///
/// Completion of a send is reported later through the `Notifier`, keyed
/// by the tokens handed over here.
pub trait Transport {
    /// Estimate how many segments `text` needs and how much room is left
    fn estimate_segment_capacity(&self, text: &str) -> SegmentCapacity;

    /// Divide one chunk of text into provider-sized units
    fn divide_message(&self, text: &str) -> Vec<String>;

    /// Send the units of one chunk as a single multipart request
    ///
    /// `sent_tokens` and `delivery_tokens` hold one entry per unit.
    async fn send_text_units(
        &self,
        address: &str,
        units: Vec<String>,
        sent_tokens: Vec<Option<CompletionToken>>,
        delivery_tokens: Vec<Option<CompletionToken>>,
    ) -> Result<(), TransportError>;

    /// Hand a staged PDU to the system MMS service
    ///
    /// Returns once the request is accepted; the outcome arrives later.
    async fn send_multimedia(
        &self,
        pdu: &StagedPdu,
        overrides: &ConfigOverrides,
        token: CompletionToken,
    ) -> Result<(), TransportError>;

    /// Line number of the given subscription, used as the MMS sender
    fn line_number(&self, subscription_id: Option<i32>) -> Option<String>;
}

/// Network used by the direct MMS strategy
pub trait MmsNetwork {
    /// Bring up the MMS network for one request
    async fn acquire(&self) -> Result<(), TransportError>;

    /// Release the network acquired by `acquire`
    fn release(&self);

    /// POST the PDU to the proxy-relay
    async fn execute(&self, pdu: Bytes, location: Option<&RecordUri>) -> Result<(), TransportError>;
}

/// Persistent message store
pub trait MessageStore: Send + Sync {
    /// Insert an outgoing SMS row
    fn insert_message(
        &self,
        thread_id: ThreadId,
        address: &str,
        body: &str,
        fields: &Fields,
    ) -> PersistenceResult<RecordUri>;

    /// Thread the record belongs to
    fn query_thread_id(&self, uri: &RecordUri) -> PersistenceResult<ThreadId>;

    /// Move a record to another mailbox, returning the rows updated
    fn update_box_state(&self, uri: &RecordUri, message_box: MessageBox) -> PersistenceResult<usize>;

    /// Persist a composed send-req
    fn persist_send_request(
        &self,
        request: &SendRequest,
        recipients: &[String],
        options: &PersistOptions,
    ) -> PersistenceResult<RecordUri>;

    /// Insert a raw row
    fn insert_row(&self, table: Table, fields: &Fields) -> PersistenceResult<RecordUri>;

    /// Delete a row
    fn delete_row(&self, uri: &RecordUri) -> PersistenceResult<()>;
}

/// Conversation thread resolution
pub trait AddressBook: Send + Sync {
    fn get_or_create_thread_id(&self, addresses: &BTreeSet<String>) -> PersistenceResult<ThreadId>;
}

/// Receives asynchronous completion signals
pub trait Notifier: Send + Sync {
    fn on_sent(&self, token: &CompletionToken);

    fn on_delivered(&self, token: &CompletionToken);

    fn on_error(&self, kind: MmsErrorKind, token: &CompletionToken);
}
