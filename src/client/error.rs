// ABOUTME: Error types for message dispatch and the transport, store and network collaborators
// ABOUTME: Fatal errors reach the caller of dispatch; address and persistence errors are logged and absorbed

use crate::pdu::EncodingError;
use std::io;
use thiserror::Error;

/// Error returned by `TransactionRouter::dispatch`
///
/// Only the first fatal error is reported. Recipients that fail address
/// encoding and failed store writes are logged and do not surface here.
#[derive(Debug, Error)]
pub enum SendError {
    /// The message breaks a precondition (no recipients, empty or reserved address)
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// The MMS could not be composed
    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),

    /// The transport or MMS network refused or failed the send
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Result type alias for dispatch operations
pub type SendResult<T> = Result<T, SendError>;

/// Failures raised by `Transport` and `MmsNetwork` implementations
#[derive(Debug, Error)]
pub enum TransportError {
    /// I/O error while handing the message over or staging it
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The transport refused the request
    #[error("Rejected by transport: {0}")]
    Rejected(String),

    /// No network was available for the MMS request
    #[error("MMS network unavailable: {0}")]
    NetworkUnavailable(String),

    /// The request did not finish in time
    #[error("Operation timeout")]
    Timeout,
}

/// Failures raised by `MessageStore` implementations
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The write or query failed
    #[error("Store error: {0}")]
    Store(String),

    /// No record exists at the given URI
    #[error("Record not found: {0}")]
    NotFound(String),

    /// The store returned an unusable value
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

/// Result type alias for store operations
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Error kinds reported through `Notifier::on_error`
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MmsErrorKind {
    /// Writing or reading the staged PDU failed
    Io,
    /// The HTTP exchange with the proxy-relay failed
    Http,
    /// No MMS network could be acquired
    NetworkUnavailable,
    /// The send did not complete in time
    Timeout,
    /// Anything else
    Unspecified,
}

impl From<&TransportError> for MmsErrorKind {
    fn from(error: &TransportError) -> Self {
        match error {
            TransportError::Io(_) => MmsErrorKind::Io,
            TransportError::Rejected(_) => MmsErrorKind::Http,
            TransportError::NetworkUnavailable(_) => MmsErrorKind::NetworkUnavailable,
            TransportError::Timeout => MmsErrorKind::Timeout,
        }
    }
}
