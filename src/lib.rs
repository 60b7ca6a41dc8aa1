pub mod client;
pub mod codec;
pub mod datatypes;
pub mod pdu;
pub mod segment;
pub mod text;

#[cfg(test)]
mod tests;

// Re-export codec types for direct access
pub use codec::{CodecError, Encodable};

// Re-export the main dispatch API for easy access
pub use client::{
    Attachment, OutgoingMessage, SendError, SendResult, Settings, TransactionRouter,
};
pub use pdu::{ComposedMessage, EncodingError, MessagePart, PduBuilder};

/// Error returned by most functions.
///
/// Dispatch and composition have their own error enums (`SendError`,
/// `EncodingError`); this boxed alias is for applications that combine
/// them with their own failures, such as the demo binaries.
pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// A specialized `Result` type for applications built on this crate.
///
/// This is defined as a convenience.
///
/// # Examples
///
/// ## Composing an MMS
///
/// Composition needs no device collaborators, so it can run anywhere:
///
/// ```rust
/// use send_message::{MessagePart, PduBuilder};
///
/// fn main() -> send_message::Result<()> {
///     let parts = vec![
///         MessagePart::new("cat.jpg", "image/jpeg", vec![0xFFu8, 0xD8, 0xFF]),
///         MessagePart::new("text", "text/plain", "Look at this"),
///     ];
///
///     let composed = PduBuilder::new().compose(
///         Some("+15550100"),
///         &["+15550101".to_string()],
///         &parts,
///         Some("Cat"),
///     )?;
///
///     // m-send-req, then the generated SMIL part at index 0
///     assert_eq!(&composed.bytes[..2], &[0x8C, 0x80]);
///     assert_eq!(composed.request.body.len(), 3);
///     Ok(())
/// }
/// ```
///
/// ## Splitting a long text
///
/// ```rust
/// use send_message::segment::{plan_split, split, SegmentCapacity};
///
/// let body = "a".repeat(320);
/// // The transport reports three segments with 139 code units left over
/// let capacity = SegmentCapacity::new(3, 320, 139);
/// let chunks = split(&body, plan_split(&body, &capacity, true));
///
/// assert_eq!(chunks.len(), 3);
/// assert!(chunks[0].starts_with("(1/3) "));
/// ```
pub type Result<T> = std::result::Result<T, Error>;
