// ABOUTME: Composes a complete m-send-req from recipients, media parts and an optional subject
// ABOUTME: Shared by every MMS send strategy so the wire output never diverges between them

use crate::codec::{CodecError, Encodable};
use crate::datatypes::{
    Charset, EncodedAddress, EncodedString, FromAddress, PduBody, PduPart, SendRequest,
    generate_transaction_id,
};
use crate::pdu::smil::SmilDocument;
use bytes::Bytes;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, warn};

/// One media unit handed to the builder
#[derive(Clone, Debug, PartialEq)]
pub struct MessagePart {
    /// Part name; also used as Content-Location and to derive the Content-ID
    pub name: String,
    pub filename: Option<String>,
    pub mime_type: String,
    pub data: Bytes,
}

impl MessagePart {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            filename: None,
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Name without its extension: `photo.jpg` gives `photo`, `noext` stays `noext`
    pub fn content_id(&self) -> &str {
        match self.name.rfind('.') {
            Some(index) => &self.name[..index],
            None => &self.name,
        }
    }

    /// Advisory size contribution of this part to X-Mms-Message-Size.
    ///
    /// The name is counted twice; receivers have always seen this value.
    pub fn size_estimate(&self) -> u64 {
        (2 * self.name.len() + self.mime_type.len() + self.data.len() + self.content_id().len()) as u64
    }

    fn is_text(&self) -> bool {
        self.mime_type.starts_with("text")
    }

    fn to_pdu_part(&self) -> PduPart {
        let mut part = PduPart::new(self.mime_type.clone(), self.data.clone())
            .with_name(self.name.clone())
            .with_content_location(self.name.clone())
            .with_content_id(self.content_id().to_string());

        if let Some(filename) = &self.filename {
            part = part.with_filename(filename.clone());
        }
        if self.is_text() {
            part = part.with_charset(Charset::Utf8);
        }
        part
    }
}

/// Failures while composing a send-req
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("No recipient could be encoded as an MMS address")]
    NoRecipients,

    #[error("Out of memory encoding {requested} byte PDU")]
    OutOfMemory { requested: usize },

    #[error("PDU encoding failed: {0}")]
    Codec(CodecError),
}

impl From<CodecError> for EncodingError {
    fn from(error: CodecError) -> Self {
        match error {
            CodecError::OutOfMemory { requested } => EncodingError::OutOfMemory { requested },
            other => EncodingError::Codec(other),
        }
    }
}

/// The structural request and its encoded bytes
#[derive(Clone, Debug)]
pub struct ComposedMessage {
    pub request: SendRequest,
    pub bytes: Bytes,
}

/// Builds m-send-req PDUs.
///
/// ```rust
/// use send_message::pdu::{MessagePart, PduBuilder};
///
/// let parts = vec![MessagePart::new("text", "text/plain", "Hello")];
/// let composed = PduBuilder::new()
///     .compose(None, &["5550101".to_string()], &parts, None)
///     .unwrap();
///
/// assert_eq!(composed.request.body.len(), 2);
/// assert_eq!(composed.request.message_size, 27);
/// ```
#[derive(Clone, Debug, Default)]
pub struct PduBuilder {
    clock: Option<SystemTime>,
}

impl PduBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compose with a fixed time instead of the system clock
    pub fn with_time(mut self, time: SystemTime) -> Self {
        self.clock = Some(time);
        self
    }

    fn now(&self) -> Duration {
        self.clock
            .unwrap_or_else(SystemTime::now)
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
    }

    /// Compose and encode a send-req.
    ///
    /// Recipients that cannot be encoded are skipped, as is a From address
    /// that cannot be encoded. The SMIL presentation part always lands at
    /// body index 0.
    pub fn compose(
        &self,
        from: Option<&str>,
        recipients: &[String],
        parts: &[MessagePart],
        subject: Option<&str>,
    ) -> Result<ComposedMessage, EncodingError> {
        let to: Vec<EncodedAddress> = recipients
            .iter()
            .filter_map(|recipient| match EncodedAddress::parse(recipient) {
                Ok(address) => Some(address),
                Err(error) => {
                    warn!(recipient = %recipient, error = %error, "Skipping recipient that failed address encoding");
                    None
                }
            })
            .collect();

        if to.is_empty() {
            return Err(EncodingError::NoRecipients);
        }

        let mut body = PduBody::new();
        let mut size = 0u64;
        for part in parts {
            body.add_part(part.to_pdu_part());
            size += part.size_estimate();
        }

        let smil = SmilDocument::from_body(&body);
        body.insert_part(0, smil.into_part());

        let now = self.now();
        let mut request = SendRequest::new(to, body)
            .with_from(prepare_from_address(from))
            .with_date(now.as_secs())
            .with_transaction_id(generate_transaction_id(now.as_millis() as u64))
            .with_message_size(size);

        if let Some(subject) = subject.filter(|subject| !subject.is_empty()) {
            request = request.with_subject(EncodedString::new(subject));
        }

        debug!(
            recipients = request.to.len(),
            parts = request.body.len(),
            message_size = size,
            "Composed send request"
        );

        let bytes = request.to_bytes()?;
        Ok(ComposedMessage { request, bytes })
    }
}

fn prepare_from_address(from: Option<&str>) -> FromAddress {
    let Some(from) = from.filter(|from| !from.trim().is_empty()) else {
        return FromAddress::InsertToken;
    };

    match EncodedAddress::parse(from) {
        Ok(address) => FromAddress::Present(address),
        Err(error) => {
            warn!(from = %from, error = %error, "Error encoding from address, letting the relay insert it");
            FromAddress::InsertToken
        }
    }
}
