// ABOUTME: Supporting types for message dispatch including the outgoing message and its builder
// ABOUTME: Also defines completion tokens, store record handles and the values passed to collaborators

use bytes::Bytes;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// A media attachment
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    /// Raw payload
    pub data: Bytes,
    /// MIME type, e.g. `image/jpeg`
    pub mime_type: String,
    /// Display name, used as the part name when set
    pub name: Option<String>,
    /// Original file name
    pub filename: Option<String>,
}

impl Attachment {
    /// Create an attachment with a MIME type
    pub fn new(data: impl Into<Bytes>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
            name: None,
            filename: None,
        }
    }

    /// Create a JPEG image attachment
    pub fn image(data: impl Into<Bytes>) -> Self {
        Self::new(data, "image/jpeg")
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the file name
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}

/// A message to dispatch to one or more recipients
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    /// Message text, may be empty
    pub text: String,
    /// Recipient addresses in order; duplicates are kept
    pub addresses: Vec<String>,
    /// Subject; any subject, even empty, routes the message as MMS
    pub subject: Option<String>,
    /// Sender address for the MMS From header
    pub from: Option<String>,
    /// Image attachments, placed first in the MMS body
    pub attachments: Vec<Attachment>,
    /// Other media (video, audio, contact cards), placed after the images
    pub extra_parts: Vec<Attachment>,
    /// Persist the message to the store before sending
    pub save: bool,
    /// Group-send override for this message; `Settings::group` when unset
    pub group: Option<bool>,
    /// Record of a previous attempt, used when resending without saving
    pub existing_message_uri: Option<RecordUri>,
}

impl OutgoingMessage {
    /// Create a text message to the given recipients
    pub fn new(text: impl Into<String>, addresses: Vec<String>) -> Self {
        Self {
            text: text.into(),
            addresses,
            subject: None,
            from: None,
            attachments: Vec::new(),
            extra_parts: Vec::new(),
            save: true,
            group: None,
            existing_message_uri: None,
        }
    }

    /// Create a builder for constructing messages
    pub fn builder() -> OutgoingMessageBuilder {
        OutgoingMessageBuilder::default()
    }

    /// Whether this message carries any media
    pub fn has_media(&self) -> bool {
        !self.attachments.is_empty() || !self.extra_parts.is_empty()
    }
}

/// Builder for constructing outgoing messages with fluent API
#[derive(Debug, Default)]
pub struct OutgoingMessageBuilder {
    text: Option<String>,
    addresses: Vec<String>,
    subject: Option<String>,
    from: Option<String>,
    attachments: Vec<Attachment>,
    extra_parts: Vec<Attachment>,
    save: Option<bool>,
    group: Option<bool>,
    existing_message_uri: Option<RecordUri>,
}

impl OutgoingMessageBuilder {
    /// Set message text
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Add a recipient
    pub fn to(mut self, address: impl Into<String>) -> Self {
        self.addresses.push(address.into());
        self
    }

    /// Add several recipients
    pub fn addresses<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.addresses.extend(addresses.into_iter().map(Into::into));
        self
    }

    /// Set the subject
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Set the sender address
    pub fn from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// Attach an image
    pub fn attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Attach non-image media
    pub fn extra_part(mut self, part: Attachment) -> Self {
        self.extra_parts.push(part);
        self
    }

    /// Set whether the message is persisted (default: true)
    pub fn save(mut self, save: bool) -> Self {
        self.save = Some(save);
        self
    }

    /// Override group mode for this message
    pub fn group(mut self, group: bool) -> Self {
        self.group = Some(group);
        self
    }

    /// Resend a message already in the store
    pub fn existing_message_uri(mut self, uri: RecordUri) -> Self {
        self.existing_message_uri = Some(uri);
        self
    }

    /// Build the message
    pub fn build(self) -> Result<OutgoingMessage, String> {
        if self.addresses.is_empty() {
            return Err("At least one recipient address is required".to_string());
        }

        Ok(OutgoingMessage {
            text: self.text.unwrap_or_default(),
            addresses: self.addresses,
            subject: self.subject,
            from: self.from,
            attachments: self.attachments,
            extra_parts: self.extra_parts,
            save: self.save.unwrap_or(true),
            group: self.group,
            existing_message_uri: self.existing_message_uri,
        })
    }
}

/// Opaque handle of a record in the message store, e.g. `content://sms/12`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordUri(pub String);

impl RecordUri {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric id carried in the last path segment, if any
    pub fn id(&self) -> Option<i64> {
        self.0.rsplit('/').next()?.trim().parse().ok()
    }
}

impl fmt::Display for RecordUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Conversation thread identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ThreadId(pub i64);

impl ThreadId {
    /// No thread could be resolved
    pub const NONE: ThreadId = ThreadId(0);
}

/// Mailbox a stored message lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageBox {
    Inbox = 1,
    Sent = 2,
    Draft = 3,
    Outbox = 4,
    Failed = 5,
    Queued = 6,
}

impl MessageBox {
    pub fn as_i64(&self) -> i64 {
        *self as i64
    }
}

/// A column value written to the store
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(i64),
    Text(String),
    Blob(Bytes),
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Int(value as i64)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<Bytes> for FieldValue {
    fn from(value: Bytes) -> Self {
        FieldValue::Blob(value)
    }
}

/// Column name to value map for one row
pub type Fields = BTreeMap<&'static str, FieldValue>;

/// Tables touched by the legacy multi-row MMS insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Table {
    /// Sent SMS rows
    SentSms,
    /// MMS message rows
    Mms,
    /// Parts of the MMS with the given row id
    MmsPart { message_id: i64 },
    /// Addresses of the MMS with the given row id
    MmsAddress { message_id: i64 },
}

/// How a send-req is filed when persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistOptions {
    pub message_box: MessageBox,
    pub group: bool,
    pub subscription_id: Option<i32>,
}

/// What a completion token reports on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    SmsSent,
    SmsDelivered,
    MmsSent,
}

/// Correlates an asynchronous send outcome with the request that caused it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionToken {
    pub kind: TokenKind,
    /// Stored message id for SMS, thread id for direct MMS
    pub id: i64,
    /// Store record of the message, when persisted
    pub message_uri: Option<RecordUri>,
    /// Staged PDU file, system MMS sends only
    pub staged_file: Option<PathBuf>,
}

impl CompletionToken {
    pub fn sms_sent(id: i64, message_uri: Option<RecordUri>) -> Self {
        Self {
            kind: TokenKind::SmsSent,
            id,
            message_uri,
            staged_file: None,
        }
    }

    pub fn sms_delivered(id: i64, message_uri: Option<RecordUri>) -> Self {
        Self {
            kind: TokenKind::SmsDelivered,
            id,
            message_uri,
            staged_file: None,
        }
    }

    pub fn mms_sent(id: i64, message_uri: Option<RecordUri>, staged_file: Option<PathBuf>) -> Self {
        Self {
            kind: TokenKind::MmsSent,
            id,
            message_uri,
            staged_file,
        }
    }
}

/// A PDU written to disk for the system MMS service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedPdu {
    pub path: PathBuf,
    /// `content://<authority>/<file name>`
    pub content_uri: String,
}

/// Per-request MMS configuration handed to the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub group_mms_enabled: bool,
    pub http_params: Option<String>,
    pub max_message_size: usize,
}
