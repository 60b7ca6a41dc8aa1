// ABOUTME: Implements the MMS m-send-req PDU (OMA-MMS-ENC 1.2 Section 6.1.1) and its multipart body
// ABOUTME: Headers are written in the fixed order the proxy-relay expects, followed by the related parts

use crate::codec::{
    angle_bracketed, encode_long_integer, encode_short_integer, encode_text_string,
    encode_uintvar, encode_with_value_length, well_known_content_type, CodecError, Encodable,
};
use crate::datatypes::part::PartParameter;
use crate::datatypes::{
    EncodedAddress, EncodedString, ExpiryToken, FromAddress, HeaderField, MessageClass,
    MessageType, MmsVersion, PduBody, Priority, ReportRequest,
};
use bytes::{BufMut, Bytes, BytesMut};
use std::time::{SystemTime, UNIX_EPOCH};

/// Relative expiry requested for every send-req: one week
pub const DEFAULT_EXPIRY_SECONDS: u64 = 7 * 24 * 60 * 60;

/// Root content type of every composed message
pub const MULTIPART_RELATED: &str = "application/vnd.wap.multipart.related";

/// m-send-req: a multimedia message handed to the MMS proxy-relay for delivery
#[derive(Clone, Debug, PartialEq)]
pub struct SendRequest {
    /// X-Mms-Transaction-ID, unique per request
    pub transaction_id: Bytes,
    pub version: MmsVersion,
    /// Date in seconds since the Unix epoch
    pub date: u64,
    pub from: FromAddress,
    pub to: Vec<EncodedAddress>,
    /// Only written when present
    pub subject: Option<EncodedString>,
    pub message_class: MessageClass,
    /// Relative expiry in seconds
    pub expiry: u64,
    pub priority: Priority,
    pub delivery_report: ReportRequest,
    pub read_report: ReportRequest,
    /// Estimated message size carried in X-Mms-Message-Size
    pub message_size: u64,
    pub body: PduBody,
}

impl SendRequest {
    /// Create a send-req for `to` with the current time and a fresh transaction id
    pub fn new(to: Vec<EncodedAddress>, body: PduBody) -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self {
            transaction_id: generate_transaction_id(now.as_millis() as u64),
            version: MmsVersion::CURRENT,
            date: now.as_secs(),
            from: FromAddress::default(),
            to,
            subject: None,
            message_class: MessageClass::default(),
            expiry: DEFAULT_EXPIRY_SECONDS,
            priority: Priority::default(),
            delivery_report: ReportRequest::default(),
            read_report: ReportRequest::default(),
            message_size: 0,
            body,
        }
    }

    pub fn with_from(mut self, from: FromAddress) -> Self {
        self.from = from;
        self
    }

    pub fn with_subject(mut self, subject: EncodedString) -> Self {
        self.subject = Some(subject);
        self
    }

    pub fn with_date(mut self, date: u64) -> Self {
        self.date = date;
        self
    }

    pub fn with_transaction_id(mut self, transaction_id: impl Into<Bytes>) -> Self {
        self.transaction_id = transaction_id.into();
        self
    }

    pub fn with_message_size(mut self, message_size: u64) -> Self {
        self.message_size = message_size;
        self
    }

    /// Validate the request before encoding
    pub fn validate(&self) -> Result<(), CodecError> {
        if self.transaction_id.is_empty() {
            return Err(CodecError::MissingHeader("X-Mms-Transaction-ID"));
        }
        if self.to.is_empty() {
            return Err(CodecError::MissingHeader("To"));
        }
        if self.body.is_empty() {
            return Err(CodecError::MissingHeader("Content-Type"));
        }
        Ok(())
    }

    fn encode_headers(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        buf.put_u8(HeaderField::MessageType as u8);
        buf.put_u8(MessageType::SendReq as u8);

        buf.put_u8(HeaderField::TransactionId as u8);
        encode_text_string(buf, &self.transaction_id);

        buf.put_u8(HeaderField::MmsVersion as u8);
        encode_short_integer(buf, self.version.to_value())?;

        buf.put_u8(HeaderField::Date as u8);
        encode_long_integer(buf, self.date);

        buf.put_u8(HeaderField::From as u8);
        self.from.encode(buf)?;

        for recipient in &self.to {
            buf.put_u8(HeaderField::To as u8);
            recipient.encode(buf)?;
        }

        if let Some(subject) = &self.subject {
            buf.put_u8(HeaderField::Subject as u8);
            subject.encode(buf)?;
        }

        buf.put_u8(HeaderField::MessageClass as u8);
        buf.put_u8(self.message_class as u8);

        buf.put_u8(HeaderField::Expiry as u8);
        encode_with_value_length(buf, |inner| {
            inner.put_u8(ExpiryToken::Relative as u8);
            encode_long_integer(inner, self.expiry);
            Ok(())
        })?;

        buf.put_u8(HeaderField::Priority as u8);
        buf.put_u8(self.priority as u8);

        buf.put_u8(HeaderField::DeliveryReport as u8);
        buf.put_u8(self.delivery_report as u8);

        buf.put_u8(HeaderField::ReadReport as u8);
        buf.put_u8(self.read_report as u8);

        buf.put_u8(HeaderField::MessageSize as u8);
        encode_long_integer(buf, self.message_size);

        buf.put_u8(HeaderField::ContentType as u8);
        self.encode_content_type(buf)
    }

    /// multipart/related with `start` and `type` taken from the first part
    fn encode_content_type(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let root = self
            .body
            .part(0)
            .ok_or(CodecError::MissingHeader("Content-Type"))?;

        encode_with_value_length(buf, |inner| {
            match well_known_content_type(MULTIPART_RELATED) {
                Some(assigned) => encode_short_integer(inner, assigned)?,
                None => encode_text_string(inner, MULTIPART_RELATED.as_bytes()),
            }

            if let Some(content_id) = &root.content_id {
                inner.put_u8(PartParameter::Start as u8);
                encode_text_string(inner, &angle_bracketed(content_id));
            }

            inner.put_u8(PartParameter::Type as u8);
            encode_text_string(inner, &root.content_type);
            Ok(())
        })
    }

    /// Header block plus per-part framing; part payloads are referenced, not copied
    fn layout(&self) -> Result<(BytesMut, Vec<BytesMut>), CodecError> {
        self.validate()?;

        let mut headers = BytesMut::new();
        self.encode_headers(&mut headers)?;
        encode_uintvar(&mut headers, self.body.len() as u64);

        let framings = self
            .body
            .parts()
            .iter()
            .enumerate()
            .map(|(index, part)| part.encode_framing(index))
            .collect::<Result<Vec<_>, _>>()?;

        Ok((headers, framings))
    }
}

impl Encodable for SendRequest {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let (headers, framings) = self.layout()?;
        buf.put_slice(&headers);
        for (framing, part) in framings.iter().zip(self.body.parts()) {
            buf.put_slice(framing);
            buf.put_slice(&part.data);
        }
        Ok(())
    }

    /// Encode into a single allocation, reporting `OutOfMemory` instead of aborting
    fn to_bytes(&self) -> Result<Bytes, CodecError> {
        let (headers, framings) = self.layout()?;

        let requested = headers.len()
            + framings
                .iter()
                .zip(self.body.parts())
                .map(|(framing, part)| framing.len() + part.data.len())
                .sum::<usize>();

        let mut out = Vec::new();
        out.try_reserve_exact(requested)
            .map_err(|_| CodecError::OutOfMemory { requested })?;

        out.extend_from_slice(&headers);
        for (framing, part) in framings.iter().zip(self.body.parts()) {
            out.extend_from_slice(framing);
            out.extend_from_slice(&part.data);
        }
        Ok(Bytes::from(out))
    }
}

/// `T` followed by the lowercase hex of the epoch milliseconds
pub fn generate_transaction_id(epoch_millis: u64) -> Bytes {
    Bytes::from(format!("T{epoch_millis:x}"))
}
