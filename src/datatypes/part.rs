// ABOUTME: MMS multipart body parts (WAP-230 Section 8.5) and the ordered body that holds them
// ABOUTME: Each part encodes its own header block; the send-req composer frames them with uintvar lengths

use crate::codec::{
    angle_bracketed, encode_content_type_value, encode_quoted_string, encode_text_string,
    encode_uintvar, encode_with_value_length, CodecError, Encodable,
};
use crate::datatypes::Charset;
use bytes::{BufMut, Bytes, BytesMut};

/// Well-known parameter and part header codes used inside a multipart body
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum PartParameter {
    /// `charset` content-type parameter
    Charset = 0x81,
    /// `name` content-type parameter
    Name = 0x85,
    /// `type` parameter of multipart/related
    Type = 0x89,
    /// `start` parameter of multipart/related
    Start = 0x8A,
    /// Content-Location part header
    ContentLocation = 0x8E,
    /// Content-ID part header
    ContentId = 0xC0,
}

/// One part of a multipart MMS body
#[derive(Clone, Debug, PartialEq, Default)]
pub struct PduPart {
    /// MIME type, e.g. `image/jpeg`
    pub content_type: Bytes,
    /// Charset parameter, only set for text parts
    pub charset: Option<Charset>,
    /// `name` content-type parameter
    pub name: Option<Bytes>,
    /// File name hint, used when no name is set
    pub filename: Option<Bytes>,
    /// Content-Location header; SMIL documents reference parts by it
    pub content_location: Option<Bytes>,
    /// Content-ID header, written as `<id>`
    pub content_id: Option<Bytes>,
    /// Raw payload
    pub data: Bytes,
}

impl PduPart {
    /// Create a part with a content type and payload
    pub fn new(content_type: impl Into<Bytes>, data: impl Into<Bytes>) -> Self {
        Self {
            content_type: content_type.into(),
            data: data.into(),
            ..Default::default()
        }
    }

    pub fn with_charset(mut self, charset: Charset) -> Self {
        self.charset = Some(charset);
        self
    }

    pub fn with_name(mut self, name: impl Into<Bytes>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_filename(mut self, filename: impl Into<Bytes>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_content_location(mut self, location: impl Into<Bytes>) -> Self {
        self.content_location = Some(location.into());
        self
    }

    pub fn with_content_id(mut self, content_id: impl Into<Bytes>) -> Self {
        self.content_id = Some(content_id.into());
        self
    }

    /// Content type as text
    pub fn content_type_str(&self) -> &str {
        std::str::from_utf8(&self.content_type).unwrap_or_default()
    }

    /// Location a presentation document should use to reference this part
    pub fn generate_location(&self) -> String {
        let location = self
            .content_location
            .as_ref()
            .or(self.name.as_ref())
            .or(self.filename.as_ref());

        match location {
            Some(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            None => {
                let content_id = self.content_id.as_deref().unwrap_or_default();
                format!("cid:{}", String::from_utf8_lossy(content_id))
            }
        }
    }

    /// Encode the part header block (content-type with parameters, Content-ID,
    /// Content-Location). `index` is only used for error reporting.
    pub fn encode_headers(&self, index: usize, buf: &mut BytesMut) -> Result<(), CodecError> {
        if self.content_type.is_empty() {
            return Err(CodecError::MissingContentType { index });
        }

        // At least one of name, filename or location must label the part
        let name = self
            .name
            .as_ref()
            .or(self.filename.as_ref())
            .or(self.content_location.as_ref())
            .ok_or(CodecError::UnnamedPart { index })?;

        encode_with_value_length(buf, |inner| {
            encode_content_type_value(inner, &self.content_type)?;

            inner.put_u8(PartParameter::Name as u8);
            encode_text_string(inner, name);

            if let Some(charset) = self.charset {
                inner.put_u8(PartParameter::Charset as u8);
                charset.encode(inner)?;
            }
            Ok(())
        })?;

        if let Some(content_id) = &self.content_id {
            buf.put_u8(PartParameter::ContentId as u8);
            encode_quoted_string(buf, &angle_bracketed(content_id));
        }

        if let Some(location) = &self.content_location {
            buf.put_u8(PartParameter::ContentLocation as u8);
            encode_text_string(buf, location);
        }

        Ok(())
    }

    /// Encode the uintvar header/data lengths and header block, without the data.
    ///
    /// The payload is appended separately so large media is copied once.
    pub fn encode_framing(&self, index: usize) -> Result<BytesMut, CodecError> {
        let mut headers = BytesMut::new();
        self.encode_headers(index, &mut headers)?;

        let mut framing = BytesMut::with_capacity(headers.len() + 10);
        encode_uintvar(&mut framing, headers.len() as u64);
        encode_uintvar(&mut framing, self.data.len() as u64);
        framing.put_slice(&headers);
        Ok(framing)
    }
}

impl Encodable for PduPart {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let framing = self.encode_framing(0)?;
        buf.put_slice(&framing);
        buf.put_slice(&self.data);
        Ok(())
    }
}

/// Ordered list of body parts
#[derive(Clone, Debug, PartialEq, Default)]
pub struct PduBody {
    parts: Vec<PduPart>,
}

impl PduBody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a part
    pub fn add_part(&mut self, part: PduPart) {
        self.parts.push(part);
    }

    /// Insert a part at `index`, shifting later parts back
    pub fn insert_part(&mut self, index: usize, part: PduPart) {
        self.parts.insert(index, part);
    }

    pub fn part(&self, index: usize) -> Option<&PduPart> {
        self.parts.get(index)
    }

    pub fn parts(&self) -> &[PduPart] {
        &self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Find a part by Content-ID, with or without angle brackets
    pub fn part_by_content_id(&self, content_id: &str) -> Option<&PduPart> {
        let wanted = angle_bracketed(content_id.as_bytes());
        self.parts.iter().find(|part| {
            part.content_id
                .as_ref()
                .is_some_and(|id| angle_bracketed(id) == wanted)
        })
    }
}
