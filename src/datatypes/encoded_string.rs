// ABOUTME: Encoded-string-value as used by the MMS To/Cc/Bcc/From/Subject headers
// ABOUTME: Always written with an explicit charset: value-length, charset, text-string

use crate::codec::{encode_text_string, encode_with_value_length, CodecError, Encodable};
use crate::datatypes::Charset;
use bytes::{Bytes, BytesMut};
use std::fmt;

/// Separator between several addresses packed in one recipient string
pub const ADDRESS_LIST_SEPARATOR: char = ';';

/// A text value tagged with the character set it is encoded in
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct EncodedString {
    charset: Charset,
    text: Bytes,
}

impl EncodedString {
    /// Create a UTF-8 encoded string
    pub fn new(text: &str) -> Self {
        Self {
            charset: Charset::Utf8,
            text: Bytes::copy_from_slice(text.as_bytes()),
        }
    }

    /// Create from raw bytes in the given charset
    pub fn with_charset(charset: Charset, text: impl Into<Bytes>) -> Self {
        Self {
            charset,
            text: text.into(),
        }
    }

    /// Split a `;` separated list into one value per non-empty entry
    pub fn extract(list: &str) -> Vec<EncodedString> {
        list.split(ADDRESS_LIST_SEPARATOR)
            .filter(|entry| !entry.is_empty())
            .map(EncodedString::new)
            .collect()
    }

    pub fn charset(&self) -> Charset {
        self.charset
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.text
    }

    /// Lossy string view of the text
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.text).into_owned()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Return a copy with `suffix` appended to the text
    pub fn with_suffix(&self, suffix: &str) -> Self {
        let mut text = BytesMut::with_capacity(self.text.len() + suffix.len());
        text.extend_from_slice(&self.text);
        text.extend_from_slice(suffix.as_bytes());
        Self {
            charset: self.charset,
            text: text.freeze(),
        }
    }
}

impl Encodable for EncodedString {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        encode_with_value_length(buf, |inner| {
            self.charset.encode(inner)?;
            encode_text_string(inner, &self.text);
            Ok(())
        })
    }
}

impl fmt::Debug for EncodedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedString")
            .field("charset", &self.charset)
            .field("text", &self.to_string_lossy())
            .finish()
    }
}
