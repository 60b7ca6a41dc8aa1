// MMS Encapsulation Codec - WSP value encodings used by the send-req composer
//
// This module provides the primitive encoders defined by WAP-230 (WSP) and
// reused by OMA MMS Encapsulation 1.2. Each PDU type implements `Encodable`
// on top of these helpers rather than carrying its own byte fiddling.

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;

/// Largest value representable as a WSP short-integer
pub const SHORT_INTEGER_MAX: u8 = 0x7F;

/// Largest length representable as a WSP short-length
pub const SHORT_LENGTH_MAX: usize = 30;

/// Length-quote octet, announces a uintvar length inside a value-length
pub const LENGTH_QUOTE: u8 = 0x1F;

/// Quote octet prefixed to text-strings whose first octet is >= 128
pub const TEXT_QUOTE: u8 = 0x7F;

/// Quote octet prefixed to quoted-strings (Content-ID values)
pub const QUOTED_STRING_QUOTE: u8 = 0x22;

/// Long-integers carry at most 8 octets of payload
const LONG_INTEGER_LENGTH_MAX: usize = 8;

/// Trait for PDU values that can be encoded to bytes
pub trait Encodable {
    /// Encode this value to the buffer
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError>;

    /// Calculate the encoded size by encoding into a scratch buffer
    fn encoded_size(&self) -> usize {
        let mut buf = BytesMut::new();
        self.encode(&mut buf).map(|_| buf.len()).unwrap_or(0)
    }

    /// Convert this value to an immutable byte buffer
    fn to_bytes(&self) -> Result<Bytes, CodecError> {
        let mut buf = BytesMut::new();
        self.encode(&mut buf)?;
        Ok(buf.freeze())
    }
}

/// Codec errors with detailed context for debugging
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Missing mandatory header: {0}")]
    MissingHeader(&'static str),

    #[error("Value {value} out of range for {field} (max {max})")]
    ValueOutOfRange {
        field: &'static str,
        value: u64,
        max: u64,
    },

    #[error("Part {index} has no name, filename or content-location")]
    UnnamedPart { index: usize },

    #[error("Part {index} has an empty content type")]
    MissingContentType { index: usize },

    #[error("Out of memory reserving {requested} bytes for the encoded PDU")]
    OutOfMemory { requested: usize },
}

/// Encode a short-integer (value | 0x80)
pub fn encode_short_integer(buf: &mut BytesMut, value: u8) -> Result<(), CodecError> {
    if value > SHORT_INTEGER_MAX {
        return Err(CodecError::ValueOutOfRange {
            field: "short-integer",
            value: value as u64,
            max: SHORT_INTEGER_MAX as u64,
        });
    }
    buf.put_u8(value | 0x80);
    Ok(())
}

/// Encode a short-length (0..=30)
pub fn encode_short_length(buf: &mut BytesMut, length: usize) -> Result<(), CodecError> {
    if length > SHORT_LENGTH_MAX {
        return Err(CodecError::ValueOutOfRange {
            field: "short-length",
            value: length as u64,
            max: SHORT_LENGTH_MAX as u64,
        });
    }
    buf.put_u8(length as u8);
    Ok(())
}

/// Encode a long-integer: short-length followed by big-endian octets
///
/// Leading zero octets are dropped, so zero encodes as a bare `0x00` length.
pub fn encode_long_integer(buf: &mut BytesMut, value: u64) {
    let mut size = 0;
    let mut temp = value;
    while temp != 0 && size < LONG_INTEGER_LENGTH_MAX {
        temp >>= 8;
        size += 1;
    }

    buf.put_u8(size as u8);
    for i in (0..size).rev() {
        buf.put_u8((value >> (i * 8)) as u8);
    }
}

/// Encode a uintvar: 7-bit groups, most significant first, continuation bit set
/// on all but the last octet
pub fn encode_uintvar(buf: &mut BytesMut, value: u64) {
    let mut groups = [0u8; 10];
    let mut count = 0;
    let mut temp = value;
    loop {
        groups[count] = (temp & 0x7F) as u8;
        count += 1;
        temp >>= 7;
        if temp == 0 {
            break;
        }
    }

    for i in (0..count).rev() {
        let continuation = if i > 0 { 0x80 } else { 0x00 };
        buf.put_u8(groups[i] | continuation);
    }
}

/// Encode a value-length: short-length below 31, otherwise length-quote + uintvar
pub fn encode_value_length(buf: &mut BytesMut, length: usize) {
    if length <= SHORT_LENGTH_MAX {
        buf.put_u8(length as u8);
    } else {
        buf.put_u8(LENGTH_QUOTE);
        encode_uintvar(buf, length as u64);
    }
}

/// Encode a null-terminated text-string, quoting a leading octet >= 128
pub fn encode_text_string(buf: &mut BytesMut, text: &[u8]) {
    if text.first().is_some_and(|&b| b & 0x80 != 0) {
        buf.put_u8(TEXT_QUOTE);
    }
    buf.put_slice(text);
    buf.put_u8(0);
}

/// Encode a quoted-string (`"` + text + NUL)
pub fn encode_quoted_string(buf: &mut BytesMut, text: &[u8]) {
    buf.put_u8(QUOTED_STRING_QUOTE);
    buf.put_slice(text);
    buf.put_u8(0);
}

/// Encode `inner` into a scratch buffer and write it prefixed by its value-length
pub fn encode_with_value_length<F>(buf: &mut BytesMut, inner: F) -> Result<(), CodecError>
where
    F: FnOnce(&mut BytesMut) -> Result<(), CodecError>,
{
    let mut scratch = BytesMut::new();
    inner(&mut scratch)?;
    encode_value_length(buf, scratch.len());
    buf.put_slice(&scratch);
    Ok(())
}

/// Wrap a value in angle brackets unless it already carries them
pub fn angle_bracketed(value: &[u8]) -> Vec<u8> {
    if value.first() == Some(&b'<') && value.last() == Some(&b'>') {
        return value.to_vec();
    }
    let mut wrapped = Vec::with_capacity(value.len() + 2);
    wrapped.push(b'<');
    wrapped.extend_from_slice(value);
    wrapped.push(b'>');
    wrapped
}

/// WSP well-known content types (WAP-230 Appendix A, Table 40)
const WELL_KNOWN_CONTENT_TYPES: &[&str] = &[
    "*/*",                                        // 0x00
    "text/*",                                     // 0x01
    "text/html",                                  // 0x02
    "text/plain",                                 // 0x03
    "text/x-hdml",                                // 0x04
    "text/x-ttml",                                // 0x05
    "text/x-vCalendar",                           // 0x06
    "text/x-vCard",                               // 0x07
    "text/vnd.wap.wml",                           // 0x08
    "text/vnd.wap.wmlscript",                     // 0x09
    "text/vnd.wap.wta-event",                     // 0x0A
    "multipart/*",                                // 0x0B
    "multipart/mixed",                            // 0x0C
    "multipart/form-data",                        // 0x0D
    "multipart/byteranges",                       // 0x0E
    "multipart/alternative",                      // 0x0F
    "application/*",                              // 0x10
    "application/java-vm",                        // 0x11
    "application/x-www-form-urlencoded",          // 0x12
    "application/x-hdmlc",                        // 0x13
    "application/vnd.wap.wmlc",                   // 0x14
    "application/vnd.wap.wmlscriptc",             // 0x15
    "application/vnd.wap.wta-eventc",             // 0x16
    "application/vnd.wap.uaprof",                 // 0x17
    "application/vnd.wap.wtls-ca-certificate",    // 0x18
    "application/vnd.wap.wtls-user-certificate",  // 0x19
    "application/x-x509-ca-cert",                 // 0x1A
    "application/x-x509-user-cert",               // 0x1B
    "image/*",                                    // 0x1C
    "image/gif",                                  // 0x1D
    "image/jpeg",                                 // 0x1E
    "image/tiff",                                 // 0x1F
    "image/png",                                  // 0x20
    "image/vnd.wap.wbmp",                         // 0x21
    "application/vnd.wap.multipart.*",            // 0x22
    "application/vnd.wap.multipart.mixed",        // 0x23
    "application/vnd.wap.multipart.form-data",    // 0x24
    "application/vnd.wap.multipart.byteranges",   // 0x25
    "application/vnd.wap.multipart.alternative",  // 0x26
    "application/xml",                            // 0x27
    "text/xml",                                   // 0x28
    "application/vnd.wap.wbxml",                  // 0x29
    "application/x-x968-cross-cert",              // 0x2A
    "application/x-x968-ca-cert",                 // 0x2B
    "application/x-x968-user-cert",               // 0x2C
    "text/vnd.wap.si",                            // 0x2D
    "application/vnd.wap.sic",                    // 0x2E
    "text/vnd.wap.sl",                            // 0x2F
    "application/vnd.wap.slc",                    // 0x30
    "text/vnd.wap.co",                            // 0x31
    "application/vnd.wap.coc",                    // 0x32
    "application/vnd.wap.multipart.related",      // 0x33
    "application/vnd.wap.sia",                    // 0x34
    "text/vnd.wap.connectivity-xml",              // 0x35
    "application/vnd.wap.connectivity-wbxml",     // 0x36
];

/// Look up the well-known assigned number of a content type
pub fn well_known_content_type(content_type: &str) -> Option<u8> {
    WELL_KNOWN_CONTENT_TYPES
        .iter()
        .position(|known| *known == content_type)
        .map(|index| index as u8)
}

/// Encode a content type as a short-integer when well known, text-string otherwise
pub fn encode_content_type_value(buf: &mut BytesMut, content_type: &[u8]) -> Result<(), CodecError> {
    match std::str::from_utf8(content_type)
        .ok()
        .and_then(well_known_content_type)
    {
        Some(assigned) => encode_short_integer(buf, assigned),
        None => {
            encode_text_string(buf, content_type);
            Ok(())
        }
    }
}
