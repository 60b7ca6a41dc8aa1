// ABOUTME: IANA character set identifiers (MIBenum) used in MMS encoded-string values and part headers
// ABOUTME: Encodes as a WSP integer-value: short-integer below 128, long-integer above

use crate::codec::{encode_long_integer, encode_short_integer, CodecError, SHORT_INTEGER_MAX};
use bytes::BytesMut;
use num_enum::TryFromPrimitive;

/// Character sets an MMS client is expected to understand
#[derive(TryFromPrimitive)]
#[repr(u16)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum Charset {
    UsAscii = 3,
    Iso8859_1 = 4,
    ShiftJis = 17,
    #[default]
    Utf8 = 106,
    Ucs2 = 1000,
    Utf16 = 1015,
    Big5 = 2026,
}

impl Charset {
    /// MIBenum value of the charset
    pub fn mib_enum(&self) -> u16 {
        *self as u16
    }

    /// Encode as a WSP integer-value
    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let value = self.mib_enum();
        if value <= SHORT_INTEGER_MAX as u16 {
            encode_short_integer(buf, value as u8)
        } else {
            encode_long_integer(buf, value as u64);
            Ok(())
        }
    }
}
