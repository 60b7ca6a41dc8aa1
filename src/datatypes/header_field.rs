// ABOUTME: Defines MMS Encapsulation 1.2 header field codes and message type values
// ABOUTME: Field codes are the well-known assigned numbers with the high bit set, as written on the wire

use num_enum::TryFromPrimitive;

/// MMS header field names (OMA-MMS-ENC Section 7.4, Table 12)
///
/// Each discriminant is the encoded field octet, i.e. the assigned number
/// ORed with `0x80`.
#[derive(TryFromPrimitive)]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum HeaderField {
    Bcc = 0x81,
    Cc = 0x82,
    ContentLocation = 0x83,
    ContentType = 0x84,
    Date = 0x85,
    DeliveryReport = 0x86,
    DeliveryTime = 0x87,
    Expiry = 0x88,
    From = 0x89,
    MessageClass = 0x8A,
    MessageId = 0x8B,
    MessageType = 0x8C,
    MmsVersion = 0x8D,
    MessageSize = 0x8E,
    Priority = 0x8F,
    ReadReport = 0x90,
    ReportAllowed = 0x91,
    ResponseStatus = 0x92,
    ResponseText = 0x93,
    SenderVisibility = 0x94,
    Status = 0x95,
    Subject = 0x96,
    To = 0x97,
    TransactionId = 0x98,
}

/// X-Mms-Message-Type values
#[derive(TryFromPrimitive)]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MessageType {
    SendReq = 0x80,
    SendConf = 0x81,
    NotificationInd = 0x82,
    NotifyRespInd = 0x83,
    RetrieveConf = 0x84,
    AcknowledgeInd = 0x85,
    DeliveryInd = 0x86,
}

/// X-Mms-MMS-Version, encoded as a short-integer `major << 4 | minor`
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MmsVersion {
    pub major: u8,
    pub minor: u8,
}

impl MmsVersion {
    pub const V1_0: MmsVersion = MmsVersion { major: 1, minor: 0 };
    pub const V1_1: MmsVersion = MmsVersion { major: 1, minor: 1 };
    pub const V1_2: MmsVersion = MmsVersion { major: 1, minor: 2 };

    /// The version this crate composes
    pub const CURRENT: MmsVersion = MmsVersion::V1_2;

    /// Value carried in the short-integer (without the high bit)
    pub fn to_value(&self) -> u8 {
        ((self.major & 0x07) << 4) | (self.minor & 0x0F)
    }
}

impl Default for MmsVersion {
    fn default() -> Self {
        MmsVersion::CURRENT
    }
}

/// Tokens that open the From header value
#[derive(TryFromPrimitive)]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FromToken {
    /// An address follows
    AddressPresent = 0x80,
    /// The MMS proxy-relay inserts the sender's address
    InsertAddress = 0x81,
}

/// Tokens that open the X-Mms-Expiry header value
#[derive(TryFromPrimitive)]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExpiryToken {
    Absolute = 0x80,
    Relative = 0x81,
}
