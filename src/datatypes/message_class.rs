// ABOUTME: Defines the X-Mms-Message-Class header values per OMA MMS Encapsulation 1.2
// ABOUTME: Maps the class tokens to their text names used by the message store

use num_enum::TryFromPrimitive;

/// X-Mms-Message-Class
#[derive(TryFromPrimitive)]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum MessageClass {
    /// Originated by a person
    #[default]
    Personal = 0x80,
    Advertisement = 0x81,
    Informational = 0x82,
    Auto = 0x83,
}

impl MessageClass {
    /// Text form of the class, as stored in `m_cls` columns
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageClass::Personal => "personal",
            MessageClass::Advertisement => "advertisement",
            MessageClass::Informational => "informational",
            MessageClass::Auto => "auto",
        }
    }
}
