// ABOUTME: Strongly-typed MMS recipient and sender addresses with address-type classification
// ABOUTME: Appends the /TYPE= suffix the MMS proxy-relay expects for phone numbers and IP addresses

use crate::codec::{CodecError, Encodable};
use crate::datatypes::{EncodedString, FromToken};
use bytes::{BufMut, BytesMut};
use std::fmt;

/// Reserved separator used to merge several recipients into one thread address.
///
/// It must never be accepted as part of a single address.
pub const GROUP_ADDRESS_SEPARATOR: char = '|';

/// Address types understood by the MMS proxy-relay (OMA-MMS-ENC Section 8)
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AddressType {
    /// Phone number, sent as `<number>/TYPE=PLMN`
    Phone,
    /// RFC 822 e-mail address, sent verbatim
    Email,
    /// Dotted IPv4 address, sent as `<addr>/TYPE=IPV4`
    Ipv4,
    /// Colon separated IPv6 address, sent as `<addr>/TYPE=IPV6`
    Ipv6,
}

impl AddressType {
    /// Suffix appended to the address on the wire
    pub fn suffix(&self) -> &'static str {
        match self {
            AddressType::Phone => "/TYPE=PLMN",
            AddressType::Email => "",
            AddressType::Ipv4 => "/TYPE=IPV4",
            AddressType::Ipv6 => "/TYPE=IPV6",
        }
    }

    /// Classify an address string, `None` when it matches no known shape
    pub fn classify(address: &str) -> Option<AddressType> {
        if is_ipv4(address) {
            Some(AddressType::Ipv4)
        } else if is_phone_number(address) {
            Some(AddressType::Phone)
        } else if is_ipv6(address) {
            Some(AddressType::Ipv6)
        } else if is_email(address) {
            Some(AddressType::Email)
        } else {
            None
        }
    }
}

/// An address ready to be written into a To/Cc/Bcc/From header
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EncodedAddress {
    address_type: AddressType,
    value: EncodedString,
}

impl EncodedAddress {
    /// Encode a recipient string.
    ///
    /// The string may hold several `;` separated addresses; only the first
    /// one is used.
    pub fn parse(recipient: &str) -> Result<Self, AddressError> {
        let first = EncodedString::extract(recipient)
            .into_iter()
            .next()
            .ok_or(AddressError::Empty)?;
        Self::from_encoded(&first)
    }

    /// Classify an already extracted value and append its type suffix
    pub fn from_encoded(value: &EncodedString) -> Result<Self, AddressError> {
        let raw = value.to_string_lossy();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AddressError::Empty);
        }

        if trimmed.contains(GROUP_ADDRESS_SEPARATOR) {
            return Err(AddressError::InvalidFormat {
                address: trimmed.to_string(),
                reason: format!("contains reserved separator '{GROUP_ADDRESS_SEPARATOR}'"),
            });
        }

        let normalized = normalize_phone_number(trimmed);
        let (address_type, text) = match AddressType::classify(&normalized) {
            Some(AddressType::Phone) => (AddressType::Phone, normalized),
            _ => match AddressType::classify(trimmed) {
                Some(address_type) => (address_type, trimmed.to_string()),
                None => return Err(AddressError::Unrecognized(trimmed.to_string())),
            },
        };

        let value = EncodedString::with_charset(value.charset(), text.into_bytes())
            .with_suffix(address_type.suffix());

        Ok(Self {
            address_type,
            value,
        })
    }

    pub fn address_type(&self) -> AddressType {
        self.address_type
    }

    /// The encoded value including its type suffix
    pub fn value(&self) -> &EncodedString {
        &self.value
    }
}

impl Encodable for EncodedAddress {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        self.value.encode(buf)
    }
}

/// Value of the From header
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum FromAddress {
    /// Sender address known to the client
    Present(EncodedAddress),
    /// Let the proxy-relay fill in the sender
    #[default]
    InsertToken,
}

impl Encodable for FromAddress {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        match self {
            FromAddress::Present(address) => {
                crate::codec::encode_with_value_length(buf, |inner| {
                    inner.put_u8(FromToken::AddressPresent as u8);
                    address.encode(inner)
                })
            }
            FromAddress::InsertToken => {
                buf.put_u8(1);
                buf.put_u8(FromToken::InsertAddress as u8);
                Ok(())
            }
        }
    }
}

/// Visual separators dropped from phone numbers before classification
fn normalize_phone_number(address: &str) -> String {
    address
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '(' && *c != ')')
        .collect()
}

fn is_phone_number(address: &str) -> bool {
    let digits = address.strip_prefix('+').unwrap_or(address);
    !digits.is_empty()
        && digits.chars().any(|c| c.is_ascii_digit())
        && digits
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.' || c == '-')
}

fn is_ipv4(address: &str) -> bool {
    let octets: Vec<&str> = address.split('.').collect();
    octets.len() == 4
        && octets.iter().all(|octet| {
            (1..=3).contains(&octet.len())
                && octet.chars().all(|c| c.is_ascii_digit())
                && octet.parse::<u16>().is_ok_and(|value| value <= 255)
        })
}

fn is_ipv6(address: &str) -> bool {
    let groups: Vec<&str> = address.split(':').collect();
    groups.len() == 8
        && groups
            .iter()
            .all(|group| (1..=4).contains(&group.len()) && group.chars().all(|c| c.is_ascii_hexdigit()))
}

fn is_email(address: &str) -> bool {
    // Accept an optional display name: `Name <user@host.tld>`
    let mailbox = match (address.find('<'), address.rfind('>')) {
        (Some(open), Some(close)) if open < close && close == address.len() - 1 => {
            &address[open + 1..close]
        }
        (None, None) => address,
        _ => return false,
    };

    let Some((local, domain)) = mailbox.split_once('@') else {
        return false;
    };

    let local_ok = !local.is_empty()
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c));
    let domain_ok = domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && domain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');

    local_ok && domain_ok
}

/// Errors that can occur when encoding a single address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// Nothing left after splitting and trimming
    Empty,
    /// The address has a recognizable shape but illegal content
    InvalidFormat { address: String, reason: String },
    /// Not a phone number, e-mail, IPv4 or IPv6 address
    Unrecognized(String),
}

impl fmt::Display for AddressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressError::Empty => write!(f, "Address is empty"),
            AddressError::InvalidFormat { address, reason } => {
                write!(f, "Invalid address '{address}': {reason}")
            }
            AddressError::Unrecognized(address) => {
                write!(f, "Unrecognized address type: '{address}'")
            }
        }
    }
}

impl std::error::Error for AddressError {}
