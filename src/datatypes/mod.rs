mod address;
mod charset;
mod encoded_string;
mod header_field;
mod message_class;
mod part;
mod priority;
mod send_req;

pub use address::{AddressError, AddressType, EncodedAddress, FromAddress, GROUP_ADDRESS_SEPARATOR};
pub use charset::Charset;
pub use encoded_string::{EncodedString, ADDRESS_LIST_SEPARATOR};
pub use header_field::{ExpiryToken, FromToken, HeaderField, MessageType, MmsVersion};
pub use message_class::MessageClass;
pub use part::{PartParameter, PduBody, PduPart};
pub use priority::{Priority, ReportRequest};
pub use send_req::{generate_transaction_id, SendRequest, DEFAULT_EXPIRY_SECONDS, MULTIPART_RELATED};
