// MMS PDU assembly
//
// `PduBuilder` turns recipients and media parts into an encoded m-send-req.
// The SMIL presentation document it prepends lives in `smil`.

mod builder;
pub mod smil;

pub use builder::{ComposedMessage, EncodingError, MessagePart, PduBuilder};
pub use smil::SmilDocument;
