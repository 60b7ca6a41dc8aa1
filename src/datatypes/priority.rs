// ABOUTME: Defines the X-Mms-Priority header values per OMA MMS Encapsulation 1.2
// ABOUTME: Send requests composed by this crate always use Normal

use num_enum::TryFromPrimitive;

/// X-Mms-Priority
///
/// Receiving clients may use the priority to order or highlight messages.
/// Networks are free to ignore it.
#[derive(TryFromPrimitive)]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Priority {
    Low = 0x80,
    #[default]
    Normal = 0x81,
    High = 0x82,
}

/// Yes/No octets shared by X-Mms-Delivery-Report and X-Mms-Read-Report
#[derive(TryFromPrimitive)]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum ReportRequest {
    Yes = 0x80,
    #[default]
    No = 0x81,
}

impl From<bool> for ReportRequest {
    fn from(requested: bool) -> Self {
        if requested {
            ReportRequest::Yes
        } else {
            ReportRequest::No
        }
    }
}
