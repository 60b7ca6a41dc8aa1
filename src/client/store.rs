// ABOUTME: Degraded-mode MMS persistence: a legacy multi-row insert and a store that falls back to it
// ABOUTME: Both implement MessageStore so the router never special-cases the fallback path

use crate::client::error::{PersistenceError, PersistenceResult};
use crate::client::traits::{AddressBook, MessageStore};
use crate::client::types::{Fields, MessageBox, PersistOptions, RecordUri, Table, ThreadId};
use crate::datatypes::{Charset, MessageClass, MessageType, Priority, SendRequest, MULTIPART_RELATED};
use crate::pdu::smil::SMIL_CONTENT_TYPE;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, error, warn};

/// MMS version column value written by the legacy insert
const LEGACY_MMS_VERSION: i64 = 19;
/// Address type column value of a To address
const ADDRESS_TYPE_TO: i64 = 151;
/// Response status column value: ok
const RESPONSE_STATUS_OK: i64 = 128;

/// Writes a send-req as separate message, part and address rows.
///
/// Used when the regular `persist_send_request` of a store fails. All
/// other operations pass straight through to the wrapped store.
pub struct LegacyStore {
    inner: Arc<dyn MessageStore>,
    address_book: Arc<dyn AddressBook>,
}

impl LegacyStore {
    pub fn new(inner: Arc<dyn MessageStore>, address_book: Arc<dyn AddressBook>) -> Self {
        Self {
            inner,
            address_book,
        }
    }

    fn insert_parts(&self, message_id: i64, request: &SendRequest, millis: i64) -> PersistenceResult<()> {
        for part in request.body.parts() {
            let content_type = part.content_type_str();
            let mut fields = Fields::new();
            fields.insert("mid", message_id.into());
            fields.insert("cid", format!("<{millis}>").into());

            if content_type.starts_with("image") {
                fields.insert("ct", content_type.into());
                fields.insert("data", part.data.clone().into());
            } else if content_type.starts_with("text") {
                fields.insert("ct", "text/plain".into());
                fields.insert("text", String::from_utf8_lossy(&part.data).into_owned().into());
            } else {
                continue;
            }

            self.inner.insert_row(Table::MmsPart { message_id }, &fields)?;
        }
        Ok(())
    }

    /// Message, part and address rows, returning the message record
    fn insert_mms_rows(
        &self,
        thread_id: ThreadId,
        request: &SendRequest,
        recipients: &[String],
        options: &PersistOptions,
    ) -> PersistenceResult<RecordUri> {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64;

        let data_bytes: usize = request
            .body
            .parts()
            .iter()
            .filter(|part| part.content_type_str() != SMIL_CONTENT_TYPE)
            .map(|part| part.data.len())
            .sum();

        let subject = request
            .subject
            .as_ref()
            .map(|subject| subject.to_string_lossy())
            .unwrap_or_default();

        let mut mms = Fields::new();
        mms.insert("thread_id", thread_id.0.into());
        mms.insert("date", (millis / 1000).into());
        mms.insert("msg_box", options.message_box.as_i64().into());
        mms.insert("read", true.into());
        mms.insert("sub", subject.into());
        mms.insert("sub_cs", (Charset::Utf8.mib_enum() as i64).into());
        mms.insert("ct_t", MULTIPART_RELATED.into());
        mms.insert("exp", (data_bytes as i64).into());
        mms.insert("m_cls", MessageClass::Personal.as_str().into());
        mms.insert("m_type", (MessageType::SendReq as i64).into());
        mms.insert("v", LEGACY_MMS_VERSION.into());
        mms.insert("pri", (Priority::Normal as i64).into());
        mms.insert("tr_id", format!("T{millis:x}").into());
        mms.insert("resp_st", RESPONSE_STATUS_OK.into());
        if let Some(subscription_id) = options.subscription_id {
            mms.insert("sub_id", (subscription_id as i64).into());
        }

        let message_uri = self.inner.insert_row(Table::Mms, &mms)?;
        let message_id = message_uri
            .id()
            .ok_or_else(|| PersistenceError::InvalidRecord(message_uri.to_string()))?;

        self.insert_parts(message_id, request, millis)?;

        for address in recipients {
            let mut fields = Fields::new();
            fields.insert("address", address.as_str().into());
            fields.insert("charset", Charset::Utf8.mib_enum().to_string().into());
            fields.insert("type", ADDRESS_TYPE_TO.into());
            self.inner.insert_row(Table::MmsAddress { message_id }, &fields)?;
        }

        Ok(message_uri)
    }
}

impl MessageStore for LegacyStore {
    fn insert_message(
        &self,
        thread_id: ThreadId,
        address: &str,
        body: &str,
        fields: &Fields,
    ) -> PersistenceResult<RecordUri> {
        self.inner.insert_message(thread_id, address, body, fields)
    }

    fn query_thread_id(&self, uri: &RecordUri) -> PersistenceResult<ThreadId> {
        self.inner.query_thread_id(uri)
    }

    fn update_box_state(&self, uri: &RecordUri, message_box: MessageBox) -> PersistenceResult<usize> {
        self.inner.update_box_state(uri, message_box)
    }

    fn persist_send_request(
        &self,
        request: &SendRequest,
        recipients: &[String],
        options: &PersistOptions,
    ) -> PersistenceResult<RecordUri> {
        let addresses: BTreeSet<String> = recipients.iter().cloned().collect();
        let thread_id = self.address_book.get_or_create_thread_id(&addresses)?;

        // A placeholder SMS keeps the thread alive while the MMS rows are written
        let mut dummy = Fields::new();
        dummy.insert("thread_id", thread_id.0.into());
        dummy.insert("body", " ".into());
        let dummy_uri = self.inner.insert_row(Table::SentSms, &dummy)?;

        let result = self.insert_mms_rows(thread_id, request, recipients, options);
        match &result {
            Ok(message_uri) => {
                self.inner.delete_row(&dummy_uri)?;
                debug!(uri = %message_uri, "Persisted MMS with legacy insert");
            }
            Err(_) => {
                // Best effort, the insert error is the one reported
                if let Err(delete_error) = self.inner.delete_row(&dummy_uri) {
                    warn!(uri = %dummy_uri, error = %delete_error, "Could not remove placeholder SMS");
                }
            }
        }
        result
    }

    fn insert_row(&self, table: Table, fields: &Fields) -> PersistenceResult<RecordUri> {
        self.inner.insert_row(table, fields)
    }

    fn delete_row(&self, uri: &RecordUri) -> PersistenceResult<()> {
        self.inner.delete_row(uri)
    }
}

/// A store whose send-req persistence falls back to a second store on failure
pub struct FallbackStore {
    primary: Arc<dyn MessageStore>,
    fallback: Arc<dyn MessageStore>,
}

impl FallbackStore {
    pub fn new(primary: Arc<dyn MessageStore>, fallback: Arc<dyn MessageStore>) -> Self {
        Self { primary, fallback }
    }

    /// Fall back to the legacy multi-row insert on top of `primary`
    pub fn with_legacy(primary: Arc<dyn MessageStore>, address_book: Arc<dyn AddressBook>) -> Self {
        let fallback = Arc::new(LegacyStore::new(primary.clone(), address_book));
        Self::new(primary, fallback)
    }
}

impl MessageStore for FallbackStore {
    fn insert_message(
        &self,
        thread_id: ThreadId,
        address: &str,
        body: &str,
        fields: &Fields,
    ) -> PersistenceResult<RecordUri> {
        self.primary.insert_message(thread_id, address, body, fields)
    }

    fn query_thread_id(&self, uri: &RecordUri) -> PersistenceResult<ThreadId> {
        self.primary.query_thread_id(uri)
    }

    fn update_box_state(&self, uri: &RecordUri, message_box: MessageBox) -> PersistenceResult<usize> {
        self.primary.update_box_state(uri, message_box)
    }

    fn persist_send_request(
        &self,
        request: &SendRequest,
        recipients: &[String],
        options: &PersistOptions,
    ) -> PersistenceResult<RecordUri> {
        match self.primary.persist_send_request(request, recipients, options) {
            Ok(uri) => Ok(uri),
            Err(primary_error) => {
                warn!(error = %primary_error, "Error saving MMS, falling back to legacy insert");
                self.fallback
                    .persist_send_request(request, recipients, options)
                    .inspect_err(|error| error!(error = %error, "Legacy MMS insert failed"))
            }
        }
    }

    fn insert_row(&self, table: Table, fields: &Fields) -> PersistenceResult<RecordUri> {
        self.primary.insert_row(table, fields)
    }

    fn delete_row(&self, uri: &RecordUri) -> PersistenceResult<()> {
        self.primary.delete_row(uri)
    }
}
