// ABOUTME: TransactionRouter decides SMS versus MMS and fans a message out to its recipients
// ABOUTME: SMS bodies go through the segmenter, MMS bodies through the PDU builder and a send strategy

use crate::client::error::{SendError, SendResult};
use crate::client::mms::{DirectSender, MmsRequest, SystemSender};
use crate::client::settings::{MmsStrategy, Settings};
use crate::client::store::FallbackStore;
use crate::client::traits::{AddressBook, MessageStore, MmsNetwork, Notifier, Transport};
use crate::client::types::{Attachment, CompletionToken, Fields, MessageBox, OutgoingMessage, RecordUri, ThreadId};
use crate::datatypes::GROUP_ADDRESS_SEPARATOR;
use crate::pdu::{MessagePart, PduBuilder};
use crate::segment::{plan_split, split, unsplit};
use crate::text::strip_accents;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, error, info, warn};

/// Routes outgoing messages to the SMS or MMS path
///
/// # Example
///
/// ```rust,ignore
/// let router = TransactionRouter::new(transport, network, store, address_book, notifier);
/// let message = OutgoingMessage::builder()
///     .text("Running late, see you at 8")
///     .to("+15550101")
///     .build()?;
/// router.dispatch(&message, &Settings::default()).await?;
/// ```
pub struct TransactionRouter<T: Transport, M: MmsNetwork> {
    transport: T,
    network: M,
    store: FallbackStore,
    address_book: Arc<dyn AddressBook>,
    notifier: Arc<dyn Notifier>,
    builder: PduBuilder,
}

impl<T: Transport, M: MmsNetwork> TransactionRouter<T, M> {
    /// Create a router. MMS persistence falls back to the legacy
    /// multi-row insert on `store` when the regular write fails.
    pub fn new(
        transport: T,
        network: M,
        store: Arc<dyn MessageStore>,
        address_book: Arc<dyn AddressBook>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            transport,
            network,
            store: FallbackStore::with_legacy(store, address_book.clone()),
            address_book,
            notifier,
            builder: PduBuilder::new(),
        }
    }

    /// Use a specific PDU builder, e.g. one with a fixed clock
    pub fn with_builder(mut self, builder: PduBuilder) -> Self {
        self.builder = builder;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn network(&self) -> &M {
        &self.network
    }

    /// Whether `message` must go out as MMS
    pub fn should_send_as_mms(&self, message: &OutgoingMessage, settings: &Settings) -> bool {
        let group = message.group.unwrap_or(settings.group);

        message.has_media()
            || message.subject.is_some()
            || (message.addresses.len() > 1 && group)
            || (settings.send_long_as_mms
                && self.transport.estimate_segment_capacity(&message.text).segment_count
                    > settings.send_long_as_mms_after)
    }

    /// Send `message` to all of its recipients.
    ///
    /// Returns the first fatal error. Per-recipient address failures and
    /// store failures are logged and do not stop the send.
    pub async fn dispatch(&self, message: &OutgoingMessage, settings: &Settings) -> SendResult<()> {
        validate(message)?;

        if self.should_send_as_mms(message, settings) {
            self.dispatch_mms(message, settings).await
        } else {
            self.dispatch_sms(message, settings).await
        }
    }

    async fn dispatch_sms(&self, message: &OutgoingMessage, settings: &Settings) -> SendResult<()> {
        let mut text = message.text.clone();
        if !settings.signature.is_empty() {
            text.push('\n');
            text.push_str(&settings.signature);
        }

        debug!(recipients = message.addresses.len(), "Routing message as SMS");

        if message.addresses.len() > 1 {
            // Ties the group conversation to one thread before the individual sends
            let merged = message.addresses.join(GROUP_ADDRESS_SEPARATOR.to_string().as_str());
            let thread_id = self.thread_for(message.addresses.iter().cloned().collect());
            self.send_sms(&text, &merged, thread_id, message.save, settings).await?;
        }

        for address in &message.addresses {
            let thread_id = self.thread_for(BTreeSet::from([address.clone()]));
            self.send_sms(&text, address, thread_id, message.save, settings).await?;
        }

        Ok(())
    }

    async fn send_sms(
        &self,
        text: &str,
        address: &str,
        thread_id: ThreadId,
        save: bool,
        settings: &Settings,
    ) -> SendResult<()> {
        let mut body = if settings.strip_unicode {
            strip_accents(text)
        } else {
            text.to_string()
        };

        let (message_id, message_uri) = if save {
            self.save_sms(&body, address, thread_id, settings)
        } else {
            (0, None)
        };

        if !settings.pre_text.is_empty() {
            body = format!("{} {}", settings.pre_text, body);
        }

        let plan = if settings.split {
            let capacity = self.transport.estimate_segment_capacity(&body);
            plan_split(&body, &capacity, settings.split_counter)
        } else {
            unsplit(&body)
        };

        for chunk in split(&body, plan) {
            let units = self.transport.divide_message(&chunk);
            let sent_tokens = units
                .iter()
                .map(|_| save.then(|| CompletionToken::sms_sent(message_id, message_uri.clone())))
                .collect();
            let delivery_tokens = units
                .iter()
                .map(|_| {
                    (save && settings.delivery_reports)
                        .then(|| CompletionToken::sms_delivered(message_id, message_uri.clone()))
                })
                .collect();

            debug!(address, units = units.len(), "Sending SMS chunk");
            self.transport
                .send_text_units(address, units, sent_tokens, delivery_tokens)
                .await
                .inspect_err(|e| error!(address, error = %e, "Error sending SMS"))?;
        }

        Ok(())
    }

    /// Insert the outbox row for one SMS, returning its id and URI
    fn save_sms(
        &self,
        body: &str,
        address: &str,
        thread_id: ThreadId,
        settings: &Settings,
    ) -> (i64, Option<RecordUri>) {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64;

        let mut fields = Fields::new();
        fields.insert("date", millis.into());
        fields.insert("read", 1i64.into());
        fields.insert("type", MessageBox::Outbox.as_i64().into());
        if let Some(subscription_id) = settings.subscription_id {
            fields.insert("sub_id", (subscription_id as i64).into());
        }

        match self.store.insert_message(thread_id, address, body, &fields) {
            Ok(uri) => {
                debug!(uri = %uri, thread_id = thread_id.0, "Saved SMS");
                (uri.id().unwrap_or(0), Some(uri))
            }
            Err(e) => {
                warn!(address, error = %e, "Error saving SMS, sending anyway");
                (0, None)
            }
        }
    }

    fn thread_for(&self, addresses: BTreeSet<String>) -> ThreadId {
        self.address_book
            .get_or_create_thread_id(&addresses)
            .unwrap_or_else(|e| {
                warn!(error = %e, "Could not resolve conversation thread");
                ThreadId::NONE
            })
    }

    async fn dispatch_mms(&self, message: &OutgoingMessage, settings: &Settings) -> SendResult<()> {
        let parts = assemble_parts(message);
        let from = message
            .from
            .clone()
            .or_else(|| self.transport.line_number(settings.subscription_id));
        let group = message.group.unwrap_or(settings.group);

        info!(
            recipients = message.addresses.len(),
            parts = parts.len(),
            group,
            strategy = ?settings.mms_strategy,
            "Routing message as MMS"
        );

        if group {
            self.send_mms(message, &message.addresses, from.as_deref(), &parts, group, settings)
                .await
        } else {
            for address in &message.addresses {
                self.send_mms(
                    message,
                    std::slice::from_ref(address),
                    from.as_deref(),
                    &parts,
                    group,
                    settings,
                )
                .await?;
            }
            Ok(())
        }
    }

    async fn send_mms(
        &self,
        message: &OutgoingMessage,
        recipients: &[String],
        from: Option<&str>,
        parts: &[MessagePart],
        group: bool,
        settings: &Settings,
    ) -> SendResult<()> {
        let composed = self
            .builder
            .compose(from, recipients, parts, message.subject.as_deref())
            .inspect_err(|e| error!(error = %e, "Error composing MMS"))?;

        let request = MmsRequest {
            composed: &composed,
            recipients,
            save: message.save,
            group,
            existing_message_uri: message.existing_message_uri.as_ref(),
        };

        match settings.mms_strategy {
            MmsStrategy::Direct => {
                DirectSender::new(&self.network, &self.store, self.notifier.as_ref(), settings)
                    .send(&request)
                    .await
            }
            MmsStrategy::System => {
                SystemSender::new(&self.transport, &self.store, self.notifier.as_ref(), settings)
                    .send(&request)
                    .await
            }
        }
    }
}

fn validate(message: &OutgoingMessage) -> SendResult<()> {
    if message.addresses.is_empty() {
        return Err(SendError::InvalidMessage("no recipients".to_string()));
    }

    for address in &message.addresses {
        if address.trim().is_empty() {
            return Err(SendError::InvalidMessage("empty recipient address".to_string()));
        }
        if address.contains(GROUP_ADDRESS_SEPARATOR) {
            return Err(SendError::InvalidMessage(format!(
                "recipient '{address}' contains the reserved '{GROUP_ADDRESS_SEPARATOR}' separator"
            )));
        }
    }
    Ok(())
}

/// Images first, then other media, then the text
fn assemble_parts(message: &OutgoingMessage) -> Vec<MessagePart> {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();

    let images = message.attachments.iter().enumerate().map(|(index, image)| {
        let name = image
            .name
            .clone()
            .unwrap_or_else(|| format!("image_{millis}_{index}"));
        to_message_part(image, name)
    });

    let extras = message.extra_parts.iter().map(|part| {
        let name = part.name.clone().unwrap_or_else(|| {
            part.mime_type
                .split('/')
                .next()
                .unwrap_or_default()
                .to_string()
        });
        to_message_part(part, name)
    });

    let mut parts: Vec<MessagePart> = images.chain(extras).collect();
    if !message.text.is_empty() {
        parts.push(MessagePart::new("text", "text/plain", message.text.clone().into_bytes()));
    }
    parts
}

fn to_message_part(attachment: &Attachment, name: String) -> MessagePart {
    let part = MessagePart::new(name, attachment.mime_type.clone(), attachment.data.clone());
    match &attachment.filename {
        Some(filename) => part.with_filename(filename.clone()),
        None => part,
    }
}
