// ABOUTME: MMS send strategies: direct POST over a leased MMS network, or staging for the system service
// ABOUTME: Both consume the same composed PDU so their wire output is identical

use crate::client::error::{MmsErrorKind, SendResult, TransportError};
use crate::client::settings::Settings;
use crate::client::traits::{MessageStore, MmsNetwork, Notifier, Transport};
use crate::client::types::{CompletionToken, MessageBox, PersistOptions, RecordUri, StagedPdu};
use crate::pdu::ComposedMessage;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Token id used when the thread of a direct MMS cannot be resolved
pub const DEFAULT_MMS_TOKEN: i64 = 4444;

/// Scoped hold on the MMS network; released when dropped
pub struct NetworkLease<'a, M: MmsNetwork> {
    network: &'a M,
}

impl<'a, M: MmsNetwork> NetworkLease<'a, M> {
    /// Acquire the network for one request
    pub async fn acquire(network: &'a M) -> Result<Self, TransportError> {
        network.acquire().await?;
        debug!("Acquired MMS network");
        Ok(Self { network })
    }
}

impl<M: MmsNetwork> Drop for NetworkLease<'_, M> {
    fn drop(&mut self) {
        self.network.release();
        debug!("Released MMS network");
    }
}

/// One composed MMS and how to file it
#[derive(Debug, Clone, Copy)]
pub struct MmsRequest<'a> {
    pub composed: &'a ComposedMessage,
    pub recipients: &'a [String],
    pub save: bool,
    pub group: bool,
    pub existing_message_uri: Option<&'a RecordUri>,
}

/// Persist to the outbox, logging instead of failing
fn persist_to_outbox(
    store: &dyn MessageStore,
    request: &MmsRequest<'_>,
    settings: &Settings,
) -> Option<RecordUri> {
    let options = PersistOptions {
        message_box: MessageBox::Outbox,
        group: request.group,
        subscription_id: settings.subscription_id,
    };

    match store.persist_send_request(&request.composed.request, request.recipients, &options) {
        Ok(uri) => Some(uri),
        Err(e) => {
            error!(error = %e, "Error saving MMS, sending without a stored record");
            None
        }
    }
}

/// Sends the PDU over an MMS network leased for the request
pub struct DirectSender<'a, M: MmsNetwork> {
    network: &'a M,
    store: &'a dyn MessageStore,
    notifier: &'a dyn Notifier,
    settings: &'a Settings,
}

impl<'a, M: MmsNetwork> DirectSender<'a, M> {
    pub fn new(
        network: &'a M,
        store: &'a dyn MessageStore,
        notifier: &'a dyn Notifier,
        settings: &'a Settings,
    ) -> Self {
        Self {
            network,
            store,
            notifier,
            settings,
        }
    }

    pub async fn send(&self, request: &MmsRequest<'_>) -> SendResult<()> {
        let location = if request.save {
            persist_to_outbox(self.store, request, self.settings)
        } else {
            None
        };

        let token_id = location
            .as_ref()
            .and_then(|uri| match self.store.query_thread_id(uri) {
                Ok(thread_id) => Some(thread_id.0),
                Err(e) => {
                    warn!(uri = %uri, error = %e, "Could not read thread of stored MMS");
                    None
                }
            })
            .unwrap_or(DEFAULT_MMS_TOKEN);
        let token = CompletionToken::mms_sent(token_id, location.clone(), None);

        let result = self.execute(request, location.as_ref()).await;
        match result {
            Ok(()) => {
                info!(recipients = request.recipients.len(), bytes = request.composed.bytes.len(), "MMS sent");
                self.notifier.on_sent(&token);
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Error sending MMS");
                self.notifier.on_error(MmsErrorKind::from(&e), &token);
                Err(e.into())
            }
        }
    }

    async fn execute(&self, request: &MmsRequest<'_>, location: Option<&RecordUri>) -> Result<(), TransportError> {
        let _lease = NetworkLease::acquire(self.network).await?;

        let pdu = request.composed.bytes.clone();
        tokio::time::timeout(self.settings.mms_timeout, self.network.execute(pdu, location))
            .await
            .map_err(|_| TransportError::Timeout)?
    }
}

/// Stages the PDU in a file and hands it to the system MMS service
pub struct SystemSender<'a, T: Transport> {
    transport: &'a T,
    store: &'a dyn MessageStore,
    notifier: &'a dyn Notifier,
    settings: &'a Settings,
}

impl<'a, T: Transport> SystemSender<'a, T> {
    pub fn new(
        transport: &'a T,
        store: &'a dyn MessageStore,
        notifier: &'a dyn Notifier,
        settings: &'a Settings,
    ) -> Self {
        Self {
            transport,
            store,
            notifier,
            settings,
        }
    }

    /// Returns once the service accepted the request; the outcome arrives
    /// later through the notifier.
    pub async fn send(&self, request: &MmsRequest<'_>) -> SendResult<()> {
        let location = if request.save {
            persist_to_outbox(self.store, request, self.settings)
        } else {
            self.mark_for_resend(request.existing_message_uri)
        };

        let file_name = format!("send.{}.dat", Uuid::new_v4());
        let path = self.settings.staging_dir.join(&file_name);
        let token = CompletionToken::mms_sent(0, location, Some(path.clone()));

        if let Err(e) = tokio::fs::write(&path, &request.composed.bytes).await {
            error!(path = %path.display(), error = %e, "Error writing MMS send file");
            self.notifier.on_error(MmsErrorKind::Io, &token);
            return Ok(());
        }

        let staged = StagedPdu {
            path,
            content_uri: format!("content://{}/{}", self.settings.file_provider_authority, file_name),
        };
        let overrides = self.settings.config_overrides(request.group);

        debug!(uri = %staged.content_uri, "Handing staged MMS to the system service");
        if let Err(e) = self.transport.send_multimedia(&staged, &overrides, token).await {
            error!(error = %e, "Error using system sending method");
            // No completion will arrive to clean up the staged file
            if let Err(remove_error) = tokio::fs::remove_file(&staged.path).await {
                warn!(path = %staged.path.display(), error = %remove_error, "Could not remove staged MMS file");
            }
            return Err(e.into());
        }
        Ok(())
    }

    /// Move a previously stored message back to the outbox
    fn mark_for_resend(&self, existing: Option<&RecordUri>) -> Option<RecordUri> {
        let Some(uri) = existing else {
            warn!("Resending an unsaved MMS without a stored record");
            return None;
        };

        match self.store.update_box_state(uri, MessageBox::Outbox) {
            Ok(rows) => debug!(uri = %uri, rows, "Moved MMS back to outbox"),
            Err(e) => warn!(uri = %uri, error = %e, "Could not move MMS back to outbox"),
        }
        Some(uri.clone())
    }
}
