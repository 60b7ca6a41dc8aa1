//! Integration tests for message routing, persistence and MMS delivery

use crate::client::*;
use crate::datatypes::{FromAddress, SendRequest};
use crate::segment::SegmentCapacity;
use bytes::Bytes;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[cfg(test)]
mod integration_tests {
    use super::*;

    const GSM_SINGLE: usize = 160;
    const GSM_CONCATENATED: usize = 153;

    #[derive(Debug, Clone)]
    struct SmsSend {
        address: String,
        units: Vec<String>,
        sent_tokens: Vec<Option<CompletionToken>>,
        delivery_tokens: Vec<Option<CompletionToken>>,
    }

    /// GSM-7 sized transport that records every send
    #[derive(Default)]
    struct MockTransport {
        sms: Mutex<Vec<SmsSend>>,
        multimedia: Mutex<Vec<(StagedPdu, ConfigOverrides, CompletionToken)>>,
        reject_sms: bool,
        reject_multimedia: bool,
    }

    impl MockTransport {
        fn rejecting() -> Self {
            Self {
                reject_sms: true,
                ..Default::default()
            }
        }

        fn sms(&self) -> Vec<SmsSend> {
            self.sms.lock().unwrap().clone()
        }
    }

    impl Transport for MockTransport {
        fn estimate_segment_capacity(&self, text: &str) -> SegmentCapacity {
            let length = text.chars().count();
            if length <= GSM_SINGLE {
                return SegmentCapacity::new(1, length, GSM_SINGLE - length);
            }
            let segments = length.div_ceil(GSM_CONCATENATED);
            SegmentCapacity::new(segments, length, segments * GSM_CONCATENATED - length)
        }

        fn divide_message(&self, text: &str) -> Vec<String> {
            let chars: Vec<char> = text.chars().collect();
            if chars.len() <= GSM_SINGLE {
                return vec![text.to_string()];
            }
            chars
                .chunks(GSM_CONCATENATED)
                .map(|unit| unit.iter().collect())
                .collect()
        }

        async fn send_text_units(
            &self,
            address: &str,
            units: Vec<String>,
            sent_tokens: Vec<Option<CompletionToken>>,
            delivery_tokens: Vec<Option<CompletionToken>>,
        ) -> Result<(), TransportError> {
            if self.reject_sms {
                return Err(TransportError::Rejected("radio off".to_string()));
            }
            self.sms.lock().unwrap().push(SmsSend {
                address: address.to_string(),
                units,
                sent_tokens,
                delivery_tokens,
            });
            Ok(())
        }

        async fn send_multimedia(
            &self,
            pdu: &StagedPdu,
            overrides: &ConfigOverrides,
            token: CompletionToken,
        ) -> Result<(), TransportError> {
            if self.reject_multimedia {
                return Err(TransportError::Rejected("service busy".to_string()));
            }
            self.multimedia
                .lock()
                .unwrap()
                .push((pdu.clone(), overrides.clone(), token));
            Ok(())
        }

        fn line_number(&self, _subscription_id: Option<i32>) -> Option<String> {
            Some("+15550100".to_string())
        }
    }

    #[derive(Default)]
    struct MockNetwork {
        acquired: AtomicUsize,
        released: AtomicUsize,
        executed: Mutex<Vec<Bytes>>,
        reject: bool,
        delay: Option<Duration>,
    }

    impl MmsNetwork for MockNetwork {
        async fn acquire(&self) -> Result<(), TransportError> {
            self.acquired.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn release(&self) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }

        async fn execute(&self, pdu: Bytes, _location: Option<&RecordUri>) -> Result<(), TransportError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.reject {
                return Err(TransportError::Rejected("HTTP 500".to_string()));
            }
            self.executed.lock().unwrap().push(pdu);
            Ok(())
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum StoreCall {
        Message {
            thread_id: ThreadId,
            address: String,
            body: String,
            fields: Fields,
        },
        SendRequest {
            from: FromAddress,
            content_types: Vec<String>,
            recipients: Vec<String>,
            options: PersistOptions,
        },
        BoxState(RecordUri, MessageBox),
        Row(Table, Fields),
        Delete(RecordUri),
    }

    #[derive(Default)]
    struct MockStore {
        calls: Mutex<Vec<StoreCall>>,
        next_id: AtomicI64,
        fail_send_requests: bool,
        fail_address_rows: bool,
    }

    impl MockStore {
        fn failing_send_requests() -> Self {
            Self {
                fail_send_requests: true,
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<StoreCall> {
            self.calls.lock().unwrap().clone()
        }

        fn uri(&self, table: &str) -> RecordUri {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            RecordUri::new(format!("content://{table}/{id}"))
        }
    }

    impl MessageStore for MockStore {
        fn insert_message(
            &self,
            thread_id: ThreadId,
            address: &str,
            body: &str,
            fields: &Fields,
        ) -> PersistenceResult<RecordUri> {
            self.calls.lock().unwrap().push(StoreCall::Message {
                thread_id,
                address: address.to_string(),
                body: body.to_string(),
                fields: fields.clone(),
            });
            Ok(self.uri("sms"))
        }

        fn query_thread_id(&self, _uri: &RecordUri) -> PersistenceResult<ThreadId> {
            Ok(ThreadId(77))
        }

        fn update_box_state(&self, uri: &RecordUri, message_box: MessageBox) -> PersistenceResult<usize> {
            self.calls
                .lock()
                .unwrap()
                .push(StoreCall::BoxState(uri.clone(), message_box));
            Ok(1)
        }

        fn persist_send_request(
            &self,
            request: &SendRequest,
            recipients: &[String],
            options: &PersistOptions,
        ) -> PersistenceResult<RecordUri> {
            if self.fail_send_requests {
                return Err(PersistenceError::Store("provider rejected pdu".to_string()));
            }
            self.calls.lock().unwrap().push(StoreCall::SendRequest {
                from: request.from.clone(),
                content_types: request
                    .body
                    .parts()
                    .iter()
                    .map(|part| part.content_type_str().to_string())
                    .collect(),
                recipients: recipients.to_vec(),
                options: options.clone(),
            });
            Ok(self.uri("mms"))
        }

        fn insert_row(&self, table: Table, fields: &Fields) -> PersistenceResult<RecordUri> {
            if self.fail_address_rows && matches!(table, Table::MmsAddress { .. }) {
                return Err(PersistenceError::Store("address table locked".to_string()));
            }
            let uri = match table {
                Table::SentSms => self.uri("sms"),
                _ => self.uri("mms"),
            };
            self.calls.lock().unwrap().push(StoreCall::Row(table, fields.clone()));
            Ok(uri)
        }

        fn delete_row(&self, uri: &RecordUri) -> PersistenceResult<()> {
            self.calls.lock().unwrap().push(StoreCall::Delete(uri.clone()));
            Ok(())
        }
    }

    /// Thread id is the number of addresses in the conversation
    #[derive(Default)]
    struct MockAddressBook {
        lookups: Mutex<Vec<BTreeSet<String>>>,
    }

    impl AddressBook for MockAddressBook {
        fn get_or_create_thread_id(&self, addresses: &BTreeSet<String>) -> PersistenceResult<ThreadId> {
            self.lookups.lock().unwrap().push(addresses.clone());
            Ok(ThreadId(addresses.len() as i64))
        }
    }

    struct Harness {
        router: TransactionRouter<MockTransport, MockNetwork>,
        store: Arc<MockStore>,
        address_book: Arc<MockAddressBook>,
        events: tokio::sync::mpsc::UnboundedReceiver<CompletionEvent>,
    }

    fn harness_with(transport: MockTransport, network: MockNetwork, store: MockStore) -> Harness {
        let store = Arc::new(store);
        let address_book = Arc::new(MockAddressBook::default());
        let (notifier, events) = ChannelNotifier::new();
        let router = TransactionRouter::new(
            transport,
            network,
            store.clone(),
            address_book.clone(),
            Arc::new(notifier),
        );
        Harness {
            router,
            store,
            address_book,
            events,
        }
    }

    fn harness() -> Harness {
        harness_with(MockTransport::default(), MockNetwork::default(), MockStore::default())
    }

    fn to(addresses: &[&str]) -> Vec<String> {
        addresses.iter().map(|a| a.to_string()).collect()
    }

    #[tokio::test]
    async fn long_text_is_split_with_counters() {
        let h = harness();
        let message = OutgoingMessage::new("x".repeat(320), to(&["5550101"]));
        let settings = Settings::default().with_split(true, true);

        h.router.dispatch(&message, &settings).await.unwrap();

        let sends = h.router.transport().sms();
        assert_eq!(sends.len(), 3);
        for (index, send) in sends.iter().enumerate() {
            assert_eq!(send.address, "5550101");
            assert_eq!(send.units.len(), 1);
            assert!(send.units[0].starts_with(&format!("({}/3) ", index + 1)));
            assert!(send.units[0].chars().count() <= GSM_CONCATENATED);
        }

        let rebuilt: String = sends.iter().map(|s| &s.units[0][6..]).collect();
        assert_eq!(rebuilt, "x".repeat(320));
        assert!(h.router.network().executed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unsplit_long_text_is_divided_by_the_transport() {
        let h = harness();
        let message = OutgoingMessage::new("y".repeat(320), to(&["5550101"]));

        h.router.dispatch(&message, &Settings::default()).await.unwrap();

        let sends = h.router.transport().sms();
        assert_eq!(sends.len(), 1);
        assert_eq!(sends[0].units.len(), 3);
        assert_eq!(sends[0].sent_tokens.len(), 3);
        assert_eq!(sends[0].delivery_tokens.len(), 3);
    }

    #[tokio::test]
    async fn group_recipients_share_one_mms() {
        let mut h = harness();
        let message = OutgoingMessage::builder()
            .addresses(["5550101", "5550102", "5550103"])
            .attachment(Attachment::image(vec![0xFFu8, 0xD8, 0xFF]))
            .build()
            .unwrap();

        h.router.dispatch(&message, &Settings::default()).await.unwrap();

        let network = h.router.network();
        assert_eq!(network.executed.lock().unwrap().len(), 1);
        assert_eq!(network.acquired.load(Ordering::SeqCst), 1);
        assert_eq!(network.released.load(Ordering::SeqCst), 1);
        assert!(h.router.transport().sms().is_empty());

        let calls = h.store.calls();
        assert!(matches!(
            &calls[..],
            [StoreCall::SendRequest { recipients, options, .. }]
                if recipients.len() == 3 && options.group && options.message_box == MessageBox::Outbox
        ));
        match &calls[0] {
            StoreCall::SendRequest { content_types, .. } => {
                assert_eq!(content_types, &["application/smil", "image/jpeg"]);
            }
            other => panic!("unexpected store call {other:?}"),
        }

        match h.events.recv().await {
            Some(CompletionEvent::Sent(token)) => {
                assert_eq!(token.kind, TokenKind::MmsSent);
                assert_eq!(token.id, 77);
                assert!(token.message_uri.is_some());
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_group_sends_placeholder_then_each_recipient() {
        let h = harness();
        let message = OutgoingMessage::new("hi all", to(&["5550101", "5550102", "5550103"]));
        let settings = Settings::default().with_group(false);

        h.router.dispatch(&message, &settings).await.unwrap();

        let addresses: Vec<String> = h.router.transport().sms().into_iter().map(|s| s.address).collect();
        assert_eq!(
            addresses,
            vec!["5550101|5550102|5550103", "5550101", "5550102", "5550103"]
        );

        let lookups = h.address_book.lookups.lock().unwrap().clone();
        assert_eq!(lookups[0].len(), 3);
        assert!(lookups[1..].iter().all(|set| set.len() == 1));

        let threads: Vec<ThreadId> = h
            .store
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::Message { thread_id, .. } => Some(thread_id),
                _ => None,
            })
            .collect();
        assert_eq!(threads, vec![ThreadId(3), ThreadId(1), ThreadId(1), ThreadId(1)]);
    }

    #[tokio::test]
    async fn message_group_flag_overrides_settings() {
        let h = harness();
        let message = OutgoingMessage::builder()
            .text("hi")
            .addresses(["5550101", "5550102"])
            .group(false)
            .build()
            .unwrap();

        assert!(!h.router.should_send_as_mms(&message, &Settings::default()));
    }

    #[tokio::test]
    async fn empty_text_goes_as_one_sms() {
        let h = harness();
        let message = OutgoingMessage::new("", to(&["5550101"]));

        h.router.dispatch(&message, &Settings::default().with_split(true, true)).await.unwrap();

        let sends = h.router.transport().sms();
        assert_eq!(sends.len(), 1);
        assert_eq!(sends[0].units, vec![String::new()]);
    }

    #[tokio::test]
    async fn unencodable_recipient_is_skipped() {
        let mut h = harness();
        let message = OutgoingMessage::builder()
            .text("photo")
            .addresses(["5550101", "not an address!"])
            .attachment(Attachment::image(vec![0xFFu8, 0xD8]))
            .build()
            .unwrap();

        h.router.dispatch(&message, &Settings::default()).await.unwrap();

        let pdu = h.router.network().executed.lock().unwrap()[0].clone();
        let wire = String::from_utf8_lossy(&pdu);
        assert!(wire.contains("5550101/TYPE=PLMN"));
        assert!(!wire.contains("not an address"));
        assert!(matches!(h.events.recv().await, Some(CompletionEvent::Sent(_))));
    }

    #[tokio::test]
    async fn all_recipients_unencodable_fails_to_compose() {
        let h = harness();
        let message = OutgoingMessage::builder()
            .text("photo")
            .to("not an address!")
            .attachment(Attachment::image(vec![0xFFu8]))
            .build()
            .unwrap();

        let result = h.router.dispatch(&message, &Settings::default()).await;
        assert!(matches!(
            result,
            Err(SendError::Encoding(crate::pdu::EncodingError::NoRecipients))
        ));
        assert_eq!(h.router.network().acquired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn reserved_separator_is_rejected() {
        let h = harness();
        let message = OutgoingMessage::new("hi", to(&["5550101|5550102"]));

        let result = h.router.dispatch(&message, &Settings::default()).await;
        assert!(matches!(result, Err(SendError::InvalidMessage(_))));
        assert!(h.router.transport().sms().is_empty());
    }

    #[test]
    fn routing_only_moves_towards_mms() {
        let h = harness();
        let settings = Settings::default();
        let base = OutgoingMessage::new("short", to(&["5550101"]));
        assert!(!h.router.should_send_as_mms(&base, &settings));

        let mut with_media = base.clone();
        with_media.attachments.push(Attachment::image(vec![1u8]));
        assert!(h.router.should_send_as_mms(&with_media, &settings));

        let mut with_extra = base.clone();
        with_extra.extra_parts.push(Attachment::new(vec![1u8], "text/x-vcard"));
        assert!(h.router.should_send_as_mms(&with_extra, &settings));

        let mut with_subject = base.clone();
        with_subject.subject = Some(String::new());
        assert!(h.router.should_send_as_mms(&with_subject, &settings));

        let mut group = base.clone();
        group.addresses.push("5550102".to_string());
        assert!(h.router.should_send_as_mms(&group, &settings));
        assert!(!h.router.should_send_as_mms(&group, &settings.clone().with_group(false)));

        // 4 segments exceeds the default threshold of 3
        let long = OutgoingMessage::new("z".repeat(500), to(&["5550101"]));
        assert!(h.router.should_send_as_mms(&long, &settings));
        assert!(!h.router.should_send_as_mms(&long, &settings.clone().with_send_long_as_mms(false, 3)));
        assert!(!h.router.should_send_as_mms(&long, &settings.with_send_long_as_mms(true, 4)));
    }

    #[tokio::test]
    async fn delivery_tokens_need_save_and_reports() {
        let h = harness();
        let message = OutgoingMessage::new("hello", to(&["5550101"]));

        h.router.dispatch(&message, &Settings::default()).await.unwrap();
        h.router
            .dispatch(&message, &Settings::default().with_delivery_reports(true))
            .await
            .unwrap();

        let sends = h.router.transport().sms();
        assert_eq!(sends[0].delivery_tokens, vec![None]);

        let sent = sends[1].sent_tokens[0].clone().unwrap();
        let delivered = sends[1].delivery_tokens[0].clone().unwrap();
        assert_eq!(sent.kind, TokenKind::SmsSent);
        assert_eq!(delivered.kind, TokenKind::SmsDelivered);
        assert_eq!(sent.id, delivered.id);
        assert_eq!(sent.message_uri, delivered.message_uri);
        assert_eq!(sent.id, 2);
    }

    #[tokio::test]
    async fn unsaved_sms_has_no_tokens_or_rows() {
        let h = harness();
        let message = OutgoingMessage::builder()
            .text("hello")
            .to("5550101")
            .save(false)
            .build()
            .unwrap();

        h.router
            .dispatch(&message, &Settings::default().with_delivery_reports(true))
            .await
            .unwrap();

        let sends = h.router.transport().sms();
        assert_eq!(sends.len(), 1);
        assert_eq!(sends[0].sent_tokens, vec![None]);
        assert_eq!(sends[0].delivery_tokens, vec![None]);
        assert!(h.store.calls().is_empty());
    }

    #[tokio::test]
    async fn signature_pre_text_and_accent_stripping() {
        let h = harness();
        let message = OutgoingMessage::new("café", to(&["5550101"]));
        let settings = Settings::default()
            .with_signature("Zoë")
            .with_pre_text("[work]")
            .with_strip_unicode(true)
            .with_subscription_id(2);

        h.router.dispatch(&message, &settings).await.unwrap();

        let sends = h.router.transport().sms();
        assert_eq!(sends[0].units, vec!["[work] cafe\nZoe".to_string()]);

        match &h.store.calls()[0] {
            StoreCall::Message { body, fields, .. } => {
                assert_eq!(body, "cafe\nZoe");
                assert_eq!(fields.get("type"), Some(&FieldValue::Int(4)));
                assert_eq!(fields.get("read"), Some(&FieldValue::Int(1)));
                assert_eq!(fields.get("sub_id"), Some(&FieldValue::Int(2)));
            }
            other => panic!("unexpected store call {other:?}"),
        }
    }

    #[tokio::test]
    async fn transport_errors_reach_the_caller() {
        let h = harness_with(MockTransport::rejecting(), MockNetwork::default(), MockStore::default());
        let message = OutgoingMessage::new("hello", to(&["5550101", "5550102"]));

        let result = h.router.dispatch(&message, &Settings::default().with_group(false)).await;
        assert!(matches!(result, Err(SendError::Transport(TransportError::Rejected(_)))));
    }

    #[tokio::test]
    async fn persistence_falls_back_to_legacy_rows() {
        let h = harness_with(
            MockTransport::default(),
            MockNetwork::default(),
            MockStore::failing_send_requests(),
        );
        let message = OutgoingMessage::builder()
            .text("caption")
            .to("5550101")
            .attachment(Attachment::image(vec![0xFFu8, 0xD8, 0xFF]))
            .build()
            .unwrap();

        h.router.dispatch(&message, &Settings::default()).await.unwrap();

        let calls = h.store.calls();
        let tables: Vec<&Table> = calls
            .iter()
            .filter_map(|call| match call {
                StoreCall::Row(table, _) => Some(table),
                _ => None,
            })
            .collect();
        assert_eq!(tables.len(), 5);
        assert_eq!(tables[0], &Table::SentSms);
        assert_eq!(tables[1], &Table::Mms);
        assert!(matches!(tables[2], Table::MmsPart { .. }));
        assert!(matches!(tables[3], Table::MmsPart { .. }));
        assert!(matches!(tables[4], Table::MmsAddress { .. }));

        let Some(StoreCall::Row(Table::Mms, mms)) = calls.get(1) else {
            panic!("expected the mms row second");
        };
        assert_eq!(mms.get("m_type"), Some(&FieldValue::Int(128)));
        assert_eq!(mms.get("exp"), Some(&FieldValue::Int(3 + 7)));
        assert_eq!(mms.get("msg_box"), Some(&FieldValue::Int(4)));

        // The placeholder row is removed last
        assert!(matches!(calls.last(), Some(StoreCall::Delete(uri)) if uri.as_str().starts_with("content://sms/")));
        assert_eq!(h.router.network().executed.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn network_is_released_when_the_send_fails() {
        let network = MockNetwork {
            reject: true,
            ..Default::default()
        };
        let mut h = harness_with(MockTransport::default(), network, MockStore::default());
        let message = OutgoingMessage::new("hi", to(&["5550101", "5550102"]));

        let result = h.router.dispatch(&message, &Settings::default()).await;
        assert!(matches!(result, Err(SendError::Transport(TransportError::Rejected(_)))));

        let network = h.router.network();
        assert_eq!(network.acquired.load(Ordering::SeqCst), 1);
        assert_eq!(network.released.load(Ordering::SeqCst), 1);
        assert!(matches!(
            h.events.recv().await,
            Some(CompletionEvent::Failed { kind: MmsErrorKind::Http, .. })
        ));
    }

    #[tokio::test]
    async fn slow_network_times_out() {
        let network = MockNetwork {
            delay: Some(Duration::from_secs(5)),
            ..Default::default()
        };
        let mut h = harness_with(MockTransport::default(), network, MockStore::default());
        let message = OutgoingMessage::new("hi", to(&["5550101", "5550102"]));
        let settings = Settings::default().with_mms_timeout(Duration::from_millis(20));

        let result = h.router.dispatch(&message, &settings).await;
        assert!(matches!(result, Err(SendError::Transport(TransportError::Timeout))));
        assert_eq!(h.router.network().released.load(Ordering::SeqCst), 1);
        assert!(matches!(
            h.events.recv().await,
            Some(CompletionEvent::Failed { kind: MmsErrorKind::Timeout, .. })
        ));
    }

    #[tokio::test]
    async fn non_group_mms_fans_out_per_recipient() {
        let h = harness();
        let message = OutgoingMessage::builder()
            .text("look")
            .addresses(["5550101", "5550102"])
            .attachment(Attachment::image(vec![1u8, 2, 3]))
            .group(false)
            .build()
            .unwrap();

        h.router.dispatch(&message, &Settings::default()).await.unwrap();

        assert_eq!(h.router.network().executed.lock().unwrap().len(), 2);
        let recipients: Vec<Vec<String>> = h
            .store
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::SendRequest {
                    recipients,
                    options,
                    content_types,
                    ..
                } => {
                    assert!(!options.group);
                    assert_eq!(content_types, ["application/smil", "image/jpeg", "text/plain"]);
                    Some(recipients)
                }
                _ => None,
            })
            .collect();
        assert_eq!(recipients, vec![to(&["5550101"]), to(&["5550102"])]);
    }

    #[tokio::test]
    async fn sender_defaults_to_line_number() {
        let h = harness();
        let message = OutgoingMessage::builder()
            .text("hi")
            .to("5550101")
            .subject("Hello")
            .build()
            .unwrap();

        h.router.dispatch(&message, &Settings::default()).await.unwrap();

        match &h.store.calls()[0] {
            StoreCall::SendRequest {
                from: FromAddress::Present(address),
                ..
            } => assert_eq!(address.value().to_string_lossy(), "+15550100/TYPE=PLMN"),
            other => panic!("unexpected store call {other:?}"),
        }
    }

    #[tokio::test]
    async fn system_strategy_stages_the_pdu() {
        let dir = std::env::temp_dir().join(format!("send-message-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();

        let h = harness();
        let message = OutgoingMessage::builder()
            .text("hi")
            .to("5550101")
            .attachment(Attachment::image(vec![9u8; 16]))
            .build()
            .unwrap();
        let settings = Settings::default()
            .with_mms_strategy(MmsStrategy::System)
            .with_staging_dir(&dir)
            .with_http_params("x-wap-profile: p");

        h.router.dispatch(&message, &settings).await.unwrap();

        let calls = h.router.transport().multimedia.lock().unwrap().clone();
        assert_eq!(calls.len(), 1);
        let (staged, overrides, token) = &calls[0];

        let file_name = staged.path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(file_name.starts_with("send.") && file_name.ends_with(".dat"));
        assert_eq!(
            staged.content_uri,
            format!("content://{DEFAULT_FILE_PROVIDER_AUTHORITY}/{file_name}")
        );

        let written = std::fs::read(&staged.path).unwrap();
        assert_eq!(&written[..2], &[0x8C, 0x80]);
        assert_eq!(token.staged_file.as_ref(), Some(&staged.path));
        assert_eq!(token.kind, TokenKind::MmsSent);
        assert_eq!(overrides.http_params.as_deref(), Some("x-wap-profile: p"));
        assert_eq!(h.router.network().acquired.load(Ordering::SeqCst), 0);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn system_resend_moves_existing_record_to_outbox() {
        let dir = std::env::temp_dir().join(format!("send-message-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();

        let h = harness();
        let existing = RecordUri::new("content://mms/31");
        let message = OutgoingMessage::builder()
            .to("5550101")
            .attachment(Attachment::image(vec![1u8]))
            .save(false)
            .existing_message_uri(existing.clone())
            .build()
            .unwrap();
        let settings = Settings::default()
            .with_mms_strategy(MmsStrategy::System)
            .with_staging_dir(&dir);

        h.router.dispatch(&message, &settings).await.unwrap();

        assert_eq!(
            h.store.calls(),
            vec![StoreCall::BoxState(existing.clone(), MessageBox::Outbox)]
        );
        let calls = h.router.transport().multimedia.lock().unwrap().clone();
        assert_eq!(calls[0].2.message_uri, Some(existing));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn missing_staging_dir_reports_io_error() {
        let mut h = harness();
        let message = OutgoingMessage::builder()
            .to("5550101")
            .attachment(Attachment::image(vec![1u8]))
            .build()
            .unwrap();
        let settings = Settings::default()
            .with_mms_strategy(MmsStrategy::System)
            .with_staging_dir("/nonexistent/send-message/staging");

        h.router.dispatch(&message, &settings).await.unwrap();

        assert!(h.router.transport().multimedia.lock().unwrap().is_empty());
        assert!(matches!(
            h.events.recv().await,
            Some(CompletionEvent::Failed { kind: MmsErrorKind::Io, .. })
        ));
    }

    #[tokio::test]
    async fn failed_system_handoff_removes_staged_file() {
        let dir = std::env::temp_dir().join(format!("send-message-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();

        let transport = MockTransport {
            reject_multimedia: true,
            ..Default::default()
        };
        let h = harness_with(transport, MockNetwork::default(), MockStore::default());
        let message = OutgoingMessage::builder()
            .to("5550101")
            .attachment(Attachment::image(vec![1u8, 2, 3]))
            .build()
            .unwrap();
        let settings = Settings::default()
            .with_mms_strategy(MmsStrategy::System)
            .with_staging_dir(&dir);

        let result = h.router.dispatch(&message, &settings).await;
        assert!(matches!(result, Err(SendError::Transport(TransportError::Rejected(_)))));

        let left: Vec<_> = std::fs::read_dir(&dir).unwrap().collect();
        assert!(left.is_empty(), "staged files left behind: {left:?}");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn direct_and_system_send_identical_bytes() {
        let dir = std::env::temp_dir().join(format!("send-message-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();

        let mut h = harness();
        let clock = std::time::UNIX_EPOCH + Duration::from_millis(1_700_000_000_123);
        h.router = h.router.with_builder(crate::pdu::PduBuilder::new().with_time(clock));

        let message = OutgoingMessage::builder()
            .text("same bytes either way")
            .addresses(["5550101", "5550102"])
            .subject("Photos")
            .attachment(Attachment::image(vec![0xA5u8; 64]).with_name("photo.jpg"))
            .build()
            .unwrap();

        h.router.dispatch(&message, &Settings::default()).await.unwrap();
        h.router
            .dispatch(
                &message,
                &Settings::default()
                    .with_mms_strategy(MmsStrategy::System)
                    .with_staging_dir(&dir),
            )
            .await
            .unwrap();

        let direct = h.router.network().executed.lock().unwrap()[0].clone();
        let staged = h.router.transport().multimedia.lock().unwrap()[0].0.clone();
        let system = std::fs::read(&staged.path).unwrap();
        assert_eq!(direct.as_ref(), system.as_slice());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn failed_legacy_insert_removes_placeholder_row() {
        let store = MockStore {
            fail_send_requests: true,
            fail_address_rows: true,
            ..Default::default()
        };
        let h = harness_with(MockTransport::default(), MockNetwork::default(), store);
        let message = OutgoingMessage::builder()
            .text("caption")
            .to("5550101")
            .attachment(Attachment::image(vec![0xFFu8]))
            .build()
            .unwrap();

        // Persistence failures are logged; the MMS still goes out
        h.router.dispatch(&message, &Settings::default()).await.unwrap();
        assert_eq!(h.router.network().executed.lock().unwrap().len(), 1);

        let calls = h.store.calls();
        let Some(StoreCall::Row(Table::SentSms, _)) = calls.first() else {
            panic!("expected the placeholder row first, got {calls:?}");
        };
        assert!(matches!(
            calls.last(),
            Some(StoreCall::Delete(uri)) if uri.as_str() == "content://sms/1"
        ));
        assert!(!calls
            .iter()
            .any(|call| matches!(call, StoreCall::Row(Table::MmsAddress { .. }, _))));
    }
}
