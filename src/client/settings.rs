// ABOUTME: Dispatch settings controlling routing, SMS splitting, persistence and MMS strategy
// ABOUTME: An immutable value passed into every dispatch call, configured with chained with_* methods

use crate::client::types::ConfigOverrides;
use std::path::PathBuf;
use std::time::Duration;

/// Default authority of staged PDU content URIs
pub const DEFAULT_FILE_PROVIDER_AUTHORITY: &str = "send_message.MmsFileProvider";

/// Default maximum MMS size forwarded to the system service (300 KiB)
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 300 * 1024;

/// How MMS messages leave the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MmsStrategy {
    /// POST the PDU over an MMS network acquired for the request
    #[default]
    Direct,
    /// Stage the PDU in a file and hand it to the system MMS service
    System,
}

/// Configuration for message dispatch
///
/// A dispatch call reads its settings once and never mutates them, so one
/// value can be shared by concurrent dispatches.
///
/// # Example
///
/// ```rust
/// use send_message::client::{MmsStrategy, Settings};
///
/// // Defaults: group MMS on, long texts as MMS after 3 pages, direct MMS
/// let settings = Settings::default();
/// assert!(settings.group);
///
/// let settings = Settings::default()
///     .with_signature("-- sent from my phone")
///     .with_split(true, true)
///     .with_group(false)
///     .with_mms_strategy(MmsStrategy::System);
/// assert_eq!(settings.mms_strategy, MmsStrategy::System);
/// ```
#[derive(Debug, Clone)]
pub struct Settings {
    /// Appended to SMS text as `\n<signature>` when non-empty
    pub signature: String,

    /// Prefixed to each per-recipient SMS body as `<pre_text> ` when non-empty
    pub pre_text: String,

    /// Fold accented letters to ASCII in SMS bodies (default: false)
    pub strip_unicode: bool,

    /// Split SMS bodies using the transport's segment estimate (default: false)
    ///
    /// When false every chunk is the whole body and the transport alone
    /// divides it into units.
    pub split: bool,

    /// Prefix `(i/N) ` counters when splitting (default: false)
    pub split_counter: bool,

    /// Request SMS delivery reports; needs a saved message (default: false)
    pub delivery_reports: bool,

    /// Send one MMS to all recipients instead of one per recipient (default: true)
    pub group: bool,

    /// Send long texts as MMS (default: true)
    pub send_long_as_mms: bool,

    /// Page count above which a long text goes as MMS (default: 3)
    pub send_long_as_mms_after: usize,

    /// Subscription used for store rows and the sender's line number
    pub subscription_id: Option<i32>,

    /// MMS delivery strategy (default: Direct)
    pub mms_strategy: MmsStrategy,

    /// Directory where the system strategy stages PDU files
    pub staging_dir: PathBuf,

    /// Authority of staged PDU content URIs
    pub file_provider_authority: String,

    /// Extra HTTP parameters forwarded to the system MMS service
    pub http_params: Option<String>,

    /// Maximum MMS size forwarded to the system MMS service
    pub max_message_size: usize,

    /// Upper bound on one direct MMS request (default: 60 seconds)
    pub mms_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            signature: String::new(),
            pre_text: String::new(),
            strip_unicode: false,
            split: false,
            split_counter: false,
            delivery_reports: false,
            group: true,
            send_long_as_mms: true,
            send_long_as_mms_after: 3,
            subscription_id: None,
            mms_strategy: MmsStrategy::Direct,
            staging_dir: std::env::temp_dir(),
            file_provider_authority: DEFAULT_FILE_PROVIDER_AUTHORITY.to_string(),
            http_params: None,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            mms_timeout: Duration::from_secs(60),
        }
    }
}

impl Settings {
    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = signature.into();
        self
    }

    pub fn with_pre_text(mut self, pre_text: impl Into<String>) -> Self {
        self.pre_text = pre_text.into();
        self
    }

    pub fn with_strip_unicode(mut self, strip_unicode: bool) -> Self {
        self.strip_unicode = strip_unicode;
        self
    }

    /// Enable splitting, optionally with counters
    pub fn with_split(mut self, split: bool, counter: bool) -> Self {
        self.split = split;
        self.split_counter = counter;
        self
    }

    pub fn with_delivery_reports(mut self, delivery_reports: bool) -> Self {
        self.delivery_reports = delivery_reports;
        self
    }

    pub fn with_group(mut self, group: bool) -> Self {
        self.group = group;
        self
    }

    /// Configure the long-text-as-MMS policy
    pub fn with_send_long_as_mms(mut self, enabled: bool, after_pages: usize) -> Self {
        self.send_long_as_mms = enabled;
        self.send_long_as_mms_after = after_pages;
        self
    }

    pub fn with_subscription_id(mut self, subscription_id: i32) -> Self {
        self.subscription_id = Some(subscription_id);
        self
    }

    pub fn with_mms_strategy(mut self, strategy: MmsStrategy) -> Self {
        self.mms_strategy = strategy;
        self
    }

    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = dir.into();
        self
    }

    pub fn with_file_provider_authority(mut self, authority: impl Into<String>) -> Self {
        self.file_provider_authority = authority.into();
        self
    }

    pub fn with_http_params(mut self, params: impl Into<String>) -> Self {
        self.http_params = Some(params.into());
        self
    }

    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    pub fn with_mms_timeout(mut self, timeout: Duration) -> Self {
        self.mms_timeout = timeout;
        self
    }

    /// Overrides passed along with a system MMS send
    pub fn config_overrides(&self, group: bool) -> ConfigOverrides {
        ConfigOverrides {
            group_mms_enabled: group,
            http_params: self.http_params.clone().filter(|params| !params.is_empty()),
            max_message_size: self.max_message_size,
        }
    }
}
