//! Core types for the intervention broker
//!
//! Defines:
//! - Broker and intervention identifiers
//! - Request and response payloads
//! - Resolution outcomes and cancellation reasons
//! - Broker configuration and statistics

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use ulid::Ulid;

/// Unique broker identifier, minted once per broker
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BrokerId(pub Ulid);

impl BrokerId {
    /// Generate new broker ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for BrokerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BrokerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier correlating a resolution with the intervention it answers.
///
/// `seq` is assigned from a per-broker counter, so the broker can tell a
/// handle it already retired from one it never issued without keeping
/// retired records around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InterventionId {
    /// Broker that issued this id
    pub broker: BrokerId,
    /// Publication sequence number within that broker
    pub seq: u64,
}

impl std::fmt::Display for InterventionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.broker, self.seq)
    }
}

/// Which decision is being requested.
///
/// The broker never inspects the variant; it is carried through to
/// whatever surface presents the intervention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InterventionKind {
    /// Proceed or abort
    Confirmation,
    /// Yes or no question
    YesNo,
    /// Pick one of several options
    Choice {
        /// Options in display order
        options: Vec<String>,
    },
    /// User must fetch a file by hand and point at it
    ManualFileSelection {
        /// File name the pipeline expects
        suggested_name: String,
        /// Where the file can be obtained
        url: Option<String>,
        /// Expected content hash, if known
        expected_hash: Option<String>,
    },
    /// Notice that only needs to be dismissed
    Acknowledge,
}

impl InterventionKind {
    /// Short machine-readable label
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Confirmation => "confirmation",
            Self::YesNo => "yes_no",
            Self::Choice { .. } => "choice",
            Self::ManualFileSelection { .. } => "manual_file_selection",
            Self::Acknowledge => "acknowledge",
        }
    }
}

/// A request for a human decision, as built by a worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterventionRequest {
    /// Requested decision
    pub kind: InterventionKind,
    /// One-line summary
    pub short_description: String,
    /// Longer explanation, possibly empty
    pub extended_description: String,
}

impl InterventionRequest {
    /// Create request with a summary and no extended description
    #[must_use]
    pub fn new(kind: InterventionKind, short_description: impl Into<String>) -> Self {
        Self {
            kind,
            short_description: short_description.into(),
            extended_description: String::new(),
        }
    }

    /// Confirmation request
    #[must_use]
    pub fn confirmation(short_description: impl Into<String>) -> Self {
        Self::new(InterventionKind::Confirmation, short_description)
    }

    /// Yes/no request
    #[must_use]
    pub fn yes_no(short_description: impl Into<String>) -> Self {
        Self::new(InterventionKind::YesNo, short_description)
    }

    /// Multi-choice request
    #[must_use]
    pub fn choice<I, S>(short_description: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            InterventionKind::Choice {
                options: options.into_iter().map(Into::into).collect(),
            },
            short_description,
        )
    }

    /// With extended description
    #[inline]
    #[must_use]
    pub fn with_details(mut self, extended_description: impl Into<String>) -> Self {
        self.extended_description = extended_description.into();
        self
    }
}

/// Answer supplied by the responder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum InterventionResponse {
    /// Confirmation granted
    Confirmed,
    /// Yes/no answer
    Answer(bool),
    /// Index into the offered options
    Chosen(usize),
    /// File selected by the user
    File(PathBuf),
    /// Free text
    Text(String),
    /// Notice dismissed
    Acknowledged,
}

/// Why an intervention ended without a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// Explicit `cancel` call
    Requested,
    /// Waiter's timeout expired first
    TimedOut,
    /// Waiting worker went away
    Abandoned,
    /// Broker shut down
    Shutdown,
}

impl std::fmt::Display for CancelReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Requested => "requested",
            Self::TimedOut => "timed out",
            Self::Abandoned => "abandoned",
            Self::Shutdown => "shutdown",
        };
        f.write_str(s)
    }
}

/// Outcome observed by the waiting worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Responder supplied an answer
    Responded(InterventionResponse),
    /// No answer will come
    Cancelled(CancelReason),
}

impl Resolution {
    /// Check if this is a cancellation
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// Response, if one was supplied
    #[inline]
    #[must_use]
    pub fn response(&self) -> Option<&InterventionResponse> {
        match self {
            Self::Responded(r) => Some(r),
            Self::Cancelled(_) => None,
        }
    }

    /// Consume into the response
    #[inline]
    #[must_use]
    pub fn into_response(self) -> Option<InterventionResponse> {
        match self {
            Self::Responded(r) => Some(r),
            Self::Cancelled(_) => None,
        }
    }
}

/// Effect of a `resolve` or `cancel` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Settle {
    /// This call decided the outcome
    Applied,
    /// Another resolution got there first; nothing changed
    AlreadyHandled,
}

impl Settle {
    /// Check if this call decided the outcome
    #[inline]
    #[must_use]
    pub fn applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Snapshot of a published intervention
///
/// Snapshots only exist for unhandled interventions. The live handled flag
/// is [`InterventionHandle::is_handled`](crate::InterventionHandle::is_handled)
/// or [`InterventionBroker::is_handled`](crate::InterventionBroker::is_handled).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intervention {
    /// Correlation id
    pub id: InterventionId,
    /// What is being asked
    pub request: InterventionRequest,
    /// Publication time
    pub created_at: DateTime<Utc>,
}

impl Intervention {
    /// Requested decision kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &InterventionKind {
        &self.request.kind
    }
}

/// Broker configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Maximum number of unhandled interventions
    pub max_pending: usize,
    /// Timeout applied by `raise`, in milliseconds
    #[serde(
        rename = "default_timeout_ms",
        with = "opt_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub default_timeout: Option<Duration>,
}

impl BrokerConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With pending limit
    #[inline]
    #[must_use]
    pub fn with_max_pending(mut self, max: usize) -> Self {
        self.max_pending = max;
        self
    }

    /// With timeout used by `raise`
    #[inline]
    #[must_use]
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            max_pending: 1024,
            default_timeout: None,
        }
    }
}

mod opt_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub(super) fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(d) => serializer.serialize_some(&u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
            None => serializer.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}

/// Broker statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrokerStats {
    /// Total interventions published
    pub published: u64,
    /// Resolved with a response
    pub responded: u64,
    /// Cancelled explicitly or by shutdown
    pub cancelled: u64,
    /// Cancelled by a waiter timeout
    pub timed_out: u64,
    /// Cancelled because the waiter went away
    pub abandoned: u64,
    /// Currently unhandled
    pub pending: usize,
}
