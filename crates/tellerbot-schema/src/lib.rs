use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One incoming message at the turn boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub user_input: String,
    pub thread_id: String,
}

/// What goes back to the caller after a turn completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub metadata: TurnMetadata,
    pub decision: Intent,
}

/// Button labels shown to the user, in the order the frontend renders them.
pub const BUTTON_LABELS: [&str; 4] = [
    "สินเชื่อ",
    "เปิดบัญชีอย่างไร",
    "ยอดเงินไม่เข้า",
    "สแกนจ่ายไม่ได้",
];

/// Closed intent set. The four button variants carry the label text on the
/// wire; `greeting` and `unknown` are the two sentinel values a turn can
/// also end with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    #[serde(rename = "สินเชื่อ")]
    Loans,
    #[serde(rename = "เปิดบัญชีอย่างไร")]
    OpenAccount,
    #[serde(rename = "ยอดเงินไม่เข้า")]
    BalanceMissing,
    #[serde(rename = "สแกนจ่ายไม่ได้")]
    ScanPayFailure,
    #[serde(rename = "greeting")]
    Greeting,
    #[serde(rename = "unknown")]
    Unknown,
}

impl Intent {
    /// Wire form of the decision, identical to the serde rename.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Loans => "สินเชื่อ",
            Self::OpenAccount => "เปิดบัญชีอย่างไร",
            Self::BalanceMissing => "ยอดเงินไม่เข้า",
            Self::ScanPayFailure => "สแกนจ่ายไม่ได้",
            Self::Greeting => "greeting",
            Self::Unknown => "unknown",
        }
    }

    /// Exact match against the four button labels. Input must already be
    /// trimmed and lowercased.
    pub fn from_button_label(normalized: &str) -> Option<Self> {
        match normalized {
            "สินเชื่อ" => Some(Self::Loans),
            "เปิดบัญชีอย่างไร" => Some(Self::OpenAccount),
            "ยอดเงินไม่เข้า" => Some(Self::BalanceMissing),
            "สแกนจ่ายไม่ได้" => Some(Self::ScanPayFailure),
            _ => None,
        }
    }

    pub fn is_button(&self) -> bool {
        !matches!(self, Self::Greeting | Self::Unknown)
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// How a turn's output was produced, one variant per method. Kept as a
/// tagged union rather than a free-form map so every responder's guarantees
/// stay type-checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum TurnMetadata {
    /// Zero-cost classification by exact label match.
    StringMatch {
        tokens: u32,
        timestamp: DateTime<Utc>,
    },
    /// Canned response, no model involved.
    StaticResponse {
        tokens: u32,
        timestamp: DateTime<Utc>,
    },
    /// Grounded answer from a passage that cleared the high threshold.
    RagHighThreshold {
        model: String,
        input_tokens: Option<u32>,
        output_tokens: Option<u32>,
        time_to_read: Option<u64>,
        time_to_generate: Option<u64>,
        timestamp: DateTime<Utc>,
    },
    /// Related-question suggestion from a passage at the lower threshold.
    RagAcceptableThreshold {
        model: String,
        input_tokens: Option<u32>,
        output_tokens: Option<u32>,
        time_to_read: Option<u64>,
        time_to_generate: Option<u64>,
        timestamp: DateTime<Utc>,
    },
    /// Explicit no-information answer, nothing retrieved at either threshold.
    FallbackLowThreshold {
        model: String,
        input_tokens: Option<u32>,
        output_tokens: Option<u32>,
        time_to_read: Option<u64>,
        time_to_generate: Option<u64>,
        timestamp: DateTime<Utc>,
    },
}

impl TurnMetadata {
    pub fn string_match(timestamp: DateTime<Utc>) -> Self {
        Self::StringMatch {
            tokens: 0,
            timestamp,
        }
    }

    pub fn static_response(timestamp: DateTime<Utc>) -> Self {
        Self::StaticResponse {
            tokens: 0,
            timestamp,
        }
    }

    /// The serialized `method` tag for this variant.
    pub fn method(&self) -> &'static str {
        match self {
            Self::StringMatch { .. } => "string_match",
            Self::StaticResponse { .. } => "static_response",
            Self::RagHighThreshold { .. } => "rag_high_threshold",
            Self::RagAcceptableThreshold { .. } => "rag_acceptable_threshold",
            Self::FallbackLowThreshold { .. } => "fallback_low_threshold",
        }
    }

    /// Token count for the zero-cost paths; generation paths report their
    /// counters per-field instead.
    pub fn tokens(&self) -> Option<u32> {
        match self {
            Self::StringMatch { tokens, .. } | Self::StaticResponse { tokens, .. } => Some(*tokens),
            _ => None,
        }
    }
}

/// One search hit: passage text plus the relevance score the caller filters
/// by. Lives only for the duration of a single fallback invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredPassage {
    pub text: String,
    pub score: f32,
}

/// The full record of one conversation turn, persisted per thread id after
/// the response is produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRecord {
    pub thread_id: String,
    pub user_input: String,
    pub decision: Intent,
    pub final_output: String,
    pub metadata: TurnMetadata,
    pub at: DateTime<Utc>,
}

impl TurnRecord {
    pub fn into_response(self) -> ChatResponse {
        ChatResponse {
            response: self.final_output,
            metadata: self.metadata,
            decision: self.decision,
        }
    }
}
