//! Record types shared by the ranking pipeline and the analytics store.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// One historical message from a sender to a recipient.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageObservation {
    /// Response latency in minutes; 0 when the message was not a reply.
    pub response_time_minutes: f64,
    /// Character count of the message body.
    pub message_length: i32,
    /// Whether the recipient ever wrote back in the same chat.
    pub has_response: bool,
    /// Messages that continued the conversation after this one.
    pub follow_up_messages: i32,
}

/// Observations grouped sender id -> recipient id. One entry per ordered
/// pair that actually communicated.
pub type ObservationMap = HashMap<i32, HashMap<i32, Vec<MessageObservation>>>;

/// One directed communication edge with its component factors and the
/// blended weight, all rounded to three decimals. Created fresh on every
/// run and upserted keyed by (sender, recipient, date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunicationWeight {
    pub sender_id: i32,
    pub recipient_id: i32,
    pub weight: f64,
    pub time_factor: f64,
    pub response_factor: f64,
    pub length_factor: f64,
    pub continuation_factor: f64,
    pub calculation_date: NaiveDate,
}

/// Final influence record for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfluenceRank {
    pub user_id: i32,
    pub chat_rank: f64,
    pub rank_percentile: f64,
    pub category: InfluenceCategory,
    pub calculation_date: NaiveDate,
    /// Iterations the producing solve actually performed.
    pub iteration_count: u32,
    /// Final max per-user rank change of the producing solve.
    pub convergence_delta: f64,
}

/// Influence band derived from the rank percentile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InfluenceCategory {
    High,
    Medium,
    Low,
}

impl InfluenceCategory {
    /// Band for a percentile in [0, 1]: `>= 0.9` high, `>= 0.5` medium,
    /// everything below low.
    pub fn from_percentile(percentile: f64) -> Self {
        if percentile >= 0.9 {
            Self::High
        } else if percentile >= 0.5 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for InfluenceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InfluenceCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(format!("unknown influence category: {other}")),
        }
    }
}
