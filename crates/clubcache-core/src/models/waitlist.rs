use serde::{Deserialize, Serialize};

/// A raw waiting-list row as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct WaitlistEntry {
    pub id: i64,
    #[serde(rename = "memberId")]
    pub member_id: i64,
    #[serde(rename = "facilityTypeId")]
    pub facility_type_id: i64,
    #[serde(rename = "queuedAt")]
    pub queued_at: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct WaitlistResponse {
    #[serde(rename = "facilityTypeId")]
    pub facility_type_id: i64,
    #[serde(default)]
    pub entries: Vec<WaitlistEntry>,
}

impl WaitlistResponse {
    pub fn empty(facility_type_id: i64) -> Self {
        Self {
            facility_type_id,
            entries: Vec::new(),
        }
    }
}

/// A waiting-list row joined with the member it refers to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct WaitlistMemberDetail {
    #[serde(flatten)]
    pub entry: WaitlistEntry,
    #[serde(rename = "memberName")]
    pub member_name: String,
    #[serde(rename = "memberEmail")]
    pub member_email: String,
    /// 1-based position in the queue.
    pub position: usize,
}
