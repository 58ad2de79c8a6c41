use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Payment {
    #[serde(default)]
    pub id: Option<i64>,
    pub amount: f64,
    pub currency: String,
    #[serde(rename = "paidAt")]
    pub paid_at: DateTime<Utc>,
    #[serde(rename = "paymentMethod", default)]
    pub payment_method: Option<String>,
    #[serde(rename = "transactionRef", default)]
    pub transaction_ref: Option<String>,
}

impl Payment {
    pub fn display_amount(&self) -> String {
        format!("{:.2} {}", self.amount, self.currency)
    }
}
