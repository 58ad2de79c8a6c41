//! Bodies of the write requests sent to the backend.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::Season;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct PhoneNumberInput {
    pub prefix: String,
    pub number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct AddressInput {
    pub country: String,
    pub city: String,
    pub street: String,
    #[serde(rename = "streetNumber")]
    pub street_number: String,
    #[serde(rename = "zipCode")]
    pub zip_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct CreateMemberRequest {
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    #[serde(rename = "birthDate")]
    pub birth_date: NaiveDate,
    pub email: String,
    #[serde(rename = "phoneNumbers")]
    pub phone_numbers: Vec<PhoneNumberInput>,
    pub addresses: Vec<AddressInput>,
    #[serde(rename = "createMembership")]
    pub create_membership: bool,
    #[serde(rename = "seasonId", skip_serializing_if = "Option::is_none", default)]
    pub season_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct AddMembershipRequest {
    #[serde(rename = "memberId")]
    pub member_id: i64,
    #[serde(rename = "seasonId")]
    pub season_id: i64,
    #[serde(rename = "seasonStartsAt")]
    pub season_starts_at: NaiveDateTime,
    #[serde(rename = "seasonEndsAt")]
    pub season_ends_at: NaiveDateTime,
    pub price: f64,
}

impl AddMembershipRequest {
    /// A membership covering `season` from the first to the last millisecond.
    pub fn for_season(member_id: i64, season: &Season, price: f64) -> Self {
        let end_of_day =
            NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
        Self {
            member_id,
            season_id: season.id,
            season_starts_at: season.starts_at.and_time(NaiveTime::MIN),
            season_ends_at: season.ends_at.and_time(end_of_day),
            price,
        }
    }
}

/// Exactly one of `membership_period_id` and `rented_facility_id` is expected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct CreatePaymentRequest {
    #[serde(rename = "membershipPeriodId", default)]
    pub membership_period_id: Option<i64>,
    #[serde(rename = "rentedFacilityId", default)]
    pub rented_facility_id: Option<i64>,
    pub amount: f64,
    pub currency: String,
    #[serde(rename = "paymentMethod")]
    pub payment_method: String,
    #[serde(rename = "transactionRef", default)]
    pub transaction_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct CreatedPayment {
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct UpdatePaymentRequest {
    pub amount: f64,
    pub currency: String,
    #[serde(rename = "paymentMethod")]
    pub payment_method: String,
    #[serde(rename = "transactionRef", default)]
    pub transaction_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct RentFacilityRequest {
    #[serde(rename = "memberId")]
    pub member_id: i64,
    #[serde(rename = "facilityId")]
    pub facility_id: i64,
    #[serde(rename = "seasonId")]
    pub season_id: i64,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct AddToWaitlistRequest {
    #[serde(rename = "memberId")]
    pub member_id: i64,
    #[serde(rename = "facilityTypeId")]
    pub facility_type_id: i64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub notes: Option<String>,
}

/// Price the backend suggests for a rental, after member discounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct SuggestedPrice {
    #[serde(rename = "suggestedPrice")]
    pub suggested_price: f64,
    #[serde(rename = "basePrice")]
    pub base_price: f64,
    #[serde(rename = "savingsAmount")]
    pub savings_amount: f64,
    #[serde(rename = "hasSpecialPrice")]
    pub has_special_price: bool,
    #[serde(rename = "applicableRules")]
    pub applicable_rules: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_membership_spans_whole_season() {
        let season = Season::starting_in(2025).expect("season");
        let request = AddMembershipRequest::for_season(7, &season, 120.0);
        let json = serde_json::to_value(&request).expect("serialize");
        assert_eq!(json["memberId"], 7);
        assert_eq!(json["seasonId"], 2025);
        assert_eq!(json["seasonStartsAt"], "2025-04-01T00:00:00");
        assert_eq!(json["seasonEndsAt"], "2026-03-31T23:59:59.999");
    }

    #[test]
    fn test_waitlist_request_omits_missing_notes() {
        let request = AddToWaitlistRequest {
            member_id: 5,
            facility_type_id: 1,
            notes: None,
        };
        let json = serde_json::to_string(&request).expect("serialize");
        assert_eq!(json, r#"{"memberId":5,"facilityTypeId":1}"#);
    }
}
