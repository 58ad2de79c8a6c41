//! Facility catalog, per-type availability and rentals.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Payment;

/// An entry of the facility catalog (boat berth, gym access, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct FacilityType {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "suggestedPrice")]
    pub suggested_price: f64,
}

/// A concrete facility of some type, with its rental status for a season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct FacilityWithStatus {
    pub id: i64,
    #[serde(rename = "facilityTypeId")]
    pub facility_type_id: i64,
    pub identifier: String,
    #[serde(rename = "facilityTypeName")]
    pub facility_type_name: String,
    #[serde(rename = "facilityTypeDescription", default)]
    pub facility_type_description: String,
    #[serde(rename = "suggestedPrice")]
    pub suggested_price: f64,
    #[serde(rename = "isRented")]
    pub is_rented: bool,
    #[serde(rename = "expiresAt", default)]
    pub expires_at: Option<String>,
    #[serde(rename = "rentedByMemberId", default)]
    pub rented_by_member_id: Option<i64>,
    #[serde(rename = "rentedByMemberFirstName", default)]
    pub rented_by_member_first_name: Option<String>,
    #[serde(rename = "rentedByMemberLastName", default)]
    pub rented_by_member_last_name: Option<String>,
}

impl FacilityWithStatus {
    pub fn renter_name(&self) -> Option<String> {
        match (&self.rented_by_member_first_name, &self.rented_by_member_last_name) {
            (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
            (Some(name), None) | (None, Some(name)) => Some(name.clone()),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct BoatInfo {
    pub name: String,
    #[serde(rename = "lengthMeters")]
    pub length_meters: f64,
    #[serde(rename = "widthMeters")]
    pub width_meters: f64,
}

/// A facility rented by a member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct RentedFacility {
    pub id: i64,
    #[serde(rename = "facilityId")]
    pub facility_id: i64,
    #[serde(rename = "facilityIdentifier")]
    pub facility_identifier: String,
    #[serde(rename = "facilityName")]
    pub facility_name: String,
    #[serde(rename = "facilityTypeDescription", default)]
    pub facility_type_description: String,
    #[serde(rename = "rentedAt")]
    pub rented_at: NaiveDate,
    #[serde(rename = "expiresAt")]
    pub expires_at: NaiveDate,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub payment: Option<Payment>,
    #[serde(rename = "boatInfo", default)]
    pub boat_info: Option<BoatInfo>,
}

impl RentedFacility {
    pub fn is_paid(&self) -> bool {
        self.payment.is_some()
    }
}
