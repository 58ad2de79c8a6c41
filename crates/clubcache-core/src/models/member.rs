//! Member and member-detail models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Payment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "UPPERCASE")]
pub enum MembershipStatus {
    Active,
    Suspended,
    Expired,
}

impl std::fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MembershipStatus::Active => write!(f, "ACTIVE"),
            MembershipStatus::Suspended => write!(f, "SUSPENDED"),
            MembershipStatus::Expired => write!(f, "EXPIRED"),
        }
    }
}

/// A row of the member list for one season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Member {
    pub id: i64,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    #[serde(rename = "birthDate", default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "membershipNumber", default)]
    pub membership_number: Option<i64>,
    #[serde(rename = "membershipStatus", default)]
    pub membership_status: Option<MembershipStatus>,
    #[serde(rename = "membershipPaid", default)]
    pub membership_paid: bool,
    #[serde(rename = "hasUnpaidFacilities", default)]
    pub has_unpaid_facilities: bool,
}

impl Member {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Address {
    pub country: String,
    pub city: String,
    #[serde(rename = "zipCode")]
    pub zip_code: String,
    pub street: String,
    // The backend calls it streetNumber
    #[serde(alias = "streetNumber")]
    pub number: String,
}

impl Address {
    /// Format the address as a single line.
    pub fn formatted(&self) -> String {
        let street = format!("{} {}", self.street, self.number);
        [street.trim(), self.zip_code.trim(), self.city.trim(), self.country.trim()]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct PhoneNumber {
    pub number: String,
}

/// One membership period of a member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Membership {
    pub id: i64,
    pub number: i64,
    pub status: MembershipStatus,
    #[serde(rename = "validFrom")]
    pub valid_from: NaiveDate,
    #[serde(rename = "expiresAt")]
    pub expires_at: NaiveDate,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub payment: Option<Payment>,
}

impl Membership {
    pub fn is_paid(&self) -> bool {
        self.payment.is_some()
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.valid_from <= date && date <= self.expires_at
    }
}

/// Full record of a single member, as shown on the member page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct MemberDetail {
    pub id: i64,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    #[serde(rename = "birthDate")]
    pub birth_date: NaiveDate,
    pub email: String,
    #[serde(default)]
    pub addresses: Vec<Address>,
    #[serde(rename = "phoneNumbers", default)]
    pub phone_numbers: Vec<PhoneNumber>,
    #[serde(default)]
    pub memberships: Vec<Membership>,
}

impl MemberDetail {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// The membership period covering `date`, if any.
    pub fn membership_on(&self, date: NaiveDate) -> Option<&Membership> {
        self.memberships.iter().find(|m| m.covers(date))
    }
}
