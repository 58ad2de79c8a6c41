//! REST API access for the club backend.
//!
//! `ClubApi` is the seam between the caching repositories and the network:
//! one method per remote read or write. `ApiClient` implements it over HTTP;
//! tests substitute in-memory implementations.

pub mod client;
pub mod error;

use async_trait::async_trait;

use crate::models::{
    AddMembershipRequest, AddToWaitlistRequest, CreateMemberRequest, CreatePaymentRequest,
    CreatedPayment, FacilityType, FacilityWithStatus, Member, MemberDetail, RentFacilityRequest,
    RentedFacility, SuggestedPrice, UpdatePaymentRequest, WaitlistEntry, WaitlistResponse,
};

pub use client::ApiClient;
pub use error::ApiError;

#[async_trait]
pub trait ClubApi: Send + Sync {
    async fn fetch_members(&self, season: Option<i64>) -> Result<Vec<Member>, ApiError>;

    /// Fails with `ApiError::NotFound` when the member does not exist.
    async fn fetch_member_detail(
        &self,
        member_id: i64,
        season: Option<i64>,
    ) -> Result<MemberDetail, ApiError>;

    async fn fetch_rented_facilities(
        &self,
        member_id: i64,
        season: Option<i64>,
    ) -> Result<Vec<RentedFacility>, ApiError>;

    async fn fetch_facilities_catalog(&self) -> Result<Vec<FacilityType>, ApiError>;

    async fn fetch_facilities_by_type(
        &self,
        facility_type_id: i64,
        season: Option<i64>,
    ) -> Result<Vec<FacilityWithStatus>, ApiError>;

    /// A facility type without a waiting list yields an empty response, not an error.
    async fn fetch_waitlist(&self, facility_type_id: i64) -> Result<WaitlistResponse, ApiError>;

    async fn fetch_suggested_price(
        &self,
        facility_type_id: i64,
        member_id: i64,
        season: i64,
    ) -> Result<SuggestedPrice, ApiError>;

    async fn create_member(&self, request: &CreateMemberRequest)
        -> Result<MemberDetail, ApiError>;

    async fn add_membership(
        &self,
        request: &AddMembershipRequest,
    ) -> Result<MemberDetail, ApiError>;

    async fn create_payment(
        &self,
        request: &CreatePaymentRequest,
    ) -> Result<CreatedPayment, ApiError>;

    async fn update_payment(
        &self,
        payment_id: i64,
        request: &UpdatePaymentRequest,
    ) -> Result<(), ApiError>;

    async fn delete_payment(&self, payment_id: i64) -> Result<(), ApiError>;

    async fn rent_facility(&self, request: &RentFacilityRequest)
        -> Result<RentedFacility, ApiError>;

    async fn add_to_waitlist(
        &self,
        request: &AddToWaitlistRequest,
    ) -> Result<WaitlistEntry, ApiError>;

    async fn remove_from_waitlist(
        &self,
        member_id: i64,
        facility_type_id: i64,
    ) -> Result<WaitlistEntry, ApiError>;
}
