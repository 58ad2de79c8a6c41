//! In-memory `ClubApi` and fixtures for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};

use crate::api::{ApiError, ClubApi};
use crate::models::{
    AddMembershipRequest, AddToWaitlistRequest, CreateMemberRequest, CreatePaymentRequest,
    CreatedPayment, FacilityType, FacilityWithStatus, Member, MemberDetail, Membership,
    MembershipStatus, Payment, RentFacilityRequest, RentedFacility, SuggestedPrice,
    UpdatePaymentRequest, WaitlistEntry, WaitlistResponse,
};

/// Backend double that serves canned data, counts calls per method and can
/// be told to fail every call or to answer slowly.
#[derive(Default)]
pub(crate) struct FakeApi {
    members: Mutex<Vec<Member>>,
    details: Mutex<HashMap<i64, MemberDetail>>,
    rentals: Mutex<HashMap<i64, Vec<RentedFacility>>>,
    catalog: Mutex<Vec<FacilityType>>,
    facilities: Mutex<Vec<FacilityWithStatus>>,
    waitlists: Mutex<HashMap<i64, Vec<WaitlistEntry>>>,
    failure: Mutex<Option<ApiError>>,
    latency: Mutex<Duration>,
    calls: Mutex<HashMap<&'static str, usize>>,
    next_id: Mutex<i64>,
}

impl FakeApi {
    pub fn set_members(&self, members: Vec<Member>) {
        *self.members.lock().unwrap() = members;
    }

    pub fn set_detail(&self, detail: MemberDetail) {
        self.details.lock().unwrap().insert(detail.id, detail);
    }

    pub fn set_rentals(&self, member_id: i64, rentals: Vec<RentedFacility>) {
        self.rentals.lock().unwrap().insert(member_id, rentals);
    }

    pub fn set_catalog(&self, catalog: Vec<FacilityType>) {
        *self.catalog.lock().unwrap() = catalog;
    }

    pub fn set_facilities(&self, facilities: Vec<FacilityWithStatus>) {
        *self.facilities.lock().unwrap() = facilities;
    }

    pub fn set_waitlist(&self, facility_type_id: i64, entries: Vec<WaitlistEntry>) {
        self.waitlists
            .lock()
            .unwrap()
            .insert(facility_type_id, entries);
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    pub fn fail_with(&self, error: ApiError) {
        *self.failure.lock().unwrap() = Some(error);
    }

    pub fn recover(&self) {
        *self.failure.lock().unwrap() = None;
    }

    pub fn calls(&self, method: &str) -> usize {
        self.calls.lock().unwrap().get(method).copied().unwrap_or(0)
    }

    async fn enter(&self, method: &'static str) -> Result<(), ApiError> {
        *self.calls.lock().unwrap().entry(method).or_insert(0) += 1;
        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        match self.failure.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn next_id(&self) -> i64 {
        let mut id = self.next_id.lock().unwrap();
        *id += 1;
        1000 + *id
    }
}

#[async_trait]
impl ClubApi for FakeApi {
    async fn fetch_members(&self, _season: Option<i64>) -> Result<Vec<Member>, ApiError> {
        self.enter("fetch_members").await?;
        Ok(self.members.lock().unwrap().clone())
    }

    async fn fetch_member_detail(
        &self,
        member_id: i64,
        _season: Option<i64>,
    ) -> Result<MemberDetail, ApiError> {
        self.enter("fetch_member_detail").await?;
        self.details
            .lock()
            .unwrap()
            .get(&member_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("Member with ID {} not found", member_id)))
    }

    async fn fetch_rented_facilities(
        &self,
        member_id: i64,
        _season: Option<i64>,
    ) -> Result<Vec<RentedFacility>, ApiError> {
        self.enter("fetch_rented_facilities").await?;
        Ok(self
            .rentals
            .lock()
            .unwrap()
            .get(&member_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_facilities_catalog(&self) -> Result<Vec<FacilityType>, ApiError> {
        self.enter("fetch_facilities_catalog").await?;
        Ok(self.catalog.lock().unwrap().clone())
    }

    async fn fetch_facilities_by_type(
        &self,
        facility_type_id: i64,
        _season: Option<i64>,
    ) -> Result<Vec<FacilityWithStatus>, ApiError> {
        self.enter("fetch_facilities_by_type").await?;
        Ok(self
            .facilities
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.facility_type_id == facility_type_id)
            .cloned()
            .collect())
    }

    async fn fetch_waitlist(&self, facility_type_id: i64) -> Result<WaitlistResponse, ApiError> {
        self.enter("fetch_waitlist").await?;
        Ok(WaitlistResponse {
            facility_type_id,
            entries: self
                .waitlists
                .lock()
                .unwrap()
                .get(&facility_type_id)
                .cloned()
                .unwrap_or_default(),
        })
    }

    async fn fetch_suggested_price(
        &self,
        facility_type_id: i64,
        _member_id: i64,
        _season: i64,
    ) -> Result<SuggestedPrice, ApiError> {
        self.enter("fetch_suggested_price").await?;
        let base = self
            .catalog
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == facility_type_id)
            .map(|t| t.suggested_price)
            .unwrap_or(0.0);
        Ok(SuggestedPrice {
            suggested_price: base,
            base_price: base,
            savings_amount: 0.0,
            has_special_price: false,
            applicable_rules: 0,
        })
    }

    async fn create_member(
        &self,
        request: &CreateMemberRequest,
    ) -> Result<MemberDetail, ApiError> {
        self.enter("create_member").await?;
        let mut created = detail(self.next_id(), &request.first_name, &request.last_name);
        created.birth_date = request.birth_date;
        created.email = request.email.clone();
        self.set_detail(created.clone());
        Ok(created)
    }

    async fn add_membership(
        &self,
        request: &AddMembershipRequest,
    ) -> Result<MemberDetail, ApiError> {
        self.enter("add_membership").await?;
        let mut details = self.details.lock().unwrap();
        let member = details.get_mut(&request.member_id).ok_or_else(|| {
            ApiError::NotFound(format!("Member with ID {} not found", request.member_id))
        })?;
        member.memberships.push(Membership {
            id: request.season_id,
            number: request.member_id,
            status: MembershipStatus::Active,
            valid_from: request.season_starts_at.date(),
            expires_at: request.season_ends_at.date(),
            price: Some(request.price),
            payment: None,
        });
        Ok(member.clone())
    }

    async fn create_payment(
        &self,
        _request: &CreatePaymentRequest,
    ) -> Result<CreatedPayment, ApiError> {
        self.enter("create_payment").await?;
        Ok(CreatedPayment { id: self.next_id() })
    }

    async fn update_payment(
        &self,
        _payment_id: i64,
        _request: &UpdatePaymentRequest,
    ) -> Result<(), ApiError> {
        self.enter("update_payment").await
    }

    async fn delete_payment(&self, _payment_id: i64) -> Result<(), ApiError> {
        self.enter("delete_payment").await
    }

    async fn rent_facility(
        &self,
        request: &RentFacilityRequest,
    ) -> Result<RentedFacility, ApiError> {
        self.enter("rent_facility").await?;
        let mut rented = rental(self.next_id(), request.facility_id);
        rented.price = Some(request.price);
        Ok(rented)
    }

    async fn add_to_waitlist(
        &self,
        request: &AddToWaitlistRequest,
    ) -> Result<WaitlistEntry, ApiError> {
        self.enter("add_to_waitlist").await?;
        let mut entry = waitlist_entry(self.next_id(), request.member_id, request.facility_type_id);
        entry.notes = request.notes.clone();
        self.waitlists
            .lock()
            .unwrap()
            .entry(request.facility_type_id)
            .or_default()
            .push(entry.clone());
        Ok(entry)
    }

    async fn remove_from_waitlist(
        &self,
        member_id: i64,
        facility_type_id: i64,
    ) -> Result<WaitlistEntry, ApiError> {
        self.enter("remove_from_waitlist").await?;
        let mut waitlists = self.waitlists.lock().unwrap();
        let queue = waitlists.entry(facility_type_id).or_default();
        let index = queue
            .iter()
            .position(|e| e.member_id == member_id)
            .ok_or_else(|| ApiError::NotFound("Waitlist entry not found".to_string()))?;
        Ok(queue.remove(index))
    }
}

pub(crate) fn member(id: i64, first_name: &str, last_name: &str) -> Member {
    Member {
        id,
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        birth_date: None,
        email: None,
        membership_number: None,
        membership_status: None,
        membership_paid: false,
        has_unpaid_facilities: false,
    }
}

pub(crate) fn detail(id: i64, first_name: &str, last_name: &str) -> MemberDetail {
    MemberDetail {
        id,
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        birth_date: date(1990, 1, 1),
        email: format!("{}@example.com", first_name.to_lowercase()),
        addresses: Vec::new(),
        phone_numbers: Vec::new(),
        memberships: Vec::new(),
    }
}

pub(crate) fn rental(id: i64, facility_id: i64) -> RentedFacility {
    RentedFacility {
        id,
        facility_id,
        facility_identifier: format!("F-{}", facility_id),
        facility_name: "Berth".to_string(),
        facility_type_description: "Sea berth".to_string(),
        rented_at: date(2025, 4, 1),
        expires_at: date(2026, 3, 31),
        price: None,
        payment: None,
        boat_info: None,
    }
}

pub(crate) fn paid(mut rented: RentedFacility) -> RentedFacility {
    rented.payment = Some(Payment {
        id: Some(1),
        amount: 100.0,
        currency: "EUR".to_string(),
        paid_at: Utc.with_ymd_and_hms(2025, 4, 2, 10, 0, 0).unwrap(),
        payment_method: Some("cash".to_string()),
        transaction_ref: None,
    });
    rented
}

pub(crate) fn facility_type(id: i64, name: &str) -> FacilityType {
    FacilityType {
        id,
        name: name.to_string(),
        description: format!("{} description", name),
        suggested_price: 100.0,
    }
}

pub(crate) fn facility(id: i64, facility_type_id: i64, identifier: &str) -> FacilityWithStatus {
    FacilityWithStatus {
        id,
        facility_type_id,
        identifier: identifier.to_string(),
        facility_type_name: "Berth".to_string(),
        facility_type_description: "Sea berth".to_string(),
        suggested_price: 100.0,
        is_rented: false,
        expires_at: None,
        rented_by_member_id: None,
        rented_by_member_first_name: None,
        rented_by_member_last_name: None,
    }
}

pub(crate) fn waitlist_entry(id: i64, member_id: i64, facility_type_id: i64) -> WaitlistEntry {
    WaitlistEntry {
        id,
        member_id,
        facility_type_id,
        queued_at: "2025-05-01T09:00:00".to_string(),
        notes: None,
    }
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}
