//! The object that owns every repository.
//!
//! Construct one `DataService` at start-up and hand references to whatever
//! needs data. Besides the repositories it offers the write workflows: each
//! performs one remote write and then brings the affected caches in line,
//! either by patching the cached lists or by clearing what it cannot patch.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::api::{ApiClient, ApiError, ClubApi};
use crate::cache::DEFAULT_ENTITY_TTL;
use crate::config::Config;
use crate::models::{
    AddMembershipRequest, AddToWaitlistRequest, CreateMemberRequest, CreatePaymentRequest,
    CreatedPayment, MemberDetail, RentFacilityRequest, RentedFacility, SuggestedPrice,
    UpdatePaymentRequest, WaitlistEntry,
};
use crate::repository::{
    FacilitiesByTypeRepository, FacilitiesCatalogRepository, MemberDetailRepository,
    MembersRepository, RentedFacilitiesRepository, WaitlistRepository, DEFAULT_COALESCE_TIMEOUT,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    /// Lifetime of per-entity entries
    pub entity_ttl: Duration,
    pub coalesce_timeout: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            entity_ttl: DEFAULT_ENTITY_TTL,
            coalesce_timeout: DEFAULT_COALESCE_TIMEOUT,
        }
    }
}

pub struct DataService {
    api: Arc<dyn ClubApi>,
    members: Arc<MembersRepository>,
    member_detail: MemberDetailRepository,
    rented_facilities: RentedFacilitiesRepository,
    facilities_catalog: FacilitiesCatalogRepository,
    facilities_by_type: FacilitiesByTypeRepository,
    waitlist: WaitlistRepository,
}

impl DataService {
    pub fn new(api: Arc<dyn ClubApi>, settings: CacheSettings) -> Self {
        let wait = settings.coalesce_timeout;
        let members = Arc::new(MembersRepository::new(Arc::clone(&api), wait));
        Self {
            member_detail: MemberDetailRepository::new(Arc::clone(&api), settings.entity_ttl, wait),
            rented_facilities: RentedFacilitiesRepository::new(
                Arc::clone(&api),
                settings.entity_ttl,
                wait,
            ),
            facilities_catalog: FacilitiesCatalogRepository::new(Arc::clone(&api), wait),
            facilities_by_type: FacilitiesByTypeRepository::new(Arc::clone(&api), wait),
            waitlist: WaitlistRepository::new(Arc::clone(&api), Arc::clone(&members), wait),
            members,
            api,
        }
    }

    /// Build the HTTP client described by `config` and wrap it.
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        let mut client = ApiClient::new(&config.api_base_url, config.request_timeout())?;
        if let Some(token) = &config.auth_token {
            client.set_token(token.clone());
        }
        Ok(Self::new(Arc::new(client), config.cache_settings()))
    }

    pub fn members(&self) -> &MembersRepository {
        &self.members
    }

    pub fn member_detail(&self) -> &MemberDetailRepository {
        &self.member_detail
    }

    pub fn rented_facilities(&self) -> &RentedFacilitiesRepository {
        &self.rented_facilities
    }

    pub fn facilities_catalog(&self) -> &FacilitiesCatalogRepository {
        &self.facilities_catalog
    }

    pub fn facilities_by_type(&self) -> &FacilitiesByTypeRepository {
        &self.facilities_by_type
    }

    pub fn waitlist(&self) -> &WaitlistRepository {
        &self.waitlist
    }

    // ===== Write workflows =====

    pub async fn create_member(
        &self,
        request: &CreateMemberRequest,
    ) -> Result<MemberDetail, ApiError> {
        let created = self.api.create_member(request).await?;
        info!(member_id = created.id, "Member created");
        self.members.clear(None);
        Ok(created)
    }

    pub async fn add_membership(
        &self,
        request: &AddMembershipRequest,
    ) -> Result<MemberDetail, ApiError> {
        let updated = self.api.add_membership(request).await?;
        info!(
            member_id = request.member_id,
            season = request.season_id,
            "Membership added"
        );
        self.member_detail.clear(Some(request.member_id));
        self.members.clear(None);
        Ok(updated)
    }

    /// Rent a facility of `facility_type_id` and record the rental in the cached lists.
    pub async fn rent_facility(
        &self,
        facility_type_id: i64,
        request: &RentFacilityRequest,
    ) -> Result<RentedFacility, ApiError> {
        let rented = self.api.rent_facility(request).await?;
        info!(
            member_id = request.member_id,
            facility_id = request.facility_id,
            "Facility rented"
        );

        let season = Some(request.season_id);
        self.rented_facilities
            .add(request.member_id, season, rented.clone());

        match self.members.member_by_id(season, request.member_id) {
            Some(renter) => {
                self.facilities_by_type.mark_rented(
                    facility_type_id,
                    request.facility_id,
                    &renter,
                    Some(rented.expires_at.to_string()),
                );
            }
            None => self.facilities_by_type.clear(Some(facility_type_id)),
        }

        self.member_detail.clear(Some(request.member_id));
        Ok(rented)
    }

    pub async fn add_to_waitlist(
        &self,
        request: &AddToWaitlistRequest,
    ) -> Result<WaitlistEntry, ApiError> {
        let entry = self.api.add_to_waitlist(request).await?;
        info!(
            member_id = request.member_id,
            facility_type_id = request.facility_type_id,
            "Added to waitlist"
        );
        self.waitlist.add(entry.clone());
        Ok(entry)
    }

    pub async fn remove_from_waitlist(
        &self,
        member_id: i64,
        facility_type_id: i64,
    ) -> Result<WaitlistEntry, ApiError> {
        let removed = self
            .api
            .remove_from_waitlist(member_id, facility_type_id)
            .await?;
        info!(member_id, facility_type_id, "Removed from waitlist");
        self.waitlist.remove(facility_type_id, member_id);
        Ok(removed)
    }

    /// Record a payment for one of `member_id`'s memberships or rentals.
    pub async fn create_payment(
        &self,
        member_id: i64,
        request: &CreatePaymentRequest,
    ) -> Result<CreatedPayment, ApiError> {
        let created = self.api.create_payment(request).await?;
        info!(member_id, payment_id = created.id, "Payment created");
        self.invalidate_payments_of(member_id);
        Ok(created)
    }

    pub async fn update_payment(
        &self,
        member_id: i64,
        payment_id: i64,
        request: &UpdatePaymentRequest,
    ) -> Result<(), ApiError> {
        self.api.update_payment(payment_id, request).await?;
        info!(member_id, payment_id, "Payment updated");
        self.invalidate_payments_of(member_id);
        Ok(())
    }

    pub async fn delete_payment(&self, member_id: i64, payment_id: i64) -> Result<(), ApiError> {
        self.api.delete_payment(payment_id).await?;
        info!(member_id, payment_id, "Payment deleted");
        self.invalidate_payments_of(member_id);
        Ok(())
    }

    fn invalidate_payments_of(&self, member_id: i64) {
        self.member_detail.clear(Some(member_id));
        self.rented_facilities.clear(Some(member_id));
        // Paid flags in the member lists are derived from payments
        self.members.clear(None);
    }

    /// Price the backend suggests for renting a facility type. Not cached.
    pub async fn suggested_price(
        &self,
        facility_type_id: i64,
        member_id: i64,
        season: i64,
    ) -> Result<SuggestedPrice, ApiError> {
        self.api
            .fetch_suggested_price(facility_type_id, member_id, season)
            .await
    }

    pub fn clear_all(&self) {
        info!("Clearing all caches");
        self.members.clear(None);
        self.member_detail.clear(None);
        self.rented_facilities.clear(None);
        self.facilities_catalog.clear();
        self.facilities_by_type.clear(None);
        self.waitlist.clear(None);
    }
}
