//! API client for the club management backend.
//!
//! This module provides the `ApiClient` struct, the HTTP implementation of
//! [`ClubApi`]. Responses are converted into domain models before they reach
//! the caching layer.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::{
    Address, AddMembershipRequest, AddToWaitlistRequest, CreateMemberRequest,
    CreatePaymentRequest, CreatedPayment, FacilityType, FacilityWithStatus, Member, MemberDetail,
    Membership, PhoneNumber, RentFacilityRequest, RentedFacility, SuggestedPrice,
    UpdatePaymentRequest, WaitlistEntry, WaitlistResponse,
};

use super::{ApiError, ClubApi};

// ============================================================================
// Constants
// ============================================================================

/// Path prefix shared by every backend endpoint
const API_PREFIX: &str = "/api/v1.0";

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// How many times a rate-limited request may be retried. Only reads are
/// repeated; a write is never sent twice.
fn rate_limit_retries(method: &Method) -> u32 {
    if *method == Method::GET {
        MAX_RATE_LIMIT_RETRIES
    } else {
        0
    }
}

/// Query string pairs; `None` values are left out of the URL.
type Query<'a> = [(&'a str, Option<String>)];

/// API client for the club backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client for the backend at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, path)
    }

    fn request(&self, method: Method, path: &str, query: &Query<'_>) -> RequestBuilder {
        let pairs: Vec<(&str, &str)> = query
            .iter()
            .filter_map(|(key, value)| value.as_deref().map(|v| (*key, v)))
            .collect();

        let builder = self.client.request(method, self.url(path)).query(&pairs);
        match self.token {
            Some(ref token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Map a failed write to an error, preferring the backend's `{"error": ...}` message.
    fn write_error(status: StatusCode, body: &str) -> ApiError {
        #[derive(Deserialize)]
        struct ErrorBody {
            error: Option<String>,
        }

        match serde_json::from_str::<ErrorBody>(body) {
            Ok(ErrorBody { error: Some(message) }) if !message.is_empty() => {
                ApiError::Rejected(message)
            }
            _ => ApiError::from_status(status, body),
        }
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(
        response: reqwest::Response,
        on_error: fn(StatusCode, &str) -> ApiError,
    ) -> Result<Option<reqwest::Response>, ApiError> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status() == StatusCode::TOO_MANY_REQUESTS {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(on_error(status, &body))
        }
    }

    /// Send a request, backing off and retrying while the backend rate-limits us.
    async fn send<F>(
        &self,
        build: F,
        max_retries: u32,
        on_error: fn(StatusCode, &str) -> ApiError,
    ) -> Result<reqwest::Response, ApiError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = build().send().await?;
            match Self::check_response_for_retry(response, on_error).await? {
                Some(response) => return Ok(response),
                None => {
                    retries += 1;
                    if retries > max_retries {
                        return Err(ApiError::RateLimited);
                    }
                    warn!(retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2; // Exponential backoff
                }
            }
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &Query<'_>) -> Result<T, ApiError> {
        debug!(path = path, "GET");
        let response = self
            .send(
                || self.request(Method::GET, path, query),
                rate_limit_retries(&Method::GET),
                ApiError::from_status,
            )
            .await?;
        Ok(response.json().await?)
    }

    async fn send_write<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        query: &Query<'_>,
        body: Option<&B>,
    ) -> Result<reqwest::Response, ApiError> {
        debug!(path = path, method = %method, "write");
        let max_retries = rate_limit_retries(&method);
        self.send(
            || {
                let request = self.request(method.clone(), path, query);
                match body {
                    Some(body) => request.json(body),
                    None => request,
                }
            },
            max_retries,
            Self::write_error,
        )
        .await
    }

    async fn write<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        query: &Query<'_>,
        body: Option<&B>,
    ) -> Result<T, ApiError> {
        let response = self.send_write(method, path, query, body).await?;
        Ok(response.json().await?)
    }

    /// Perform a write whose response body carries nothing we keep.
    async fn write_discarding<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<(), ApiError> {
        self.send_write(method, path, &[], body).await?;
        Ok(())
    }
}

#[async_trait]
impl ClubApi for ApiClient {
    async fn fetch_members(&self, season: Option<i64>) -> Result<Vec<Member>, ApiError> {
        self.get("/members", &[("season", season.map(|s| s.to_string()))])
            .await
    }

    async fn fetch_member_detail(
        &self,
        member_id: i64,
        season: Option<i64>,
    ) -> Result<MemberDetail, ApiError> {
        let path = format!("/members/{}", member_id);
        let query = [("season", season.map(|s| s.to_string()))];
        match self.get::<MemberDetailApi>(&path, &query).await {
            Ok(detail) => Ok(detail.into_detail()),
            Err(ApiError::NotFound(_)) => Err(ApiError::NotFound(format!(
                "Member with ID {} not found",
                member_id
            ))),
            Err(e) => Err(e),
        }
    }

    async fn fetch_rented_facilities(
        &self,
        member_id: i64,
        season: Option<i64>,
    ) -> Result<Vec<RentedFacility>, ApiError> {
        let query = [
            ("member_id", Some(member_id.to_string())),
            ("season", season.map(|s| s.to_string())),
        ];
        self.get("/facilities/rented", &query).await
    }

    async fn fetch_facilities_catalog(&self) -> Result<Vec<FacilityType>, ApiError> {
        self.get("/facilities/catalog", &[]).await
    }

    async fn fetch_facilities_by_type(
        &self,
        facility_type_id: i64,
        season: Option<i64>,
    ) -> Result<Vec<FacilityWithStatus>, ApiError> {
        let query = [
            ("facility_type_id", Some(facility_type_id.to_string())),
            ("season", season.map(|s| s.to_string())),
        ];
        self.get("/facilities", &query).await
    }

    async fn fetch_waitlist(&self, facility_type_id: i64) -> Result<WaitlistResponse, ApiError> {
        let query = [("facility_type_id", Some(facility_type_id.to_string()))];
        match self.get("/facilities/waiting-list", &query).await {
            Err(ApiError::NotFound(_)) => {
                debug!(facility_type_id, "No waiting list, treating as empty");
                Ok(WaitlistResponse::empty(facility_type_id))
            }
            other => other,
        }
    }

    async fn fetch_suggested_price(
        &self,
        facility_type_id: i64,
        member_id: i64,
        season: i64,
    ) -> Result<SuggestedPrice, ApiError> {
        let query = [
            ("facility_type_id", Some(facility_type_id.to_string())),
            ("member_id", Some(member_id.to_string())),
            ("season", Some(season.to_string())),
        ];
        self.get("/facilities/suggested-price", &query).await
    }

    async fn create_member(
        &self,
        request: &CreateMemberRequest,
    ) -> Result<MemberDetail, ApiError> {
        let detail: MemberDetailApi = self
            .write(Method::POST, "/members", &[], Some(request))
            .await?;
        Ok(detail.into_detail())
    }

    async fn add_membership(
        &self,
        request: &AddMembershipRequest,
    ) -> Result<MemberDetail, ApiError> {
        let detail: MemberDetailApi = self
            .write(Method::POST, "/memberships", &[], Some(request))
            .await?;
        Ok(detail.into_detail())
    }

    async fn create_payment(
        &self,
        request: &CreatePaymentRequest,
    ) -> Result<CreatedPayment, ApiError> {
        self.write(Method::POST, "/payments", &[], Some(request))
            .await
    }

    async fn update_payment(
        &self,
        payment_id: i64,
        request: &UpdatePaymentRequest,
    ) -> Result<(), ApiError> {
        let path = format!("/payments/{}", payment_id);
        self.write_discarding(Method::PUT, &path, Some(request))
            .await
    }

    async fn delete_payment(&self, payment_id: i64) -> Result<(), ApiError> {
        let path = format!("/payments/{}", payment_id);
        self.write_discarding::<()>(Method::DELETE, &path, None)
            .await
    }

    async fn rent_facility(
        &self,
        request: &RentFacilityRequest,
    ) -> Result<RentedFacility, ApiError> {
        self.write(Method::POST, "/facilities/rented", &[], Some(request))
            .await
    }

    async fn add_to_waitlist(
        &self,
        request: &AddToWaitlistRequest,
    ) -> Result<WaitlistEntry, ApiError> {
        self.write(Method::POST, "/facilities/waiting-list", &[], Some(request))
            .await
    }

    async fn remove_from_waitlist(
        &self,
        member_id: i64,
        facility_type_id: i64,
    ) -> Result<WaitlistEntry, ApiError> {
        let query = [
            ("member_id", Some(member_id.to_string())),
            ("facility_type_id", Some(facility_type_id.to_string())),
        ];
        self.write::<_, ()>(Method::DELETE, "/facilities/waiting-list", &query, None)
            .await
    }
}

// Internal API response types for parsing

/// Member record as returned by the member, create-member and membership endpoints.
#[derive(Debug, Clone, Deserialize)]
struct MemberDetailApi {
    id: i64,
    #[serde(rename = "firstName")]
    first_name: String,
    #[serde(rename = "lastName")]
    last_name: String,
    #[serde(rename = "birthDate")]
    birth_date: chrono::NaiveDate,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    addresses: Vec<Address>,
    #[serde(rename = "phoneNumbers", default)]
    phone_numbers: Option<Vec<PhoneNumberApi>>,
    #[serde(default)]
    memberships: Vec<Membership>,
}

#[derive(Debug, Clone, Deserialize)]
struct PhoneNumberApi {
    #[serde(default)]
    prefix: Option<String>,
    number: String,
}

impl MemberDetailApi {
    fn into_detail(self) -> MemberDetail {
        MemberDetail {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            birth_date: self.birth_date,
            email: self.email.unwrap_or_default(),
            addresses: self.addresses,
            phone_numbers: self
                .phone_numbers
                .unwrap_or_default()
                .into_iter()
                .map(|p| PhoneNumber {
                    number: format!("{}{}", p.prefix.unwrap_or_default(), p.number),
                })
                .collect(),
            memberships: self.memberships,
        }
    }
}
