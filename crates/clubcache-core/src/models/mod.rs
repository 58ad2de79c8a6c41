//! Data models for club entities.
//!
//! This module contains the data structures exchanged with the backend:
//!
//! - `Member`, `MemberDetail`: the member list and the full member record
//! - `FacilityType`, `FacilityWithStatus`, `RentedFacility`: facilities and rentals
//! - `WaitlistEntry`, `WaitlistMemberDetail`: facility waiting lists
//! - `Season`: the April-to-March club year
//! - Request bodies for the write endpoints

pub mod facility;
pub mod member;
pub mod payment;
pub mod requests;
pub mod season;
pub mod waitlist;

pub use facility::{BoatInfo, FacilityType, FacilityWithStatus, RentedFacility};
pub use member::{Address, Member, MemberDetail, Membership, MembershipStatus, PhoneNumber};
pub use payment::Payment;
pub use requests::{
    AddMembershipRequest, AddToWaitlistRequest, AddressInput, CreateMemberRequest,
    CreatePaymentRequest, CreatedPayment, PhoneNumberInput, RentFacilityRequest, SuggestedPrice,
    UpdatePaymentRequest,
};
pub use season::Season;
pub use waitlist::{WaitlistEntry, WaitlistMemberDetail, WaitlistResponse};
