use crate::domain::models::{
    appointment::Appointment,
    customer::{Customer, Shop},
    pricing::ShopPricingPolicy,
    reliability::{CustomerReliabilityScore, OutcomeCounts},
    slot::{SlotOffer, SlotOpening},
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Per-customer bucketed appointment history feeding the scoring engine.
#[derive(Debug, Clone)]
pub struct CustomerOutcomeHistory {
    pub customer_id: String,
    pub last_30: OutcomeCounts,
    pub days_31_90: OutcomeCounts,
    pub over_90: OutcomeCounts,
    pub voided_90d: i64,
    pub no_shows_90d: i64,
}

/// Candidate row for the offer loop: customer joined with their stored score.
#[derive(Debug, Clone)]
pub struct OfferCandidate {
    pub customer_id: String,
    pub phone: String,
    pub tier: Option<String>,
    pub score: Option<i64>,
    pub no_shows_90d: i64,
}

#[derive(Debug)]
pub enum InsertOutcome<T> {
    Created(T),
    AlreadyExists,
}

#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    async fn create(&self, appointment: &Appointment) -> Result<Appointment, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Appointment>, AppError>;
    /// Conditional booked -> cancelled transition; None when the row was
    /// already resolved by a concurrent actor.
    async fn resolve_cancellation(
        &self,
        id: &str,
        outcome: &str,
        reason: &str,
        source: Option<&str>,
    ) -> Result<Option<Appointment>, AppError>;
    async fn aggregate_outcome_history(
        &self,
        shop_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<CustomerOutcomeHistory>, AppError>;
}

#[async_trait]
pub trait SlotRepository: Send + Sync {
    /// Insert keyed by (shop, time range, source appointment); a uniqueness
    /// violation is reported as AlreadyExists, never as an error.
    async fn create_opening(&self, opening: &SlotOpening) -> Result<InsertOutcome<SlotOpening>, AppError>;
    async fn find_opening(&self, id: &str) -> Result<Option<SlotOpening>, AppError>;
    async fn transition_opening(&self, id: &str, from: &str, to: &str) -> Result<bool, AppError>;
    async fn create_offer(&self, offer: &SlotOffer) -> Result<InsertOutcome<SlotOffer>, AppError>;
    async fn find_offer(&self, id: &str) -> Result<Option<SlotOffer>, AppError>;
    async fn find_sent_offer_for_opening(&self, opening_id: &str) -> Result<Option<SlotOffer>, AppError>;
    /// Sent offers past their deadline whose opening is still open.
    async fn find_due_offers(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<SlotOffer>, AppError>;
    async fn transition_offer(&self, id: &str, from: &str, to: &str) -> Result<bool, AppError>;
}

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn create(&self, customer: &Customer) -> Result<Customer, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Customer>, AppError>;
    /// Consenting customers of the shop with no booked appointment
    /// overlapping [start, end), joined with their stored score.
    async fn list_offer_candidates(
        &self,
        shop_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<OfferCandidate>, AppError>;
}

#[async_trait]
pub trait ShopRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Shop>, AppError>;
    async fn find_pricing_policy(&self, shop_id: &str) -> Result<Option<ShopPricingPolicy>, AppError>;
}

#[async_trait]
pub trait ReliabilityRepository: Send + Sync {
    async fn upsert(&self, score: &CustomerReliabilityScore) -> Result<(), AppError>;
    async fn find(&self, customer_id: &str, shop_id: &str) -> Result<Option<CustomerReliabilityScore>, AppError>;
}

#[async_trait]
pub trait MessagingService: Send + Sync {
    /// Returns the provider message id on success.
    async fn send(&self, to: &str, body: &str) -> Result<String, AppError>;
}

/// Best-effort external trigger that re-runs the offer-loop step for a slot.
#[async_trait]
pub trait OfferStepTrigger: Send + Sync {
    async fn trigger(&self, slot_opening_id: &str) -> Result<(), AppError>;
}

/// Shared store of expiring entries: named advisory locks for scheduled
/// jobs, plus per-customer contact cooldown flags.
#[async_trait]
pub trait ControlStore: Send + Sync {
    async fn try_acquire_lock(&self, name: &str) -> Result<bool, AppError>;
    async fn release_lock(&self, name: &str) -> Result<(), AppError>;
    async fn is_in_cooldown(&self, customer_id: &str) -> Result<bool, AppError>;
    async fn set_cooldown(&self, customer_id: &str, ttl_minutes: i64) -> Result<(), AppError>;
}
