use std::sync::Arc;

use chrono::{Duration, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::models::appointment::Appointment;
use crate::domain::models::reliability::Tier;
use crate::domain::models::slot::{
    SlotOffer, SlotOpening, OFFER_EXPIRED, OFFER_SENT, OPENING_EXPIRED, OPENING_OPEN,
};
use crate::domain::ports::{
    ControlStore, CustomerRepository, InsertOutcome, MessagingService, OfferCandidate,
    OfferStepTrigger, ShopRepository, SlotRepository,
};
use crate::domain::services::pricing::{derive_payment_requirement, resolve_tier_pricing};
use crate::error::AppError;

pub const EXPIRY_SWEEP_LOCK: &str = "offer_expiry_sweep";

/// Stored-score threshold at which a customer counts as high no-show risk.
const HIGH_NO_SHOW_THRESHOLD: i64 = 2;

/// Neutral ranking defaults for customers without a stored score.
const DEFAULT_RANKING_SCORE: i64 = 50;

#[derive(Clone)]
pub struct RecoveryConfig {
    pub offer_window_minutes: i64,
    pub contact_cooldown_minutes: i64,
    pub sweep_batch_size: i64,
    pub claim_base_url: String,
}

#[derive(Debug, Serialize)]
pub struct OfferStepOutcome {
    pub success: bool,
    pub skipped: bool,
    pub completed: bool,
    pub reason: String,
    pub offered_customer_id: Option<String>,
    pub offered_phone: Option<String>,
}

impl OfferStepOutcome {
    fn skipped(reason: impl Into<String>) -> Self {
        Self {
            success: true,
            skipped: true,
            completed: false,
            reason: reason.into(),
            offered_customer_id: None,
            offered_phone: None,
        }
    }

    fn completed(reason: impl Into<String>) -> Self {
        Self {
            success: true,
            skipped: false,
            completed: true,
            reason: reason.into(),
            offered_customer_id: None,
            offered_phone: None,
        }
    }

    fn offered(candidate: &OfferCandidate) -> Self {
        Self {
            success: true,
            skipped: false,
            completed: false,
            reason: "offer_sent".to_string(),
            offered_customer_id: Some(candidate.customer_id.clone()),
            offered_phone: Some(candidate.phone.clone()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SweepOutcome {
    pub skipped: bool,
    pub reason: Option<String>,
    pub considered: usize,
    pub expired: usize,
    pub triggered: usize,
    pub errors: Vec<String>,
}

impl SweepOutcome {
    fn locked() -> Self {
        Self {
            skipped: true,
            reason: Some("locked".to_string()),
            considered: 0,
            expired: 0,
            triggered: 0,
            errors: Vec::new(),
        }
    }
}

/// Owns the open -> filled/expired lifecycle of a SlotOpening and the
/// sent -> expired lifecycle of its SlotOffers. All transitions go through
/// conditional updates keyed on the expected prior status, so concurrent
/// job runs lose races instead of double-transitioning.
pub struct SlotRecoveryService {
    slot_repo: Arc<dyn SlotRepository>,
    customer_repo: Arc<dyn CustomerRepository>,
    shop_repo: Arc<dyn ShopRepository>,
    control: Arc<dyn ControlStore>,
    messaging: Arc<dyn MessagingService>,
    trigger: Arc<dyn OfferStepTrigger>,
    config: RecoveryConfig,
}

pub struct SlotRecoveryDeps {
    pub slot_repo: Arc<dyn SlotRepository>,
    pub customer_repo: Arc<dyn CustomerRepository>,
    pub shop_repo: Arc<dyn ShopRepository>,
    pub control: Arc<dyn ControlStore>,
    pub messaging: Arc<dyn MessagingService>,
    pub trigger: Arc<dyn OfferStepTrigger>,
}

impl SlotRecoveryService {
    pub fn new(deps: SlotRecoveryDeps, config: RecoveryConfig) -> Self {
        Self {
            slot_repo: deps.slot_repo,
            customer_repo: deps.customer_repo,
            shop_repo: deps.shop_repo,
            control: deps.control,
            messaging: deps.messaging,
            trigger: deps.trigger,
            config,
        }
    }

    /// Creates a slot opening for a cancelled, paid, still-future
    /// appointment. Duplicate creation (concurrent cancellation handling)
    /// is silent; trigger failures are logged and never raised, since the
    /// expiry sweep will re-run the step eventually.
    pub async fn create_opening_from_cancellation(
        &self,
        appointment: &Appointment,
    ) -> Result<Option<SlotOpening>, AppError> {
        if !appointment.is_paid() {
            return Ok(None);
        }
        if appointment.start_time <= Utc::now() {
            return Ok(None);
        }

        let opening = SlotOpening::from_cancelled_appointment(appointment);
        match self.slot_repo.create_opening(&opening).await? {
            InsertOutcome::Created(created) => {
                info!(
                    "Created slot opening {} from appointment {}",
                    created.id, appointment.id
                );
                if let Err(e) = self.trigger.trigger(&created.id).await {
                    warn!(
                        "Offer-step trigger failed for new opening {}: {}",
                        created.id, e
                    );
                }
                Ok(Some(created))
            }
            InsertOutcome::AlreadyExists => {
                debug!(
                    "Slot opening for appointment {} already exists",
                    appointment.id
                );
                Ok(None)
            }
        }
    }

    /// Ranked eligible candidates for an opening. Read-only; repeated runs
    /// without state change produce the same order.
    pub async fn select_candidates(
        &self,
        opening: &SlotOpening,
    ) -> Result<Vec<OfferCandidate>, AppError> {
        let policy = self.shop_repo.find_pricing_policy(&opening.shop_id).await?;
        let exclude_risk = policy.as_ref().is_some_and(|p| p.exclude_risk_tier);
        let exclude_no_show = policy.as_ref().is_some_and(|p| p.exclude_high_no_show_risk);

        let rows = self
            .customer_repo
            .list_offer_candidates(&opening.shop_id, opening.start_time, opening.end_time)
            .await?;

        let mut candidates = Vec::with_capacity(rows.len());
        for row in rows {
            let tier = row.tier.as_deref().and_then(Tier::parse);

            // Top tier is always eligible; exclusion flags apply below it.
            if tier != Some(Tier::Top) {
                if exclude_risk && tier == Some(Tier::Risk) {
                    continue;
                }
                if exclude_no_show && row.no_shows_90d >= HIGH_NO_SHOW_THRESHOLD {
                    continue;
                }
            }

            if self.control.is_in_cooldown(&row.customer_id).await? {
                continue;
            }

            candidates.push(row);
        }

        candidates.sort_by(|a, b| {
            let tier_a = a.tier.as_deref().and_then(Tier::parse).unwrap_or(Tier::Neutral);
            let tier_b = b.tier.as_deref().and_then(Tier::parse).unwrap_or(Tier::Neutral);
            let score_a = a.score.unwrap_or(DEFAULT_RANKING_SCORE);
            let score_b = b.score.unwrap_or(DEFAULT_RANKING_SCORE);
            tier_a
                .priority()
                .cmp(&tier_b.priority())
                .then(score_b.cmp(&score_a))
                .then(a.customer_id.cmp(&b.customer_id))
        });

        Ok(candidates)
    }

    /// Sends one offer to the candidate. Cooldown is set before the offer
    /// row is inserted so a re-run cannot recontact the same customer; a
    /// transport failure leaves the sent row in place for the sweep to
    /// retire. Returns None when another run already holds the sent slot.
    pub async fn send_offer(
        &self,
        opening: &SlotOpening,
        candidate: &OfferCandidate,
    ) -> Result<Option<SlotOffer>, AppError> {
        self.control
            .set_cooldown(&candidate.customer_id, self.config.contact_cooldown_minutes)
            .await?;

        let expires_at = Utc::now() + Duration::minutes(self.config.offer_window_minutes);
        let offer = SlotOffer::new(
            opening.id.clone(),
            candidate.customer_id.clone(),
            expires_at,
        );

        let offer = match self.slot_repo.create_offer(&offer).await? {
            InsertOutcome::Created(created) => created,
            InsertOutcome::AlreadyExists => {
                debug!("Opening {} already has a sent offer", opening.id);
                return Ok(None);
            }
        };

        let body = self.offer_message(opening, candidate, &offer).await?;
        match self.messaging.send(&candidate.phone, &body).await {
            Ok(provider_message_id) => {
                info!(
                    "Offer {} sent to customer {} (provider message {})",
                    offer.id, candidate.customer_id, provider_message_id
                );
            }
            Err(e) => {
                // The offer stays in "sent" state so the sweep can retire it.
                warn!(
                    "Message transport failed for offer {} to customer {}: {}",
                    offer.id, candidate.customer_id, e
                );
            }
        }

        Ok(Some(offer))
    }

    /// One offer-loop step for a slot opening: pick the best eligible
    /// candidate and contact them, or retire the opening when nobody is
    /// left to ask.
    pub async fn run_offer_step(&self, opening_id: &str) -> Result<OfferStepOutcome, AppError> {
        let Some(opening) = self.slot_repo.find_opening(opening_id).await? else {
            return Ok(OfferStepOutcome::skipped("slot_not_found"));
        };

        if opening.status != OPENING_OPEN {
            return Ok(OfferStepOutcome::skipped(format!("slot_status_{}", opening.status)));
        }

        // Cheap pre-check so a replayed step does not burn a candidate's
        // cooldown before losing the insert race below.
        if self
            .slot_repo
            .find_sent_offer_for_opening(&opening.id)
            .await?
            .is_some()
        {
            return Ok(OfferStepOutcome::skipped("offer_already_outstanding"));
        }

        let candidates = self.select_candidates(&opening).await?;
        let Some(first) = candidates.first() else {
            // Conditional: a concurrent accept may have filled the slot.
            self.slot_repo
                .transition_opening(&opening.id, OPENING_OPEN, OPENING_EXPIRED)
                .await?;
            info!("Slot opening {} expired: no eligible customers", opening.id);
            return Ok(OfferStepOutcome::completed("no_eligible_customers"));
        };

        match self.send_offer(&opening, first).await? {
            Some(_) => Ok(OfferStepOutcome::offered(first)),
            None => Ok(OfferStepOutcome::skipped("offer_already_outstanding")),
        }
    }

    /// Expiry sweep: under a non-blocking named lock, retire sent offers
    /// past their deadline and re-trigger the offer loop for their slots.
    pub async fn run_expiry_sweep(&self) -> Result<SweepOutcome, AppError> {
        if !self.control.try_acquire_lock(EXPIRY_SWEEP_LOCK).await? {
            info!("Expiry sweep skipped: lock already held");
            return Ok(SweepOutcome::locked());
        }

        let result = self.sweep_batch().await;

        // Release on every exit path, including failures mid-batch.
        if let Err(e) = self.control.release_lock(EXPIRY_SWEEP_LOCK).await {
            warn!("Failed to release {} lock: {}", EXPIRY_SWEEP_LOCK, e);
        }

        result
    }

    async fn sweep_batch(&self) -> Result<SweepOutcome, AppError> {
        let now = Utc::now();
        let due = self
            .slot_repo
            .find_due_offers(now, self.config.sweep_batch_size)
            .await?;

        let mut outcome = SweepOutcome {
            skipped: false,
            reason: None,
            considered: due.len(),
            expired: 0,
            triggered: 0,
            errors: Vec::new(),
        };

        for offer in due {
            let flipped = match self
                .slot_repo
                .transition_offer(&offer.id, OFFER_SENT, OFFER_EXPIRED)
                .await
            {
                Ok(flipped) => flipped,
                Err(e) => {
                    outcome
                        .errors
                        .push(format!("offer {}: {}", offer.id, e));
                    continue;
                }
            };

            if !flipped {
                // Already resolved by a concurrent actor; not an error.
                continue;
            }

            outcome.expired += 1;
            info!(
                "Offer {} expired for opening {}",
                offer.id, offer.slot_opening_id
            );

            match self.trigger.trigger(&offer.slot_opening_id).await {
                Ok(()) => outcome.triggered += 1,
                Err(e) => outcome.errors.push(format!(
                    "trigger for opening {}: {}",
                    offer.slot_opening_id, e
                )),
            }
        }

        Ok(outcome)
    }

    async fn offer_message(
        &self,
        opening: &SlotOpening,
        candidate: &OfferCandidate,
        offer: &SlotOffer,
    ) -> Result<String, AppError> {
        let shop = self
            .shop_repo
            .find_by_id(&opening.shop_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Shop {} not found", opening.shop_id)))?;

        let tz: Tz = shop.timezone.parse().unwrap_or(chrono_tz::UTC);
        let slot_time = opening.start_time.with_timezone(&tz).format("%Y-%m-%d %H:%M");
        let claim_link = format!("{}/claim/{}", self.config.claim_base_url, offer.claim_token);

        let deposit_line = match self.shop_repo.find_pricing_policy(&opening.shop_id).await? {
            Some(policy) => {
                let tier = candidate.tier.as_deref().and_then(Tier::parse);
                let resolved = resolve_tier_pricing(tier, &policy.base(), &policy.tier_overrides());
                let requirement =
                    derive_payment_requirement(resolved.payment_mode, resolved.deposit_amount_cents);
                if requirement.payment_required {
                    format!(
                        " A deposit of ${:.2} is required to claim it.",
                        requirement.amount_cents as f64 / 100.0
                    )
                } else {
                    String::new()
                }
            }
            None => String::new(),
        };

        Ok(format!(
            "{}: a slot on {} just opened up.{} Claim it here: {}",
            shop.name, slot_time, deposit_line, claim_link
        ))
    }
}
