use std::sync::Arc;
use crate::domain::ports::{
    AppointmentRepository, ControlStore, CustomerRepository, MessagingService, OfferStepTrigger,
    ReliabilityRepository, ShopRepository, SlotRepository,
};
use crate::domain::services::recovery::SlotRecoveryService;
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub appointment_repo: Arc<dyn AppointmentRepository>,
    pub shop_repo: Arc<dyn ShopRepository>,
    pub customer_repo: Arc<dyn CustomerRepository>,
    pub slot_repo: Arc<dyn SlotRepository>,
    pub reliability_repo: Arc<dyn ReliabilityRepository>,
    pub control: Arc<dyn ControlStore>,
    pub messaging: Arc<dyn MessagingService>,
    pub trigger: Arc<dyn OfferStepTrigger>,
    pub recovery: Arc<SlotRecoveryService>,
}
