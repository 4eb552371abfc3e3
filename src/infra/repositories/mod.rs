pub mod sqlite_appointment_repo;
pub mod sqlite_customer_repo;
pub mod sqlite_reliability_repo;
pub mod sqlite_shop_repo;
pub mod sqlite_slot_repo;
