pub mod cancellation;
pub mod health;
pub mod jobs;
