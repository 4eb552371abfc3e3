pub mod cancellation;
pub mod pricing;
pub mod recovery;
pub mod scoring;
