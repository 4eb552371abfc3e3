pub mod appointment;
pub mod customer;
pub mod pricing;
pub mod reliability;
pub mod slot;
