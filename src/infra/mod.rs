pub mod control;
pub mod factory;
pub mod messaging;
pub mod repositories;
pub mod trigger;
