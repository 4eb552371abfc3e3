pub mod http_offer_step_trigger;
