pub mod api;
pub mod currency;
pub mod error;
pub mod form;
pub mod party;
pub mod payment;
pub mod split;
