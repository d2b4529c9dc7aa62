//! Command-line front end for land-deal payment splits.
//!
//! The binary drives a [`landdeal_common::form::SplitForm`] from a JSON
//! request file and talks to the land-deals backend through
//! [`client::HttpPaymentApi`].

pub mod cache;
pub mod client;
pub mod config;
pub mod report;
pub mod request;
