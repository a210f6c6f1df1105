//! NcedaHub: small-business onboarding and tiered dashboards.

pub mod api;
pub mod business;
pub mod config;
pub mod dashboard;
pub mod enterprise;
pub mod error;
pub mod hub;
pub mod identity;
pub mod onboarding;
pub mod session;
pub mod store;
