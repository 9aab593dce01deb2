//! Domain types and DTOs
//!
//! Request and response types for profiles, portfolios, messages and search.

pub mod auth;
pub mod messages;
pub mod portfolio;
pub mod profiles;
pub mod search;

