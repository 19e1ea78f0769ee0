//! Core business logic for the polls service.
//!
//! [`VotingWindow`] holds the publish/close predicates. The services layer
//! records votes, keeps the cached counts honest, administers questions and
//! manages accounts.

pub mod lifecycle;
pub mod services;

pub use lifecycle::{RECENT_WINDOW, VotingWindow};
pub use services::*;
