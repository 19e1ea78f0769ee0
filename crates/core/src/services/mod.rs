//! Business logic services.

#![allow(missing_docs)]

pub mod account;
pub mod admin;
pub mod auth_events;
pub mod voting;

pub use account::{AccountService, FORM_NOT_VALID, Session, SignupInput};
pub use admin::{
    ChoiceInput, CreateQuestionInput, PollAdminService, QuestionSummary, UpdateQuestionInput,
};
pub use auth_events::{
    AuthEvent, AuthEventListener, AuthEventListenerService, NoOpAuthEventListener,
    TracingAuthEventListener,
};
pub use voting::{NO_CHOICE_SELECTED, PollResults, VotingService};
