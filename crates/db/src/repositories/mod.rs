//! Repository layer over the sea-orm entities.

mod choice;
mod question;
mod user;
mod vote;

pub use choice::ChoiceRepository;
pub use question::QuestionRepository;
pub use user::UserRepository;
pub use vote::VoteRepository;
