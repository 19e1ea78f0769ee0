//! Common utilities and shared types for polls-rs.
//!
//! This crate provides foundational components used across all polls-rs crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based identifiers and tokens via [`IdGenerator`]
//!
//! # Example
//!
//! ```no_run
//! use polls_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.user_id();
//!     println!("Serving {} as {}", config.server.url, id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;

pub use config::Config;
pub use error::{AppError, AppResult, LOGIN_PATH};
pub use id::IdGenerator;
