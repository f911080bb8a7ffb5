//! Port contracts for the board workflow engine.
//!
//! Ports define infrastructure-agnostic interfaces used by workflow
//! services.

pub mod repository;

pub use repository::{BoardMutation, BoardRepository, BoardRepositoryError, BoardRepositoryResult};
