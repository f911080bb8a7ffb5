//! Boardwalk: board workflow engine for project-management backends.
//!
//! This crate provides ordered-collection management for the steps
//! (columns) and tasks (cards) of a board, including cross-step task
//! movement, capacity limits, a single terminal step, parent/child task
//! hierarchies, and the dense-position invariants that must hold after
//! every mutation.
//!
//! # Architecture
//!
//! Boardwalk follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (in-memory, Postgres)
//!
//! # Modules
//!
//! - [`board`]: The board bounded context (steps, tasks, ordering)

pub mod board;
