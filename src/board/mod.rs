//! Board bounded context: workflow engine for steps, tasks, and ordering.
//!
//! Follows a hexagonal layout: pure domain logic in [`domain`], the
//! repository contract in [`ports`], persistence implementations in
//! [`adapters`], and orchestration in [`services`].

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
