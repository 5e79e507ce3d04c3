//! Shared test utilities for orbit
//!
//! Kept in its own crate so the teardown's integration tests and any future
//! transport crate can share one fake provider.
//!
//! ## Modules
//!
//! - [`cloud`]: in-memory CloudControl with a call journal and fault injection
//! - [`fixtures`]: inventory record constructors
//! - [`logging`]: tracing setup for tests

pub mod cloud;
pub mod fixtures;
pub mod logging;

// Re-export commonly used items
pub use cloud::{Call, FakeCloud};
pub use fixtures::TEST_DATACENTER;
pub use logging::init_test_tracing;
