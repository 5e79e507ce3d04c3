//! orbit-teardown - Dependency-ordered network domain teardown
//!
//! This crate deletes everything inside a CloudControl network domain, and
//! then the domain, in an order the provider accepts: NAT rules, public IP
//! blocks, servers (stopped first, torn down concurrently), VLANs, and
//! finally the domain itself.
//!
//! The HTTP transport is not part of this crate; callers supply an
//! implementation of [`api::CloudControlApi`].

pub mod api;
pub mod config;
pub mod teardown;
pub mod wait;

pub use api::{ApiError, CloudControlApi};
pub use config::TeardownConfig;
pub use teardown::{
    ProgressSink, Stage, Teardown, TeardownError, TeardownEvent, TeardownReport,
    resolve_network_domain,
};
