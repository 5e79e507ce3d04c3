//! orbit-common - Shared types for network domain teardown
//!
//! This crate provides the inventory models and ordering rules used by the
//! teardown orchestrator and its test utilities, without any async or
//! transport dependencies to keep it lightweight.
//!
//! ## Modules
//!
//! - [`defaults`]: Default configuration values
//! - [`lifecycle`]: Resource lifecycle states
//! - [`models`]: Inventory views (network domain, NAT rules, servers, ...)
//! - [`paging`]: Paging cursor and page results
//! - [`resource_kind`]: Resource kinds and teardown priority

pub mod defaults;
pub mod lifecycle;
pub mod models;
pub mod paging;
pub mod resource_kind;

// Re-export commonly used types
pub use lifecycle::{LifecycleState, ResourceStatus};
pub use models::{NatRule, NetworkDomain, PublicIpBlock, Server, Vlan};
pub use paging::{Page, Paging};
pub use resource_kind::ResourceKind;
