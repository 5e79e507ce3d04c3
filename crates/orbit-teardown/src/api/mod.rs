//! CloudControl API surface consumed by the teardown
//!
//! - client: the operations trait implemented by a transport
//! - error: response code classification

pub mod client;
pub mod error;

pub use client::{ApiResult, CloudControlApi};
pub use error::{ApiError, classify_api_error};
