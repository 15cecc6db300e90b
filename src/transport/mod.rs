//! HTTP plumbing shared by the crawler and the publisher.
//!
//! Both pipelines talk to a remote repository with the same ingredients:
//! optional static basic-auth credentials, an optional proxy, and bounded
//! timeouts. This module turns those settings into a pooled
//! [`reqwest::Client`] and defines the error type for single transfers.

mod client;
pub mod constants;
mod credentials;
mod error;

pub use client::{RequestTimeout, TransportConfig, build_client};
pub use credentials::{Credentials, authorize};
pub use error::{TransferError, truncate_body};
