//! REST API access for the FlowMeld backend.
//!
//! This module provides:
//! - `Transport`: the seam every HTTP exchange goes through (`HttpTransport` uses reqwest)
//! - `Gateway`: attaches bearer tokens and renews them once on a 401
//! - `ApiClient`: typed endpoints for authentication, profile and dashboard data
//!
//! The backend issues JWT access/refresh pairs from `token/`; access tokens
//! are short-lived and renewed through `token/refresh/`.

pub mod client;
pub mod endpoints;
pub mod error;
pub mod gateway;
pub mod transport;

pub use client::{ApiClient, Dashboard};
pub use error::ApiError;
pub use gateway::Gateway;
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Transport};
