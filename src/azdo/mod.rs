//! Azure DevOps REST access.
//!
//! [`DevOpsApi`] is the seam every pipeline stage talks to; [`AzDoClient`]
//! is the `reqwest` implementation used by the binary.

pub mod api;
pub mod client;
pub mod http;
pub mod types;

pub use api::DevOpsApi;
pub use client::AzDoClient;
