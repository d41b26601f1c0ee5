// crates/backendify-client/src/lib.rs
// ============================================================================
// Module: Backendify Client Library
// Description: Remote API backends for the Backendify data client.
// Purpose: Provide the HTTP client and an in-process service model.
// Dependencies: backendify-core, backendify-config, reqwest
// ============================================================================

//! ## Overview
//! Two implementations of [`backendify_core::RemoteApi`]:
//! [`HttpApiClient`] talks to a running Backendify service over HTTP, and
//! [`InMemoryApi`] models the same contract in process for tests and offline
//! demos, including server-side validation errors and on-delete semantics.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod http;
pub mod memory;
mod rules;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use http::HttpApiClient;
pub use http::HttpApiConfig;
pub use memory::InMemoryApi;
