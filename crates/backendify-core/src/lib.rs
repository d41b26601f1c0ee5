// crates/backendify-core/src/lib.rs
// ============================================================================
// Module: Backendify Core Library
// Description: Public API surface for the Backendify domain model.
// Purpose: Expose core types and the remote API contract.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Backendify core defines the runtime-discovered schema model (collections,
//! typed fields, relation edges), opaque records and their typed view,
//! webhooks, and the [`RemoteApi`] contract every backend implements. It holds
//! no I/O of its own.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use interfaces::ApiError;
pub use interfaces::RemoteApi;
