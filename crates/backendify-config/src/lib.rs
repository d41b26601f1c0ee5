// crates/backendify-config/src/lib.rs
// ============================================================================
// Module: Backendify Config Library
// Description: Canonical config model and validation for the Backendify client.
// Purpose: Single source of truth for backendify.toml semantics.
// Dependencies: serde, toml, url
// ============================================================================

//! ## Overview
//! `backendify-config` defines the configuration model shared by the HTTP
//! client, the console, and the CLI. Parsing is strict and validation fails
//! closed. Credentials never appear in `Debug` output.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
