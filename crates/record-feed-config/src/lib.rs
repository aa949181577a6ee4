// crates/record-feed-config/src/lib.rs
// ============================================================================
// Module: Record Feed Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for record-feed.toml semantics.
// Dependencies: record-feed-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `record-feed-config` defines the configuration model for the record feed
//! service. Loading is strict and fails closed: oversized, non-UTF-8, or
//! inconsistent files are rejected before the server starts.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
