// crates/record-feed-cli/src/lib.rs
// ============================================================================
// Module: Record Feed CLI Library
// Description: Shared helpers for the record-feed command-line interface.
// Purpose: Keep bind policy checks testable outside the binary.
// Dependencies: record-feed-config
// ============================================================================

//! ## Overview
//! Houses the serve bind policy used by `record-feed serve`. The binary entry
//! point (`src/main.rs`) imports these helpers.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod serve_policy;
