//! Patient Registry Core - Shared domain types.
//!
//! This crate provides the types used across the patient registry components:
//! - `server` - REST API for registering, listing and removing patients
//! - `cli` - Command-line tools for migrations and data resets
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database
//! access, no HTTP. Enabling the `postgres` feature adds sqlx encode/decode
//! impls for the newtypes.
//!
//! # Modules
//!
//! - [`types`] - Patient record, validated field newtypes, listing query and page types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
