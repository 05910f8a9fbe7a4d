//! Sylera Core - Shared types library.
//!
//! This crate provides common types used across all Sylera components:
//! - `api` - Public storefront REST API
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money, phone numbers,
//!   and order/payment enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
