//! Lockerroom Core - Shared types library.
//!
//! This crate provides common types used across all Lockerroom components:
//! - `cart` - Cart state management and persistence
//! - future storefront and admin services
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and prices

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
