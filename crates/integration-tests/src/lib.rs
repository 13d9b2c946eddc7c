//! Integration tests for Lockerroom.
//!
//! # Running Tests
//!
//! ```bash
//! # Cart flow tests over the in-memory backends
//! cargo test -p lockerroom-integration-tests
//!
//! # Database-backed store tests (need PostgreSQL 15+)
//! CART_TEST_DATABASE_URL=postgres://localhost/lockerroom_test \
//!     cargo test -p lockerroom-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `cart_flows` - End-to-end cart behavior: merging, identity transitions,
//!   snapshot persistence, failed-write recovery
//! - `postgres_store` - `CartItemRepository` against a real database
