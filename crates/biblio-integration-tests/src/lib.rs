//! Integration test crate for the biblio agents.
//!
//! This crate exists solely to run integration tests that span the market,
//! library and platform crates. It has no public API - all functionality is
//! in the test modules.

#![forbid(unsafe_code)]
