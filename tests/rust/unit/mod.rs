//! Unit tests - library-level tests that need no external services
//!
//! These tests drive the public factorization API end to end and compare
//! every produced graph against direct evaluation of the join condition.

mod error_tests;
mod property_tests;
mod strategy_tests;
