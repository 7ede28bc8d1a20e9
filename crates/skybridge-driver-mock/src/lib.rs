//! In-memory mock backend driver
//!
//! Implements the full [`skybridge_driver::CloudDriver`] contract over
//! in-memory tables: the reference backend for orchestrator tests and local
//! development. Supports failure injection so callers can exercise
//! backend-failure and force-delete paths.

pub mod driver;

pub use driver::MockDriver;
