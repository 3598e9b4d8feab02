//! Codekeep Testing Infrastructure
//!
//! Scripted implementations of every host capability the console consumes,
//! plus fixtures for batches and server payloads.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(missing_docs)]
//!
//! # Usage
//!
//! ```rust,no_run
//! use codekeep_testkit::*;
//! use codekeep_app::{ActionId, FormSubmission};
//!
//! # async fn example() {
//! let harness = TestConsole::new();
//! harness.script_generation(ActionId::Regenerate, &batch(1), &["AAAA-1111"]);
//! let outcome = harness.run(ActionId::Regenerate, &FormSubmission::new()).await;
//! assert!(outcome.is_rendered());
//! # }
//! ```

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
