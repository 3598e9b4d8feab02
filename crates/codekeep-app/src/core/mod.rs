//! # Core Console Module
//!
//! - [`ActionId`] and [`Trigger`]: which control the user touched
//! - [`RecoveryConsole`]: the session handle every workflow runs against
//! - [`ConsoleBuilder`]: wires host capabilities into a console

mod action;
mod console;

pub use action::{ActionId, Trigger};
pub use console::{ConsoleBuilder, RecoveryConsole};
