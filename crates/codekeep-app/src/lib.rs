//! # Codekeep App - Recovery Code Console Core
//!
//! Portable core of a recovery-code management console. The host supplies
//! rendering, dialogs, toasts and a transport; this crate owns the
//! workflows, their single-flight gating, the message queue and the batch
//! history window.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────┐
//! │  Host (terminal, web, native) │
//! │  dialog · toasts · renderer   │
//! └──────────────┬────────────────┘
//!                │ Trigger + FormSubmission
//!                ▼
//! ┌───────────────────────────────┐
//! │  RecoveryConsole              │  ← THIS CRATE
//! │  ActionGate → workflows       │
//! │  MessageQueue · HistoryWindow │
//! │  SessionState                 │
//! └──────────────┬────────────────┘
//!                │ RemoteRequest
//!                ▼
//! ┌───────────────────────────────┐
//! │  RemoteChannel (HttpRemote)   │
//! └───────────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - `http`: [`http::HttpRemote`], a `reqwest` transport with a
//!   server-sent notification stream
//! - `host`: the `codekeep-host` terminal binary

#![allow(missing_docs)]

pub mod bridge;
pub mod config;
pub mod core;
pub mod errors;
pub mod gate;
pub mod push;
pub mod queue;
pub mod runtime_bridge;
pub mod session;
pub mod sse;
pub mod ui;
pub mod views;
pub mod workflows;

#[cfg(feature = "http")]
pub mod http;

pub use crate::config::ConsoleConfig;
pub use crate::core::{ActionId, ConsoleBuilder, RecoveryConsole, Trigger};
pub use crate::errors::{AppError, ErrorCategory, NetworkErrorCode};
pub use crate::gate::{ActionGate, Arbitration, Confirmation, ConfirmationSpec, Decision};
pub use crate::queue::MessageQueue;
pub use crate::runtime_bridge::{Method, RemoteChannel, RemoteRequest, RemoteResponse, TokenSource};
pub use crate::session::{NavigationGuard, SessionState};
pub use crate::views::{
    BatchRecord, BatchStatus, ControlPanel, DownloadedFile, HistoryWindow, QueuedToast, ToastLevel,
};
pub use crate::workflows::{FormSubmission, Rendered, WorkflowOutcome};
