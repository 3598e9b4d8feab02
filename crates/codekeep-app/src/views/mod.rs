//! # View State Module
//!
//! View state types mirrored from server outcomes. Renderers read these;
//! only workflows write them.

pub mod controls;
pub mod history;
pub mod notifications;
pub mod operations;

pub use controls::{ControlPanel, ControlState, WorkflowPhase};
pub use history::{BatchRecord, BatchStatus, CounterField, HistoryWindow, Retirement};
pub use notifications::{QueuedToast, ToastId, ToastLevel};
pub use operations::{
    CodeOperationResponse, DownloadedFile, GenerateResponse, MessageResponse, VerificationLine,
    VerifyResponse,
};
