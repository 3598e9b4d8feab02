//! # Actions: User-Triggered Workflows
//!
//! Every control on the console maps to exactly one [`ActionId`]. Triggers
//! carry the identity of the control the user interacted with; anything that
//! does not resolve to a known control is ignored.
//!
//! ## Flow
//!
//! ```text
//! Trigger → ActionId → ActionGate → RemoteChannel → reconcile
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Workflow bound to one console control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionId {
    /// Generate a batch that expires after a number of days
    GenerateWithExpiry,
    /// Generate a batch with no expiry
    GenerateWithoutExpiry,
    /// Replace the current batch with a fresh one
    Regenerate,
    /// Invalidate a single code
    Invalidate,
    /// Delete a single code
    DeleteOne,
    /// Delete the whole current batch
    DeleteAll,
    /// Email the current batch to the account address (once per batch)
    Email,
    /// Download the current batch (once per batch)
    Download,
    /// Check that a code from the batch works
    VerifySetup,
}

/// Control identity table. Lookups in both directions go through here.
const CONTROLS: [(ActionId, &str); 9] = [
    (ActionId::GenerateWithExpiry, "form-generate-code-btn"),
    (ActionId::GenerateWithoutExpiry, "generate-code-with-no-expiry-btn"),
    (ActionId::Regenerate, "regenerate-code-btn"),
    (ActionId::Invalidate, "invalidate-code-btn"),
    (ActionId::DeleteOne, "delete-current-code-btn"),
    (ActionId::DeleteAll, "delete-all-code-btn"),
    (ActionId::Email, "email-code-btn"),
    (ActionId::Download, "download-code-btn"),
    (ActionId::VerifySetup, "verify-code-btn"),
];

impl ActionId {
    /// All actions, in control-table order
    pub const ALL: [ActionId; 9] = [
        Self::GenerateWithExpiry,
        Self::GenerateWithoutExpiry,
        Self::Regenerate,
        Self::Invalidate,
        Self::DeleteOne,
        Self::DeleteAll,
        Self::Email,
        Self::Download,
        Self::VerifySetup,
    ];

    /// Identity of the control that triggers this action
    #[must_use]
    pub fn control_id(self) -> &'static str {
        CONTROLS
            .iter()
            .find(|(action, _)| *action == self)
            .map(|(_, control)| *control)
            .unwrap_or_default()
    }

    /// Resolve a control identity to its action
    #[must_use]
    pub fn from_control_id(control: &str) -> Option<Self> {
        CONTROLS
            .iter()
            .find(|(_, id)| *id == control)
            .map(|(action, _)| *action)
    }

    /// Busy indicator shown while this action is pending
    #[must_use]
    pub fn indicator(self) -> &'static str {
        match self {
            Self::GenerateWithExpiry => "generate-form-loader",
            Self::GenerateWithoutExpiry => "generate-no-expiry-loader",
            Self::Regenerate => "regenerate-loader",
            Self::Invalidate => "invalidate-loader",
            Self::DeleteOne => "delete-code-loader",
            Self::DeleteAll => "delete-all-loader",
            Self::Email => "email-loader",
            Self::Download => "download-loader",
            Self::VerifySetup => "verify-code-loader",
        }
    }

    /// Form fields that must be present and non-blank before confirming
    #[must_use]
    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            Self::GenerateWithExpiry => &["days-to-expiry"],
            Self::Invalidate => &["invalidate_code"],
            Self::DeleteOne => &["delete_code"],
            Self::VerifySetup => &["verify_code"],
            Self::GenerateWithoutExpiry
            | Self::Regenerate
            | Self::DeleteAll
            | Self::Email
            | Self::Download => &[],
        }
    }

    /// Generation actions hold the session's generation flag while in flight
    #[must_use]
    pub fn is_generation(self) -> bool {
        matches!(
            self,
            Self::GenerateWithExpiry | Self::GenerateWithoutExpiry | Self::Regenerate
        )
    }

    /// Actions that may succeed only once per batch
    #[must_use]
    pub fn is_single_use(self) -> bool {
        matches!(self, Self::Email | Self::Download)
    }

    /// Label shown on a control once its single-use action has completed
    #[must_use]
    pub fn done_label(self) -> Option<&'static str> {
        match self {
            Self::Email => Some("You have already emailed yourself this code"),
            Self::Download => Some("You have already downloaded this code"),
            _ => None,
        }
    }

    /// Short kebab-case name used in logs and the host command line
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::GenerateWithExpiry => "generate-with-expiry",
            Self::GenerateWithoutExpiry => "generate-without-expiry",
            Self::Regenerate => "regenerate",
            Self::Invalidate => "invalidate",
            Self::DeleteOne => "delete-one",
            Self::DeleteAll => "delete-all",
            Self::Email => "email",
            Self::Download => "download",
            Self::VerifySetup => "verify-setup",
        }
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The originating interaction.
///
/// A trigger that did not land on a control (e.g. a click on surrounding
/// whitespace) resolves to nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trigger {
    control: Option<String>,
}

impl Trigger {
    /// Interaction on the control with this identity
    pub fn control(id: impl Into<String>) -> Self {
        Self {
            control: Some(id.into()),
        }
    }

    /// Interaction that did not hit any control
    pub fn detached() -> Self {
        Self { control: None }
    }

    /// Trigger for the control bound to `action`
    pub fn for_action(action: ActionId) -> Self {
        Self::control(action.control_id())
    }

    /// Identity of the control that was hit
    pub fn resolve(&self) -> Option<&str> {
        self.control.as_deref()
    }

    /// Whether this trigger resolves to exactly `action`'s control
    pub fn matches(&self, action: ActionId) -> bool {
        self.resolve() == Some(action.control_id())
    }

    /// The action whose control this trigger hit, if any
    pub fn action(&self) -> Option<ActionId> {
        self.resolve().and_then(ActionId::from_control_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_table_round_trips() {
        for action in ActionId::ALL {
            assert_eq!(ActionId::from_control_id(action.control_id()), Some(action));
        }
    }

    #[test]
    fn test_unknown_control_is_none() {
        assert_eq!(ActionId::from_control_id("other-btn"), None);
        assert_eq!(Trigger::control("other-btn").action(), None);
        assert_eq!(Trigger::detached().action(), None);
    }

    #[test]
    fn test_trigger_matches_only_its_action() {
        let trigger = Trigger::for_action(ActionId::DeleteOne);
        assert!(trigger.matches(ActionId::DeleteOne));
        assert!(!trigger.matches(ActionId::DeleteAll));
        assert!(!Trigger::detached().matches(ActionId::DeleteOne));
    }

    #[test]
    fn test_single_use_actions_have_done_labels() {
        for action in ActionId::ALL {
            assert_eq!(action.is_single_use(), action.done_label().is_some());
        }
    }

    #[test]
    fn test_expiry_generation_requires_days() {
        assert_eq!(
            ActionId::GenerateWithExpiry.required_fields(),
            &["days-to-expiry"]
        );
        assert!(ActionId::Regenerate.is_generation());
        assert!(!ActionId::Email.is_generation());
    }
}
