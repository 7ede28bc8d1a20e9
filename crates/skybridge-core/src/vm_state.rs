//! Canonical VM lifecycle
//!
//! Backends report status in their own vocabulary. The core maps every raw
//! string into one fixed lifecycle through a total lookup; anything the
//! table does not know maps to `Failed` rather than passing an unrecognized
//! string through.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use skybridge_driver::VmAction;

/// The fixed VM lifecycle every backend status is mapped into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VmState {
    Creating,
    Running,
    Suspending,
    Suspended,
    Resuming,
    Rebooting,
    Terminating,
    Terminated,
    Failed,
}

impl VmState {
    /// Maps a backend-native status string to the canonical lifecycle.
    ///
    /// Case-insensitive; unmapped values fail closed to `Failed`.
    pub fn from_backend(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "creating" | "pending" | "provisioning" | "build" => VmState::Creating,
            "running" | "up" | "active" | "in-use" => VmState::Running,
            "suspending" | "stopping" | "pausing" => VmState::Suspending,
            "suspended" | "stopped" | "paused" | "shutoff" => VmState::Suspended,
            "resuming" | "starting" => VmState::Resuming,
            "rebooting" | "restarting" | "reboot" | "hard_reboot" => VmState::Rebooting,
            "terminating" | "deleting" | "shutting-down" => VmState::Terminating,
            "terminated" | "deleted" | "down" => VmState::Terminated,
            _ => VmState::Failed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VmState::Creating => "creating",
            VmState::Running => "running",
            VmState::Suspending => "suspending",
            VmState::Suspended => "suspended",
            VmState::Resuming => "resuming",
            VmState::Rebooting => "rebooting",
            VmState::Terminating => "terminating",
            VmState::Terminated => "terminated",
            VmState::Failed => "failed",
        }
    }
}

impl std::fmt::Display for VmState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a raw control action string, rejecting anything outside the fixed
/// action set before it can reach a backend.
pub fn parse_action(raw: &str) -> Result<VmAction> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "suspend" => Ok(VmAction::Suspend),
        "resume" => Ok(VmAction::Resume),
        "reboot" => Ok(VmAction::Reboot),
        _ => Err(CoreError::InvalidAction(raw.to_string())),
    }
}
