//! Worker lifecycle state machine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LifecycleError;

/// Lifecycle states of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    /// Created, install not yet attempted.
    Uninstalled,
    /// Pre-caching assets.
    Installing,
    /// Every asset stored; waiting for activation.
    Installed,
    /// Activation in progress.
    Activating,
    /// Controlling fetches.
    Active,
    /// Install failed. Terminal.
    Redundant,
}

impl WorkerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerState::Uninstalled => "uninstalled",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Active => "active",
            WorkerState::Redundant => "redundant",
        }
    }

    /// Apply a signal, returning the next state.
    pub fn transition(self, signal: LifecycleSignal) -> Result<WorkerState, LifecycleError> {
        let next = match (self, signal) {
            (WorkerState::Uninstalled, LifecycleSignal::Install) => WorkerState::Installing,
            (WorkerState::Installing, LifecycleSignal::InstallSucceeded) => WorkerState::Installed,
            (WorkerState::Installing, LifecycleSignal::InstallFailed) => WorkerState::Redundant,
            (WorkerState::Installed, LifecycleSignal::Activate) => WorkerState::Activating,
            (WorkerState::Activating, LifecycleSignal::ActivationComplete) => WorkerState::Active,
            (from, signal) => return Err(LifecycleError::InvalidTransition { from, signal }),
        };
        Ok(next)
    }

    /// Whether the worker answers fetches from its caches.
    pub fn is_controlling(&self) -> bool {
        *self == WorkerState::Active
    }

    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkerState::Active | WorkerState::Redundant)
    }
}

impl Default for WorkerState {
    fn default() -> Self {
        Self::Uninstalled
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named signals that drive the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleSignal {
    /// Start installing.
    Install,
    /// All assets were stored.
    InstallSucceeded,
    /// Some asset could not be stored.
    InstallFailed,
    /// Start activation.
    Activate,
    /// Activation finished.
    ActivationComplete,
}

impl LifecycleSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleSignal::Install => "install",
            LifecycleSignal::InstallSucceeded => "install_succeeded",
            LifecycleSignal::InstallFailed => "install_failed",
            LifecycleSignal::Activate => "activate",
            LifecycleSignal::ActivationComplete => "activation_complete",
        }
    }
}

impl fmt::Display for LifecycleSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single applied transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: WorkerState,
    pub signal: LifecycleSignal,
    pub to: WorkerState,
}

/// Observer trait for lifecycle transitions.
pub trait LifecycleObserver: Send + Sync {
    /// Called after a transition has been applied.
    fn on_transition(&self, transition: &Transition);
}

/// Observer that forwards transitions to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl LifecycleObserver for TracingObserver {
    fn on_transition(&self, transition: &Transition) {
        tracing::info!(
            from = %transition.from,
            signal = %transition.signal,
            to = %transition.to,
            "worker lifecycle transition"
        );
    }
}
