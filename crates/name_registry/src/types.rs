//! Types for the name registry

use namereg_types::{Address, Amount};
use serde::{Deserialize, Serialize};

/// Authenticated origin of a registry call.
///
/// The host that invokes the registry is responsible for establishing that
/// `caller` really issued the call and that `payment` was attached to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    pub caller: Address,
    pub payment: Amount,
}

impl CallContext {
    /// Call from `caller` with no payment attached
    pub fn new(caller: Address) -> Self {
        Self { caller, payment: 0 }
    }

    /// Attach a payment to the call
    pub fn with_payment(mut self, payment: Amount) -> Self {
        self.payment = payment;
        self
    }
}

/// Audit event published after every successful mutation.
///
/// Field order is part of the audit format and must not change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum RegistryEvent {
    UserSignUp {
        name: String,
        address: Address,
        official: bool,
    },
    UserDeleted {
        name: String,
        address: Address,
        official: bool,
    },
    ApplicationSignUp {
        name: String,
        official: bool,
    },
    ApplicationDeleted {
        name: String,
        official: bool,
    },
}

impl RegistryEvent {
    /// Event name as written to the audit trail
    pub fn kind(&self) -> &'static str {
        match self {
            RegistryEvent::UserSignUp { .. } => "UserSignUp",
            RegistryEvent::UserDeleted { .. } => "UserDeleted",
            RegistryEvent::ApplicationSignUp { .. } => "ApplicationSignUp",
            RegistryEvent::ApplicationDeleted { .. } => "ApplicationDeleted",
        }
    }

    pub fn name(&self) -> &str {
        match self {
            RegistryEvent::UserSignUp { name, .. }
            | RegistryEvent::UserDeleted { name, .. }
            | RegistryEvent::ApplicationSignUp { name, .. }
            | RegistryEvent::ApplicationDeleted { name, .. } => name,
        }
    }
}
