//! Signup fee configuration.
//!
//! Only unofficial signups are charged. Fees are a single process-wide
//! value per record kind: an update applies to every later signup and is
//! never retroactive. No fee history is kept.

use serde::{Deserialize, Serialize};

/// Payment amount in the smallest currency unit.
pub type Amount = u64;

/// Current unofficial signup fees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeSchedule {
    /// Fee for `unofficial_user_sign_up`
    pub unofficial_user_sign_up: Amount,
    /// Fee for `unofficial_application_sign_up`
    pub unofficial_application_sign_up: Amount,
}

impl FeeSchedule {
    pub fn new(unofficial_user_sign_up: Amount, unofficial_application_sign_up: Amount) -> Self {
        Self {
            unofficial_user_sign_up,
            unofficial_application_sign_up,
        }
    }
}

/// Whether an attached payment covers `threshold`.
///
/// Overpayment is accepted; the caller is not refunded the difference.
#[inline]
pub fn payment_received(attached: Amount, threshold: Amount) -> bool {
    attached >= threshold
}
