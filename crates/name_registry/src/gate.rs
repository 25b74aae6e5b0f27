//! Privilege checks for operator-only operations.

use namereg_types::Address;
use std::collections::HashSet;

/// Decides whether a caller may run operator-only operations.
pub trait PrivilegeGate: Send + Sync {
    fn is_privileged(&self, caller: &Address) -> bool;
}

impl<F> PrivilegeGate for F
where
    F: Fn(&Address) -> bool + Send + Sync,
{
    fn is_privileged(&self, caller: &Address) -> bool {
        self(caller)
    }
}

/// A single privileged owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnerGate {
    owner: Address,
}

impl OwnerGate {
    pub fn new(owner: Address) -> Self {
        Self { owner }
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }
}

impl PrivilegeGate for OwnerGate {
    fn is_privileged(&self, caller: &Address) -> bool {
        *caller == self.owner
    }
}

/// A fixed set of operators. An empty set privileges nobody.
#[derive(Debug, Clone, Default)]
pub struct AllowListGate {
    operators: HashSet<Address>,
}

impl AllowListGate {
    pub fn new(operators: impl IntoIterator<Item = Address>) -> Self {
        Self {
            operators: operators.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}

impl PrivilegeGate for AllowListGate {
    fn is_privileged(&self, caller: &Address) -> bool {
        self.operators.contains(caller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_gate_only_admits_owner() {
        let gate = OwnerGate::new(Address([1; 20]));
        assert!(gate.is_privileged(&Address([1; 20])));
        assert!(!gate.is_privileged(&Address([2; 20])));
    }

    #[test]
    fn allow_list_gate() {
        let gate = AllowListGate::new([Address([1; 20]), Address([2; 20])]);
        assert_eq!(gate.len(), 2);
        assert!(gate.is_privileged(&Address([2; 20])));
        assert!(!gate.is_privileged(&Address([3; 20])));
        assert!(!AllowListGate::default().is_privileged(&Address::ZERO));
    }

    #[test]
    fn closures_act_as_gates() {
        let gate = |caller: &Address| caller.as_bytes()[0] == 9;
        assert!(gate.is_privileged(&Address([9; 20])));
        assert!(!gate.is_privileged(&Address([8; 20])));
    }
}
