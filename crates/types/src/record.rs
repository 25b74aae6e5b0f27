//! Directory records for users and applications.

use crate::address::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A claimed user name bound to an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Name as submitted at signup
    pub name: String,
    /// Address controlling this record
    pub address: Address,
    /// Created by the privileged operator
    pub official: bool,
}

impl UserRecord {
    pub fn new(name: impl Into<String>, address: Address, official: bool) -> Self {
        Self {
            name: name.into(),
            address,
            official,
        }
    }
}

/// A claimed application name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub name: String,
    pub official: bool,
}

impl ApplicationRecord {
    pub fn new(name: impl Into<String>, official: bool) -> Self {
        Self {
            name: name.into(),
            official,
        }
    }

    pub fn namespace(&self) -> AppNamespace {
        AppNamespace::from_official(self.official)
    }
}

/// The two independent application keyspaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppNamespace {
    Official,
    Unofficial,
}

impl AppNamespace {
    pub fn from_official(official: bool) -> Self {
        if official {
            AppNamespace::Official
        } else {
            AppNamespace::Unofficial
        }
    }

    pub fn is_official(self) -> bool {
        matches!(self, AppNamespace::Official)
    }
}

impl fmt::Display for AppNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppNamespace::Official => f.write_str("official"),
            AppNamespace::Unofficial => f.write_str("unofficial"),
        }
    }
}
