//! Error types for the name registry

use namereg_types::{Address, Amount};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Unauthorized: {caller} may not {operation}")]
    Unauthorized {
        caller: Address,
        operation: &'static str,
    },

    #[error("Name already taken: {name}")]
    NameAlreadyTaken { name: String },

    #[error("Name not found: {name}")]
    NameNotFound { name: String },

    #[error("Name too long: {len} bytes, must be under {max}")]
    NameTooLong { len: usize, max: usize },

    #[error("Invalid name: {name} must be all lowercase")]
    InvalidName { name: String },

    #[error("Insufficient fee: paid {paid}, required {required}")]
    InsufficientFee { paid: Amount, required: Amount },

    #[error("Invalid signature for {name}")]
    InvalidSignature { name: String },

    #[error("Registry storage error: {0}")]
    StorageError(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, RegistryError>;
