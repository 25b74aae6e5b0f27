//! Name Registry
//!
//! Binds human-readable user names to addresses and claims application
//! names in an official and an unofficial namespace. Official entries are
//! created by privileged operators; unofficial ones are self-service and
//! fee gated. Every successful mutation is published as a [`RegistryEvent`].

pub mod config;
pub mod errors;
pub mod events;
pub mod funds;
pub mod gate;
pub mod registry;
pub mod signature;
pub mod types;

pub use config::{ConfigError, RegistryConfig, StorageBackend, StorageConfig};
pub use errors::*;
pub use events::{
    ChannelEventSink, EventSink, FanoutEventSink, MemoryEventSink, SinkError, TracingEventSink,
};
pub use funds::{FeeCollectionStats, FeeKind, FeeVault, MemoryFeeVault};
pub use gate::{AllowListGate, OwnerGate, PrivilegeGate};
pub use registry::{NameRegistry, RegistryStats};
pub use signature::{
    delete_message_digest, RecoverableSignature, Secp256k1Recovery, SignatureParseError,
    SignerRecovery,
};
pub use types::*;

pub use namereg_types::{Address, AddressError, Amount, FeeSchedule, NameHash};
