//! Name registry engine
//!
//! Binds user names to addresses in a single namespace and claims
//! application names in an official and an unofficial namespace.
//! Operator-only paths are checked against a [`PrivilegeGate`]; self-service
//! paths are gated by the unofficial signup fees.

use crate::config::{RegistryConfig, StorageBackend};
use crate::errors::*;
use crate::events::{EventSink, TracingEventSink};
use crate::funds::{FeeKind, FeeVault, MemoryFeeVault};
use crate::gate::PrivilegeGate;
use crate::signature::{
    delete_message_digest, RecoverableSignature, Secp256k1Recovery, SignerRecovery,
};
use crate::types::*;
use namereg_storage::{MemoryStorage, SledStorage, Storage};
use namereg_types::{
    is_all_lowercase, is_valid_name_length, payment_received, Address, Amount, AppNamespace,
    ApplicationRecord, FeeSchedule, NameHash, UserRecord, MAX_NAME_BYTES,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Name registry
///
/// Every mutation runs its checks and its write under one lock, so two
/// callers racing for the same name cannot both succeed.
pub struct NameRegistry {
    storage: Arc<dyn Storage + Send + Sync>,
    gate: Arc<dyn PrivilegeGate>,
    recovery: Arc<dyn SignerRecovery>,
    events: Arc<dyn EventSink>,
    vault: Arc<dyn FeeVault>,
    write_lock: Mutex<()>,
}

impl NameRegistry {
    /// Create a registry over `storage`, with operator checks delegated to `gate`.
    ///
    /// Events go to the tracing audit target and payments to an in-memory
    /// vault until replaced with the `with_*` builders.
    pub fn new(storage: Arc<dyn Storage + Send + Sync>, gate: Arc<dyn PrivilegeGate>) -> Self {
        Self {
            storage,
            gate,
            recovery: Arc::new(Secp256k1Recovery),
            events: Arc::new(TracingEventSink),
            vault: Arc::new(MemoryFeeVault::new()),
            write_lock: Mutex::new(()),
        }
    }

    /// Open the configured store and admit the configured operators.
    ///
    /// The configured fees are written only when the store has none yet.
    pub fn from_config(config: &RegistryConfig) -> Result<Self> {
        let storage: Arc<dyn Storage + Send + Sync> = match config.storage.backend {
            StorageBackend::Memory => Arc::new(MemoryStorage::with_fees(config.fees)),
            StorageBackend::Sled => {
                let storage = SledStorage::new(&config.storage.path)?;
                storage.initialize(&config.fees)?;
                Arc::new(storage)
            }
        };

        info!(
            backend = ?config.storage.backend,
            operators = config.operators.len(),
            "Opened name registry"
        );

        Ok(Self::new(storage, Arc::new(config.privilege_gate())))
    }

    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn with_fee_vault(mut self, vault: Arc<dyn FeeVault>) -> Self {
        self.vault = vault;
        self
    }

    pub fn with_signer_recovery(mut self, recovery: Arc<dyn SignerRecovery>) -> Self {
        self.recovery = recovery;
        self
    }

    /// Bind `name` to `address` in the user namespace. Operator only.
    pub fn official_user_sign_up(
        &self,
        ctx: &CallContext,
        name: &str,
        address: Address,
    ) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.try_official_user_sign_up(ctx, name, address)
            .inspect_err(|e| log_rejection("official_user_sign_up", ctx, name, e))
    }

    fn try_official_user_sign_up(
        &self,
        ctx: &CallContext,
        name: &str,
        address: Address,
    ) -> Result<()> {
        self.require_privileged(ctx, "sign up official users")?;
        check_name_length(name)?;
        self.insert_user(name, address, true)?;

        info!("Official user {} bound to {}", name, address);
        self.publish(RegistryEvent::UserSignUp {
            name: name.to_string(),
            address,
            official: true,
        });
        Ok(())
    }

    /// Bind `name` to the caller, paid for with the attached payment.
    ///
    /// The whole payment is collected, including any amount above the fee.
    pub fn unofficial_user_sign_up(&self, ctx: &CallContext, name: &str) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.try_unofficial_user_sign_up(ctx, name)
            .inspect_err(|e| log_rejection("unofficial_user_sign_up", ctx, name, e))
    }

    fn try_unofficial_user_sign_up(&self, ctx: &CallContext, name: &str) -> Result<()> {
        check_name_length(name)?;
        require_fee(ctx, self.fee_schedule()?.unofficial_user_sign_up)?;
        self.insert_user(name, ctx.caller, false)?;
        self.vault.deposit(&ctx.caller, ctx.payment, FeeKind::UserSignUp);

        info!(
            "Unofficial user {} bound to {} (paid {})",
            name, ctx.caller, ctx.payment
        );
        self.publish(RegistryEvent::UserSignUp {
            name: name.to_string(),
            address: ctx.caller,
            official: false,
        });
        Ok(())
    }

    /// Remove a user on their behalf. Operator only.
    ///
    /// `signature` must be the bound address's signature over the `"Delete"`
    /// digest.
    pub fn delete_user_for_user(
        &self,
        ctx: &CallContext,
        name: &str,
        signature: &RecoverableSignature,
    ) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.try_delete_user_for_user(ctx, name, signature)
            .inspect_err(|e| log_rejection("delete_user_for_user", ctx, name, e))
    }

    fn try_delete_user_for_user(
        &self,
        ctx: &CallContext,
        name: &str,
        signature: &RecoverableSignature,
    ) -> Result<()> {
        self.require_privileged(ctx, "delete users on their behalf")?;
        let key = NameHash::of(name);
        let record = self.load_user(&key, name)?;

        if !self.is_signed(&record.address, &delete_message_digest(), signature) {
            return Err(RegistryError::InvalidSignature {
                name: name.to_string(),
            });
        }

        self.storage.remove_user(&key)?;
        info!("User {} deleted by operator {}", name, ctx.caller);
        self.publish(RegistryEvent::UserDeleted {
            name: record.name,
            address: record.address,
            official: record.official,
        });
        Ok(())
    }

    /// Remove the caller's own unofficial binding.
    pub fn delete_user(&self, ctx: &CallContext, name: &str) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.try_delete_user(ctx, name)
            .inspect_err(|e| log_rejection("delete_user", ctx, name, e))
    }

    fn try_delete_user(&self, ctx: &CallContext, name: &str) -> Result<()> {
        let key = NameHash::of(name);
        let record = self.load_user(&key, name)?;

        // Official bindings are only removable through the operator path.
        if record.address != ctx.caller || record.official {
            return Err(RegistryError::Unauthorized {
                caller: ctx.caller,
                operation: "delete this user",
            });
        }

        self.storage.remove_user(&key)?;
        info!("User {} deleted by its owner", name);
        self.publish(RegistryEvent::UserDeleted {
            name: record.name,
            address: record.address,
            official: record.official,
        });
        Ok(())
    }

    /// Claim `name` in the official application namespace. Operator only.
    pub fn official_application_sign_up(&self, ctx: &CallContext, name: &str) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.try_official_application_sign_up(ctx, name)
            .inspect_err(|e| log_rejection("official_application_sign_up", ctx, name, e))
    }

    fn try_official_application_sign_up(&self, ctx: &CallContext, name: &str) -> Result<()> {
        self.require_privileged(ctx, "sign up official applications")?;
        check_name_length(name)?;
        self.insert_application(name, AppNamespace::Official)?;

        info!("Official application {} registered", name);
        self.publish(RegistryEvent::ApplicationSignUp {
            name: name.to_string(),
            official: true,
        });
        Ok(())
    }

    /// Claim a lowercase `name` in the unofficial application namespace.
    pub fn unofficial_application_sign_up(&self, ctx: &CallContext, name: &str) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.try_unofficial_application_sign_up(ctx, name)
            .inspect_err(|e| log_rejection("unofficial_application_sign_up", ctx, name, e))
    }

    fn try_unofficial_application_sign_up(&self, ctx: &CallContext, name: &str) -> Result<()> {
        check_name_length(name)?;
        if !is_all_lowercase(name) {
            return Err(RegistryError::InvalidName {
                name: name.to_string(),
            });
        }
        require_fee(ctx, self.fee_schedule()?.unofficial_application_sign_up)?;
        self.insert_application(name, AppNamespace::Unofficial)?;
        self.vault
            .deposit(&ctx.caller, ctx.payment, FeeKind::ApplicationSignUp);

        info!(
            "Unofficial application {} registered by {} (paid {})",
            name, ctx.caller, ctx.payment
        );
        self.publish(RegistryEvent::ApplicationSignUp {
            name: name.to_string(),
            official: false,
        });
        Ok(())
    }

    /// Remove an application from the chosen namespace. Operator only.
    pub fn delete_application(&self, ctx: &CallContext, name: &str, official: bool) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.try_delete_application(ctx, name, official)
            .inspect_err(|e| log_rejection("delete_application", ctx, name, e))
    }

    fn try_delete_application(&self, ctx: &CallContext, name: &str, official: bool) -> Result<()> {
        self.require_privileged(ctx, "delete applications")?;
        let namespace = AppNamespace::from_official(official);

        let record = self
            .storage
            .remove_application(namespace, &NameHash::of(name))?
            .ok_or_else(|| RegistryError::NameNotFound {
                name: name.to_string(),
            })?;

        info!("Application {} removed from {} namespace", name, namespace);
        self.publish(RegistryEvent::ApplicationDeleted {
            name: record.name,
            official,
        });
        Ok(())
    }

    /// Set the unofficial user signup fee. Operator only.
    pub fn set_unofficial_user_sign_up_fee(&self, ctx: &CallContext, fee: Amount) -> Result<()> {
        self.update_fees(ctx, "set the user signup fee", fee, |fees| {
            fees.unofficial_user_sign_up = fee
        })
    }

    /// Set the unofficial application signup fee. Operator only.
    pub fn set_unofficial_application_sign_up_fee(
        &self,
        ctx: &CallContext,
        fee: Amount,
    ) -> Result<()> {
        self.update_fees(ctx, "set the application signup fee", fee, |fees| {
            fees.unofficial_application_sign_up = fee
        })
    }

    fn update_fees(
        &self,
        ctx: &CallContext,
        operation: &'static str,
        fee: Amount,
        apply: impl FnOnce(&mut FeeSchedule),
    ) -> Result<()> {
        let _guard = self.write_lock.lock();
        let result = self.require_privileged(ctx, operation).and_then(|()| {
            let previous = self.fee_schedule()?;
            let mut fees = previous;
            apply(&mut fees);
            self.storage.put_fee_schedule(&fees)?;
            info!(
                "Fee schedule updated by {}: user {} -> {}, application {} -> {}",
                ctx.caller,
                previous.unofficial_user_sign_up,
                fees.unofficial_user_sign_up,
                previous.unofficial_application_sign_up,
                fees.unofficial_application_sign_up
            );
            Ok(())
        });
        result.inspect_err(|e| {
            debug!(
                operation,
                caller = %ctx.caller,
                fee,
                error = %e,
                "Fee update rejected"
            )
        })
    }

    /// Current fees; zero until an operator sets them.
    pub fn fee_schedule(&self) -> Result<FeeSchedule> {
        Ok(self.storage.get_fee_schedule()?.unwrap_or_default())
    }

    pub fn unofficial_user_sign_up_fee(&self) -> Result<Amount> {
        Ok(self.fee_schedule()?.unofficial_user_sign_up)
    }

    pub fn unofficial_application_sign_up_fee(&self) -> Result<Amount> {
        Ok(self.fee_schedule()?.unofficial_application_sign_up)
    }

    pub fn user_name_taken(&self, name: &str) -> Result<bool> {
        Ok(self.storage.get_user(&NameHash::of(name))?.is_some())
    }

    /// Whether `name` is taken as `(official, unofficial)`.
    pub fn application_name_taken(&self, name: &str) -> Result<(bool, bool)> {
        let key = NameHash::of(name);
        let official = self
            .storage
            .get_application(AppNamespace::Official, &key)?
            .is_some();
        let unofficial = self
            .storage
            .get_application(AppNamespace::Unofficial, &key)?
            .is_some();
        Ok((official, unofficial))
    }

    /// Bound address and official flag of a user.
    pub fn get_user_by_name(&self, name: &str) -> Result<(Address, bool)> {
        let record = self.load_user(&NameHash::of(name), name)?;
        Ok((record.address, record.official))
    }

    /// True when `signature` over `digest` recovers to `address`.
    pub fn is_signed(
        &self,
        address: &Address,
        digest: &[u8; 32],
        signature: &RecoverableSignature,
    ) -> bool {
        crate::signature::is_signed(self.recovery.as_ref(), address, digest, signature)
    }

    /// Registry statistics
    pub fn stats(&self) -> Result<RegistryStats> {
        Ok(RegistryStats {
            users: self.storage.user_count()?,
            official_applications: self.storage.application_count(AppNamespace::Official)?,
            unofficial_applications: self
                .storage
                .application_count(AppNamespace::Unofficial)?,
            fees: self.fee_schedule()?,
        })
    }

    /// Flush the underlying store.
    pub fn flush(&self) -> Result<()> {
        Ok(self.storage.flush()?)
    }

    fn require_privileged(&self, ctx: &CallContext, operation: &'static str) -> Result<()> {
        if self.gate.is_privileged(&ctx.caller) {
            Ok(())
        } else {
            Err(RegistryError::Unauthorized {
                caller: ctx.caller,
                operation,
            })
        }
    }

    fn load_user(&self, key: &NameHash, name: &str) -> Result<UserRecord> {
        self.storage
            .get_user(key)?
            .ok_or_else(|| RegistryError::NameNotFound {
                name: name.to_string(),
            })
    }

    fn insert_user(&self, name: &str, address: Address, official: bool) -> Result<()> {
        let key = NameHash::of(name);
        if self.storage.get_user(&key)?.is_some() {
            return Err(RegistryError::NameAlreadyTaken {
                name: name.to_string(),
            });
        }
        self.storage
            .put_user(&key, &UserRecord::new(name, address, official))?;
        Ok(())
    }

    fn insert_application(&self, name: &str, namespace: AppNamespace) -> Result<()> {
        let key = NameHash::of(name);
        if self.storage.get_application(namespace, &key)?.is_some() {
            return Err(RegistryError::NameAlreadyTaken {
                name: name.to_string(),
            });
        }
        self.storage.put_application(
            namespace,
            &key,
            &ApplicationRecord::new(name, namespace.is_official()),
        )?;
        Ok(())
    }

    /// Publish after commit; a failed delivery leaves the mutation in place.
    fn publish(&self, event: RegistryEvent) {
        if let Err(e) = self.events.publish(&event) {
            warn!(
                event = event.kind(),
                name = event.name(),
                error = %e,
                "Failed to publish registry event"
            );
        }
    }
}

/// Snapshot of registry contents
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RegistryStats {
    pub users: u64,
    pub official_applications: u64,
    pub unofficial_applications: u64,
    pub fees: FeeSchedule,
}

fn check_name_length(name: &str) -> Result<()> {
    if is_valid_name_length(name) {
        Ok(())
    } else {
        Err(RegistryError::NameTooLong {
            len: name.len(),
            max: MAX_NAME_BYTES,
        })
    }
}

fn require_fee(ctx: &CallContext, required: Amount) -> Result<()> {
    if payment_received(ctx.payment, required) {
        Ok(())
    } else {
        Err(RegistryError::InsufficientFee {
            paid: ctx.payment,
            required,
        })
    }
}

fn log_rejection(operation: &'static str, ctx: &CallContext, name: &str, error: &RegistryError) {
    debug!(
        operation,
        caller = %ctx.caller,
        entry = name,
        error = %error,
        "Registry operation rejected"
    );
}
