use anyhow::Result;
use namereg_types::{AppNamespace, ApplicationRecord, FeeSchedule, NameHash, UserRecord};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::{Db, Tree};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Storage errors
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

const FEE_SCHEDULE_KEY: &[u8] = b"fee_schedule";

/// Abstract directory storage.
///
/// Each call reads or writes a single record. Check-then-write sequences
/// are serialized by the caller.
pub trait Storage {
    fn get_user(&self, key: &NameHash) -> Result<Option<UserRecord>>;
    fn put_user(&self, key: &NameHash, record: &UserRecord) -> Result<()>;
    fn remove_user(&self, key: &NameHash) -> Result<Option<UserRecord>>;
    fn user_count(&self) -> Result<u64>;

    fn get_application(
        &self,
        namespace: AppNamespace,
        key: &NameHash,
    ) -> Result<Option<ApplicationRecord>>;
    fn put_application(
        &self,
        namespace: AppNamespace,
        key: &NameHash,
        record: &ApplicationRecord,
    ) -> Result<()>;
    fn remove_application(
        &self,
        namespace: AppNamespace,
        key: &NameHash,
    ) -> Result<Option<ApplicationRecord>>;
    fn application_count(&self, namespace: AppNamespace) -> Result<u64>;

    /// Fee configuration; `None` until first written.
    fn get_fee_schedule(&self) -> Result<Option<FeeSchedule>>;
    fn put_fee_schedule(&self, schedule: &FeeSchedule) -> Result<()>;

    /// Persist buffered writes; a no-op for volatile backends.
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Sled-backed implementation
pub struct SledStorage {
    db: Db,
    users: Tree,
    official_applications: Tree,
    unofficial_applications: Tree,
    metadata: Tree,
}

impl SledStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        let users = db.open_tree("users")?;
        let official_applications = db.open_tree("official_applications")?;
        let unofficial_applications = db.open_tree("unofficial_applications")?;
        let metadata = db.open_tree("metadata")?;

        tracing::debug!(
            users = users.len(),
            official_applications = official_applications.len(),
            unofficial_applications = unofficial_applications.len(),
            "Opened directory store"
        );

        Ok(Self {
            db,
            users,
            official_applications,
            unofficial_applications,
            metadata,
        })
    }

    /// Seed the fee schedule if the store has none yet.
    pub fn initialize(&self, fees: &FeeSchedule) -> Result<()> {
        if self.get_fee_schedule()?.is_none() {
            self.put_fee_schedule(fees)?;
            tracing::info!(
                user_fee = fees.unofficial_user_sign_up,
                application_fee = fees.unofficial_application_sign_up,
                "Initialized fee schedule"
            );
        }
        Ok(())
    }

    fn applications(&self, namespace: AppNamespace) -> &Tree {
        match namespace {
            AppNamespace::Official => &self.official_applications,
            AppNamespace::Unofficial => &self.unofficial_applications,
        }
    }
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StorageError> {
    Ok(serde_json::from_slice(bytes)?)
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StorageError> {
    Ok(serde_json::to_vec(value)?)
}

fn get_record<T: DeserializeOwned>(tree: &Tree, key: &NameHash) -> Result<Option<T>> {
    match tree.get(key.as_bytes())? {
        Some(v) => Ok(Some(decode(&v)?)),
        None => Ok(None),
    }
}

fn remove_record<T: DeserializeOwned>(tree: &Tree, key: &NameHash) -> Result<Option<T>> {
    match tree.remove(key.as_bytes())? {
        Some(v) => Ok(Some(decode(&v)?)),
        None => Ok(None),
    }
}

impl Storage for SledStorage {
    fn get_user(&self, key: &NameHash) -> Result<Option<UserRecord>> {
        get_record(&self.users, key)
    }

    fn put_user(&self, key: &NameHash, record: &UserRecord) -> Result<()> {
        self.users.insert(key.as_bytes(), encode(record)?)?;
        Ok(())
    }

    fn remove_user(&self, key: &NameHash) -> Result<Option<UserRecord>> {
        remove_record(&self.users, key)
    }

    fn user_count(&self) -> Result<u64> {
        Ok(self.users.len() as u64)
    }

    fn get_application(
        &self,
        namespace: AppNamespace,
        key: &NameHash,
    ) -> Result<Option<ApplicationRecord>> {
        get_record(self.applications(namespace), key)
    }

    fn put_application(
        &self,
        namespace: AppNamespace,
        key: &NameHash,
        record: &ApplicationRecord,
    ) -> Result<()> {
        self.applications(namespace)
            .insert(key.as_bytes(), encode(record)?)?;
        Ok(())
    }

    fn remove_application(
        &self,
        namespace: AppNamespace,
        key: &NameHash,
    ) -> Result<Option<ApplicationRecord>> {
        remove_record(self.applications(namespace), key)
    }

    fn application_count(&self, namespace: AppNamespace) -> Result<u64> {
        Ok(self.applications(namespace).len() as u64)
    }

    fn get_fee_schedule(&self) -> Result<Option<FeeSchedule>> {
        match self.metadata.get(FEE_SCHEDULE_KEY)? {
            Some(v) => Ok(Some(decode(&v)?)),
            None => Ok(None),
        }
    }

    fn put_fee_schedule(&self, schedule: &FeeSchedule) -> Result<()> {
        self.metadata.insert(FEE_SCHEDULE_KEY, encode(schedule)?)?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}

/// In-memory testing backend
#[derive(Default)]
pub struct MemoryStorage {
    users: Arc<RwLock<HashMap<NameHash, UserRecord>>>,
    official_applications: Arc<RwLock<HashMap<NameHash, ApplicationRecord>>>,
    unofficial_applications: Arc<RwLock<HashMap<NameHash, ApplicationRecord>>>,
    fee_schedule: Arc<RwLock<Option<FeeSchedule>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Memory store pre-seeded with a fee schedule.
    pub fn with_fees(fees: FeeSchedule) -> Self {
        let storage = Self::default();
        *storage.fee_schedule.write() = Some(fees);
        storage
    }

    fn applications(
        &self,
        namespace: AppNamespace,
    ) -> &Arc<RwLock<HashMap<NameHash, ApplicationRecord>>> {
        match namespace {
            AppNamespace::Official => &self.official_applications,
            AppNamespace::Unofficial => &self.unofficial_applications,
        }
    }
}

impl Storage for MemoryStorage {
    fn get_user(&self, key: &NameHash) -> Result<Option<UserRecord>> {
        Ok(self.users.read().get(key).cloned())
    }

    fn put_user(&self, key: &NameHash, record: &UserRecord) -> Result<()> {
        self.users.write().insert(*key, record.clone());
        Ok(())
    }

    fn remove_user(&self, key: &NameHash) -> Result<Option<UserRecord>> {
        Ok(self.users.write().remove(key))
    }

    fn user_count(&self) -> Result<u64> {
        Ok(self.users.read().len() as u64)
    }

    fn get_application(
        &self,
        namespace: AppNamespace,
        key: &NameHash,
    ) -> Result<Option<ApplicationRecord>> {
        Ok(self.applications(namespace).read().get(key).cloned())
    }

    fn put_application(
        &self,
        namespace: AppNamespace,
        key: &NameHash,
        record: &ApplicationRecord,
    ) -> Result<()> {
        self.applications(namespace)
            .write()
            .insert(*key, record.clone());
        Ok(())
    }

    fn remove_application(
        &self,
        namespace: AppNamespace,
        key: &NameHash,
    ) -> Result<Option<ApplicationRecord>> {
        Ok(self.applications(namespace).write().remove(key))
    }

    fn application_count(&self, namespace: AppNamespace) -> Result<u64> {
        Ok(self.applications(namespace).read().len() as u64)
    }

    fn get_fee_schedule(&self) -> Result<Option<FeeSchedule>> {
        Ok(*self.fee_schedule.read())
    }

    fn put_fee_schedule(&self, schedule: &FeeSchedule) -> Result<()> {
        *self.fee_schedule.write() = Some(*schedule);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use namereg_types::Address;
    use tempfile::TempDir;

    fn exercise_directories(storage: &dyn Storage) {
        let key = NameHash::of("alice");
        let user = UserRecord::new("alice", Address([7u8; 20]), false);

        assert!(storage.get_user(&key).unwrap().is_none());
        storage.put_user(&key, &user).unwrap();
        assert_eq!(storage.get_user(&key).unwrap(), Some(user.clone()));
        assert_eq!(storage.user_count().unwrap(), 1);
        assert_eq!(storage.remove_user(&key).unwrap(), Some(user));
        assert!(storage.get_user(&key).unwrap().is_none());
        assert!(storage.remove_user(&key).unwrap().is_none());

        let app_key = NameHash::of("hydro");
        let official = ApplicationRecord::new("hydro", true);
        storage
            .put_application(AppNamespace::Official, &app_key, &official)
            .unwrap();
        assert_eq!(
            storage
                .get_application(AppNamespace::Official, &app_key)
                .unwrap(),
            Some(official)
        );
        assert!(storage
            .get_application(AppNamespace::Unofficial, &app_key)
            .unwrap()
            .is_none());
        assert_eq!(
            storage.application_count(AppNamespace::Official).unwrap(),
            1
        );
        assert_eq!(
            storage.application_count(AppNamespace::Unofficial).unwrap(),
            0
        );

        assert!(storage.get_fee_schedule().unwrap().is_none());
        let fees = FeeSchedule::new(100, 250);
        storage.put_fee_schedule(&fees).unwrap();
        assert_eq!(storage.get_fee_schedule().unwrap(), Some(fees));
    }

    #[test]
    fn memory_storage_directories() {
        exercise_directories(&MemoryStorage::new());
    }

    #[test]
    fn sled_storage_directories() {
        let dir = TempDir::new().unwrap();
        let storage = SledStorage::new(dir.path()).unwrap();
        exercise_directories(&storage);
    }

    #[test]
    fn sled_storage_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let key = NameHash::of("bob");
        let user = UserRecord::new("bob", Address([9u8; 20]), true);

        {
            let storage = SledStorage::new(dir.path()).unwrap();
            storage.initialize(&FeeSchedule::new(5, 6)).unwrap();
            storage.put_user(&key, &user).unwrap();
            storage.flush().unwrap();
        }

        let storage = SledStorage::new(dir.path()).unwrap();
        assert_eq!(storage.get_user(&key).unwrap(), Some(user));
        assert_eq!(
            storage.get_fee_schedule().unwrap(),
            Some(FeeSchedule::new(5, 6))
        );
    }

    #[test]
    fn initialize_does_not_overwrite_existing_fees() {
        let dir = TempDir::new().unwrap();
        let storage = SledStorage::new(dir.path()).unwrap();
        storage.put_fee_schedule(&FeeSchedule::new(42, 43)).unwrap();
        storage.initialize(&FeeSchedule::new(1, 1)).unwrap();
        assert_eq!(
            storage.get_fee_schedule().unwrap(),
            Some(FeeSchedule::new(42, 43))
        );
    }

    #[test]
    fn memory_storage_with_fees_is_seeded() {
        let storage = MemoryStorage::with_fees(FeeSchedule::new(3, 4));
        assert_eq!(
            storage.get_fee_schedule().unwrap(),
            Some(FeeSchedule::new(3, 4))
        );
    }
}
