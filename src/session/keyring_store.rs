use super::keys::ALL_KEYS;
use super::store::{SessionStore, StoreError};
use std::collections::HashMap;
use std::sync::Mutex;

const KEYRING_SERVICE: &str = "com.plantra.dashboard";

/// Session store backed by the OS keychain / secret service, one entry per
/// session key. Entries are created lazily and reused.
pub struct KeyringSessionStore {
    service: String,
    entries: Mutex<HashMap<String, keyring::Entry>>,
}

fn map_keyring_error(err: keyring::Error) -> StoreError {
    StoreError::Keyring(err.to_string())
}

impl KeyringSessionStore {
    pub fn new() -> Self {
        Self::with_service(KEYRING_SERVICE)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_available(&self) -> bool {
        match self.get(super::keys::KEY_ACCESS_TOKEN) {
            Ok(_) => true,
            Err(err) => {
                tracing::debug!("keyring probe failed: {err}");
                false
            }
        }
    }

    fn with_entry<T>(
        &self,
        key: &str,
        op: impl FnOnce(&keyring::Entry) -> Result<T, keyring::Error>,
    ) -> Result<T, StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        if !entries.contains_key(key) {
            let entry = keyring::Entry::new(&self.service, key).map_err(map_keyring_error)?;
            entries.insert(key.to_string(), entry);
        }
        let entry = entries.get(key).ok_or(StoreError::Poisoned)?;
        op(entry).map_err(map_keyring_error)
    }
}

impl Default for KeyringSessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for KeyringSessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.with_entry(key, |entry| match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(keyring::Error::BadEncoding(_)) => Ok(None),
            Err(err) => Err(err),
        })
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.with_entry(key, |entry| entry.set_password(value))
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.with_entry(key, |entry| match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(err) => Err(err),
        })
    }

    fn clear(&self) -> Result<(), StoreError> {
        // The keyring cannot enumerate a service, so clear the known keys.
        for key in ALL_KEYS {
            self.remove(key)?;
        }
        Ok(())
    }
}
