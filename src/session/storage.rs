use super::keys::{
    KEY_ACCESS_TOKEN, KEY_NAME, KEY_ORGANIZATION_NAME, KEY_REFRESH_TOKEN, KEY_ROLE,
    LEGACY_KEY_ORGANIZATION,
};
use super::store::{SessionStore, StoreError};
use crate::auth::TokenGrant;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub name: Option<String>,
    pub role: Option<String>,
    pub organization_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    #[serde(skip_serializing)]
    pub access_token: String,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    #[serde(flatten)]
    pub profile: Profile,
}

/// Typed view over a [`SessionStore`] using the dashboard's key layout.
#[derive(Clone)]
pub struct SessionStorage {
    store: Arc<dyn SessionStore>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl SessionStorage {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(non_empty(self.store.get(key)?))
    }

    fn write_optional(&self, key: &str, value: Option<&str>) -> Result<(), StoreError> {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(value) => self.store.set(key, value),
            None => Ok(()),
        }
    }

    pub fn access_token(&self) -> Result<Option<String>, StoreError> {
        self.read(KEY_ACCESS_TOKEN)
    }

    pub fn refresh_token(&self) -> Result<Option<String>, StoreError> {
        self.read(KEY_REFRESH_TOKEN)
    }

    pub fn profile(&self) -> Result<Profile, StoreError> {
        let organization_name = match self.read(KEY_ORGANIZATION_NAME)? {
            Some(org) => Some(org),
            None => self.read(LEGACY_KEY_ORGANIZATION)?,
        };
        Ok(Profile {
            name: self.read(KEY_NAME)?,
            role: self.read(KEY_ROLE)?,
            organization_name,
        })
    }

    pub fn load(&self) -> Result<Option<Session>, StoreError> {
        let Some(access_token) = self.access_token()? else {
            return Ok(None);
        };
        Ok(Some(Session {
            access_token,
            refresh_token: self.refresh_token()?,
            profile: self.profile()?,
        }))
    }

    /// Stores a login or refresh grant. Fields the grant leaves out keep
    /// their previous value.
    pub fn persist_grant(&self, grant: &TokenGrant) -> Result<(), StoreError> {
        self.store.set(KEY_ACCESS_TOKEN, grant.access.trim())?;
        self.write_optional(KEY_REFRESH_TOKEN, grant.refresh.as_deref())?;
        self.write_optional(KEY_NAME, grant.name.as_deref())?;
        self.write_optional(KEY_ROLE, grant.role.as_deref())?;
        if let Some(org) = grant
            .organization_name
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            self.store.set(KEY_ORGANIZATION_NAME, org)?;
            self.store.remove(LEGACY_KEY_ORGANIZATION)?;
        }
        Ok(())
    }

    pub fn set_name(&self, name: &str) -> Result<(), StoreError> {
        self.write_optional(KEY_NAME, Some(name))
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::store::MemorySessionStore;

    fn grant(access: &str, refresh: Option<&str>) -> TokenGrant {
        TokenGrant {
            access: access.to_string(),
            refresh: refresh.map(str::to_string),
            name: Some("Ada".to_string()),
            role: Some("Account Manager".to_string()),
            organization_name: Some("Acme Events".to_string()),
        }
    }

    #[test]
    fn persist_grant_writes_canonical_keys_and_drops_legacy_org() {
        let store = Arc::new(MemorySessionStore::with_values([(
            LEGACY_KEY_ORGANIZATION,
            "Old Org",
        )]));
        let storage = SessionStorage::new(store.clone());

        storage.persist_grant(&grant("tok1", Some("ref1"))).unwrap();

        assert_eq!(store.get(KEY_ACCESS_TOKEN).unwrap().as_deref(), Some("tok1"));
        assert_eq!(store.get(KEY_REFRESH_TOKEN).unwrap().as_deref(), Some("ref1"));
        assert_eq!(
            store.get(KEY_ORGANIZATION_NAME).unwrap().as_deref(),
            Some("Acme Events")
        );
        assert_eq!(store.get(LEGACY_KEY_ORGANIZATION).unwrap(), None);
    }

    #[test]
    fn grant_without_refresh_keeps_existing_refresh_token() {
        let store = Arc::new(MemorySessionStore::with_values([(KEY_REFRESH_TOKEN, "ref1")]));
        let storage = SessionStorage::new(store);

        storage.persist_grant(&grant("tok2", None)).unwrap();

        assert_eq!(storage.refresh_token().unwrap().as_deref(), Some("ref1"));
        assert_eq!(storage.access_token().unwrap().as_deref(), Some("tok2"));
    }

    #[test]
    fn profile_falls_back_to_legacy_organization_key() {
        let store = Arc::new(MemorySessionStore::with_values([
            (KEY_NAME, "Grace"),
            (LEGACY_KEY_ORGANIZATION, "Legacy Org"),
        ]));
        let storage = SessionStorage::new(store);

        let profile = storage.profile().unwrap();
        assert_eq!(profile.name.as_deref(), Some("Grace"));
        assert_eq!(profile.organization_name.as_deref(), Some("Legacy Org"));
        assert_eq!(profile.role, None);
    }

    #[test]
    fn set_name_updates_only_the_display_name() {
        let store = Arc::new(MemorySessionStore::with_values([
            (KEY_ACCESS_TOKEN, "tok1"),
            (KEY_NAME, "Ada"),
            (KEY_ORGANIZATION_NAME, "Acme Events"),
        ]));
        let storage = SessionStorage::new(store);

        storage.set_name("Ada Lovelace").unwrap();

        let session = storage.load().unwrap().unwrap();
        assert_eq!(session.access_token, "tok1");
        assert_eq!(session.profile.name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(
            session.profile.organization_name.as_deref(),
            Some("Acme Events")
        );
    }

    #[test]
    fn blank_values_read_as_absent() {
        let store = Arc::new(MemorySessionStore::with_values([(KEY_ACCESS_TOKEN, "  ")]));
        let storage = SessionStorage::new(store);
        assert_eq!(storage.access_token().unwrap(), None);
        assert_eq!(storage.load().unwrap(), None);
    }
}
