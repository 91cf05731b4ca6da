//! Persistent cache of analyzed parameter profiles.
//!
//! `ProfileCache` wraps any [`ProfileStore`] and adds the owner-level
//! consistency rule: invalidating an owner is exclusive, so no concurrent
//! reader sees an owner half deleted. Single-key reads and writes share the
//! gate and run concurrently.

mod sqlite;
mod store;

use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::info;

use crate::classifier::ParameterType;
use crate::error::{ParamScopeError, Result};
use crate::profile::{OwnerIdentity, ParameterId, ParameterProfile};

pub use sqlite::SqliteProfileStore;
pub use store::{MemoryProfileStore, ProfileStore};

/// File name of the profile database inside the data directory.
pub const PROFILE_DB_FILE: &str = "parameter_profiles.db";

/// Default database location: `<data dir>/paramscope/parameter_profiles.db`.
///
/// Returns `None` on platforms without a data directory.
pub fn default_db_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("paramscope").join(PROFILE_DB_FILE))
}

pub struct ProfileCache<S: ProfileStore> {
    store: S,
    gate: RwLock<()>,
}

impl<S: ProfileStore> ProfileCache<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            gate: RwLock::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn shared(&self) -> Result<RwLockReadGuard<'_, ()>> {
        self.gate
            .read()
            .map_err(|_| ParamScopeError::Storage("profile cache lock poisoned".to_string()))
    }

    fn exclusive(&self) -> Result<RwLockWriteGuard<'_, ()>> {
        self.gate
            .write()
            .map_err(|_| ParamScopeError::Storage("profile cache lock poisoned".to_string()))
    }

    /// Cached profile for one parameter, or `None` if it was never analyzed.
    pub fn get(&self, id: &ParameterId) -> Result<Option<ParameterProfile>> {
        let _gate = self.shared()?;
        self.store.load(id)
    }

    /// Store a profile under its own id, replacing any previous entry.
    pub fn put(&self, profile: &ParameterProfile) -> Result<()> {
        let _gate = self.shared()?;
        self.store.save(profile)?;
        info!(
            "Cached {} profile for {} (confidence {:.2})",
            profile.classification.label(),
            profile.id,
            profile.confidence()
        );
        Ok(())
    }

    /// Delete every profile of `owner` as one exclusive operation.
    pub fn invalidate_owner(&self, owner: &OwnerIdentity) -> Result<usize> {
        let _gate = self.exclusive()?;
        let count = self.store.delete_owner(owner)?;
        info!("Invalidated {} cached profiles for {}", count, owner);
        Ok(count)
    }

    /// All cached profiles of `owner`, unfiltered.
    pub fn list_owner(&self, owner: &OwnerIdentity) -> Result<Vec<ParameterProfile>> {
        let _gate = self.shared()?;
        self.store.list_owner(owner)
    }

    /// Consumer-facing lookup; same as [`ProfileCache::get`].
    pub fn get_profile(&self, id: &ParameterId) -> Result<Option<ParameterProfile>> {
        self.get(id)
    }

    /// Classified profiles of `owner` with confidence at or above `min_confidence`.
    ///
    /// Unknown-type profiles are never returned, whatever their confidence.
    pub fn list_confident_profiles(
        &self,
        owner: &OwnerIdentity,
        min_confidence: f64,
    ) -> Result<Vec<ParameterProfile>> {
        let profiles = self.list_owner(owner)?;
        Ok(profiles
            .into_iter()
            .filter(|p| p.param_type() != ParameterType::Unknown)
            .filter(|p| p.is_confident(min_confidence))
            .collect())
    }
}
