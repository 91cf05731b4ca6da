use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{ParamScopeError, Result};
use crate::profile::{OwnerIdentity, ParameterId, ParameterProfile};

/// Keyed persistence for parameter profiles.
///
/// Keys are `(owner, index)` pairs. `save` replaces any existing entry
/// for the profile's key in full. Implementations report I/O failures as
/// `ParamScopeError::Storage`; a missing key is `Ok(None)`, never an error.
pub trait ProfileStore: Send + Sync {
    fn load(&self, id: &ParameterId) -> Result<Option<ParameterProfile>>;

    fn save(&self, profile: &ParameterProfile) -> Result<()>;

    /// Delete every profile of `owner`. Returns the number removed.
    fn delete_owner(&self, owner: &OwnerIdentity) -> Result<usize>;

    /// All profiles of `owner`, ordered by parameter index.
    fn list_owner(&self, owner: &OwnerIdentity) -> Result<Vec<ParameterProfile>>;
}

/// Process-local store for hosts that do not persist profiles.
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    profiles: RwLock<HashMap<ParameterId, ParameterProfile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.profiles.read().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> ParamScopeError {
    ParamScopeError::Storage("profile store lock poisoned".to_string())
}

impl ProfileStore for MemoryProfileStore {
    fn load(&self, id: &ParameterId) -> Result<Option<ParameterProfile>> {
        let profiles = self.profiles.read().map_err(|_| poisoned())?;
        Ok(profiles.get(id).cloned())
    }

    fn save(&self, profile: &ParameterProfile) -> Result<()> {
        let mut profiles = self.profiles.write().map_err(|_| poisoned())?;
        profiles.insert(profile.id.clone(), profile.clone());
        Ok(())
    }

    fn delete_owner(&self, owner: &OwnerIdentity) -> Result<usize> {
        let mut profiles = self.profiles.write().map_err(|_| poisoned())?;
        let before = profiles.len();
        profiles.retain(|id, _| &id.owner != owner);
        Ok(before - profiles.len())
    }

    fn list_owner(&self, owner: &OwnerIdentity) -> Result<Vec<ParameterProfile>> {
        let profiles = self.profiles.read().map_err(|_| poisoned())?;
        let mut owned: Vec<ParameterProfile> = profiles
            .values()
            .filter(|p| &p.id.owner == owner)
            .cloned()
            .collect();
        owned.sort_by_key(|p| p.id.index);
        Ok(owned)
    }
}
