use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use crate::classifier::{Classification, ParameterType, ScalingType};
use crate::error::{ParamScopeError, Result};
use crate::profile::{OwnerIdentity, ParameterId, ParameterProfile, ParameterSample};

use super::store::ProfileStore;

const PROFILE_COLUMNS: &str = "plugin_name, plugin_format, param_index, param_name, param_type,
     scaling, confidence, unit, min_formatted, max_formatted, enum_values_json,
     samples_json, analyzed_at";

/// SQLite-backed profile store.
///
/// All operations are synchronous (rusqlite is blocking). The connection is
/// guarded by a mutex so the store can be shared across threads.
pub struct SqliteProfileStore {
    conn: Mutex<Connection>,
}

impl SqliteProfileStore {
    /// Open or create the profile database at the given path.
    /// Creates the parent directory, the `parameter_profiles` table and its
    /// owner index if they don't exist.
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ParamScopeError::Storage(format!("Failed to create data dir {:?}: {}", parent, e))
            })?;
        }

        let conn = Connection::open(db_path).map_err(|e| {
            ParamScopeError::Storage(format!(
                "Failed to open profile database at {:?}: {}",
                db_path, e
            ))
        })?;
        let store = Self::with_connection(conn)?;
        info!("Opened parameter profile database at {:?}", db_path);
        Ok(store)
    }

    /// A private database that lives as long as the store.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS parameter_profiles (
                plugin_name TEXT NOT NULL,
                plugin_format TEXT NOT NULL,
                param_index INTEGER NOT NULL,
                param_name TEXT,
                param_type TEXT NOT NULL,
                scaling TEXT,
                confidence REAL NOT NULL,
                unit TEXT,
                min_formatted TEXT NOT NULL,
                max_formatted TEXT NOT NULL,
                enum_values_json TEXT,
                samples_json TEXT NOT NULL,
                analyzed_at TEXT,
                PRIMARY KEY (plugin_name, plugin_format, param_index)
            );
            CREATE INDEX IF NOT EXISTS idx_parameter_profiles_owner
                ON parameter_profiles(plugin_name, plugin_format);",
        )
        .map_err(|e| ParamScopeError::Storage(format!("Failed to create profile table: {}", e)))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ParamScopeError::Storage("profile database lock poisoned".to_string()))
    }
}

impl ProfileStore for SqliteProfileStore {
    fn load(&self, id: &ParameterId) -> Result<Option<ParameterProfile>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                &format!(
                    "SELECT {} FROM parameter_profiles
                     WHERE plugin_name = ?1 AND plugin_format = ?2 AND param_index = ?3",
                    PROFILE_COLUMNS
                ),
                params![id.owner.plugin_name, id.owner.plugin_format, id.index],
                ProfileRow::from_row,
            )
            .optional()?;

        row.map(ProfileRow::into_profile).transpose()
    }

    fn save(&self, profile: &ParameterProfile) -> Result<()> {
        let samples_json = serde_json::to_string(&profile.samples)?;
        let enum_values_json = profile
            .enum_values
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let classification = &profile.classification;

        let conn = self.conn()?;
        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO parameter_profiles ({})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                PROFILE_COLUMNS
            ),
            params![
                profile.id.owner.plugin_name,
                profile.id.owner.plugin_format,
                profile.id.index,
                profile.param_name,
                classification.param_type.as_str(),
                classification.scaling.map(|s| s.as_str()),
                classification.confidence,
                profile.unit,
                profile.min_formatted,
                profile.max_formatted,
                enum_values_json,
                samples_json,
                profile.analyzed_at,
            ],
        )?;

        debug!("Stored profile for {}", profile.id);
        Ok(())
    }

    fn delete_owner(&self, owner: &OwnerIdentity) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let count = tx.execute(
            "DELETE FROM parameter_profiles WHERE plugin_name = ?1 AND plugin_format = ?2",
            params![owner.plugin_name, owner.plugin_format],
        )?;
        tx.commit()?;
        Ok(count)
    }

    fn list_owner(&self, owner: &OwnerIdentity) -> Result<Vec<ParameterProfile>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM parameter_profiles
             WHERE plugin_name = ?1 AND plugin_format = ?2
             ORDER BY param_index",
            PROFILE_COLUMNS
        ))?;

        let rows = stmt
            .query_map(
                params![owner.plugin_name, owner.plugin_format],
                ProfileRow::from_row,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter().map(ProfileRow::into_profile).collect()
    }
}

/// Raw column values of one `parameter_profiles` row.
struct ProfileRow {
    plugin_name: String,
    plugin_format: String,
    param_index: u32,
    param_name: Option<String>,
    param_type: String,
    scaling: Option<String>,
    confidence: f64,
    unit: Option<String>,
    min_formatted: String,
    max_formatted: String,
    enum_values_json: Option<String>,
    samples_json: String,
    analyzed_at: Option<String>,
}

impl ProfileRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            plugin_name: row.get(0)?,
            plugin_format: row.get(1)?,
            param_index: row.get(2)?,
            param_name: row.get(3)?,
            param_type: row.get(4)?,
            scaling: row.get(5)?,
            confidence: row.get(6)?,
            unit: row.get(7)?,
            min_formatted: row.get(8)?,
            max_formatted: row.get(9)?,
            enum_values_json: row.get(10)?,
            samples_json: row.get(11)?,
            analyzed_at: row.get(12)?,
        })
    }

    fn into_profile(self) -> Result<ParameterProfile> {
        let samples: Vec<ParameterSample> = serde_json::from_str(&self.samples_json)?;
        let enum_values = self
            .enum_values_json
            .as_deref()
            .map(serde_json::from_str::<Vec<String>>)
            .transpose()?;

        Ok(ParameterProfile {
            id: ParameterId::new(
                OwnerIdentity::new(self.plugin_name, self.plugin_format),
                self.param_index,
            ),
            param_name: self.param_name,
            classification: Classification {
                param_type: ParameterType::from_str(&self.param_type),
                scaling: self.scaling.as_deref().map(ScalingType::from_str),
                confidence: self.confidence,
            },
            samples,
            enum_values,
            unit: self.unit,
            min_formatted: self.min_formatted,
            max_formatted: self.max_formatted,
            analyzed_at: self.analyzed_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;
    use crate::sampler::DEFAULT_SAMPLE_POINTS;
    use tempfile::TempDir;

    fn make_profile(plugin: &str, format: &str, index: u32, gain: f64) -> ParameterProfile {
        let samples: Vec<_> = DEFAULT_SAMPLE_POINTS
            .iter()
            .map(|&x| ParameterSample::capture(x, format!("{:.1} dB", x * gain)))
            .collect();
        let classification = classify(&samples);
        ParameterProfile::from_samples(
            ParameterId::new(OwnerIdentity::new(plugin, format), index),
            Some(format!("Param {}", index)),
            samples,
            classification,
        )
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let store = SqliteProfileStore::open(&dir.path().join("profiles.db")).unwrap();
        let profile = make_profile("ReaComp", "VST3", 0, 12.0);

        store.save(&profile).unwrap();
        let loaded = store.load(&profile.id).unwrap().unwrap();
        assert_eq!(loaded, profile);
    }

    #[test]
    fn test_load_missing_is_none() {
        let store = SqliteProfileStore::open_in_memory().unwrap();
        let id = ParameterId::new(OwnerIdentity::new("ReaComp", "VST3"), 9);
        assert!(store.load(&id).unwrap().is_none());
    }

    #[test]
    fn test_save_replaces_whole_row() {
        let store = SqliteProfileStore::open_in_memory().unwrap();
        let first = make_profile("ReaComp", "VST3", 1, 12.0);
        store.save(&first).unwrap();

        let mut second = make_profile("ReaComp", "VST3", 1, 24.0);
        second.param_name = None;
        store.save(&second).unwrap();

        let loaded = store.load(&first.id).unwrap().unwrap();
        assert_eq!(loaded.param_name, None);
        assert_eq!(loaded.max_formatted, "24.0 dB");
        assert_eq!(store.list_owner(&first.id.owner).unwrap().len(), 1);
    }

    #[test]
    fn test_enum_values_round_trip() {
        let store = SqliteProfileStore::open_in_memory().unwrap();
        let names = ["Peak", "RMS", "Peak", "Hold"];
        let samples: Vec<_> = DEFAULT_SAMPLE_POINTS
            .iter()
            .map(|&x| ParameterSample::capture(x, names[((x * 3.999) as usize).min(3)]))
            .collect();
        let classification = classify(&samples);
        let profile = ParameterProfile::from_samples(
            ParameterId::new(OwnerIdentity::new("ReaComp", "VST3"), 7),
            None,
            samples,
            classification,
        );

        store.save(&profile).unwrap();
        let loaded = store.load(&profile.id).unwrap().unwrap();
        assert_eq!(loaded.param_type(), ParameterType::Enumerated);
        assert_eq!(loaded.classification.scaling, None);
        assert_eq!(loaded.enum_values, profile.enum_values);
    }

    #[test]
    fn test_delete_owner_and_list() {
        let store = SqliteProfileStore::open_in_memory().unwrap();
        for index in [2, 0, 1] {
            store.save(&make_profile("ReaComp", "VST3", index, 12.0)).unwrap();
        }
        store.save(&make_profile("ReaComp", "AU", 0, 12.0)).unwrap();

        let owner = OwnerIdentity::new("ReaComp", "VST3");
        let indices: Vec<u32> = store
            .list_owner(&owner)
            .unwrap()
            .iter()
            .map(|p| p.id.index)
            .collect();
        assert_eq!(indices, vec![0, 1, 2]);

        assert_eq!(store.delete_owner(&owner).unwrap(), 3);
        assert!(store.list_owner(&owner).unwrap().is_empty());
        assert_eq!(
            store
                .list_owner(&OwnerIdentity::new("ReaComp", "AU"))
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_corrupt_samples_are_serialization_errors() {
        let store = SqliteProfileStore::open_in_memory().unwrap();
        let profile = make_profile("ReaComp", "VST3", 0, 12.0);
        store.save(&profile).unwrap();

        store
            .conn()
            .unwrap()
            .execute(
                "UPDATE parameter_profiles SET samples_json = 'not json'",
                [],
            )
            .unwrap();

        let err = store.load(&profile.id).unwrap_err();
        assert!(matches!(err, ParamScopeError::Serialization(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_reopen_keeps_profiles() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("profiles.db");
        let profile = make_profile("ReaEQ", "VST", 3, 6.0);

        {
            let store = SqliteProfileStore::open(&path).unwrap();
            store.save(&profile).unwrap();
        }

        let store = SqliteProfileStore::open(&path).unwrap();
        assert_eq!(store.load(&profile.id).unwrap(), Some(profile));
    }
}
