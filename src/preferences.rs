//! Last-used rotation choices, remembered per source profile.
//!
//! The file is convenience state only: a missing or malformed file loads as
//! empty preferences and never stops a rotation.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::{collections::BTreeMap, path::PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use crate::{constants, fsutil};

/// Choices made the last time a given source profile was rotated
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceProfilePreference {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "MfaDevice")]
    pub mfa_device: String,
    #[serde(rename = "DestinationProfile")]
    pub destination_profile: String,
    /// Zero means no lifetime was recorded
    #[serde(rename = "TTL")]
    pub ttl: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    #[serde(rename = "PreviousSourceProfile")]
    pub last_source_profile: String,
    #[serde(rename = "PreviousMFADevice")]
    pub last_mfa_device: String,
    #[serde(rename = "PreviousRegion")]
    pub last_region: String,
    #[serde(rename = "SourceProfiles", deserialize_with = "null_as_default")]
    pub source_profiles: BTreeMap<String, SourceProfilePreference>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl Preferences {
    /// Previous choices for `source`, if it was ever rotated
    pub fn source_profile(&self, source: &str) -> Option<&SourceProfilePreference> {
        self.source_profiles.get(source)
    }

    /// Remember the choices of a rotation about to be attempted
    pub fn record(&mut self, source: &str, mfa_device: &str, destination: &str, ttl: u32) {
        self.last_source_profile = source.to_string();
        self.last_mfa_device = mfa_device.to_string();
        self.source_profiles.insert(
            source.to_string(),
            SourceProfilePreference {
                name: source.to_string(),
                mfa_device: mfa_device.to_string(),
                destination_profile: destination.to_string(),
                ttl,
            },
        );
    }
}

#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_default_path() -> Result<Self> {
        constants::get_preferences_path()
            .map(Self::new)
            .context("Failed to determine preference file path")
    }

    pub async fn load(&self) -> Preferences {
        let content = match fs::read(&self.path).await {
            Ok(content) => content,
            Err(e) => {
                debug!("No preferences loaded from {}: {}", self.path.display(), e);
                return Preferences::default();
            }
        };

        serde_json::from_slice(&content).unwrap_or_else(|e| {
            warn!(
                "Ignoring malformed preference file {}: {}",
                self.path.display(),
                e
            );
            Preferences::default()
        })
    }

    pub async fn save(&self, preferences: &Preferences) -> Result<()> {
        let raw = serde_json::to_vec_pretty(preferences).context("Failed to encode preferences")?;

        fsutil::replace_file(&self.path, &raw)
            .await
            .with_context(|| format!("Failed to save preferences to {}", self.path.display()))?;

        debug!("Preferences saved to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store_in(dir: &tempfile::TempDir) -> PreferenceStore {
        PreferenceStore::new(dir.path().join("aws-mfa-util.json"))
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let prefs = store_in(&dir).load().await;
        assert_eq!(prefs, Preferences::default());
        assert!(prefs.source_profile("alice").is_none());
    }

    #[tokio::test]
    async fn test_load_malformed_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(&store.path, b"{ not json").await.unwrap();

        assert_eq!(store.load().await, Preferences::default());
    }

    #[tokio::test]
    async fn test_round_trip_empty() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);

        store.save(&Preferences::default()).await.unwrap();
        assert_eq!(store.load().await, Preferences::default());
    }

    #[tokio::test]
    async fn test_round_trip_with_profiles() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);

        let mut prefs = Preferences::default();
        prefs.record("alice", "arn:aws:iam::123456789012:mfa/alice", "alice-mfa", 900);
        prefs.record("bob", "GAHT12345678", "bob-session", 0);
        prefs.last_region = "eu-west-1".to_string();

        store.save(&prefs).await.unwrap();
        let loaded = store.load().await;

        assert_eq!(loaded, prefs);
        assert_eq!(loaded.last_source_profile, "bob");
        assert_eq!(loaded.last_mfa_device, "GAHT12345678");
    }

    #[test]
    fn test_record_overwrites_previous_entry() {
        let mut prefs = Preferences::default();
        prefs.record("alice", "dev-1", "alice-mfa", 900);
        prefs.record("alice", "dev-2", "alice-other", 1800);

        let entry = prefs.source_profile("alice").unwrap();
        assert_eq!(entry.mfa_device, "dev-2");
        assert_eq!(entry.destination_profile, "alice-other");
        assert_eq!(entry.ttl, 1800);
        assert_eq!(prefs.source_profiles.len(), 1);
    }

    #[test]
    fn test_reads_legacy_layout() {
        let raw = r#"{
            "PreviousSourceProfile": "alice",
            "PreviousMFADevice": "arn:aws:iam::123456789012:mfa/alice",
            "PreviousRegion": "",
            "SourceProfiles": {
                "alice": {
                    "Name": "alice",
                    "MfaDevice": "arn:aws:iam::123456789012:mfa/alice",
                    "DestinationProfile": "alice-mfa",
                    "TTL": 900
                }
            }
        }"#;

        let prefs: Preferences = serde_json::from_str(raw).unwrap();
        assert_eq!(prefs.last_source_profile, "alice");
        assert_eq!(prefs.source_profile("alice").unwrap().ttl, 900);
    }

    #[test]
    fn test_null_source_profiles() {
        let raw = r#"{"PreviousSourceProfile": "", "SourceProfiles": null}"#;
        let prefs: Preferences = serde_json::from_str(raw).unwrap();
        assert!(prefs.source_profiles.is_empty());
    }
}
