//! GCP project profile and instance layout

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::utils::ConfigError;

pub const PROFILE_PATH: &str = "gcp/config.yml";
pub const CREDENTIALS_PATH: &str = "gcp/credentials.json";

/// Project settings read from `gcp/config.yml`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcpProfile {
    pub project_id: String,
    pub username: String,
}

/// Both fields may be written unquoted, so numbers are accepted too
#[derive(Deserialize)]
struct RawProfile {
    project_id: serde_yaml::Value,
    username: serde_yaml::Value,
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl GcpProfile {
    /// Parse profile YAML
    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let raw: RawProfile =
            serde_yaml::from_str(content).map_err(|source| ConfigError::InvalidProfile {
                path: path.to_path_buf(),
                source,
            })?;

        let field = |value: &serde_yaml::Value, name: &str| {
            scalar_to_string(value).ok_or_else(|| ConfigError::InvalidProfile {
                path: path.to_path_buf(),
                source: serde::de::Error::custom(format!("'{}' must be a scalar", name)),
            })
        };

        Ok(Self {
            project_id: field(&raw.project_id, "project_id")?,
            username: field(&raw.username, "username")?,
        })
    }

    /// Load the profile under `base_dir` and check the credentials file exists
    pub fn load(base_dir: &Path) -> Result<Self, ConfigError> {
        let path = base_dir.join(PROFILE_PATH);
        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let profile = Self::parse(&content, &path)?;

        let credentials = Self::credentials_path(base_dir);
        if !credentials.is_file() {
            return Err(ConfigError::MissingFile(credentials));
        }
        Ok(profile)
    }

    pub fn credentials_path(base_dir: &Path) -> PathBuf {
        base_dir.join(CREDENTIALS_PATH)
    }
}

/// A named machine in a zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcpInstance {
    pub name: String,
    pub zone: String,
}

impl GcpInstance {
    pub fn new(name: &str, zone: &str) -> Self {
        Self {
            name: name.to_string(),
            zone: zone.to_string(),
        }
    }
}

/// Machines created by the terraform deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcpLayout {
    pub app_wrk2: GcpInstance,
    pub app_eu: GcpInstance,
    pub app_us: GcpInstance,
    pub db_manager: GcpInstance,
    pub db_eu: GcpInstance,
    pub db_us: GcpInstance,
}

pub const ZONE_MANAGER: &str = "europe-west3-a";
pub const ZONE_EU: &str = "europe-west3-a";
pub const ZONE_US: &str = "us-central1-a";

impl Default for GcpLayout {
    fn default() -> Self {
        Self {
            app_wrk2: GcpInstance::new("weaver-dsb-app-wrk2", ZONE_MANAGER),
            app_eu: GcpInstance::new("weaver-dsb-app-eu", ZONE_EU),
            app_us: GcpInstance::new("weaver-dsb-app-us", ZONE_US),
            db_manager: GcpInstance::new("weaver-dsb-db-manager", ZONE_MANAGER),
            db_eu: GcpInstance::new("weaver-dsb-db-eu", ZONE_EU),
            db_us: GcpInstance::new("weaver-dsb-db-us", ZONE_US),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_profile() {
        let profile = GcpProfile::parse(
            "project_id: dsb-1234\nusername: bench\n",
            Path::new("config.yml"),
        )
        .unwrap();
        assert_eq!(profile.project_id, "dsb-1234");
        assert_eq!(profile.username, "bench");
    }

    #[test]
    fn test_parse_numeric_project() {
        let profile =
            GcpProfile::parse("project_id: 123456\nusername: bench\n", Path::new("c.yml")).unwrap();
        assert_eq!(profile.project_id, "123456");
    }

    #[test]
    fn test_parse_missing_field() {
        let err = GcpProfile::parse("project_id: x\n", Path::new("c.yml")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidProfile { .. }));
    }

    #[test]
    fn test_load_requires_credentials() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("gcp")).unwrap();
        fs::write(
            dir.path().join(PROFILE_PATH),
            "project_id: p\nusername: u\n",
        )
        .unwrap();
        assert!(matches!(
            GcpProfile::load(dir.path()),
            Err(ConfigError::MissingFile(_))
        ));

        fs::write(dir.path().join(CREDENTIALS_PATH), "{}").unwrap();
        assert_eq!(GcpProfile::load(dir.path()).unwrap().username, "u");
    }

    #[test]
    fn test_default_layout() {
        let layout = GcpLayout::default();
        assert_eq!(layout.db_us.zone, "us-central1-a");
        assert_eq!(layout.db_manager.name, "weaver-dsb-db-manager");
    }
}
