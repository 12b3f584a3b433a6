//! Server configuration read from the environment

use crate::backup::GithubBackupConfig;
use std::path::PathBuf;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_BACKUP_PATH: &str = "data/disclosure_game_data.csv";
const DEFAULT_BACKUP_BRANCH: &str = "main";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub port: u16,
    /// Admin routes answer 403 while this is unset
    pub admin_key: Option<String>,
    /// Include the assigned condition in session views (debugging only)
    pub expose_condition: bool,
    pub backup: Option<GithubBackupConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let db_path = get("DISCLOSURE_DB_PATH").map_or_else(
            || {
                let home = get("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(home).join(".disclosure-game").join("data.db")
            },
            PathBuf::from,
        );

        let port = get("DISCLOSURE_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let expose_condition = get("EXPOSE_CONDITION")
            .is_some_and(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"));

        let backup = match (get("GITHUB_BACKUP_TOKEN"), get("GITHUB_BACKUP_REPO")) {
            (Some(token), Some(repo)) => Some(GithubBackupConfig {
                token,
                repo,
                path: get("GITHUB_BACKUP_PATH").unwrap_or_else(|| DEFAULT_BACKUP_PATH.to_string()),
                branch: get("GITHUB_BACKUP_BRANCH")
                    .unwrap_or_else(|| DEFAULT_BACKUP_BRANCH.to_string()),
            }),
            _ => None,
        };

        Self {
            db_path,
            port,
            admin_key: get("ADMIN_KEY"),
            expose_condition,
            backup,
        }
    }
}
