//! Remote dataset backup through the GitHub contents API
//!
//! The whole CSV export replaces a single file in a repository. The current
//! blob SHA is fetched first since GitHub requires it to overwrite a file.

use crate::runtime::BackupSink;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("disclosure-game/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
    #[error("GitHub returned {status}: {body}")]
    Api { status: StatusCode, body: String },
}

/// Where the dataset lives on GitHub
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubBackupConfig {
    pub token: String,
    /// `owner/name`
    pub repo: String,
    pub path: String,
    pub branch: String,
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    sha: String,
}

#[derive(Debug, Serialize, PartialEq)]
struct PutContents<'a> {
    message: String,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
}

pub struct GithubBackup {
    client: Client,
    config: GithubBackupConfig,
    api_base: String,
}

impl GithubBackup {
    pub fn new(config: GithubBackupConfig) -> Result<Self, BackupError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            config,
            api_base: DEFAULT_API_BASE.to_string(),
        })
    }

    /// Point at a different API host (GitHub Enterprise, tests)
    #[allow(dead_code)] // Used in tests
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn contents_url(&self) -> String {
        format!(
            "{}/repos/{}/contents/{}",
            self.api_base,
            self.config.repo,
            self.config.path.trim_start_matches('/')
        )
    }

    /// SHA of the existing file, or `None` if it does not exist yet
    async fn current_sha(&self) -> Result<Option<String>, BackupError> {
        let response = self
            .client
            .get(self.contents_url())
            .query(&[("ref", self.config.branch.as_str())])
            .bearer_auth(&self.config.token)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackupError::Api { status, body });
        }

        let contents: ContentsResponse = response.json().await?;
        Ok(Some(contents.sha))
    }

    pub async fn push(&self, csv: &str) -> Result<(), BackupError> {
        let sha = self.current_sha().await?;
        let body = build_put_body(csv, &self.config.branch, sha);

        let response = self
            .client
            .put(self.contents_url())
            .bearer_auth(&self.config.token)
            .header("Accept", "application/vnd.github+json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackupError::Api { status, body });
        }

        tracing::debug!(repo = %self.config.repo, path = %self.config.path, "Backup committed");
        Ok(())
    }
}

fn build_put_body<'a>(csv: &str, branch: &'a str, sha: Option<String>) -> PutContents<'a> {
    PutContents {
        message: format!(
            "Update disclosure game data ({})",
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        ),
        content: STANDARD.encode(csv.as_bytes()),
        branch,
        sha,
    }
}

#[async_trait]
impl BackupSink for GithubBackup {
    fn is_enabled(&self) -> bool {
        true
    }

    async fn upload(&self, csv: &str) -> Result<(), String> {
        self.push(csv).await.map_err(|e| e.to_string())
    }
}
