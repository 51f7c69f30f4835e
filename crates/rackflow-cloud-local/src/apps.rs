//! Directory-backed app registry
//!
//! An app exists when `apps/{app}/app.json` exists under the storage root.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rackflow_cloud::naming;
use rackflow_cloud::{AppRegistry, ProviderError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

const APP_FILE: &str = "app.json";

/// Persisted app record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppRecord {
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// App registry stored next to the objects it scopes
#[derive(Debug, Clone)]
pub struct LocalApps {
    root: PathBuf,
}

impl LocalApps {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn app_file(&self, app: &str) -> PathBuf {
        self.root.join("apps").join(app).join(APP_FILE)
    }

    /// Register `app`, keeping the existing record if it is already present
    pub async fn create_app(&self, app: &str) -> Result<AppRecord> {
        naming::validate_name("app", app)?;

        if let Some(existing) = self.get_app(app).await? {
            return Ok(existing);
        }

        let record = AppRecord {
            name: app.to_string(),
            created_at: Utc::now(),
        };

        let path = self.app_file(app);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, serde_json::to_string_pretty(&record)?).await?;

        tracing::info!(app = %app, "Created app");
        Ok(record)
    }

    pub async fn get_app(&self, app: &str) -> Result<Option<AppRecord>> {
        if app.is_empty() || app.contains('/') || app.starts_with('.') {
            return Ok(None);
        }
        match fs::read_to_string(self.app_file(app)).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ProviderError::Io(e)),
        }
    }

    /// All registered apps, sorted by name
    pub async fn list_apps(&self) -> Result<Vec<AppRecord>> {
        let mut apps = Vec::new();
        let mut entries = match fs::read_dir(self.root.join("apps")).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(apps),
            Err(e) => return Err(ProviderError::Io(e)),
        };

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(record) = self.get_app(&name).await? {
                apps.push(record);
            }
        }

        apps.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(apps)
    }
}

#[async_trait]
impl AppRegistry for LocalApps {
    async fn app_exists(&self, app: &str) -> Result<()> {
        match self.get_app(app).await? {
            Some(_) => Ok(()),
            None => Err(ProviderError::AppNotFound(app.to_string())),
        }
    }
}
