//! # Scheduled Import
//!
//! Periodically runs an external command that rewrites the people
//! collection on disk (the spreadsheet sync script), then reloads the store.

use crate::store::RecordStore;
use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Deserialize, Clone, Debug)]
pub struct ImportConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_command")]
    pub command: String,
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Start on the next full hour instead of immediately.
    #[serde(default = "default_align_to_hour")]
    pub align_to_hour: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            command: default_command(),
            args: default_args(),
            interval_secs: default_interval_secs(),
            align_to_hour: default_align_to_hour(),
        }
    }
}

fn default_command() -> String {
    "python".into()
}
fn default_args() -> Vec<String> {
    vec!["people_input_script.py".into()]
}
fn default_interval_secs() -> u64 {
    3600
}
fn default_align_to_hour() -> bool {
    true
}

#[derive(Serialize, Clone, Debug, Default)]
pub struct ImportStatus {
    pub runs: u64,
    pub last_run_at: Option<String>,
    pub last_ok: Option<bool>,
    pub last_error: Option<String>,
    pub records_loaded: Option<usize>,
}

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("'{command}' exited with {status}")]
    Failed { command: String, status: String },
    #[error(transparent)]
    Reload(#[from] crate::store::StoreError),
}

pub struct ImportJob {
    config: ImportConfig,
    people: Arc<dyn RecordStore>,
    status: Arc<RwLock<ImportStatus>>,
}

impl ImportJob {
    pub fn new(
        config: ImportConfig,
        people: Arc<dyn RecordStore>,
        status: Arc<RwLock<ImportStatus>>,
    ) -> Self {
        Self {
            config,
            people,
            status,
        }
    }

    /// Run forever on the configured schedule.
    pub async fn run(self) {
        if self.config.align_to_hour {
            let wait = delay_until_next_hour(Utc::now());
            tracing::info!("Import job scheduled in {}s", wait.as_secs());
            tokio::time::sleep(wait).await;
        }

        let period = Duration::from_secs(self.config.interval_secs.max(1));
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            // failures are logged and kept in ImportStatus; retry next tick
            if self.run_once().await.is_err() {
                continue;
            }
        }
    }

    /// Run the command once and reload the store if it succeeded.
    pub async fn run_once(&self) -> Result<usize, ImportError> {
        let started = Utc::now();
        tracing::info!("Running import: {} {:?}", self.config.command, self.config.args);

        let result = self.execute().await;

        let mut status = self.status.write().await;
        status.runs += 1;
        status.last_run_at = Some(started.to_rfc3339());
        match &result {
            Ok(count) => {
                tracing::info!(
                    "Import finished, {} record(s) loaded into '{}'",
                    count,
                    self.people.name()
                );
                status.last_ok = Some(true);
                status.last_error = None;
                status.records_loaded = Some(*count);
            }
            Err(e) => {
                tracing::error!("Import failed: {}", e);
                status.last_ok = Some(false);
                status.last_error = Some(e.to_string());
            }
        }
        result
    }

    async fn execute(&self) -> Result<usize, ImportError> {
        let status = tokio::process::Command::new(&self.config.command)
            .args(&self.config.args)
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|source| ImportError::Spawn {
                command: self.config.command.clone(),
                source,
            })?;

        if !status.success() {
            return Err(ImportError::Failed {
                command: self.config.command.clone(),
                status: status.to_string(),
            });
        }

        Ok(self.people.reload().await?)
    }
}

/// Time left until the next `HH:00:00`.
pub fn delay_until_next_hour(now: DateTime<Utc>) -> Duration {
    let into_hour = u64::from(now.minute() * 60 + now.second());
    Duration::from_secs(3600 - into_hour)
}
