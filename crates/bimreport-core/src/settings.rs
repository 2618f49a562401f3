use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_SERVICE_URL: &str = "http://localhost:8000";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("read settings {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse settings {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub service: ServiceSettings,
    pub workflow: WorkflowConfig,
    pub output_dir: Option<PathBuf>,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let raw = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    pub url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_SERVICE_URL.to_string(),
            timeout_secs: 300,
            user_agent: concat!("bimreport/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Durations of the simulated upload and of the auto-dismissed notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub upload_latency_ms: u64,
    pub upload_notice_ms: u64,
    pub report_notice_ms: u64,
    pub error_notice_ms: u64,
}

impl WorkflowConfig {
    pub fn upload_latency(&self) -> Duration {
        Duration::from_millis(self.upload_latency_ms)
    }

    pub fn upload_notice(&self) -> Duration {
        Duration::from_millis(self.upload_notice_ms)
    }

    pub fn report_notice(&self) -> Duration {
        Duration::from_millis(self.report_notice_ms)
    }

    pub fn error_notice(&self) -> Duration {
        Duration::from_millis(self.error_notice_ms)
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            upload_latency_ms: 2000,
            upload_notice_ms: 2000,
            report_notice_ms: 3000,
            error_notice_ms: 5000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let settings = Settings::from_toml(
            r#"
            output_dir = "reports"

            [workflow]
            upload_latency_ms = 0
            "#,
        )
        .expect("valid toml");

        assert_eq!(Some(PathBuf::from("reports")), settings.output_dir);
        assert_eq!(0, settings.workflow.upload_latency_ms);
        assert_eq!(3000, settings.workflow.report_notice_ms);
        assert_eq!(DEFAULT_SERVICE_URL, settings.service.url);
    }
}
