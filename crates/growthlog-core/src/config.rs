use crate::error::Result;
use crate::pain_point::DEFAULT_MAX_POINTS;
use crate::paths;
use crate::query::{QueryRotation, DEFAULT_QUERY};
use crate::row::DateFormat;
use crate::sink::sheet::DEFAULT_TIMEOUT_SECS;
use crate::sink::{LocalFileSink, RemoteSheetSink, SinkChoice};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_CREDENTIALS_PATH: &str = "GSHEET_CREDENTIALS_PATH";
pub const ENV_SPREADSHEET_ID: &str = "GSHEET_SPREADSHEET_ID";
pub const ENV_CSV_PATH: &str = "GROWTHLOG_CSV_PATH";
pub const ENV_QUERIES: &str = "GROWTHLOG_QUERIES";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Everything a run needs, built once at startup and handed to the
/// components that use it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_credentials_path")]
    pub credentials_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spreadsheet_id: Option<String>,
    #[serde(default = "default_csv_path")]
    pub csv_path: PathBuf,
    #[serde(default)]
    pub date_format: DateFormat,
    #[serde(default)]
    pub sink: SinkChoice,
    #[serde(default = "default_queries")]
    pub queries: Vec<String>,
    #[serde(default = "default_max_points")]
    pub max_points: usize,
    #[serde(default = "default_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

fn default_credentials_path() -> PathBuf {
    PathBuf::from(paths::DEFAULT_CREDENTIALS_FILE)
}

fn default_csv_path() -> PathBuf {
    PathBuf::from(paths::DEFAULT_METRICS_CSV)
}

fn default_queries() -> Vec<String> {
    vec![DEFAULT_QUERY.to_string()]
}

fn default_max_points() -> usize {
    DEFAULT_MAX_POINTS
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            credentials_path: default_credentials_path(),
            spreadsheet_id: None,
            csv_path: default_csv_path(),
            date_format: DateFormat::default(),
            sink: SinkChoice::default(),
            queries: default_queries(),
            max_points: default_max_points(),
            http_timeout_secs: default_timeout_secs(),
            api_base: None,
        }
    }
}

impl Config {
    /// Read `growthlog.yaml` from `root`; a missing file yields defaults.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// File config with process environment overrides applied.
    pub fn resolve(root: &Path) -> Result<Self> {
        let mut cfg = Self::load(root)?;
        cfg.apply_env(|key| std::env::var(key).ok());
        Ok(cfg)
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(v) = non_empty(ENV_CREDENTIALS_PATH) {
            self.credentials_path = PathBuf::from(v);
        }
        if let Some(v) = non_empty(ENV_SPREADSHEET_ID) {
            self.spreadsheet_id = Some(v.trim().to_string());
        }
        if let Some(v) = non_empty(ENV_CSV_PATH) {
            self.csv_path = PathBuf::from(v);
        }
        if let Some(v) = non_empty(ENV_QUERIES) {
            self.queries = v.split('|').map(|q| q.trim().to_string()).collect();
        }
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())?;
        Ok(())
    }

    /// Write a default config file unless one already exists.
    pub fn init(root: &Path) -> Result<bool> {
        let data = serde_yaml::to_string(&Self::default())?;
        Ok(crate::io::write_if_missing(
            &paths::config_path(root),
            data.as_bytes(),
        )?)
    }

    pub fn rotation(&self) -> QueryRotation {
        QueryRotation::new(self.queries.iter().cloned())
    }

    pub fn credentials_file(&self, root: &Path) -> PathBuf {
        paths::resolve(root, &self.credentials_path)
    }

    pub fn csv_file(&self, root: &Path) -> PathBuf {
        paths::resolve(root, &self.csv_path)
    }

    pub fn local_sink(&self, root: &Path) -> LocalFileSink {
        LocalFileSink::new(self.csv_file(root)).with_date_format(self.date_format)
    }

    /// `None` when no spreadsheet is configured.
    pub fn remote_sink(&self, root: &Path) -> Option<RemoteSheetSink> {
        let id = self.spreadsheet_id.as_deref()?;
        let mut sink = RemoteSheetSink::new(self.credentials_file(root), id)
            .with_timeout(Duration::from_secs(self.http_timeout_secs))
            .with_date_format(self.date_format);
        if let Some(base) = &self.api_base {
            sink = sink.with_api_base(base.clone());
        }
        Some(sink)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self, root: &Path) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let warn = |level: WarnLevel, message: String| ConfigWarning { level, message };

        match self.spreadsheet_id.as_deref() {
            None => warnings.push(warn(
                WarnLevel::Warning,
                format!("no spreadsheet configured; rows go to {}", self.csv_path.display()),
            )),
            Some(id) if !paths::is_valid_spreadsheet_id(id) => warnings.push(warn(
                WarnLevel::Error,
                format!("spreadsheet id '{id}' is not a valid spreadsheet key"),
            )),
            Some(_) => {
                let creds = self.credentials_file(root);
                if !creds.exists() {
                    warnings.push(warn(
                        WarnLevel::Warning,
                        format!("credentials file not found: {}", creds.display()),
                    ));
                }
            }
        }

        if self.sink == SinkChoice::Remote && self.spreadsheet_id.is_none() {
            warnings.push(warn(
                WarnLevel::Error,
                format!(
                    "sink is 'remote' but no spreadsheet id is set (set {ENV_SPREADSHEET_ID})"
                ),
            ));
        }

        if self.queries.iter().any(|q| q.trim().is_empty()) {
            warnings.push(warn(
                WarnLevel::Warning,
                "query list contains empty entries; they are skipped".to_string(),
            ));
        }

        if self.max_points == 0 {
            warnings.push(warn(
                WarnLevel::Warning,
                "max_points is 0; every row will have empty pain points".to_string(),
            ));
        }

        if self.http_timeout_secs == 0 {
            warnings.push(warn(
                WarnLevel::Error,
                "http_timeout_secs must be greater than 0".to_string(),
            ));
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::load(dir.path()).unwrap();
        assert_eq!(cfg.credentials_path, PathBuf::from("secrets/gsheet_service_account.json"));
        assert_eq!(cfg.csv_path, PathBuf::from("data/metrics/daily_metrics.csv"));
        assert_eq!(cfg.max_points, 3);
        assert_eq!(cfg.sink, SinkChoice::Auto);
        assert!(cfg.spreadsheet_id.is_none());
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let yaml = "spreadsheet_id: abc123\ndate_format: padded\nqueries:\n  - one\n  - two\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.spreadsheet_id.as_deref(), Some("abc123"));
        assert_eq!(cfg.date_format, DateFormat::Padded);
        assert_eq!(cfg.queries, ["one", "two"]);
        assert_eq!(cfg.http_timeout_secs, 30);
    }

    #[test]
    fn env_overrides_file_values() {
        let mut cfg = Config::default();
        let env: HashMap<&str, &str> = [
            (ENV_SPREADSHEET_ID, "sheet-from-env"),
            (ENV_CREDENTIALS_PATH, "/etc/growthlog/key.json"),
            (ENV_QUERIES, "alpha | beta"),
            (ENV_CSV_PATH, ""),
        ]
        .into_iter()
        .collect();
        cfg.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(cfg.spreadsheet_id.as_deref(), Some("sheet-from-env"));
        assert_eq!(cfg.credentials_path, PathBuf::from("/etc/growthlog/key.json"));
        assert_eq!(cfg.queries, ["alpha", "beta"]);
        // Blank values are ignored.
        assert_eq!(cfg.csv_path, PathBuf::from("data/metrics/daily_metrics.csv"));
    }

    #[test]
    fn save_load_roundtrip_and_init_idempotent() {
        let dir = TempDir::new().unwrap();
        assert!(Config::init(dir.path()).unwrap());
        assert!(!Config::init(dir.path()).unwrap());

        let mut cfg = Config::load(dir.path()).unwrap();
        cfg.spreadsheet_id = Some("abc".to_string());
        cfg.save(dir.path()).unwrap();
        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.spreadsheet_id.as_deref(), Some("abc"));

        let yaml = std::fs::read_to_string(paths::config_path(dir.path())).unwrap();
        assert!(!yaml.contains("api_base"));
    }

    #[test]
    fn remote_sink_only_when_configured() {
        let root = Path::new("/tmp/proj");
        let mut cfg = Config::default();
        assert!(cfg.remote_sink(root).is_none());
        cfg.spreadsheet_id = Some("abc".to_string());
        assert!(cfg.remote_sink(root).is_some());
        assert_eq!(
            cfg.local_sink(root).path(),
            Path::new("/tmp/proj/data/metrics/daily_metrics.csv")
        );
    }

    #[test]
    fn validate_default_only_warns() {
        let dir = TempDir::new().unwrap();
        let warnings = Config::default().validate(dir.path());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].level, WarnLevel::Warning);
        assert!(warnings[0].message.contains("no spreadsheet configured"));
    }

    #[test]
    fn validate_flags_errors() {
        let dir = TempDir::new().unwrap();
        let cfg = Config {
            spreadsheet_id: Some("not a key".to_string()),
            http_timeout_secs: 0,
            ..Config::default()
        };
        let warnings = cfg.validate(dir.path());
        let errors: Vec<_> = warnings
            .iter()
            .filter(|w| w.level == WarnLevel::Error)
            .collect();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn validate_remote_sink_without_id_names_env_var() {
        let dir = TempDir::new().unwrap();
        let cfg = Config {
            sink: SinkChoice::Remote,
            ..Config::default()
        };
        let errors: Vec<_> = cfg
            .validate(dir.path())
            .into_iter()
            .filter(|w| w.level == WarnLevel::Error)
            .collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains(ENV_SPREADSHEET_ID));
    }

    #[test]
    fn validate_missing_credentials_warns() {
        let dir = TempDir::new().unwrap();
        let cfg = Config {
            spreadsheet_id: Some("abc".to_string()),
            ..Config::default()
        };
        let warnings = cfg.validate(dir.path());
        assert!(warnings
            .iter()
            .any(|w| w.message.contains("credentials file not found")));

        std::fs::create_dir_all(dir.path().join("secrets")).unwrap();
        std::fs::write(dir.path().join("secrets/gsheet_service_account.json"), "{}").unwrap();
        assert!(cfg.validate(dir.path()).is_empty());
    }
}
