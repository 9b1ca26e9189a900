use std::path::{Path, PathBuf};

pub const APP_IDENTIFIER: &str = "com.sneakersecure.app";
pub const DATA_DIR_ENV: &str = "SNEAKERSECURE_DATA_DIR";
pub const LOG_FILTER_ENV: &str = "SNEAKERSECURE_LOG";
pub const LOG_FORMAT_ENV: &str = "SNEAKERSECURE_LOG_FORMAT";
pub const LOG_DIR_ENV: &str = "SNEAKERSECURE_LOG_DIR";

pub const DATABASE_FILE: &str = "sneakersecure.sqlite3";
pub const STORE_FILE: &str = "store.json";
pub const DEFAULT_LOG_FILTER: &str = "sneakersecure=info,sqlx=warn";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Plain
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub filter: String,
    pub format: LogFormat,
    /// Directory for the rolling file sink; stderr only when `None`.
    pub dir: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
            format: LogFormat::Plain,
            dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub log: LogConfig,
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_IDENTIFIER)
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration through `lookup`, which stands in for the
    /// process environment. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let data_dir = get(DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);
        let log = LogConfig {
            filter: get(LOG_FILTER_ENV).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            format: get(LOG_FORMAT_ENV)
                .map(|value| LogFormat::parse(&value))
                .unwrap_or_default(),
            dir: get(LOG_DIR_ENV).map(PathBuf::from),
        };
        Self { data_dir, log }
    }

    pub fn for_data_dir(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            log: LogConfig::default(),
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(STORE_FILE)
    }

    pub fn default_log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}
