//! Process configuration, read once at startup from the environment.

use std::path::PathBuf;

use crate::{Error, Result};

pub const DB_PATH_ENV: &str = "ACADEMIC_MCP_DB_PATH";
pub const OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";
pub const ZOTERO_KEY_ENV: &str = "ZOTERO_API_KEY";
pub const ZOTERO_LIBRARY_ENV: &str = "ZOTERO_LIBRARY_ID";

#[derive(Debug, Clone, Default)]
pub struct Config {
    /// LLM credential; required for parse/summarize/quotations.
    pub openai_api_key: String,
    /// Reference-manager credential; required only for that source.
    pub zotero_api_key: String,
    pub zotero_library_id: String,
    /// SQLite database file path.
    pub db_path: PathBuf,
}

impl Config {
    /// Read configuration from the environment. Credentials may be absent;
    /// the operations that need them fail at call time, not at startup.
    pub fn from_env() -> Self {
        Config {
            openai_api_key: std::env::var(OPENAI_KEY_ENV).unwrap_or_default(),
            zotero_api_key: std::env::var(ZOTERO_KEY_ENV).unwrap_or_default(),
            zotero_library_id: std::env::var(ZOTERO_LIBRARY_ENV).unwrap_or_default(),
            db_path: std::env::var(DB_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_db_path()),
        }
    }

    pub fn openai_key(&self) -> Result<&str> {
        if self.openai_api_key.is_empty() {
            return Err(Error::BadInput(format!(
                "{OPENAI_KEY_ENV} environment variable not set"
            )));
        }
        Ok(&self.openai_api_key)
    }

    pub fn zotero_credentials(&self) -> Result<(&str, &str)> {
        if self.zotero_api_key.is_empty() {
            return Err(Error::BadInput(format!(
                "{ZOTERO_KEY_ENV} environment variable not set"
            )));
        }
        if self.zotero_library_id.is_empty() {
            return Err(Error::BadInput(format!(
                "{ZOTERO_LIBRARY_ENV} environment variable not set"
            )));
        }
        Ok((&self.zotero_api_key, &self.zotero_library_id))
    }
}

/// `~/.academic-mcp/academic.db`, falling back to the working directory
/// when no home directory can be resolved.
pub fn default_db_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".academic-mcp")
        .join("academic.db")
}
