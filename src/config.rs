use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub paging: PagingConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PagingConfig {
    #[serde(default = "default_page_limit")]
    pub default_limit: i64,
    #[serde(default = "default_max_limit")]
    pub max_limit: i64,
    /// Candidate pool bound for relevance-ranked listings.
    #[serde(default = "default_candidate_k")]
    pub candidate_k: i64,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_limit: default_page_limit(),
            max_limit: default_max_limit(),
            candidate_k: default_candidate_k(),
        }
    }
}

fn default_page_limit() -> i64 {
    20
}
fn default_max_limit() -> i64 {
    100
}
fn default_candidate_k() -> i64 {
    500
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate paging
    if config.paging.default_limit < 1 {
        anyhow::bail!("paging.default_limit must be >= 1");
    }

    if config.paging.max_limit < config.paging.default_limit {
        anyhow::bail!("paging.max_limit must be >= paging.default_limit");
    }

    if config.paging.candidate_k < 1 {
        anyhow::bail!("paging.candidate_k must be >= 1");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn paging_defaults_apply_when_section_is_absent() {
        let file = write_config(
            r#"
[db]
path = "catalog.db"

[server]
bind = "127.0.0.1:8900"
"#,
        );
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.paging.default_limit, 20);
        assert_eq!(config.paging.max_limit, 100);
        assert_eq!(config.paging.candidate_k, 500);
    }

    #[test]
    fn max_limit_below_default_is_rejected() {
        let file = write_config(
            r#"
[db]
path = "catalog.db"

[paging]
default_limit = 50
max_limit = 10

[server]
bind = "127.0.0.1:8900"
"#,
        );
        assert!(load_config(file.path()).is_err());
    }
}
